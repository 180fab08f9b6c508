use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::date_range::{Period, DATE_PATTERN};
use crate::error::{MergerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gmail: GmailConfig,
    #[serde(default)]
    pub range: RangeConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_token_cache_path")]
    pub token_cache_path: String,
    /// Additional Gmail search expression, appended to the date bounds
    /// unmodified (e.g. "-is:starred").
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_cache_path: default_token_cache_path(),
            filter: default_filter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeConfig {
    #[serde(default = "default_period")]
    pub period: String,
    /// Used when period = "custom" and no explicit bounds are given
    #[serde(default = "default_custom_from")]
    pub custom_from: String,
    #[serde(default = "default_custom_to")]
    pub custom_to: String,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
            custom_from: default_custom_from(),
            custom_to: default_custom_to(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where persisted PDFs (pass-through and converted) land
    #[serde(default = "default_attachments_dir")]
    pub attachments_dir: String,
    /// Working area for downloaded images awaiting conversion; emptied after
    /// a successful merge
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: String,
    /// Well-known location of the combined document
    #[serde(default = "default_merged_pdf")]
    pub merged_pdf: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            attachments_dir: default_attachments_dir(),
            scratch_dir: default_scratch_dir(),
            merged_pdf: default_merged_pdf(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Name printed under the closing line of the summary
    #[serde(default = "default_signature")]
    pub signature: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            signature: default_signature(),
        }
    }
}

fn default_credentials_path() -> String {
    "client_secret.json".to_string()
}

fn default_token_cache_path() -> String {
    "token.json".to_string()
}

fn default_filter() -> String {
    "-is:starred".to_string()
}

fn default_period() -> String {
    "last_month".to_string()
}

fn default_custom_from() -> String {
    "2025/01/01".to_string()
}

fn default_custom_to() -> String {
    "2025/12/31".to_string()
}

fn default_attachments_dir() -> String {
    "attachments".to_string()
}

fn default_scratch_dir() -> String {
    "jpg_temp".to_string()
}

fn default_merged_pdf() -> String {
    "attachments.pdf".to_string()
}

fn default_signature() -> String {
    "FVMerger".to_string()
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, return default config with warning
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MergerError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| MergerError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parsed form of the configured period selector
    pub fn period(&self) -> Result<Period> {
        Period::from_str(&self.range.period)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let period = self.period()?;

        // Custom bounds must hold parseable dates whenever they can be used.
        if period == Period::Custom {
            for bound in [&self.range.custom_from, &self.range.custom_to] {
                chrono::NaiveDate::parse_from_str(bound, DATE_PATTERN).map_err(|_| {
                    MergerError::ConfigError(format!(
                        "range.custom_from/custom_to must be YYYY/MM/DD, got '{}'",
                        bound
                    ))
                })?;
            }
        }

        if self.output.attachments_dir.is_empty() {
            return Err(MergerError::ConfigError(
                "output.attachments_dir cannot be empty".to_string(),
            ));
        }
        if self.output.scratch_dir.is_empty() {
            return Err(MergerError::ConfigError(
                "output.scratch_dir cannot be empty".to_string(),
            ));
        }
        // The scratch directory is wiped after a successful merge; it must
        // never alias the directory holding the produced files.
        if self.output.scratch_dir == self.output.attachments_dir {
            return Err(MergerError::ConfigError(
                "output.scratch_dir must differ from output.attachments_dir".to_string(),
            ));
        }
        if self.output.merged_pdf.is_empty() {
            return Err(MergerError::ConfigError(
                "output.merged_pdf cannot be empty".to_string(),
            ));
        }

        if self.gmail.credentials_path.is_empty() {
            return Err(MergerError::ConfigError(
                "gmail.credentials_path cannot be empty".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.range.period, "last_month");
        assert_eq!(config.range.custom_from, "2025/01/01");
        assert_eq!(config.range.custom_to, "2025/12/31");

        assert_eq!(config.output.attachments_dir, "attachments");
        assert_eq!(config.output.scratch_dir, "jpg_temp");
        assert_eq!(config.output.merged_pdf, "attachments.pdf");

        assert_eq!(config.gmail.credentials_path, "client_secret.json");
        assert_eq!(config.gmail.filter, "-is:starred");
        assert_eq!(config.report.signature, "FVMerger");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_period_parses_from_config_string() {
        let config = Config::default();
        assert_eq!(config.period().unwrap(), Period::LastMonth);
    }

    #[test]
    fn test_validation_rejects_unknown_period() {
        let mut config = Config::default();
        config.range.period = "fortnight".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_custom_bound() {
        let mut config = Config::default();
        config.range.period = "custom".to_string();
        config.range.custom_from = "01.05.2025".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("YYYY/MM/DD"));
    }

    #[test]
    fn test_validation_ignores_custom_bounds_for_other_periods() {
        let mut config = Config::default();
        config.range.period = "year".to_string();
        config.range.custom_from = "garbage".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_aliased_scratch_dir() {
        let mut config = Config::default();
        config.output.scratch_dir = config.output.attachments_dir.clone();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must differ"));
    }

    #[test]
    fn test_validation_rejects_empty_dirs() {
        let mut config = Config::default();
        config.output.attachments_dir = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.merged_pdf = String::new();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_config_load_full_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        let config = Config::default();
        let content = toml::to_string_pretty(&config).unwrap();
        tokio::fs::write(path, content).await.unwrap();

        let loaded = Config::load(path).await.unwrap();

        assert_eq!(config.range.period, loaded.range.period);
        assert_eq!(config.output.attachments_dir, loaded.output.attachments_dir);
        assert_eq!(config.gmail.filter, loaded.gmail.filter);
        assert_eq!(config.report.signature, loaded.report.signature);
    }

    #[tokio::test]
    async fn test_config_load_nonexistent_returns_default() {
        let path = Path::new("/tmp/nonexistent-fvmerger-config-12345.toml");

        let config = Config::load(path).await.unwrap();

        assert_eq!(config.range.period, "last_month");
        assert_eq!(config.output.merged_pdf, "attachments.pdf");
    }

    #[tokio::test]
    async fn test_config_load_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        tokio::fs::write(path, "this is not valid toml {[}]")
            .await
            .unwrap();

        let result = Config::load(path).await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse config file"));
    }

    #[tokio::test]
    async fn test_config_partial_with_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        let partial_config = r#"
[range]
period = "current_month"

[report]
signature = "Kamil Kubicki"
"#;
        tokio::fs::write(path, partial_config).await.unwrap();

        let config = Config::load(path).await.unwrap();

        assert_eq!(config.range.period, "current_month");
        assert_eq!(config.report.signature, "Kamil Kubicki");

        // Untouched sections keep their defaults
        assert_eq!(config.output.scratch_dir, "jpg_temp");
        assert_eq!(config.gmail.filter, "-is:starred");
    }
}
