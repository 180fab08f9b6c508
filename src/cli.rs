//! Command-line interface and pipeline orchestration

use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::aggregator::PdfAggregator;
use crate::client::{self, MailClient};
use crate::config::Config;
use crate::date_range::{self, Period};
use crate::error::Result;
use crate::models::RunResult;
use crate::pdf::PdfEngine;
use crate::processor::{AttachmentProcessor, OutputDirs};

#[derive(Parser, Debug)]
#[command(name = "fvmerger")]
#[command(version)]
#[command(about = "Collect mail attachments as PDFs and merge them into one document", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Date range selector, overriding the configured one
    #[arg(short, long, value_enum)]
    pub period: Option<Period>,

    /// Start of a custom range (YYYY/MM/DD, inclusive); implies --period custom
    #[arg(long)]
    pub from: Option<String>,

    /// End of a custom range (YYYY/MM/DD, exclusive); implies --period custom
    #[arg(long)]
    pub to: Option<String>,

    /// Directory for produced PDFs, overriding the configured one
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Search and report what would be produced without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The effective period: an explicit flag wins, then explicit custom
    /// bounds, then the configured selector.
    fn effective_period(&self, config: &Config) -> Result<Period> {
        if let Some(period) = self.period {
            return Ok(period);
        }
        if self.from.is_some() || self.to.is_some() {
            return Ok(Period::Custom);
        }
        config.period()
    }
}

/// Run the whole pipeline: resolve the range, search the mailbox, persist
/// and convert attachments, merge, and assemble the run result.
///
/// A merge failure is downgraded to a warning: the per-attachment files
/// are already on disk and the summary still reports them.
pub async fn run_pipeline(
    cli: &Cli,
    config: &Config,
    mail: &dyn MailClient,
    pdf: &dyn PdfEngine,
    now: DateTime<Utc>,
) -> Result<RunResult> {
    let period = cli.effective_period(config)?;
    let interval = date_range::resolve(
        period,
        cli.from.as_deref(),
        cli.to.as_deref(),
        &config.range.custom_from,
        &config.range.custom_to,
        now,
    )?;
    info!(
        "Resolved {} to [{}, {})",
        period,
        interval.start.format("%Y-%m-%d"),
        interval.end.format("%Y-%m-%d")
    );

    let query = client::build_query(&interval, &config.gmail.filter);
    let messages = mail.search_messages(&query).await?;
    info!("Found {} message(s) in range", messages.len());

    let attachments_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.attachments_dir));

    if cli.dry_run {
        for message in &messages {
            for attachment in &message.attachments {
                info!(
                    "[dry run] message {} from {}: {} ({})",
                    message.id, message.sender, attachment.filename, attachment.mime_type
                );
            }
        }
        return Ok(RunResult {
            period,
            interval,
            produced: Vec::new(),
            merged_path: None,
            message_count: messages.len(),
            attachments_dir,
        });
    }

    let dirs = OutputDirs {
        attachments_dir: attachments_dir.clone(),
        scratch_dir: PathBuf::from(&config.output.scratch_dir),
    };
    tokio::fs::create_dir_all(&dirs.attachments_dir).await?;
    tokio::fs::create_dir_all(&dirs.scratch_dir).await?;

    let produced = AttachmentProcessor::new(mail, pdf)
        .process(&messages, &dirs, now)
        .await;

    let merged_target = PathBuf::from(&config.output.merged_pdf);
    let merged_path = match PdfAggregator::new(pdf)
        .aggregate(&produced, &merged_target, &dirs.scratch_dir)
        .await
    {
        Ok(path) => path,
        Err(error) => {
            warn!(
                "Merge into {} failed: {}; individual PDFs remain in {}",
                merged_target.display(),
                error,
                dirs.attachments_dir.display()
            );
            None
        }
    };

    Ok(RunResult {
        period,
        interval,
        produced,
        merged_path,
        message_count: messages.len(),
        attachments_dir,
    })
}
