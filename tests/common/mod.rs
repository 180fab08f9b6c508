//! Shared helpers for integration tests

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;

use fvmerger::cli::Cli;
use fvmerger::config::Config;
use fvmerger::error::{MergerError, Result};
use fvmerger::models::{AttachmentMeta, MessageEnvelope};
use fvmerger::{MailClient, Period};

/// Mailbox stub: returns a fixed message list and serves attachment bytes
/// from the inline `data` field. Filenames listed in `failing` error out on
/// fetch to exercise isolation paths.
pub struct StubMailClient {
    pub messages: Vec<MessageEnvelope>,
    pub failing: HashSet<String>,
}

impl StubMailClient {
    pub fn new(messages: Vec<MessageEnvelope>) -> Self {
        Self {
            messages,
            failing: HashSet::new(),
        }
    }
}

#[async_trait]
impl MailClient for StubMailClient {
    async fn search_messages(&self, _query: &str) -> Result<Vec<MessageEnvelope>> {
        Ok(self.messages.clone())
    }

    async fn fetch_attachment(&self, attachment: &AttachmentMeta) -> Result<Vec<u8>> {
        if self.failing.contains(&attachment.filename) {
            return Err(MergerError::NetworkError(format!(
                "stubbed failure for {}",
                attachment.filename
            )));
        }
        attachment
            .data
            .clone()
            .ok_or_else(|| MergerError::ApiError("stub has no data".to_string()))
    }
}

/// Minimal JPEG marker stream: SOI, SOF0 with the given dimensions, EOI.
/// The PDF engine only reads the frame header, so this is enough.
pub fn fake_jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8];
    data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&width.to_be_bytes());
    data.push(0x03);
    data.extend_from_slice(&[0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

pub fn message_date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, day, 9, 0, 0).unwrap()
}

pub fn run_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap()
}

pub fn message(id: &str, sender: &str, day: u32, attachments: Vec<AttachmentMeta>) -> MessageEnvelope {
    MessageEnvelope {
        id: id.to_string(),
        sender: sender.to_string(),
        date: Some(message_date(day)),
        attachments,
    }
}

pub fn attachment(message_id: &str, filename: &str, mime_type: &str, data: Vec<u8>) -> AttachmentMeta {
    AttachmentMeta {
        message_id: message_id.to_string(),
        attachment_id: None,
        filename: filename.to_string(),
        mime_type: mime_type.to_string(),
        data: Some(data),
    }
}

/// CLI arguments and configuration rooted under a temporary directory
pub fn setup(root: &TempDir) -> (Cli, Config) {
    let cli = Cli {
        config: PathBuf::from("config.toml"),
        period: Some(Period::LastMonth),
        from: None,
        to: None,
        output_dir: Some(root.path().join("attachments")),
        dry_run: false,
        verbose: false,
    };

    let mut config = Config::default();
    config.output.scratch_dir = root.path().join("jpg_temp").to_string_lossy().into_owned();
    config.output.merged_pdf = root
        .path()
        .join("attachments.pdf")
        .to_string_lossy()
        .into_owned();

    (cli, config)
}
