use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::date_range::{DateInterval, Period};

/// One retrieved mail message, reduced to what the pipeline reads.
///
/// The sender and date come from message headers and may be missing or
/// unparsable on real mail; the date is therefore optional and downstream
/// naming falls back to the run timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub id: String,
    pub sender: String,
    pub date: Option<DateTime<Utc>>,
    pub attachments: Vec<AttachmentMeta>,
}

/// Metadata for a single attachment as declared by the mailbox.
///
/// Small attachments arrive inline (`data`); larger ones only carry an
/// `attachment_id` and are fetched separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub message_id: String,
    pub attachment_id: Option<String>,
    pub filename: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

/// How a produced file came to exist on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginKind {
    /// Attachment was already a PDF and was persisted as-is
    PdfPassthrough,
    /// Attachment was a JPEG rendered onto a single PDF page
    ImageConverted,
}

/// One file written to the attachments directory.
///
/// Append order across the run is load-bearing: it becomes the merge order
/// and the summary numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducedFile {
    pub path: PathBuf,
    pub origin: OriginKind,
}

impl ProducedFile {
    /// Base name of the produced file, used for summary numbering
    pub fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Everything the summary needs about a finished run.
///
/// Assembled incrementally by the pipeline, finalized once, then handed to
/// the reporter; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub period: Period,
    pub interval: DateInterval,
    pub produced: Vec<ProducedFile>,
    pub merged_path: Option<PathBuf>,
    pub message_count: usize,
    pub attachments_dir: PathBuf,
}
