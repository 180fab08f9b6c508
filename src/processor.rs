//! The attachment loop: classify, fetch, convert, persist
//!
//! Walks every retrieved message and every attachment in encounter order and
//! turns the interesting ones into PDFs on disk. One attachment failing
//! never touches its siblings: the failure is logged with the original
//! filename and the loop moves on. The returned list's order is the merge
//! order and the summary numbering.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::classifier::{classify, AttachmentKind};
use crate::client::MailClient;
use crate::error::Result;
use crate::models::{AttachmentMeta, MessageEnvelope, OriginKind, ProducedFile};
use crate::naming;
use crate::pdf::PdfEngine;

/// The two directories the pipeline writes into
#[derive(Debug, Clone)]
pub struct OutputDirs {
    /// Destination of persisted PDFs (pass-through and converted)
    pub attachments_dir: PathBuf,
    /// Working area for downloaded images awaiting conversion
    pub scratch_dir: PathBuf,
}

pub struct AttachmentProcessor<'a> {
    mail: &'a dyn MailClient,
    pdf: &'a dyn PdfEngine,
}

impl<'a> AttachmentProcessor<'a> {
    pub fn new(mail: &'a dyn MailClient, pdf: &'a dyn PdfEngine) -> Self {
        Self { mail, pdf }
    }

    /// Process every attachment of every message, in encounter order.
    ///
    /// Returns the produced files in append order. Never fails as a whole:
    /// per-attachment errors are logged and skipped.
    pub async fn process(
        &self,
        messages: &[MessageEnvelope],
        dirs: &OutputDirs,
        now: DateTime<Utc>,
    ) -> Vec<ProducedFile> {
        let mut produced = Vec::new();

        for message in messages {
            for attachment in &message.attachments {
                let kind = classify(attachment);
                if kind == AttachmentKind::Skip {
                    debug!(
                        "Skipping attachment '{}' ({}) from message {}",
                        attachment.filename, attachment.mime_type, message.id
                    );
                    continue;
                }

                let outcome = self
                    .handle_one(message, attachment, kind, dirs, now)
                    .await
                    .map_err(|e| e.for_attachment(&attachment.filename));

                match outcome {
                    Ok(file) => {
                        debug!("Produced {}", file.path.display());
                        produced.push(file);
                    }
                    Err(error) => {
                        // Isolation contract: siblings and later messages
                        // must still be processed.
                        warn!("{}", error);
                    }
                }
            }
        }

        produced
    }

    async fn handle_one(
        &self,
        message: &MessageEnvelope,
        attachment: &AttachmentMeta,
        kind: AttachmentKind,
        dirs: &OutputDirs,
        now: DateTime<Utc>,
    ) -> Result<ProducedFile> {
        match kind {
            AttachmentKind::PdfPassthrough => {
                self.persist_pdf(message, attachment, dirs, now).await
            }
            AttachmentKind::ImageToConvert => {
                self.convert_image(message, attachment, dirs, now).await
            }
            AttachmentKind::Skip => unreachable!("skip is filtered out by the caller"),
        }
    }

    async fn persist_pdf(
        &self,
        message: &MessageEnvelope,
        attachment: &AttachmentMeta,
        dirs: &OutputDirs,
        now: DateTime<Utc>,
    ) -> Result<ProducedFile> {
        let bytes = self.mail.fetch_attachment(attachment).await?;

        let name = naming::compose(&attachment.filename, message.date, &message.sender, now);
        let path = dirs.attachments_dir.join(name);
        // Same composed name within one run: last write wins, by design.
        tokio::fs::write(&path, &bytes).await?;

        Ok(ProducedFile {
            path,
            origin: OriginKind::PdfPassthrough,
        })
    }

    async fn convert_image(
        &self,
        message: &MessageEnvelope,
        attachment: &AttachmentMeta,
        dirs: &OutputDirs,
        now: DateTime<Utc>,
    ) -> Result<ProducedFile> {
        let bytes = self.mail.fetch_attachment(attachment).await?;

        // Keep the original download around for inspection until the next
        // successful merge wipes the scratch directory.
        let scratch_path = dirs
            .scratch_dir
            .join(naming::sanitize_plain(&attachment.filename));
        tokio::fs::write(&scratch_path, &bytes).await?;

        let page = self.pdf.render_image_page(&bytes)?;

        let name = naming::compose(
            &force_pdf_extension(&attachment.filename),
            message.date,
            &message.sender,
            now,
        );
        let path = dirs.attachments_dir.join(name);
        tokio::fs::write(&path, &page).await?;

        Ok(ProducedFile {
            path,
            origin: OriginKind::ImageConverted,
        })
    }
}

/// Swap a `.jpg`/`.jpeg` suffix (any case) for `.pdf`; names without one
/// just get `.pdf` appended.
fn force_pdf_extension(name: &str) -> String {
    let lower = name.to_lowercase();
    let stem_len = if lower.ends_with(".jpeg") {
        name.len() - 5
    } else if lower.ends_with(".jpg") {
        name.len() - 4
    } else {
        name.len()
    };
    format!("{}.pdf", &name[..stem_len])
}
