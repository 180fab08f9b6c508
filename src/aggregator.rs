//! Final merge of all produced PDFs plus scratch-directory housekeeping

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{MergerError, Result};
use crate::models::ProducedFile;
use crate::pdf::PdfEngine;

pub struct PdfAggregator<'a> {
    pdf: &'a dyn PdfEngine,
}

impl<'a> PdfAggregator<'a> {
    pub fn new(pdf: &'a dyn PdfEngine) -> Self {
        Self { pdf }
    }

    /// Concatenate the produced files, in their given order, into one
    /// document at `merged_path`.
    ///
    /// An empty input list is not an error: nothing is merged and `None`
    /// comes back. A merge failure surfaces as `AggregationFailed`; the
    /// per-attachment files already on disk are unaffected either way.
    /// After a successful merge the scratch directory is emptied and
    /// recreated so the next run starts clean; cleanup trouble is only
    /// worth a warning.
    pub async fn aggregate(
        &self,
        files: &[ProducedFile],
        merged_path: &Path,
        scratch_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        if files.is_empty() {
            info!("No PDFs were produced; skipping the merge");
            return Ok(None);
        }

        let inputs: Vec<PathBuf> = files.iter().map(|file| file.path.clone()).collect();
        self.pdf
            .merge(&inputs, merged_path)
            .map_err(|source| MergerError::AggregationFailed {
                source: Box::new(source),
            })?;
        info!(
            "Merged {} file(s) into {}",
            inputs.len(),
            merged_path.display()
        );

        if let Err(error) = reset_scratch(scratch_dir).await {
            warn!(
                "Could not reset scratch directory {}: {}",
                scratch_dir.display(),
                error
            );
        }

        Ok(Some(merged_path.to_path_buf()))
    }
}

/// Remove everything under the scratch directory and recreate it empty
async fn reset_scratch(dir: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => return Err(error),
    }
    tokio::fs::create_dir_all(dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OriginKind;
    use crate::pdf::MockPdfEngine;
    use tempfile::TempDir;

    fn produced(path: PathBuf) -> ProducedFile {
        ProducedFile {
            path,
            origin: OriginKind::PdfPassthrough,
        }
    }

    #[tokio::test]
    async fn test_empty_input_skips_merge_and_creates_nothing() {
        let root = TempDir::new().unwrap();
        let merged = root.path().join("attachments.pdf");
        let scratch = root.path().join("jpg_temp");

        let mut pdf = MockPdfEngine::new();
        pdf.expect_merge().never();

        let result = PdfAggregator::new(&pdf)
            .aggregate(&[], &merged, &scratch)
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(!merged.exists());
    }

    #[tokio::test]
    async fn test_merge_receives_paths_in_order_and_scratch_is_reset() {
        let root = TempDir::new().unwrap();
        let merged = root.path().join("attachments.pdf");
        let scratch = root.path().join("jpg_temp");
        std::fs::create_dir_all(&scratch).unwrap();
        std::fs::write(scratch.join("leftover.jpg"), b"x").unwrap();

        let files = vec![
            produced(root.path().join("a.pdf")),
            produced(root.path().join("b.pdf")),
            produced(root.path().join("c.pdf")),
        ];
        let expected: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();

        let mut pdf = MockPdfEngine::new();
        pdf.expect_merge()
            .withf(move |inputs, _| inputs == expected.as_slice())
            .returning(|_, _| Ok(()));

        let result = PdfAggregator::new(&pdf)
            .aggregate(&files, &merged, &scratch)
            .await
            .unwrap();

        assert_eq!(result, Some(merged));
        // Scratch emptied and recreated
        assert!(scratch.exists());
        assert!(!scratch.join("leftover.jpg").exists());
    }

    #[tokio::test]
    async fn test_merge_failure_surfaces_as_aggregation_failed() {
        let root = TempDir::new().unwrap();
        let merged = root.path().join("attachments.pdf");
        let scratch = root.path().join("jpg_temp");
        std::fs::create_dir_all(&scratch).unwrap();
        std::fs::write(scratch.join("pending.jpg"), b"x").unwrap();

        let files = vec![produced(root.path().join("a.pdf"))];

        let mut pdf = MockPdfEngine::new();
        pdf.expect_merge().returning(|_, _| {
            Err(MergerError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        });

        let result = PdfAggregator::new(&pdf)
            .aggregate(&files, &merged, &scratch)
            .await;

        assert!(matches!(
            result,
            Err(MergerError::AggregationFailed { .. })
        ));
        // Failed merge leaves the scratch directory alone
        assert!(scratch.join("pending.jpg").exists());
    }

    #[tokio::test]
    async fn test_missing_scratch_dir_is_not_an_error() {
        let root = TempDir::new().unwrap();
        let merged = root.path().join("attachments.pdf");
        let scratch = root.path().join("never-created");

        let files = vec![produced(root.path().join("a.pdf"))];

        let mut pdf = MockPdfEngine::new();
        pdf.expect_merge().returning(|_, _| Ok(()));

        let result = PdfAggregator::new(&pdf)
            .aggregate(&files, &merged, &scratch)
            .await
            .unwrap();

        assert!(result.is_some());
        assert!(scratch.exists());
    }
}
