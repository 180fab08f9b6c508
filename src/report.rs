//! Human-readable summary of a finished run
//!
//! The rendered text is the program's main output: a short letter naming
//! the merged document and listing its contents in merge order, followed
//! by a statistics block. Rendering is pure string work; nothing here
//! touches the filesystem or the network.

use crate::models::RunResult;

pub struct SummaryReporter {
    signature: String,
}

impl SummaryReporter {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
        }
    }

    /// Render the full summary for one run.
    ///
    /// Files are numbered from 1 in the order they were produced, which is
    /// also their order inside the merged document.
    pub fn render(&self, result: &RunResult) -> String {
        let mut out = String::new();

        out.push_str("Hello,\n\n");
        if result.produced.is_empty() {
            out.push_str(
                "no matching attachments were found in the selected range, so nothing was merged.\n",
            );
        } else {
            // The file list always appears when files were produced, even if
            // the final merge failed; only the greeting differs.
            match &result.merged_path {
                Some(merged) => out.push_str(&format!(
                    "the attached document {} combines the following files:\n\n",
                    display_name(merged)
                )),
                None => out.push_str(
                    "the combined document could not be assembled; \
                     the following files were still produced individually:\n\n",
                ),
            }
            for (index, file) in result.produced.iter().enumerate() {
                out.push_str(&format!("  {}. {}\n", index + 1, file.base_name()));
            }
        }

        out.push_str(&format!("\nBest regards,\n{}\n", self.signature));

        out.push_str("\n----------------------------------------\n");
        out.push_str(&format!("Period:           {}\n", result.period));
        out.push_str(&format!(
            "Range:            {} to {} (exclusive)\n",
            result.interval.start.format("%Y-%m-%d"),
            result.interval.end.format("%Y-%m-%d")
        ));
        out.push_str(&format!("Messages scanned: {}\n", result.message_count));
        out.push_str(&format!("Files produced:   {}\n", result.produced.len()));
        out.push_str(&format!(
            "Attachments dir:  {}\n",
            result.attachments_dir.display()
        ));
        match &result.merged_path {
            Some(merged) => out.push_str(&format!("Merged PDF:       {}\n", merged.display())),
            None => out.push_str("Merged PDF:       none\n"),
        }

        out
    }
}

/// File name of the merged document, falling back to the whole path
fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
