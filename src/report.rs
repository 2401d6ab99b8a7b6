//! Regression report rendering.
//!
//! A regression is a test failure whose associated issue was already marked
//! resolved. Records accumulate during the run and are flushed to a single
//! report file at run end. The file extension selects the markup: `.rst`
//! renders reStructuredText, anything else renders Markdown.

use std::fmt::Write;
use std::path::Path;

/// One regression found during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegressionRecord {
    /// The tracker's identifier for the already-resolved issue.
    pub issue_id: String,
    /// Identity of the test that failed.
    pub test: String,
    /// The failure message captured from the test run.
    pub failure_message: String,
}

/// Renders records as a Markdown document, one heading block per record.
#[must_use]
pub fn render_markdown(records: &[RegressionRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(out, "# {}\n", record.issue_id);
        let _ = writeln!(out, "Regression was found by `{}`. Debug info are:\n", record.test);
        let _ = writeln!(out, "```\n{}\n```\n", record.failure_message);
    }
    out
}

/// Renders records as reStructuredText, one underlined heading per record.
#[must_use]
pub fn render_rst(records: &[RegressionRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(out, "{}", record.issue_id);
        let _ = writeln!(out, "{}\n", "=".repeat(record.issue_id.len()));
        let _ = writeln!(out, "Regression was found by ``{}``. Debug info are:\n", record.test);
        out.push_str(".. sourcecode:: text\n\n");
        for line in record.failure_message.lines() {
            let _ = writeln!(out, "    {line}");
        }
        out.push('\n');
    }
    out
}

/// Writes the report to `path`, selecting the format from its extension.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_report(path: &Path, records: &[RegressionRecord]) -> Result<(), std::io::Error> {
    let rendered = match path.extension().and_then(|ext| ext.to_str()) {
        Some("rst") => render_rst(records),
        _ => render_markdown(records),
    };
    std::fs::write(path, rendered)
}
