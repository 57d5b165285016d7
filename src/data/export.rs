//! Weekly report export to disk

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// File name the weekly report is saved under
pub const WEEKLY_REPORT_FILE_NAME: &str = "weekly_report.json";

/// Errors that can occur while saving a report
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writes the raw weekly report JSON, pretty-printed, into `dir`
///
/// Creates `dir` if needed and overwrites any earlier export.
///
/// # Returns
/// The path of the written file
pub fn export_weekly_report(raw: &serde_json::Value, dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;

    let json = serde_json::to_string_pretty(raw)?;
    let path = dir.join(WEEKLY_REPORT_FILE_NAME);
    fs::write(&path, json)?;

    tracing::info!(path = %path.display(), "Exported weekly report");
    Ok(path)
}
