//! Per-run manifests and failure summaries.
//!
//! After each cycle two small JSON files are rewritten next to the data:
//! `.lastrun.success.json` with the tickers that produced data and
//! `.lastrun.failed.json` with the failed jobs and their reasons. They
//! exist for operators poking at the data directory, not for resume
//! logic (the progress map owns that).

use std::path::Path;

use tracing::debug;

use crate::domain::FailedEntry;

/// Successful-tickers manifest filename.
pub const SUCCESS_MANIFEST: &str = ".lastrun.success.json";
/// Failed-jobs manifest filename.
pub const FAILED_MANIFEST: &str = ".lastrun.failed.json";

/// How many distinct failure reasons the summary log spells out.
const MAX_REASONS_SHOWN: usize = 5;

/// Manifest write error.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Filesystem failure.
    #[error("manifest io: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization failure.
    #[error("manifest encode: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rewrite both manifests under `base_dir`.
///
/// # Errors
///
/// Returns an error when either file cannot be encoded or written.
pub fn write_run_report(
    base_dir: &Path,
    success: &[String],
    failed: &[FailedEntry],
) -> Result<(), ReportError> {
    let success_path = base_dir.join(SUCCESS_MANIFEST);
    std::fs::write(&success_path, serde_json::to_vec_pretty(success)?)?;
    debug!(path = %success_path.display(), count = success.len(), "wrote success manifest");

    let failed_path = base_dir.join(FAILED_MANIFEST);
    std::fs::write(&failed_path, serde_json::to_vec_pretty(failed)?)?;
    debug!(path = %failed_path.display(), count = failed.len(), "wrote failed manifest");
    Ok(())
}

/// Condense failure reasons into one log line: distinct reasons with
/// occurrence counts, first five spelled out, the rest folded into a
/// `+N more` tail.
#[must_use]
pub fn condense_failure_reasons(failed: &[FailedEntry]) -> String {
    let mut reasons: Vec<(String, usize)> = Vec::new();
    for entry in failed {
        if let Some(slot) = reasons.iter_mut().find(|(r, _)| *r == entry.reason) {
            slot.1 += 1;
        } else {
            reasons.push((entry.reason.clone(), 1));
        }
    }
    reasons.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut parts: Vec<String> = reasons
        .iter()
        .take(MAX_REASONS_SHOWN)
        .map(|(reason, count)| format!("{reason} (x{count})"))
        .collect();
    if reasons.len() > MAX_REASONS_SHOWN {
        parts.push(format!("+{} more", reasons.len() - MAX_REASONS_SHOWN));
    }
    parts.join("; ")
}
