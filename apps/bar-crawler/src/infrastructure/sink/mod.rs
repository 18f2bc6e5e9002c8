//! Bar persistence sinks.
//!
//! The fetch engine hands completed bars to a [`BarSink`] keyed by ticker
//! and window; the sink owns the on-disk encoding. Selectable via
//! `SAVE_FORMAT`.

use std::path::Path;

use crate::domain::Bar;

mod csv;
mod json;
mod jsonl;

pub use csv::CsvSink;
pub use json::JsonSink;
pub use jsonl::JsonlSink;

/// Errors from writing a bar packet.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding failure.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// JSON encoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Capability for persisting a batch of bars to one file.
pub trait BarSink: Send + Sync {
    /// Write `bars` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] when the file cannot be written or encoded.
    fn save(&self, bars: &[Bar], path: &Path) -> Result<(), SinkError>;

    /// File extension for this encoding, without the leading dot.
    fn extension(&self) -> &'static str;
}

/// Look up a sink implementation by format name.
///
/// Returns `None` for unknown formats; callers treat that as a fatal
/// configuration error.
#[must_use]
pub fn for_format(format: &str) -> Option<Box<dyn BarSink>> {
    match format.to_lowercase().as_str() {
        "csv" => Some(Box::new(CsvSink)),
        "json" => Some(Box::new(JsonSink)),
        "jsonl" => Some(Box::new(JsonlSink)),
        _ => None,
    }
}
