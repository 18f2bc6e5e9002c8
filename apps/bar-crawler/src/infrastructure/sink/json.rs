//! JSON array bar sink.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::Bar;

use super::{BarSink, SinkError};

/// Writes bars as a pretty-printed JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink;

impl BarSink for JsonSink {
    fn save(&self, bars: &[Bar], path: &Path) -> Result<(), SinkError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, bars)?;
        writer.flush()?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
