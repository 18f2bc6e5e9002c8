//! Line-delimited JSON bar sink.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::Bar;

use super::{BarSink, SinkError};

/// Writes bars as one JSON object per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlSink;

impl BarSink for JsonlSink {
    fn save(&self, bars: &[Bar], path: &Path) -> Result<(), SinkError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for bar in bars {
            serde_json::to_writer(&mut writer, bar)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "jsonl"
    }
}
