//! CSV bar sink.

use std::path::Path;

use crate::domain::Bar;

use super::{BarSink, SinkError};

/// Writes bars as CSV with a `t,o,h,l,c,v,vw,n` header row.
///
/// Optional fields serialize as empty cells, keeping every row eight
/// columns wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSink;

impl BarSink for CsvSink {
    fn save(&self, bars: &[Bar], path: &Path) -> Result<(), SinkError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["t", "o", "h", "l", "c", "v", "vw", "n"])?;
        for bar in bars {
            writer.write_record([
                bar.timestamp.to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
                bar.vwap.map(|v| v.to_string()).unwrap_or_default(),
                bar.transactions.map(|n| n.to_string()).unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}
