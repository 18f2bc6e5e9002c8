//! Minute-bar observation type.

use serde::{Deserialize, Serialize};

/// One 1-minute OHLCV aggregate as returned by the upstream API.
///
/// Field names mirror the wire format (`t`, `o`, `h`, `l`, `c`, `v`,
/// `vw`, `n`) so sinks can serialize bars without a mapping layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Window start, Unix epoch milliseconds.
    #[serde(rename = "t")]
    pub timestamp: i64,
    /// Open price.
    #[serde(rename = "o")]
    pub open: f64,
    /// High price.
    #[serde(rename = "h")]
    pub high: f64,
    /// Low price.
    #[serde(rename = "l")]
    pub low: f64,
    /// Close price.
    #[serde(rename = "c")]
    pub close: f64,
    /// Traded volume over the window.
    #[serde(rename = "v")]
    pub volume: i64,
    /// Volume-weighted average price, when reported.
    #[serde(rename = "vw", default, skip_serializing_if = "Option::is_none")]
    pub vwap: Option<f64>,
    /// Number of transactions in the window, when reported.
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_wire_field_names() {
        let bar = Bar {
            timestamp: 1_700_000_000_000,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 1000,
            vwap: Some(1.2),
            transactions: Some(42),
        };
        let json = serde_json::to_value(bar).unwrap();
        assert_eq!(json["t"], 1_700_000_000_000_i64);
        assert_eq!(json["v"], 1000);
        assert_eq!(json["vw"], 1.2);
        assert_eq!(json["n"], 42);
    }

    #[test]
    fn optional_fields_omitted_when_absent() {
        let bar = Bar {
            timestamp: 0,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0,
            vwap: None,
            transactions: None,
        };
        let json = serde_json::to_value(bar).unwrap();
        assert!(json.get("vw").is_none());
        assert!(json.get("n").is_none());
    }
}
