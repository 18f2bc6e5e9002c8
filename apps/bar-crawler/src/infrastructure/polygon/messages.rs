//! Wire types for the aggregates endpoint.
//!
//! The upstream encodes `v` (volume) and `n` (transactions) inconsistently:
//! integral JSON numbers for most rows, scientific-notation floats for very
//! liquid tickers, and occasionally numeric strings. [`flexible_i64`]
//! accepts all three.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::domain::Bar;

/// Response body of `GET /v2/aggs/ticker/{ticker}/range/1/minute/{from}/{to}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregatesResponse {
    /// Ticker echoed by the API.
    #[serde(default)]
    pub ticker: Option<String>,
    /// Number of aggregates the query matched.
    #[serde(rename = "queryCount", default)]
    pub query_count: i64,
    /// Number of rows in `results`.
    #[serde(rename = "resultsCount", default)]
    pub results_count: i64,
    /// Whether prices are split-adjusted.
    #[serde(default)]
    pub adjusted: bool,
    /// Aggregate rows, ascending by timestamp. Absent on DELAYED responses.
    #[serde(default)]
    pub results: Vec<RawBar>,
    /// `"OK"` on success, `"DELAYED"` when the window is not finalized.
    pub status: String,
    /// Request id for support escalation.
    #[serde(default)]
    pub request_id: String,
    /// Pagination cursor; present when the window exceeded the row cap.
    #[serde(default)]
    pub next_url: Option<String>,
}

/// One aggregate row as decoded off the wire.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawBar {
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
    /// Traded volume; integral, scientific, or stringly on the wire.
    #[serde(rename = "v", deserialize_with = "flexible_i64")]
    pub volume: i64,
    /// Volume-weighted average price.
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
    /// Transaction count; same encoding variance as volume.
    #[serde(rename = "n", default, deserialize_with = "flexible_i64_opt")]
    pub transactions: Option<i64>,
}

impl From<RawBar> for Bar {
    fn from(raw: RawBar) -> Self {
        Self {
            timestamp: raw.timestamp,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
            vwap: raw.vwap,
            transactions: raw.transactions,
        }
    }
}

struct FlexibleI64Visitor;

impl Visitor<'_> for FlexibleI64Visitor {
    type Value = i64;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("an integer, a float, or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("integer out of range: {v}")))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if v.is_finite() {
            Ok(v as i64)
        } else {
            Err(E::custom(format!("non-finite number: {v}")))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        #[allow(clippy::cast_possible_truncation)]
        v.parse::<f64>()
            .map(|f| f as i64)
            .map_err(|_| E::custom(format!("cannot parse as i64: {v}")))
    }
}

fn flexible_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    d.deserialize_any(FlexibleI64Visitor)
}

fn flexible_i64_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    struct OptVisitor;

    impl<'de> Visitor<'de> for OptVisitor {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("an optional integer, float, or numeric string")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            flexible_i64(d).map(Some)
        }
    }

    d.deserialize_option(OptVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_integral_volume() {
        let raw: RawBar = serde_json::from_str(
            r#"{"t":1700000000000,"o":1.0,"h":2.0,"l":0.5,"c":1.5,"v":123456,"vw":1.2,"n":42}"#,
        )
        .unwrap();
        assert_eq!(raw.volume, 123_456);
        assert_eq!(raw.transactions, Some(42));
    }

    #[test]
    fn decodes_scientific_notation_volume() {
        let raw: RawBar = serde_json::from_str(
            r#"{"t":1700000000000,"o":1.0,"h":2.0,"l":0.5,"c":1.5,"v":1.5e6,"n":2.1e3}"#,
        )
        .unwrap();
        assert_eq!(raw.volume, 1_500_000);
        assert_eq!(raw.transactions, Some(2100));
    }

    #[test]
    fn decodes_string_volume() {
        let raw: RawBar = serde_json::from_str(
            r#"{"t":1700000000000,"o":1.0,"h":2.0,"l":0.5,"c":1.5,"v":"98765"}"#,
        )
        .unwrap();
        assert_eq!(raw.volume, 98_765);
        assert_eq!(raw.transactions, None);
    }

    #[test]
    fn delayed_response_without_results() {
        let resp: AggregatesResponse =
            serde_json::from_str(r#"{"status":"DELAYED","request_id":"abc"}"#).unwrap();
        assert_eq!(resp.status, "DELAYED");
        assert!(resp.results.is_empty());
        assert!(resp.next_url.is_none());
    }

    #[test]
    fn full_response_round_trip() {
        let body = r#"{
            "ticker": "AAPL",
            "queryCount": 2,
            "resultsCount": 2,
            "adjusted": true,
            "results": [
                {"t":1,"o":1.0,"h":1.0,"l":1.0,"c":1.0,"v":10},
                {"t":2,"o":1.0,"h":1.0,"l":1.0,"c":1.0,"v":20,"vw":1.0,"n":3}
            ],
            "status": "OK",
            "request_id": "r1",
            "next_url": "https://api.example.com/next"
        }"#;
        let resp: AggregatesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.results[1].volume, 20);
        assert!(resp.next_url.is_some());

        let bar: Bar = resp.results[1].into();
        assert_eq!(bar.transactions, Some(3));
    }
}
