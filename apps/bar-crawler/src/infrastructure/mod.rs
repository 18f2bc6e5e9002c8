//! Infrastructure layer - Adapters and external integrations.

pub mod config;
pub mod polygon;
pub mod sink;
pub mod telemetry;
pub mod tickers;
