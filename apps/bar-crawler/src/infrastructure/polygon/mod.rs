//! Polygon aggregates API adapter.
//!
//! - `chunker`: splits job windows to respect the per-request row cap
//! - `messages`: wire types with tolerant numeric decoding
//! - `client`: the fetch engine implementing the `BarSource` port

pub mod chunker;
pub mod client;
pub mod messages;

pub use chunker::{adjust_last_window, split_date_range, MAX_DAYS_PER_WINDOW};
pub use client::{FetchSettings, PolygonClient};
pub use messages::{AggregatesResponse, RawBar};
