// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Bar Crawler - Rust Core Library
//!
//! Resumable, rate-limited crawler for 1-minute OHLCV aggregates.
//!
//! # Architecture
//!
//! The crawler is layered inside → outside:
//!
//! - **Domain**: plain data types shared across layers
//!   - `bar`: the wire/persisted 1-minute bar
//!   - `job`: fetch jobs, job results, progress updates
//!
//! - **Application**: orchestration over ports
//!   - `ports`: the `BarSource` capability the pool drives
//!   - `crawl`: planner, worker pool, progress writer, manifests
//!   - `scheduler`: daily loop with graceful shutdown
//!
//! - **Infrastructure**: adapters
//!   - `polygon`: HTTP fetch engine (chunking, retries, cooldowns)
//!   - `sink`: csv/json/jsonl packet encodings
//!   - `tickers`: ticker-list loading and discovery
//!   - `config`: environment-variable configuration
//!   - `telemetry`: tracing subscriber setup
//!
//! Concurrency model: one worker per API key, a channel-backed key pool,
//! a single progress-writer task owning the on-disk progress map, and a
//! heartbeat task keeping long cycles observable.

pub mod application;
pub mod domain;
pub mod infrastructure;
