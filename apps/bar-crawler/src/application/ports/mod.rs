//! Port definitions for the crawl orchestration layer.
//!
//! The worker pool depends only on these interfaces, never on a concrete
//! provider type. A provider advertises exactly the operations the
//! orchestration needs: fetch a window with a borrowed key, and switch the
//! per-day persistence naming for a cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::Bar;

/// Errors surfaced by a [`BarSource`] fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network-level failure that survived the retry budget.
    #[error("network error after {attempts} attempts: {message}")]
    Network {
        /// Attempts made before giving up.
        attempts: u32,
        /// Underlying transport error.
        message: String,
    },

    /// HTTP 429 on every attempt.
    #[error("API rate limit (429) after {attempts} attempts")]
    RateLimited {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Non-success HTTP status other than 429.
    #[error("API status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// Response body could not be decoded on any attempt.
    #[error("malformed response after {attempts} attempts: {message}")]
    Malformed {
        /// Attempts made before giving up.
        attempts: u32,
        /// Decode error.
        message: String,
    },

    /// Response decoded but reported a terminal non-OK status field.
    #[error("API status not OK: {0}")]
    NotOk(String),
}

/// Capability interface for fetching minute bars with a caller-owned key.
///
/// Callers are responsible for key rotation and for pacing key reuse; an
/// implementation enforces its own per-key cooldown around the requests it
/// issues for a single call.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Fetch 1-minute bars for `ticker` over `[from, to]` using `api_key`.
    ///
    /// Windows the upstream marks as not yet finalized contribute zero bars
    /// without failing the call.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when any window fails terminally; no partial
    /// bars are returned in that case.
    async fn fetch_minute_bars(
        &self,
        ticker: &str,
        api_key: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Bar>, FetchError>;

    /// Switch between one-file-per-day and one-file-per-window persistence
    /// naming for subsequent fetches.
    fn set_per_day_mode(&self, per_day: bool);
}
