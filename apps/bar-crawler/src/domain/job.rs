//! Crawl job and result types.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One crawl unit: a contiguous time window to fetch for a single ticker.
///
/// Created by the resume planner and consumed exactly once by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Upper-cased ticker symbol.
    pub ticker: String,
    /// Inclusive window start (UTC).
    pub from: DateTime<Utc>,
    /// Inclusive window end (UTC).
    pub to: DateTime<Utc>,
}

impl Job {
    /// Human-readable `from..to` date range for logs and manifests.
    #[must_use]
    pub fn date_range(&self) -> String {
        format!(
            "{}..{}",
            self.from.format("%Y-%m-%d"),
            self.to.format("%Y-%m-%d")
        )
    }

    /// The calendar date recorded as progress when this job succeeds.
    #[must_use]
    pub fn progress_date(&self) -> String {
        self.to.format("%Y-%m-%d").to_string()
    }
}

/// Loggable prefix of an API key.
///
/// Only this prefix may ever reach logs, results, or manifests; the full
/// key stays inside the pool and the fetch engine.
#[must_use]
pub fn key_prefix(key: &str) -> &str {
    key.get(..8).unwrap_or(key)
}

/// Outcome of one job, emitted once per job for fan-in.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Whether the job completed with at least one bar.
    pub ok: bool,
    /// Ticker the job covered.
    pub ticker: String,
    /// `from..to` date range of the job.
    pub date_range: String,
    /// Failure reason; empty for successful jobs.
    pub reason: String,
    /// Number of bars fetched.
    pub bars: usize,
    /// First characters of the API key that served the job.
    pub key_prefix: String,
}

/// A failed job recorded in the per-run failure manifest.
#[derive(Debug, Clone, Serialize)]
pub struct FailedEntry {
    /// Ticker the job covered.
    pub ticker: String,
    /// `from..to` date range of the job.
    pub date_range: String,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Sent to the progress writer when a job succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Ticker that advanced.
    pub ticker: String,
    /// Last completed calendar date, `YYYY-MM-DD`.
    pub date: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_range_formats_calendar_dates() {
        let job = Job {
            ticker: "AAPL".to_string(),
            from: Utc.with_ymd_and_hms(2024, 6, 11, 0, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2024, 6, 11, 23, 59, 59).unwrap(),
        };
        assert_eq!(job.date_range(), "2024-06-11..2024-06-11");
        assert_eq!(job.progress_date(), "2024-06-11");
    }

    #[test]
    fn key_prefix_truncates_long_keys() {
        assert_eq!(key_prefix("abcdefghijklmnop"), "abcdefgh");
        assert_eq!(key_prefix("short"), "short");
        assert_eq!(key_prefix(""), "");
    }
}
