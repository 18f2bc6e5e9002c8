//! Shared crawl cycle statistics.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{FailedEntry, JobResult};

/// Counters and manifests accumulated over one crawl cycle.
///
/// A single collector task owns the updates; the heartbeat and the
/// end-of-cycle summary only read snapshots.
#[derive(Debug, Default, Clone)]
pub struct CrawlStats {
    success: usize,
    failed: usize,
    bars_per_ticker: HashMap<String, usize>,
    bars_per_key: HashMap<String, usize>,
    success_list: Vec<String>,
    failed_list: Vec<FailedEntry>,
}

impl CrawlStats {
    /// Fold one job result into the counters.
    pub fn record(&mut self, result: &JobResult) {
        if result.ok {
            self.success += 1;
            *self
                .bars_per_ticker
                .entry(result.ticker.clone())
                .or_default() += result.bars;
            *self
                .bars_per_key
                .entry(result.key_prefix.clone())
                .or_default() += result.bars;
            if !self.success_list.contains(&result.ticker) {
                self.success_list.push(result.ticker.clone());
            }
        } else {
            self.failed += 1;
            self.failed_list.push(FailedEntry {
                ticker: result.ticker.clone(),
                date_range: result.date_range.clone(),
                reason: result.reason.clone(),
            });
        }
    }

    /// (done, success, failed, total bars) for progress reporting.
    #[must_use]
    pub fn snapshot(&self) -> (usize, usize, usize, usize) {
        let total_bars = self.bars_per_ticker.values().sum();
        (self.success + self.failed, self.success, self.failed, total_bars)
    }

    /// Per-ticker bar totals, ticker-alphabetical.
    #[must_use]
    pub fn ticker_totals(&self) -> Vec<(String, usize)> {
        sorted_by_name(&self.bars_per_ticker)
    }

    /// Per-key-prefix bar totals, prefix-alphabetical.
    #[must_use]
    pub fn key_totals(&self) -> Vec<(String, usize)> {
        sorted_by_name(&self.bars_per_key)
    }

    /// Tickers that produced at least one successful job, first-seen order.
    #[must_use]
    pub fn success_list(&self) -> &[String] {
        &self.success_list
    }

    /// Failed jobs, in completion order.
    #[must_use]
    pub fn failed_list(&self) -> &[FailedEntry] {
        &self.failed_list
    }
}

fn sorted_by_name(map: &HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> =
        map.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

/// Stats handle shared between the collector, heartbeat, and summary.
pub type SharedStats = Arc<Mutex<CrawlStats>>;
