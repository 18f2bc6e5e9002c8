//! Periodic crawl progress heartbeat.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::stats::SharedStats;

/// Log a progress snapshot every `interval` until cancelled.
///
/// Runs alongside the workers so long cycles stay observable even when
/// individual jobs spend minutes inside rate-limit cooldowns.
pub async fn run_heartbeat(
    interval: Duration,
    total_jobs: usize,
    stats: SharedStats,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // First tick fires immediately; skip it so the initial log is not noise.
    ticker.tick().await;
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = ticker.tick() => {
                let (done, success, failed, bars) = stats.lock().snapshot();
                info!(
                    done,
                    total = total_jobs,
                    success,
                    failed,
                    bars,
                    "crawl in progress"
                );
            }
        }
    }
}
