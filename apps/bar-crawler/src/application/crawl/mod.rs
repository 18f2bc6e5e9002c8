//! One crawl cycle: plan, fetch in parallel, report.

mod heartbeat;
mod planner;
mod pool;
mod progress;
mod report;
mod stats;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::ports::BarSource;
use crate::domain::ProgressUpdate;

pub use planner::plan_jobs;
pub use pool::run_pool;
pub use progress::{load_progress, run_progress_writer};
pub use report::{condense_failure_reasons, write_run_report, FAILED_MANIFEST, SUCCESS_MANIFEST};
pub use stats::{CrawlStats, SharedStats};

/// Interval between in-progress log lines.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Job spans below this are single days; packets then get day-based names.
const PER_DAY_THRESHOLD_HOURS: i64 = 25;

/// Run one full crawl cycle.
///
/// Plans jobs from the persisted progress, runs them across the key
/// pool, then rewrites the run manifests and logs a summary. Returns
/// the cycle stats so callers can inspect the outcome.
pub async fn run_one_crawl(
    source: Arc<dyn BarSource + 'static>,
    api_keys: &[String],
    tickers: &[String],
    save_base_dir: &Path,
    progress_path: &Path,
    progress_tx: mpsc::Sender<ProgressUpdate>,
    shutdown: CancellationToken,
) -> CrawlStats {
    let now = Utc::now();
    let progress = load_progress(progress_path);
    let jobs = plan_jobs(tickers, &progress, now);

    let skipped = tickers.len().saturating_sub(
        jobs.iter()
            .map(|j| j.ticker.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len(),
    );
    if jobs.is_empty() {
        info!(tickers = tickers.len(), "all tickers current, nothing to crawl");
        return CrawlStats::default();
    }
    if skipped > 0 {
        info!(skipped, "tickers already current");
    }

    // Gap-fill cycles carry single-day jobs; switch packet naming so one
    // file per day lands next to the backfill windows.
    let per_day = jobs
        .first()
        .is_some_and(|j| j.to - j.from < ChronoDuration::hours(PER_DAY_THRESHOLD_HOURS));
    source.set_per_day_mode(per_day);

    info!(
        jobs = jobs.len(),
        workers = api_keys.len(),
        per_day,
        "crawl cycle starting"
    );

    let stats = run_pool(
        Arc::clone(&source),
        api_keys,
        jobs,
        progress_tx,
        shutdown,
        HEARTBEAT_INTERVAL,
    )
    .await;

    log_summary(&stats);

    // A cycle cancelled before any job completed leaves the previous
    // run's manifests in place.
    if !stats.success_list().is_empty() || !stats.failed_list().is_empty() {
        if let Err(err) = write_run_report(save_base_dir, stats.success_list(), stats.failed_list())
        {
            warn!(error = %err, "failed to write run manifests");
        }
    }
    stats
}

fn log_summary(stats: &CrawlStats) {
    let (done, success, failed, bars) = stats.snapshot();
    info!(jobs = done, success, failed, total_bars = bars, "crawl cycle finished");

    for (ticker, count) in stats.ticker_totals() {
        info!(ticker = %ticker, bars = count, "ticker total");
    }
    for (key, count) in stats.key_totals() {
        info!(key = %key, bars = count, "key total");
    }
    if failed > 0 {
        warn!(
            failed,
            reasons = %condense_failure_reasons(stats.failed_list()),
            "failed jobs"
        );
    }
}
