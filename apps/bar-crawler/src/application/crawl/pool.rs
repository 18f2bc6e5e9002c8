//! Worker pool: one worker per API key, jobs taken first-come-first-served.
//!
//! Keys live in a channel-backed pool. A worker checks a key out for the
//! full duration of one job and returns it unconditionally afterwards, so
//! the per-key rate limit inside the fetch engine is never shared between
//! concurrent jobs. Shutdown is observed between jobs only; an in-flight
//! fetch always runs to completion so progress stays consistent.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::ports::BarSource;
use crate::domain::{key_prefix, Job, JobResult, ProgressUpdate};

use super::heartbeat::run_heartbeat;
use super::stats::{CrawlStats, SharedStats};

/// Capacity of the drop-on-full side channels.
const SIDE_CHANNEL_CAPACITY: usize = 64;

/// Run `jobs` across one worker per API key and return the cycle stats.
///
/// `progress_tx` receives at most one update per successful job; updates
/// are dropped (with a warning) rather than blocking a worker when the
/// writer falls behind.
pub async fn run_pool(
    source: Arc<dyn BarSource + 'static>,
    api_keys: &[String],
    jobs: Vec<Job>,
    progress_tx: mpsc::Sender<ProgressUpdate>,
    shutdown: CancellationToken,
    heartbeat_interval: Duration,
) -> CrawlStats {
    let total = jobs.len();
    let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));

    // Key pool: take = recv, return = send. Capacity equals the key count
    // so returns never block.
    let (key_tx, key_rx) = mpsc::channel::<String>(api_keys.len());
    for key in api_keys {
        // Channel has room for every key.
        let _ = key_tx.try_send(key.clone());
    }
    let key_rx = Arc::new(tokio::sync::Mutex::new(key_rx));

    let (result_tx, mut result_rx) = mpsc::channel::<JobResult>(total + SIDE_CHANNEL_CAPACITY);
    let (err_tx, mut err_rx) = mpsc::channel::<String>(SIDE_CHANNEL_CAPACITY);

    let stats: SharedStats = Arc::new(Mutex::new(CrawlStats::default()));

    let collector = {
        let stats = Arc::clone(&stats);
        tokio::spawn(async move {
            while let Some(result) = result_rx.recv().await {
                stats.lock().record(&result);
            }
        })
    };

    let err_logger = tokio::spawn(async move {
        while let Some(message) = err_rx.recv().await {
            error!(error = %message, "job failed");
        }
    });

    let heartbeat_cancel = CancellationToken::new();
    let heartbeat = tokio::spawn(run_heartbeat(
        heartbeat_interval,
        total,
        Arc::clone(&stats),
        heartbeat_cancel.clone(),
    ));

    let mut workers = Vec::with_capacity(api_keys.len());
    for worker_id in 0..api_keys.len() {
        workers.push(tokio::spawn(run_worker(
            worker_id,
            Arc::clone(&source),
            Arc::clone(&queue),
            Arc::clone(&key_rx),
            key_tx.clone(),
            result_tx.clone(),
            err_tx.clone(),
            progress_tx.clone(),
            shutdown.clone(),
        )));
    }
    drop(result_tx);
    drop(err_tx);
    drop(key_tx);

    for worker in workers {
        if let Err(err) = worker.await {
            error!(error = %err, "worker panicked");
        }
    }
    // All result senders are gone once the workers exit.
    let _ = collector.await;
    let _ = err_logger.await;
    heartbeat_cancel.cancel();
    let _ = heartbeat.await;

    let snapshot = stats.lock().clone();
    snapshot
}

#[allow(clippy::too_many_arguments)]
async fn run_worker(
    worker_id: usize,
    source: Arc<dyn BarSource>,
    queue: Arc<Mutex<VecDeque<Job>>>,
    key_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<String>>>,
    key_tx: mpsc::Sender<String>,
    result_tx: mpsc::Sender<JobResult>,
    err_tx: mpsc::Sender<String>,
    progress_tx: mpsc::Sender<ProgressUpdate>,
    shutdown: CancellationToken,
) {
    loop {
        if shutdown.is_cancelled() {
            debug!(worker_id, "worker stopping on shutdown");
            return;
        }
        let Some(job) = queue.lock().pop_front() else {
            debug!(worker_id, "queue drained, worker exiting");
            return;
        };

        // Blocks until some worker returns a key. Keys are always
        // returned, so this cannot deadlock.
        let key = {
            let mut rx = key_rx.lock().await;
            rx.recv().await
        };
        let Some(key) = key else {
            return;
        };
        let prefix = key_prefix(&key).to_string();
        info!(
            worker_id,
            key = %prefix,
            ticker = %job.ticker,
            range = %job.date_range(),
            "job start"
        );

        let outcome = source
            .fetch_minute_bars(&job.ticker, &key, job.from, job.to)
            .await;
        // Unconditional return keeps the pool at full strength.
        let _ = key_tx.send(key).await;

        let result = match outcome {
            Ok(bars) if bars.is_empty() => {
                let reason = "no data".to_string();
                warn!(ticker = %job.ticker, range = %job.date_range(), "job returned no bars");
                failure(&job, &prefix, reason)
            }
            Ok(bars) => {
                info!(
                    worker_id,
                    ticker = %job.ticker,
                    range = %job.date_range(),
                    bars = bars.len(),
                    "job done"
                );
                if progress_tx
                    .try_send(ProgressUpdate {
                        ticker: job.ticker.clone(),
                        date: job.progress_date(),
                    })
                    .is_err()
                {
                    warn!(ticker = %job.ticker, "progress channel full, update dropped");
                }
                JobResult {
                    ok: true,
                    ticker: job.ticker.clone(),
                    date_range: job.date_range(),
                    reason: String::new(),
                    bars: bars.len(),
                    key_prefix: prefix.clone(),
                }
            }
            Err(err) => {
                let reason = err.to_string();
                let _ = err_tx.try_send(format!(
                    "{} {}: {reason}",
                    job.ticker,
                    job.date_range()
                ));
                failure(&job, &prefix, reason)
            }
        };
        if result_tx.send(result).await.is_err() {
            return;
        }
    }
}

fn failure(job: &Job, prefix: &str, reason: String) -> JobResult {
    JobResult {
        ok: false,
        ticker: job.ticker.clone(),
        date_range: job.date_range(),
        reason,
        bars: 0,
        key_prefix: prefix.to_string(),
    }
}
