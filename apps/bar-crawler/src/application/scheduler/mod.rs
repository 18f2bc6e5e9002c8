//! Daily scheduling loop.
//!
//! Runs a crawl cycle immediately at startup, then once per day at the
//! configured UTC time. Shutdown is graceful: cancellation stops workers
//! between jobs, the in-flight cycle drains, and the loop exits instead
//! of arming the next timer.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::crawl::{run_one_crawl, run_progress_writer};
use crate::application::ports::BarSource;
use crate::infrastructure::config::ScheduleSettings;

/// Bounded buffer between workers and the progress writer.
const PROGRESS_CHANNEL_CAPACITY: usize = 256;

/// Next occurrence of the scheduled wall-clock time at or after `now`.
#[must_use]
pub fn next_run_time(schedule: ScheduleSettings, now: DateTime<Utc>) -> DateTime<Utc> {
    let time =
        NaiveTime::from_hms_opt(schedule.hour, schedule.minute, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(time).and_utc();
    if today > now {
        today
    } else {
        today + Days::new(1)
    }
}

/// Run crawl cycles until `shutdown` is cancelled.
///
/// The progress writer task spans all cycles so updates from one cycle
/// are visible to the next cycle's planner.
pub async fn run(
    source: Arc<dyn BarSource + 'static>,
    api_keys: Vec<String>,
    tickers: Vec<String>,
    save_base_dir: PathBuf,
    progress_path: PathBuf,
    schedule: ScheduleSettings,
    shutdown: CancellationToken,
) {
    let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
    let writer = tokio::spawn(run_progress_writer(progress_path.clone(), progress_rx));

    loop {
        let _ = run_one_crawl(
            Arc::clone(&source),
            &api_keys,
            &tickers,
            &save_base_dir,
            &progress_path,
            progress_tx.clone(),
            shutdown.clone(),
        )
        .await;

        if shutdown.is_cancelled() {
            break;
        }

        let next = next_run_time(schedule, Utc::now());
        // A negative wait (clock moved past the slot mid-cycle) collapses
        // to zero and the next cycle starts immediately.
        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        info!(next = %next.format("%Y-%m-%d %H:%M:%S UTC"), "waiting for next scheduled run");
        tokio::select! {
            () = shutdown.cancelled() => break,
            () = tokio::time::sleep(wait) => {}
        }
    }

    drop(progress_tx);
    let _ = writer.await;
    info!("scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn before_slot_runs_today() {
        let schedule = ScheduleSettings { hour: 0, minute: 30 };
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 10, 0).unwrap();
        assert_eq!(
            next_run_time(schedule, now),
            Utc.with_ymd_and_hms(2024, 6, 15, 0, 30, 0).unwrap()
        );
    }

    #[test]
    fn after_slot_runs_tomorrow() {
        let schedule = ScheduleSettings { hour: 0, minute: 30 };
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 30, 0).unwrap();
        assert_eq!(
            next_run_time(schedule, now),
            Utc.with_ymd_and_hms(2024, 6, 16, 0, 30, 0).unwrap()
        );
    }

    #[test]
    fn month_boundary_wraps() {
        let schedule = ScheduleSettings { hour: 23, minute: 0 };
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 23, 30, 0).unwrap();
        assert_eq!(
            next_run_time(schedule, now),
            Utc.with_ymd_and_hms(2024, 7, 1, 23, 0, 0).unwrap()
        );
    }
}
