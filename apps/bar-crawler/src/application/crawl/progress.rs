//! Progress persistence: ticker -> last completed date.
//!
//! A single writer task owns the file; workers send updates over a
//! bounded channel and never touch the map directly. Each update rewrites
//! the whole file, which keeps the on-disk state a plain JSON object and
//! makes a crash lose at most the updates still in the channel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::ProgressUpdate;

/// Load the persisted progress map.
///
/// A missing or unreadable file yields an empty map: the planner then
/// schedules a full backfill, which is the safe direction to fail in.
#[must_use]
pub fn load_progress(path: &Path) -> HashMap<String, String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no progress file, starting fresh");
            return HashMap::new();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(map) => map,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "progress file unreadable, starting fresh");
            HashMap::new()
        }
    }
}

/// Drain progress updates and persist them until the channel closes.
///
/// Per-ticker dates only move forward: same-ticker day jobs can finish
/// out of order across workers, and an older date arriving late must
/// not regress the stored one. Runs for the whole process lifetime so
/// updates survive across crawl cycles. Write failures are logged and
/// the update is kept in memory, so a transient disk error only delays
/// persistence.
pub async fn run_progress_writer(path: PathBuf, mut rx: mpsc::Receiver<ProgressUpdate>) {
    let mut map = load_progress(&path);
    while let Some(update) = rx.recv().await {
        // ISO dates compare correctly as strings.
        if map
            .get(&update.ticker)
            .is_some_and(|current| current.as_str() >= update.date.as_str())
        {
            debug!(
                ticker = %update.ticker,
                date = %update.date,
                "stale progress update ignored"
            );
            continue;
        }
        map.insert(update.ticker, update.date);
        if let Err(err) = write_map(&path, &map) {
            warn!(path = %path.display(), error = %err, "failed to persist progress");
        }
    }
    debug!("progress writer stopped");
}

fn write_map(path: &Path, map: &HashMap<String, String>) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(map)?;
    std::fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let map = load_progress(&dir.path().join("absent.json"));
        assert!(map.is_empty());
    }

    #[test]
    fn corrupt_file_is_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(load_progress(&path).is_empty());
    }

    #[tokio::test]
    async fn writer_merges_updates_into_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".lastday.json");
        std::fs::write(&path, r#"{"AAPL":"2024-06-10"}"#).unwrap();

        let (tx, rx) = mpsc::channel(8);
        let writer = tokio::spawn(run_progress_writer(path.clone(), rx));

        tx.send(ProgressUpdate {
            ticker: "AAPL".to_string(),
            date: "2024-06-11".to_string(),
        })
        .await
        .unwrap();
        tx.send(ProgressUpdate {
            ticker: "MSFT".to_string(),
            date: "2024-06-11".to_string(),
        })
        .await
        .unwrap();
        drop(tx);
        writer.await.unwrap();

        let map = load_progress(&path);
        assert_eq!(map.get("AAPL").map(String::as_str), Some("2024-06-11"));
        assert_eq!(map.get("MSFT").map(String::as_str), Some("2024-06-11"));
    }

    #[tokio::test]
    async fn out_of_order_updates_never_regress_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".lastday.json");

        let (tx, rx) = mpsc::channel(8);
        let writer = tokio::spawn(run_progress_writer(path.clone(), rx));

        // Day-12's job finishes before day-11's on another key.
        for date in ["2024-06-12", "2024-06-11"] {
            tx.send(ProgressUpdate {
                ticker: "AAPL".to_string(),
                date: date.to_string(),
            })
            .await
            .unwrap();
        }
        drop(tx);
        writer.await.unwrap();

        let map = load_progress(&path);
        assert_eq!(map.get("AAPL").map(String::as_str), Some("2024-06-12"));
    }
}
