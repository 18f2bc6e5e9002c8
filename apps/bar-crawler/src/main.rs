//! Bar Crawler Binary
//!
//! Crawls 1-minute OHLCV aggregates on a daily schedule.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin bar-crawler
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `POLYGON_API_KEYS`: Comma-separated API keys (or `POLYGON_API_KEY`)
//!
//! ## Optional
//! - `DATA_DIR`: Root data directory (default: data)
//! - `SAVE_FORMAT`: csv | json | jsonl (default: jsonl; csv for dev `PROFILE`)
//! - `TICKERS_FILE`: Explicit ticker list; falls back to `indices/` discovery
//! - `RUN_HOUR` / `RUN_MINUTE`: Daily UTC run time (default: 00:30)
//! - `LOG_LEVEL`: Default log level when `RUST_LOG` is unset (default: info)

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use bar_crawler::application::ports::BarSource;
use bar_crawler::application::scheduler;
use bar_crawler::infrastructure::config::CrawlerConfig;
use bar_crawler::infrastructure::polygon::{FetchSettings, PolygonClient};
use bar_crawler::infrastructure::sink;
use bar_crawler::infrastructure::telemetry;
use bar_crawler::infrastructure::tickers::load_tickers_or_discover;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let config = CrawlerConfig::from_env()?;
    telemetry::init(&config.log_level);

    tracing::info!(
        keys = config.api_keys.len(),
        format = %config.save_format,
        data_dir = %config.data_dir.display(),
        "starting bar crawler"
    );

    let tickers = load_tickers_or_discover(config.tickers_file.as_deref())?;
    tracing::info!(tickers = tickers.len(), "loaded ticker list");

    let save_base_dir = config.save_base_dir();
    std::fs::create_dir_all(&save_base_dir)?;

    let sink = sink::for_format(&config.save_format).ok_or_else(|| {
        anyhow::anyhow!(
            "unsupported SAVE_FORMAT {:?} (expected csv, json, or jsonl)",
            config.save_format
        )
    })?;

    let client: Arc<dyn BarSource> = Arc::new(
        PolygonClient::new(FetchSettings::default())?.with_output(save_base_dir.clone(), sink),
    );

    // Signal watcher cancels the token; the scheduler drains in-flight
    // work before returning.
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown.cancel();
        });
    }

    scheduler::run(
        client,
        config.api_keys.as_slice().to_vec(),
        tickers,
        save_base_dir,
        config.progress_path(),
        config.schedule,
        shutdown,
    )
    .await;

    tracing::info!("bar crawler stopped");
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(error = %err, "no SIGTERM handler, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT, shutting down"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received Ctrl+C, shutting down");
    }
}
