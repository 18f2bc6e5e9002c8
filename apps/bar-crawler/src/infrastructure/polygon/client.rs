//! Fetch engine for the aggregates API.
//!
//! One [`PolygonClient::fetch_minute_bars`] call covers one job: the window
//! is chunked, each sub-window is requested with a bounded retry budget,
//! and the per-key cooldown is enforced between requests and again before
//! the call returns (so the key re-enters the pool already paced).

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::application::ports::{BarSource, FetchError};
use crate::domain::{key_prefix, Bar};
use crate::infrastructure::sink::BarSink;

use super::chunker::{adjust_last_window, split_date_range, MAX_DAYS_PER_WINDOW};
use super::messages::AggregatesResponse;

/// Default API host.
const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Maximum rows per aggregates request.
const MAX_LIMIT: u32 = 50_000;

/// Upper bound on extended-hours 1-minute bars per trading day.
const MINUTES_PER_DAY: usize = 960;

/// Tuning knobs for the fetch engine.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// API host, overridable for tests.
    pub base_url: String,
    /// Maximum calendar days per request window.
    pub max_days_per_window: u64,
    /// Total attempts per window (first try included).
    pub max_attempts: u32,
    /// Fixed delay between attempts on a retryable failure.
    pub retry_delay: Duration,
    /// Per-key pause between requests (5 req/min budget => 12 s).
    pub key_cooldown: Duration,
    /// End-to-end timeout for one HTTP request.
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_days_per_window: MAX_DAYS_PER_WINDOW,
            max_attempts: 3,
            retry_delay: Duration::from_secs(15),
            key_cooldown: Duration::from_secs(12),
            // Large windows can return 50k rows; allow slow responses.
            request_timeout: Duration::from_secs(600),
        }
    }
}

/// Where completed jobs are persisted.
struct Output {
    base_dir: PathBuf,
    sink: Box<dyn BarSink>,
}

/// HTTP client for minute-bar aggregates.
pub struct PolygonClient {
    http: reqwest::Client,
    settings: FetchSettings,
    output: Option<Output>,
    per_day: AtomicBool,
}

impl PolygonClient {
    /// Create a client with the given settings.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| FetchError::Network {
                attempts: 0,
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            settings,
            output: None,
            per_day: AtomicBool::new(false),
        })
    }

    /// Attach a persistence sink rooted at `base_dir`.
    #[must_use]
    pub fn with_output(mut self, base_dir: PathBuf, sink: Box<dyn BarSink>) -> Self {
        self.output = Some(Output { base_dir, sink });
        self
    }

    /// Pre-allocation size for the bar buffer of `[from, to]`.
    fn estimated_bars(from: DateTime<Utc>, to: DateTime<Utc>) -> usize {
        if from > to {
            return 0;
        }
        let days = usize::try_from((to - from).num_days().max(0)).unwrap_or(0) + 1;
        // +10% headroom so the buffer never grows mid-crawl.
        let estimate = days * MINUTES_PER_DAY;
        (estimate + estimate / 10).min(500_000)
    }

    fn window_url(
        &self,
        ticker: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        api_key: &str,
    ) -> String {
        format!(
            "{}/v2/aggs/ticker/{}/range/1/minute/{}/{}?adjusted=true&limit={}&sort=asc&apiKey={}",
            self.settings.base_url,
            ticker,
            from.timestamp_millis(),
            to.timestamp_millis(),
            MAX_LIMIT,
            api_key,
        )
    }

    /// Issue one window request with up to `max_attempts` tries.
    ///
    /// Returns `Ok(None)` when the upstream reports the window as DELAYED;
    /// the caller skips the window without failing the job.
    async fn request_window(
        &self,
        url: &str,
        ticker: &str,
        window_idx: usize,
        window_count: usize,
    ) -> Result<Option<AggregatesResponse>, FetchError> {
        let max_attempts = self.settings.max_attempts;
        for attempt in 1..=max_attempts {
            let response = match self.http.get(url).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if attempt < max_attempts {
                        tracing::warn!(
                            ticker,
                            window = window_idx + 1,
                            windows = window_count,
                            attempt,
                            max_attempts,
                            error = %e,
                            "network error, retrying"
                        );
                        tokio::time::sleep(self.settings.retry_delay).await;
                        continue;
                    }
                    return Err(FetchError::Network {
                        attempts: max_attempts,
                        message: e.to_string(),
                    });
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    if attempt < max_attempts {
                        tracing::warn!(
                            ticker,
                            window = window_idx + 1,
                            windows = window_count,
                            attempt,
                            max_attempts,
                            "rate limited (429), retrying"
                        );
                        tokio::time::sleep(self.settings.retry_delay).await;
                        continue;
                    }
                    return Err(FetchError::RateLimited {
                        attempts: max_attempts,
                    });
                }
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let text = response.text().await.unwrap_or_default();
            let decoded: AggregatesResponse = match serde_json::from_str(&text) {
                Ok(decoded) => decoded,
                Err(e) => {
                    if attempt < max_attempts {
                        tracing::warn!(
                            ticker,
                            window = window_idx + 1,
                            windows = window_count,
                            attempt,
                            max_attempts,
                            error = %e,
                            "malformed response body, retrying"
                        );
                        tokio::time::sleep(self.settings.retry_delay).await;
                        continue;
                    }
                    return Err(FetchError::Malformed {
                        attempts: max_attempts,
                        message: e.to_string(),
                    });
                }
            };

            if decoded.status != "OK" {
                if decoded.status == "DELAYED" {
                    tracing::info!(
                        ticker,
                        window = window_idx + 1,
                        windows = window_count,
                        "window not finalized (DELAYED), skipping"
                    );
                    return Ok(None);
                }
                return Err(FetchError::NotOk(decoded.status));
            }
            return Ok(Some(decoded));
        }

        // The loop always returns; max_attempts >= 1 is enforced by config.
        Err(FetchError::Network {
            attempts: max_attempts,
            message: "no attempts made".to_string(),
        })
    }

    /// Persist a completed job's bars when an output is configured.
    fn save_packet(&self, ticker: &str, from: DateTime<Utc>, to: DateTime<Utc>, bars: &[Bar]) {
        let Some(output) = &self.output else {
            return;
        };
        if bars.is_empty() {
            return;
        }
        let ticker_dir = output.base_dir.join(ticker);
        if let Err(e) = std::fs::create_dir_all(&ticker_dir) {
            tracing::warn!(ticker, dir = %ticker_dir.display(), error = %e, "cannot create ticker dir");
            return;
        }
        let ext = output.sink.extension();
        let name = if self.per_day.load(Ordering::Relaxed) {
            format!("{}_{}.{}", ticker, from.format("%Y-%m-%d"), ext)
        } else {
            format!(
                "{}_{}_to_{}.{}",
                ticker,
                from.format("%Y-%m-%d"),
                to.format("%Y-%m-%d"),
                ext
            )
        };
        let path = ticker_dir.join(name);
        match output.sink.save(bars, &path) {
            Ok(()) => {
                tracing::info!(ticker, path = %path.display(), bars = bars.len(), format = ext, "saved packet");
            }
            Err(e) => {
                tracing::warn!(ticker, path = %path.display(), error = %e, "failed to save packet");
            }
        }
    }
}

#[async_trait]
impl BarSource for PolygonClient {
    async fn fetch_minute_bars(
        &self,
        ticker: &str,
        api_key: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Bar>, FetchError> {
        let windows = split_date_range(from, to, self.settings.max_days_per_window);
        if windows.is_empty() {
            tracing::info!(ticker, %from, %to, "no windows in date range");
            return Ok(Vec::new());
        }

        let prefix = key_prefix(api_key);
        tracing::debug!(ticker, windows = windows.len(), key = prefix, "job split");

        let mut all_bars = Vec::with_capacity(Self::estimated_bars(from, to));
        let last_idx = windows.len() - 1;

        for (idx, (window_from, window_to)) in windows.into_iter().enumerate() {
            if idx > 0 {
                tracing::debug!(
                    ticker,
                    window = idx + 1,
                    key = prefix,
                    cooldown_secs = self.settings.key_cooldown.as_secs(),
                    "key cooldown before window"
                );
                tokio::time::sleep(self.settings.key_cooldown).await;
            }

            let window_to = adjust_last_window(window_to, idx == last_idx, Utc::now());
            let url = self.window_url(ticker, window_from, window_to, api_key);

            let Some(response) = self
                .request_window(&url, ticker, idx, last_idx + 1)
                .await?
            else {
                // DELAYED window: zero bars, move on.
                continue;
            };

            if response.next_url.is_some() {
                tracing::warn!(
                    ticker,
                    window = idx + 1,
                    "window exceeded the row cap (next_url present), tail rows dropped"
                );
            }

            all_bars.extend(response.results.into_iter().map(Bar::from));

            if idx == last_idx {
                // Pace the key before it goes back to the pool.
                tracing::debug!(
                    ticker,
                    key = prefix,
                    cooldown_secs = self.settings.key_cooldown.as_secs(),
                    "key cooldown before release"
                );
                tokio::time::sleep(self.settings.key_cooldown).await;
            }
        }

        self.save_packet(ticker, from, to, &all_bars);
        Ok(all_bars)
    }

    fn set_per_day_mode(&self, per_day: bool) {
        self.per_day.store(per_day, Ordering::Relaxed);
    }
}
