//! Crawler configuration settings, loaded from environment variables.

use std::path::PathBuf;

/// API key pool loaded from the environment.
///
/// One worker runs per key; the full key strings never appear in `Debug`
/// output or logs.
#[derive(Clone)]
pub struct ApiKeys(Vec<String>);

impl ApiKeys {
    /// Wrap a non-empty key list.
    #[must_use]
    pub const fn new(keys: Vec<String>) -> Self {
        Self(keys)
    }

    /// Number of keys (and therefore workers).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The key strings, in configured order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiKeys")
            .field(&format!("[{} keys REDACTED]", self.0.len()))
            .finish()
    }
}

/// Daily run schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    /// Scheduled UTC hour (0-23).
    pub hour: u32,
    /// Scheduled UTC minute (0-59).
    pub minute: u32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        // 00:30 UTC, shortly after the upstream finalizes the previous day.
        Self { hour: 0, minute: 30 }
    }
}

/// Complete crawler configuration.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// API key pool.
    pub api_keys: ApiKeys,
    /// Root data directory.
    pub data_dir: PathBuf,
    /// Packet encoding: csv | json | jsonl.
    pub save_format: String,
    /// Optional explicit tickers file.
    pub tickers_file: Option<PathBuf>,
    /// Daily run schedule (UTC).
    pub schedule: ScheduleSettings,
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,
}

impl CrawlerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when no API key is configured.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_keys = parse_api_keys()?;

        let data_dir = PathBuf::from(env_or("DATA_DIR", "data"));
        let save_format = save_format_from_env();
        let tickers_file = std::env::var("TICKERS_FILE").ok().map(PathBuf::from);

        let schedule = ScheduleSettings {
            hour: parse_env_bounded("RUN_HOUR", ScheduleSettings::default().hour, 23),
            minute: parse_env_bounded("RUN_MINUTE", ScheduleSettings::default().minute, 59),
        };

        let log_level = env_or("LOG_LEVEL", "info");

        Ok(Self {
            api_keys,
            data_dir,
            save_format,
            tickers_file,
            schedule,
            log_level,
        })
    }

    /// Directory packets and manifests are written under.
    #[must_use]
    pub fn save_base_dir(&self) -> PathBuf {
        self.data_dir.join("polygon")
    }

    /// Path of the persisted progress map.
    #[must_use]
    pub fn progress_path(&self) -> PathBuf {
        self.save_base_dir().join(".lastday.json")
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No API key configured.
    #[error("POLYGON_API_KEY or POLYGON_API_KEYS must be set")]
    MissingApiKeys,
}

fn parse_api_keys() -> Result<ApiKeys, ConfigError> {
    let raw = std::env::var("POLYGON_API_KEYS")
        .or_else(|_| std::env::var("POLYGON_API_KEY"))
        .map_err(|_| ConfigError::MissingApiKeys)?;

    let keys: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToString::to_string)
        .collect();

    if keys.is_empty() {
        return Err(ConfigError::MissingApiKeys);
    }
    Ok(ApiKeys::new(keys))
}

/// `SAVE_FORMAT`, defaulting by `PROFILE`: dev profiles get csv for easy
/// inspection, everything else jsonl.
fn save_format_from_env() -> String {
    if let Ok(v) = std::env::var("SAVE_FORMAT") {
        if !v.is_empty() {
            return v;
        }
    }
    match std::env::var("PROFILE").unwrap_or_default().as_str() {
        "dev" | "development" => "csv".to_string(),
        _ => "jsonl".to_string(),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_bounded(key: &str, default: u32, max: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v <= max)
        .unwrap_or(default)
}
