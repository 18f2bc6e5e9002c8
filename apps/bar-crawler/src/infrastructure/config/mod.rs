//! Configuration loading.

mod settings;

pub use settings::{ApiKeys, ConfigError, CrawlerConfig, ScheduleSettings};
