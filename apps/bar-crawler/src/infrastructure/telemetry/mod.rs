//! Tracing subscriber initialization.
//!
//! One subscriber is installed at startup; components log through the
//! `tracing` facade and no global logger is mutated afterwards. `RUST_LOG`
//! takes precedence over the configured default level.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `default_level` applies to this crate when `RUST_LOG` is unset.
/// Calling this twice is a no-op (the second install fails quietly),
/// which keeps tests that share a process harmless.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bar_crawler={default_level},warn")));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_init_is_harmless() {
        init("debug");
        init("info");
    }
}
