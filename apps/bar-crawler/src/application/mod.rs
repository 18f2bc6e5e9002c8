//! Application layer - Crawl use cases and port definitions.

pub mod crawl;
pub mod ports;
pub mod scheduler;
