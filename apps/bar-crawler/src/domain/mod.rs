//! Domain layer - Core crawl data types.
//!
//! Plain data carried between the planner, the worker pool, and the
//! bookkeeping tasks. No I/O and no external integrations live here.

pub mod bar;
pub mod job;

pub use bar::Bar;
pub use job::{key_prefix, FailedEntry, Job, JobResult, ProgressUpdate};
