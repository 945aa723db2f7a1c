// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analyze;
pub mod config;
pub mod ingest;
pub mod store;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{run_classification, ClassificationRun};
pub use crate::config::AppConfig;
pub use crate::ingest::scheduler::{CycleSummary, PollScheduler, PollSchedulerCfg};
pub use crate::ingest::types::{FeedSource, FetchError, RawItem};
pub use crate::store::{Article, ArticleStore, StorageError};
