//! FHIR Search Latency
//!
//! A small client for public FHIR servers: it searches Patient resources by
//! family name, prints selected demographics, and measures the average
//! search response time over repeated batches of names read from a file.

pub mod app;
pub mod cli;
pub mod config;
pub mod client;
pub mod error;
pub mod logging;
pub mod stats;
pub mod executor;
pub mod output;
pub mod models;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, Entry, NameTuple, SearchResult, Statistics, BatchSummary};
pub use client::{FhirClient, SearchClient, SearchRequest};
pub use executor::{BatchRunner, RunPlan};
pub use stats::TimingCollector;
pub use output::{format_results, sort_by_given_name};
pub use types::CacheDirective;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_BASE_URL: &str = "http://hapi.fhir.org/baseR4";
    pub const DEFAULT_NAMES_FILE: &str = "Lastnames.txt";
    pub const DEFAULT_BASIC_FAMILY: &str = "SMITH";
    pub const DEFAULT_RUN_DELAY: Duration = Duration::from_secs(5);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Cache-disable flag per batch run: two cached runs, then one uncached
    pub const DEFAULT_RUN_PLAN: &[bool] = &[false, false, true];
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const MAX_TIMEOUT_SECS: u64 = 300;
    pub const MAX_RUN_DELAY_SECS: u64 = 3600;
}
