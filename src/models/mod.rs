//! Data models and structures for the FHIR search latency client

pub mod config;
pub mod metrics;
pub mod patient;

// Re-export main model types
pub use config::Config;
pub use metrics::{BatchSummary, Statistics, format_average};
pub use patient::{Entry, HumanName, NameTuple, SearchResult};
