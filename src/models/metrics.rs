//! Response time statistics and batch run summaries

use crate::types::CacheDirective;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Statistical summary of response time samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of samples included
    pub sample_count: usize,

    /// Arithmetic mean (milliseconds)
    pub avg_ms: f64,

    /// Fastest response (milliseconds)
    pub min_ms: f64,

    /// Slowest response (milliseconds)
    pub max_ms: f64,

    /// Population standard deviation (milliseconds)
    pub std_dev_ms: f64,
}

impl Statistics {
    /// Calculate statistics from millisecond samples; `None` when there are none
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let count = samples.len();
        if count == 0 {
            return None;
        }

        let avg = samples.iter().sum::<f64>() / count as f64;
        let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let variance = if count > 1 {
            samples.iter().map(|&x| (x - avg).powi(2)).sum::<f64>() / count as f64
        } else {
            0.0
        };

        Some(Self {
            sample_count: count,
            avg_ms: avg,
            min_ms: min,
            max_ms: max,
            std_dev_ms: variance.sqrt(),
        })
    }
}

/// Outcome of one batch run over the names source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Cache directive every request of this run carried
    pub cache: CacheDirective,

    /// Search attempts issued (one per name)
    pub count: usize,

    /// Searches that completed with a success response
    pub succeeded: usize,

    /// Searches that failed and were skipped
    pub failed: usize,

    /// Mean response time; `None` means no data
    pub average_ms: Option<f64>,

    /// Full statistics over the successful responses
    pub statistics: Option<Statistics>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Wall-clock time of the whole run
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Success rate as a percentage of attempts
    pub fn success_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.count as f64) * 100.0
        }
    }

    pub fn has_data(&self) -> bool {
        self.average_ms.is_some()
    }

    /// Average rendered for log output, `no data` when nothing succeeded
    pub fn format_average(&self) -> String {
        format_average(self.average_ms)
    }
}

/// Render an optional average in milliseconds
pub fn format_average(average_ms: Option<f64>) -> String {
    match average_ms {
        Some(avg) => format!("{:.3}ms", avg),
        None => "no data".to_string(),
    }
}
