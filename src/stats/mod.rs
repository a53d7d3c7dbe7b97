//! Response time collection for batch runs

use crate::models::metrics::Statistics;
use std::time::Duration;

/// Collects elapsed time of each completed response during one batch run.
///
/// A fresh collector is created per run so measurements never leak across
/// runs. It is only touched from the task that issues the requests.
#[derive(Debug, Clone, Default)]
pub struct TimingCollector {
    samples_ms: Vec<f64>,
}

impl TimingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed response
    pub fn on_response(&mut self, elapsed_ms: f64) {
        self.samples_ms.push(elapsed_ms);
    }

    /// Record one completed response from a measured duration
    pub fn record(&mut self, elapsed: Duration) {
        self.on_response(elapsed.as_secs_f64() * 1000.0);
    }

    /// Recorded timings in arrival order
    pub fn timings(&self) -> &[f64] {
        &self.samples_ms
    }

    pub fn len(&self) -> usize {
        self.samples_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples_ms.is_empty()
    }

    /// Arithmetic mean in milliseconds; `None` when nothing was recorded
    pub fn average(&self) -> Option<f64> {
        if self.samples_ms.is_empty() {
            None
        } else {
            Some(self.samples_ms.iter().sum::<f64>() / self.samples_ms.len() as f64)
        }
    }

    pub fn statistics(&self) -> Option<Statistics> {
        Statistics::from_samples(&self.samples_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;

    #[test]
    fn test_empty_collector_has_no_data() {
        let collector = TimingCollector::new();
        assert!(collector.is_empty());
        assert_eq!(collector.average(), None);
        assert!(collector.statistics().is_none());
    }

    #[test]
    fn test_average_of_recorded_timings() {
        let mut collector = TimingCollector::new();
        collector.on_response(120.0);
        collector.on_response(80.0);
        collector.record(Duration::from_millis(100));

        assert_eq!(collector.timings(), &[120.0, 80.0, 100.0]);
        assert_eq!(collector.average(), Some(100.0));

        let stats = collector.statistics().unwrap();
        assert_eq!(stats.sample_count, 3);
        assert_eq!(stats.min_ms, 80.0);
        assert_eq!(stats.max_ms, 120.0);
    }

    proptest! {
        /// The average is the arithmetic mean of what was recorded
        #[test]
        fn average_is_arithmetic_mean(samples in vec(0.001f64..100000.0, 1..200)) {
            let mut collector = TimingCollector::new();
            for &sample in &samples {
                collector.on_response(sample);
            }

            let expected = samples.iter().sum::<f64>() / samples.len() as f64;
            let average = collector.average().unwrap();
            prop_assert!((average - expected).abs() <= expected.abs() * 1e-12 + 1e-9);
            prop_assert_eq!(collector.len(), samples.len());
        }

        /// Mean stays between the fastest and slowest response
        #[test]
        fn average_between_min_max(samples in vec(0.001f64..100000.0, 1..200)) {
            let mut collector = TimingCollector::new();
            for &sample in &samples {
                collector.on_response(sample);
            }

            let stats = collector.statistics().unwrap();
            prop_assert!(stats.avg_ms >= stats.min_ms - 1e-9);
            prop_assert!(stats.avg_ms <= stats.max_ms + 1e-9);
            prop_assert!(stats.std_dev_ms >= 0.0);
        }
    }
}
