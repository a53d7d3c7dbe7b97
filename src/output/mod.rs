//! Output formatting for search results and batch summaries
//!
//! Patient lines are plain text. Run summaries are colored by response
//! time class when color is enabled.

use crate::models::{BatchSummary, SearchResult};
use colored::*;

/// Render one line per usable name of every entry.
///
/// Lines look like `Smith, John, [1980-01-01]`. Entries without a family
/// or given name produce no line.
pub fn format_results(results: &SearchResult) -> Vec<String> {
    results
        .entries()
        .iter()
        .flat_map(|entry| entry.name_tuples())
        .map(|tuple| format!("{}, {}, [{}]", tuple.family, tuple.given, tuple.birth_date.join(", ")))
        .collect()
}

/// Order entries by the first given name of their first name.
///
/// Comparison is case-insensitive and stable; entries without a given
/// name keep their relative order after all named entries.
pub fn sort_by_given_name(results: &SearchResult) -> SearchResult {
    let mut entries = results.entries().to_vec();
    entries.sort_by_cached_key(|entry| match entry.first_given_name() {
        Some(given) => (false, given.to_lowercase()),
        None => (true, String::new()),
    });
    results.with_entries(entries)
}

/// Response time classification for color coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceLevel {
    Excellent,  // < 100ms
    Good,       // 100-300ms
    Fair,       // 300-1000ms
    Poor,       // >= 1000ms
}

impl PerformanceLevel {
    pub fn from_response_time(time_ms: f64) -> Self {
        if time_ms < 100.0 {
            Self::Excellent
        } else if time_ms < 300.0 {
            Self::Good
        } else if time_ms < 1000.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Red,
        }
    }
}

/// One-line summary of a finished run
pub fn format_run_summary(iteration: usize, summary: &BatchSummary, use_color: bool) -> String {
    let average = summary.format_average();
    let average = match (use_color, summary.average_ms) {
        (true, Some(avg)) => average
            .color(PerformanceLevel::from_response_time(avg).color())
            .bold()
            .to_string(),
        (true, None) => average.dimmed().to_string(),
        (false, _) => average,
    };

    format!(
        "Run {} ({}): {}/{} succeeded ({:.1}%), average {}",
        iteration,
        summary.cache,
        summary.succeeded,
        summary.count,
        summary.success_rate(),
        average
    )
}
