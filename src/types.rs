//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Per-request cache control flag.
///
/// Built right before a request is issued; when `no_cache` is set the
/// search carries `Cache-Control: no-cache` so the server bypasses any
/// cached result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheDirective {
    pub no_cache: bool,
}

impl CacheDirective {
    pub fn new(no_cache: bool) -> Self {
        Self { no_cache }
    }

    /// Default caching behavior
    pub fn cached() -> Self {
        Self::new(false)
    }

    /// Ask the server to bypass its cache
    pub fn no_cache() -> Self {
        Self::new(true)
    }

    /// Header to attach to the request, if any
    pub fn header(&self) -> Option<(&'static str, &'static str)> {
        if self.no_cache {
            Some(("Cache-Control", "no-cache"))
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        if self.no_cache {
            "no-cache"
        } else {
            "cached"
        }
    }
}

impl fmt::Display for CacheDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CacheDirective {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cached" | "cache" | "default" => Ok(Self::cached()),
            "no-cache" | "nocache" | "no_cache" | "disabled" => Ok(Self::no_cache()),
            other => Err(AppError::parse(format!(
                "Invalid cache mode '{}': expected 'cached' or 'no-cache'",
                other
            ))),
        }
    }
}

/// Parse a comma-separated run plan such as `cached,cached,no-cache`
pub fn parse_run_plan(value: &str) -> Result<Vec<CacheDirective>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(CacheDirective::from_str)
        .collect()
}

/// Render a run plan back into its comma-separated form
pub fn format_run_plan(plan: &[CacheDirective]) -> String {
    plan.iter().map(CacheDirective::label).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_directive_header() {
        assert_eq!(CacheDirective::cached().header(), None);
        assert_eq!(
            CacheDirective::no_cache().header(),
            Some(("Cache-Control", "no-cache"))
        );
        assert_eq!(CacheDirective::default(), CacheDirective::cached());
    }

    #[test]
    fn test_parse_run_plan() {
        let plan = parse_run_plan("cached, cached ,no-cache").unwrap();
        assert_eq!(
            plan,
            vec![CacheDirective::cached(), CacheDirective::cached(), CacheDirective::no_cache()]
        );
        assert_eq!(format_run_plan(&plan), "cached,cached,no-cache");

        assert!(parse_run_plan("cached,sometimes").is_err());
        assert!(parse_run_plan("").unwrap().is_empty());
    }
}
