//! Configuration data model and validation

use crate::logging::LogFormat;
use crate::types::{parse_run_plan, AppError, CacheDirective, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// FHIR server base URL (e.g. `http://hapi.fhir.org/baseR4`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// File with one family name per line
    #[serde(default = "default_names_file")]
    pub names_file: PathBuf,

    /// Family name searched by the basic task
    #[serde(default = "default_basic_family")]
    pub basic_family: String,

    /// Cache directive of each batch run, in order
    #[serde(default = "default_run_plan")]
    pub run_plan: Vec<CacheDirective>,

    /// Pause between batch runs
    #[serde(default = "default_run_delay_secs")]
    pub run_delay_seconds: u64,

    /// Request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Sort basic-task results by given name before printing
    #[serde(default)]
    pub sort_results: bool,

    /// Skip the single basic-task search
    #[serde(default)]
    pub skip_basic: bool,

    /// Skip the batch runs
    #[serde(default)]
    pub skip_batch: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Log format for the output stream
    #[serde(default)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    /// Only log warnings and errors
    #[serde(default)]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            names_file: default_names_file(),
            basic_family: default_basic_family(),
            run_plan: default_run_plan(),
            run_delay_seconds: default_run_delay_secs(),
            timeout_seconds: default_timeout_secs(),
            sort_results: false,
            skip_basic: false,
            skip_batch: false,
            enable_color: default_enable_color(),
            log_format: LogFormat::default(),
            verbose: false,
            debug: false,
            quiet: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Get the inter-run pause as Duration
    pub fn run_delay(&self) -> Duration {
        Duration::from_secs(self.run_delay_seconds)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(AppError::config("FHIR base URL cannot be empty"));
        }

        match url::Url::parse(&self.base_url) {
            Ok(parsed) => {
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(AppError::config(format!(
                        "FHIR base URL must use http or https: {}",
                        self.base_url
                    )));
                }
                if parsed.host().is_none() {
                    return Err(AppError::config(format!("FHIR base URL has no host: {}", self.base_url)));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!("Invalid FHIR base URL '{}': {}", self.base_url, e)));
            }
        }

        if self.names_file.as_os_str().is_empty() {
            return Err(AppError::config("Names file path cannot be empty"));
        }

        if !self.skip_basic && self.basic_family.trim().is_empty() {
            return Err(AppError::config("Basic task family name cannot be empty"));
        }

        if !self.skip_batch && self.run_plan.is_empty() {
            return Err(AppError::config("Run plan must contain at least one run"));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > crate::defaults::MAX_TIMEOUT_SECS {
            return Err(AppError::config(format!(
                "Timeout cannot exceed {} seconds",
                crate::defaults::MAX_TIMEOUT_SECS
            )));
        }

        if self.run_delay_seconds > crate::defaults::MAX_RUN_DELAY_SECS {
            return Err(AppError::config(format!(
                "Run delay cannot exceed {} seconds",
                crate::defaults::MAX_RUN_DELAY_SECS
            )));
        }

        if self.debug && self.quiet {
            return Err(AppError::config("Cannot combine debug and quiet output"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(base_url) = std::env::var("FHIR_BASE_URL") {
            self.base_url = base_url.trim().to_string();
        }

        if let Ok(names_file) = std::env::var("NAMES_FILE") {
            self.names_file = PathBuf::from(names_file.trim());
        }

        if let Ok(family) = std::env::var("BASIC_FAMILY") {
            self.basic_family = family.trim().to_string();
        }

        if let Ok(plan) = std::env::var("RUN_PLAN") {
            self.run_plan = parse_run_plan(&plan)
                .map_err(|e| AppError::config(format!("Invalid RUN_PLAN value '{}': {}", plan, e)))?;
        }

        if let Ok(delay) = std::env::var("RUN_DELAY_SECONDS") {
            self.run_delay_seconds = delay.parse()
                .map_err(|e| AppError::config(format!("Invalid RUN_DELAY_SECONDS value '{}': {}", delay, e)))?;
        }

        if let Ok(timeout) = std::env::var("TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout.parse()
                .map_err(|e| AppError::config(format!("Invalid TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.log_format = format.parse()
                .map_err(|e| AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", format, e)))?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    crate::defaults::DEFAULT_BASE_URL.to_string()
}

fn default_names_file() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_NAMES_FILE)
}

fn default_basic_family() -> String {
    crate::defaults::DEFAULT_BASIC_FAMILY.to_string()
}

fn default_run_plan() -> Vec<CacheDirective> {
    crate::defaults::DEFAULT_RUN_PLAN
        .iter()
        .map(|&no_cache| CacheDirective::new(no_cache))
        .collect()
}

fn default_run_delay_secs() -> u64 {
    crate::defaults::DEFAULT_RUN_DELAY.as_secs()
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_url, "http://hapi.fhir.org/baseR4");
        assert_eq!(config.names_file, PathBuf::from("Lastnames.txt"));
        assert_eq!(config.run_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_default_run_plan() {
        let config = Config::default();
        assert_eq!(
            config.run_plan,
            vec![CacheDirective::cached(), CacheDirective::cached(), CacheDirective::no_cache()]
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.base_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.base_url = "ftp://hapi.fhir.org/baseR4".to_string();
        assert!(config.validate().is_err());

        config.base_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let mut config = Config::default();
        config.timeout_seconds = 0;
        assert!(config.validate().is_err());

        config.timeout_seconds = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_run_plan() {
        let mut config = Config::default();
        config.run_plan.clear();
        assert!(config.validate().is_err());

        config.skip_batch = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_run_delay_is_allowed() {
        let mut config = Config::default();
        config.run_delay_seconds = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_and_quiet_conflict() {
        let mut config = Config::default();
        config.debug = true;
        config.quiet = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"base_url": "https://server.fire.ly"}"#).unwrap();
        assert_eq!(config.base_url, "https://server.fire.ly");
        assert_eq!(config.run_plan.len(), 3);
        assert_eq!(config.timeout_seconds, 30);
    }
}
