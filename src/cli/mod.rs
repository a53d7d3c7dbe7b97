//! Command-line interface

use crate::logging::LogFormat;
use crate::types::{parse_run_plan, CacheDirective};
use clap::Parser;
use std::path::PathBuf;

/// FHIR Patient search client that measures average server response time
#[derive(Parser, Debug, Clone)]
#[command(name = "fhir-latency")]
#[command(version, about, long_about = None)]
#[command(after_help = "Environment variables (also read from .env): FHIR_BASE_URL, NAMES_FILE, \
BASIC_FAMILY, RUN_DELAY_SECONDS, TIMEOUT_SECONDS, RUN_PLAN, ENABLE_COLOR, LOG_FORMAT.\n\
Command-line flags override environment values.")]
pub struct Cli {
    /// FHIR server base URL
    #[arg(short, long, value_name = "URL")]
    pub base_url: Option<String>,

    /// File with one family name per line
    #[arg(short = 'f', long, value_name = "PATH")]
    pub names_file: Option<PathBuf>,

    /// Family name searched by the basic task
    #[arg(long, value_name = "NAME")]
    pub family: Option<String>,

    /// Pause between batch runs in seconds
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_delay)]
    pub delay: Option<u64>,

    /// Request timeout in seconds
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Cache mode of each batch run, comma-separated (e.g. cached,cached,no-cache)
    #[arg(short, long, value_name = "PLAN")]
    pub runs: Option<String>,

    /// Sort basic-task results by given name
    #[arg(long)]
    pub sort: bool,

    /// Skip the basic single-family search
    #[arg(long)]
    pub skip_basic: bool,

    /// Skip the batch runs over the names file
    #[arg(long)]
    pub skip_batch: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Show structured fields on log lines
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Log format: console, json or compact
    #[arg(long, value_name = "FORMAT", value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.debug && self.quiet {
            return Err("Cannot specify both --debug and --quiet".to_string());
        }

        if self.skip_basic && self.skip_batch {
            return Err("Nothing to do: both --skip-basic and --skip-batch were given".to_string());
        }

        if let Some(family) = &self.family {
            if family.trim().is_empty() {
                return Err("--family cannot be empty".to_string());
            }
        }

        if let Some(names_file) = &self.names_file {
            if names_file.as_os_str().is_empty() {
                return Err("--names-file cannot be empty".to_string());
            }
        }

        if let Some(base_url) = &self.base_url {
            crate::client::HttpUtils::validate_url(base_url)
                .map_err(|e| format!("Invalid --base-url '{}': {}", base_url, e))?;
        }

        self.run_plan()?;

        Ok(())
    }

    /// Parsed `--runs` value, if given
    pub fn run_plan(&self) -> Result<Option<Vec<CacheDirective>>, String> {
        match &self.runs {
            None => Ok(None),
            Some(value) => {
                let plan = parse_run_plan(value).map_err(|e| format!("Invalid --runs '{}': {}", value, e))?;
                if plan.is_empty() {
                    return Err("--runs must name at least one run".to_string());
                }
                Ok(Some(plan))
            }
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

/// Parse a request timeout in whole seconds
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > crate::defaults::MAX_TIMEOUT_SECS {
                Err(format!("Duration cannot exceed {} seconds", crate::defaults::MAX_TIMEOUT_SECS))
            } else {
                Ok(secs)
            }
        })
}

/// Parse the inter-run pause; zero disables it
fn parse_delay(s: &str) -> Result<u64, String> {
    if s.starts_with('+') {
        return Err(format!("Invalid delay: {}", s));
    }

    let secs = s.parse::<u64>().map_err(|_| format!("Invalid delay: {}", s))?;
    if secs > crate::defaults::MAX_RUN_DELAY_SECS {
        return Err(format!("Delay cannot exceed {} seconds", crate::defaults::MAX_RUN_DELAY_SECS));
    }
    Ok(secs)
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse().map_err(|_| format!("Invalid log format '{}': expected console, json or compact", s))
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_defaults() {
        let cli = Cli::parse_from(["fhir-latency"]);
        assert!(cli.base_url.is_none());
        assert!(cli.names_file.is_none());
        assert!(cli.delay.is_none());
        assert!(cli.timeout.is_none());
        assert!(!cli.sort);
        assert!(!cli.verbose);
        assert!(cli.validate().is_ok());
        assert_eq!(cli.run_plan().unwrap(), None);
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "fhir-latency",
            "--base-url", "https://server.fire.ly",
            "--names-file", "names.txt",
            "--family", "JONES",
            "--delay", "0",
            "--timeout", "12",
            "--runs", "no-cache,cached",
            "--sort",
            "--no-color",
            "--verbose",
            "--log-format", "json",
        ]);

        assert_eq!(cli.base_url.as_deref(), Some("https://server.fire.ly"));
        assert_eq!(cli.names_file, Some(PathBuf::from("names.txt")));
        assert_eq!(cli.family.as_deref(), Some("JONES"));
        assert_eq!(cli.delay, Some(0));
        assert_eq!(cli.timeout, Some(12));
        assert!(cli.sort);
        assert!(cli.no_color);
        assert!(!cli.use_colors());
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(
            cli.run_plan().unwrap(),
            Some(vec![CacheDirective::no_cache(), CacheDirective::cached()])
        );
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["fhir-latency", "-b", "http://localhost:8080/fhir", "-f", "x.txt", "-d", "1", "-t", "3", "-q"]);
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:8080/fhir"));
        assert_eq!(cli.delay, Some(1));
        assert_eq!(cli.timeout, Some(3));
        assert!(cli.quiet);
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration("5"), Ok(5));
        assert_eq!(parse_duration("300"), Ok(300));
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("301").is_err());
        assert!(parse_duration("+5").is_err());
        assert!(parse_duration("0x10").is_err());
        assert!(parse_duration("-1").is_err());
        assert!(parse_duration("abc").is_err());
    }

    #[test]
    fn test_delay_parsing() {
        assert_eq!(parse_delay("0"), Ok(0));
        assert_eq!(parse_delay("3600"), Ok(3600));
        assert!(parse_delay("3601").is_err());
        assert!(parse_delay("1.5").is_err());
    }

    #[test]
    fn test_invalid_values_rejected_by_clap() {
        assert!(Cli::try_parse_from(["fhir-latency", "--timeout", "0"]).is_err());
        assert!(Cli::try_parse_from(["fhir-latency", "--log-format", "xml"]).is_err());
        assert!(Cli::try_parse_from(["fhir-latency", "--unknown"]).is_err());
    }

    #[test]
    fn test_cli_validation() {
        let cli = Cli::parse_from(["fhir-latency", "--debug", "--quiet"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["fhir-latency", "--skip-basic", "--skip-batch"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["fhir-latency", "--runs", "cached,sometimes"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["fhir-latency", "--runs", " , "]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["fhir-latency", "--base-url", "ftp://example.com"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["fhir-latency", "--family", "  "]);
        assert!(cli.validate().is_err());
    }
}
