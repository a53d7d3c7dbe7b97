//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::Config,
    types::format_run_plan,
};

/// Layers defaults, `.env`, process environment and CLI flags into a
/// validated [`Config`]
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        self.cli.validate().map_err(AppError::config)?;

        let mut config = Config::default();

        EnvManager::load_env_file()?;
        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&self, config: &mut Config) -> Result<()> {
        let cli = &self.cli;

        if let Some(base_url) = &cli.base_url {
            config.base_url = base_url.trim().to_string();
        }

        if let Some(names_file) = &cli.names_file {
            config.names_file = names_file.clone();
        }

        if let Some(family) = &cli.family {
            config.basic_family = family.trim().to_string();
        }

        if let Some(delay) = cli.delay {
            config.run_delay_seconds = delay;
        }

        if let Some(timeout) = cli.timeout {
            config.timeout_seconds = timeout;
        }

        if let Some(plan) = cli.run_plan().map_err(AppError::config)? {
            config.run_plan = plan;
        }

        if let Some(format) = cli.log_format {
            config.log_format = format;
        }

        if cli.no_color {
            config.enable_color = false;
        }

        // Flag-only settings: only ever switched on from the command line
        config.sort_results |= cli.sort;
        config.skip_basic |= cli.skip_basic;
        config.skip_batch |= cli.skip_batch;
        config.verbose |= cli.verbose;
        config.debug |= cli.debug;
        config.quiet |= cli.quiet;

        Ok(())
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Configuration summary lines for debug output
pub fn display_config_summary(config: &Config) -> String {
    let summary = [
        format!("FHIR Base URL: {}", config.base_url),
        format!("Names File: {}", config.names_file.display()),
        format!("Basic Family: {}", config.basic_family),
        format!("Run Plan: {}", format_run_plan(&config.run_plan)),
        format!("Run Delay: {}s", config.run_delay_seconds),
        format!("Timeout: {}s", config.timeout_seconds),
        format!("Sort Results: {}", config.sort_results),
        format!("Color Output: {}", config.enable_color),
        format!("Log Format: {:?}", config.log_format),
    ];

    summary.join("\n")
}
