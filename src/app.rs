//! Main application orchestration and execution

use crate::{
    client::{FhirClient, SearchClient, SearchRequest},
    config::display_config_summary,
    error::Result,
    executor::{BatchRunner, RunOutcome, RunPlan},
    logging::{Logger, LoggerFactory},
    models::Config,
    output::{format_results, format_run_summary, sort_by_given_name},
    types::{format_run_plan, CacheDirective},
};
use std::future::Future;

/// Runs the basic task followed by the intermediate task
pub struct App<C> {
    config: Config,
    runner: BatchRunner<C>,
    logger: Logger,
}

impl App<FhirClient> {
    /// Wire the HTTP client and loggers from a validated configuration
    pub async fn from_config(config: Config) -> Result<Self> {
        let factory = LoggerFactory::new(config.clone());
        let logger = factory.create_logger("APP").await;
        let client = FhirClient::from_config(&config)?;
        let batch_logger = factory.create_logger("BATCH").await;
        batch_logger.add_context_field("base_url".to_string(), &config.base_url).await;
        let runner = BatchRunner::new(client, batch_logger);

        logger
            .debug(&format!(
                "{} v{} ({}, built {})",
                crate::PKG_NAME,
                crate::VERSION,
                crate::GIT_COMMIT,
                crate::BUILD_TIME
            ))
            .field("session_id", factory.session_id())
            .log()
            .await;
        if config.debug {
            for line in display_config_summary(&config).lines() {
                logger.debug(line).log().await;
            }
        }

        Ok(Self::new(config, runner, logger))
    }
}

impl<C: SearchClient> App<C> {
    pub fn new(config: Config, runner: BatchRunner<C>, logger: Logger) -> Self {
        Self {
            config,
            runner,
            logger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run both tasks; failures inside them are logged, never returned
    pub async fn run<F>(&self, interrupt: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if !self.config.skip_basic {
            self.run_basic_task().await;
        }

        if !self.config.skip_batch {
            self.run_intermediate_task(interrupt).await;
        }

        Ok(())
    }

    /// Search the configured family once and render the matches
    pub async fn basic_task_lines(&self) -> Result<Vec<String>> {
        let request = SearchRequest::patient_by_family(&self.config.basic_family)
            .with_cache(CacheDirective::cached());
        let results = self.runner.client().search(&request, &mut |_| {}).await?;

        let results = if self.config.sort_results {
            sort_by_given_name(&results)
        } else {
            results
        };

        Ok(format_results(&results))
    }

    pub async fn run_basic_task(&self) {
        self.logger.info("Basic Task Start").log().await;

        match self.basic_task_lines().await {
            Ok(lines) => {
                for line in &lines {
                    self.logger.info(line).log().await;
                }
                self.logger
                    .debug(&format!("Basic search returned {} printable names", lines.len()))
                    .field("family", &self.config.basic_family)
                    .log()
                    .await;
            }
            Err(e) => {
                self.logger
                    .log_error(&e, &format!("Search for '{}' failed", self.config.basic_family))
                    .await;
            }
        }

        self.logger.info("Basic Task End").log().await;
    }

    /// Repeat the batch over the names file following the run plan
    pub async fn run_intermediate_task<F>(&self, interrupt: F) -> Option<Vec<RunOutcome>>
    where
        F: Future<Output = ()>,
    {
        self.logger.info("Intermediate Task Start").log().await;

        let plan = RunPlan::from_config(&self.config);
        self.logger
            .debug("Run plan")
            .field("runs", format_run_plan(&plan.runs))
            .field("delay_seconds", plan.delay.as_secs())
            .field("names_file", self.config.names_file.display().to_string())
            .log()
            .await;

        let outcomes = match plan.run_all(&self.runner, &self.config.names_file, interrupt).await {
            Ok(outcomes) => {
                if self.config.verbose {
                    for outcome in &outcomes {
                        if let Ok(summary) = &outcome.result {
                            let line = format_run_summary(outcome.iteration, summary, self.config.enable_color);
                            self.logger.info(&line).log().await;
                        }
                    }
                }
                Some(outcomes)
            }
            Err(e) => {
                self.logger.warn(&e.to_string()).error_info(&e).log().await;
                None
            }
        };

        self.logger.info("Intermediate Task End").log().await;
        outcomes
    }
}
