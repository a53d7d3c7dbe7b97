//! Batch execution engine
//!
//! A batch issues one Patient search per family name, strictly in order,
//! and measures every successful response. A run plan repeats the batch
//! over the same names file with a per-run cache directive and a pause
//! between runs.

use crate::{
    client::{SearchClient, SearchRequest},
    error::{AppError, ErrorContext, Result},
    logging::Logger,
    models::{BatchSummary, Config},
    stats::TimingCollector,
    types::CacheDirective,
};
use chrono::Utc;
use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Runs batches of searches through a [`SearchClient`]
pub struct BatchRunner<C> {
    client: C,
    logger: Logger,
}

/// Counters for one batch run in progress
struct BatchTally {
    cache: CacheDirective,
    collector: TimingCollector,
    count: usize,
    succeeded: usize,
    failed: usize,
    started_at: chrono::DateTime<Utc>,
    started: Instant,
}

impl BatchTally {
    fn start(cache: CacheDirective) -> Self {
        Self {
            cache,
            collector: TimingCollector::new(),
            count: 0,
            succeeded: 0,
            failed: 0,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    fn finish(self) -> BatchSummary {
        BatchSummary {
            cache: self.cache,
            count: self.count,
            succeeded: self.succeeded,
            failed: self.failed,
            average_ms: self.collector.average(),
            statistics: self.collector.statistics(),
            started_at: self.started_at,
            elapsed: self.started.elapsed(),
        }
    }
}

impl<C: SearchClient> BatchRunner<C> {
    pub fn new(client: C, logger: Logger) -> Self {
        Self { client, logger }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Search every name in order with a fresh timing collector.
    ///
    /// Failed searches are logged and skipped; they never abort the batch.
    pub async fn run_batch<I, S>(&self, names: I, cache: CacheDirective) -> BatchSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tally = BatchTally::start(cache);
        for name in names {
            self.attempt(name.as_ref(), &mut tally).await;
        }
        tally.finish()
    }

    /// Stream family names from a file into a batch.
    ///
    /// Lines are trimmed and blank lines skipped. A missing or unreadable
    /// file aborts this batch only.
    pub async fn run_batch_from_file(&self, path: &Path, cache: CacheDirective) -> Result<BatchSummary> {
        let file = File::open(path)
            .await
            .with_context(|| format!("Names file {}", path.display()))?;

        let mut lines = BufReader::new(file).lines();
        let mut tally = BatchTally::start(cache);

        while let Some(line) = lines
            .next_line()
            .await
            .with_context(|| format!("Reading names file {}", path.display()))?
        {
            let name = line.trim();
            if name.is_empty() {
                continue;
            }
            self.attempt(name, &mut tally).await;
        }

        Ok(tally.finish())
    }

    async fn attempt(&self, family: &str, tally: &mut BatchTally) {
        let request = SearchRequest::patient_by_family(family).with_cache(tally.cache);
        tally.count += 1;

        let collector = &mut tally.collector;
        let outcome = self
            .client
            .search(&request, &mut |elapsed| collector.record(elapsed))
            .await;

        match outcome {
            Ok(result) => {
                tally.succeeded += 1;
                self.logger
                    .debug(&format!("Search for '{}' returned {} entries", family, result.len()))
                    .field("family", family)
                    .field("entries", result.len())
                    .field("total", result.total())
                    .log()
                    .await;
            }
            Err(e) => {
                tally.failed += 1;
                self.logger
                    .warn(&format!("Search for '{}' failed: {}", family, e))
                    .field("family", family)
                    .field("cache", tally.cache.label())
                    .error_info(&e)
                    .log()
                    .await;
            }
        }
    }
}

/// Result of one run of a [`RunPlan`]
#[derive(Debug)]
pub struct RunOutcome {
    /// 1-based run number
    pub iteration: usize,
    pub cache: CacheDirective,
    pub result: Result<BatchSummary>,
}

/// Ordered cache directives plus the pause between runs
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub runs: Vec<CacheDirective>,
    pub delay: Duration,
}

impl RunPlan {
    pub fn new(runs: Vec<CacheDirective>, delay: Duration) -> Self {
        Self { runs, delay }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.run_plan.clone(), config.run_delay())
    }

    /// Execute every run against the names file.
    ///
    /// A run that fails to read the file is recorded and the plan moves on.
    /// Completion of `interrupt` at any point, during a run or a pause,
    /// stops the plan with [`AppError::Interrupted`]. An interrupted run
    /// logs no average.
    pub async fn run_all<C, F>(
        &self,
        runner: &BatchRunner<C>,
        names_file: &Path,
        interrupt: F,
    ) -> Result<Vec<RunOutcome>>
    where
        C: SearchClient,
        F: Future<Output = ()>,
    {
        let logger = runner.logger();
        let total = self.runs.len();
        let mut outcomes = Vec::with_capacity(total);
        tokio::pin!(interrupt);

        for (index, &cache) in self.runs.iter().enumerate() {
            let iteration = index + 1;

            if index > 0 {
                tokio::select! {
                    biased;
                    _ = &mut interrupt => {
                        return Err(AppError::interrupted(format!(
                            "Stopped after {} of {} runs",
                            index, total
                        )));
                    }
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }

            logger
                .info(&format!("Iteration {}", iteration))
                .field("cache", cache.label())
                .log()
                .await;

            let correlation_id = logger.start_operation("batch_run").await;
            let result = tokio::select! {
                biased;
                _ = &mut interrupt => None,
                result = runner.run_batch_from_file(names_file, cache) => Some(result),
            };
            let Some(result) = result else {
                logger.end_operation(&correlation_id, "batch_run", false).await;
                return Err(AppError::interrupted(format!(
                    "Stopped during run {} of {}",
                    iteration, total
                )));
            };

            match &result {
                Ok(summary) => {
                    logger
                        .info(&format!("Average response time: {}", summary.format_average()))
                        .correlation_id(&correlation_id)
                        .summary(summary)
                        .log()
                        .await;
                }
                Err(e) => {
                    logger.log_error(e, &format!("Iteration {} aborted", iteration)).await;
                }
            }
            logger.end_operation(&correlation_id, "batch_run", result.is_ok()).await;

            outcomes.push(RunOutcome {
                iteration,
                cache,
                result,
            });
        }

        Ok(outcomes)
    }
}
