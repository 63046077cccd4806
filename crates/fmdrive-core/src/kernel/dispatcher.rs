//! Dispatcher - drives one script from alias lookup to the final verdict.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::bootstrap::resolve_aliases;
use super::planner::{batch_size, plan_batches};
use super::worker::WorkerPool;
use crate::adapters::{BinaryEnumerator, FmCommand, Runner};
use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::observability::StepReporter;
use crate::script::parse_script;

/// Outcome of a finished dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Jobs that planned at least one batch
    pub jobs: usize,
    /// Batches planned from the script
    pub batches_planned: usize,
    /// Invocations of the binary, retries included
    pub invocations: usize,
    /// Failed multi-source batches that were split
    pub splits: usize,
    /// Batches queued by splitting
    pub retries_enqueued: usize,
    /// Sources that failed on their own
    pub failures: usize,
    pub failed_sources: Vec<String>,
}

impl DispatchReport {
    pub fn summary(&self) -> String {
        format!(
            "Jobs: {}, Batches: {}, Invocations: {}, Splits: {}, Failures: {}",
            self.jobs, self.batches_planned, self.invocations, self.splits, self.failures
        )
    }

    /// Fail if any source failed on its own.
    pub fn ensure_success(&self, binary: &str) -> Result<(), DriverError> {
        if self.failures > 0 {
            return Err(DriverError::Failures {
                count: self.failures,
                binary: binary.to_string(),
            });
        }
        Ok(())
    }
}

/// Runs scripts against one binary.
pub struct Dispatcher<R> {
    config: DriverConfig,
    command: FmCommand,
    runner: Arc<R>,
    reporter: Arc<dyn StepReporter>,
}

impl<R: Runner + 'static> Dispatcher<R> {
    /// A missing or empty binary path aborts before anything runs.
    pub fn new(
        config: DriverConfig,
        binary: Option<String>,
        runner: R,
        reporter: Arc<dyn StepReporter>,
    ) -> Result<Self, DriverError> {
        let binary = match binary {
            Some(binary) if !binary.is_empty() => binary,
            _ => {
                let err = DriverError::MissingBinary;
                reporter.fatal(&err.to_string());
                return Err(err);
            }
        };

        let command = FmCommand::new(binary, &config);
        Ok(Self {
            config,
            command,
            runner: Arc::new(runner),
            reporter,
        })
    }

    pub fn binary(&self) -> &str {
        self.command.binary()
    }

    /// Dispatch `script` and fail if any source failed on its own.
    ///
    /// Every error is reported as fatal before it is returned.
    pub async fn run(&self, script: &str) -> Result<DispatchReport, DriverError> {
        let mut rng = StdRng::from_entropy();
        let result = self
            .dispatch(script, &mut rng)
            .await
            .and_then(|report| report.ensure_success(self.binary()).map(|()| report));

        if let Err(err) = &result {
            self.reporter.fatal(&err.to_string());
        }
        result
    }

    /// Dispatch `script` to completion, retries included.
    ///
    /// Only setup problems are errors; source failures are in the report.
    pub async fn dispatch<G>(&self, script: &str, rng: &mut G) -> Result<DispatchReport, DriverError>
    where
        G: Rng + ?Sized,
    {
        let enumerator = BinaryEnumerator::new(Arc::clone(&self.runner), self.command.clone());
        let aliases = resolve_aliases(&enumerator, self.reporter.as_ref()).await?;
        let jobs = parse_script(script, &aliases);

        let workers = self.config.worker_count();
        let pool = WorkerPool::spawn(
            workers,
            Arc::clone(&self.runner),
            Arc::clone(&self.reporter),
            self.command.clone(),
            self.config.split,
        );

        let mut report = DispatchReport::default();
        {
            let _planning = pool.hold();
            for job in jobs {
                if job.is_empty() {
                    continue;
                }

                let sources = job.sources.len();
                let batches = plan_batches(job, workers, rng);
                tracing::info!(
                    sources,
                    batch_size = batch_size(sources, workers),
                    batches = batches.len(),
                    "Planned job"
                );

                report.jobs += 1;
                report.batches_planned += batches.len();
                for batch in batches {
                    pool.submit(batch);
                }
            }
        }

        let summary = pool.join().await?;
        report.invocations = summary.invocations;
        report.splits = summary.splits;
        report.retries_enqueued = summary.retries;
        report.failures = summary.failures;
        report.failed_sources = summary.failed_sources;

        tracing::info!(summary = %report.summary(), "Dispatch finished");
        Ok(report)
    }
}
