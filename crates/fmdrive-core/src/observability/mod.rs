//! Observability - task steps for every invocation, failures and aborts.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifies one reported step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepId(Uuid);

impl StepId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failure(String),
}

/// Receives step lifecycle events from the dispatcher.
///
/// Reporting never influences dispatch; implementations must not block.
pub trait StepReporter: Send + Sync {
    /// A step is starting.
    fn start(&self, name: &str) -> StepId;

    /// A step has ended.
    fn finish(&self, id: StepId, outcome: &StepOutcome);

    /// A step failed in a way that counts against the run. Not fatal.
    fn fail(&self, id: StepId, error: &str);

    /// The run is aborting.
    fn fatal(&self, error: &str);
}

/// Reports steps as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl StepReporter for TracingReporter {
    fn start(&self, name: &str) -> StepId {
        let id = StepId::new();
        tracing::debug!(step_id = %id, name, "Step started");
        id
    }

    fn finish(&self, id: StepId, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Success => tracing::debug!(step_id = %id, "Step succeeded"),
            StepOutcome::Failure(error) => {
                tracing::debug!(step_id = %id, error = %error, "Step failed")
            }
        }
    }

    fn fail(&self, id: StepId, error: &str) {
        tracing::warn!(step_id = %id, error, "Failure");
    }

    fn fatal(&self, error: &str) {
        tracing::error!(error, "Fatal");
    }
}

/// A step as seen by [`RecordingReporter`].
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub id: StepId,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: Option<StepOutcome>,
    /// Set when the step was reported through `fail`.
    pub failed: bool,
}

/// Keeps every reported step in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    steps: Mutex<Vec<StepRecord>>,
    fatals: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all steps in start order.
    pub fn steps(&self) -> Vec<StepRecord> {
        lock(&self.steps).clone()
    }

    /// Names of steps reported through `fail`.
    pub fn failed_steps(&self) -> Vec<String> {
        lock(&self.steps)
            .iter()
            .filter(|s| s.failed)
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn fatals(&self) -> Vec<String> {
        lock(&self.fatals).clone()
    }

    fn update(&self, id: StepId, f: impl FnOnce(&mut StepRecord)) {
        if let Some(step) = lock(&self.steps).iter_mut().find(|s| s.id == id) {
            f(step);
        }
    }
}

impl StepReporter for RecordingReporter {
    fn start(&self, name: &str) -> StepId {
        let id = StepId::new();
        lock(&self.steps).push(StepRecord {
            id,
            name: name.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            outcome: None,
            failed: false,
        });
        id
    }

    fn finish(&self, id: StepId, outcome: &StepOutcome) {
        self.update(id, |step| {
            step.finished_at = Some(Utc::now());
            step.outcome = Some(outcome.clone());
        });
    }

    fn fail(&self, id: StepId, _error: &str) {
        self.update(id, |step| step.failed = true);
    }

    fn fatal(&self, error: &str) {
        lock(&self.fatals).push(error.to_string());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_step_lifecycle() {
        let reporter = RecordingReporter::new();

        let ok = reporter.start("fm -s gm1");
        let bad = reporter.start("fm -s gm2");
        reporter.finish(ok, &StepOutcome::Success);
        reporter.finish(bad, &StepOutcome::Failure("exit 1".into()));
        reporter.fail(bad, "exit 1");
        reporter.fatal("1 runs of fm failed after retries.");

        let steps = reporter.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].outcome, Some(StepOutcome::Success));
        assert!(steps[0].finished_at.is_some());
        assert!(!steps[0].failed);
        assert!(steps[1].failed);
        assert_eq!(reporter.failed_steps(), vec!["fm -s gm2"]);
        assert_eq!(reporter.fatals().len(), 1);
    }

    #[test]
    fn unknown_step_ids_are_ignored() {
        let reporter = RecordingReporter::new();
        reporter.finish(StepId::new(), &StepOutcome::Success);
        assert!(reporter.steps().is_empty());
    }

    #[test]
    fn step_ids_are_unique() {
        let reporter = TracingReporter;
        assert_ne!(reporter.start("a"), reporter.start("a"));
    }
}
