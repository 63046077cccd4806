//! Worker pool - runs batches and splits the ones that fail.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio::task::JoinHandle;

use super::queue::WorkQueue;
use super::tracker::{CompletionTracker, Release};
use crate::adapters::{FmCommand, Runner};
use crate::error::DriverError;
use crate::observability::{StepOutcome, StepReporter};
use crate::work::{SplitStrategy, Work};

#[derive(Debug, Default)]
struct PoolStats {
    invocations: AtomicUsize,
    splits: AtomicUsize,
    retries: AtomicUsize,
}

struct Shared<R> {
    queue: WorkQueue,
    tracker: CompletionTracker,
    stats: PoolStats,
    runner: R,
    reporter: Arc<dyn StepReporter>,
    command: FmCommand,
    split: SplitStrategy,
    /// First batch panic, surfaced by `join`.
    panic: Mutex<Option<String>>,
}

impl<R> Shared<R> {
    /// Count, then queue. Never the other way around.
    fn submit(&self, work: Work) {
        self.tracker.add(1);
        self.queue.push(work);
    }

    fn record_panic(&self, message: String) {
        self.panic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(message);
    }

    fn take_panic(&self) -> Option<String> {
        self.panic.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// A fixed set of workers draining one shared queue.
pub struct WorkerPool<R> {
    shared: Arc<Shared<R>>,
    handles: Vec<JoinHandle<()>>,
}

impl<R: Runner + 'static> WorkerPool<R> {
    /// Spawn `workers` workers (at least one) on the current runtime.
    pub fn spawn(
        workers: usize,
        runner: R,
        reporter: Arc<dyn StepReporter>,
        command: FmCommand,
        split: SplitStrategy,
    ) -> Self {
        let shared = Arc::new(Shared {
            queue: WorkQueue::new(),
            tracker: CompletionTracker::new(),
            stats: PoolStats::default(),
            runner,
            reporter,
            command,
            split,
            panic: Mutex::new(None),
        });

        let handles = (0..workers.max(1))
            .map(|id| {
                let shared = Arc::clone(&shared);
                tokio::spawn(async move { worker_loop(id, shared).await })
            })
            .collect();

        Self { shared, handles }
    }

    /// Queue a planned batch.
    pub fn submit(&self, work: Work) {
        self.shared.submit(work);
    }

    /// Hold the pool open while more batches may still be submitted.
    ///
    /// Completion cannot be observed until the returned guard is dropped.
    pub fn hold(&self) -> Release<'_> {
        self.shared.tracker.add(1);
        self.shared.tracker.release_on_drop()
    }

    /// Wait for every batch, including retries, then stop the workers.
    ///
    /// A batch that panicked fails the pool once everything else has run.
    pub async fn join(self) -> Result<PoolSummary, DriverError> {
        self.shared.tracker.wait().await;
        debug_assert!(self.shared.queue.is_empty());
        self.shared.queue.close();

        let results = futures::future::join_all(self.handles).await;
        for result in results {
            result.map_err(|e| DriverError::Worker(e.to_string()))?;
        }
        if let Some(message) = self.shared.take_panic() {
            return Err(DriverError::Worker(message));
        }

        let shared = &self.shared;
        Ok(PoolSummary {
            invocations: shared.stats.invocations.load(Ordering::Relaxed),
            splits: shared.stats.splits.load(Ordering::Relaxed),
            retries: shared.stats.retries.load(Ordering::Relaxed),
            failures: shared.tracker.failures(),
            failed_sources: shared.tracker.failed_sources(),
        })
    }
}

/// What the pool did, read once every worker has stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub invocations: usize,
    /// Failed multi-source batches that were broken up.
    pub splits: usize,
    /// Batches queued by splitting.
    pub retries: usize,
    /// Sources that failed on their own.
    pub failures: usize,
    pub failed_sources: Vec<String>,
}

async fn worker_loop<R: Runner>(id: usize, shared: Arc<Shared<R>>) {
    tracing::debug!(worker = id, "Worker started");

    while let Some(work) = shared.queue.pop().await {
        let _resolved = shared.tracker.release_on_drop();
        let sources = work.sources.len();

        // The worker survives a panicking batch and keeps draining the queue.
        let batch = AssertUnwindSafe(run_batch(id, &shared, work));
        if let Err(payload) = batch.catch_unwind().await {
            let message = format!(
                "batch of {} sources panicked: {}",
                sources,
                panic_message(payload.as_ref())
            );
            tracing::error!(worker = id, error = %message, "Batch panicked");
            shared.record_panic(message);
        }
    }

    tracing::debug!(worker = id, "Worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

async fn run_batch<R: Runner>(id: usize, shared: &Shared<R>, work: Work) {
    let invocation = shared.command.batch(&work);
    let step = shared.reporter.start(&invocation.command_line());

    shared.stats.invocations.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(
        worker = id,
        sources = work.sources.len(),
        queued = shared.queue.len(),
        "Running batch"
    );

    let err = match shared.runner.run(&invocation).await {
        Ok(_) => {
            shared.reporter.finish(step, &StepOutcome::Success);
            return;
        }
        Err(err) => err.to_string(),
    };
    shared.reporter.finish(step, &StepOutcome::Failure(err.clone()));

    if !work.is_splittable() {
        let source = work.sources.first().map(String::as_str).unwrap_or_default();
        tracing::warn!(worker = id, source, error = %err, "Source failed on its own");
        shared.tracker.record_failure(source);
        shared.reporter.fail(step, &err);
        return;
    }

    let retries = work.split(shared.split);
    tracing::warn!(
        worker = id,
        sources = work.sources.len(),
        retries = retries.len(),
        strategy = shared.split.name(),
        "Batch failed, splitting"
    );
    shared.stats.splits.fetch_add(1, Ordering::Relaxed);
    shared.stats.retries.fetch_add(retries.len(), Ordering::Relaxed);
    for retry in retries {
        shared.submit(retry);
    }
}
