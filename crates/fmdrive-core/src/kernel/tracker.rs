//! Completion tracker - counts outstanding batches and terminal failures.
//!
//! Every batch is counted with `add` before it is queued and released with
//! `done` after it is resolved. A failed batch adds its retries before it
//! releases itself, so the count never touches zero while work is in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct CompletionTracker {
    outstanding: AtomicUsize,
    failures: AtomicUsize,
    failed_sources: Mutex<Vec<String>>,
    idle: Notify,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for `n` batches about to be queued.
    pub fn add(&self, n: usize) {
        self.outstanding.fetch_add(n, Ordering::AcqRel);
    }

    /// Release one resolved batch. Returns true if that was the last one.
    pub fn done(&self) -> bool {
        let previous = self.outstanding.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "completion tracker released more than it added");
        if previous == 1 {
            self.idle.notify_waiters();
            true
        } else {
            false
        }
    }

    /// Count a terminal failure of `source`.
    pub fn record_failure(&self, source: &str) {
        self.failures.fetch_add(1, Ordering::AcqRel);
        self.failed_sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(source.to_string());
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Acquire)
    }

    /// Terminally failed sources, in the order they failed.
    pub fn failed_sources(&self) -> Vec<String> {
        self.failed_sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Release one batch when the returned guard is dropped.
    pub fn release_on_drop(&self) -> Release<'_> {
        Release { tracker: self }
    }

    /// Wait until no batch is outstanding.
    pub async fn wait(&self) {
        loop {
            let notified = self.idle.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Calls [`CompletionTracker::done`] once when dropped.
#[must_use = "dropping the guard releases the batch immediately"]
pub struct Release<'a> {
    tracker: &'a CompletionTracker,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.tracker.done();
    }
}
