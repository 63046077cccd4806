//! Work queue - unbounded FIFO shared by the planner and every worker.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::work::Work;

/// Unbounded multi-producer, multi-consumer queue of batches.
///
/// `pop` waits while the queue is empty and open. Once closed, workers
/// drain what is left and then see `None`.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<Work>>,
    available: Notify,
    closed: AtomicBool,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch. Never blocks; pushes after `close` are still
    /// delivered to remaining poppers.
    pub fn push(&self, work: Work) {
        self.items().push_back(work);
        self.available.notify_one();
    }

    /// Take the oldest batch, waiting for one if the queue is open.
    pub async fn pop(&self) -> Option<Work> {
        loop {
            let notified = self.available.notified();
            {
                let mut items = self.items();
                if let Some(work) = items.pop_front() {
                    if !items.is_empty() {
                        // Pass the wakeup on so a parked worker picks up the rest.
                        self.available.notify_one();
                    }
                    return Some(work);
                }
                if self.closed.load(Ordering::Acquire) {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Wake every waiting worker; they return `None` once the queue is empty.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.available.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<Work>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
