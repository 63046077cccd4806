//! Kernel - planning, queueing, running, and splitting batches.

mod bootstrap;
mod dispatcher;
mod planner;
mod queue;
mod tracker;
mod worker;

pub use bootstrap::resolve_aliases;
pub use dispatcher::{DispatchReport, Dispatcher};
pub use planner::{batch_size, plan_batches};
pub use queue::WorkQueue;
pub use tracker::{CompletionTracker, Release};
pub use worker::{PoolSummary, WorkerPool};
