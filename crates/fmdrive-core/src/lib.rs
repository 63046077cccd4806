//! fmdrive core - batched, self-splitting test dispatch
//!
//! This crate reads a job script, asks the binary which GMs and tests it
//! links, packs each job's sources into one batch per worker, and runs the
//! batches concurrently. A batch that fails is split and its sources are
//! re-run until every failure is pinned to a single source.

pub mod adapters;
pub mod config;
pub mod error;
pub mod kernel;
pub mod observability;
pub mod script;
pub mod work;

pub use adapters::{Enumerator, Invocation, ProcessRunner, Runner, UnitKind};
pub use config::DriverConfig;
pub use error::{DriverError, RunError};
pub use kernel::{DispatchReport, Dispatcher};
pub use observability::{RecordingReporter, StepReporter, TracingReporter};
pub use script::{AliasTable, Job};
pub use work::{SplitStrategy, Work};
