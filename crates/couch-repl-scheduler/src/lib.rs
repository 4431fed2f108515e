//! Reconciliation scheduler
//!
//! Keeps one replication job per configured database alive against the remote
//! store and follows changes to the desired-state document.
//!
//! ## Components
//!
//! - **ConfigResolver**: finds the `HostConfig` that applies to this node
//! - **Replicator**: schedule policy for one job (duplicate short-circuit, conflict replacement)
//! - **JobWorker**: per-database loop; schedule, wait, react to updates or closure
//! - **Reconciler**: owns the worker registry and applies config deltas
//! - **ConfigWatcher**: worker for the config database that re-resolves and drives the reconciler
//! - **bootstrap**: one-time priority replication of the config database
//! - **Scheduler**: process-facing handle tying the above together

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod error;
pub mod reconciler;
pub mod replicator;
pub mod resolver;
pub mod scheduler;
pub mod watcher;
pub mod worker;

#[cfg(test)]
mod testing;

pub use bootstrap::bootstrap;
pub use error::{BootstrapError, ResolveError, ScheduleError};
pub use reconciler::{ReconcileSummary, Reconciler};
pub use replicator::{Endpoint, JobTemplate, Replicator};
pub use resolver::ConfigResolver;
pub use scheduler::{ReplicateNowOutcome, Scheduler, SchedulerSettings, SchedulerStatus};
pub use watcher::ConfigWatcher;
pub use worker::JobWorker;
