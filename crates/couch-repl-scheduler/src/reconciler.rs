//! Job registry and config diffing

use crate::replicator::Replicator;
use crate::worker::JobWorker;
use couch_repl_types::{DatabaseConfig, HostConfig};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Mailbox and task of a live worker
struct WorkerHandle {
    mailbox: watch::Sender<DatabaseConfig>,
    task: JoinHandle<()>,
}

/// Databases touched by one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub started: Vec<String>,
    pub updated: Vec<String>,
    pub stopped: Vec<String>,
}

impl ReconcileSummary {
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.updated.is_empty() && self.stopped.is_empty()
    }
}

/// Sole owner of the worker registry
///
/// Workers only ever see their own mailbox. Pushing a config equal to the one
/// already in a mailbox does not wake the worker, so reconciling the same
/// `HostConfig` twice is a no-op.
pub struct Reconciler {
    replicator: Arc<Replicator>,
    workers: HashMap<String, WorkerHandle>,
    stopping: Vec<JoinHandle<()>>,
}

impl Reconciler {
    pub fn new(replicator: Arc<Replicator>) -> Self {
        Self {
            replicator,
            workers: HashMap::new(),
            stopping: Vec::new(),
        }
    }

    /// Start, update and stop workers so that they match `desired`
    ///
    /// The config database is never given a regular worker.
    pub fn reconcile(&mut self, desired: &HostConfig) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let mut wanted = HashSet::new();

        for config in desired.worker_entries() {
            wanted.insert(config.database.clone());

            match self.workers.get(&config.database) {
                Some(worker) => {
                    let modified = worker.mailbox.send_if_modified(|current| {
                        if *current == *config {
                            false
                        } else {
                            *current = config.clone();
                            true
                        }
                    });
                    if modified {
                        summary.updated.push(config.database.clone());
                    }
                }
                None => {
                    let (mailbox, inbox) = watch::channel(config.clone());
                    let task = JobWorker::new(self.replicator.clone(), inbox).spawn();
                    self.workers
                        .insert(config.database.clone(), WorkerHandle { mailbox, task });
                    summary.started.push(config.database.clone());
                }
            }
        }

        let removed: Vec<String> = self
            .workers
            .keys()
            .filter(|database| !wanted.contains(*database))
            .cloned()
            .collect();
        for database in removed {
            if let Some(worker) = self.workers.remove(&database) {
                // Dropping the sender closes the mailbox
                drop(worker.mailbox);
                self.stopping.push(worker.task);
                summary.stopped.push(database);
            }
        }
        self.stopping.retain(|task| !task.is_finished());

        summary.started.sort();
        summary.updated.sort();
        summary.stopped.sort();
        if !summary.is_empty() {
            tracing::info!(
                started = ?summary.started,
                updated = ?summary.updated,
                stopped = ?summary.stopped,
                "Reconciled workers"
            );
        }
        summary
    }

    /// Databases with a live worker, sorted
    pub fn databases(&self) -> Vec<String> {
        let mut databases: Vec<_> = self.workers.keys().cloned().collect();
        databases.sort();
        databases
    }

    /// Close every mailbox and wait for all workers, including those already
    /// stopping, to finish
    pub async fn shutdown_all(&mut self) {
        let mut tasks = std::mem::take(&mut self.stopping);
        for (_, worker) in self.workers.drain() {
            drop(worker.mailbox);
            tasks.push(worker.task);
        }

        tracing::info!(workers = tasks.len(), "Stopping workers");
        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Worker task failed");
            }
        }
    }
}
