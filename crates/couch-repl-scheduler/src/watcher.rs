//! Worker for the config database that drives reconciliation

use crate::error::{ResolveError, ScheduleError};
use crate::reconciler::Reconciler;
use crate::replicator::Replicator;
use crate::resolver::ConfigResolver;
use crate::scheduler::SchedulerStatus;
use crate::worker::{wait, Cadence, Wake};
use couch_repl_types::{DatabaseConfig, HostConfig, NodeId, REPL_CONFIG_DB, RETRY_INTERVAL_SECS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Keeps the config database replicated and the workers in line with it
///
/// Each cycle schedules the config database, re-resolves this node's
/// `HostConfig` and reconciles when it differs from the last applied one. The
/// config database's own cadence comes from its entry in the resolved config,
/// or the process default when there is none. The interval floor is not applied
/// here; a zero interval waits the retry interval instead of spinning.
pub struct ConfigWatcher {
    node: NodeId,
    resolver: ConfigResolver,
    replicator: Arc<Replicator>,
    reconciler: Reconciler,
    status: Arc<watch::Sender<SchedulerStatus>>,
    current: Option<HostConfig>,
    own: DatabaseConfig,
    reconciliations: u64,
}

impl ConfigWatcher {
    pub fn new(
        node: NodeId,
        resolver: ConfigResolver,
        replicator: Arc<Replicator>,
        status: Arc<watch::Sender<SchedulerStatus>>,
    ) -> Self {
        Self {
            node,
            resolver,
            reconciler: Reconciler::new(replicator.clone()),
            replicator,
            status,
            current: None,
            own: DatabaseConfig::config_default(),
            reconciliations: 0,
        }
    }

    /// Run until `shutdown` turns true or its sender is dropped, then stop
    /// every worker
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut cadence = Cadence::new(self.own.interval);
        self.publish(true);
        tracing::info!(node = %self.node, "Config watcher started");

        while !*shutdown.borrow_and_update() {
            let scheduled = match self
                .replicator
                .schedule(REPL_CONFIG_DB, self.own.continuous)
                .await
            {
                Ok(()) => true,
                Err(ScheduleError::Duplicate { state }) => {
                    tracing::debug!(database = REPL_CONFIG_DB, %state, "Job already in flight");
                    true
                }
                Err(e) => {
                    tracing::error!(
                        database = REPL_CONFIG_DB,
                        error = %e,
                        "Failed to schedule replication"
                    );
                    false
                }
            };

            let refreshed = match self.refresh().await {
                Ok(true) => {
                    cadence = Cadence::new(self.own.interval);
                    true
                }
                Ok(false) => true,
                Err(e) => {
                    tracing::error!(node = %self.node, error = %e, "Failed to resolve host config");
                    false
                }
            };

            let mut timeout = if scheduled && refreshed {
                cadence.succeeded()
            } else {
                cadence.failed()
            };
            if timeout.is_zero() {
                timeout = Duration::from_secs(RETRY_INTERVAL_SECS);
            }

            if wait(&mut shutdown, Some(timeout)).await == Wake::Closed {
                break;
            }
        }

        tracing::info!(node = %self.node, "Config watcher stopping");
        self.reconciler.shutdown_all().await;
        self.publish(false);
    }

    /// Re-resolve and reconcile on change. Returns whether the config changed.
    async fn refresh(&mut self) -> Result<bool, ResolveError> {
        let desired = self.resolver.resolve(&self.node).await?;
        if self.current.as_ref() == Some(&desired) {
            return Ok(false);
        }

        tracing::info!(node = %self.node, hostname = %desired.hostname, "Host config changed");
        self.reconciler.reconcile(&desired);
        self.reconciliations += 1;

        self.own = desired
            .config_entry()
            .cloned()
            .unwrap_or_else(DatabaseConfig::config_default);
        if self.own.below_floor() {
            tracing::info!(
                database = REPL_CONFIG_DB,
                interval = self.own.interval,
                "Config database interval below minimum, keeping it"
            );
        }

        self.current = Some(desired);
        self.publish(true);
        Ok(true)
    }

    fn publish(&self, running: bool) {
        self.status.send_replace(SchedulerStatus {
            running,
            host_config: self.current.clone(),
            workers: self.reconciler.databases(),
            config_interval: self.own.interval,
            reconciliations: self.reconciliations,
        });
    }
}
