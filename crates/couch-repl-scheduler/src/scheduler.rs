//! Process-facing scheduler handle

use crate::bootstrap::bootstrap;
use crate::error::{BootstrapError, ResolveError, ScheduleError};
use crate::replicator::{JobTemplate, Replicator};
use crate::resolver::ConfigResolver;
use crate::watcher::ConfigWatcher;
use couch_repl_client::{DocumentStore, ReplicationClient};
use couch_repl_types::{HostConfig, NodeId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Delay between bootstrap state polls
    pub bootstrap_poll_interval: Duration,

    /// Maximum number of bootstrap state polls
    pub bootstrap_wait_limit: u32,

    /// Kill-switch: no job is ever scheduled
    pub stop_replication: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            bootstrap_poll_interval: Duration::from_secs(1),
            bootstrap_wait_limit: 60,
            stop_replication: false,
        }
    }
}

/// Snapshot published by the config watcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStatus {
    /// Whether the config watcher is running
    pub running: bool,

    /// Last applied host config
    pub host_config: Option<HostConfig>,

    /// Databases with a live worker
    pub workers: Vec<String>,

    /// Current cadence of the config database, in seconds
    pub config_interval: u64,

    /// Number of applied config changes
    pub reconciliations: u64,
}

/// Result of a replicate-now sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicateNowOutcome {
    /// Kill-switch set; nothing was scheduled
    Disabled,

    Completed { scheduled: usize, failed: usize },
}

/// Scheduler handle shared between the startup task and the admin API
pub struct Scheduler {
    settings: SchedulerSettings,
    resolver: ConfigResolver,
    replicator: Arc<Replicator>,
    status: Arc<watch::Sender<SchedulerStatus>>,
}

impl Scheduler {
    pub fn new<S>(store: Arc<S>, template: JobTemplate, settings: SchedulerSettings) -> Self
    where
        S: ReplicationClient + DocumentStore + 'static,
    {
        let client: Arc<dyn ReplicationClient> = store.clone();
        let documents: Arc<dyn DocumentStore> = store;
        let (status, _) = watch::channel(SchedulerStatus::default());

        Self {
            settings,
            resolver: ConfigResolver::new(documents),
            replicator: Arc::new(Replicator::new(client, template)),
            status: Arc::new(status),
        }
    }

    pub fn node(&self) -> &NodeId {
        self.replicator.template().node()
    }

    pub fn is_disabled(&self) -> bool {
        self.settings.stop_replication
    }

    /// Latest published status
    pub fn status(&self) -> SchedulerStatus {
        self.status.borrow().clone()
    }

    /// Bootstrap, then run the config watcher until `shutdown` fires
    ///
    /// Returns immediately when the kill-switch is set. Bootstrap errors are
    /// returned before any worker exists.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<(), BootstrapError> {
        if self.is_disabled() {
            tracing::warn!("Replication disabled, scheduler not started");
            return Ok(());
        }

        bootstrap(
            &self.replicator,
            self.settings.bootstrap_poll_interval,
            self.settings.bootstrap_wait_limit,
        )
        .await?;

        ConfigWatcher::new(
            self.node().clone(),
            self.resolver.clone(),
            self.replicator.clone(),
            self.status.clone(),
        )
        .run(shutdown)
        .await;

        Ok(())
    }

    /// Schedule every configured database once, without touching any worker
    pub async fn replicate_now(&self) -> Result<ReplicateNowOutcome, ResolveError> {
        if self.is_disabled() {
            return Ok(ReplicateNowOutcome::Disabled);
        }

        let desired = self.resolver.resolve(self.node()).await?;
        let mut scheduled = 0;
        let mut failed = 0;

        for config in &desired.replications {
            match self.replicator.schedule(&config.database, false).await {
                Ok(()) | Err(ScheduleError::Duplicate { .. }) => scheduled += 1,
                Err(e) => {
                    tracing::error!(
                        database = %config.database,
                        error = %e,
                        "Immediate replication failed"
                    );
                    failed += 1;
                }
            }
        }

        tracing::info!(scheduled, failed, "Immediate replication finished");
        Ok(ReplicateNowOutcome::Completed { scheduled, failed })
    }
}
