//! Per-database scheduling loop

use crate::error::ScheduleError;
use crate::replicator::Replicator;
use couch_repl_types::{DatabaseConfig, RETRY_INTERVAL_SECS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Interval bookkeeping across failed cycles
///
/// A zero interval is swapped for the retry interval while scheduling fails and
/// restored on the next successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cadence {
    interval: u64,
    saved: Option<u64>,
}

impl Cadence {
    pub(crate) fn new(interval: u64) -> Self {
        Self {
            interval,
            saved: None,
        }
    }

    pub(crate) fn interval(&self) -> u64 {
        self.interval
    }

    pub(crate) fn succeeded(&mut self) -> Duration {
        if let Some(saved) = self.saved.take() {
            self.interval = saved;
        }
        Duration::from_secs(self.interval)
    }

    pub(crate) fn failed(&mut self) -> Duration {
        if self.interval == 0 && self.saved.is_none() {
            self.saved = Some(0);
            self.interval = RETRY_INTERVAL_SECS;
        }
        Duration::from_secs(self.interval)
    }
}

/// What ended a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    Elapsed,
    Updated,
    Closed,
}

/// Wait for the timer (if any), an update, or mailbox closure
pub(crate) async fn wait<T>(mailbox: &mut watch::Receiver<T>, timeout: Option<Duration>) -> Wake {
    let changed = async {
        match mailbox.changed().await {
            Ok(()) => Wake::Updated,
            Err(_) => Wake::Closed,
        }
    };

    match timeout {
        Some(timeout) => tokio::select! {
            wake = changed => wake,
            _ = tokio::time::sleep(timeout) => Wake::Elapsed,
        },
        None => changed.await,
    }
}

/// Apply the non-continuous interval floor, logging any adjustment
pub(crate) fn effective(config: &DatabaseConfig) -> DatabaseConfig {
    let floored = config.floored();
    if floored.interval != config.interval {
        tracing::info!(
            database = %config.database,
            configured = config.interval,
            interval = floored.interval,
            "Raised interval to minimum"
        );
    }
    floored
}

/// Scheduling loop for one database
///
/// Schedules the job, then waits for the interval, a new config on the mailbox,
/// or mailbox closure. Continuous jobs that scheduled fine wait on the mailbox
/// only. Closure triggers one best-effort delete of the remote job.
pub struct JobWorker {
    replicator: Arc<Replicator>,
    mailbox: watch::Receiver<DatabaseConfig>,
}

impl JobWorker {
    pub fn new(replicator: Arc<Replicator>, mailbox: watch::Receiver<DatabaseConfig>) -> Self {
        Self {
            replicator,
            mailbox,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        let mut config = effective(&self.mailbox.borrow_and_update());
        let mut cadence = Cadence::new(config.interval);
        tracing::info!(
            database = %config.database,
            continuous = config.continuous,
            interval = config.interval,
            "Worker started"
        );

        loop {
            let timeout = match self
                .replicator
                .schedule(&config.database, config.continuous)
                .await
            {
                Ok(()) => Self::after_success(&config, &mut cadence),
                Err(ScheduleError::Duplicate { state }) => {
                    tracing::debug!(database = %config.database, %state, "Job already in flight");
                    Self::after_success(&config, &mut cadence)
                }
                Err(e) => {
                    let retry = cadence.failed();
                    tracing::error!(
                        database = %config.database,
                        error = %e,
                        retry_secs = retry.as_secs(),
                        "Failed to schedule replication"
                    );
                    Some(retry)
                }
            };

            match wait(&mut self.mailbox, timeout).await {
                Wake::Elapsed => {}
                Wake::Updated => {
                    config = effective(&self.mailbox.borrow_and_update());
                    cadence = Cadence::new(config.interval);
                    tracing::info!(
                        database = %config.database,
                        continuous = config.continuous,
                        interval = config.interval,
                        "Worker config updated"
                    );
                }
                Wake::Closed => break,
            }
        }

        if let Err(e) = self.replicator.unschedule(&config.database).await {
            tracing::warn!(database = %config.database, error = %e, "Failed to delete job");
        }
        tracing::info!(database = %config.database, "Worker stopped");
    }

    fn after_success(config: &DatabaseConfig, cadence: &mut Cadence) -> Option<Duration> {
        let interval = cadence.succeeded();
        if config.continuous {
            None
        } else {
            Some(interval)
        }
    }
}
