//! One-time priority replication of the config database

use crate::error::{BootstrapError, ScheduleError};
use crate::replicator::Replicator;
use couch_repl_types::{ReplicationState, REPL_CONFIG_DB};
use std::time::Duration;

/// Replicate the config database once and wait for the job to complete
///
/// Polls the job state every `poll_interval`, at most `wait_limit` times.
/// Returns the poll on which the job completed. A failed job, an exhausted poll
/// budget, or a schedule error other than `Duplicate` is fatal.
pub async fn bootstrap(
    replicator: &Replicator,
    poll_interval: Duration,
    wait_limit: u32,
) -> Result<u32, BootstrapError> {
    tracing::info!(database = REPL_CONFIG_DB, wait_limit, "Bootstrapping config replication");

    match replicator.schedule(REPL_CONFIG_DB, false).await {
        Ok(()) => {}
        Err(ScheduleError::Duplicate { state }) => {
            tracing::debug!(database = REPL_CONFIG_DB, %state, "Config replication already in flight");
        }
        Err(e) => return Err(BootstrapError::Schedule(e)),
    }

    for attempt in 1..=wait_limit {
        match replicator.check_state(REPL_CONFIG_DB).await {
            Ok(ReplicationState::Completed) => {
                tracing::info!(attempt, "Config replication completed");
                return Ok(attempt);
            }
            Ok(ReplicationState::Failed) => {
                tracing::error!(attempt, "Config replication failed");
                return Err(BootstrapError::Failed { attempt });
            }
            Ok(state) => {
                tracing::debug!(attempt, %state, "Waiting for config replication");
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Failed to check config replication");
            }
        }

        if attempt < wait_limit {
            tokio::time::sleep(poll_interval).await;
        }
    }

    Err(BootstrapError::TimedOut {
        attempts: wait_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{replicator, template};
    use async_trait::async_trait;
    use couch_repl_client::{InMemoryStore, ReplicationClient, StoreError, StoreOp, StoreResult};
    use couch_repl_types::{JobId, ReplicationJob};
    use std::collections::VecDeque;
    use std::iter;
    use std::sync::{Arc, Mutex};

    const POLL: Duration = Duration::from_secs(1);

    fn config_job() -> JobId {
        JobId::for_database(REPL_CONFIG_DB)
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_on_first_poll() {
        let store = Arc::new(InMemoryStore::recording());
        let attempt = bootstrap(&replicator(&store, "ITB-101-CP1"), POLL, 60)
            .await
            .unwrap();
        assert_eq!(attempt, 1);

        let job = store.job(&config_job()).await.unwrap();
        assert!(!job.continuous);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_until_completed() {
        let store = Arc::new(InMemoryStore::recording());
        // First state is read by the schedule call itself
        store
            .script_states(
                &config_job(),
                iter::repeat(ReplicationState::Initializing)
                    .take(4)
                    .chain([ReplicationState::Crashed, ReplicationState::Completed]),
            )
            .await;

        let start = tokio::time::Instant::now();
        let attempt = bootstrap(&replicator(&store, "ITB-101-CP1"), POLL, 60)
            .await
            .unwrap();
        assert_eq!(attempt, 5);
        assert_eq!(start.elapsed(), POLL * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_before_limit_is_fatal() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .script_states(
                &config_job(),
                iter::repeat(ReplicationState::Initializing)
                    .take(60)
                    .chain([ReplicationState::Failed]),
            )
            .await;

        let err = bootstrap(&replicator(&store, "ITB-101-CP1"), POLL, 60)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Failed { attempt: 60 }));
        // One check from scheduling plus sixty polls
        assert_eq!(store.count(StoreOp::CheckState, &config_job()).await, 61);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_limit_times_out() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .script_states(
                &config_job(),
                iter::repeat(ReplicationState::Initializing).take(20),
            )
            .await;

        let err = bootstrap(&replicator(&store, "ITB-101-CP1"), POLL, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::TimedOut { attempts: 5 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_error_is_fatal() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .fail_next(StoreOp::CheckState, StoreError::Transport("refused".into()))
            .await;

        let err = bootstrap(&replicator(&store, "ITB-101-CP1"), POLL, 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Schedule(ScheduleError::Transport(_))
        ));
        assert!(store.job(&config_job()).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_config_job_is_polled() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .set_state(&config_job(), ReplicationState::Running)
            .await;
        store
            .script_states(
                &config_job(),
                [
                    ReplicationState::Running,
                    ReplicationState::Running,
                    ReplicationState::Completed,
                ],
            )
            .await;

        let attempt = bootstrap(&replicator(&store, "ITB-101-CP1"), POLL, 60)
            .await
            .unwrap();
        assert_eq!(attempt, 2);
        assert_eq!(store.count(StoreOp::Create, &config_job()).await, 0);
    }

    /// Client answering state checks from a fixed script
    struct ScriptedClient {
        states: Mutex<VecDeque<StoreResult<ReplicationState>>>,
    }

    #[async_trait]
    impl ReplicationClient for ScriptedClient {
        async fn check_state(&self, _job: &JobId) -> StoreResult<ReplicationState> {
            self.states
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(ReplicationState::Initializing))
        }

        async fn create_job(&self, _job: &ReplicationJob) -> StoreResult<()> {
            Ok(())
        }

        async fn delete_job(&self, _job: &JobId) -> StoreResult<()> {
            Ok(())
        }
    }

    fn scripted(states: Vec<StoreResult<ReplicationState>>) -> Replicator {
        let client = Arc::new(ScriptedClient {
            states: Mutex::new(states.into()),
        });
        Replicator::new(client, template("ITB-101-CP1"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_errors_consume_attempts() {
        let refused = || -> StoreResult<ReplicationState> { Err(StoreError::Transport("refused".into())) };

        let replicator = scripted(vec![
            Ok(ReplicationState::NotStarted),
            refused(),
            refused(),
            Ok(ReplicationState::Completed),
        ]);
        assert_eq!(bootstrap(&replicator, POLL, 5).await.unwrap(), 3);

        let replicator = scripted(vec![
            Ok(ReplicationState::NotStarted),
            refused(),
            refused(),
            Ok(ReplicationState::Completed),
        ]);
        let err = bootstrap(&replicator, POLL, 2).await.unwrap_err();
        assert!(matches!(err, BootstrapError::TimedOut { attempts: 2 }));
    }
}
