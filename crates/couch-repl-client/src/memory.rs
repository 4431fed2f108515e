//! In-memory store implementation
//!
//! Mirrors the document store's observable behaviour closely enough for the
//! scheduler: creating a job whose document already exists conflicts, deleting
//! a missing job is not found, and a config document can be added or removed at
//! any time. A store built with [`InMemoryStore::recording`] also keeps a log of
//! every call so callers can assert on remote traffic.

use crate::error::{StoreError, StoreResult};
use crate::traits::{DocumentStore, ReplicationClient, StoreAdmin};
use async_trait::async_trait;
use couch_repl_types::{JobId, ReplicationConfig, ReplicationJob, ReplicationState};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Kind of store operation, used for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CheckState,
    Create,
    Delete,
    FetchConfig,
}

/// A recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CheckState(JobId),
    Create(JobId),
    Delete(JobId),
    FetchConfig(String),
}

impl StoreCall {
    pub fn op(&self) -> StoreOp {
        match self {
            StoreCall::CheckState(_) => StoreOp::CheckState,
            StoreCall::Create(_) => StoreOp::Create,
            StoreCall::Delete(_) => StoreOp::Delete,
            StoreCall::FetchConfig(_) => StoreOp::FetchConfig,
        }
    }

    pub fn job(&self) -> Option<&JobId> {
        match self {
            StoreCall::CheckState(id) | StoreCall::Create(id) | StoreCall::Delete(id) => Some(id),
            StoreCall::FetchConfig(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredJob {
    job: ReplicationJob,
    state: ReplicationState,
    revision: u64,
}

/// In-memory store for development and testing
#[derive(Debug)]
pub struct InMemoryStore {
    jobs: Arc<RwLock<HashMap<JobId, StoredJob>>>,
    configs: Arc<RwLock<HashMap<String, ReplicationConfig>>>,
    databases: Arc<RwLock<HashSet<String>>>,
    failures: Arc<RwLock<HashMap<StoreOp, VecDeque<StoreError>>>>,
    state_scripts: Arc<RwLock<HashMap<JobId, VecDeque<ReplicationState>>>>,
    calls: Arc<RwLock<Vec<StoreCall>>>,
    recording: bool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create a new in-memory store that keeps no call log
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            configs: Arc::new(RwLock::new(HashMap::new())),
            databases: Arc::new(RwLock::new(HashSet::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            state_scripts: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            recording: false,
        }
    }

    /// Create an in-memory store that records every call
    pub fn recording() -> Self {
        Self {
            recording: true,
            ..Self::new()
        }
    }

    /// Store or replace a config document
    pub async fn put_config(&self, config: ReplicationConfig) {
        let mut configs = self.configs.write().await;
        configs.insert(config.id.clone(), config);
    }

    pub async fn remove_config(&self, id: &str) -> bool {
        let mut configs = self.configs.write().await;
        configs.remove(id).is_some()
    }

    /// Override the state of an existing job, or register a job in that state
    pub async fn set_state(&self, job: &JobId, state: ReplicationState) {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(job) {
            Some(stored) => stored.state = state,
            None => {
                let database = job.database().unwrap_or(job.as_str());
                jobs.insert(
                    job.clone(),
                    StoredJob {
                        job: ReplicationJob::new(database, "", "", false),
                        state,
                        revision: 1,
                    },
                );
            }
        }
    }

    /// States returned by successive `check_state` calls for `job` before
    /// falling back to the stored job state
    pub async fn script_states(&self, job: &JobId, states: impl IntoIterator<Item = ReplicationState>) {
        let mut scripts = self.state_scripts.write().await;
        scripts.entry(job.clone()).or_default().extend(states);
    }

    /// Make the next call of `op` fail with `error`
    pub async fn fail_next(&self, op: StoreOp, error: StoreError) {
        let mut failures = self.failures.write().await;
        failures.entry(op).or_default().push_back(error);
    }

    pub async fn job(&self, job: &JobId) -> Option<ReplicationJob> {
        let jobs = self.jobs.read().await;
        jobs.get(job).map(|stored| stored.job.clone())
    }

    pub async fn job_ids(&self) -> Vec<JobId> {
        let jobs = self.jobs.read().await;
        let mut ids: Vec<_> = jobs.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.read().await.clone()
    }

    /// Recorded calls that touched `job`
    pub async fn calls_for(&self, job: &JobId) -> Vec<StoreCall> {
        let calls = self.calls.read().await;
        calls
            .iter()
            .filter(|c| c.job() == Some(job))
            .cloned()
            .collect()
    }

    pub async fn count(&self, op: StoreOp, job: &JobId) -> usize {
        self.calls_for(job)
            .await
            .iter()
            .filter(|c| c.op() == op)
            .count()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    pub async fn has_database(&self, database: &str) -> bool {
        self.databases.read().await.contains(database)
    }

    async fn record(&self, call: StoreCall) -> StoreResult<()> {
        let op = call.op();
        if self.recording {
            self.calls.write().await.push(call);
        }

        let mut failures = self.failures.write().await;
        match failures.get_mut(&op).and_then(|queue| queue.pop_front()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReplicationClient for InMemoryStore {
    async fn check_state(&self, job: &JobId) -> StoreResult<ReplicationState> {
        self.record(StoreCall::CheckState(job.clone())).await?;

        let scripted = {
            let mut scripts = self.state_scripts.write().await;
            scripts.get_mut(job).and_then(|queue| queue.pop_front())
        };
        if let Some(state) = scripted {
            return Ok(state);
        }

        let jobs = self.jobs.read().await;
        Ok(jobs
            .get(job)
            .map(|stored| stored.state)
            .unwrap_or(ReplicationState::NotStarted))
    }

    async fn create_job(&self, job: &ReplicationJob) -> StoreResult<()> {
        self.record(StoreCall::Create(job.id.clone())).await?;

        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::Conflict(format!(
                "Document {} already exists",
                job.id
            )));
        }

        // One-shot jobs finish immediately; continuous ones keep running
        let state = if job.continuous {
            ReplicationState::Running
        } else {
            ReplicationState::Completed
        };

        jobs.insert(
            job.id.clone(),
            StoredJob {
                job: job.clone(),
                state,
                revision: 1,
            },
        );
        Ok(())
    }

    async fn delete_job(&self, job: &JobId) -> StoreResult<()> {
        self.record(StoreCall::Delete(job.clone())).await?;

        let mut jobs = self.jobs.write().await;
        match jobs.remove(job) {
            Some(stored) => {
                tracing::debug!(job_id = %job, revision = stored.revision, "Deleted job");
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("Job {} not found", job))),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn fetch_config(&self, id: &str) -> StoreResult<ReplicationConfig> {
        self.record(StoreCall::FetchConfig(id.to_string())).await?;

        let configs = self.configs.read().await;
        configs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Config document {} not found", id)))
    }
}

#[async_trait]
impl StoreAdmin for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn database_exists(&self, database: &str) -> StoreResult<bool> {
        Ok(self.databases.read().await.contains(database))
    }

    async fn create_database(&self, database: &str) -> StoreResult<()> {
        self.databases.write().await.insert(database.to_string());
        Ok(())
    }
}
