//! Store trait definitions

use crate::error::StoreResult;
use async_trait::async_trait;
use couch_repl_types::{JobId, ReplicationConfig, ReplicationJob, ReplicationState};

/// Operations on a single named replication job
///
/// Implementations are stateless with respect to jobs; each job id is only
/// touched by the worker that owns it.
#[async_trait]
pub trait ReplicationClient: Send + Sync {
    /// Current remote state; a job that does not exist is `NotStarted`
    async fn check_state(&self, job: &JobId) -> StoreResult<ReplicationState>;

    /// Create the job document; an existing document yields `StoreError::Conflict`
    async fn create_job(&self, job: &ReplicationJob) -> StoreResult<()>;

    /// Delete the job document, reading its current revision first
    async fn delete_job(&self, job: &JobId) -> StoreResult<()>;
}

/// Read access to desired-state documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document from the config database
    async fn fetch_config(&self, id: &str) -> StoreResult<ReplicationConfig>;
}

/// Store reachability and system database management
#[async_trait]
pub trait StoreAdmin: Send + Sync {
    /// Succeeds once the store answers requests
    async fn ping(&self) -> StoreResult<()>;

    async fn database_exists(&self, database: &str) -> StoreResult<bool>;

    async fn create_database(&self, database: &str) -> StoreResult<()>;
}
