//! Schedule policy for a single replication job

use crate::error::ScheduleError;
use couch_repl_client::couch::database_url;
use couch_repl_client::{Credentials, ReplicationClient, StoreError, StoreResult};
use couch_repl_types::{
    IdSelector, JobId, NodeId, ReplicationJob, ReplicationState, DEVICES_DB,
};
use std::sync::Arc;

/// Store address plus the credentials embedded into job endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub credentials: Credentials,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            address: address.into(),
            credentials,
        }
    }

    fn database_url(&self, database: &str) -> StoreResult<String> {
        database_url(&self.address, &self.credentials, database)
    }
}

/// Builds job documents for this node: remote source, local target
#[derive(Debug, Clone)]
pub struct JobTemplate {
    source: Endpoint,
    target: Endpoint,
    node: NodeId,
}

impl JobTemplate {
    /// Both addresses are validated up front so job construction only fails on
    /// database names the URL encoder rejects.
    pub fn new(source: Endpoint, target: Endpoint, node: NodeId) -> StoreResult<Self> {
        source.database_url("_")?;
        target.database_url("_")?;
        Ok(Self {
            source,
            target,
            node,
        })
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    /// Job document for `database`
    ///
    /// The devices database is narrowed to the node's room when the node id
    /// carries a group key.
    pub fn job(&self, database: &str, continuous: bool) -> StoreResult<ReplicationJob> {
        let job = ReplicationJob::new(
            database,
            self.source.database_url(database)?,
            self.target.database_url(database)?,
            continuous,
        );

        if database != DEVICES_DB {
            return Ok(job);
        }
        Ok(match self.node.group_key() {
            Some(group) => job.with_selector(IdSelector::id_prefix(&group)),
            None => job,
        })
    }
}

/// Schedules, inspects and removes jobs through the replication client
pub struct Replicator {
    client: Arc<dyn ReplicationClient>,
    template: JobTemplate,
}

impl Replicator {
    pub fn new(client: Arc<dyn ReplicationClient>, template: JobTemplate) -> Self {
        Self { client, template }
    }

    pub fn template(&self) -> &JobTemplate {
        &self.template
    }

    /// Schedule the job for `database`
    ///
    /// - an in-flight job (`added`, `started`, `running`) yields `Duplicate` without a create
    /// - a conflicting job document is deleted and the create retried exactly once
    pub async fn schedule(&self, database: &str, continuous: bool) -> Result<(), ScheduleError> {
        let id = JobId::for_database(database);

        let state = self.client.check_state(&id).await?;
        if state.is_in_flight() {
            return Err(ScheduleError::Duplicate { state });
        }

        let job = self.template.job(database, continuous)?;
        match self.client.create_job(&job).await {
            Ok(()) => {
                tracing::debug!(database, job_id = %id, continuous, "Job scheduled");
                Ok(())
            }
            Err(StoreError::Conflict(reason)) => {
                tracing::info!(
                    database,
                    job_id = %id,
                    previous_state = %state,
                    reason = %reason,
                    "Replacing stale job document"
                );
                match self.client.delete_job(&id).await {
                    Ok(()) => {}
                    // Removed in the meantime; the retry can still succeed
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e.into()),
                }
                self.client.create_job(&job).await?;
                tracing::debug!(database, job_id = %id, continuous, "Job rescheduled");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn check_state(&self, database: &str) -> StoreResult<ReplicationState> {
        self.client
            .check_state(&JobId::for_database(database))
            .await
    }

    /// Delete the job for `database`
    pub async fn unschedule(&self, database: &str) -> StoreResult<()> {
        self.client
            .delete_job(&JobId::for_database(database))
            .await
    }
}
