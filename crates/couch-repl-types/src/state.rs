//! Remote lifecycle state of a replication job

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle state reported by the store's scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationState {
    /// No job document exists
    NotStarted,
    Initializing,
    Added,
    Started,
    Running,
    Completed,
    Failed,
    Crashed,
}

impl ReplicationState {
    /// Job is owned by the store's scheduler; re-scheduling is a duplicate
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            ReplicationState::Added | ReplicationState::Started | ReplicationState::Running
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicationState::NotStarted => "not_started",
            ReplicationState::Initializing => "initializing",
            ReplicationState::Added => "added",
            ReplicationState::Started => "started",
            ReplicationState::Running => "running",
            ReplicationState::Completed => "completed",
            ReplicationState::Failed => "failed",
            ReplicationState::Crashed => "crashed",
        }
    }
}

impl fmt::Display for ReplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State string the store reported that is not a known lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown replication state: {0}")]
pub struct UnknownStateError(pub String);

impl FromStr for ReplicationState {
    type Err = UnknownStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(ReplicationState::NotStarted),
            "initializing" => Ok(ReplicationState::Initializing),
            "added" => Ok(ReplicationState::Added),
            "started" => Ok(ReplicationState::Started),
            "running" => Ok(ReplicationState::Running),
            "completed" => Ok(ReplicationState::Completed),
            "failed" => Ok(ReplicationState::Failed),
            "crashed" => Ok(ReplicationState::Crashed),
            other => Err(UnknownStateError(other.to_string())),
        }
    }
}
