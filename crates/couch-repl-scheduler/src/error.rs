//! Error types for scheduling, resolution and bootstrap

use couch_repl_client::StoreError;
use couch_repl_types::ReplicationState;
use thiserror::Error;

/// Outcome of a failed schedule attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Job already in flight; callers treat this as success
    #[error("Job already in flight ({state})")]
    Duplicate { state: ReplicationState },

    /// Stale job document could not be replaced
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store unreachable
    #[error("Transport error: {0}")]
    Transport(String),

    /// Store returned an unexpected error
    #[error("Remote error: {0}")]
    Remote(String),
}

impl ScheduleError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ScheduleError::Duplicate { .. })
    }
}

impl From<StoreError> for ScheduleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(reason) => ScheduleError::Conflict(reason),
            StoreError::Transport(reason) => ScheduleError::Transport(reason),
            other => ScheduleError::Remote(other.to_string()),
        }
    }
}

/// Config resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No document for the node's group nor a default document, or no rule matched
    #[error("Not found: {0}")]
    NotFound(String),

    /// A rule's hostname pattern does not compile
    #[error("Invalid hostname pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The document store could not be reached
    #[error("Config store unavailable: {0}")]
    UpstreamUnavailable(StoreError),
}

/// Fatal startup errors while replicating the config database
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to schedule config replication: {0}")]
    Schedule(ScheduleError),

    #[error("Config replication failed (poll {attempt})")]
    Failed { attempt: u32 },

    #[error("Config replication did not complete after {attempts} polls")]
    TimedOut { attempts: u32 },
}
