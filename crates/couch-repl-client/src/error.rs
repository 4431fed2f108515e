//! Error types for store operations

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Document or job absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document already exists with another revision
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store unreachable or the request could not be completed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Store answered with an unexpected error
    #[error("Remote error ({status}): {error}: {reason}")]
    Remote {
        status: u16,
        error: String,
        reason: String,
    },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Store address cannot be used as a base URL
    #[error("Invalid store address: {0}")]
    InvalidAddress(String),
}

impl StoreError {
    pub fn remote(status: u16, error: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Remote {
            status,
            error: error.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for StoreError {
    fn from(err: url::ParseError) -> Self {
        StoreError::InvalidAddress(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}
