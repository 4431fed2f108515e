//! Error types for couch-repld

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use couch_repl_client::StoreError;
use couch_repl_scheduler::{BootstrapError, ResolveError};
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Store initialisation error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Config database could not be replicated
    #[error("Bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Host config could not be resolved
    #[error("Config resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Every API error is answered with `500 Internal Server Error`. Clients tell
/// the causes apart by the `code` field of the body:
///
/// - `CONFIG_NOT_FOUND`: no config document or no rule matches this node
/// - `INVALID_CONFIG`: the matching document holds a pattern that does not compile
/// - `STORE_UNAVAILABLE`: the document store could not be reached
/// - `INTERNAL_ERROR`: anything else
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self {
            ApiError::Resolve(ResolveError::NotFound(_)) => "CONFIG_NOT_FOUND",
            ApiError::Resolve(ResolveError::InvalidPattern { .. }) => "INVALID_CONFIG",
            ApiError::Resolve(ResolveError::UpstreamUnavailable(_)) => "STORE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
