//! Replication scheduler daemon library
//!
//! This module provides the process-level components around the scheduler:
//! - Layered configuration and CLI overrides
//! - Store construction and initialisation
//! - Admin REST API
//! - Server lifecycle management

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod server;

pub use cli::Cli;
pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
