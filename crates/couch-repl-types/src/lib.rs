//! Core types for keeping per-database replication jobs aligned with a
//! declarative configuration.
//!
//! ## Key Concepts
//!
//! - **ReplicationConfig**: the stored desired-state document, an ordered list of rules
//! - **HostConfig**: the rule that applies to one node, with its database list
//! - **DatabaseConfig**: cadence for a single database (continuous or fixed interval)
//! - **ReplicationJob**: the remote job document created in the store's `_replicator` database
//! - **ReplicationState**: the remote lifecycle state of a job

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod ids;
pub mod job;
pub mod state;

pub use config::{DatabaseConfig, HostConfig, ReplicationConfig};
pub use ids::{JobId, NodeId};
pub use job::{IdSelector, RegexQuery, ReplicationJob};
pub use state::{ReplicationState, UnknownStateError};

/// Database holding the desired-state documents. Its own replication is the
/// bootstrap job and is driven by the config watcher, never by a regular worker.
pub const REPL_CONFIG_DB: &str = "replication-config";

/// Fallback document used when no group-specific document exists.
pub const DEFAULT_CONFIG_DOC: &str = "_default";

/// Lowest interval allowed for non-continuous jobs.
pub const MIN_INTERVAL_SECS: u64 = 10;

/// Interval substituted for a zero interval after a failed cycle.
pub const RETRY_INTERVAL_SECS: u64 = 60;

/// Cadence of the config database when the resolved config has no entry for it.
pub const DEFAULT_CONFIG_INTERVAL_SECS: u64 = 300;

/// Database whose job is narrowed to the node's own room.
pub const DEVICES_DB: &str = "devices";
