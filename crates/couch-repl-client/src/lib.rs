//! Boundary to the remote document store
//!
//! The scheduler only ever talks to the store through the traits defined here:
//! - `ReplicationClient`: check, create and delete one named replication job
//! - `DocumentStore`: fetch desired-state documents
//! - `StoreAdmin`: reachability and system database checks used before bootstrap
//!
//! `CouchClient` implements them over the store's HTTP API; `InMemoryStore`
//! implements them in-process for development and tests.

pub mod couch;
pub mod error;
pub mod init;
pub mod memory;
pub mod traits;

pub use couch::{CouchClient, Credentials};
pub use error::{StoreError, StoreResult};
pub use init::{ensure_system_databases, wait_until_reachable, SYSTEM_DATABASES};
pub use memory::{InMemoryStore, StoreCall, StoreOp};
pub use traits::{DocumentStore, ReplicationClient, StoreAdmin};
