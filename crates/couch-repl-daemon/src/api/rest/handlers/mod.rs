//! API request handlers

mod health;
mod replication;

pub use health::*;
pub use replication::*;
