//! Strongly-typed identifiers
//!
//! Job ids are derived deterministically from the database name so that every
//! node addresses the same remote document for the same database.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a remote replication job document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    const PREFIX: &'static str = "auto_";

    /// Job id for a database (`auto_<database>`)
    pub fn for_database(database: &str) -> Self {
        Self(format!("{}{}", Self::PREFIX, database))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Database this job replicates, if the id was derived by `for_database`
    pub fn database(&self) -> Option<&str> {
        self.0.strip_prefix(Self::PREFIX)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the local node (e.g. `ITB-101-CP1`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    const SEPARATOR: char = '-';

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Room/group key: the first two `-`-separated segments (`ITB-101`)
    pub fn group_key(&self) -> Option<String> {
        let mut segments = self.0.split(Self::SEPARATOR);
        match (segments.next(), segments.next()) {
            (Some(building), Some(room)) if !building.is_empty() && !room.is_empty() => {
                Some(format!("{}{}{}", building, Self::SEPARATOR, room))
            }
            _ => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
