//! Desired-state configuration types
//!
//! A `ReplicationConfig` document holds an ordered list of rules. Each rule is a
//! `HostConfig` whose `hostname` is a regular expression; the first rule that
//! matches a node id decides which databases that node replicates.

use crate::{DEFAULT_CONFIG_INTERVAL_SECS, MIN_INTERVAL_SECS, REPL_CONFIG_DB};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stored desired-state document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Document id (group key or `_default`)
    #[serde(rename = "_id")]
    pub id: String,

    /// Store revision token
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Rules in match order
    #[serde(default)]
    pub rules: Vec<HostConfig>,
}

impl ReplicationConfig {
    pub fn new(id: impl Into<String>, rules: Vec<HostConfig>) -> Self {
        Self {
            id: id.into(),
            rev: None,
            rules,
        }
    }
}

/// Configuration resolved for a node
///
/// Rule order matters when resolving which `HostConfig` applies; once resolved,
/// two configs are equal when they hold the same databases with the same cadence,
/// regardless of list order.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Hostname pattern of the rule
    pub hostname: String,

    /// Databases to replicate
    #[serde(default)]
    pub replications: Vec<DatabaseConfig>,
}

impl HostConfig {
    pub fn new(hostname: impl Into<String>, replications: Vec<DatabaseConfig>) -> Self {
        Self {
            hostname: hostname.into(),
            replications,
        }
    }

    /// Entry for the config database itself, if the rule carries one
    pub fn config_entry(&self) -> Option<&DatabaseConfig> {
        self.replications
            .iter()
            .find(|c| c.database == REPL_CONFIG_DB)
    }

    /// Entries handled by regular workers (everything but the config database)
    pub fn worker_entries(&self) -> impl Iterator<Item = &DatabaseConfig> {
        self.replications
            .iter()
            .filter(|c| c.database != REPL_CONFIG_DB)
    }

    /// Copy with one entry per database, the last listed entry winning.
    /// Also returns the databases that were listed more than once.
    pub fn deduplicated(&self) -> (Self, Vec<String>) {
        let mut seen = HashSet::new();
        let mut repeated = Vec::new();
        let mut replications: Vec<DatabaseConfig> = self
            .replications
            .iter()
            .rev()
            .filter(|c| {
                if seen.insert(c.database.as_str()) {
                    true
                } else {
                    if !repeated.contains(&c.database) {
                        repeated.push(c.database.clone());
                    }
                    false
                }
            })
            .cloned()
            .collect();
        replications.reverse();
        repeated.sort();

        (Self::new(self.hostname.clone(), replications), repeated)
    }

    fn sorted(&self) -> Vec<(&str, bool, u64)> {
        let mut entries: Vec<_> = self
            .replications
            .iter()
            .map(|c| (c.database.as_str(), c.continuous, c.interval))
            .collect();
        entries.sort_unstable();
        entries
    }
}

impl PartialEq for HostConfig {
    fn eq(&self, other: &Self) -> bool {
        self.hostname == other.hostname && self.sorted() == other.sorted()
    }
}

/// Cadence for a single database
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database name (same on both endpoints)
    pub database: String,

    /// Re-armed by the store on completion instead of on a timer
    #[serde(default)]
    pub continuous: bool,

    /// Seconds between schedule attempts
    #[serde(default)]
    pub interval: u64,
}

impl DatabaseConfig {
    pub fn new(database: impl Into<String>, continuous: bool, interval: u64) -> Self {
        Self {
            database: database.into(),
            continuous,
            interval,
        }
    }

    /// Process-wide cadence for the config database
    pub fn config_default() -> Self {
        Self::new(REPL_CONFIG_DB, false, DEFAULT_CONFIG_INTERVAL_SECS)
    }

    /// Whether the interval is below the floor for non-continuous jobs
    pub fn below_floor(&self) -> bool {
        !self.continuous && self.interval < MIN_INTERVAL_SECS
    }

    /// Copy of this config with the non-continuous interval floor applied
    pub fn floored(&self) -> Self {
        let mut config = self.clone();
        if config.below_floor() {
            config.interval = MIN_INTERVAL_SECS;
        }
        config
    }
}
