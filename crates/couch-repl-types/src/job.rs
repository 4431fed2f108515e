//! Replication job document posted to the store's `_replicator` database

use crate::JobId;
use serde::{Deserialize, Serialize};

/// Remote job document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationJob {
    #[serde(rename = "_id")]
    pub id: JobId,

    /// Revision token, required to delete the document
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Remote endpoint, credentials embedded
    pub source: String,

    /// Local endpoint, credentials embedded
    pub target: String,

    #[serde(default)]
    pub create_target: bool,

    #[serde(default)]
    pub continuous: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<IdSelector>,
}

impl ReplicationJob {
    pub fn new(
        database: &str,
        source: impl Into<String>,
        target: impl Into<String>,
        continuous: bool,
    ) -> Self {
        Self {
            id: JobId::for_database(database),
            rev: None,
            source: source.into(),
            target: target.into(),
            create_target: true,
            continuous,
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: IdSelector) -> Self {
        self.selector = Some(selector);
        self
    }
}

/// Mango selector restricting replicated documents by `_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSelector {
    #[serde(rename = "_id")]
    pub id: RegexQuery,
}

impl IdSelector {
    /// Selector matching ids that start with `<prefix>-`
    pub fn id_prefix(prefix: &str) -> Self {
        Self {
            id: RegexQuery {
                regex: format!("{}-", prefix),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexQuery {
    #[serde(rename = "$regex")]
    pub regex: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_document_shape() {
        let job = ReplicationJob::new(
            "devices",
            "https://u:p@remote.example/devices",
            "http://a:b@localhost:5984/devices",
            false,
        )
        .with_selector(IdSelector::id_prefix("ITB-101"));

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["_id"], "auto_devices");
        assert!(value.get("_rev").is_none());
        assert_eq!(value["create_target"], true);
        assert_eq!(value["continuous"], false);
        assert_eq!(value["selector"]["_id"]["$regex"], "ITB-101-");
    }

    #[test]
    fn test_job_document_without_selector() {
        let job = ReplicationJob::new("rooms", "s", "t", true);
        let value = serde_json::to_value(&job).unwrap();
        assert!(value.get("selector").is_none());
        assert_eq!(value["continuous"], true);
    }
}
