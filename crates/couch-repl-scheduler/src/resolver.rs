//! Config resolution for a node

use crate::error::ResolveError;
use couch_repl_client::DocumentStore;
use couch_repl_types::{HostConfig, NodeId, ReplicationConfig, DEFAULT_CONFIG_DOC};
use regex::Regex;
use std::sync::Arc;

/// Finds the `HostConfig` that applies to a node
///
/// The group document (`<seg0>-<seg1>` of the node id) is preferred; the
/// default document is used when the group has none. Rules are tried in stored
/// order and the first hostname pattern matching the full node id wins. A
/// database listed twice in that rule keeps its last entry.
#[derive(Clone)]
pub struct ConfigResolver {
    store: Arc<dyn DocumentStore>,
}

impl ConfigResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, node: &NodeId) -> Result<HostConfig, ResolveError> {
        let document = self.fetch(node).await?;

        for rule in &document.rules {
            let pattern =
                Regex::new(&rule.hostname).map_err(|source| ResolveError::InvalidPattern {
                    pattern: rule.hostname.clone(),
                    source,
                })?;
            if pattern.is_match(node.as_str()) {
                tracing::debug!(
                    node = %node,
                    document = %document.id,
                    hostname = %rule.hostname,
                    "Resolved host config"
                );
                let (resolved, repeated) = rule.deduplicated();
                if !repeated.is_empty() {
                    tracing::warn!(
                        node = %node,
                        document = %document.id,
                        hostname = %rule.hostname,
                        databases = ?repeated,
                        "Databases listed more than once, keeping the last entry"
                    );
                }
                return Ok(resolved);
            }
        }

        Err(ResolveError::NotFound(format!(
            "no rule in {} matches {}",
            document.id, node
        )))
    }

    async fn fetch(&self, node: &NodeId) -> Result<ReplicationConfig, ResolveError> {
        if let Some(group) = node.group_key() {
            match self.store.fetch_config(&group).await {
                Ok(document) => return Ok(document),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(node = %node, group = %group, "No group config, using default");
                }
                Err(e) => return Err(ResolveError::UpstreamUnavailable(e)),
            }
        }

        match self.store.fetch_config(DEFAULT_CONFIG_DOC).await {
            Ok(document) => Ok(document),
            Err(e) if e.is_not_found() => Err(ResolveError::NotFound(format!(
                "no config document for {}",
                node
            ))),
            Err(e) => Err(ResolveError::UpstreamUnavailable(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use couch_repl_client::{InMemoryStore, StoreCall, StoreError, StoreOp};
    use couch_repl_types::DatabaseConfig;

    fn rule(hostname: &str, database: &str) -> HostConfig {
        HostConfig::new(hostname, vec![DatabaseConfig::new(database, false, 30)])
    }

    fn resolver(store: &Arc<InMemoryStore>) -> ConfigResolver {
        ConfigResolver::new(store.clone())
    }

    #[tokio::test]
    async fn test_repeated_database_keeps_last_entry() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .put_config(ReplicationConfig::new(
                DEFAULT_CONFIG_DOC,
                vec![HostConfig::new(
                    ".*",
                    vec![
                        DatabaseConfig::new("devices", false, 30),
                        DatabaseConfig::new("rooms", true, 0),
                        DatabaseConfig::new("devices", false, 60),
                    ],
                )],
            ))
            .await;

        let resolved = resolver(&store)
            .resolve(&NodeId::new("ITB-101-CP1"))
            .await
            .unwrap();
        assert_eq!(
            resolved.replications,
            vec![
                DatabaseConfig::new("rooms", true, 0),
                DatabaseConfig::new("devices", false, 60),
            ]
        );
    }

    #[tokio::test]
    async fn test_unanchored_pattern_matches_node() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .put_config(ReplicationConfig::new(
                "ITB-101",
                vec![HostConfig::new(
                    ".*-101",
                    vec![DatabaseConfig::new("devices", false, 5)],
                )],
            ))
            .await;

        let config = resolver(&store)
            .resolve(&NodeId::new("ITB-101-CP1"))
            .await
            .unwrap();
        assert_eq!(config.hostname, ".*-101");
        assert_eq!(config.replications[0].floored().interval, 10);
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .put_config(ReplicationConfig::new(
                DEFAULT_CONFIG_DOC,
                vec![
                    rule("^ITB-202", "first"),
                    rule("CP1$", "second"),
                    rule(".*", "third"),
                ],
            ))
            .await;

        let config = resolver(&store)
            .resolve(&NodeId::new("ITB-101-CP1"))
            .await
            .unwrap();
        assert_eq!(config.replications[0].database, "second");
    }

    #[tokio::test]
    async fn test_falls_back_to_default_document() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .put_config(ReplicationConfig::new(
                DEFAULT_CONFIG_DOC,
                vec![rule(".*", "devices")],
            ))
            .await;

        resolver(&store)
            .resolve(&NodeId::new("ITB-101-CP1"))
            .await
            .unwrap();
        assert_eq!(
            store.calls().await,
            vec![
                StoreCall::FetchConfig("ITB-101".into()),
                StoreCall::FetchConfig(DEFAULT_CONFIG_DOC.into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_node_without_group_uses_default_directly() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .put_config(ReplicationConfig::new(
                DEFAULT_CONFIG_DOC,
                vec![rule(".*", "devices")],
            ))
            .await;

        resolver(&store)
            .resolve(&NodeId::new("localhost"))
            .await
            .unwrap();
        assert_eq!(
            store.calls().await,
            vec![StoreCall::FetchConfig(DEFAULT_CONFIG_DOC.into())]
        );
    }

    #[tokio::test]
    async fn test_missing_documents_not_found() {
        let store = Arc::new(InMemoryStore::recording());
        let err = resolver(&store)
            .resolve(&NodeId::new("ITB-101-CP1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_no_matching_rule_not_found() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .put_config(ReplicationConfig::new(
                "ITB-101",
                vec![rule("^OTHER", "devices")],
            ))
            .await;

        let err = resolver(&store)
            .resolve(&NodeId::new("ITB-101-CP1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_pattern() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .put_config(ReplicationConfig::new(
                DEFAULT_CONFIG_DOC,
                vec![rule("([", "devices")],
            ))
            .await;

        let err = resolver(&store)
            .resolve(&NodeId::new("ITB-101-CP1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidPattern { ref pattern, .. } if pattern == "(["));
    }

    #[tokio::test]
    async fn test_store_unavailable() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .fail_next(
                StoreOp::FetchConfig,
                StoreError::Transport("connection refused".into()),
            )
            .await;

        let err = resolver(&store)
            .resolve(&NodeId::new("ITB-101-CP1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::UpstreamUnavailable(_)));
    }
}
