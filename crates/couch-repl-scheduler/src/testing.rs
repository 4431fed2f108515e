//! Shared test helpers

use crate::replicator::{Endpoint, JobTemplate, Replicator};
use couch_repl_client::{Credentials, InMemoryStore};
use couch_repl_types::NodeId;
use std::sync::Arc;
use std::time::Duration;

pub(crate) fn template(node: &str) -> JobTemplate {
    JobTemplate::new(
        Endpoint::new(
            "https://remote.example",
            Credentials::new("remote", "secret"),
        ),
        Endpoint::new("http://localhost:5984", Credentials::new("admin", "pass")),
        NodeId::new(node),
    )
    .unwrap()
}

pub(crate) fn replicator(store: &Arc<InMemoryStore>, node: &str) -> Arc<Replicator> {
    Arc::new(Replicator::new(store.clone(), template(node)))
}

/// Let spawned tasks run to their next suspension point. With a paused clock
/// this advances time by one millisecond.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
