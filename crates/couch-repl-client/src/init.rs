//! Store initialisation run once before bootstrap

use crate::error::StoreResult;
use crate::traits::StoreAdmin;
use std::time::Duration;

/// Databases the store needs before replication jobs can be created
pub const SYSTEM_DATABASES: [&str; 4] = ["_global_changes", "_metadata", "_replicator", "_users"];

/// Poll the store until it answers, sleeping `interval` between attempts
pub async fn wait_until_reachable(admin: &dyn StoreAdmin, interval: Duration) {
    let mut attempts: u64 = 0;
    loop {
        attempts += 1;
        match admin.ping().await {
            Ok(()) => {
                tracing::info!(attempts, "Store reachable");
                return;
            }
            Err(e) => {
                tracing::warn!(attempts, error = %e, "Store not reachable, waiting");
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// Create any missing system database. Returns the databases that were created.
pub async fn ensure_system_databases(admin: &dyn StoreAdmin) -> StoreResult<Vec<&'static str>> {
    let mut created = Vec::new();
    for database in SYSTEM_DATABASES {
        if admin.database_exists(database).await? {
            continue;
        }
        admin.create_database(database).await?;
        tracing::info!(database, "Created system database");
        created.push(database);
    }
    Ok(created)
}
