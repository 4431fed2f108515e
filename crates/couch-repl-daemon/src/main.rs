//! couch-repld - Replication scheduler daemon
//!
//! The daemon:
//! - waits for the local store and creates missing system databases
//! - replicates the config database before anything else
//! - keeps one replication job per configured database alive
//! - serves a small admin API (health, status, replicate-now)

use clap::Parser;
use couch_repl_daemon::error::DaemonResult;
use couch_repl_daemon::{Cli, DaemonConfig, DaemonError, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args and deployment variables
    cli.apply(&mut config)?;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        node = %config.node.system_id,
        replication_disabled = config.scheduler.stop_replication,
        "Starting couch-repld"
    );

    // Create and run server
    let server = Server::new(config)?;
    server.run().await
}
