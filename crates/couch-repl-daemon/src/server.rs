//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, StoreConfig};
use crate::error::{DaemonError, DaemonResult};
use couch_repl_client::{
    ensure_system_databases, wait_until_reachable, CouchClient, Credentials, DocumentStore,
    InMemoryStore, ReplicationClient,
};
use couch_repl_scheduler::Scheduler;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinError;

/// Replication scheduler daemon
pub struct Server {
    config: DaemonConfig,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the server
    ///
    /// Prepares the store, then serves the admin API while the scheduler
    /// bootstraps and runs. A bootstrap failure stops the server and is
    /// returned as a fatal error.
    pub async fn run(self) -> DaemonResult<()> {
        match &self.config.store {
            None => Err(DaemonError::Config("No store configured".to_string())),
            Some(StoreConfig::Memory) => {
                tracing::warn!("Using in-memory store, jobs are not replicated");
                let store = Arc::new(InMemoryStore::new());
                self.serve(store).await
            }
            Some(StoreConfig::Couch {
                address,
                username,
                password,
            }) => {
                let store = Arc::new(CouchClient::with_timeout(
                    address,
                    Credentials::new(username, password),
                    self.config.scheduler.request_timeout(),
                )?);

                tokio::select! {
                    _ = wait_until_reachable(store.as_ref(), self.config.scheduler.store_wait_interval()) => {}
                    _ = shutdown_signal() => return Ok(()),
                }
                let created = ensure_system_databases(store.as_ref()).await?;
                if !created.is_empty() {
                    tracing::info!(databases = ?created, "Created missing system databases");
                }

                self.serve(store).await
            }
        }
    }

    async fn serve<S>(self, store: Arc<S>) -> DaemonResult<()>
    where
        S: ReplicationClient + DocumentStore + 'static,
    {
        let addr = self.config.server.listen_addr;
        let scheduler = Arc::new(Scheduler::new(
            store,
            self.config.job_template()?,
            self.config.scheduler.settings(),
        ));

        let app = create_router(AppState::new(scheduler.clone()), &self.config.server);
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("couch-repld listening on {}", addr);
        tracing::info!(node = %scheduler.node(), "Scheduling replication");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let signal_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            let _ = signal_tx.send(true);
        });

        let mut scheduler_task = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.run(shutdown_rx).await }
        });

        let mut server_shutdown = shutdown_tx.subscribe();
        let mut server_task = tokio::spawn(
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.wait_for(|stop| *stop).await;
                })
                .into_future(),
        );

        tokio::select! {
            joined = &mut scheduler_task => {
                // Bootstrap failure is fatal; a disabled scheduler keeps serving
                let scheduled = flatten(joined).and_then(|r| r.map_err(DaemonError::from));
                if scheduled.is_err() {
                    let _ = shutdown_tx.send(true);
                }
                let served = flatten(server_task.await).and_then(|r| r.map_err(DaemonError::from));
                scheduled?;
                served?;
            }
            joined = &mut server_task => {
                let served = flatten(joined).and_then(|r| r.map_err(DaemonError::from));
                let _ = shutdown_tx.send(true);
                let scheduled = flatten(scheduler_task.await).and_then(|r| r.map_err(DaemonError::from));
                served?;
                scheduled?;
            }
        }

        tracing::info!("couch-repld shut down");
        Ok(())
    }
}

fn flatten<T>(joined: Result<T, JoinError>) -> DaemonResult<T> {
    joined.map_err(|e| DaemonError::Server(format!("Task failed: {}", e)))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
