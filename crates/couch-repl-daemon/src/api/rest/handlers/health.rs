//! Health and status handlers

use crate::api::rest::state::AppState;
use axum::{extract::State, Json};
use couch_repl_types::HostConfig;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

/// Daemon status response
#[derive(Debug, Serialize)]
pub struct DaemonStatusResponse {
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub node: String,
    pub replication_disabled: bool,
    pub scheduler: SchedulerStats,
}

/// Scheduler snapshot
#[derive(Debug, Serialize)]
pub struct SchedulerStats {
    pub running: bool,
    pub host_config: Option<HostConfig>,
    pub workers: Vec<String>,
    pub config_interval_secs: u64,
    pub reconciliations: u64,
}

/// Daemon status endpoint
pub async fn daemon_status(State(state): State<AppState>) -> Json<DaemonStatusResponse> {
    let status = state.scheduler.status();

    Json(DaemonStatusResponse {
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        node: state.scheduler.node().to_string(),
        replication_disabled: state.scheduler.is_disabled(),
        scheduler: SchedulerStats {
            running: status.running,
            host_config: status.host_config,
            workers: status.workers,
            config_interval_secs: status.config_interval,
            reconciliations: status.reconciliations,
        },
    })
}
