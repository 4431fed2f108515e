//! API Router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let api_routes = Router::new()
        // Health and status
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::daemon_status))
        // Replication
        .route("/replication/now", post(handlers::replicate_now));

    // Build router with middleware
    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    if server.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use couch_repl_client::{Credentials, InMemoryStore};
    use couch_repl_scheduler::{Endpoint, JobTemplate, Scheduler, SchedulerSettings};
    use couch_repl_types::{
        DatabaseConfig, HostConfig, NodeId, ReplicationConfig, DEFAULT_CONFIG_DOC,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_router(store: &Arc<InMemoryStore>, stop_replication: bool) -> Router {
        let template = JobTemplate::new(
            Endpoint::new("https://remote.example", Credentials::new("sync", "secret")),
            Endpoint::new("http://localhost:5984", Credentials::default()),
            NodeId::new("ITB-101-CP1"),
        )
        .unwrap();
        let settings = SchedulerSettings {
            stop_replication,
            ..Default::default()
        };
        let scheduler = Arc::new(Scheduler::new(store.clone(), template, settings));
        create_router(AppState::new(scheduler), &ServerConfig::default())
    }

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_returns_200() {
        let store = Arc::new(InMemoryStore::recording());
        let (status, body) = call(test_router(&store, false), "GET", "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn status_reports_node_and_kill_switch() {
        let store = Arc::new(InMemoryStore::recording());
        let (status, body) = call(test_router(&store, true), "GET", "/api/v1/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["node"], "ITB-101-CP1");
        assert_eq!(body["replication_disabled"], true);
        assert_eq!(body["scheduler"]["running"], false);
        assert!(body["scheduler"]["host_config"].is_null());
    }

    #[tokio::test]
    async fn replicate_now_schedules_configured_databases() {
        let store = Arc::new(InMemoryStore::recording());
        store
            .put_config(ReplicationConfig::new(
                DEFAULT_CONFIG_DOC,
                vec![HostConfig::new(
                    ".*",
                    vec![
                        DatabaseConfig::new("devices", false, 30),
                        DatabaseConfig::new("rooms", true, 0),
                    ],
                )],
            ))
            .await;

        let (status, body) =
            call(test_router(&store, false), "POST", "/api/v1/replication/now").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scheduled"], 2);
        assert_eq!(body["failed"], 0);
        assert_eq!(body["disabled"], false);
        assert_eq!(store.job_ids().await.len(), 2);
    }

    #[tokio::test]
    async fn replicate_now_disabled_by_kill_switch() {
        let store = Arc::new(InMemoryStore::recording());
        let (status, body) =
            call(test_router(&store, true), "POST", "/api/v1/replication/now").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["disabled"], true);
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn replicate_now_without_config_is_500() {
        let store = Arc::new(InMemoryStore::recording());
        let (status, body) =
            call(test_router(&store, false), "POST", "/api/v1/replication/now").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "CONFIG_NOT_FOUND");
    }
}
