//! Replication trigger handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use couch_repl_scheduler::ReplicateNowOutcome;
use serde::Serialize;

/// Replicate-now summary
#[derive(Debug, Serialize)]
pub struct ReplicateNowResponse {
    pub scheduled: usize,
    pub failed: usize,
    pub disabled: bool,
}

/// Schedule every configured database once
pub async fn replicate_now(State(state): State<AppState>) -> ApiResult<Json<ReplicateNowResponse>> {
    let response = match state.scheduler.replicate_now().await? {
        ReplicateNowOutcome::Disabled => ReplicateNowResponse {
            scheduled: 0,
            failed: 0,
            disabled: true,
        },
        ReplicateNowOutcome::Completed { scheduled, failed } => ReplicateNowResponse {
            scheduled,
            failed,
            disabled: false,
        },
    };

    Ok(Json(response))
}
