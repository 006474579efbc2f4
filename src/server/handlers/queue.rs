//! Queue status and maintenance handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::super::state::AppState;

/// Response from the status endpoint.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub queue_size: usize,
    pub status: &'static str,
    pub completed: u64,
    pub failed: u64,
}

/// Response from the clear endpoint.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
    pub message: String,
    pub cleared: usize,
}

/// GET /status - Queue depth and job counters.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        queue_size: state.queue.depth(),
        status: "running",
        completed: state.queue.completed(),
        failed: state.queue.failed(),
    })
}

/// POST /queue/clear - Drop all pending jobs.
pub async fn clear(State(state): State<Arc<AppState>>) -> Json<ClearResponse> {
    let cleared = state.queue.clear();
    info!("Cleared {} pending job(s)", cleared);
    Json(ClearResponse {
        status: "success",
        message: "Queue cleared".to_string(),
        cleared,
    })
}
