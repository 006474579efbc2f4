//! HTTP handlers for the server.

pub mod print;
pub mod queue;

use axum::{Json, http::StatusCode};
use serde::Serialize;

use crate::queue::Submission;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub(crate) fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, message)
}

/// Response for an accepted print job.
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub status: &'static str,
    pub message: String,
    pub id: String,
    /// Submission time, chat messages only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl QueuedResponse {
    pub(crate) fn new(what: &str, submission: Submission) -> Self {
        Self {
            status: "queued",
            message: format!("{} added to queue (position: {})", what, submission.position),
            id: submission.id.to_string(),
            timestamp: None,
        }
    }
}
