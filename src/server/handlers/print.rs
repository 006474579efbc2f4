//! Print submission handlers.
//!
//! Handlers only validate and enqueue; rendering and transmission happen
//! on the worker.

use axum::{
    Json,
    extract::{Multipart, State, rejection::JsonRejection},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::super::state::AppState;
use super::{ApiError, QueuedResponse, bad_request};
use crate::protocol::commands::DEFAULT_ENERGY;
use crate::queue::{
    CHAT_FEED_AMOUNT, CHAT_FONT_SIZE, DEFAULT_FEED_AMOUNT, DEFAULT_FONT_SIZE, ImageJob, Job,
    MAX_FONT_SIZE, TextJob,
};

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_chat_font_size() -> u32 {
    CHAT_FONT_SIZE
}

fn default_energy() -> u16 {
    DEFAULT_ENERGY
}

fn default_feed_amount() -> u16 {
    DEFAULT_FEED_AMOUNT
}

fn default_chat_feed_amount() -> u16 {
    CHAT_FEED_AMOUNT
}

fn default_true() -> bool {
    true
}

/// Request body for the text endpoint.
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: Option<String>,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Path to a TrueType/OpenType font on the server
    pub font_name: Option<String>,
    #[serde(default = "default_energy")]
    pub energy: u16,
    #[serde(default = "default_feed_amount")]
    pub feed_amount: u16,
    #[serde(default)]
    pub chat_mode: bool,
}

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default = "default_true")]
    pub include_timestamp: bool,
    #[serde(default = "default_chat_font_size")]
    pub font_size: u32,
    pub font_name: Option<String>,
    #[serde(default = "default_energy")]
    pub energy: u16,
    #[serde(default = "default_chat_feed_amount")]
    pub feed_amount: u16,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| bad_request(format!("Invalid request body: {}", e.body_text())))
}

fn font_size(size: u32) -> Result<u32, ApiError> {
    if (1..=MAX_FONT_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(bad_request(format!(
            "font_size must be between 1 and {}",
            MAX_FONT_SIZE
        )))
    }
}

/// POST /print/text - Queue a text job.
pub async fn text(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<QueuedResponse>, ApiError> {
    let req = json_body(body)?;
    let text = req.text.ok_or_else(|| bad_request("Missing text parameter"))?;
    let font_size = font_size(req.font_size)?;

    let submission = state.queue.submit(Job::Text(TextJob {
        text,
        font_size,
        font_ref: req.font_name,
        energy: req.energy,
        feed_amount: req.feed_amount,
        chat_mode: req.chat_mode,
    }));
    info!("Queued text job {} (position {})", submission.id, submission.position);

    Ok(Json(QueuedResponse::new("Print job", submission)))
}

/// Prefix a chat message with the local `[HH:MM]` time.
pub fn stamp_message(message: &str, now: chrono::DateTime<chrono::Local>) -> String {
    format!("[{}] {}", now.format("%H:%M"), message)
}

/// POST /print/chat - Queue a chat message, printed upright.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<QueuedResponse>, ApiError> {
    let req = json_body(body)?;
    let message = req
        .message
        .ok_or_else(|| bad_request("Missing message parameter"))?;
    let font_size = font_size(req.font_size)?;

    let now = chrono::Local::now();
    let text = if req.include_timestamp {
        stamp_message(&message, now)
    } else {
        message
    };

    let submission = state.queue.submit(Job::Text(TextJob {
        text,
        font_size,
        font_ref: req.font_name,
        energy: req.energy,
        feed_amount: req.feed_amount,
        chat_mode: true,
    }));
    info!("Queued chat message {} (position {})", submission.id, submission.position);

    let mut response = QueuedResponse::new("Chat message", submission);
    response.timestamp = Some(now.to_rfc3339());
    Ok(Json(response))
}

/// Parse an optional numeric form field, keeping the default when the
/// value is not a valid number.
fn form_number(name: &str, value: &str, default: u16) -> u16 {
    match value.trim().parse() {
        Ok(n) => n,
        Err(_) => {
            debug!("Ignoring invalid {} value {:?}", name, value);
            default
        }
    }
}

/// POST /print/image - Queue an uploaded image.
///
/// Multipart fields: `image` (file, required), `energy`, `feed_amount`.
pub async fn image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<QueuedResponse>, ApiError> {
    let mut image_data: Option<Vec<u8>> = None;
    let mut energy = DEFAULT_ENERGY;
    let mut feed_amount = DEFAULT_FEED_AMOUNT;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => {
                if field.file_name() == Some("") {
                    return Err(bad_request("No image file selected"));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read image: {}", e)))?;
                image_data = Some(bytes.to_vec());
            }
            "energy" | "feed_amount" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read {}: {}", name, e)))?;
                if name == "energy" {
                    energy = form_number(&name, &value, DEFAULT_ENERGY);
                } else {
                    feed_amount = form_number(&name, &value, DEFAULT_FEED_AMOUNT);
                }
            }
            _ => {}
        }
    }

    let image_bytes = image_data.ok_or_else(|| bad_request("No image file provided"))?;
    let image = image::load_from_memory(&image_bytes)
        .map_err(|e| bad_request(format!("Failed to decode image: {}", e)))?;

    let submission = state.queue.submit(Job::Image(ImageJob {
        image,
        energy,
        feed_amount,
    }));
    info!(
        "Queued image job {} (position {})",
        submission.id, submission.position
    );

    Ok(Json(QueuedResponse::new("Print job", submission)))
}
