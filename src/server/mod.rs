//! # HTTP Print Server
//!
//! Accepts print jobs over HTTP and hands them to the print queue. The
//! handlers never touch the printer; a [`Worker`](crate::worker::Worker)
//! drains the queue in the background.
//!
//! ## Usage
//!
//! ```bash
//! catprint serve --listen 0.0.0.0:5000
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | POST | `/print/text` | JSON `{text, font_size?, font_name?, energy?, feed_amount?, chat_mode?}` |
//! | POST | `/print/image` | multipart `image` + optional `energy`, `feed_amount` |
//! | POST | `/print/chat` | JSON `{message, include_timestamp?, font_size?, font_name?, energy?, feed_amount?}` |
//! | GET | `/status` | |
//! | POST | `/queue/clear` | |
//!
//! ```bash
//! curl -X POST localhost:5000/print/text \
//!      -H 'Content-Type: application/json' \
//!      -d '{"text": "Hello"}'
//! ```

mod handlers;
mod state;

pub use handlers::print::stamp_message;
pub use state::{DEFAULT_LISTEN_ADDR, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::CatprintError;
use crate::queue::JobQueue;
use state::AppState;

/// Upload limit for image jobs
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

/// Build the application router.
pub fn router(queue: JobQueue) -> Router {
    let app_state = Arc::new(AppState::new(queue));

    Router::new()
        .route("/print/text", post(handlers::print::text))
        .route("/print/chat", post(handlers::print::chat))
        .route(
            "/print/image",
            post(handlers::print::image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route("/status", get(handlers::queue::status))
        .route("/queue/clear", post(handlers::queue::clear))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the HTTP server and run until `shutdown` completes.
///
/// ## Example
///
/// ```no_run
/// use catprint::queue::JobQueue;
/// use catprint::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), catprint::error::CatprintError> {
/// let queue = JobQueue::new();
/// serve(ServerConfig::default(), queue, async {
///     let _ = tokio::signal::ctrl_c().await;
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve<F>(config: ServerConfig, queue: JobQueue, shutdown: F) -> Result<(), CatprintError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listen_addr = config.listen_addr;
    let app = router(queue);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| {
            CatprintError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", listen_addr, e),
            ))
        })?;
    info!("Listening on http://{}", listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Job;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> (Router, JobQueue) {
        let queue = JobQueue::new();
        (router(queue.clone()), queue)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart(uri: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        const BOUNDARY: &str = "catprint-test-boundary";
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn png_bytes() -> Vec<u8> {
        let image = image::DynamicImage::new_luma8(4, 4);
        let mut out = std::io::Cursor::new(Vec::new());
        image.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_print_text_defaults() {
        let (app, queue) = app();
        let (status, body) = send(app, post_json("/print/text", json!({"text": "Hello"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "queued");
        assert_eq!(body["message"], "Print job added to queue (position: 1)");
        assert!(body["id"].is_string());

        let job = queue.try_next().unwrap();
        assert_eq!(body["id"], job.id.to_string());
        let Job::Text(text) = job.job else {
            panic!("expected text job");
        };
        assert_eq!(text.text, "Hello");
        assert_eq!(text.font_size, 40);
        assert_eq!(text.font_ref, None);
        assert_eq!(text.energy, 0x2EE0);
        assert_eq!(text.feed_amount, 50);
        assert!(!text.chat_mode);
    }

    #[tokio::test]
    async fn test_print_text_overrides() {
        let (app, queue) = app();
        let request = post_json(
            "/print/text",
            json!({"text": "x", "font_size": 24, "energy": 8000, "feed_amount": 0, "chat_mode": true}),
        );
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);

        let Job::Text(text) = queue.try_next().unwrap().job else {
            panic!("expected text job");
        };
        assert_eq!(text.font_size, 24);
        assert_eq!(text.energy, 8000);
        assert_eq!(text.feed_amount, 0);
        assert!(text.chat_mode);
    }

    #[tokio::test]
    async fn test_print_text_missing_text() {
        let (app, queue) = app();
        let (status, body) = send(app, post_json("/print/text", json!({"font_size": 20}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing text parameter");
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn test_print_text_malformed_body() {
        let (app, _) = app();
        let request = Request::post("/print/text")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_oversized_font_rejected() {
        let (app, queue) = app();
        let (status, body) = send(
            app.clone(),
            post_json("/print/text", json!({"text": "Hi", "font_size": 1_000_000})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "font_size must be between 1 and 384");

        let (status, _) = send(
            app,
            post_json("/print/chat", json!({"message": "Hi", "font_size": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn test_print_chat() {
        let (app, queue) = app();
        let (status, body) = send(app, post_json("/print/chat", json!({"message": "yo"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Chat message added to queue (position: 1)");
        assert!(body["timestamp"].is_string());

        let Job::Text(text) = queue.try_next().unwrap().job else {
            panic!("expected text job");
        };
        assert!(text.chat_mode);
        assert_eq!(text.font_size, 30);
        assert_eq!(text.feed_amount, 30);
        // "[HH:MM] yo"
        assert_eq!(text.text.len(), 10);
        assert!(text.text.starts_with('['));
        assert!(text.text.ends_with("] yo"));
    }

    #[tokio::test]
    async fn test_print_chat_without_timestamp() {
        let (app, queue) = app();
        let request = post_json("/print/chat", json!({"message": "yo", "include_timestamp": false}));
        send(app, request).await;

        let Job::Text(text) = queue.try_next().unwrap().job else {
            panic!("expected text job");
        };
        assert_eq!(text.text, "yo");
    }

    #[tokio::test]
    async fn test_print_chat_missing_message() {
        let (app, _) = app();
        let (status, body) = send(app, post_json("/print/chat", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing message parameter");
    }

    #[tokio::test]
    async fn test_print_image() {
        let (app, queue) = app();
        let png = png_bytes();
        let request = multipart(
            "/print/image",
            &[
                ("image", Some("dot.png"), &png[..]),
                ("energy", None, &b"9000"[..]),
                ("feed_amount", None, &b"oops"[..]),
            ],
        );
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let Job::Image(image) = queue.try_next().unwrap().job else {
            panic!("expected image job");
        };
        assert_eq!(image.energy, 9000);
        assert_eq!(image.feed_amount, 50);
        assert_eq!(image.image.width(), 4);
    }

    #[tokio::test]
    async fn test_print_image_missing_file() {
        let (app, queue) = app();
        let request = multipart("/print/image", &[("energy", None, &b"9000"[..])]);
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No image file provided");
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn test_print_image_undecodable() {
        let (app, _) = app();
        let request = multipart("/print/image", &[("image", Some("x.png"), &b"not an image"[..])]);
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_and_clear() {
        let (app, queue) = app();
        queue.submit(Job::Text(crate::queue::TextJob::new("a")));
        queue.submit(Job::Text(crate::queue::TextJob::new("b")));
        queue.mark_failed();

        let (status, body) = send(
            app.clone(),
            Request::get("/status").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"queue_size": 2, "status": "running", "completed": 0, "failed": 1})
        );

        let (status, body) = send(
            app,
            Request::post("/queue/clear").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "success", "message": "Queue cleared", "cleared": 2})
        );
        assert_eq!(queue.depth(), 0);
    }
}
