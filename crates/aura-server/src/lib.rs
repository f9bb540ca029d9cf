//! Aura server library logic.

pub mod api;
pub mod api_upload;
pub mod config;

use std::sync::Arc;

use aura_pipeline::{RequestTracker, TriagePipeline};
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across all request handlers.
pub struct AppState {
    /// In-memory request tracker (process-lifetime storage).
    pub tracker: RequestTracker,
    /// The sequential triage pipeline.
    pub pipeline: TriagePipeline,
    /// Directory for uploaded media files.
    pub upload_dir: String,
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized
/// payloads; upload routes get their own larger limit.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Maximum upload body size (50 MiB hard ceiling); the handlers enforce the
/// per-kind limits below it.
const MAX_UPLOAD_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    // Upload routes need a larger body limit for media uploads.
    let upload_routes = Router::new()
        .route("/api/uploads/image", post(api_upload::upload_image_handler))
        .route("/api/uploads/audio", post(api_upload::upload_audio_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES));

    Router::new()
        .route("/health", get(health))
        .route("/api/triage", post(api::triage_handler))
        .route("/api/triage/{requestId}", get(api::status_handler))
        .route("/api/triage/{requestId}/report", get(api::report_handler))
        .route("/api/agents", get(api::agents_handler))
        .route(
            "/api/admin/requests/clear",
            post(api::clear_requests_handler),
        )
        .route("/api/uploads", delete(api_upload::clear_uploads_handler))
        .merge(upload_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
