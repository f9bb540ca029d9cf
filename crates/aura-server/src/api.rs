//! API handlers for the Aura server.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aura_agents::validate_media;
use aura_pipeline::format::{export_text, format_for_display, summarize};
use aura_pipeline::normalize::normalize;
use aura_types::{AgentRole, MediaKind, RequestStatus, StageKind, TriageResponse};

use crate::AppState;

/// Request body for triage processing.
#[derive(Debug, Deserialize)]
pub struct TriageRequest {
    /// Path to the uploaded equipment photo.
    #[serde(rename = "imagePath")]
    pub image_path: String,
    /// Path to the uploaded voice note.
    #[serde(rename = "audioPath")]
    pub audio_path: String,
}

/// Response body for the display-ready report of a completed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    /// Display lines in fixed order.
    pub lines: Vec<String>,
    /// One-line processing summary.
    pub summary: String,
    /// Downloadable form: lines joined with blank-line separation.
    pub export: String,
}

/// One entry of the agent roster.
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentInfo {
    /// The agent's display name.
    pub name: String,
    /// The pipeline stage the agent serves.
    pub stage: String,
    /// What the agent is for.
    pub goal: String,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Handler for `POST /api/triage`.
///
/// Runs the full pipeline for one request and replies with the processing
/// envelope. Failures — validation or stage — come back as an error-status
/// envelope carrying the request id, never as a bare transport error.
pub async fn triage_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<TriageRequest>,
) -> Json<TriageResponse> {
    let request_id = state.tracker.submit();
    tracing::info!(
        request_id,
        image = %payload.image_path,
        audio = %payload.audio_path,
        "triage request submitted"
    );

    // Validation failures abort before the pipeline starts.
    let inputs = [
        (payload.image_path.as_str(), MediaKind::Image),
        (payload.audio_path.as_str(), MediaKind::Audio),
    ];
    for (path, kind) in inputs {
        if let Err(error) = validate_media(FsPath::new(path), kind) {
            let message = error.to_string();
            state.tracker.fail(&request_id, message.clone());
            return Json(TriageResponse::failure(request_id, message));
        }
    }

    let run = state
        .pipeline
        .run(
            &state.tracker,
            &request_id,
            FsPath::new(&payload.image_path),
            FsPath::new(&payload.audio_path),
        )
        .await;

    match run {
        Ok(outcome) => {
            let result = normalize(&outcome);
            state.tracker.complete(&request_id, result.clone());
            Json(TriageResponse::success(request_id, result))
        }
        Err(error) => {
            let message = error.to_string();
            state.tracker.fail(&request_id, message.clone());
            Json(TriageResponse::failure(request_id, message))
        }
    }
}

/// Handler for `GET /api/triage/{requestId}`.
///
/// Returns the tracked request, or the `not_found` sentinel for unknown
/// ids.
pub async fn status_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Response {
    match state.tracker.get(&request_id) {
        Some(record) => Json(record).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "status": "not_found",
                "error": format!("Request {} not found", request_id),
            })),
        )
            .into_response(),
    }
}

/// Handler for `GET /api/triage/{requestId}/report`.
///
/// Builds the display-ready report for a finished request.
pub async fn report_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Result<Json<ReportResponse>, ApiError> {
    let record = state
        .tracker
        .get(&request_id)
        .ok_or_else(|| ApiError::NotFound(format!("Request {} not found", request_id)))?;

    let response = match record.status {
        RequestStatus::Processing => {
            return Err(ApiError::Conflict(format!(
                "Request {} is still processing",
                request_id
            )))
        }
        RequestStatus::Completed => match record.result {
            Some(result) => TriageResponse::success(record.id, result),
            None => {
                return Err(ApiError::InternalServerError(format!(
                    "Request {} completed without a result",
                    request_id
                )))
            }
        },
        RequestStatus::Error => TriageResponse::failure(
            record.id,
            record.error.unwrap_or_else(|| "Unknown error".to_string()),
        ),
    };

    let lines = format_for_display(&response);
    Ok(Json(ReportResponse {
        summary: summarize(&response),
        export: export_text(&lines),
        lines,
    }))
}

/// Handler for `GET /api/agents`.
///
/// Returns the static roster of pipeline agents.
pub async fn agents_handler() -> Json<Vec<AgentInfo>> {
    let roster = StageKind::ALL
        .iter()
        .map(|stage| {
            let role = AgentRole::for_stage(*stage);
            AgentInfo {
                name: role.title().to_string(),
                stage: stage.as_str().to_string(),
                goal: agent_goal(role).to_string(),
            }
        })
        .collect();
    Json(roster)
}

fn agent_goal(role: AgentRole) -> &'static str {
    match role {
        AgentRole::EquipmentIdentifier => "Identify the equipment present in the uploaded photo.",
        AgentRole::VoiceTranscriber => {
            "Return the exact text transcription of the recorded voice note."
        }
        AgentRole::DocumentSearcher => {
            "Retrieve the most relevant answer for the query from the document corpus."
        }
    }
}

/// Handler for `POST /api/admin/requests/clear`.
///
/// Explicit administrative wipe of the request tracker.
pub async fn clear_requests_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    let removed = state.tracker.clear();
    tracing::info!(removed, "request tracker cleared by admin");
    Json(serde_json::json!({
        "status": "ok",
        "removed": removed,
    }))
}
