//! Upload API handlers for the two pipeline inputs.
//!
//! Content kinds are sniffed from magic bytes, never trusted from the
//! client's content-type header or filename. Stored files get uuid names
//! under a per-kind subdirectory of the upload dir.

use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart},
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use uuid::Uuid;

use aura_agents::validate::{detect_audio, detect_image};
use aura_agents::{MAX_AUDIO_BYTES, MAX_IMAGE_BYTES};
use aura_types::MediaKind;

use crate::{api::ApiError, AppState};

/// Audio uploads under this size are stored but flagged in the response.
const MIN_AUDIO_BYTES: usize = 1024;

/// Determines file extension from content type.
fn ext_from_content_type(ct: &str) -> &'static str {
    match ct {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "audio/wav" => "wav",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        _ => "bin",
    }
}

/// Handler for `POST /api/uploads/image`.
pub async fn upload_image_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    store_upload(&state, multipart, MediaKind::Image).await
}

/// Handler for `POST /api/uploads/audio`.
pub async fn upload_audio_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    store_upload(&state, multipart, MediaKind::Audio).await
}

async fn store_upload(
    state: &AppState,
    mut multipart: Multipart,
    kind: MediaKind,
) -> Result<Response, ApiError> {
    // Extract the file field from multipart
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
        .ok_or_else(|| ApiError::BadRequest("no file provided".to_string()))?;

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;

    let limit = match kind {
        MediaKind::Image => MAX_IMAGE_BYTES,
        MediaKind::Audio => MAX_AUDIO_BYTES,
    };
    if data.len() as u64 > limit {
        return Err(ApiError::BadRequest(format!(
            "file too large: {} bytes (max {})",
            data.len(),
            limit
        )));
    }

    // Detect actual content type from magic bytes
    let detected = match kind {
        MediaKind::Image => detect_image(&data),
        MediaKind::Audio => detect_audio(&data),
    }
    .ok_or_else(|| ApiError::BadRequest(format!("unsupported {} format", kind)))?;

    let mut warnings = Vec::new();
    if kind == MediaKind::Audio && data.len() < MIN_AUDIO_BYTES {
        warnings.push("Audio file seems very small - please check recording".to_string());
    }

    // Save to disk
    let ext = ext_from_content_type(detected);
    let filename = format!("{}.{}", Uuid::new_v4(), ext);
    let kind_dir = format!("{}/{}", state.upload_dir, kind.label());

    tokio::fs::create_dir_all(&kind_dir)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("failed to create upload dir: {}", e)))?;

    let file_path = format!("{}/{}", kind_dir, filename);
    tokio::fs::write(&file_path, &data)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("failed to write file: {}", e)))?;

    tracing::info!(path = %file_path, content_type = detected, bytes = data.len(), "stored upload");

    Ok(AxumJson(serde_json::json!({
        "status": "ok",
        "path": file_path,
        "contentType": detected,
        "warnings": warnings,
    }))
    .into_response())
}

/// Handler for `DELETE /api/uploads`.
///
/// Clears all stored uploads from both kind subdirectories. Explicit
/// administrative action only; nothing deletes uploads implicitly.
pub async fn clear_uploads_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let mut removed = 0usize;

    for kind in [MediaKind::Image, MediaKind::Audio] {
        let kind_dir = format!("{}/{}", state.upload_dir, kind.label());
        let mut entries = match tokio::fs::read_dir(&kind_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(ApiError::InternalServerError(format!(
                    "failed to list {}: {}",
                    kind_dir, e
                )))
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ApiError::InternalServerError(format!("failed to list {}: {}", kind_dir, e)))?
        {
            let path = entry.path();
            if path.is_file() {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!(path = %path.display(), "failed to delete upload: {}", e),
                }
            }
        }
    }

    tracing::info!(removed, "upload directories cleared by admin");

    Ok(AxumJson(serde_json::json!({
        "status": "ok",
        "removed": removed,
    }))
    .into_response())
}
