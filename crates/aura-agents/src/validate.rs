//! Pre-pipeline input validation.
//!
//! A validation failure aborts before the pipeline starts; no provider is
//! ever called with a missing, oversized, or unrecognizable file. Content
//! kinds are sniffed from magic bytes, never from file extensions.

use std::io::Read;
use std::path::Path;

use aura_types::{MediaKind, ValidationError};

/// Maximum accepted image size (10 MiB).
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum accepted audio size (25 MiB).
pub const MAX_AUDIO_BYTES: u64 = 25 * 1024 * 1024;

/// Audio files under this size are accepted but flagged: the recording is
/// probably empty.
const MIN_AUDIO_BYTES: u64 = 1024;

/// Bytes read from the head of the file for sniffing.
const SNIFF_LEN: usize = 16;

/// Detects an image content type from the first bytes of a file.
pub fn detect_image(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
        Some("image/jpeg")
    } else if data.len() >= 8 && data[..8] == [137, 80, 78, 71, 13, 10, 26, 10] {
        Some("image/png")
    } else {
        None
    }
}

/// Detects an audio content type from the first bytes of a file.
pub fn detect_audio(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WAVE" {
        Some("audio/wav")
    } else if data.len() >= 3 && &data[..3] == b"ID3" {
        Some("audio/mpeg")
    } else if data.len() >= 2 && data[0] == 0xFF && (data[1] & 0xE0) == 0xE0 {
        // Bare MPEG frame sync, no ID3 header
        Some("audio/mpeg")
    } else if data.len() >= 12 && &data[4..8] == b"ftyp" {
        Some("audio/mp4")
    } else {
        None
    }
}

/// Validates one input file for its media kind.
///
/// Checks, in order: existence, size limit, readable header, magic bytes.
/// Returns non-fatal warnings (currently only the tiny-audio flag) on
/// success.
pub fn validate_media(path: &Path, kind: MediaKind) -> Result<Vec<String>, ValidationError> {
    let shown = path.display().to_string();

    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ValidationError::NotFound {
                kind,
                path: shown.clone(),
            }
        } else {
            ValidationError::Unreadable {
                kind,
                path: shown.clone(),
                detail: e.to_string(),
            }
        }
    })?;

    let limit = match kind {
        MediaKind::Image => MAX_IMAGE_BYTES,
        MediaKind::Audio => MAX_AUDIO_BYTES,
    };
    if metadata.len() > limit {
        return Err(ValidationError::TooLarge {
            kind,
            path: shown,
            actual: metadata.len(),
            limit,
        });
    }

    let mut head = [0u8; SNIFF_LEN];
    let read = std::fs::File::open(path)
        .and_then(|mut file| file.read(&mut head))
        .map_err(|e| ValidationError::Unreadable {
            kind,
            path: shown.clone(),
            detail: e.to_string(),
        })?;

    let detected = match kind {
        MediaKind::Image => detect_image(&head[..read]),
        MediaKind::Audio => detect_audio(&head[..read]),
    };
    if detected.is_none() {
        return Err(ValidationError::UnsupportedFormat { kind, path: shown });
    }

    let mut warnings = Vec::new();
    if kind == MediaKind::Audio && metadata.len() < MIN_AUDIO_BYTES {
        tracing::warn!(path = %shown, bytes = metadata.len(), "audio file is very small");
        warnings.push("Audio file seems very small - please check recording".to_string());
    }

    Ok(warnings)
}
