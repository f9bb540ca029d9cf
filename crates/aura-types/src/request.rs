//! Request lifecycle records and the processing boundary envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AggregatedResult, StageKind};

/// Lifecycle state of a tracked request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// The pipeline is running (or about to).
    Processing,
    /// The pipeline finished and a result is attached.
    Completed,
    /// The pipeline failed and an error message is attached.
    Error,
}

impl RequestStatus {
    /// Returns the canonical string label for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request lifecycle state held by the tracker for the process
/// lifetime. Created on submission, mutated in place as stages advance,
/// never deleted except by explicit administrative action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// The collision-free request id.
    pub id: String,
    /// Current lifecycle state.
    pub status: RequestStatus,
    /// When the request was submitted.
    pub started_at: DateTime<Utc>,
    /// The stage currently running (or the one that failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<StageKind>,
    /// The normalized result, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AggregatedResult>,
    /// The failure message, once errored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Terminal outcome of a processing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// The pipeline ran to completion.
    Success,
    /// Validation or a stage failed.
    Error,
}

/// The processing boundary envelope:
/// `process(image_path, audio_path)` resolves to exactly this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResponse {
    /// The id assigned to this request.
    #[serde(rename = "requestId")]
    pub request_id: String,
    /// Terminal outcome.
    pub status: ResponseStatus,
    /// The normalized result on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AggregatedResult>,
    /// A short failure message on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
}

impl TriageResponse {
    /// Builds a success envelope around a normalized result.
    pub fn success(request_id: impl Into<String>, data: AggregatedResult) -> Self {
        Self {
            request_id: request_id.into(),
            status: ResponseStatus::Success,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Builds an error envelope around a short failure message.
    pub fn failure(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            status: ResponseStatus::Error,
            data: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// Returns true when the envelope reports a failure.
    pub fn is_error(&self) -> bool {
        self.status == ResponseStatus::Error
    }
}
