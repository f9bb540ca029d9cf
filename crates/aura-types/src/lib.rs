//! Shared types, error definitions, and constants for the Aura pipeline.
//!
//! This crate provides the foundational types used across all Aura crates:
//! the stage and agent-role enums, the raw and normalized result shapes,
//! request lifecycle records, and domain error types (via `thiserror`).
//!
//! No crate in the workspace depends on anything *except* `aura-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use serde::{Deserialize, Serialize};

mod error;
mod payload;
mod request;
mod result;

pub use error::{AgentError, ValidationError};
pub use payload::{AgentPayload, StageRecord, TriageOutcome};
pub use request::{RequestRecord, RequestStatus, ResponseStatus, TriageResponse};
pub use result::{
    AggregatedResult, AgentTranscript, DisplayRecord, StageResult, DEFAULT_EQUIPMENT,
    DEFAULT_ISSUE, DEFAULT_SOLUTION,
};

/// The three stages of the triage pipeline, in execution order.
///
/// The pipeline is strictly sequential: retrieval needs both the
/// identification and transcription outputs as query context, so a stage
/// only ever starts after the previous one returned successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Vision identification of the equipment in the photo.
    Identify,
    /// Speech-to-text transcription of the voice note.
    Transcribe,
    /// Document retrieval over the corpus, using both upstream texts.
    Search,
}

impl StageKind {
    /// All stages in execution order.
    pub const ALL: [StageKind; 3] = [Self::Identify, Self::Transcribe, Self::Search];

    /// Returns the canonical string label for this stage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identify => "identify",
            Self::Transcribe => "transcribe",
            Self::Search => "search",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageKind {
    type Err = ParseStageKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identify" => Ok(Self::Identify),
            "transcribe" => Ok(Self::Transcribe),
            "search" => Ok(Self::Search),
            _ => Err(ParseStageKindError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown stage label.
#[derive(Debug, Clone)]
pub struct ParseStageKindError(pub String);

impl std::fmt::Display for ParseStageKindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown stage: {}", self.0)
    }
}

impl std::error::Error for ParseStageKindError {}

/// The role an agent plays in the pipeline.
///
/// The role tag is attached to every stage record at construction time and
/// is what the formatter keys its display slots on — equipment, issue, and
/// solution each come from exactly one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Identifies the equipment present in the photo.
    EquipmentIdentifier,
    /// Transcribes the recorded voice note.
    VoiceTranscriber,
    /// Retrieves the most relevant answer from the document corpus.
    DocumentSearcher,
}

impl AgentRole {
    /// Returns the human-readable role title.
    pub fn title(self) -> &'static str {
        match self {
            Self::EquipmentIdentifier => "Equipment Identifier",
            Self::VoiceTranscriber => "Voice Transcriber",
            Self::DocumentSearcher => "Document Searcher",
        }
    }

    /// Returns the canonical role for a pipeline stage.
    pub fn for_stage(stage: StageKind) -> Self {
        match stage {
            StageKind::Identify => Self::EquipmentIdentifier,
            StageKind::Transcribe => Self::VoiceTranscriber,
            StageKind::Search => Self::DocumentSearcher,
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Identity attached to every stage record an agent produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// The agent's role in the pipeline.
    pub role: AgentRole,
    /// Optional display-name override for the role title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AgentDescriptor {
    /// Creates a descriptor with no name override.
    pub fn new(role: AgentRole) -> Self {
        Self { role, name: None }
    }

    /// The name recorded against this agent's outputs: the explicit name if
    /// one was configured, otherwise the role title.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.role.title())
    }
}

/// Media categories accepted as pipeline input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// An equipment photo (JPEG or PNG).
    Image,
    /// A recorded voice note (WAV, MP3, or M4A).
    Audio,
}

impl MediaKind {
    /// Returns the string label for this media kind.
    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
