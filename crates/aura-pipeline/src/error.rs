//! Error types for the pipeline layer.

use std::time::Duration;

use aura_types::{AgentError, StageKind};

/// Errors that abort a pipeline run.
///
/// Either way the remaining stages do not execute and the triggering stage
/// is recorded on the error.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage's capability call failed.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// The stage that failed.
        stage: StageKind,
        /// The underlying executor failure.
        #[source]
        source: AgentError,
    },

    /// A stage exceeded the configured timeout budget.
    #[error("{} stage timed out after {} seconds", .stage, .budget.as_secs())]
    StageTimeout {
        /// The stage that timed out.
        stage: StageKind,
        /// The budget that elapsed.
        budget: Duration,
    },
}

impl PipelineError {
    /// The stage that triggered the failure.
    pub fn stage(&self) -> StageKind {
        match self {
            Self::Stage { stage, .. } | Self::StageTimeout { stage, .. } => *stage,
        }
    }
}

/// Errors the normalizer can hit while parsing a composite result.
///
/// Never propagated to callers: [`crate::normalize::normalize_value`]
/// converts any of these into a degraded-but-valid result.
#[derive(Debug, thiserror::Error)]
pub enum FormattingError {
    /// The composite carries no stages array at all.
    #[error("composite result has no stages array")]
    MissingStages,

    /// One stage record does not parse as a stage record.
    #[error("stage record {index} is malformed: {source}")]
    MalformedStage {
        /// Index of the offending record.
        index: usize,
        /// The parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The composite could not be rendered to JSON in the first place.
    #[error("composite result is not serializable: {0}")]
    Unserializable(#[from] serde_json::Error),
}
