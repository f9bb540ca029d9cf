//! Domain error types shared across the workspace.

use thiserror::Error;

use crate::MediaKind;

/// Errors raised by a stage executor when its capability provider fails.
///
/// Executors are fail-fast: the first provider failure propagates up and
/// the orchestrator stops the run. No retries happen at this layer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The vision provider call failed.
    #[error("vision provider error: {0}")]
    Vision(String),

    /// The speech-to-text provider failed.
    #[error("transcription error: {0}")]
    Stt(String),

    /// The document-retrieval provider failed.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// The agent was handed an input it cannot process.
    #[error("unsupported stage input: {0}")]
    Input(String),

    /// The agent is misconfigured (missing endpoint, bad binary path).
    #[error("invalid agent configuration: {0}")]
    Config(String),
}

/// Errors raised by pre-pipeline input validation.
///
/// A validation failure aborts before the pipeline starts and is reported
/// as an error-status response.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The input file does not exist.
    #[error("{kind} file not found: {path}")]
    NotFound {
        /// Which input the path was supposed to be.
        kind: MediaKind,
        /// The offending path.
        path: String,
    },

    /// The input file exists but could not be read.
    #[error("failed to read {kind} file {path}: {detail}")]
    Unreadable {
        /// Which input the path was supposed to be.
        kind: MediaKind,
        /// The offending path.
        path: String,
        /// The underlying I/O failure.
        detail: String,
    },

    /// The file content does not match any accepted format for its kind.
    #[error("unsupported {kind} format: {path}")]
    UnsupportedFormat {
        /// Which input the path was supposed to be.
        kind: MediaKind,
        /// The offending path.
        path: String,
    },

    /// The file exceeds the size limit for its kind.
    #[error("{kind} file {path} is {actual} bytes, over the {limit}-byte limit")]
    TooLarge {
        /// Which input the path was supposed to be.
        kind: MediaKind,
        /// The offending path.
        path: String,
        /// Actual size in bytes.
        actual: u64,
        /// The per-kind limit in bytes.
        limit: u64,
    },
}
