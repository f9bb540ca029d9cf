//! Core triage pipeline for the Aura platform.
//!
//! Implements the sequential orchestrator, the result normalizer, the
//! response formatter, and the request tracker. The three capability
//! executors (vision identification, speech transcription, document
//! retrieval) live behind the [`StageAgent`] trait and are provided by
//! `aura-agents`; this crate owns everything that happens around them.
//!
//! # Flow
//!
//! ```text
//! submit ──► identify ──► transcribe ──► search ──► TriageOutcome
//!               │              │            │
//!               └── current_stage advances per stage ──┘
//!
//! TriageOutcome ──► normalize ──► AggregatedResult ──► format ──► display lines
//! ```
//!
//! Normalization is the hardest piece: providers return heterogeneous,
//! semi-structured replies, and [`normalize::normalize_value`] folds them
//! into a single well-formed [`aura_types::AggregatedResult`], tolerant of
//! missing fields, inconsistent shapes, and partial failures.

mod error;
pub mod format;
pub mod normalize;
mod orchestrator;
mod tracker;

pub use error::{FormattingError, PipelineError};
pub use orchestrator::{StageAgent, StageInput, TriagePipeline};
pub use tracker::RequestTracker;

#[cfg(test)]
mod tests;
