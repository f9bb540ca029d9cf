//! Normalized result shapes consumed by the formatter and the API layer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{AgentRole, StageKind};

/// Default equipment slot text when identification produced nothing usable.
pub const DEFAULT_EQUIPMENT: &str = "Unknown Equipment";
/// Default issue slot text when transcription produced nothing usable.
pub const DEFAULT_ISSUE: &str = "No issue specified";
/// Default solution slot text when retrieval produced nothing usable.
pub const DEFAULT_SOLUTION: &str = "No solution found";

/// One stage's normalized output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// The stage that produced this record.
    pub stage: StageKind,
    /// The role of the agent that produced it.
    pub role: AgentRole,
    /// The name recorded against the agent's outputs.
    pub agent_name: String,
    /// The normalized primary text.
    pub text: String,
    /// The full string form of the raw payload, kept as a last-resort
    /// fallback for display.
    pub raw: String,
    /// Joined text from the stage's secondary tool-output channel, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<String>,
    /// Wall-clock time the stage took, when measured.
    #[serde(
        default,
        rename = "execution_time_ms",
        with = "crate::payload::duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub execution_time: Option<Duration>,
}

/// The ordered outputs of one agent across a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTranscript {
    /// The agent's recorded name.
    pub agent_name: String,
    /// Everything the agent said, in the order it said it.
    pub texts: Vec<String>,
}

/// The normalized composite result of a pipeline run.
///
/// `stages` preserves stage-execution order end-to-end; `agent_outputs`
/// never duplicates an agent name, and repeated outputs from the same agent
/// append to its transcript in insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// The pipeline's final answer.
    pub final_answer: String,
    /// Normalized per-stage records in execution order.
    #[serde(default)]
    pub stages: Vec<StageResult>,
    /// Per-agent transcripts in first-appearance order.
    #[serde(default)]
    pub agent_outputs: Vec<AgentTranscript>,
    /// Sum of the per-stage execution times; omitted when nothing was
    /// measured.
    #[serde(
        default,
        rename = "total_execution_time_ms",
        with = "crate::payload::duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_execution_time: Option<Duration>,
    /// Set when normalization could not parse the composite and fell back
    /// to a degraded result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting_error: Option<String>,
}

impl AggregatedResult {
    /// Creates an empty result carrying only the final answer.
    pub fn new(final_answer: impl Into<String>) -> Self {
        Self {
            final_answer: final_answer.into(),
            ..Self::default()
        }
    }

    /// Creates the degraded fallback result: the raw final-answer string,
    /// empty stage and agent collections, and an explicit formatting-error
    /// marker.
    pub fn degraded(final_answer: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            final_answer: final_answer.into(),
            formatting_error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Appends a text to an agent's transcript, creating the transcript on
    /// first appearance. Agent names are never duplicated.
    pub fn append_agent_text(&mut self, agent_name: &str, text: impl Into<String>) {
        match self
            .agent_outputs
            .iter_mut()
            .find(|entry| entry.agent_name == agent_name)
        {
            Some(entry) => entry.texts.push(text.into()),
            None => self.agent_outputs.push(AgentTranscript {
                agent_name: agent_name.to_string(),
                texts: vec![text.into()],
            }),
        }
    }
}

/// The fixed three-slot presentation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRecord {
    /// What the equipment is.
    pub equipment: String,
    /// What the reported issue is.
    pub issue: String,
    /// What the corpus suggests doing about it.
    pub solution: String,
}

impl Default for DisplayRecord {
    fn default() -> Self {
        Self {
            equipment: DEFAULT_EQUIPMENT.to_string(),
            issue: DEFAULT_ISSUE.to_string(),
            solution: DEFAULT_SOLUTION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_insertion_order_and_uniqueness() {
        let mut result = AggregatedResult::new("answer");
        result.append_agent_text("Equipment Identifier", "PUMP-100");
        result.append_agent_text("Voice Transcriber", "leaking seal");
        result.append_agent_text("Equipment Identifier", "second look");

        assert_eq!(result.agent_outputs.len(), 2);
        assert_eq!(result.agent_outputs[0].agent_name, "Equipment Identifier");
        assert_eq!(
            result.agent_outputs[0].texts,
            vec!["PUMP-100".to_string(), "second look".to_string()]
        );
        assert_eq!(result.agent_outputs[1].agent_name, "Voice Transcriber");
    }

    #[test]
    fn degraded_result_is_well_formed() {
        let result = AggregatedResult::degraded("raw text", "boom");
        assert_eq!(result.final_answer, "raw text");
        assert!(result.stages.is_empty());
        assert!(result.agent_outputs.is_empty());
        assert_eq!(result.formatting_error.as_deref(), Some("boom"));
        assert!(result.total_execution_time.is_none());
    }

    #[test]
    fn display_record_defaults() {
        let record = DisplayRecord::default();
        assert_eq!(record.equipment, DEFAULT_EQUIPMENT);
        assert_eq!(record.issue, DEFAULT_ISSUE);
        assert_eq!(record.solution, DEFAULT_SOLUTION);
    }
}
