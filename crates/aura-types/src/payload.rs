//! Raw provider reply shapes and the orchestrator's composite result.
//!
//! Capability providers do not share a reply schema: the vision endpoint
//! returns a message content that may be a string or a list of content
//! parts, the transcriber writes plain text, and retrieval sidecars wrap
//! their answer in a JSON object whose field names vary between versions.
//! `AgentPayload` models the known shapes plus an explicit unknown variant;
//! the normalizer's extractor chain does the rest.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::{AgentDescriptor, StageKind};

/// A raw reply payload from a capability provider, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentPayload {
    /// A bare text reply (subprocess providers write plain text to stdout).
    Text(String),
    /// A structured JSON object whose field names vary by provider.
    Structured(serde_json::Map<String, Value>),
    /// Any other JSON shape (arrays, numbers, null).
    Unknown(Value),
}

impl AgentPayload {
    /// Converts an arbitrary JSON value into the matching payload variant.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(map) => Self::Structured(map),
            other => Self::Unknown(other),
        }
    }

}

/// The full string representation of a payload: text as-is, JSON shapes as
/// compact JSON. Used as the last-resort fallback when no candidate field
/// yields a primary text.
impl std::fmt::Display for AgentPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Structured(map) => match serde_json::to_string(map) {
                Ok(json) => f.write_str(&json),
                Err(_) => f.write_str("{}"),
            },
            Self::Unknown(value) => write!(f, "{}", value),
        }
    }
}

/// One stage's raw output. Produced once per stage per request and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// The stage that produced this record.
    pub stage: StageKind,
    /// Who produced it.
    pub agent: AgentDescriptor,
    /// The provider's reply, shape untouched.
    pub payload: AgentPayload,
    /// Wall-clock time the stage took, when measured.
    #[serde(
        default,
        rename = "execution_time_ms",
        with = "duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub execution_time: Option<Duration>,
}

/// The orchestrator's raw composite result: one record per executed stage,
/// in execution order, plus the pipeline's own answer text when it has one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriageOutcome {
    /// The pipeline's final answer text, when the run produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Per-stage records in execution order.
    #[serde(default)]
    pub stages: Vec<StageRecord>,
}

/// Prefers the designated `raw` answer; falls back to the JSON form of the
/// whole composite.
impl std::fmt::Display for TriageOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.raw {
            Some(raw) => f.write_str(raw),
            None => match serde_json::to_string(self) {
                Ok(json) => f.write_str(&json),
                Err(_) => f.write_str("{}"),
            },
        }
    }
}

/// Serde adapter for optional durations stored as integer milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: Option<u64> = Option::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AgentRole;
    use serde_json::json;

    #[test]
    fn payload_from_value_picks_variants() {
        assert_eq!(
            AgentPayload::from_value(json!("PUMP-100")),
            AgentPayload::Text("PUMP-100".to_string())
        );
        assert!(matches!(
            AgentPayload::from_value(json!({"output": "x"})),
            AgentPayload::Structured(_)
        ));
        assert!(matches!(
            AgentPayload::from_value(json!(["a", "b"])),
            AgentPayload::Unknown(_)
        ));
    }

    #[test]
    fn payload_display_is_lossless_for_text() {
        let payload = AgentPayload::Text("line one\nline two".to_string());
        assert_eq!(payload.to_string(), "line one\nline two");
    }

    #[test]
    fn payload_display_renders_json_shapes() {
        let payload = AgentPayload::from_value(json!({"result": "ok"}));
        assert_eq!(payload.to_string(), r#"{"result":"ok"}"#);
    }

    #[test]
    fn stage_record_duration_round_trips_as_millis() {
        let record = StageRecord {
            stage: StageKind::Identify,
            agent: AgentDescriptor::new(AgentRole::EquipmentIdentifier),
            payload: AgentPayload::Text("valve".to_string()),
            execution_time: Some(Duration::from_millis(1250)),
        };

        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["execution_time_ms"], 1250);

        let restored: StageRecord = serde_json::from_value(json).expect("deserialize");
        assert_eq!(restored.execution_time, Some(Duration::from_millis(1250)));
    }

    #[test]
    fn outcome_display_prefers_raw() {
        let outcome = TriageOutcome {
            raw: Some("final answer".to_string()),
            stages: Vec::new(),
        };
        assert_eq!(outcome.to_string(), "final answer");

        let bare = TriageOutcome::default();
        assert!(bare.to_string().contains("stages"));
    }
}
