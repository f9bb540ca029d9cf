//! Result normalization: heterogeneous provider replies in, one
//! well-formed [`AggregatedResult`] out.
//!
//! Providers disagree about where their answer lives. Some put it in an
//! `output` field, some in `result` or `content`, some return a bare string,
//! some wrap the useful text in a secondary tool-output channel, and some
//! fence it in markdown code blocks. The normalizer probes an ordered chain
//! of extractors per stage record and always produces a displayable result:
//! if the composite itself cannot be parsed, the caller gets a degraded
//! result with a `formatting_error` marker instead of an error.
//!
//! Normalization is a pure function of its input: the same composite always
//! yields the same `AggregatedResult`.

use std::time::Duration;

use serde_json::Value;

use aura_types::{AgentPayload, AggregatedResult, StageRecord, StageResult, TriageOutcome};

use crate::error::FormattingError;

/// Candidate field names for a stage's primary text, in priority order.
const PRIMARY_FIELDS: [&str; 6] = [
    "output",
    "result",
    "raw_output",
    "raw",
    "final_answer",
    "content",
];

/// Candidate field names for the secondary tool-output channel.
const TOOL_CHANNEL_FIELDS: [&str; 3] = ["tool_outputs", "tools_output", "tool_results"];

/// Content keys probed inside structured tool-output entries.
const TOOL_CONTENT_KEYS: [&str; 4] = ["output", "content", "result", "text"];

/// Markdown code-fence delimiter.
const FENCE: &str = "```";

/// Fence language tags whose segments are skipped during extraction.
const FENCE_LANGUAGE_TAGS: [&str; 2] = ["python", "txt"];

/// A stage payload reduced to displayable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedText {
    /// The primary text after fallbacks and fence extraction.
    pub text: String,
    /// The joined tool-output channel text, when the payload has one.
    pub tool_output: Option<String>,
}

/// Normalizes a typed composite result.
///
/// Equivalent to [`normalize_value`] over the outcome's JSON form; exists so
/// the orchestrator's own output does not need manual conversion.
pub fn normalize(outcome: &TriageOutcome) -> AggregatedResult {
    match serde_json::to_value(outcome) {
        Ok(raw) => normalize_value(&raw),
        Err(error) => {
            tracing::warn!(%error, "composite result not serializable, degrading");
            AggregatedResult::degraded(outcome.to_string(), error.to_string())
        }
    }
}

/// Normalizes a raw composite result of arbitrary shape.
///
/// Never fails: malformed composites yield a degraded result carrying only
/// the raw final-answer string, empty stage and agent collections, and an
/// explicit `formatting_error` marker.
pub fn normalize_value(raw: &Value) -> AggregatedResult {
    match try_normalize(raw) {
        Ok(result) => result,
        Err(error) => {
            tracing::warn!(%error, "result normalization failed, degrading");
            AggregatedResult::degraded(final_answer_of(raw), error.to_string())
        }
    }
}

fn try_normalize(raw: &Value) -> Result<AggregatedResult, FormattingError> {
    let stages = raw
        .get("stages")
        .and_then(Value::as_array)
        .ok_or(FormattingError::MissingStages)?;

    let mut result = AggregatedResult::new(final_answer_of(raw));
    let mut total = Duration::ZERO;

    for (index, value) in stages.iter().enumerate() {
        let record: StageRecord = serde_json::from_value(value.clone())
            .map_err(|source| FormattingError::MalformedStage { index, source })?;

        let resolved = resolve_payload(&record.payload);
        let agent_name = record.agent.display_name().to_string();

        total += record.execution_time.unwrap_or(Duration::ZERO);
        result.append_agent_text(&agent_name, resolved.text.clone());
        result.stages.push(StageResult {
            stage: record.stage,
            role: record.agent.role,
            agent_name,
            text: resolved.text,
            raw: record.payload.to_string(),
            tool_output: resolved.tool_output,
            execution_time: record.execution_time,
        });
    }

    if total > Duration::ZERO {
        result.total_execution_time = Some(total);
    }

    Ok(result)
}

/// The composite's own answer: a designated `raw` field when present, else
/// the full string form.
fn final_answer_of(raw: &Value) -> String {
    match raw.get("raw") {
        Some(Value::String(text)) => text.clone(),
        _ => raw.to_string(),
    }
}

/// Reduces one payload to displayable text.
///
/// Extraction order: primary text via the extractor chain, trimmed; empty
/// or bare-fence text substitutes the tool-output channel; a fenced segment
/// without a known language tag replaces the surrounding text.
pub fn resolve_payload(payload: &AgentPayload) -> ResolvedText {
    let primary = EXTRACTORS
        .iter()
        .find_map(|extract| extract(payload))
        .unwrap_or_else(|| payload.to_string());

    let mut text = primary.trim().to_string();
    let tool_output = tool_output_text(payload);

    if text.is_empty() || text == FENCE {
        if let Some(tool) = &tool_output {
            text = tool.trim().to_string();
        }
    }

    if let Some(inner) = extract_fenced(&text) {
        text = inner;
    }

    ResolvedText { text, tool_output }
}

/// Convenience for callers that only need the primary text (the
/// orchestrator threads upstream texts into the retrieval query this way).
pub fn primary_text(payload: &AgentPayload) -> String {
    resolve_payload(payload).text
}

// ── Primary-text extractor chain ─────────────────────────────────────

type Extractor = fn(&AgentPayload) -> Option<String>;

/// Tried in sequence; the first extractor that yields text wins.
const EXTRACTORS: [Extractor; 3] = [bare_text, probed_field, string_list];

/// A bare text payload is its own primary text.
fn bare_text(payload: &AgentPayload) -> Option<String> {
    match payload {
        AgentPayload::Text(text) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

/// Probes the candidate fields of a structured payload in priority order.
fn probed_field(payload: &AgentPayload) -> Option<String> {
    let map = match payload {
        AgentPayload::Structured(map) => map,
        _ => return None,
    };
    PRIMARY_FIELDS
        .iter()
        .find_map(|field| map.get(*field).and_then(value_text))
}

/// An unknown list-shaped payload joins its elements.
fn string_list(payload: &AgentPayload) -> Option<String> {
    match payload {
        AgentPayload::Unknown(value) => value_text(value),
        _ => None,
    }
}

/// Text of one candidate value: non-empty strings as-is, non-empty lists
/// joined with newlines.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) if !items.is_empty() => {
            let parts: Vec<String> = items.iter().map(element_text).collect();
            Some(parts.join("\n"))
        }
        _ => None,
    }
}

/// Lossy text of one list element.
fn element_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ── Tool-output channel ──────────────────────────────────────────────

/// Joined text of the first tool-output channel that yields anything.
///
/// Each channel holds a list of either bare values or objects with a known
/// content key; the first matching key per entry wins.
fn tool_output_text(payload: &AgentPayload) -> Option<String> {
    let map = match payload {
        AgentPayload::Structured(map) => map,
        _ => return None,
    };

    for channel in TOOL_CHANNEL_FIELDS {
        let Some(Value::Array(items)) = map.get(channel) else {
            continue;
        };

        let mut collected = Vec::new();
        for item in items {
            match item {
                Value::Object(entry) => {
                    for key in TOOL_CONTENT_KEYS {
                        match entry.get(key) {
                            Some(value) if !is_blank(value) => {
                                collected.push(element_text(value));
                                break;
                            }
                            _ => {}
                        }
                    }
                }
                other => collected.push(element_text(other)),
            }
        }

        if !collected.is_empty() {
            return Some(collected.join("\n"));
        }
    }

    None
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

// ── Code-fence extraction ────────────────────────────────────────────

/// Extracts the first fenced segment whose content does not start with a
/// known language tag. Returns `None` when the text has no usable fence.
fn extract_fenced(text: &str) -> Option<String> {
    if !text.contains(FENCE) {
        return None;
    }

    for segment in text.split(FENCE).skip(1) {
        let segment = segment.trim_matches('\n');
        if segment.is_empty() {
            continue;
        }
        if FENCE_LANGUAGE_TAGS.iter().any(|tag| segment.starts_with(tag)) {
            continue;
        }
        return Some(segment.trim().to_string());
    }

    None
}
