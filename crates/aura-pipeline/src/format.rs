//! Response formatting: normalized results into the fixed three-slot
//! display record and human-readable output lines.

use aura_types::{AggregatedResult, AgentRole, DisplayRecord, StageResult, TriageResponse};

/// Tokens treated as "no answer" regardless of case.
const NULL_TOKENS: [&str; 2] = ["none", "null"];

/// Header line emitted above the slot lines.
const HEADER_LINE: &str = "Analysis complete";

/// Maps a normalized result onto the three display slots.
///
/// Each stage result feeds exactly one slot, keyed by its agent role. A
/// slot with no usable candidate keeps its default text. The equipment slot
/// takes only the first line of its candidate.
pub fn display_record(result: &AggregatedResult) -> DisplayRecord {
    let mut record = DisplayRecord::default();

    for stage in &result.stages {
        let Some(candidate) = slot_candidate(stage) else {
            continue;
        };
        match stage.role {
            AgentRole::EquipmentIdentifier => {
                record.equipment = first_line(&candidate);
            }
            AgentRole::VoiceTranscriber => record.issue = candidate,
            AgentRole::DocumentSearcher => record.solution = candidate,
        }
    }

    record
}

/// Builds the display lines for a processing response.
///
/// Error responses short-circuit to a single error line; successful ones
/// get a header followed by the equipment, issue, and solution lines in
/// fixed order.
pub fn format_for_display(response: &TriageResponse) -> Vec<String> {
    if response.is_error() {
        let message = response.error.as_deref().unwrap_or("Unknown error");
        return vec![format!("Error: {}", message)];
    }

    let record = match &response.data {
        Some(data) => display_record(data),
        None => DisplayRecord::default(),
    };

    vec![
        HEADER_LINE.to_string(),
        format!("Equipment: {}", record.equipment),
        format!("Issue: {}", record.issue),
        format!("Solution: {}", record.solution),
    ]
}

/// One-line summary of a processing response.
pub fn summarize(response: &TriageResponse) -> String {
    if response.is_error() {
        return format!(
            "Processing failed: {}",
            response.error.as_deref().unwrap_or("Unknown error")
        );
    }

    let stage_count = response.data.as_ref().map_or(0, |data| data.stages.len());
    let mut summary = format!("Successfully processed {} stages", stage_count);
    if let Some(total) = response.data.as_ref().and_then(|data| data.total_execution_time) {
        summary.push_str(&format!(" in {:.2} seconds", total.as_secs_f64()));
    }
    summary
}

/// The downloadable form: display lines joined with blank-line separation.
pub fn export_text(lines: &[String]) -> String {
    lines.join("\n\n")
}

/// Candidate text for a stage's slot: the primary text when it is neither
/// empty nor a null-like token, else the tool output, else the raw string
/// form. `None` when nothing usable remains.
fn slot_candidate(stage: &StageResult) -> Option<String> {
    let text = stage.text.trim();
    let usable = !text.is_empty() && !NULL_TOKENS.contains(&text.to_lowercase().as_str());

    let candidate = if usable {
        text.to_string()
    } else {
        match stage.tool_output.as_deref().map(str::trim) {
            Some(tool) if !tool.is_empty() => tool.to_string(),
            _ => stage.raw.trim().to_string(),
        }
    };

    if candidate.is_empty() {
        None
    } else {
        Some(candidate)
    }
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().trim().to_string()
}
