//! Unit tests for the pipeline core: normalization, formatting, request
//! tracking, and sequential orchestration.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use aura_types::{
    AgentDescriptor, AgentError, AgentPayload, AggregatedResult, AgentRole, StageKind,
    StageRecord, StageResult, TriageOutcome, TriageResponse, DEFAULT_EQUIPMENT, DEFAULT_ISSUE,
    DEFAULT_SOLUTION,
};

use crate::format::{display_record, export_text, format_for_display, summarize};
use crate::normalize::{normalize, normalize_value, resolve_payload};
use crate::{PipelineError, RequestTracker, StageAgent, StageInput, TriagePipeline};

/// Builds a stage record around an arbitrary JSON payload.
fn record(stage: StageKind, payload: serde_json::Value) -> StageRecord {
    StageRecord {
        stage,
        agent: AgentDescriptor::new(AgentRole::for_stage(stage)),
        payload: AgentPayload::from_value(payload),
        execution_time: None,
    }
}

/// Builds a one-stage composite around an arbitrary JSON payload.
fn outcome_with(stage: StageKind, payload: serde_json::Value) -> TriageOutcome {
    TriageOutcome {
        raw: None,
        stages: vec![record(stage, payload)],
    }
}

/// Builds a normalized stage result with the given texts.
fn stage_result(role: AgentRole, text: &str, tool_output: Option<&str>) -> StageResult {
    StageResult {
        stage: match role {
            AgentRole::EquipmentIdentifier => StageKind::Identify,
            AgentRole::VoiceTranscriber => StageKind::Transcribe,
            AgentRole::DocumentSearcher => StageKind::Search,
        },
        role,
        agent_name: role.title().to_string(),
        text: text.to_string(),
        raw: format!("raw form of {}", role.title()),
        tool_output: tool_output.map(str::to_string),
        execution_time: None,
    }
}

// ── Normalizer: primary-text extraction ──────────────────────────────

#[test]
fn priority_field_wins_over_raw() {
    let result = normalize(&outcome_with(
        StageKind::Identify,
        json!({"output": "occluded", "raw": "fallback"}),
    ));
    assert_eq!(result.stages[0].text, "occluded");
}

#[test]
fn field_probe_order_is_stable() {
    let result = normalize(&outcome_with(
        StageKind::Search,
        json!({"content": "last", "result": "second", "final_answer": "fifth"}),
    ));
    assert_eq!(result.stages[0].text, "second");
}

#[test]
fn list_valued_field_joins_with_newlines() {
    let result = normalize(&outcome_with(
        StageKind::Search,
        json!({"output": ["step one", "step two", 3]}),
    ));
    assert_eq!(result.stages[0].text, "step one\nstep two\n3");
}

#[test]
fn bare_text_payload_is_its_own_primary() {
    let result = normalize(&outcome_with(StageKind::Transcribe, json!("  pump is leaking  ")));
    assert_eq!(result.stages[0].text, "pump is leaking");
}

#[test]
fn unknown_shape_falls_back_to_string_form() {
    let result = normalize(&outcome_with(
        StageKind::Identify,
        json!({"confidence": 0.93}),
    ));
    assert_eq!(result.stages[0].text, r#"{"confidence":0.93}"#);
}

// ── Normalizer: tool-output channel ──────────────────────────────────

#[test]
fn empty_primary_substitutes_tool_output() {
    let result = normalize(&outcome_with(
        StageKind::Search,
        json!({"output": "   ", "tool_outputs": ["Valve found in manual 3"]}),
    ));
    assert_eq!(result.stages[0].text, "Valve found in manual 3");
    assert_eq!(
        result.stages[0].tool_output.as_deref(),
        Some("Valve found in manual 3")
    );
}

#[test]
fn bare_fence_marker_substitutes_tool_output() {
    let result = normalize(&outcome_with(
        StageKind::Search,
        json!({"output": "```", "tool_results": [{"content": "see page 12"}]}),
    ));
    assert_eq!(result.stages[0].text, "see page 12");
}

#[test]
fn tool_entries_probe_content_keys_in_order() {
    let payload = AgentPayload::from_value(json!({
        "output": "  ",
        "tool_outputs": [
            {"text": "from text key", "result": "from result key"},
            "bare entry",
        ],
    }));
    let resolved = resolve_payload(&payload);
    // "result" outranks "text" within one entry; bare entries pass through.
    assert_eq!(resolved.text, "from result key\nbare entry");
}

#[test]
fn later_channels_are_probed_when_earlier_yield_nothing() {
    let payload = AgentPayload::from_value(json!({
        "tool_outputs": [],
        "tool_results": [{"output": "found it"}],
    }));
    let resolved = resolve_payload(&payload);
    assert_eq!(resolved.tool_output.as_deref(), Some("found it"));
}

// ── Normalizer: code fences ──────────────────────────────────────────

#[test]
fn fence_extraction_skips_language_tagged_segments() {
    let result = normalize(&outcome_with(
        StageKind::Identify,
        json!("```python\nSKIP\n```\nPUMP-100"),
    ));
    assert_eq!(result.stages[0].text, "PUMP-100");
}

#[test]
fn untagged_fenced_block_is_preferred() {
    let result = normalize(&outcome_with(
        StageKind::Search,
        json!("prefix\n```\nReplace the seal.\n```\nsuffix"),
    ));
    assert_eq!(result.stages[0].text, "Replace the seal.");
}

#[test]
fn text_without_usable_fence_is_kept() {
    let result = normalize(&outcome_with(StageKind::Search, json!("```txt\nonly tagged\n```")));
    // Every segment is tagged or empty, so the original text survives.
    assert_eq!(result.stages[0].text, "```txt\nonly tagged\n```");
}

// ── Normalizer: composite-level behavior ─────────────────────────────

#[test]
fn normalization_is_idempotent() {
    let outcome = TriageOutcome {
        raw: Some("final".to_string()),
        stages: vec![
            record(StageKind::Identify, json!({"output": "PUMP-100"})),
            record(StageKind::Transcribe, json!("strange noise")),
        ],
    };
    assert_eq!(normalize(&outcome), normalize(&outcome));
}

#[test]
fn final_answer_prefers_designated_raw() {
    let outcome = TriageOutcome {
        raw: Some("the answer".to_string()),
        stages: Vec::new(),
    };
    assert_eq!(normalize(&outcome).final_answer, "the answer");
}

#[test]
fn final_answer_falls_back_to_string_form() {
    let result = normalize_value(&json!({"stages": []}));
    assert_eq!(result.final_answer, r#"{"stages":[]}"#);
}

#[test]
fn agent_transcripts_accumulate_in_order() {
    let outcome = TriageOutcome {
        raw: None,
        stages: vec![
            record(StageKind::Identify, json!({"output": "PUMP-100"})),
            record(StageKind::Transcribe, json!("noise")),
            record(StageKind::Identify, json!({"output": "second pass"})),
        ],
    };
    let result = normalize(&outcome);
    assert_eq!(result.agent_outputs.len(), 2);
    assert_eq!(result.agent_outputs[0].agent_name, "Equipment Identifier");
    assert_eq!(result.agent_outputs[0].texts, vec!["PUMP-100", "second pass"]);
}

#[test]
fn execution_times_sum_and_zero_is_omitted() {
    let mut timed = record(StageKind::Identify, json!({"output": "x"}));
    timed.execution_time = Some(Duration::from_millis(400));
    let mut timed2 = record(StageKind::Transcribe, json!("y"));
    timed2.execution_time = Some(Duration::from_millis(600));
    let untimed = record(StageKind::Search, json!({"output": "z"}));

    let outcome = TriageOutcome {
        raw: None,
        stages: vec![timed, timed2, untimed],
    };
    let result = normalize(&outcome);
    assert_eq!(result.total_execution_time, Some(Duration::from_millis(1000)));

    let unmeasured = outcome_with(StageKind::Identify, json!({"output": "x"}));
    assert_eq!(normalize(&unmeasured).total_execution_time, None);
}

#[test]
fn malformed_composite_degrades_instead_of_failing() {
    let result = normalize_value(&json!({"nothing": "expected"}));
    assert!(result.stages.is_empty());
    assert!(result.agent_outputs.is_empty());
    assert!(result.formatting_error.is_some());
    assert_eq!(result.final_answer, r#"{"nothing":"expected"}"#);
}

#[test]
fn malformed_stage_record_degrades_instead_of_failing() {
    let result = normalize_value(&json!({
        "raw": "partial answer",
        "stages": [{"bogus": true}],
    }));
    assert!(result.stages.is_empty());
    assert!(result.formatting_error.is_some());
    assert_eq!(result.final_answer, "partial answer");
}

#[test]
fn empty_outcome_normalizes_cleanly() {
    let result = normalize(&TriageOutcome::default());
    assert!(result.stages.is_empty());
    assert!(result.formatting_error.is_none());
}

// ── Formatter ────────────────────────────────────────────────────────

#[test]
fn empty_result_keeps_all_default_slots() {
    let record = display_record(&AggregatedResult::new("answer"));
    assert_eq!(record.equipment, DEFAULT_EQUIPMENT);
    assert_eq!(record.issue, DEFAULT_ISSUE);
    assert_eq!(record.solution, DEFAULT_SOLUTION);
}

#[test]
fn null_token_falls_back_to_tool_output() {
    let mut result = AggregatedResult::new("answer");
    result
        .stages
        .push(stage_result(AgentRole::DocumentSearcher, "none", Some("Valve found")));
    assert_eq!(display_record(&result).solution, "Valve found");
}

#[test]
fn null_token_without_tool_output_uses_raw_form() {
    let mut result = AggregatedResult::new("answer");
    result
        .stages
        .push(stage_result(AgentRole::VoiceTranscriber, "NULL", None));
    assert_eq!(
        display_record(&result).issue,
        "raw form of Voice Transcriber"
    );
}

#[test]
fn equipment_slot_takes_first_line_only() {
    let mut result = AggregatedResult::new("answer");
    result.stages.push(stage_result(
        AgentRole::EquipmentIdentifier,
        "Centrifugal pump P-100\nManufactured 2011",
        None,
    ));
    assert_eq!(display_record(&result).equipment, "Centrifugal pump P-100");
}

#[test]
fn slots_key_on_role_not_position() {
    let mut result = AggregatedResult::new("answer");
    // Search result first; it must still land in the solution slot.
    result
        .stages
        .push(stage_result(AgentRole::DocumentSearcher, "tighten the gland", None));
    result
        .stages
        .push(stage_result(AgentRole::EquipmentIdentifier, "PUMP-100", None));

    let record = display_record(&result);
    assert_eq!(record.solution, "tighten the gland");
    assert_eq!(record.equipment, "PUMP-100");
    assert_eq!(record.issue, DEFAULT_ISSUE);
}

#[test]
fn display_lines_have_fixed_order() {
    let mut result = AggregatedResult::new("answer");
    result
        .stages
        .push(stage_result(AgentRole::EquipmentIdentifier, "PUMP-100", None));
    let response = TriageResponse::success("req-1", result);

    let lines = format_for_display(&response);
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "Analysis complete");
    assert_eq!(lines[1], "Equipment: PUMP-100");
    assert_eq!(lines[2], format!("Issue: {}", DEFAULT_ISSUE));
    assert_eq!(lines[3], format!("Solution: {}", DEFAULT_SOLUTION));
}

#[test]
fn error_response_yields_single_error_line() {
    let response = TriageResponse::failure("req-1", "identify stage failed: no such file");
    let lines = format_for_display(&response);
    assert_eq!(lines, vec!["Error: identify stage failed: no such file"]);
}

#[test]
fn export_joins_with_blank_lines() {
    let lines = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    assert_eq!(export_text(&lines), "a\n\nb\n\nc");
}

#[test]
fn summary_counts_stages_and_time() {
    let mut result = AggregatedResult::new("answer");
    result
        .stages
        .push(stage_result(AgentRole::EquipmentIdentifier, "PUMP-100", None));
    result.total_execution_time = Some(Duration::from_millis(2500));
    let response = TriageResponse::success("req-1", result);
    assert_eq!(summarize(&response), "Successfully processed 1 stages in 2.50 seconds");

    let failed = TriageResponse::failure("req-2", "boom");
    assert_eq!(summarize(&failed), "Processing failed: boom");
}

// ── Request tracker ──────────────────────────────────────────────────

#[test]
fn submit_creates_processing_record() {
    let tracker = RequestTracker::new();
    let id = tracker.submit();

    let record = tracker.get(&id).expect("record should exist");
    assert_eq!(record.id, id);
    assert_eq!(record.status, aura_types::RequestStatus::Processing);
    assert!(record.current_stage.is_none());
}

#[test]
fn unknown_id_returns_none() {
    let tracker = RequestTracker::new();
    assert!(tracker.get("req-unknown").is_none());
}

#[test]
fn terminal_transitions_attach_result_or_error() {
    let tracker = RequestTracker::new();

    let done = tracker.submit();
    tracker.complete(&done, AggregatedResult::new("answer"));
    let record = tracker.get(&done).expect("record");
    assert_eq!(record.status, aura_types::RequestStatus::Completed);
    assert_eq!(record.result.as_ref().map(|r| r.final_answer.as_str()), Some("answer"));

    let failed = tracker.submit();
    tracker.fail(&failed, "identify stage failed");
    let record = tracker.get(&failed).expect("record");
    assert_eq!(record.status, aura_types::RequestStatus::Error);
    assert_eq!(record.error.as_deref(), Some("identify stage failed"));
}

#[test]
fn concurrent_submits_produce_distinct_live_entries() {
    let tracker = RequestTracker::new();
    let mut handles = Vec::new();

    for _ in 0..32 {
        let tracker = tracker.clone();
        handles.push(std::thread::spawn(move || tracker.submit()));
    }

    let ids: Vec<String> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread should not panic"))
        .collect();

    let unique: std::collections::HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), 32);
    assert_eq!(tracker.len(), 32);
    for id in &ids {
        assert!(tracker.get(id).is_some());
    }
}

#[test]
fn clear_is_explicit_and_total() {
    let tracker = RequestTracker::new();
    tracker.submit();
    tracker.submit();
    assert_eq!(tracker.clear(), 2);
    assert!(tracker.is_empty());
}

// ── Orchestrator ─────────────────────────────────────────────────────

/// What a scripted agent does when invoked.
enum Script {
    Reply(serde_json::Value),
    EchoQuery,
    Fail,
    Sleep(Duration),
}

struct ScriptedAgent {
    stage: StageKind,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAgent {
    fn new(stage: StageKind, script: Script) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let agent = Arc::new(Self {
            stage,
            script,
            calls: calls.clone(),
        });
        (agent, calls)
    }
}

#[async_trait]
impl StageAgent for ScriptedAgent {
    fn stage(&self) -> StageKind {
        self.stage
    }

    fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor::new(AgentRole::for_stage(self.stage))
    }

    async fn invoke(&self, input: StageInput<'_>) -> Result<AgentPayload, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Reply(value) => Ok(AgentPayload::from_value(value.clone())),
            Script::EchoQuery => match input {
                StageInput::Query {
                    equipment,
                    transcript,
                } => Ok(AgentPayload::Text(format!("{} | {}", equipment, transcript))),
                StageInput::Media(_) => Err(AgentError::Input("expected query".to_string())),
            },
            Script::Fail => Err(AgentError::Vision("camera obscura".to_string())),
            Script::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(AgentPayload::Text("late".to_string()))
            }
        }
    }
}

fn pipeline_of(
    identify: Arc<ScriptedAgent>,
    transcribe: Arc<ScriptedAgent>,
    search: Arc<ScriptedAgent>,
    timeout: Duration,
) -> TriagePipeline {
    TriagePipeline::new(identify, transcribe, search, timeout)
}

#[tokio::test]
async fn pipeline_threads_context_into_retrieval() {
    let (identify, _) =
        ScriptedAgent::new(StageKind::Identify, Script::Reply(json!({"output": "PUMP-100"})));
    let (transcribe, _) =
        ScriptedAgent::new(StageKind::Transcribe, Script::Reply(json!("grinding noise")));
    let (search, _) = ScriptedAgent::new(StageKind::Search, Script::EchoQuery);

    let tracker = RequestTracker::new();
    let id = tracker.submit();
    let pipeline = pipeline_of(identify, transcribe, search, Duration::from_secs(5));

    let outcome = pipeline
        .run(&tracker, &id, std::path::Path::new("a.jpg"), std::path::Path::new("b.wav"))
        .await
        .expect("pipeline should succeed");

    assert_eq!(outcome.stages.len(), 3);
    assert_eq!(outcome.raw.as_deref(), Some("PUMP-100 | grinding noise"));
    assert_eq!(
        outcome.stages.iter().map(|s| s.stage).collect::<Vec<_>>(),
        StageKind::ALL.to_vec()
    );
    assert!(outcome.stages.iter().all(|s| s.execution_time.is_some()));

    let record = tracker.get(&id).expect("record");
    assert_eq!(record.current_stage, Some(StageKind::Search));
}

#[tokio::test]
async fn first_stage_failure_stops_the_run() {
    let (identify, identify_calls) = ScriptedAgent::new(StageKind::Identify, Script::Fail);
    let (transcribe, transcribe_calls) =
        ScriptedAgent::new(StageKind::Transcribe, Script::Reply(json!("unused")));
    let (search, search_calls) = ScriptedAgent::new(StageKind::Search, Script::EchoQuery);

    let tracker = RequestTracker::new();
    let id = tracker.submit();
    let pipeline = pipeline_of(identify, transcribe, search, Duration::from_secs(5));

    let error = pipeline
        .run(&tracker, &id, std::path::Path::new("a.jpg"), std::path::Path::new("b.wav"))
        .await
        .expect_err("pipeline should fail");

    assert_eq!(error.stage(), StageKind::Identify);
    assert_eq!(identify_calls.load(Ordering::SeqCst), 1);
    assert_eq!(transcribe_calls.load(Ordering::SeqCst), 0);
    assert_eq!(search_calls.load(Ordering::SeqCst), 0);

    let record = tracker.get(&id).expect("record");
    assert_eq!(record.current_stage, Some(StageKind::Identify));
}

#[tokio::test]
async fn elapsed_budget_becomes_a_stage_timeout() {
    let (identify, _) = ScriptedAgent::new(
        StageKind::Identify,
        Script::Sleep(Duration::from_millis(200)),
    );
    let (transcribe, transcribe_calls) =
        ScriptedAgent::new(StageKind::Transcribe, Script::Reply(json!("unused")));
    let (search, _) = ScriptedAgent::new(StageKind::Search, Script::EchoQuery);

    let tracker = RequestTracker::new();
    let id = tracker.submit();
    let pipeline = pipeline_of(identify, transcribe, search, Duration::from_millis(20));

    let error = pipeline
        .run(&tracker, &id, std::path::Path::new("a.jpg"), std::path::Path::new("b.wav"))
        .await
        .expect_err("pipeline should time out");

    assert!(matches!(error, PipelineError::StageTimeout { stage: StageKind::Identify, .. }));
    assert_eq!(transcribe_calls.load(Ordering::SeqCst), 0);
}
