//! Sequential orchestration of the three pipeline stages.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use aura_types::{AgentDescriptor, AgentError, AgentPayload, StageKind, StageRecord, TriageOutcome};

use crate::error::PipelineError;
use crate::normalize;
use crate::tracker::RequestTracker;

/// Input handed to a stage executor.
#[derive(Debug, Clone, Copy)]
pub enum StageInput<'a> {
    /// Path to a validated media file on local disk (vision, transcription).
    Media(&'a Path),
    /// Combined upstream context for the retrieval stage.
    Query {
        /// The identification stage's primary text.
        equipment: &'a str,
        /// The transcription stage's primary text.
        transcript: &'a str,
    },
}

/// One stage executor: wraps a single external capability behind a uniform
/// call contract. Fail-fast; retries, if any, belong to the provider.
#[async_trait]
pub trait StageAgent: Send + Sync {
    /// The stage this agent serves.
    fn stage(&self) -> StageKind;

    /// Identity attached to every record this agent produces.
    fn descriptor(&self) -> AgentDescriptor;

    /// Invokes the underlying capability provider.
    async fn invoke(&self, input: StageInput<'_>) -> Result<AgentPayload, AgentError>;
}

/// The sequential triage pipeline.
///
/// Runs identify → transcribe → search in strict order: a stage starts only
/// after the previous one returned successfully, and the retrieval stage
/// receives both upstream primary texts as query context. Any stage failure
/// (including an elapsed timeout budget) stops the run with the triggering
/// stage recorded; the remaining stages never execute.
pub struct TriagePipeline {
    identify: Arc<dyn StageAgent>,
    transcribe: Arc<dyn StageAgent>,
    search: Arc<dyn StageAgent>,
    stage_timeout: Duration,
}

impl TriagePipeline {
    /// Assembles a pipeline from its three stage executors and the
    /// per-stage timeout budget.
    pub fn new(
        identify: Arc<dyn StageAgent>,
        transcribe: Arc<dyn StageAgent>,
        search: Arc<dyn StageAgent>,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            identify,
            transcribe,
            search,
            stage_timeout,
        }
    }

    /// Runs the full pipeline for one tracked request.
    ///
    /// Updating the tracked request's `current_stage` before each stage call
    /// is the only mutation of request state during execution; terminal
    /// transitions stay with the caller.
    pub async fn run(
        &self,
        tracker: &RequestTracker,
        request_id: &str,
        image_path: &Path,
        audio_path: &Path,
    ) -> Result<TriageOutcome, PipelineError> {
        let mut stages = Vec::with_capacity(StageKind::ALL.len());

        let identify = self
            .run_stage(&*self.identify, StageInput::Media(image_path), tracker, request_id)
            .await?;
        let equipment = normalize::primary_text(&identify.payload);
        stages.push(identify);

        let transcribe = self
            .run_stage(&*self.transcribe, StageInput::Media(audio_path), tracker, request_id)
            .await?;
        let transcript = normalize::primary_text(&transcribe.payload);
        stages.push(transcribe);

        let search = self
            .run_stage(
                &*self.search,
                StageInput::Query {
                    equipment: &equipment,
                    transcript: &transcript,
                },
                tracker,
                request_id,
            )
            .await?;
        let raw = normalize::primary_text(&search.payload);
        stages.push(search);

        Ok(TriageOutcome {
            raw: Some(raw),
            stages,
        })
    }

    async fn run_stage(
        &self,
        agent: &dyn StageAgent,
        input: StageInput<'_>,
        tracker: &RequestTracker,
        request_id: &str,
    ) -> Result<StageRecord, PipelineError> {
        let stage = agent.stage();
        tracker.advance(request_id, stage);
        tracing::info!(stage = stage.as_str(), request_id, "running stage");

        let started = Instant::now();
        let payload = match tokio::time::timeout(self.stage_timeout, agent.invoke(input)).await {
            Ok(Ok(payload)) => payload,
            Ok(Err(source)) => {
                tracing::warn!(stage = stage.as_str(), request_id, error = %source, "stage failed");
                return Err(PipelineError::Stage { stage, source });
            }
            Err(_) => {
                tracing::warn!(
                    stage = stage.as_str(),
                    request_id,
                    budget_secs = self.stage_timeout.as_secs(),
                    "stage timed out"
                );
                return Err(PipelineError::StageTimeout {
                    stage,
                    budget: self.stage_timeout,
                });
            }
        };

        let elapsed = started.elapsed();
        tracing::info!(
            stage = stage.as_str(),
            request_id,
            elapsed_ms = elapsed.as_millis() as u64,
            "stage completed"
        );

        Ok(StageRecord {
            stage,
            agent: agent.descriptor(),
            payload,
            execution_time: Some(elapsed),
        })
    }
}
