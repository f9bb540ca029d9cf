//! Document retrieval via a search sidecar over a fixed corpus directory.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use aura_pipeline::{StageAgent, StageInput};
use aura_types::{AgentDescriptor, AgentError, AgentPayload, AgentRole, StageKind};

use crate::config::RetrievalConfig;

/// Request body for the sidecar's search endpoint.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    directory: &'a str,
}

/// Retrieves the most relevant answer from the document corpus.
///
/// The retrieval engine itself is a black box behind an HTTP endpoint; this
/// agent combines the two upstream texts into the query, attaches the
/// corpus directory handle, and passes the reply body through untouched —
/// reply field names vary between sidecar versions, and the normalizer's
/// probing chain handles all of them.
#[derive(Debug, Clone)]
pub struct RetrievalAgent {
    client: reqwest::Client,
    config: RetrievalConfig,
}

impl RetrievalAgent {
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn search(&self, equipment: &str, transcript: &str) -> Result<AgentPayload, AgentError> {
        let query = format!("Equipment: {}\nQuery: {}", equipment, transcript);
        let request = SearchRequest {
            query: &query,
            directory: &self.config.corpus_dir,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Retrieval(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AgentError::Retrieval(format!(
                "sidecar returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AgentError::Retrieval(format!("unreadable sidecar reply: {}", e)))?;

        Ok(AgentPayload::from_value(body))
    }
}

#[async_trait]
impl StageAgent for RetrievalAgent {
    fn stage(&self) -> StageKind {
        StageKind::Search
    }

    fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor::new(AgentRole::DocumentSearcher)
    }

    async fn invoke(&self, input: StageInput<'_>) -> Result<AgentPayload, AgentError> {
        match input {
            StageInput::Query {
                equipment,
                transcript,
            } => self.search(equipment, transcript).await,
            StageInput::Media(_) => Err(AgentError::Input(
                "retrieval expects upstream query context".to_string(),
            )),
        }
    }
}
