//! Vision identification via an OpenAI-compatible chat endpoint.

use std::path::Path;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use aura_pipeline::{StageAgent, StageInput};
use aura_types::{AgentDescriptor, AgentError, AgentPayload, AgentRole, StageKind};

use crate::config::VisionConfig;

/// Maximum image input size (10 MiB). Prevents oversized request bodies.
const MAX_IMAGE_INPUT_BYTES: u64 = 10 * 1024 * 1024;

/// The question posed to the vision model alongside the photo.
const VISION_PROMPT: &str = "What's the equipment in this image?";

/// Identifies the equipment in a photo by sending it, base64-encoded, to a
/// chat-completions endpoint with vision support.
#[derive(Debug, Clone)]
pub struct VisionAgent {
    client: reqwest::Client,
    config: VisionConfig,
}

impl VisionAgent {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn identify(&self, image_path: &Path) -> Result<AgentPayload, AgentError> {
        if self.config.api_key.is_empty() {
            return Err(AgentError::Config(
                "vision api_key is not configured".to_string(),
            ));
        }

        let image = tokio::fs::read(image_path).await.map_err(|e| {
            AgentError::Vision(format!(
                "failed to read image {}: {}",
                image_path.display(),
                e
            ))
        })?;
        if image.len() as u64 > MAX_IMAGE_INPUT_BYTES {
            return Err(AgentError::Vision(format!(
                "image exceeds maximum size: {} bytes (limit: {} bytes)",
                image.len(),
                MAX_IMAGE_INPUT_BYTES
            )));
        }

        let body = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": VISION_PROMPT},
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:image/jpeg;base64,{}", BASE64.encode(&image)),
                        },
                    },
                ],
            }],
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Vision(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AgentError::Vision(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| AgentError::Vision(format!("unreadable provider reply: {}", e)))?;

        message_content(&reply)
    }
}

/// The assistant message content of a chat-completion reply: a plain string
/// for most providers, a list of content parts for some. Passed through as
/// a payload without reshaping.
fn message_content(reply: &Value) -> Result<AgentPayload, AgentError> {
    reply
        .pointer("/choices/0/message/content")
        .cloned()
        .map(AgentPayload::from_value)
        .ok_or_else(|| AgentError::Vision("provider reply has no message content".to_string()))
}

#[async_trait]
impl StageAgent for VisionAgent {
    fn stage(&self) -> StageKind {
        StageKind::Identify
    }

    fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor::new(AgentRole::EquipmentIdentifier)
    }

    async fn invoke(&self, input: StageInput<'_>) -> Result<AgentPayload, AgentError> {
        match input {
            StageInput::Media(path) => self.identify(path).await,
            StageInput::Query { .. } => Err(AgentError::Input(
                "identification expects a media path".to_string(),
            )),
        }
    }
}
