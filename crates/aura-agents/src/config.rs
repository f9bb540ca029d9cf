//! Provider configuration for the stage executors.

use serde::{Deserialize, Serialize};
use std::fmt;

fn default_vision_api_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_vision_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".to_string()
}

fn default_stt_binary() -> String {
    "whisper-cli".to_string()
}

fn default_stt_model() -> String {
    "models/ggml-base.en.bin".to_string()
}

fn default_retrieval_endpoint() -> String {
    "http://127.0.0.1:8900/search".to_string()
}

fn default_corpus_dir() -> String {
    "database".to_string()
}

/// Configuration for the vision-identification provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// OpenAI-compatible chat-completions endpoint.
    #[serde(default = "default_vision_api_url")]
    pub api_url: String,
    /// Bearer token for the endpoint.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Model identifier sent with each request.
    #[serde(default = "default_vision_model")]
    pub model: String,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_url: default_vision_api_url(),
            api_key: String::new(),
            model: default_vision_model(),
        }
    }
}

impl fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Configuration for the local speech-to-text provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// Path to the whisper.cpp binary.
    #[serde(default = "default_stt_binary")]
    pub binary_path: String,
    /// Path to the GGML model file.
    #[serde(default = "default_stt_model")]
    pub model_path: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            binary_path: default_stt_binary(),
            model_path: default_stt_model(),
        }
    }
}

/// Configuration for the document-retrieval sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// The sidecar's search endpoint.
    #[serde(default = "default_retrieval_endpoint")]
    pub endpoint: String,
    /// The corpus directory handle passed with every query.
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: default_retrieval_endpoint(),
            corpus_dir: default_corpus_dir(),
        }
    }
}
