//! Speech-to-text transcription via a local whisper.cpp binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use aura_pipeline::{StageAgent, StageInput};
use aura_types::{AgentDescriptor, AgentError, AgentPayload, AgentRole, StageKind};

use crate::config::SttConfig;

/// Maximum audio input size for STT (25 MiB). Prevents OOM from oversized
/// recordings.
const MAX_STT_INPUT_BYTES: u64 = 25 * 1024 * 1024;

/// Timeout for STT process execution.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// Transcribes a recorded voice note by invoking whisper.cpp on the audio
/// file and capturing its stdout.
#[derive(Debug, Clone)]
pub struct TranscriberAgent {
    binary_path: PathBuf,
    model_path: PathBuf,
}

impl TranscriberAgent {
    pub fn new(config: &SttConfig) -> Self {
        Self {
            binary_path: PathBuf::from(&config.binary_path),
            model_path: PathBuf::from(&config.model_path),
        }
    }

    async fn transcribe(&self, audio_path: &Path) -> Result<AgentPayload, AgentError> {
        let metadata = tokio::fs::metadata(audio_path).await.map_err(|e| {
            AgentError::Stt(format!(
                "failed to stat audio file {}: {}",
                audio_path.display(),
                e
            ))
        })?;
        if metadata.len() > MAX_STT_INPUT_BYTES {
            return Err(AgentError::Stt(format!(
                "audio file exceeds maximum size: {} bytes (limit: {} bytes)",
                metadata.len(),
                MAX_STT_INPUT_BYTES
            )));
        }

        // Standard whisper.cpp arguments:
        // -m <model_path>: path to the GGML model
        // -f <file>: input audio file
        // -nt: no timestamps, plain transcription text on stdout
        let mut command = Command::new(&self.binary_path);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg(audio_path)
            .arg("-nt")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command
            .spawn()
            .map_err(|e| AgentError::Stt(format!("failed to spawn STT binary: {}", e)))?;

        let output = tokio::time::timeout(STT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                AgentError::Stt(format!(
                    "STT process timed out after {} seconds",
                    STT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| AgentError::Stt(format!("failed to read STT output: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AgentError::Stt(format!("STT binary failed: {}", stderr)));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(AgentPayload::Text(text))
    }
}

#[async_trait]
impl StageAgent for TranscriberAgent {
    fn stage(&self) -> StageKind {
        StageKind::Transcribe
    }

    fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor::new(AgentRole::VoiceTranscriber)
    }

    async fn invoke(&self, input: StageInput<'_>) -> Result<AgentPayload, AgentError> {
        match input {
            StageInput::Media(path) => self.transcribe(path).await,
            StageInput::Query { .. } => Err(AgentError::Input(
                "transcription expects a media path".to_string(),
            )),
        }
    }
}
