//! Stage executors for the Aura triage pipeline.
//!
//! Each executor wraps one external capability provider behind the
//! [`aura_pipeline::StageAgent`] contract: vision identification calls an
//! OpenAI-compatible chat endpoint with the photo attached, transcription
//! shells out to a local whisper.cpp binary, and retrieval queries a
//! document-search sidecar over a fixed corpus directory.
//!
//! Executors are fail-fast: the first provider failure propagates to the
//! orchestrator untouched. Reply payloads keep whatever shape the provider
//! produced; making sense of them is the normalizer's job.

pub mod config;
pub mod retrieval;
pub mod stt;
pub mod validate;
pub mod vision;

pub use config::{RetrievalConfig, SttConfig, VisionConfig};
pub use retrieval::RetrievalAgent;
pub use stt::TranscriberAgent;
pub use validate::{validate_media, MAX_AUDIO_BYTES, MAX_IMAGE_BYTES};
pub use vision::VisionAgent;
