//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

use aura_agents::{RetrievalConfig, SttConfig, VisionConfig};

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upload storage settings.
    #[serde(default)]
    pub uploads: UploadConfig,

    /// Pipeline execution settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Vision-identification provider settings.
    #[serde(default)]
    pub vision: VisionConfig,

    /// Speech-to-text provider settings.
    #[serde(default)]
    pub stt: SttConfig,

    /// Document-retrieval sidecar settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "aura_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Upload storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory for uploaded media files.
    #[serde(default = "default_upload_dir")]
    pub dir: String,
}

/// Pipeline execution configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Per-stage timeout budget in seconds.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_stage_timeout_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: default_stage_timeout_secs(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `AURA_HOST` overrides `server.host`
/// - `AURA_PORT` overrides `server.port`
/// - `AURA_LOG_LEVEL` overrides `logging.level`
/// - `AURA_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `AURA_UPLOAD_DIR` overrides `uploads.dir`
/// - `AURA_STAGE_TIMEOUT_SECS` overrides `pipeline.stage_timeout_secs`
/// - `AURA_VISION_API_URL` / `AURA_VISION_API_KEY` / `AURA_VISION_MODEL`
///   override the vision provider settings
/// - `AURA_STT_BINARY` / `AURA_STT_MODEL` override the STT settings
/// - `AURA_RETRIEVAL_ENDPOINT` / `AURA_CORPUS_DIR` override the retrieval
///   settings
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("AURA_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("AURA_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(level) = std::env::var("AURA_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("AURA_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(dir) = std::env::var("AURA_UPLOAD_DIR") {
        config.uploads.dir = dir;
    }
    if let Ok(secs) = std::env::var("AURA_STAGE_TIMEOUT_SECS") {
        if let Ok(parsed) = secs.parse() {
            config.pipeline.stage_timeout_secs = parsed;
        }
    }
    if let Ok(url) = std::env::var("AURA_VISION_API_URL") {
        config.vision.api_url = url;
    }
    if let Ok(key) = std::env::var("AURA_VISION_API_KEY") {
        config.vision.api_key = key;
    }
    if let Ok(model) = std::env::var("AURA_VISION_MODEL") {
        config.vision.model = model;
    }
    if let Ok(binary) = std::env::var("AURA_STT_BINARY") {
        config.stt.binary_path = binary;
    }
    if let Ok(model) = std::env::var("AURA_STT_MODEL") {
        config.stt.model_path = model;
    }
    if let Ok(endpoint) = std::env::var("AURA_RETRIEVAL_ENDPOINT") {
        config.retrieval.endpoint = endpoint;
    }
    if let Ok(dir) = std::env::var("AURA_CORPUS_DIR") {
        config.retrieval.corpus_dir = dir;
    }

    Ok(config)
}
