//! Configuration resolution for intervo-api
//!
//! Two-tier resolution with ENV → TOML priority: every field can be set in
//! the TOML file (path from `INTERVO_CONFIG`, default `intervo.toml`) and
//! overridden through an `INTERVO_*` environment variable.

use intervo_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP/WebSocket bind address
    pub bind_addr: String,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Secret mixed into the handshake token digest
    pub shared_secret: String,
    /// AI gateway base URL
    pub ai_base_url: String,
    /// Per-request timeout for AI gateway calls (seconds)
    pub ai_timeout_secs: u64,
    /// Directory uploaded files are stored under
    pub storage_dir: PathBuf,
    /// Public URL prefix uploaded files are served from
    pub public_base_url: String,
    /// Text-to-speech service base URL
    pub tts_base_url: String,
    /// Speech-to-text token issuance endpoint
    pub stt_token_url: String,
    /// API key for the STT token endpoint
    pub stt_api_key: String,
    /// Minimum interval between TTL refreshes per connection (seconds)
    pub ttl_refresh_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:4100".to_string(),
            database_path: PathBuf::from("intervo.db"),
            shared_secret: String::new(),
            ai_base_url: "http://127.0.0.1:8000".to_string(),
            ai_timeout_secs: 30,
            storage_dir: PathBuf::from("uploads"),
            public_base_url: "http://127.0.0.1:4100/uploads".to_string(),
            tts_base_url: "http://127.0.0.1:8001".to_string(),
            stt_token_url: "https://api.openai.com/v1/realtime/client_secrets".to_string(),
            stt_api_key: String::new(),
            ttl_refresh_interval_secs: 300,
        }
    }
}

impl Config {
    /// Load configuration: TOML file (if present), then ENV overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var("INTERVO_CONFIG").unwrap_or_else(|_| "intervo.toml".to_string());
        let mut config = Self::from_toml(Path::new(&path))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_toml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("INTERVO_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Ok(v) = std::env::var("INTERVO_DATABASE_PATH") {
            self.database_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("INTERVO_SHARED_SECRET") {
            self.shared_secret = v;
        }
        if let Ok(v) = std::env::var("INTERVO_AI_BASE_URL") {
            self.ai_base_url = v;
        }
        if let Ok(v) = std::env::var("INTERVO_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("INTERVO_PUBLIC_BASE_URL") {
            self.public_base_url = v;
        }
        if let Ok(v) = std::env::var("INTERVO_TTS_BASE_URL") {
            self.tts_base_url = v;
        }
        if let Ok(v) = std::env::var("INTERVO_STT_API_KEY") {
            self.stt_api_key = v;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.shared_secret.trim().is_empty() {
            return Err(Error::Config(
                "shared_secret not configured. Set INTERVO_SHARED_SECRET or add \
                 shared_secret to intervo.toml"
                    .to_string(),
            ));
        }
        if self.ttl_refresh_interval_secs == 0 {
            return Err(Error::Config("ttl_refresh_interval_secs must be > 0".to_string()));
        }
        Ok(())
    }
}
