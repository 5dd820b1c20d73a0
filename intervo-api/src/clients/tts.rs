//! Text-to-speech client
//!
//! Synthesizes question audio delivered alongside `server:next-question`.

use async_trait::async_trait;
use intervo_common::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[async_trait]
pub trait TtsService: Send + Sync {
    /// Synthesize `text`, returning base64-encoded audio
    async fn generate(&self, text: &str) -> Result<String>;
}

pub struct HttpTtsService {
    http_client: Client,
    base_url: String,
}

impl HttpTtsService {
    pub fn new(base_url: String) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct TtsResponse {
    audio_base64: String,
}

#[async_trait]
impl TtsService for HttpTtsService {
    async fn generate(&self, text: &str) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/tts", self.base_url))
            .json(&TtsRequest { text })
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("TTS request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!("TTS returned {}", response.status())));
        }

        let body: TtsResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("TTS bad response: {}", e)))?;
        Ok(body.audio_base64)
    }
}
