//! Speech-to-text token issuance
//!
//! Issues short-lived client secrets for the realtime transcription service;
//! the token is handed to the browser with each `server:next-question`.

use async_trait::async_trait;
use intervo_common::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[async_trait]
pub trait SttTokenIssuer: Send + Sync {
    /// Issue a transcription token for one session/user pair
    async fn issue(&self, session_id: Uuid, user_id: Uuid) -> Result<String>;
}

pub struct HttpSttTokenIssuer {
    http_client: Client,
    token_url: String,
    api_key: String,
}

impl HttpSttTokenIssuer {
    pub fn new(token_url: String, api_key: String) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            token_url,
            api_key,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    value: String,
}

#[async_trait]
impl SttTokenIssuer for HttpSttTokenIssuer {
    async fn issue(&self, session_id: Uuid, _user_id: Uuid) -> Result<String> {
        // semantic_vad turn detection performs best for interview answers
        let body = json!({
            "session": {
                "type": "transcription",
                "audio": {
                    "input": {
                        "transcription": { "model": "gpt-4o-transcribe" },
                        "turn_detection": { "type": "semantic_vad" }
                    }
                }
            }
        });

        let response = self
            .http_client
            .post(&self.token_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("STT token request failed for {}: {}", session_id, e)))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "STT token endpoint returned {} for {}",
                response.status(),
                session_id
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("STT token bad response: {}", e)))?;
        Ok(token.value)
    }
}
