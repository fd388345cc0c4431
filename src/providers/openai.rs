use async_trait::async_trait;
use bytes::Bytes;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ToolError;
use crate::providers::{SpeechSynthesizer, VoiceSettings};

/// Client for the OpenAI speech endpoint
#[derive(Debug, Clone)]
pub struct OpenAiSynthesizer {
    /// HTTP client for making requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Base URL, e.g. "https://api.openai.com/v1"
    endpoint: String,
    /// Speech model, e.g. "tts-1"
    model: String,
}

/// Speech request body
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SpeechRequest {
    pub model: String,
    pub input: String,
    pub voice: String,
    pub speed: f32,
    pub response_format: String,
}

impl OpenAiSynthesizer {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout.unwrap_or(Duration::from_secs(120)))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.endpoint.trim_end_matches('/'))
    }

    pub fn build_request(&self, text: &str, voice: &VoiceSettings) -> SpeechRequest {
        SpeechRequest {
            model: self.model.clone(),
            input: text.to_string(),
            voice: voice.voice.clone(),
            // The endpoint accepts 0.25..=4.0
            speed: voice.speed.clamp(0.25, 4.0),
            response_format: "mp3".to_string(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceSettings, output: &Path) -> Result<PathBuf, ToolError> {
        let request = self.build_request(text, voice);

        let response = self
            .client
            .post(self.speech_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI speech API error ({}): {}", status, error_text);
            return Err(ToolError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let audio: Bytes = response.bytes().await?;
        tokio::fs::write(output, &audio).await?;
        Ok(output.to_path_buf())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
