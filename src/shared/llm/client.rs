use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::json;
use std::time::Duration;

use crate::core::config::LlmConfig;
use crate::core::error::{AppError, Result};

/// User-turn content for a completion request. The audio variant maps
/// to the multimodal `input_audio` content part, so voice transcripts
/// and raw recordings go through the identical prompt.
pub enum UserContent {
    Text(String),
    Audio { bytes: Vec<u8>, mime_type: String },
}

/// Thin client for an OpenAI-compatible chat completions endpoint.
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Run a single system+user completion and return the raw text.
    pub async fn complete(&self, system: &str, user: UserContent) -> Result<String> {
        let user_content = match user {
            UserContent::Text(text) => json!(text),
            UserContent::Audio { bytes, mime_type } => {
                let format = audio_format(&mime_type);
                json!([{
                    "type": "input_audio",
                    "input_audio": {
                        "data": BASE64.encode(&bytes),
                        "format": format,
                    }
                }])
            }
        };

        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user_content },
            ],
        });

        let url = format!("{}/chat/completions", self.config.api_base);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("LLM request failed: {:?}", e);
                AppError::ExternalServiceError(format!("LLM request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::error!("LLM API error: HTTP {} - {}", status, text);
            return Err(AppError::ExternalServiceError(format!(
                "LLM API returned HTTP {}",
                status
            )));
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse LLM response envelope: {:?}", e);
            AppError::ExternalServiceError(format!("Invalid LLM response: {}", e))
        })?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::ExternalServiceError("LLM response has no message content".to_string())
            })
    }
}

/// Map a MIME type to the completion API's audio format tag.
fn audio_format(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        _ => "mp3",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_types_map_to_api_formats() {
        assert_eq!(audio_format("audio/wav"), "wav");
        assert_eq!(audio_format("audio/x-wav"), "wav");
        assert_eq!(audio_format("audio/mpeg"), "mp3");
        assert_eq!(audio_format("application/octet-stream"), "mp3");
    }
}
