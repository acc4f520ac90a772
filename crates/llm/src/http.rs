use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::TextModelConfig;
use crate::error::LlmError;
use crate::generator::TextGenerator;

/// HTTP-based text generator using an OpenAI-compatible chat
/// completions API with JSON response format.
#[derive(Debug)]
pub struct HttpTextGenerator {
    client: reqwest::Client,
    config: TextModelConfig,
}

impl HttpTextGenerator {
    /// Create a new HTTP generator with the given configuration.
    pub fn new(config: TextModelConfig) -> Result<Self, LlmError> {
        if config.endpoint.is_empty() || config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "text model endpoint and api key are required".to_owned(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
    ) -> Result<String, LlmError> {
        let request_body = json!({
            "model": self.config.model,
            "temperature": temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                {
                    "role": "system",
                    "content": system,
                },
                {
                    "role": "user",
                    "content": user,
                }
            ]
        });

        debug!(endpoint = %self.config.endpoint, model = %self.config.model, "sending text generation request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_seconds)
                } else {
                    LlmError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "text model API returned error");
            return Err(LlmError::Api(format!("HTTP {status}: {body}")));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("failed to parse API response: {e}")))?;

        // Extract the content from the chat completions response format.
        let content = response_json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                LlmError::Parse(format!("unexpected response format: {response_json}"))
            })?;

        Ok(content.to_owned())
    }
}
