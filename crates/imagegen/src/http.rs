use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ImageEngineConfig;
use crate::engine::ImageEngine;
use crate::error::ImageEngineError;

/// Submit response envelope: `{"code": 0, "data": {"_id": "..."}}`.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    code: i64,
    data: Option<SubmitData>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    #[serde(rename = "_id")]
    id: Option<String>,
}

/// Poll response envelope:
/// `{"data": {"current_status": "...", "image_urls": [...], "failed_message": "..."}}`.
#[derive(Debug, Deserialize)]
struct DetailResponse {
    data: Option<DetailData>,
}

#[derive(Debug, Default, Deserialize)]
struct DetailData {
    current_status: Option<String>,
    image_urls: Option<Vec<String>>,
    failed_message: Option<String>,
}

/// Poll loop state. Only the two terminal states exit the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
enum JobState {
    Polling,
    Completed(Vec<String>),
    Failed(String),
}

/// HTTP client for the external image-generation engine.
///
/// Submission failures are immediately terminal. Poll-query failures are
/// transient: they are swallowed and polling continues, because engine
/// latency is unbounded and a network blip must not drop a running job.
#[derive(Debug)]
pub struct HttpImageEngine {
    client: reqwest::Client,
    config: ImageEngineConfig,
}

impl HttpImageEngine {
    /// Create a new engine client.
    pub fn new(config: ImageEngineConfig) -> Result<Self, ImageEngineError> {
        if config.base_url.is_empty() || config.api_key.is_empty() {
            return Err(ImageEngineError::Configuration(
                "image engine base url and api key are required".to_owned(),
            ));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ImageEngineError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Submit the job and return its id.
    async fn submit(&self, prompt: &str, label: &str) -> Result<String, ImageEngineError> {
        let url = format!("{}/api/v1/userNanoBanana/start", self.base());
        debug!(label = %label, "submitting generation job");

        let response = self
            .client
            .post(&url)
            .timeout(self.config.submit_timeout)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&json!({ "name": label, "prompt": prompt }))
            .send()
            .await
            .map_err(|e| ImageEngineError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ImageEngineError::Rejected(format!("HTTP {status}: {body}")));
        }

        let submit: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ImageEngineError::Rejected(format!("malformed submit response: {e}")))?;

        if submit.code != 0 {
            return Err(ImageEngineError::Rejected(format!(
                "application code {}",
                submit.code
            )));
        }

        submit
            .data
            .and_then(|d| d.id)
            .ok_or_else(|| ImageEngineError::Rejected("submit response missing job id".to_owned()))
    }

    /// One status query. `Ok(JobState::Polling)` means not yet terminal.
    async fn query(&self, job_id: &str) -> Result<JobState, ImageEngineError> {
        let url = format!("{}/api/v1/userNanoBanana/detail/{job_id}", self.base());

        let response = self
            .client
            .get(&url)
            .timeout(self.config.poll_timeout)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await
            .map_err(|e| ImageEngineError::Http(e.to_string()))?;

        let detail: DetailResponse = response
            .json()
            .await
            .map_err(|e| ImageEngineError::Http(format!("malformed detail response: {e}")))?;

        let data = detail.data.unwrap_or_default();
        match data.current_status.as_deref() {
            Some("completed") => Ok(JobState::Completed(data.image_urls.unwrap_or_default())),
            Some("failed") => Ok(JobState::Failed(
                data.failed_message
                    .unwrap_or_else(|| "unknown engine failure".to_owned()),
            )),
            _ => Ok(JobState::Polling),
        }
    }
}

#[async_trait]
impl ImageEngine for HttpImageEngine {
    async fn submit_and_await(
        &self,
        prompt: &str,
        label: &str,
    ) -> Result<Vec<String>, ImageEngineError> {
        let job_id = self.submit(prompt, label).await?;
        info!(label = %label, job_id = %job_id, "job submitted, polling");

        let mut last_status_err: Option<String> = None;
        loop {
            sleep(self.config.poll_interval).await;

            match self.query(&job_id).await {
                Ok(JobState::Completed(urls)) => {
                    if urls.is_empty() {
                        return Err(ImageEngineError::NoImageUrls);
                    }
                    info!(label = %label, job_id = %job_id, "job completed");
                    return Ok(urls);
                }
                Ok(JobState::Failed(message)) => {
                    warn!(label = %label, job_id = %job_id, message = %message, "job failed");
                    return Err(ImageEngineError::JobFailed(message));
                }
                Ok(JobState::Polling) => {}
                Err(e) => {
                    // Transient: keep polling. Log only on change to
                    // avoid flooding during a long outage.
                    let msg = e.to_string();
                    if last_status_err.as_deref() != Some(&msg) {
                        debug!(job_id = %job_id, error = %msg, "poll query failed, retrying");
                        last_status_err = Some(msg);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_credentials_is_configuration_error() {
        let result = HttpImageEngine::new(ImageEngineConfig::new("", ""));
        assert!(matches!(result, Err(ImageEngineError::Configuration(_))));
    }

    #[test]
    fn submit_response_parses_job_id() {
        let json = r#"{"code": 0, "data": {"_id": "job-123"}}"#;
        let parsed: SubmitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.code, 0);
        assert_eq!(parsed.data.unwrap().id.as_deref(), Some("job-123"));
    }

    #[test]
    fn detail_response_tolerates_missing_fields() {
        let parsed: DetailResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.data.is_none());

        let parsed: DetailResponse =
            serde_json::from_str(r#"{"data": {"current_status": "processing"}}"#).unwrap();
        let data = parsed.data.unwrap();
        assert_eq!(data.current_status.as_deref(), Some("processing"));
        assert!(data.image_urls.is_none());
    }

    #[test]
    fn detail_response_carries_failure_message() {
        let json = r#"{"data": {"current_status": "failed", "failed_message": "nsfw"}}"#;
        let parsed: DetailResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.unwrap().failed_message.as_deref(), Some("nsfw"));
    }
}
