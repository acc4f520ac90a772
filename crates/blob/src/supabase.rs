//! Supabase Storage HTTP backend.
//!
//! Uploads objects with `POST {base}/storage/v1/object/{bucket}/{path}`
//! (service-key auth, upsert enabled) and serves them from the public
//! object URL. The bucket must already exist; a missing bucket surfaces
//! as a rejected upload.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::BlobError;
use crate::store::BlobStore;

/// Configuration for [`SupabaseBlobStore`].
#[derive(Clone, Deserialize)]
pub struct SupabaseStorageConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Service-role key used for uploads.
    pub service_key: String,
    /// Bucket holding generated images.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Upload request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for SupabaseStorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStorageConfig")
            .field("url", &self.url)
            .field("service_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl SupabaseStorageConfig {
    /// Create a config with the default bucket and timeout.
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_key: service_key.into(),
            bucket: default_bucket(),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    /// Set the bucket name.
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Set the upload timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

fn default_bucket() -> String {
    "marketing-images".to_owned()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// [`BlobStore`] backed by the Supabase Storage HTTP API.
#[derive(Debug)]
pub struct SupabaseBlobStore {
    client: reqwest::Client,
    config: SupabaseStorageConfig,
}

impl SupabaseBlobStore {
    /// Build the store, constructing the HTTP client with the configured
    /// upload timeout.
    pub fn new(config: SupabaseStorageConfig) -> Result<Self, BlobError> {
        if config.url.is_empty() || config.service_key.is_empty() {
            return Err(BlobError::Configuration(
                "supabase url and service key are required".to_owned(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BlobError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn upload_url(&self, path: &str) -> String {
        let base = self.config.url.trim_end_matches('/');
        format!("{base}/storage/v1/object/{}/{path}", self.config.bucket)
    }

    /// Public URL for an uploaded object.
    pub fn public_url(&self, path: &str) -> String {
        let base = self.config.url.trim_end_matches('/');
        format!(
            "{base}/storage/v1/object/public/{}/{path}",
            self.config.bucket
        )
    }
}

#[async_trait]
impl BlobStore for SupabaseBlobStore {
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> Result<String, BlobError> {
        let url = self.upload_url(path);
        debug!(path = %path, size = data.len(), "uploading object to supabase storage");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.service_key))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .header("cache-control", "3600")
            .body(data)
            .send()
            .await
            .map_err(|e| BlobError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, path = %path, "supabase upload rejected");
            return Err(BlobError::Rejected {
                status,
                body: body.chars().take(200).collect(),
            });
        }

        info!(path = %path, "object uploaded");
        Ok(self.public_url(path))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn backend(&self) -> &str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SupabaseStorageConfig {
        SupabaseStorageConfig::new("https://proj.supabase.co/", "sk-test")
    }

    #[test]
    fn upload_url_strips_trailing_slash() {
        let store = SupabaseBlobStore::new(test_config()).unwrap();
        assert_eq!(
            store.upload_url("gen-1/a.png"),
            "https://proj.supabase.co/storage/v1/object/marketing-images/gen-1/a.png"
        );
    }

    #[test]
    fn public_url_uses_public_prefix() {
        let store = SupabaseBlobStore::new(test_config()).unwrap();
        assert_eq!(
            store.public_url("gen-1/a.png"),
            "https://proj.supabase.co/storage/v1/object/public/marketing-images/gen-1/a.png"
        );
    }

    #[test]
    fn missing_credentials_is_configuration_error() {
        let result = SupabaseBlobStore::new(SupabaseStorageConfig::new("", ""));
        assert!(matches!(result, Err(BlobError::Configuration(_))));
    }

    #[test]
    fn config_debug_redacts_key() {
        let debug = format!("{:?}", test_config());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-test"));
    }

    #[test]
    fn config_builder() {
        let config = test_config().with_bucket("assets").with_timeout(10);
        assert_eq!(config.bucket, "assets");
        assert_eq!(config.timeout_seconds, 10);
    }
}
