//! Artifact transfer: move a transient engine URL into durable storage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::debug;

use copysmith_blob::{BlobStore, StoredArtifact};

use crate::error::EngineError;

/// Default timeout for downloading an artifact from the engine's
/// transient URL.
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Moves one generated artifact from its transient engine URL into
/// durable storage.
///
/// Both steps are terminal on failure: there is no retry, and no
/// fallback to ephemeral local storage -- artifacts must survive a
/// process restart.
#[async_trait]
pub trait ArtifactTransfer: Send + Sync {
    /// Download the bytes at `source_url` and store them durably under a
    /// collision-resistant path namespaced by `session_id`.
    async fn transfer(
        &self,
        source_url: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<StoredArtifact, EngineError>;
}

/// Production [`ArtifactTransfer`]: HTTP download with a bounded
/// timeout, then upload through the configured [`BlobStore`].
pub struct HttpArtifactTransfer {
    client: reqwest::Client,
    blob: Arc<dyn BlobStore>,
    download_timeout: Duration,
}

impl HttpArtifactTransfer {
    /// Build a transfer with the default download timeout.
    pub fn new(blob: Arc<dyn BlobStore>) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| EngineError::Download(e.to_string()))?;
        Ok(Self {
            client,
            blob,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        })
    }

    /// Set the download timeout.
    #[must_use]
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }
}

#[async_trait]
impl ArtifactTransfer for HttpArtifactTransfer {
    async fn transfer(
        &self,
        source_url: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<StoredArtifact, EngineError> {
        debug!(source_url = %source_url, "downloading artifact");
        let response = self
            .client
            .get(source_url)
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| EngineError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::Download(format!(
                "download returned HTTP {}",
                response.status()
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| EngineError::Download(e.to_string()))?;

        let storage_path = destination_path(session_id, user_id);
        let public_url = self.blob.put(&storage_path, data, "image/png").await?;

        Ok(StoredArtifact {
            public_url,
            storage_path,
            backend: self.blob.backend().to_owned(),
        })
    }
}

/// Test double that skips the HTTP download and stores a placeholder
/// payload through the given blob store.
pub struct MockArtifactTransfer {
    blob: Arc<dyn BlobStore>,
}

impl MockArtifactTransfer {
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self { blob }
    }
}

#[async_trait]
impl ArtifactTransfer for MockArtifactTransfer {
    async fn transfer(
        &self,
        _source_url: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<StoredArtifact, EngineError> {
        let storage_path = destination_path(session_id, user_id);
        let public_url = self
            .blob
            .put(&storage_path, Bytes::from_static(b"\x89PNG"), "image/png")
            .await?;
        Ok(StoredArtifact {
            public_url,
            storage_path,
            backend: self.blob.backend().to_owned(),
        })
    }
}

/// Build a collision-resistant destination path:
/// `{session_id}/{sanitized_owner}_{timestamp}_{random_suffix}.png`.
pub fn destination_path(session_id: &str, user_id: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix: String = uuid::Uuid::new_v4().to_string().chars().take(8).collect();
    let owner = sanitize_owner(user_id);
    format!("{session_id}/{owner}_{timestamp}_{suffix}.png")
}

/// Owner prefix for storage paths: dashes removed, at most 10 chars,
/// `"user"` when the id is empty.
fn sanitize_owner(user_id: &str) -> String {
    let cleaned: String = user_id.chars().filter(|c| *c != '-').take(10).collect();
    if cleaned.is_empty() {
        "user".to_owned()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copysmith_blob::MemoryBlobStore;

    #[test]
    fn sanitize_strips_dashes_and_caps_length() {
        assert_eq!(
            sanitize_owner("123e4567-e89b-12d3-a456-426614174000"),
            "123e4567e8"
        );
        assert_eq!(sanitize_owner("bob"), "bob");
        assert_eq!(sanitize_owner(""), "user");
        assert_eq!(sanitize_owner("---"), "user");
    }

    #[test]
    fn destination_path_is_namespaced_and_unique() {
        let a = destination_path("gen-1", "user-abc");
        let b = destination_path("gen-1", "user-abc");
        assert!(a.starts_with("gen-1/userabc_"));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b, "random suffix must differ between calls");
    }

    #[tokio::test]
    async fn mock_transfer_stores_through_blob() {
        let blob = Arc::new(MemoryBlobStore::new());
        let transfer = MockArtifactTransfer::new(Arc::clone(&blob) as Arc<dyn BlobStore>);
        let artifact = transfer
            .transfer("https://engine/x.png", "user-1", "gen-1")
            .await
            .unwrap();
        assert_eq!(artifact.backend, "memory");
        assert!(artifact.public_url.starts_with("memory://gen-1/"));
        assert_eq!(blob.len(), 1);
    }
}
