use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobError;

/// Pluggable object storage backend for image artifacts.
///
/// Implementors provide the actual storage mechanism. `put` must be
/// durable: a success means the artifact survives a process restart.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `path` and return the stable public URL.
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> Result<String, BlobError>;

    /// Short tag identifying this backend (e.g. `"supabase"`), recorded
    /// on each image record.
    fn backend(&self) -> &str;
}
