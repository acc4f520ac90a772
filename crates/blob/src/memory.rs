use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::error::BlobError;
use crate::store::BlobStore;

/// In-memory [`BlobStore`] for tests and development.
///
/// Stored objects are kept in a map and served from fabricated
/// `memory://` URLs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: DashMap<String, (String, Bytes)>,
}

impl MemoryBlobStore {
    /// Create a new, empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Fetch a stored object's content type and bytes.
    pub fn get(&self, path: &str) -> Option<(String, Bytes)> {
        self.objects.get(path).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> Result<String, BlobError> {
        self.objects
            .insert(path.to_owned(), (content_type.to_owned(), data));
        Ok(format!("memory://{path}"))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn backend(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_and_get() {
        let store = MemoryBlobStore::new();
        let url = store
            .put("gen/a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert_eq!(url, "memory://gen/a.png");
        let (content_type, data) = store.get("gen/a.png").unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(data.as_ref(), b"png");
    }

    #[tokio::test]
    async fn upsert_overwrites() {
        let store = MemoryBlobStore::new();
        store
            .put("p", Bytes::from_static(b"v1"), "image/png")
            .await
            .unwrap();
        store
            .put("p", Bytes::from_static(b"v2"), "image/png")
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("p").unwrap().1.as_ref(), b"v2");
    }
}
