use serde::{Deserialize, Serialize};

/// Result of transferring one artifact into durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifact {
    /// Stable public URL serving the stored bytes.
    pub public_url: String,
    /// Object path within the bucket.
    pub storage_path: String,
    /// Backend tag (e.g. `"supabase"`, `"memory"`).
    pub backend: String,
}
