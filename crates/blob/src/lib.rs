//! Pluggable object storage for image artifacts.
//!
//! The engine stores downloaded image bytes through the [`BlobStore`]
//! trait and records the returned public URL. Backends: a
//! Supabase-storage HTTP client for production and an in-memory store
//! for tests. Upload failure is terminal for the item being processed;
//! there is no local-filesystem fallback.

pub mod error;
pub mod memory;
pub mod store;
pub mod supabase;
pub mod types;

pub use error::BlobError;
pub use memory::MemoryBlobStore;
pub use store::BlobStore;
pub use supabase::{SupabaseBlobStore, SupabaseStorageConfig};
pub use types::StoredArtifact;
