use async_trait::async_trait;

use copysmith_core::{GeneratedImage, NewImage, SessionWithImages, SourceTexts, TextAssets};

use crate::error::StateError;

/// Trait for persisting generation sessions and their images.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Backends are explicit construction-time choices; there is no runtime
/// fallback from a durable backend to an in-memory one.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new `processing` session for the given owner and return
    /// its id. Source texts are truncated before storage.
    async fn create_session(
        &self,
        user_id: &str,
        sources: &SourceTexts,
    ) -> Result<String, StateError>;

    /// Attach the four generated text assets and the expected image
    /// count to an existing session.
    async fn update_assets(
        &self,
        session_id: &str,
        assets: &TextAssets,
        total_images: u32,
    ) -> Result<(), StateError>;

    /// Persist a generated image record. Returns the stored record with
    /// its assigned id and timestamp.
    async fn add_image(&self, image: NewImage) -> Result<GeneratedImage, StateError>;

    /// Atomically increment the session's completed-image counter by one
    /// and return the new count.
    ///
    /// Called by concurrent batch workers: implementations must perform
    /// the read-modify-write as a single atomic operation (a database-side
    /// `SET completed_images = completed_images + 1`, or an update under a
    /// single entry lock) so no update is lost.
    async fn increment_completed(&self, session_id: &str) -> Result<u32, StateError>;

    /// Transition the session to `completed`, recording total elapsed
    /// seconds. Fails with [`StateError::AlreadyTerminal`] if the session
    /// already reached a terminal status.
    async fn complete(&self, session_id: &str, elapsed_seconds: f64) -> Result<(), StateError>;

    /// Transition the session to `failed` with a truncated error message.
    /// Fails with [`StateError::AlreadyTerminal`] if the session already
    /// reached a terminal status.
    async fn fail(&self, session_id: &str, error_message: &str) -> Result<(), StateError>;

    /// Fetch a session and its images (ordered by `image_index`).
    ///
    /// When `user_id` is given, a session owned by a different user is
    /// reported as absent rather than as a permission error.
    async fn get(
        &self,
        session_id: &str,
        user_id: Option<&str>,
    ) -> Result<Option<SessionWithImages>, StateError>;

    /// List a user's sessions, newest first. `limit` is capped at 100.
    async fn list_sessions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<SessionWithImages>, StateError>;

    /// Cheap connectivity check for health reporting.
    async fn ping(&self) -> Result<(), StateError>;
}
