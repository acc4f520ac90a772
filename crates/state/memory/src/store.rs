use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use copysmith_core::session::ERROR_MESSAGE_CAP;
use copysmith_core::{
    GeneratedImage, GenerationSession, NewImage, SessionStatus, SessionWithImages, SourceTexts,
    TextAssets, truncate_chars,
};
use copysmith_state::{SessionStore, StateError};

/// In-memory [`SessionStore`] backed by [`DashMap`]s.
///
/// `increment_completed` performs its read-modify-write while holding the
/// session's entry lock, so concurrent workers never lose an update.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, GenerationSession>,
    images: DashMap<String, Vec<GeneratedImage>>,
}

impl MemorySessionStore {
    /// Create a new, empty in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a session's images sorted by `image_index`.
    fn images_for(&self, session_id: &str) -> Vec<GeneratedImage> {
        let mut images = self
            .images
            .get(session_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        images.sort_by_key(|image| image.image_index);
        images
    }

    /// Guard a status transition: terminal sessions never change again.
    fn finalize(
        &self,
        session_id: &str,
        apply: impl FnOnce(&mut GenerationSession),
    ) -> Result<(), StateError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StateError::NotFound(session_id.to_owned()))?;
        if entry.status.is_terminal() {
            return Err(StateError::AlreadyTerminal {
                id: session_id.to_owned(),
                status: entry.status.to_string(),
            });
        }
        apply(&mut entry);
        entry.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(
        &self,
        user_id: &str,
        sources: &SourceTexts,
    ) -> Result<String, StateError> {
        let session = GenerationSession::new(user_id, sources);
        let id = session.id.clone();
        self.sessions.insert(id.clone(), session);
        Ok(id)
    }

    async fn update_assets(
        &self,
        session_id: &str,
        assets: &TextAssets,
        total_images: u32,
    ) -> Result<(), StateError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StateError::NotFound(session_id.to_owned()))?;
        entry.marketing_brief = Some(assets.brief.clone());
        entry.creative_angles = Some(assets.angles.clone());
        entry.email_content = Some(assets.email.clone());
        entry.image_prompts = Some(assets.image_prompts.clone());
        entry.total_images = total_images;
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn add_image(&self, image: NewImage) -> Result<GeneratedImage, StateError> {
        if !self.sessions.contains_key(&image.generation_id) {
            return Err(StateError::NotFound(image.generation_id));
        }
        let record = image.into_record();
        self.images
            .entry(record.generation_id.clone())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn increment_completed(&self, session_id: &str) -> Result<u32, StateError> {
        // Single entry lock for the whole read-modify-write.
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StateError::NotFound(session_id.to_owned()))?;
        entry.completed_images += 1;
        entry.updated_at = Utc::now();
        Ok(entry.completed_images)
    }

    async fn complete(&self, session_id: &str, elapsed_seconds: f64) -> Result<(), StateError> {
        self.finalize(session_id, |session| {
            session.status = SessionStatus::Completed;
            session.generation_time = Some(elapsed_seconds);
        })
    }

    async fn fail(&self, session_id: &str, error_message: &str) -> Result<(), StateError> {
        let message = truncate_chars(error_message, ERROR_MESSAGE_CAP);
        self.finalize(session_id, |session| {
            session.status = SessionStatus::Failed;
            session.error_message = Some(message);
        })
    }

    async fn get(
        &self,
        session_id: &str,
        user_id: Option<&str>,
    ) -> Result<Option<SessionWithImages>, StateError> {
        let Some(entry) = self.sessions.get(session_id) else {
            return Ok(None);
        };
        if let Some(owner) = user_id
            && entry.user_id != owner
        {
            return Ok(None);
        }
        Ok(Some(SessionWithImages {
            session: entry.value().clone(),
            images: self.images_for(session_id),
        }))
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<SessionWithImages>, StateError> {
        let limit = limit.min(100) as usize;
        let mut sessions: Vec<GenerationSession> = self
            .sessions
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions.truncate(limit);

        Ok(sessions
            .into_iter()
            .map(|session| {
                let images = self.images_for(&session.id);
                SessionWithImages { session, images }
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), StateError> {
        Ok(())
    }
}
