use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assets::{CreativeAngles, ImagePromptSet, MarketingBrief, MarketingEmail};

/// Maximum characters of each source text kept on the session record.
pub const SOURCE_TEXT_CAP: usize = 5000;

/// Maximum characters of an error message kept on a failed session.
pub const ERROR_MESSAGE_CAP: usize = 500;

/// Lifecycle status of a generation session.
///
/// Transitions only `Processing -> Completed` or `Processing -> Failed`;
/// a terminal status never reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Processing,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Returns `true` if no further transition is possible from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// The lowercase wire/storage tag for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown session status '{other}'")),
        }
    }
}

/// Source material captured at session creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceTexts {
    /// Extracted slide-deck text, if provided.
    pub ppt_text: Option<String>,
    /// Extracted website text, if provided.
    pub website_text: Option<String>,
    /// The website URL the text was scraped from.
    pub website_url: Option<String>,
}

/// One end-to-end generation request's persisted record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSession {
    /// Opaque unique id (UUID v4), assigned at session creation.
    pub id: String,
    /// Owning user id, as extracted from the caller's credentials.
    pub user_id: String,
    pub website_url: Option<String>,
    /// Slide-deck source text, truncated to [`SOURCE_TEXT_CAP`].
    pub ppt_text: Option<String>,
    /// Website source text, truncated to [`SOURCE_TEXT_CAP`].
    pub website_text: Option<String>,
    pub status: SessionStatus,
    /// Number of images the prompt stage requested.
    pub total_images: u32,
    /// Number of images persisted so far. Monotonically non-decreasing,
    /// never exceeds `total_images`.
    pub completed_images: u32,
    pub marketing_brief: Option<MarketingBrief>,
    pub creative_angles: Option<CreativeAngles>,
    pub email_content: Option<MarketingEmail>,
    pub image_prompts: Option<ImagePromptSet>,
    /// Total wall-clock generation time in seconds, set on completion.
    pub generation_time: Option<f64>,
    /// Truncated error message, set on failure.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationSession {
    /// Create a fresh `processing` session for the given owner and sources.
    ///
    /// Source texts are truncated to [`SOURCE_TEXT_CAP`] characters before
    /// being stored.
    pub fn new(user_id: impl Into<String>, sources: &SourceTexts) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            website_url: sources.website_url.clone(),
            ppt_text: sources
                .ppt_text
                .as_deref()
                .map(|t| truncate_chars(t, SOURCE_TEXT_CAP)),
            website_text: sources
                .website_text
                .as_deref()
                .map(|t| truncate_chars(t, SOURCE_TEXT_CAP)),
            status: SessionStatus::Processing,
            total_images: 0,
            completed_images: 0,
            marketing_brief: None,
            creative_angles: None,
            email_content: None,
            image_prompts: None,
            generation_time: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A persisted generated image, created only after both external
/// generation and artifact transfer succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Opaque unique id (UUID v4).
    pub id: String,
    /// Parent session id.
    pub generation_id: String,
    pub user_id: String,
    pub angle_name: String,
    pub image_summary: String,
    pub prompt: String,
    /// Stable public URL in durable storage.
    pub image_url: String,
    /// Object path within the storage bucket.
    pub storage_path: String,
    /// Tag identifying the storage backend that holds the artifact.
    pub storage_backend: String,
    /// Original item index. The only ordering key; completion order is
    /// not significant and must not leak into stored or returned order.
    pub image_index: u32,
    /// Wall-clock seconds from submission to persisted artifact.
    pub generation_time: f64,
    pub created_at: DateTime<Utc>,
}

/// Field values for a [`GeneratedImage`] about to be persisted.
///
/// The store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub generation_id: String,
    pub user_id: String,
    pub angle_name: String,
    pub image_summary: String,
    pub prompt: String,
    pub image_url: String,
    pub storage_path: String,
    pub storage_backend: String,
    pub image_index: u32,
    pub generation_time: f64,
}

impl NewImage {
    /// Materialize the persisted record, assigning id and timestamp.
    pub fn into_record(self) -> GeneratedImage {
        GeneratedImage {
            id: uuid::Uuid::new_v4().to_string(),
            generation_id: self.generation_id,
            user_id: self.user_id,
            angle_name: self.angle_name,
            image_summary: self.image_summary,
            prompt: self.prompt,
            image_url: self.image_url,
            storage_path: self.storage_path,
            storage_backend: self.storage_backend,
            image_index: self.image_index,
            generation_time: self.generation_time,
            created_at: Utc::now(),
        }
    }
}

/// A session together with its child images, ordered by `image_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWithImages {
    #[serde(flatten)]
    pub session: GenerationSession,
    pub images: Vec<GeneratedImage>,
}

/// Truncate a string to at most `max` characters on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_owned(),
        None => s.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for status in [
            SessionStatus::Processing,
            SessionStatus::Completed,
            SessionStatus::Failed,
        ] {
            let parsed: SessionStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn status_terminality() {
        assert!(!SessionStatus::Processing.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn new_session_truncates_source_texts() {
        let sources = SourceTexts {
            ppt_text: Some("x".repeat(SOURCE_TEXT_CAP + 100)),
            website_text: Some("short".to_owned()),
            website_url: Some("https://example.com".to_owned()),
        };
        let session = GenerationSession::new("user-1", &sources);
        assert_eq!(session.ppt_text.as_ref().unwrap().len(), SOURCE_TEXT_CAP);
        assert_eq!(session.website_text.as_deref(), Some("short"));
        assert_eq!(session.status, SessionStatus::Processing);
        assert_eq!(session.completed_images, 0);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn new_image_assigns_identity() {
        let image = NewImage {
            generation_id: "gen-1".into(),
            user_id: "user-1".into(),
            angle_name: "Workflow".into(),
            image_summary: "A workflow diagram".into(),
            prompt: "Title: ...".into(),
            image_url: "https://cdn.example.com/a.png".into(),
            storage_path: "gen-1/user1_20260808_abcd1234.png".into(),
            storage_backend: "supabase".into(),
            image_index: 2,
            generation_time: 41.5,
        }
        .into_record();
        assert!(!image.id.is_empty());
        assert_eq!(image.image_index, 2);
    }
}
