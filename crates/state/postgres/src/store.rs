use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use copysmith_core::session::ERROR_MESSAGE_CAP;
use copysmith_core::{
    GeneratedImage, GenerationSession, NewImage, SessionStatus, SessionWithImages, SourceTexts,
    TextAssets, truncate_chars,
};
use copysmith_state::{SessionStore, StateError};

use crate::bootstrap;
use crate::config::PostgresConfig;

/// PostgreSQL-backed implementation of [`SessionStore`].
pub struct PostgresSessionStore {
    pool: PgPool,
}

/// Database row for `marketing_generations`.
#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    user_id: String,
    website_url: Option<String>,
    ppt_text: Option<String>,
    website_text: Option<String>,
    status: String,
    total_images: i32,
    completed_images: i32,
    marketing_brief: Option<serde_json::Value>,
    creative_angles: Option<serde_json::Value>,
    email_content: Option<serde_json::Value>,
    image_prompts: Option<serde_json::Value>,
    generation_time: Option<f64>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Database row for `marketing_images`.
#[derive(sqlx::FromRow)]
struct ImageRow {
    id: String,
    generation_id: String,
    user_id: String,
    angle_name: String,
    image_summary: String,
    prompt: String,
    image_url: String,
    storage_path: String,
    storage_backend: String,
    image_index: i32,
    generation_time: f64,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Result<GenerationSession, StateError> {
        fn from_json<T: serde::de::DeserializeOwned>(
            value: Option<serde_json::Value>,
        ) -> Result<Option<T>, StateError> {
            value
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| StateError::Serialization(e.to_string()))
        }

        Ok(GenerationSession {
            id: self.id,
            user_id: self.user_id,
            website_url: self.website_url,
            ppt_text: self.ppt_text,
            website_text: self.website_text,
            status: self
                .status
                .parse::<SessionStatus>()
                .map_err(StateError::Serialization)?,
            total_images: u32::try_from(self.total_images).unwrap_or(0),
            completed_images: u32::try_from(self.completed_images).unwrap_or(0),
            marketing_brief: from_json(self.marketing_brief)?,
            creative_angles: from_json(self.creative_angles)?,
            email_content: from_json(self.email_content)?,
            image_prompts: from_json(self.image_prompts)?,
            generation_time: self.generation_time,
            error_message: self.error_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ImageRow {
    fn into_image(self) -> GeneratedImage {
        GeneratedImage {
            id: self.id,
            generation_id: self.generation_id,
            user_id: self.user_id,
            angle_name: self.angle_name,
            image_summary: self.image_summary,
            prompt: self.prompt,
            image_url: self.image_url,
            storage_path: self.storage_path,
            storage_backend: self.storage_backend,
            image_index: u32::try_from(self.image_index).unwrap_or(0),
            generation_time: self.generation_time,
            created_at: self.created_at,
        }
    }
}

impl PostgresSessionStore {
    /// Connect to PostgreSQL, build the pool, and create the required
    /// tables if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Connection`] if pool creation fails, or
    /// [`StateError::Backend`] if table bootstrap fails.
    pub async fn new(config: PostgresConfig) -> Result<Self, StateError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect(&config.url)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        Self::from_pool(pool).await
    }

    /// Build a store from an existing pool, running table bootstrap.
    pub async fn from_pool(pool: PgPool) -> Result<Self, StateError> {
        bootstrap::ensure_tables(&pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(Self { pool })
    }

    async fn fetch_images(&self, session_id: &str) -> Result<Vec<GeneratedImage>, StateError> {
        let rows: Vec<ImageRow> = sqlx::query_as(
            "SELECT * FROM marketing_images WHERE generation_id = $1 ORDER BY image_index",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(rows.into_iter().map(ImageRow::into_image).collect())
    }

    async fn current_status(&self, session_id: &str) -> Result<Option<String>, StateError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT status FROM marketing_generations WHERE id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(row.map(|(status,)| status))
    }

    async fn terminal_transition_error(&self, session_id: &str) -> StateError {
        match self.current_status(session_id).await {
            Ok(Some(status)) => StateError::AlreadyTerminal {
                id: session_id.to_owned(),
                status,
            },
            Ok(None) => StateError::NotFound(session_id.to_owned()),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn create_session(
        &self,
        user_id: &str,
        sources: &SourceTexts,
    ) -> Result<String, StateError> {
        let session = GenerationSession::new(user_id, sources);

        sqlx::query(
            "INSERT INTO marketing_generations \
             (id, user_id, website_url, ppt_text, website_text, status, \
              total_images, completed_images, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 0, 0, $7, $8)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.website_url)
        .bind(&session.ppt_text)
        .bind(&session.website_text)
        .bind(session.status.as_str())
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(session.id)
    }

    async fn update_assets(
        &self,
        session_id: &str,
        assets: &TextAssets,
        total_images: u32,
    ) -> Result<(), StateError> {
        let brief = serde_json::to_value(&assets.brief)
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let angles = serde_json::to_value(&assets.angles)
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let email = serde_json::to_value(&assets.email)
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let prompts = serde_json::to_value(&assets.image_prompts)
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE marketing_generations \
             SET marketing_brief = $2, creative_angles = $3, email_content = $4, \
                 image_prompts = $5, total_images = $6, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(session_id)
        .bind(brief)
        .bind(angles)
        .bind(email)
        .bind(prompts)
        .bind(i32::try_from(total_images).unwrap_or(i32::MAX))
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StateError::NotFound(session_id.to_owned()));
        }
        Ok(())
    }

    async fn add_image(&self, image: NewImage) -> Result<GeneratedImage, StateError> {
        if self.current_status(&image.generation_id).await?.is_none() {
            return Err(StateError::NotFound(image.generation_id));
        }
        let record = image.into_record();

        sqlx::query(
            "INSERT INTO marketing_images \
             (id, generation_id, user_id, angle_name, image_summary, prompt, \
              image_url, storage_path, storage_backend, image_index, generation_time, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&record.id)
        .bind(&record.generation_id)
        .bind(&record.user_id)
        .bind(&record.angle_name)
        .bind(&record.image_summary)
        .bind(&record.prompt)
        .bind(&record.image_url)
        .bind(&record.storage_path)
        .bind(&record.storage_backend)
        .bind(i32::try_from(record.image_index).unwrap_or(i32::MAX))
        .bind(record.generation_time)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(record)
    }

    async fn increment_completed(&self, session_id: &str) -> Result<u32, StateError> {
        // Database-side atomic increment: safe under concurrent workers.
        let row: Option<(i32,)> = sqlx::query_as(
            "UPDATE marketing_generations \
             SET completed_images = completed_images + 1, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING completed_images",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StateError::Backend(e.to_string()))?;

        match row {
            Some((count,)) => Ok(u32::try_from(count).unwrap_or(0)),
            None => Err(StateError::NotFound(session_id.to_owned())),
        }
    }

    async fn complete(&self, session_id: &str, elapsed_seconds: f64) -> Result<(), StateError> {
        let result = sqlx::query(
            "UPDATE marketing_generations \
             SET status = 'completed', generation_time = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'processing'",
        )
        .bind(session_id)
        .bind(elapsed_seconds)
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(self.terminal_transition_error(session_id).await);
        }
        Ok(())
    }

    async fn fail(&self, session_id: &str, error_message: &str) -> Result<(), StateError> {
        let message = truncate_chars(error_message, ERROR_MESSAGE_CAP);
        let result = sqlx::query(
            "UPDATE marketing_generations \
             SET status = 'failed', error_message = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'processing'",
        )
        .bind(session_id)
        .bind(&message)
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(self.terminal_transition_error(session_id).await);
        }
        Ok(())
    }

    async fn get(
        &self,
        session_id: &str,
        user_id: Option<&str>,
    ) -> Result<Option<SessionWithImages>, StateError> {
        let row: Option<SessionRow> = match user_id {
            Some(owner) => {
                sqlx::query_as("SELECT * FROM marketing_generations WHERE id = $1 AND user_id = $2")
                    .bind(session_id)
                    .bind(owner)
                    .fetch_optional(&self.pool)
                    .await
            }
            None => sqlx::query_as("SELECT * FROM marketing_generations WHERE id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await,
        }
        .map_err(|e| StateError::Backend(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let session = row.into_session()?;
        let images = self.fetch_images(session_id).await?;
        Ok(Some(SessionWithImages { session, images }))
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<SessionWithImages>, StateError> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT * FROM marketing_generations \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(i64::from(limit.min(100)))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StateError::Backend(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let session = row.into_session()?;
            let images = self.fetch_images(&session.id).await?;
            out.push(SessionWithImages { session, images });
        }
        Ok(out)
    }

    async fn ping(&self) -> Result<(), StateError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use copysmith_state::testing::run_store_conformance_tests;

    /// Requires a live database; run with
    /// `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.
    #[tokio::test]
    #[ignore = "requires a PostgreSQL instance"]
    async fn conformance() {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL not set");
        let store = PostgresSessionStore::new(PostgresConfig::new(url))
            .await
            .unwrap();
        run_store_conformance_tests(Arc::new(store)).await.unwrap();
    }
}
