use sqlx::PgPool;

/// Create the session and image tables if they do not exist.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS marketing_generations (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            website_url TEXT,
            ppt_text TEXT,
            website_text TEXT,
            status TEXT NOT NULL,
            total_images INTEGER NOT NULL DEFAULT 0,
            completed_images INTEGER NOT NULL DEFAULT 0,
            marketing_brief JSONB,
            creative_angles JSONB,
            email_content JSONB,
            image_prompts JSONB,
            generation_time DOUBLE PRECISION,
            error_message TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS marketing_images (
            id TEXT PRIMARY KEY,
            generation_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            angle_name TEXT NOT NULL,
            image_summary TEXT NOT NULL,
            prompt TEXT NOT NULL,
            image_url TEXT NOT NULL,
            storage_path TEXT NOT NULL,
            storage_backend TEXT NOT NULL,
            image_index INTEGER NOT NULL,
            generation_time DOUBLE PRECISION NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS marketing_images_generation_idx \
         ON marketing_images (generation_id, image_index)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS marketing_generations_user_idx \
         ON marketing_generations (user_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
