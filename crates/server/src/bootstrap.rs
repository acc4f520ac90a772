//! Component wiring: turn a [`CopysmithConfig`] into a ready
//! [`AppState`].
//!
//! Backends are explicit choices. A durable backend that cannot be
//! reached is a startup failure -- there is no silent fallback to the
//! in-memory implementations.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use copysmith_blob::{BlobStore, MemoryBlobStore, SupabaseBlobStore, SupabaseStorageConfig};
use copysmith_engine::{
    BatchConfig, BatchController, HttpArtifactTransfer, ItemWorker, Pipeline,
};
use copysmith_imagegen::{HttpImageEngine, ImageEngine, ImageEngineConfig};
use copysmith_llm::{HttpTextGenerator, TextGenerator, TextModelConfig};
use copysmith_state::SessionStore;
use copysmith_state_memory::MemorySessionStore;
use copysmith_state_postgres::{PostgresConfig, PostgresSessionStore};

use crate::api::AppState;
use crate::config::CopysmithConfig;
use crate::error::ServerError;
use crate::extract::WebsiteExtractor;

/// Build the full application state from configuration.
pub async fn build_state(config: CopysmithConfig) -> Result<AppState, ServerError> {
    let store = build_store(&config).await?;
    let blob = build_blob(&config)?;
    let text = build_text_generator(&config)?;
    let engine = build_image_engine(&config)?;

    let transfer = HttpArtifactTransfer::new(Arc::clone(&blob))
        .map_err(|e| ServerError::Config(e.to_string()))?;
    let worker = Arc::new(ItemWorker::new(engine, Arc::new(transfer), Arc::clone(&store)));
    let batch = BatchController::with_config(
        worker,
        BatchConfig {
            max_concurrent: config.batch.max_concurrent,
        },
    );
    let pipeline = Arc::new(Pipeline::new(text, Arc::clone(&store), batch));
    let extractor = Arc::new(WebsiteExtractor::new()?);

    Ok(AppState {
        config: Arc::new(config),
        store,
        pipeline,
        extractor,
    })
}

async fn build_store(config: &CopysmithConfig) -> Result<Arc<dyn SessionStore>, ServerError> {
    match config.state.backend.as_str() {
        "postgres" => {
            if config.state.url.is_empty() {
                return Err(ServerError::Config(
                    "state.url (or DATABASE_URL) is required for the postgres backend".to_owned(),
                ));
            }
            let store = PostgresSessionStore::new(
                PostgresConfig::new(&config.state.url).with_pool_size(config.state.pool_size),
            )
            .await
            .map_err(|e| ServerError::Config(format!("postgres store: {e}")))?;
            info!("session store: postgres");
            Ok(Arc::new(store))
        }
        "memory" => {
            info!("session store: memory (non-durable, dev/test only)");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        other => Err(ServerError::Config(format!(
            "unknown state backend '{other}' (expected 'postgres' or 'memory')"
        ))),
    }
}

fn build_blob(config: &CopysmithConfig) -> Result<Arc<dyn BlobStore>, ServerError> {
    match config.storage.backend.as_str() {
        "supabase" => {
            let store = SupabaseBlobStore::new(
                SupabaseStorageConfig::new(&config.storage.url, &config.storage.service_key)
                    .with_bucket(&config.storage.bucket),
            )
            .map_err(|e| ServerError::Config(format!("supabase storage: {e}")))?;
            info!(bucket = %config.storage.bucket, "object storage: supabase");
            Ok(Arc::new(store))
        }
        "memory" => {
            info!("object storage: memory (non-durable, dev/test only)");
            Ok(Arc::new(MemoryBlobStore::new()))
        }
        other => Err(ServerError::Config(format!(
            "unknown storage backend '{other}' (expected 'supabase' or 'memory')"
        ))),
    }
}

fn build_text_generator(config: &CopysmithConfig) -> Result<Arc<dyn TextGenerator>, ServerError> {
    let generator = HttpTextGenerator::new(
        TextModelConfig::new(&config.llm.endpoint, &config.llm.model, &config.llm.api_key)
            .with_timeout(config.llm.timeout_seconds),
    )
    .map_err(|e| ServerError::Config(format!("text model: {e}")))?;
    Ok(Arc::new(generator))
}

fn build_image_engine(config: &CopysmithConfig) -> Result<Arc<dyn ImageEngine>, ServerError> {
    let engine = HttpImageEngine::new(
        ImageEngineConfig::new(&config.image_engine.base_url, &config.image_engine.api_key)
            .with_poll_interval(Duration::from_secs(config.image_engine.poll_interval_seconds))
            .with_submit_timeout(Duration::from_secs(config.image_engine.submit_timeout_seconds))
            .with_poll_timeout(Duration::from_secs(config.image_engine.poll_timeout_seconds)),
    )
    .map_err(|e| ServerError::Config(format!("image engine: {e}")))?;
    Ok(Arc::new(engine))
}
