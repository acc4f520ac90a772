//! Per-item worker: one creative item from prompt to persisted image.

use std::sync::Arc;

use tracing::{debug, info, warn};

use copysmith_core::{CreativeItem, GeneratedImage, NewImage, truncate_chars};
use copysmith_imagegen::ImageEngine;
use copysmith_state::SessionStore;

use crate::error::EngineError;
use crate::transfer::ArtifactTransfer;

/// Storage caps for image record fields.
const ANGLE_NAME_CAP: usize = 255;
const SUMMARY_CAP: usize = 1000;
const PROMPT_CAP: usize = 2000;

/// Processes one [`CreativeItem`]: generate, transfer, persist.
///
/// Every internal failure is converted to an [`EngineError`] return --
/// nothing escapes this boundary, so a failed item can never affect its
/// siblings in a batch.
pub struct ItemWorker {
    engine: Arc<dyn ImageEngine>,
    transfer: Arc<dyn ArtifactTransfer>,
    store: Arc<dyn SessionStore>,
}

impl ItemWorker {
    pub fn new(
        engine: Arc<dyn ImageEngine>,
        transfer: Arc<dyn ArtifactTransfer>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            engine,
            transfer,
            store,
        }
    }

    /// Run the item to a terminal outcome. Steps short-circuit: a failed
    /// generation skips transfer, a failed transfer skips persistence.
    pub async fn process(
        &self,
        item: &CreativeItem,
        session_id: &str,
        user_id: &str,
    ) -> Result<GeneratedImage, EngineError> {
        let started = tokio::time::Instant::now();
        debug!(index = item.index, angle = %item.angle_name, "starting item");

        let label = format!("Marketing_Gen_{}", item.index);
        let urls = self.engine.submit_and_await(&item.prompt, &label).await?;
        let source_url = urls
            .first()
            .ok_or(copysmith_imagegen::ImageEngineError::NoImageUrls)?;

        let artifact = self
            .transfer
            .transfer(source_url, user_id, session_id)
            .await?;

        let generation_time = started.elapsed().as_secs_f64();
        let record = self
            .store
            .add_image(NewImage {
                generation_id: session_id.to_owned(),
                user_id: user_id.to_owned(),
                angle_name: truncate_chars(&item.angle_name, ANGLE_NAME_CAP),
                image_summary: truncate_chars(&item.summary, SUMMARY_CAP),
                prompt: truncate_chars(&item.prompt, PROMPT_CAP),
                image_url: artifact.public_url,
                storage_path: artifact.storage_path,
                storage_backend: artifact.backend,
                image_index: u32::try_from(item.index).unwrap_or(u32::MAX),
                generation_time,
            })
            .await?;

        if let Err(e) = self.store.increment_completed(session_id).await {
            // The image record exists; surface the inconsistency in the
            // logs rather than failing an otherwise-complete item.
            warn!(session_id = %session_id, error = %e, "failed to increment completed counter");
        }

        info!(
            index = item.index,
            angle = %item.angle_name,
            seconds = generation_time,
            "item completed"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copysmith_blob::{BlobStore, MemoryBlobStore};
    use copysmith_core::SourceTexts;
    use copysmith_imagegen::MockImageEngine;
    use copysmith_state_memory::MemorySessionStore;

    use crate::transfer::MockArtifactTransfer;

    fn item(index: usize, prompt: &str) -> CreativeItem {
        CreativeItem {
            index,
            angle_name: format!("Angle_{index}"),
            summary: "summary".into(),
            prompt: prompt.into(),
        }
    }

    async fn fixture() -> (
        Arc<MockImageEngine>,
        Arc<MemorySessionStore>,
        ItemWorker,
        String,
    ) {
        let engine = Arc::new(MockImageEngine::new());
        let store = Arc::new(MemorySessionStore::new());
        let blob = Arc::new(MemoryBlobStore::new());
        let session_id = store
            .create_session("user-1", &SourceTexts::default())
            .await
            .unwrap();
        let worker = ItemWorker::new(
            Arc::clone(&engine) as Arc<dyn ImageEngine>,
            Arc::new(MockArtifactTransfer::new(blob as Arc<dyn BlobStore>)),
            Arc::clone(&store) as Arc<dyn SessionStore>,
        );
        (engine, store, worker, session_id)
    }

    #[tokio::test]
    async fn success_persists_and_increments() {
        let (engine, store, worker, session_id) = fixture().await;
        engine.succeed("p0", "https://cdn/x.png");

        let record = worker
            .process(&item(0, "p0"), &session_id, "user-1")
            .await
            .unwrap();
        assert_eq!(record.image_index, 0);
        assert_eq!(record.storage_backend, "memory");

        let found = store.get(&session_id, None).await.unwrap().unwrap();
        assert_eq!(found.images.len(), 1);
        assert_eq!(found.session.completed_images, 1);
    }

    #[tokio::test]
    async fn engine_failure_short_circuits() {
        let (engine, store, worker, session_id) = fixture().await;
        engine.fail("p0", "engine timeout");

        let result = worker.process(&item(0, "p0"), &session_id, "user-1").await;
        assert!(matches!(result, Err(EngineError::ImageEngine(_))));

        let found = store.get(&session_id, None).await.unwrap().unwrap();
        assert!(found.images.is_empty(), "nothing persisted on failure");
        assert_eq!(found.session.completed_images, 0);
    }

    #[tokio::test]
    async fn empty_url_list_is_a_failure() {
        let (engine, store, worker, session_id) = fixture().await;
        // Unscripted prompt: the mock rejects it, standing in for an
        // engine that returns no usable outcome.
        let result = worker.process(&item(0, "p0"), &session_id, "user-1").await;
        assert!(result.is_err());
        let found = store.get(&session_id, None).await.unwrap().unwrap();
        assert_eq!(found.session.completed_images, 0);
    }

    #[tokio::test]
    async fn long_fields_are_capped() {
        let (engine, store, worker, session_id) = fixture().await;
        let long_prompt = "x".repeat(5000);
        engine.succeed(long_prompt.clone(), "https://cdn/x.png");

        let mut long_item = item(0, &long_prompt);
        long_item.angle_name = "a".repeat(1000);
        long_item.summary = "s".repeat(5000);

        worker
            .process(&long_item, &session_id, "user-1")
            .await
            .unwrap();

        let found = store.get(&session_id, None).await.unwrap().unwrap();
        let image = &found.images[0];
        assert_eq!(image.angle_name.len(), ANGLE_NAME_CAP);
        assert_eq!(image.image_summary.len(), SUMMARY_CAP);
        assert_eq!(image.prompt.len(), PROMPT_CAP);
    }
}
