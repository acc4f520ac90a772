//! Pipeline orchestrator: sequences the text stages and the image batch.
//!
//! Stages 1-5 (clean, brief, angles/email, prompts, asset persistence)
//! have no partial-failure tolerance -- any error marks the session
//! failed and aborts. Stage 6 (the image batch) isolates failures per
//! item. The session is finalized exactly once.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

use copysmith_core::{
    CreativeAngles, CreativeItem, GenerationOutcome, ImagePromptSet, MarketingBrief,
    MarketingEmail, Performance, ProgressEvent, TextAssets,
};
use copysmith_llm::{TextGenerator, parse_llm_json};
use copysmith_state::SessionStore;

use crate::batch::BatchController;
use crate::clean::{build_source_context, clean_text};
use crate::error::EngineError;
use crate::prompts;

/// Inputs for one generation run. The session must already exist and be
/// in `processing` state.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub session_id: String,
    pub user_id: String,
    pub ppt_text: String,
    pub website_text: String,
    pub image_count: u32,
}

/// Orchestrates one generation end to end.
pub struct Pipeline {
    text: Arc<dyn TextGenerator>,
    store: Arc<dyn SessionStore>,
    batch: BatchController,
}

impl Pipeline {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        store: Arc<dyn SessionStore>,
        batch: BatchController,
    ) -> Self {
        Self { text, store, batch }
    }

    /// Blocking mode: compute everything, return once.
    ///
    /// On a text-stage or persistence error the session is marked failed
    /// and the error is returned; item-level image failures only shrink
    /// the result set.
    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationOutcome, EngineError> {
        let total_timer = tokio::time::Instant::now();

        let (assets, items) = match self.text_stages(request).await {
            Ok(staged) => staged,
            Err(e) => {
                self.mark_failed(&request.session_id, &e).await;
                return Err(e);
            }
        };

        let image_timer = tokio::time::Instant::now();
        let generated_images = self
            .batch
            .run(items, &request.session_id, &request.user_id)
            .await;
        let image_generation_time = image_timer.elapsed().as_secs_f64();
        let total_time = total_timer.elapsed().as_secs_f64();

        if let Err(e) = self.store.complete(&request.session_id, total_time).await {
            let e = EngineError::from(e);
            self.mark_failed(&request.session_id, &e).await;
            return Err(e);
        }

        info!(
            session_id = %request.session_id,
            generated = generated_images.len(),
            requested = request.image_count,
            total_seconds = total_time,
            "generation complete"
        );

        Ok(GenerationOutcome {
            generation_id: request.session_id.clone(),
            performance: Performance {
                total_time,
                image_generation_time,
                images_generated: generated_images.len(),
                images_requested: request.image_count,
            },
            marketing_brief: assets.brief,
            creative_angles: assets.angles,
            email: assets.email,
            image_prompts: assets.image_prompts,
            generated_images,
        })
    }

    /// Streaming mode: spawn the pipeline and yield progress events.
    ///
    /// The returned stream is finite and non-restartable, and always
    /// terminates with exactly one `complete` or `error` event. Dropping
    /// the stream stops event delivery but not the pipeline: in-flight
    /// items run to completion and the session is still finalized.
    pub fn run_stream(self: &Arc<Self>, request: GenerationRequest) -> ReceiverStream<ProgressEvent> {
        let (tx, rx) = mpsc::channel(32);
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.stream_inner(request, tx).await;
        });
        ReceiverStream::new(rx)
    }

    async fn stream_inner(&self, request: GenerationRequest, tx: mpsc::Sender<ProgressEvent>) {
        let total_timer = tokio::time::Instant::now();

        macro_rules! stage {
            ($result:expr) => {
                match $result {
                    Ok(value) => value,
                    Err(e) => {
                        let e = EngineError::from(e);
                        self.mark_failed(&request.session_id, &e).await;
                        let _ = tx
                            .send(ProgressEvent::error(
                                request.session_id.clone(),
                                e.to_string(),
                            ))
                            .await;
                        return;
                    }
                }
            };
        }

        // Stages 1-2: clean, then brief. The brief gates everything.
        let context = build_source_context(
            &clean_text(&request.ppt_text),
            &clean_text(&request.website_text),
        );
        let brief = stage!(self.stage_brief(&context).await);
        let _ = tx.send(ProgressEvent::brief(brief.clone())).await;

        // Stage 3: angles and email, concurrently against the brief.
        let (angles, email) =
            stage!(self.stage_angles_email(&brief, request.image_count).await);
        let _ = tx.send(ProgressEvent::email(email.clone())).await;

        // Stage 4: image prompts from brief + angles.
        let image_prompts = stage!(self.stage_image_prompts(&brief, &angles).await);

        // Stage 5: persist the four text assets and the expected count.
        let assets = TextAssets {
            brief,
            angles,
            email,
            image_prompts,
        };
        let items = CreativeItem::from_prompt_set(&assets.image_prompts);
        let count = u32::try_from(items.len()).unwrap_or(u32::MAX);
        stage!(self.store.update_assets(&request.session_id, &assets, count).await);

        let _ = tx.send(ProgressEvent::image_start(count)).await;

        // Stage 6: the batch, forwarding each completion as it happens.
        let image_timer = tokio::time::Instant::now();
        let (img_tx, mut img_rx) = mpsc::channel(16);
        let batch_fut = self.batch.run_with_progress(
            items,
            &request.session_id,
            &request.user_id,
            Some(img_tx),
        );
        tokio::pin!(batch_fut);

        let generated_images = loop {
            tokio::select! {
                Some(image) = img_rx.recv() => {
                    let _ = tx.send(ProgressEvent::image(image)).await;
                }
                images = &mut batch_fut => break images,
            }
        };
        // Drain completions that raced the batch future's resolution.
        while let Ok(image) = img_rx.try_recv() {
            let _ = tx.send(ProgressEvent::image(image)).await;
        }

        let image_generation_time = image_timer.elapsed().as_secs_f64();
        let total_time = total_timer.elapsed().as_secs_f64();

        // Stage 7: finalize exactly once.
        stage!(self.store.complete(&request.session_id, total_time).await);

        let _ = tx
            .send(ProgressEvent::complete(
                request.session_id.clone(),
                Performance {
                    total_time,
                    image_generation_time,
                    images_generated: generated_images.len(),
                    images_requested: request.image_count,
                },
            ))
            .await;
    }

    /// Stages 1-5 for the blocking path.
    async fn text_stages(
        &self,
        request: &GenerationRequest,
    ) -> Result<(TextAssets, Vec<CreativeItem>), EngineError> {
        let context = build_source_context(
            &clean_text(&request.ppt_text),
            &clean_text(&request.website_text),
        );

        let brief = self.stage_brief(&context).await?;
        let (angles, email) = self.stage_angles_email(&brief, request.image_count).await?;
        let image_prompts = self.stage_image_prompts(&brief, &angles).await?;

        let assets = TextAssets {
            brief,
            angles,
            email,
            image_prompts,
        };
        let items = CreativeItem::from_prompt_set(&assets.image_prompts);
        let count = u32::try_from(items.len()).unwrap_or(u32::MAX);
        self.store
            .update_assets(&request.session_id, &assets, count)
            .await?;

        Ok((assets, items))
    }

    async fn stage_brief(&self, context: &str) -> Result<MarketingBrief, EngineError> {
        let spec = prompts::marketing_brief(context);
        let raw = self
            .text
            .generate(&spec.system, &spec.user, spec.temperature)
            .await?;
        Ok(parse_llm_json(&raw)?)
    }

    async fn stage_angles_email(
        &self,
        brief: &MarketingBrief,
        count: u32,
    ) -> Result<(CreativeAngles, MarketingEmail), EngineError> {
        let angles_spec = prompts::creative_angles(brief, count)?;
        let email_spec = prompts::marketing_email(brief)?;

        // No dependency between the two; run them concurrently.
        let (angles_raw, email_raw) = tokio::join!(
            self.text
                .generate(&angles_spec.system, &angles_spec.user, angles_spec.temperature),
            self.text
                .generate(&email_spec.system, &email_spec.user, email_spec.temperature),
        );

        let angles: CreativeAngles = parse_llm_json(&angles_raw?)?;
        let email: MarketingEmail = parse_llm_json(&email_raw?)?;
        Ok((angles, email))
    }

    async fn stage_image_prompts(
        &self,
        brief: &MarketingBrief,
        angles: &CreativeAngles,
    ) -> Result<ImagePromptSet, EngineError> {
        let spec = prompts::image_prompts(brief, angles)?;
        let raw = self
            .text
            .generate(&spec.system, &spec.user, spec.temperature)
            .await?;
        Ok(parse_llm_json(&raw)?)
    }

    /// Best-effort failure marking; a store error here is only logged.
    async fn mark_failed(&self, session_id: &str, cause: &EngineError) {
        error!(session_id = %session_id, error = %cause, "generation failed");
        if let Err(e) = self.store.fail(session_id, &cause.to_string()).await {
            warn!(session_id = %session_id, error = %e, "failed to mark session as failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    use copysmith_blob::{BlobStore, MemoryBlobStore};
    use copysmith_core::{SessionStatus, SourceTexts};
    use copysmith_imagegen::{ImageEngine, MockImageEngine};
    use copysmith_llm::{FailingTextGenerator, MockTextGenerator};
    use copysmith_state_memory::MemorySessionStore;

    use crate::transfer::MockArtifactTransfer;
    use crate::worker::ItemWorker;

    const BRIEF_JSON: &str = r#"{
        "product_or_service": "Deploy bot",
        "target_audience": "Platform teams",
        "value_proposition": "Safer releases",
        "key_benefits": ["rollbacks", "canaries"],
        "tone_of_voice": "confident",
        "call_to_action": "Book a demo"
    }"#;

    const ANGLES_JSON: &str = r#"{
        "angles": [
            {"angle_name": "Pipeline", "intent": "show flow", "visual_focus": "workflow"},
            {"angle_name": "Safety net", "intent": "show rollback", "visual_focus": "outcome"}
        ]
    }"#;

    const EMAIL_JSON: &str = r#"{"subject": "Ship safer", "body": "Hello team,..."}"#;

    const PROMPTS_JSON: &str = r#"{
        "prompts": [
            {"angle_name": "Pipeline", "summary": "The release flow", "prompt": "prompt-0"},
            {"angle_name": "Safety net", "summary": "Rollback view", "prompt": "prompt-1"}
        ]
    }"#;

    fn scripted_text() -> MockTextGenerator {
        MockTextGenerator::new()
            .respond_to("marketing brief", BRIEF_JSON)
            .respond_to("creative angles", ANGLES_JSON)
            .respond_to("marketing email", EMAIL_JSON)
            .respond_to("image-generation prompts", PROMPTS_JSON)
    }

    struct Fixture {
        engine: Arc<MockImageEngine>,
        store: Arc<MemorySessionStore>,
        pipeline: Arc<Pipeline>,
        request: GenerationRequest,
    }

    async fn fixture(text: Arc<dyn TextGenerator>) -> Fixture {
        let engine = Arc::new(MockImageEngine::new());
        let store = Arc::new(MemorySessionStore::new());
        let blob = Arc::new(MemoryBlobStore::new());
        let session_id = store
            .create_session("user-1", &SourceTexts::default())
            .await
            .unwrap();

        let worker = Arc::new(ItemWorker::new(
            Arc::clone(&engine) as Arc<dyn ImageEngine>,
            Arc::new(MockArtifactTransfer::new(blob as Arc<dyn BlobStore>)),
            Arc::clone(&store) as Arc<dyn SessionStore>,
        ));
        let pipeline = Arc::new(Pipeline::new(
            text,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            BatchController::new(worker),
        ));
        let request = GenerationRequest {
            session_id,
            user_id: "user-1".into(),
            ppt_text: "deck   text\n\n\n\nmore".into(),
            website_text: "site text".into(),
            image_count: 2,
        };
        Fixture {
            engine,
            store,
            pipeline,
            request,
        }
    }

    #[tokio::test]
    async fn blocking_happy_path() {
        let f = fixture(Arc::new(scripted_text())).await;
        f.engine.succeed("prompt-0", "https://cdn/0.png");
        f.engine.succeed("prompt-1", "https://cdn/1.png");

        let outcome = f.pipeline.run(&f.request).await.unwrap();

        assert_eq!(outcome.generated_images.len(), 2);
        assert_eq!(outcome.generated_images[0].image_index, 0);
        assert_eq!(outcome.generated_images[1].image_index, 1);
        assert_eq!(outcome.marketing_brief.product_or_service, "Deploy bot");
        assert_eq!(outcome.email.subject, "Ship safer");
        assert_eq!(outcome.performance.images_generated, 2);

        let found = f.store.get(&f.request.session_id, None).await.unwrap().unwrap();
        assert_eq!(found.session.status, SessionStatus::Completed);
        assert_eq!(found.session.total_images, 2);
        assert_eq!(found.session.completed_images, 2);
        assert!(found.session.generation_time.is_some());
    }

    #[tokio::test]
    async fn scenario_middle_item_fails() {
        let f = fixture(Arc::new(scripted_text())).await;
        // Scenario from the batch contract: B fails, A and C succeed.
        f.engine.succeed("prompt-0", "https://cdn/a.png");
        f.engine.fail("prompt-1", "engine timeout");

        let outcome = f.pipeline.run(&f.request).await.unwrap();
        assert_eq!(outcome.generated_images.len(), 1);
        assert_eq!(outcome.generated_images[0].image_index, 0);

        let found = f.store.get(&f.request.session_id, None).await.unwrap().unwrap();
        assert_eq!(found.session.status, SessionStatus::Completed);
        assert_eq!(found.session.completed_images, 1);
    }

    #[tokio::test]
    async fn text_stage_failure_marks_session_failed() {
        let f = fixture(Arc::new(FailingTextGenerator::new("model down"))).await;

        let result = f.pipeline.run(&f.request).await;
        assert!(matches!(result, Err(EngineError::Llm(_))));

        let found = f.store.get(&f.request.session_id, None).await.unwrap().unwrap();
        assert_eq!(found.session.status, SessionStatus::Failed);
        assert!(found.session.error_message.as_deref().unwrap().contains("model down"));
    }

    #[tokio::test]
    async fn malformed_brief_is_a_stage_failure() {
        let text = MockTextGenerator::new()
            .respond_to("marketing brief", "not json at all");
        let f = fixture(Arc::new(text)).await;

        let result = f.pipeline.run(&f.request).await;
        assert!(matches!(result, Err(EngineError::Llm(_))));
        let found = f.store.get(&f.request.session_id, None).await.unwrap().unwrap();
        assert_eq!(found.session.status, SessionStatus::Failed);
    }

    async fn collect_events(f: &Fixture) -> Vec<ProgressEvent> {
        f.pipeline
            .run_stream(f.request.clone())
            .collect::<Vec<_>>()
            .await
    }

    fn event_types(events: &[ProgressEvent]) -> Vec<String> {
        events
            .iter()
            .map(|e| {
                serde_json::to_value(e).unwrap()["type"]
                    .as_str()
                    .unwrap()
                    .to_owned()
            })
            .collect()
    }

    #[tokio::test]
    async fn stream_all_success_ends_with_complete() {
        let f = fixture(Arc::new(scripted_text())).await;
        f.engine.succeed("prompt-0", "https://cdn/0.png");
        f.engine.succeed("prompt-1", "https://cdn/1.png");

        let events = collect_events(&f).await;
        let types = event_types(&events);
        assert_eq!(
            types,
            vec!["brief", "email", "image_start", "image", "image", "complete"]
        );
        assert!(events.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn stream_mixed_failure_still_completes() {
        let f = fixture(Arc::new(scripted_text())).await;
        f.engine.succeed("prompt-0", "https://cdn/0.png");
        f.engine.fail("prompt-1", "engine timeout");

        let events = collect_events(&f).await;
        let types = event_types(&events);
        assert_eq!(
            types,
            vec!["brief", "email", "image_start", "image", "complete"]
        );
    }

    #[tokio::test]
    async fn stream_all_items_failing_still_completes() {
        let f = fixture(Arc::new(scripted_text())).await;
        f.engine.fail("prompt-0", "no");
        f.engine.fail("prompt-1", "no");

        let events = collect_events(&f).await;
        let types = event_types(&events);
        assert_eq!(types, vec!["brief", "email", "image_start", "complete"]);
    }

    #[tokio::test]
    async fn stream_stage_failure_ends_with_error() {
        let f = fixture(Arc::new(FailingTextGenerator::new("model down"))).await;

        let events = collect_events(&f).await;
        let types = event_types(&events);
        assert_eq!(types, vec!["error"]);

        let found = f.store.get(&f.request.session_id, None).await.unwrap().unwrap();
        assert_eq!(found.session.status, SessionStatus::Failed);
    }

    #[tokio::test]
    async fn stream_assets_persisted_before_images_start() {
        let f = fixture(Arc::new(scripted_text())).await;
        f.engine.succeed("prompt-0", "https://cdn/0.png");
        f.engine.succeed("prompt-1", "https://cdn/1.png");

        let mut stream = f.pipeline.run_stream(f.request.clone());
        // Consume up to image_start, then check the store.
        loop {
            let event = stream.next().await.expect("stream ended early");
            if matches!(event, ProgressEvent::ImageStart { .. }) {
                break;
            }
        }
        let found = f.store.get(&f.request.session_id, None).await.unwrap().unwrap();
        assert_eq!(found.session.total_images, 2);
        assert!(found.session.marketing_brief.is_some());
        // Drain the rest so the pipeline task finishes cleanly.
        while stream.next().await.is_some() {}
    }
}
