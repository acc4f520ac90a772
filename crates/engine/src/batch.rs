//! Parallel batch controller.
//!
//! Fans out one worker per creative item, all spawned in the same
//! scheduling instant, and joins on every terminal outcome -- however
//! long the slowest item takes. Failures stay confined to their item;
//! the batch as a whole only reports what succeeded, re-sorted into
//! canonical order.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use copysmith_core::{CreativeItem, GeneratedImage};

use crate::worker::ItemWorker;

/// Batch controller tuning.
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    /// Optional cap on concurrently running items.
    ///
    /// `None` (the default) is the true-parallel contract: every item is
    /// submitted to the external engine at the same scheduling instant,
    /// with no pool-size throttling.
    pub max_concurrent: Option<usize>,
}

/// Fans out per-item workers and aggregates their outcomes.
pub struct BatchController {
    worker: Arc<ItemWorker>,
    config: BatchConfig,
}

impl BatchController {
    /// Create a controller with the default (unbounded) configuration.
    pub fn new(worker: Arc<ItemWorker>) -> Self {
        Self::with_config(worker, BatchConfig::default())
    }

    pub fn with_config(worker: Arc<ItemWorker>, config: BatchConfig) -> Self {
        Self { worker, config }
    }

    /// Run all items to terminal outcomes and return the successes in
    /// canonical order (ascending original index).
    ///
    /// An empty input returns immediately without scheduling any work.
    /// A batch where every item fails returns an empty vec; item
    /// failures never become a batch-level error.
    pub async fn run(
        &self,
        items: Vec<CreativeItem>,
        session_id: &str,
        user_id: &str,
    ) -> Vec<GeneratedImage> {
        self.run_with_progress(items, session_id, user_id, None)
            .await
    }

    /// Like [`run`](Self::run), additionally sending each completed
    /// image through `progress` in completion order as it finishes.
    ///
    /// The progress channel sees completion order; only the returned vec
    /// carries the canonical ordering.
    pub async fn run_with_progress(
        &self,
        items: Vec<CreativeItem>,
        session_id: &str,
        user_id: &str,
        progress: Option<mpsc::Sender<GeneratedImage>>,
    ) -> Vec<GeneratedImage> {
        if items.is_empty() {
            debug!(session_id = %session_id, "empty batch, nothing to schedule");
            return Vec::new();
        }

        let total = items.len();
        info!(
            session_id = %session_id,
            items = total,
            max_concurrent = ?self.config.max_concurrent,
            "launching image batch"
        );

        let limiter = self
            .config
            .max_concurrent
            .map(|cap| Arc::new(Semaphore::new(cap)));

        // Spawn everything up front: one task per item, no staggering.
        let mut tasks = JoinSet::new();
        for item in items {
            let worker = Arc::clone(&self.worker);
            let limiter = limiter.clone();
            let session_id = session_id.to_owned();
            let user_id = user_id.to_owned();
            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let index = item.index;
                let angle_name = item.angle_name.clone();
                let result = worker.process(&item, &session_id, &user_id).await;
                (index, angle_name, result)
            });
        }

        // Join in completion order, with no per-item or batch deadline.
        let mut completed = Vec::with_capacity(total);
        let mut finished = 0usize;
        while let Some(joined) = tasks.join_next().await {
            finished += 1;
            match joined {
                Ok((index, _, Ok(image))) => {
                    debug!(
                        session_id = %session_id,
                        index,
                        progress = format!("{finished}/{total}"),
                        "item finished"
                    );
                    if let Some(tx) = &progress {
                        // A closed receiver only disables live progress;
                        // the batch still runs to completion.
                        let _ = tx.send(image.clone()).await;
                    }
                    completed.push(image);
                }
                Ok((index, angle_name, Err(error))) => {
                    warn!(
                        session_id = %session_id,
                        index,
                        angle = %angle_name,
                        error = %error,
                        "item failed, dropping from batch"
                    );
                }
                Err(join_error) => {
                    // A panicked worker is isolated exactly like a
                    // failed one.
                    warn!(
                        session_id = %session_id,
                        error = %join_error,
                        "batch task aborted, dropping item"
                    );
                }
            }
        }

        info!(
            session_id = %session_id,
            generated = completed.len(),
            requested = total,
            "batch finished"
        );

        // Completion order is incidental; restore canonical order.
        completed.sort_by_key(|image| image.image_index);
        completed
    }
}
