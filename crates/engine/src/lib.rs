//! Generation pipeline.
//!
//! The [`pipeline::Pipeline`] sequences the text stages (clean -> brief
//! -> angles/email in parallel -> image prompts), persists the assets,
//! and hands the prompt list to the [`batch::BatchController`], which
//! fans out one worker per item -- all submitted in the same scheduling
//! instant -- and aggregates results in canonical order while tolerating
//! per-item failure.

pub mod batch;
pub mod clean;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod transfer;
pub mod worker;

pub use batch::{BatchConfig, BatchController};
pub use error::EngineError;
pub use pipeline::{GenerationRequest, Pipeline};
pub use transfer::{ArtifactTransfer, HttpArtifactTransfer, MockArtifactTransfer};
pub use worker::ItemWorker;
