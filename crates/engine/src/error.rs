use thiserror::Error;

use copysmith_blob::BlobError;
use copysmith_imagegen::ImageEngineError;
use copysmith_llm::LlmError;
use copysmith_state::StateError;

/// Errors from the generation pipeline.
///
/// Inside the batch stage these stay confined to one item; in the text
/// stages any of them aborts the whole generation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("text generation error: {0}")]
    Llm(#[from] LlmError),

    #[error("image engine error: {0}")]
    ImageEngine(#[from] ImageEngineError),

    #[error("artifact storage error: {0}")]
    Blob(#[from] BlobError),

    #[error("record store error: {0}")]
    State(#[from] StateError),

    #[error("artifact download error: {0}")]
    Download(String),
}
