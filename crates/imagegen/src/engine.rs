use async_trait::async_trait;

use crate::error::ImageEngineError;

/// Trait for running one external image-generation job to completion.
///
/// A call spans the job's whole lifetime: submission, polling, and the
/// terminal result. Implementations are stateless across invocations.
#[async_trait]
pub trait ImageEngine: Send + Sync {
    /// Submit `prompt` under the given job label, wait for the job to
    /// reach a terminal state, and return the produced image URLs.
    ///
    /// There is no overall deadline: a slow job blocks its caller until
    /// the engine reports `completed` or `failed`.
    async fn submit_and_await(
        &self,
        prompt: &str,
        label: &str,
    ) -> Result<Vec<String>, ImageEngineError>;
}
