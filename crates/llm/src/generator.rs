use async_trait::async_trait;

use crate::error::LlmError;

/// Trait for generating JSON-shaped text from a prompt pair.
///
/// Implementations return the raw model text; callers parse it with
/// [`crate::parse::parse_llm_json`].
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Run one chat completion and return the assistant message content.
    async fn generate(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
    ) -> Result<String, LlmError>;
}
