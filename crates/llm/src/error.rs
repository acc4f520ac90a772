use thiserror::Error;

/// Errors that can occur during text generation.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request timed out.
    #[error("text model request timed out after {0}s")]
    Timeout(u64),

    /// The API returned an error response.
    #[error("text model API error: {0}")]
    Api(String),

    /// The model's output could not be parsed into the expected shape.
    #[error("failed to parse model response: {0}")]
    Parse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}
