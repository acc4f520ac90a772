use thiserror::Error;

/// Errors that can occur while driving an external generation job.
#[derive(Debug, Error)]
pub enum ImageEngineError {
    /// The submit request failed at the HTTP level.
    #[error("submit request error: {0}")]
    Http(String),

    /// The engine rejected the submission (non-zero application code or
    /// malformed response).
    #[error("engine rejected submission: {0}")]
    Rejected(String),

    /// The engine reported the job as failed.
    #[error("generation job failed: {0}")]
    JobFailed(String),

    /// The engine reported success without any image URLs.
    #[error("job completed without image urls")]
    NoImageUrls,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}
