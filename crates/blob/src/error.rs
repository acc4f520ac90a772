use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The HTTP request to the storage service failed.
    #[error("storage request error: {0}")]
    Http(String),

    /// The storage service rejected the upload.
    #[error("upload rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the storage service.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The backend is misconfigured.
    #[error("storage configuration error: {0}")]
    Configuration(String),
}
