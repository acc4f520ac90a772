use thiserror::Error;

/// Errors from session store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("session {id} is already {status}")]
    AlreadyTerminal { id: String, status: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}
