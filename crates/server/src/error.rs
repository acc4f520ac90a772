use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use copysmith_state::StateError;

/// Errors that can occur when running the Copysmith server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The request was malformed or failed validation.
    #[error("{0}")]
    BadRequest(String),

    /// Authentication failed (missing or invalid credentials).
    #[error("{0}")]
    Unauthorized(String),

    /// The requested resource does not exist or is not owned by the
    /// caller.
    #[error("{0}")]
    NotFound(String),

    /// A backing service is temporarily unavailable.
    #[error("{0}")]
    Unavailable(String),

    /// Internal failure; details are logged, not returned.
    #[error("{0}")]
    Internal(String),
}

impl From<StateError> for ServerError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::NotFound(id) => Self::NotFound(format!("session not found: {id}")),
            StateError::Connection(msg) => {
                Self::Unavailable(format!("database service temporarily unavailable: {msg}"))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            // Internal details stay in the logs.
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_owned(),
            ),
        };

        let body = serde_json::json!({
            "success": false,
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_not_found_maps_to_404() {
        let err: ServerError = StateError::NotFound("abc".into()).into();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[test]
    fn state_connection_maps_to_unavailable() {
        let err: ServerError = StateError::Connection("refused".into()).into();
        assert!(matches!(err, ServerError::Unavailable(_)));
    }

    #[test]
    fn internal_message_is_not_leaked() {
        let response = ServerError::Internal("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
