use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use chrono::Utc;

use super::AppState;

/// `GET /health` -- component health for monitoring.
///
/// Pings the session store; an unreachable store makes the service
/// unhealthy and the endpoint returns 503.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.store.ping().await {
        Ok(()) => serde_json::json!({
            "status": "healthy",
            "type": state.config.state.backend,
        }),
        Err(e) => serde_json::json!({
            "status": "unhealthy",
            "type": state.config.state.backend,
            "error": e.to_string(),
        }),
    };

    let healthy = database["status"] == "healthy";
    let body = serde_json::json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "service": "copysmith",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "components": {
            "database": database,
        }
    });

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}
