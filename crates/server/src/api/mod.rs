//! HTTP API surface.

pub mod generate;
pub mod generations;
pub mod health;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::response::Json;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use copysmith_engine::Pipeline;
use copysmith_state::SessionStore;

use crate::config::CopysmithConfig;
use crate::extract::WebsiteExtractor;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CopysmithConfig>,
    pub store: Arc<dyn SessionStore>,
    pub pipeline: Arc<Pipeline>,
    pub extractor: Arc<WebsiteExtractor>,
}

/// Build the application router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health::health))
        .route("/api/generate", post(generate::generate))
        .route("/api/generate-stream", post(generate::generate_stream))
        .route("/api/generations", get(generations::list))
        .route("/api/generations/{generation_id}", get(generations::get_one))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &CopysmithConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let origins = &config.server.allowed_origins;
    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// `GET /` -- service information.
async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "copysmith",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "POST /api/generate": "Generate all assets at once",
            "POST /api/generate-stream": "Stream generation progress as NDJSON",
            "GET /api/generations": "List the caller's generations",
            "GET /api/generations/{id}": "Fetch one generation",
            "GET /health": "Health check"
        }
    }))
}
