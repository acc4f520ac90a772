//! Generation endpoints: blocking and NDJSON streaming.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{error, info};

use copysmith_core::{ProgressEvent, SourceTexts};
use copysmith_engine::GenerationRequest;

use super::AppState;
use crate::auth::authenticate;
use crate::error::ServerError;

/// Request body for both generation endpoints.
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    /// Website to scrape for source text.
    pub website_url: Option<String>,
    /// Pre-extracted slide-deck text.
    pub ppt_text: Option<String>,
    /// Number of images to generate.
    #[serde(default = "default_image_count")]
    pub image_count: u32,
}

fn default_image_count() -> u32 {
    3
}

/// Validated, session-backed inputs shared by both endpoints.
struct Prepared {
    user_id: String,
    request: GenerationRequest,
}

/// Validate the request, gather source texts, and create the session.
async fn prepare(
    state: &AppState,
    headers: &HeaderMap,
    body: GenerateBody,
) -> Result<Prepared, ServerError> {
    let user_id = authenticate(headers, &state.config.auth)?;

    let max_images = state.config.limits.max_images;
    if body.image_count < 1 || body.image_count > max_images {
        return Err(ServerError::BadRequest(format!(
            "image_count must be between 1 and {max_images}"
        )));
    }

    let has_ppt = body.ppt_text.as_deref().is_some_and(|t| !t.trim().is_empty());
    if !has_ppt && body.website_url.is_none() {
        return Err(ServerError::BadRequest(
            "either website_url or ppt_text must be provided".to_owned(),
        ));
    }

    let website_text = match &body.website_url {
        Some(url) => state.extractor.extract(url).await?,
        None => String::new(),
    };
    let ppt_text = body.ppt_text.unwrap_or_default();

    if ppt_text.trim().is_empty() && website_text.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "no content found in the provided sources".to_owned(),
        ));
    }

    let sources = SourceTexts {
        ppt_text: (!ppt_text.is_empty()).then(|| ppt_text.clone()),
        website_text: (!website_text.is_empty()).then(|| website_text.clone()),
        website_url: body.website_url,
    };
    let session_id = state.store.create_session(&user_id, &sources).await?;
    info!(session_id = %session_id, user = %user_id, images = body.image_count, "generation session created");

    Ok(Prepared {
        request: GenerationRequest {
            session_id,
            user_id: user_id.clone(),
            ppt_text,
            website_text,
            image_count: body.image_count,
        },
        user_id,
    })
}

/// `POST /api/generate` -- compute everything, return once.
pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GenerateBody>,
) -> Result<impl IntoResponse, ServerError> {
    let prepared = prepare(&state, &headers, body).await?;

    match state.pipeline.run(&prepared.request).await {
        Ok(outcome) => Ok(Json(serde_json::json!({
            "success": true,
            "generation_id": outcome.generation_id,
            "user_id": prepared.user_id,
            "data": outcome,
        }))),
        Err(e) => {
            // The pipeline already marked the session failed.
            error!(session_id = %prepared.request.session_id, error = %e, "generation failed");
            Err(ServerError::Internal("generation process failed".to_owned()))
        }
    }
}

/// `POST /api/generate-stream` -- NDJSON progress stream.
///
/// Emits a `start` event, then the pipeline's event sequence. The
/// stream always terminates with exactly one `complete` or `error`
/// event.
pub async fn generate_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GenerateBody>,
) -> Result<Response, ServerError> {
    let prepared = prepare(&state, &headers, body).await?;
    let session_id = prepared.request.session_id.clone();

    let start = ProgressEvent::start(
        session_id.clone(),
        prepared.user_id.clone(),
        prepared.request.image_count,
    );
    let events = state.pipeline.run_stream(prepared.request);
    let lines = tokio_stream::once(start)
        .chain(events)
        .map(|event| Ok::<_, Infallible>(ndjson_line(&event)));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .header("x-generation-id", session_id)
        .body(Body::from_stream(lines))
        .map_err(|e| ServerError::Internal(e.to_string()))
}

/// Serialize one event as an NDJSON line.
fn ndjson_line(event: &ProgressEvent) -> String {
    match serde_json::to_string(event) {
        Ok(json) => format!("{json}\n"),
        // Events are plain data; serialization cannot realistically
        // fail, but a malformed line must not kill the stream.
        Err(e) => format!("{{\"type\":\"error\",\"message\":\"serialization: {e}\"}}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_defaults_image_count() {
        let body: GenerateBody = serde_json::from_str(r#"{"ppt_text": "deck"}"#).unwrap();
        assert_eq!(body.image_count, 3);
        assert!(body.website_url.is_none());
    }

    #[test]
    fn ndjson_line_is_single_line_json() {
        let line = ndjson_line(&ProgressEvent::image_start(2));
        assert!(line.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed["type"], "image_start");
    }
}
