//! Streaming chat route.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{HeaderName, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use docent_chat::{ChatRequest, ChatTurn, ModelChoice};
use tokio_stream::StreamExt;
use tracing::{debug, info};

use super::error_response;
use crate::state::AppState;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat/stream", post(stream_chat))
}

/// POST /api/v1/chat/stream — plain-text token stream.
///
/// Failures after the request is accepted arrive as a final
/// `Error generating response: ...` chunk with status 200.
async fn stream_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    if req.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message must not be empty");
    }

    let request_id = uuid::Uuid::new_v4();
    let model = req.model_choice.unwrap_or_else(|| {
        ModelChoice::new(state.catalog.default_manufacturer(), state.catalog.default_model())
    });

    let context = req.pdf_filename.as_deref().and_then(|name| {
        let text = state.documents.text(name);
        if text.is_none() {
            debug!(%request_id, "No uploaded document named {}", name);
        }
        text
    });

    info!(
        %request_id,
        "Chat stream: {}/{} prompt_type={} history={} grounded={}",
        model.manufacturer,
        model.model,
        req.prompt_type,
        req.history.len(),
        context.is_some()
    );

    let chunks = state.chat.generate_response(ChatTurn {
        message: req.message,
        model,
        history: req.history,
        prompt_type: req.prompt_type,
        context,
    });

    let body = Body::from_stream(chunks.map(Ok::<_, Infallible>));

    (
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (X_ACCEL_BUFFERING, "no"),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}
