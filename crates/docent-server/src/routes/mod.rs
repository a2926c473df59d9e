//! HTTP route handlers under `/api/v1`.

pub mod chat;
pub mod files;
pub mod models;
pub mod prompts;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .merge(chat::routes())
        .merge(models::routes())
        .merge(files::routes(state.config.max_upload_size))
        .merge(prompts::routes())
}

/// `{"detail": ...}` error body with the given status.
pub(crate) fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "detail": detail.into() }))).into_response()
}
