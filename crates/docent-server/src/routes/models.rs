//! Model listing route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use docent_chat::ModelsResponse;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/models", get(list_models))
}

/// GET /api/v1/models
async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(state.catalog.to_response())
}
