//! Prompt template introspection routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docent_chat::templates::TemplateNode;
use docent_chat::{default_prompt_type, ChatError, ChatMessage, ChatTurn, ModelChoice};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error_response;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct Subtype {
    name: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct CategoryView {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    subtypes: Vec<Subtype>,
}

impl CategoryView {
    fn new(category: &str, nodes: &[TemplateNode]) -> Self {
        Self {
            kind: category.to_string(),
            name: display_name(category),
            subtypes: nodes
                .iter()
                .map(|n| Subtype {
                    name: n.name.clone(),
                    content: n.template.clone(),
                })
                .collect(),
        }
    }
}

/// Body of `POST /prompt/generate`.
#[derive(Debug, Deserialize)]
struct GenerateRequest {
    query: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    history: Vec<ChatMessage>,
    #[serde(default = "default_prompt_type")]
    prompt_type: String,
    #[serde(default)]
    model_choice: Option<ModelChoice>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/prompt/generate", post(generate_prompt))
        .route("/prompt/templates", get(list_templates))
        .route("/prompt/template/{category}", get(get_template))
}

/// POST /api/v1/prompt/generate — the messages a chat turn would send.
async fn generate_prompt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Response {
    let model = req.model_choice.unwrap_or_else(|| {
        ModelChoice::new(state.catalog.default_manufacturer(), state.catalog.default_model())
    });
    let turn = ChatTurn {
        message: req.query,
        model,
        history: req.history,
        prompt_type: req.prompt_type,
        context: req.text,
    };

    match state.chat.assemble(&turn) {
        Ok((manufacturer, prompt)) => {
            debug!(
                "Generated {} messages for {}/{}",
                prompt.messages.len(),
                manufacturer,
                turn.model.model
            );
            Json(prompt).into_response()
        }
        Err(e @ ChatError::UnknownPromptCategory(_)) => {
            error_response(StatusCode::NOT_FOUND, e.to_string())
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// GET /api/v1/prompt/templates
async fn list_templates(State(state): State<Arc<AppState>>) -> Json<Vec<CategoryView>> {
    let store = state.chat.templates();
    let views = store
        .categories()
        .filter_map(|name| store.category(name).map(|nodes| CategoryView::new(name, nodes)))
        .collect();
    Json(views)
}

/// GET /api/v1/prompt/template/{category}
async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Response {
    match state.chat.templates().category(&category) {
        Some(nodes) => Json(CategoryView::new(&category, nodes)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("unknown prompt category: {}", category),
        ),
    }
}

/// `"reading_guide"` → `"Reading Guide"`.
fn display_name(category: &str) -> String {
    category
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("prompts"), "Prompts");
        assert_eq!(display_name("reading_guide"), "Reading Guide");
        assert_eq!(display_name("_x__y"), "X Y");
    }

    #[test]
    fn test_category_view_keeps_node_order() {
        let nodes = vec![
            TemplateNode { name: "system".into(), template: "s".into() },
            TemplateNode { name: "history".into(), template: String::new() },
            TemplateNode { name: "query".into(), template: "{query}".into() },
        ];
        let view = CategoryView::new("translate", &nodes);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["type"], "translate");
        assert_eq!(json["name"], "Translate");
        assert_eq!(json["subtypes"][0]["name"], "system");
        assert_eq!(json["subtypes"][2]["content"], "{query}");
    }
}
