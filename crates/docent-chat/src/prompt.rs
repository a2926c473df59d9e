//! Prompt assembly from role templates.
//!
//! A category's nodes are walked in declaration order; each node's template
//! is filled from the runtime parameters and becomes one message. Model
//! families that demand strict role alternation get a post-pass that inserts
//! corrective turns between same-role neighbours.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::catalog::ModelProfile;
use crate::error::ChatError;
use crate::templates::{TemplateStore, DEFAULT_CATEGORY};
use crate::types::{ChatMessage, ROLE_ASSISTANT, ROLE_SYSTEM, ROLE_USER};

/// Node name whose position receives the caller's conversation history.
pub const HISTORY_NODE: &str = "history";

/// Content of turns inserted to restore role alternation.
pub const ALTERNATION_FILLER: &str = "[turn inserted to keep roles alternating]";

pub const KEY_QUERY: &str = "query";
pub const KEY_TEXT: &str = "text";
pub const KEY_HISTORY: &str = "history";
pub const KEY_PROMPT_TYPE: &str = "prompt_type";

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(.*?)\}").unwrap());

/// A substitution value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    /// Substituted as its elements joined by a blank line.
    List(Vec<String>),
}

impl ParamValue {
    pub fn render(&self) -> String {
        match self {
            ParamValue::Text(s) => s.clone(),
            ParamValue::List(items) => items.join("\n\n"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        ParamValue::List(items)
    }
}

/// Runtime parameters of one prompt build.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, ParamValue>,
    history: Vec<ChatMessage>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Attach conversation history. It is spliced at the `history` node and
    /// also exposed to templates as the `{history}` placeholder.
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        let rendered = history
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>();
        self.values
            .insert(KEY_HISTORY.to_string(), ParamValue::List(rendered));
        self.history = history;
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Template category to use, `prompts` when unset.
    pub fn category(&self) -> String {
        match self.values.get(KEY_PROMPT_TYPE) {
            Some(ParamValue::Text(s)) if !s.is_empty() => s.clone(),
            _ => DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// Assembled prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub messages: Vec<ChatMessage>,
    /// The reply should extend the final assistant message instead of
    /// starting a new turn.
    pub continuation: bool,
}

impl Prompt {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Build the ordered message list for one request.
pub fn build_prompt(store: &TemplateStore, params: &Params, profile: ModelProfile) -> Prompt {
    let category = params.category();
    let mut messages = Vec::new();

    for node in store.nodes(&category) {
        if node == HISTORY_NODE {
            messages.extend(
                params
                    .history()
                    .iter()
                    .filter(|m| !m.role.is_empty() && !m.content.is_empty())
                    .map(|m| ChatMessage::new(effective_role(&m.role, profile), m.content.clone())),
            );
            continue;
        }

        let role = effective_role(store.role(node), profile);

        let template = store.template(node, &category);
        if template.is_empty() {
            debug!(
                "{}",
                ChatError::TemplateMissing {
                    category: category.clone(),
                    node: node.to_string(),
                }
            );
            continue;
        }

        let content = fill_template(template, params);
        if content.is_empty() {
            continue;
        }
        messages.push(ChatMessage::new(role, content));
    }

    if profile.strict_alternation {
        messages = enforce_alternation(messages);
    }

    let continuation = messages
        .last()
        .map(|m| m.role == ROLE_ASSISTANT)
        .unwrap_or(false);

    Prompt {
        messages,
        continuation,
    }
}

/// Role actually sent for `role` under `profile`.
fn effective_role(role: &str, profile: ModelProfile) -> &str {
    if role == ROLE_SYSTEM && !profile.supports_system_role {
        ROLE_USER
    } else {
        role
    }
}

/// Placeholder keys of a template, longest first, without duplicates.
pub fn extract_keys(template: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for cap in PLACEHOLDER_RE.captures_iter(template) {
        let key = cap[1].to_string();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys.sort_by(|a, b| b.len().cmp(&a.len()));
    keys
}

/// Substitute known placeholders; unknown ones stay literally in place.
pub fn fill_template(template: &str, params: &Params) -> String {
    let mut filled = template.to_string();
    for key in extract_keys(template) {
        if let Some(value) = params.get(&key) {
            filled = filled.replace(&format!("{{{}}}", key), &value.render());
        }
    }
    filled
}

/// Insert a corrective turn between every pair of same-role neighbours.
///
/// The tail is left alone: a trailing assistant message is treated as a
/// continuation by the caller rather than answered with a filler turn.
pub fn enforce_alternation(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut out: Vec<ChatMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        if let Some(prev) = out.last() {
            if prev.role == message.role {
                let filler_role = if message.role == ROLE_USER {
                    ROLE_ASSISTANT
                } else {
                    ROLE_USER
                };
                out.push(ChatMessage::new(filler_role, ALTERNATION_FILLER));
            }
        }
        out.push(message);
    }
    out
}
