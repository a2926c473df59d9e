//! Chat types shared by the assembler, adapters and the HTTP layer.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// Upstream vendor family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Manufacturer {
    Ollama,
    OpenAI,
    DeepSeek,
}

impl Manufacturer {
    pub const ALL: [Manufacturer; 3] = [Self::Ollama, Self::OpenAI, Self::DeepSeek];
}

impl std::fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Manufacturer::Ollama => write!(f, "ollama"),
            Manufacturer::OpenAI => write!(f, "openai"),
            Manufacturer::DeepSeek => write!(f, "deepseek"),
        }
    }
}

impl FromStr for Manufacturer {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "deepseek" => Ok(Self::DeepSeek),
            _ => Err(ChatError::UnsupportedManufacturer(s.to_string())),
        }
    }
}

/// Chat message, both in caller history and in assembled prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Model selection as sent by the caller.
///
/// The manufacturer stays a plain string here so an unknown vendor reaches
/// the orchestrator and is reported in-band rather than rejected at decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelChoice {
    pub manufacturer: String,
    pub model: String,
}

impl ModelChoice {
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
        }
    }
}

/// Incoming chat request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub model_choice: Option<ModelChoice>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default = "default_prompt_type")]
    pub prompt_type: String,
    /// Filename of a previously uploaded document to ground the answer in.
    #[serde(default, alias = "pdf_context")]
    pub pdf_filename: Option<String>,
}

pub fn default_prompt_type() -> String {
    crate::templates::DEFAULT_CATEGORY.to_string()
}

/// Canonical stream event, independent of the vendor wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta(String),
    Done,
    Error(String),
}

/// Advertised model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub manufacturer: String,
    pub description: Option<String>,
    pub default: bool,
}

/// Response of the model listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub total: usize,
    pub default_model: ModelInfo,
}
