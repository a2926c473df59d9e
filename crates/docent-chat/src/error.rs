//! Chat error taxonomy.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Template missing for node '{node}' in category '{category}'")]
    TemplateMissing { category: String, node: String },

    #[error("Unknown prompt category '{0}'")]
    UnknownPromptCategory(String),

    #[error("Prompt category '{0}' produced no messages")]
    EmptyPrompt(String),

    #[error("Unsupported model manufacturer: {0}")]
    UnsupportedManufacturer(String),

    #[error("Upstream HTTP error {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    #[error("Malformed stream event: {0}")]
    MalformedEvent(String),

    #[error("Connection dropped: {0}")]
    ConnectionDropped(String),

    #[error("Failed to load templates: {0}")]
    TemplateLoad(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        ChatError::ConnectionDropped(e.to_string())
    }
}
