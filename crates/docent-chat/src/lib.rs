//! Document-grounded chat over external LLM backends (Ollama/OpenAI/DeepSeek).
//!
//! Prompts are assembled from declarative role templates, sent to the chosen
//! vendor as a streaming request, and the vendor's wire format is normalized
//! into one plain-text token stream.

pub mod catalog;
pub mod error;
pub mod normalize;
pub mod prompt;
pub mod providers;
pub mod service;
pub mod templates;
pub mod types;

pub use catalog::{ModelCatalog, ModelProfile};
pub use error::ChatError;
pub use prompt::{build_prompt, ParamValue, Params, Prompt};
pub use providers::{HttpPool, ProviderAdapter, ProviderSet};
pub use service::{ChatService, ChatTurn, ERROR_PREFIX};
pub use templates::TemplateStore;
pub use types::*;
