//! HTTP surface of the Docent chat server.

pub mod documents;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;

/// Prompt templates written to the data directory on first start.
pub const DEFAULT_PROMPTS: &str = include_str!("../prompts.yaml");
