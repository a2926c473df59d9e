//! Docent Core — configuration and shared error types.

pub mod config;
pub mod error;

pub use config::{DataPaths, DocentConfig, ProviderEndpoints};
pub use error::{Error, Result};
