//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
/// Prefix continuation needs `https://api.deepseek.com/beta` instead.
pub const DEFAULT_DEEPSEEK_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MANUFACTURER: &str = "ollama";
pub const DEFAULT_MODEL: &str = "qwen2.5:latest";

/// Paths to all Docent data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Uploaded documents (`data/uploads/`).
    pub uploads: PathBuf,
    /// Prompt templates (`data/prompts.yaml` unless overridden).
    pub prompts_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            uploads: root.join("uploads"),
            prompts_file: root.join("prompts.yaml"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.uploads)?;
        Ok(())
    }
}

/// Base URLs of the three upstream vendors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoints {
    pub ollama: String,
    pub openai: String,
    pub deepseek: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            ollama: DEFAULT_OLLAMA_URL.into(),
            openai: DEFAULT_OPENAI_URL.into(),
            deepseek: DEFAULT_DEEPSEEK_URL.into(),
        }
    }
}

/// Top-level Docent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocentConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    pub endpoints: ProviderEndpoints,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub deepseek_api_key: Option<String>,
    /// Manufacturer used when a request carries no model choice.
    pub default_manufacturer: String,
    pub default_model: String,
    /// Upload size ceiling in bytes.
    pub max_upload_size: usize,
}

impl DocentConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Same as [`DocentConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(data_dir: impl AsRef<Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = var("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let mut data_paths = DataPaths::new(data_dir)?;
        if let Some(prompts) = var("DOCENT_PROMPTS") {
            data_paths.prompts_file = PathBuf::from(prompts);
        }

        let endpoints = ProviderEndpoints {
            ollama: var("OLLAMA_API_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.into()),
            openai: var("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.into()),
            deepseek: var("DEEPSEEK_API_URL").unwrap_or_else(|| DEFAULT_DEEPSEEK_URL.into()),
        };

        let max_upload_size = var("MAX_UPLOAD_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE);

        Ok(Self {
            port,
            data_paths,
            endpoints,
            openai_api_key: var("OPENAI_API_KEY"),
            deepseek_api_key: var("DEEPSEEK_API_KEY"),
            default_manufacturer: var("DEFAULT_MODEL_MANUFACTURER")
                .unwrap_or_else(|| DEFAULT_MANUFACTURER.into()),
            default_model: var("DEFAULT_MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.into()),
            max_upload_size,
        })
    }
}
