//! Advertised models and per-model prompt behaviour.

use crate::types::{Manufacturer, ModelInfo, ModelsResponse};

pub const OLLAMA_MODELS: &[(&str, &str)] = &[
    ("qwen2.5:latest", "Qwen 2.5, suited to Chinese/English translation"),
    ("llama2", "Meta Llama 2, multilingual"),
    ("mistral", "Mistral open model, multilingual tasks"),
];
pub const OPENAI_MODELS: &[(&str, &str)] = &[
    ("gpt-3.5-turbo", "OpenAI GPT-3.5, general conversation and translation"),
    ("gpt-4", "OpenAI GPT-4, stronger comprehension and translation"),
];
pub const DEEPSEEK_MODELS: &[(&str, &str)] = &[
    ("deepseek-chat", "DeepSeek chat model, Chinese/English dialogue"),
    ("deepseek-coder", "DeepSeek code model, technical documents"),
    ("deepseek-reasoner", "DeepSeek reasoning model, streams its reasoning"),
];

/// Prompt constraints of one model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelProfile {
    /// Adjacent messages must not share a role.
    pub strict_alternation: bool,
    /// Whether a `system` message is accepted; if not it is sent as `user`.
    pub supports_system_role: bool,
}

impl Default for ModelProfile {
    fn default() -> Self {
        Self {
            strict_alternation: false,
            supports_system_role: true,
        }
    }
}

impl ModelProfile {
    /// Profile for a vendor/model pair.
    pub fn for_model(manufacturer: Manufacturer, model: &str) -> Self {
        let model = model.to_lowercase();
        match manufacturer {
            Manufacturer::DeepSeek if model.contains("reasoner") => Self {
                strict_alternation: true,
                supports_system_role: true,
            },
            // o1-preview / o1-mini reject system messages and interleaved turns.
            Manufacturer::OpenAI if model.starts_with("o1-") => Self {
                strict_alternation: true,
                supports_system_role: false,
            },
            Manufacturer::Ollama if model.contains("deepseek-r1") => Self {
                strict_alternation: true,
                supports_system_role: true,
            },
            _ => Self::default(),
        }
    }
}

/// Models exposed through the listing endpoint.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    default_manufacturer: String,
    default_model: String,
}

impl ModelCatalog {
    pub fn new(default_manufacturer: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            default_manufacturer: default_manufacturer.into(),
            default_model: default_model.into(),
        }
    }

    pub fn default_manufacturer(&self) -> &str {
        &self.default_manufacturer
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn is_default(&self, manufacturer: &str, model: &str) -> bool {
        match (
            manufacturer.parse::<Manufacturer>(),
            self.default_manufacturer.parse::<Manufacturer>(),
        ) {
            (Ok(listed), Ok(configured)) => listed == configured && model == self.default_model,
            _ => false,
        }
    }

    /// All advertised models, vendor by vendor.
    pub fn models(&self) -> Vec<ModelInfo> {
        Manufacturer::ALL
            .iter()
            .flat_map(|m| {
                let manufacturer = m.to_string();
                models_for(*m).iter().map(move |(name, description)| ModelInfo {
                    name: name.to_string(),
                    manufacturer: manufacturer.clone(),
                    description: Some(description.to_string()),
                    default: false,
                })
            })
            .map(|mut info| {
                info.default = self.is_default(&info.manufacturer, &info.name);
                info
            })
            .collect()
    }

    pub fn default_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.default_model.clone(),
            manufacturer: self.default_manufacturer.clone(),
            description: Some(describe(&self.default_manufacturer, &self.default_model)),
            default: true,
        }
    }

    pub fn to_response(&self) -> ModelsResponse {
        let models = self.models();
        ModelsResponse {
            total: models.len(),
            models,
            default_model: self.default_info(),
        }
    }
}

fn models_for(manufacturer: Manufacturer) -> &'static [(&'static str, &'static str)] {
    match manufacturer {
        Manufacturer::Ollama => OLLAMA_MODELS,
        Manufacturer::OpenAI => OPENAI_MODELS,
        Manufacturer::DeepSeek => DEEPSEEK_MODELS,
    }
}

/// Description of a model, falling back to "<vendor> <model>".
pub fn describe(manufacturer: &str, model: &str) -> String {
    manufacturer
        .parse::<Manufacturer>()
        .ok()
        .and_then(|m| models_for(m).iter().find(|(name, _)| *name == model))
        .map(|(_, description)| description.to_string())
        .unwrap_or_else(|| format!("{} {}", manufacturer, model))
}
