//! Prompt template store.
//!
//! Templates are declared in YAML as `category -> node -> template`, with a
//! separate `roles` mapping from node name to conversation role. Node order
//! inside a category is the declaration order in the file.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::info;

use crate::error::ChatError;
use crate::types::ROLE_ASSISTANT;

/// Category used when a request names none.
pub const DEFAULT_CATEGORY: &str = "prompts";

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    roles: HashMap<String, String>,
    categories: Mapping,
}

/// A named template within a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNode {
    pub name: String,
    pub template: String,
}

/// Immutable template and role configuration, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    categories: Vec<(String, Vec<TemplateNode>)>,
    roles: HashMap<String, String>,
}

impl TemplateStore {
    /// Load templates from a YAML file. Missing or malformed files are fatal.
    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ChatError::TemplateLoad(format!("{}: {}", path.display(), e))
        })?;
        let store = Self::from_yaml(&raw)?;
        info!(
            "Loaded {} prompt categories from {}",
            store.categories.len(),
            path.display()
        );
        Ok(store)
    }

    /// Parse templates from YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self, ChatError> {
        let file: TemplateFile =
            serde_yaml::from_str(raw).map_err(|e| ChatError::TemplateLoad(e.to_string()))?;

        let mut categories = Vec::with_capacity(file.categories.len());
        for (key, value) in file.categories {
            let category = scalar_key(&key, "category")?;
            let nodes = match value {
                Value::Mapping(nodes) => parse_nodes(&category, nodes)?,
                _ => {
                    return Err(ChatError::TemplateLoad(format!(
                        "category '{}' must be a mapping of node templates",
                        category
                    )))
                }
            };
            categories.push((category, nodes));
        }

        Ok(Self {
            categories,
            roles: file.roles,
        })
    }

    /// Node names of a category in declaration order. Unknown categories are empty.
    pub fn nodes(&self, category: &str) -> Vec<&str> {
        self.category(category)
            .map(|nodes| nodes.iter().map(|n| n.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Template text for a node, or `""` when absent.
    pub fn template(&self, node: &str, category: &str) -> &str {
        self.category(category)
            .and_then(|nodes| nodes.iter().find(|n| n.name == node))
            .map(|n| n.template.as_str())
            .unwrap_or("")
    }

    /// Canonical role of a node; unmapped nodes speak as the assistant.
    pub fn role(&self, node: &str) -> &str {
        self.roles
            .get(node)
            .map(String::as_str)
            .unwrap_or(ROLE_ASSISTANT)
    }

    /// All nodes of one category.
    pub fn category(&self, category: &str) -> Option<&[TemplateNode]> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, nodes)| nodes.as_slice())
    }

    /// Category names in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }
}

fn parse_nodes(category: &str, nodes: Mapping) -> Result<Vec<TemplateNode>, ChatError> {
    nodes
        .into_iter()
        .map(|(key, value)| {
            let name = scalar_key(&key, "node")?;
            let template = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                _ => {
                    return Err(ChatError::TemplateLoad(format!(
                        "template '{}.{}' must be a string",
                        category, name
                    )))
                }
            };
            Ok(TemplateNode { name, template })
        })
        .collect()
}

fn scalar_key(key: &Value, what: &str) -> Result<String, ChatError> {
    key.as_str()
        .map(str::to_string)
        .ok_or_else(|| ChatError::TemplateLoad(format!("{} names must be strings", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
roles:
  system: system
  query: user
categories:
  prompts:
    system: "You are a translator."
    query: "{text}\n\n{query}"
    closing: "Ready."
  empty_node:
    system: ~
"#;

    #[test]
    fn test_nodes_keep_declaration_order() {
        let store = TemplateStore::from_yaml(SAMPLE).unwrap();
        assert_eq!(store.nodes("prompts"), vec!["system", "query", "closing"]);
        assert_eq!(store.categories().collect::<Vec<_>>(), vec!["prompts", "empty_node"]);
    }

    #[test]
    fn test_template_lookup() {
        let store = TemplateStore::from_yaml(SAMPLE).unwrap();
        assert_eq!(store.template("system", "prompts"), "You are a translator.");
        assert_eq!(store.template("System", "prompts"), "");
        assert_eq!(store.template("system", "missing"), "");
        assert_eq!(store.template("system", "empty_node"), "");
        assert!(store.nodes("missing").is_empty());
    }

    #[test]
    fn test_role_defaults_to_assistant() {
        let store = TemplateStore::from_yaml(SAMPLE).unwrap();
        assert_eq!(store.role("query"), "user");
        assert_eq!(store.role("closing"), "assistant");
    }

    #[test]
    fn test_malformed_sources_fail() {
        assert!(TemplateStore::from_yaml("roles: {}").is_err());
        assert!(TemplateStore::from_yaml("categories:\n  prompts: [a, b]").is_err());
        assert!(TemplateStore::from_yaml("categories:\n  prompts:\n    system: [x]").is_err());
        assert!(TemplateStore::from_yaml("categories: [unclosed").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TemplateStore::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ChatError::TemplateLoad(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        let store = TemplateStore::load(&path).unwrap();
        assert_eq!(store.nodes("prompts").len(), 3);
    }
}
