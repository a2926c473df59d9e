//! Shared application state.

use std::sync::Arc;

use docent_chat::{ChatService, HttpPool, ModelCatalog, ProviderSet, TemplateStore};
use docent_core::DocentConfig;

use crate::documents::DocumentStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: DocentConfig,
    pub chat: ChatService,
    pub catalog: ModelCatalog,
    pub documents: DocumentStore,
}

impl AppState {
    pub fn new(config: DocentConfig, templates: TemplateStore, pool: HttpPool) -> Self {
        let providers = ProviderSet::from_config(&config, pool);
        let catalog = ModelCatalog::new(
            config.default_manufacturer.clone(),
            config.default_model.clone(),
        );

        Self {
            chat: ChatService::new(Arc::new(templates), providers),
            catalog,
            documents: DocumentStore::new(),
            config,
        }
    }
}
