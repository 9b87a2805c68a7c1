//! Application state for the back-office API

use crate::config::Config;
use anyhow::Result;
use document_service::{ClientService, DocumentService, InMemoryStore, TemplateService};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub clients: ClientService,
    pub templates: TemplateService,
    pub documents: DocumentService,
}

impl AppState {
    /// Services over a fresh in-memory store, seeded per `config`
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(InMemoryStore::new());
        let clients = ClientService::new(store.clone());
        let templates = TemplateService::new(store.clone());
        let documents = DocumentService::new(store.clone(), store.clone(), store);

        if config.seed_default_templates {
            let seeded = templates.seed_defaults()?;
            tracing::info!("Seeded {} default templates", seeded);
        }

        Ok(Self {
            config,
            clients,
            templates,
            documents,
        })
    }
}
