//! Shared services every command opens from the loaded configuration.

use anyhow::{Context, Result};
use common::AppConfig;
use database::{open_database, ChatLogger, Database};
use memory::{embedder_from_config, SvDocumentManager, VectorStore};
use std::sync::Arc;
use tracing::info;

pub struct Runtime {
    pub config: AppConfig,
    pub store: Arc<VectorStore>,
    pub db: Arc<dyn Database>,
    pub docs: Arc<SvDocumentManager>,
    pub chat_logger: Arc<ChatLogger>,
}

impl Runtime {
    pub async fn open(config: AppConfig) -> Result<Self> {
        let paths = &config.paths;

        let store = Arc::new(
            VectorStore::open(paths.vector_dir(), embedder_from_config(&config))
                .await
                .with_context(|| {
                    format!("Failed to open vector store at {}", paths.vector_dir().display())
                })?,
        );
        let db = open_database(&config.database, paths.tables_dir(), Some(store.clone())).await?;
        let docs = Arc::new(SvDocumentManager::new(paths.docs_dir(), store.clone()));
        let chat_logger = Arc::new(
            ChatLogger::open(paths.chat_log_dir())
                .await
                .context("Failed to open chat logs")?,
        );

        info!(
            backend = db.backend_name(),
            data_dir = %paths.data_dir.display(),
            "Runtime ready"
        );

        Ok(Self {
            config,
            store,
            db,
            docs,
            chat_logger,
        })
    }
}
