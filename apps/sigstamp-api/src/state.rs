//! Application state for the signing API

use anyhow::Result;
use sigstamp_core::AuditStore;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::source::FsDocumentSource;
use crate::store::SqliteAuditStore;

pub struct AppState {
    pub source: FsDocumentSource,
    pub audit: Arc<dyn AuditStore>,
    pub signed_dir: PathBuf,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.signed_dir)?;

        let store = SqliteAuditStore::connect(&config.database_url).await;
        if !store.is_connected() {
            tracing::warn!(
                "Server is running without a database. Signing works but audit logs won't be saved."
            );
        }

        Ok(Self::with_store(
            config.pdf_dir.clone(),
            config.signed_dir.clone(),
            Arc::new(store),
        ))
    }

    /// Assemble state from parts, for tests and embedding
    pub fn with_store(pdf_dir: PathBuf, signed_dir: PathBuf, audit: Arc<dyn AuditStore>) -> Self {
        Self {
            source: FsDocumentSource::new(pdf_dir),
            audit,
            signed_dir,
        }
    }
}
