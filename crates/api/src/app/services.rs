use std::sync::Arc;

use warehouse_core::StorageError;
use warehouse_infra::db::{Database, InMemoryDatabase, PostgresDatabase};
use warehouse_infra::store::{CategoryStore, ProductStore};

use crate::config::ApiConfig;

/// Backend handle shared by both stores.
pub type SharedDatabase = Arc<dyn Database>;

/// Stores the handlers call, wired to one backend.
#[derive(Clone)]
pub struct AppServices {
    pub categories: CategoryStore<SharedDatabase>,
    pub products: ProductStore<SharedDatabase>,
    db: SharedDatabase,
}

impl AppServices {
    pub fn new(db: SharedDatabase) -> Self {
        Self {
            categories: CategoryStore::new(db.clone()),
            products: ProductStore::new(db.clone()),
            db,
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryDatabase::new()))
    }

    /// Postgres when `DATABASE_URL` is configured, in-memory otherwise.
    pub async fn build(config: &ApiConfig) -> Result<Self, StorageError> {
        match &config.database_url {
            Some(url) => {
                let db = PostgresDatabase::connect(url, config.max_connections).await?;
                tracing::info!(max_connections = config.max_connections, "using postgres backend");
                Ok(Self::new(Arc::new(db)))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory backend (data is not persisted)");
                Ok(Self::in_memory())
            }
        }
    }

    /// Provision tables and indexes if absent.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.db.ensure_schema().await
    }
}
