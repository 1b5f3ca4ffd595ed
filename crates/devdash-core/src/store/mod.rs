//! Durable project storage behind one contract.
//!
//! [`FileProjectStore`] keeps every project in a single JSON document,
//! [`PgProjectStore`] keeps one row per project in Postgres, and
//! [`RemoteProjectStore`] speaks the server's HTTP API so clients can hold
//! the same trait object. Which persistent backend a server uses is decided
//! once at startup by [`open_store`].

mod file;
mod postgres;
mod remote;

pub use file::FileProjectStore;
pub use postgres::PgProjectStore;
pub use remote::RemoteProjectStore;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{DashError, Result};
use crate::types::{Project, ProjectPatch};

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Every project. An empty or missing backing store is an empty list.
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// Persist a new `Planning` project with a fresh id. Blank names are
    /// rejected with [`DashError::Validation`].
    async fn create_project(&self, name: &str) -> Result<Project>;

    async fn get_project(&self, id: &str) -> Result<Project>;

    /// Shallow-merge `patch` over the stored record and return the result.
    async fn update_project(&self, id: &str, patch: ProjectPatch) -> Result<Project>;

    async fn delete_project(&self, id: &str) -> Result<()>;
}

/// Build the configured persistent backend.
pub async fn open_store(config: &StoreConfig, root: &Path) -> Result<Arc<dyn ProjectStore>> {
    match config.backend {
        StoreBackend::File => {
            let path = config.resolved_path(root);
            tracing::info!(path = %path.display(), "using file project store");
            Ok(Arc::new(FileProjectStore::new(path)))
        }
        StoreBackend::Postgres => {
            let url = config.database_url().ok_or_else(|| {
                DashError::Config(
                    "postgres backend selected but no database URL configured".into(),
                )
            })?;
            let store = PgProjectStore::connect(&url, config.timeout()).await?;
            tracing::info!("using postgres project store");
            Ok(Arc::new(store))
        }
    }
}
