//! CLI command implementations.

pub mod catalog;
pub mod guides;
pub mod holds;
pub mod ingest;
pub mod init;
pub mod provision;
pub mod versions;

use std::sync::Arc;

use anyhow::{Context, Result};
use crate::adapters::sqlite::{initialize_database, SqliteCatalogRepository, SqliteHoldRepository};
use crate::domain::models::{Config, UnitCatalog};
use crate::domain::ports::CatalogRepository;
use crate::services::MetaService;

/// Storage handles shared by the commands that read or write holds.
pub struct AppContext {
    pub config: Config,
    pub holds: Arc<SqliteHoldRepository>,
    pub catalog_repository: Arc<SqliteCatalogRepository>,
}

impl AppContext {
    /// Open (and migrate) the configured database.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = initialize_database(&config.database)
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;
        Ok(Self {
            config: config.clone(),
            holds: Arc::new(SqliteHoldRepository::new(pool.clone())),
            catalog_repository: Arc::new(SqliteCatalogRepository::new(pool)),
        })
    }

    /// Load the unit catalog snapshot, failing when it has never been synced.
    pub async fn catalog(&self) -> Result<Arc<UnitCatalog>> {
        let catalog = self
            .catalog_repository
            .load_catalog()
            .await
            .context("Failed to load unit catalog")?;
        if catalog.unit_count() == 0 {
            anyhow::bail!("Unit catalog is empty. Run `ltd-meta catalog sync` first.");
        }
        Ok(Arc::new(catalog))
    }

    pub async fn meta_service(&self) -> Result<MetaService<SqliteHoldRepository>> {
        let catalog = self.catalog().await?;
        Ok(MetaService::new(self.holds.clone(), catalog, &self.config))
    }
}
