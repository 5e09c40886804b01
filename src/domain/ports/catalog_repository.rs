use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Mercenary, Unit, UnitCatalog};

/// Repository port for the unit catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Load a complete read-only snapshot
    async fn load_catalog(&self) -> DomainResult<UnitCatalog>;

    /// Insert or replace a fighter unit
    async fn save_unit(&self, unit: &Unit) -> DomainResult<()>;

    /// Insert or replace a mercenary
    async fn save_mercenary(&self, mercenary: &Mercenary) -> DomainResult<()>;

    /// Record that `base` upgrades into `upgraded`
    async fn save_upgrade(&self, base: &str, upgraded: &str) -> DomainResult<()>;
}
