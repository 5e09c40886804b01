//! Catalog synchronization from the game's published unit list.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::errors::DomainResult;
use crate::domain::models::{CatalogConfig, Unit};
use crate::domain::ports::{CatalogRecord, CatalogRepository, UnitSource};

/// Units the game never publishes as standard fighters but boards contain.
fn special_units(version: &str) -> Vec<Unit> {
    let mut buffed = Unit::new("hell_raiser_buffed_unit_id", "Hell Raiser Buffed", 215).with_version(version);
    buffed.icon_path = "Icons/HellRaiser.png".to_string();
    let mut nest = Unit::new("pack_rat_nest_unit_id", "Pack Rat Hunting", 0).with_version(version);
    nest.icon_path = "Icons/PackRat(Footprints).png".to_string();
    vec![buffed, nest]
}

/// What a sync wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub version: String,
    pub units: usize,
    pub mercenaries: usize,
    pub upgrades: usize,
    pub special_units: usize,
}

pub struct CatalogSync<U, C>
where
    U: UnitSource,
    C: CatalogRepository,
{
    source: Arc<U>,
    repository: Arc<C>,
    min_anchor_value: u32,
}

impl<U, C> CatalogSync<U, C>
where
    U: UnitSource,
    C: CatalogRepository,
{
    pub fn new(source: Arc<U>, repository: Arc<C>, config: &CatalogConfig) -> Self {
        Self {
            source,
            repository,
            min_anchor_value: config.min_anchor_value,
        }
    }

    /// Pull every unit of `version` (the newest when `None`) into the catalog.
    ///
    /// Existing records are replaced; special units are only seeded when
    /// absent. Fighters below the configured economy floor are stored as
    /// unusable.
    pub async fn sync(&self, version: Option<&str>) -> DomainResult<SyncReport> {
        let version = match version {
            Some(v) => v.to_string(),
            None => self.source.latest_version().await?,
        };
        info!(version = %version, "Syncing unit catalog");

        let existing = self.repository.load_catalog().await?;
        let mut report = SyncReport {
            version: version.clone(),
            ..Default::default()
        };

        for unit in special_units(&version) {
            let unit = unit.with_economy_floor(self.min_anchor_value);
            if existing.unit(&unit.unit_id).is_none() {
                debug!(unit_id = %unit.unit_id, "Seeding special unit");
                self.repository.save_unit(&unit).await?;
                report.special_units += 1;
            }
        }

        for record in self.source.fetch_units(&version).await? {
            match record {
                CatalogRecord::Fighter { unit, upgrades_to } => {
                    let unit = unit.with_economy_floor(self.min_anchor_value);
                    self.repository.save_unit(&unit).await?;
                    report.units += 1;
                    for upgraded in &upgrades_to {
                        self.repository.save_upgrade(&unit.unit_id, upgraded).await?;
                        report.upgrades += 1;
                    }
                }
                CatalogRecord::Mercenary(mercenary) => {
                    self.repository.save_mercenary(&mercenary).await?;
                    report.mercenaries += 1;
                }
            }
        }

        info!(
            units = report.units,
            mercenaries = report.mercenaries,
            upgrades = report.upgrades,
            "Catalog sync finished"
        );
        Ok(report)
    }
}
