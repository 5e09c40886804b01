//! Read-side façade over holds: cached rankings, versions, provisioning and
//! guide generation.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::adapters::cache::{RankingCache, RankingKey};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Config, Guide, GuideConfig, ScoringConfig, Stats, TableKey, UnitCatalog, GUIDE_WAVES,
};
use crate::domain::ports::HoldRepository;
use crate::services::guide_composer::{AnchorStats, GuideComposer, WaveStats};
use crate::services::scorer::{bounty, RankQuery, Scorer, WAVE_BOUNTIES};

/// A ranking request as issued by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldsRequest {
    /// Unit id or display name
    pub anchor_unit: String,
    pub wave: u8,
    /// Defaults to the newest recorded version
    pub version: Option<String>,
    pub secondary: Option<String>,
}

/// Every wave that carries a bounty and can be provisioned.
pub fn provisionable_waves() -> RangeInclusive<u8> {
    1..=WAVE_BOUNTIES.len() as u8
}

pub struct MetaService<R: HoldRepository> {
    repository: Arc<R>,
    catalog: Arc<UnitCatalog>,
    scorer: Scorer<R>,
    cache: RankingCache,
    scoring: ScoringConfig,
    guides: GuideConfig,
}

impl<R: HoldRepository> MetaService<R> {
    pub fn new(repository: Arc<R>, catalog: Arc<UnitCatalog>, config: &Config) -> Self {
        let incubators = config.ingest.incubators.iter().map(|r| r.unit_id.clone());
        Self {
            scorer: Scorer::new(repository.clone(), catalog.clone(), incubators),
            cache: RankingCache::with_ttl(Duration::from_secs(config.scoring.cache_ttl_secs)),
            repository,
            catalog,
            scoring: config.scoring.clone(),
            guides: config.guides.clone(),
        }
    }

    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    /// Resolve a unit given by id or (case-insensitive) name.
    pub fn resolve_unit(&self, key: &str) -> DomainResult<String> {
        if let Some(unit) = self.catalog.unit(key) {
            return Ok(unit.unit_id.clone());
        }
        self.catalog
            .units()
            .into_iter()
            .find(|u| u.name.eq_ignore_ascii_case(key))
            .map(|u| u.unit_id.clone())
            .ok_or_else(|| DomainError::MissingUnit(key.to_string()))
    }

    /// Best holds of one table, served from the ranking cache.
    ///
    /// Returns an empty ranking when nothing has been recorded yet.
    #[instrument(skip(self), fields(anchor = %request.anchor_unit, wave = request.wave))]
    pub async fn top_holds(&self, request: &HoldsRequest) -> DomainResult<Arc<Vec<Stats>>> {
        let anchor_unit = self.resolve_unit(&request.anchor_unit)?;
        let secondary = request
            .secondary
            .as_deref()
            .map(|s| self.resolve_unit(s))
            .transpose()?;
        let Some(version) = self.version_or_latest(request.version.as_deref()).await? else {
            return Ok(Arc::new(Vec::new()));
        };

        let query = RankQuery::new(anchor_unit.clone(), request.wave, version.clone())
            .with_secondary(secondary.clone())
            .with_max_results(self.scoring.max_results)
            .with_dedupe(true)
            .with_leak_scaler(self.scoring.leak_scaler);
        let key = RankingKey {
            version,
            wave: request.wave,
            anchor_unit,
            secondary,
        };

        self.cache
            .get_or_compute(key, || async { self.scorer.rank(&query).await })
            .await
            .inspect_err(|e| error!(error = %e, "Ranking failed"))
    }

    /// Recorded versions, newest first.
    pub async fn versions(&self) -> DomainResult<Vec<String>> {
        let mut versions = self.repository.list_distinct_versions(None).await?;
        versions.sort_by(|a, b| compare_versions(b, a));
        Ok(versions)
    }

    pub async fn latest_version(&self) -> DomainResult<Option<String>> {
        Ok(self.versions().await?.into_iter().next())
    }

    async fn version_or_latest(&self, version: Option<&str>) -> DomainResult<Option<String>> {
        match version {
            Some(v) => Ok(Some(v.to_string())),
            None => self.latest_version().await,
        }
    }

    /// Create the (anchor x wave) tables of every usable unit.
    ///
    /// Returns how many tables were newly created.
    pub async fn provision(&self, waves: RangeInclusive<u8>) -> DomainResult<usize> {
        for wave in waves.clone() {
            bounty(wave)?;
        }

        let mut created = 0;
        for unit in self.catalog.usable_units() {
            for wave in waves.clone() {
                let table = TableKey::new(unit.unit_id.clone(), wave);
                if !self.repository.is_provisioned(&table).await? {
                    self.repository.provision(&table).await?;
                    created += 1;
                }
            }
        }
        info!(created, "Provisioned hold tables");
        Ok(created)
    }

    /// Compose guides for one version (the newest when `None`).
    ///
    /// Only anchors with all seven guide tables provisioned take part.
    /// Rankings here bypass the cache and keep every fingerprint.
    #[instrument(skip(self))]
    pub async fn generate_guides(&self, version: Option<&str>) -> DomainResult<Vec<Guide>> {
        let Some(version) = self.version_or_latest(version).await? else {
            return Ok(Vec::new());
        };

        let provisioned: HashSet<TableKey> = self.repository.list_tables().await?.into_iter().collect();
        let anchors: Vec<String> = self
            .catalog
            .usable_units()
            .into_iter()
            .filter(|u| {
                (1..=GUIDE_WAVES).all(|w| provisioned.contains(&TableKey::new(u.unit_id.clone(), w)))
            })
            .map(|u| u.unit_id.clone())
            .collect();

        let mut stats = AnchorStats::new();
        for anchor in anchors {
            let rankings = try_join_all((1..=GUIDE_WAVES).map(|wave| {
                let query = RankQuery::new(anchor.clone(), wave, version.clone())
                    .with_max_results(self.guides.candidates_per_wave)
                    .with_dedupe(false)
                    .with_leak_scaler(self.scoring.leak_scaler);
                async move { self.scorer.rank(&query).await.map(|ranked| (wave, ranked)) }
            }))
            .await?;

            let waves: WaveStats = rankings.into_iter().filter(|(_, r)| !r.is_empty()).collect();
            if !waves.is_empty() {
                stats.insert(anchor, waves);
            }
        }

        let guides = GuideComposer::new(&self.catalog, &self.guides).compose(&stats);
        info!(version = %version, anchors = stats.len(), guides = guides.len(), "Generated guides");
        Ok(guides)
    }

    /// Drop every cached ranking, e.g. after new games were ingested.
    pub fn invalidate_rankings(&self) {
        self.cache.invalidate_all();
    }
}

/// Order versions like `v11.01` and `9.07.2` by their numeric components.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    fn components(v: &str) -> Option<Vec<u64>> {
        v.trim_start_matches(|c: char| !c.is_ascii_digit())
            .split('.')
            .map(|part| part.parse().ok())
            .collect()
    }
    match (components(a), components(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryHoldRepository;
    use crate::domain::models::{Hold, HoldTally, SendRecord, SendTally, Unit, UpgradeGraph};

    fn catalog() -> Arc<UnitCatalog> {
        Arc::new(UnitCatalog::new(
            vec![
                Unit::new("proton_unit_id", "Proton", 90),
                Unit::new("peewee_unit_id", "Peewee", 15),
                Unit::new("hidden_unit_id", "Hidden", 50).unusable(),
            ],
            Vec::new(),
            UpgradeGraph::new(),
        ))
    }

    async fn seed(repo: &InMemoryHoldRepository, table: &TableKey, version: &str, held: bool) -> i64 {
        let hold = Hold::seed("proton_unit_id:1|0:0", "proton_unit_id:1|0:0", 90, version, &HoldTally::single(true, 5));
        let id = repo.insert_hold(table, &hold).await.unwrap();
        let send = SendRecord::seed(id, "", 0, &SendTally::single(!held, 0));
        repo.insert_send(table, &send).await.unwrap();
        id
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("v11.01", "v9.07.2"), Ordering::Greater);
        assert_eq!(compare_versions("v11.01", "v11.01"), Ordering::Equal);
        assert_eq!(compare_versions("v11.01.1", "v11.01"), Ordering::Greater);
        assert_eq!(compare_versions("beta", "alpha"), Ordering::Greater);
    }

    #[tokio::test]
    async fn test_provision_usable_units_only() {
        let repo = Arc::new(InMemoryHoldRepository::new());
        let service = MetaService::new(repo.clone(), catalog(), &Config::default());

        assert_eq!(service.provision(provisionable_waves()).await.unwrap(), 16);
        assert_eq!(service.provision(1..=2).await.unwrap(), 0);
        assert!(!repo.is_provisioned(&TableKey::new("hidden_unit_id", 1)).await.unwrap());
        assert!(matches!(
            service.provision(1..=9).await,
            Err(DomainError::UnsupportedWave(9))
        ));
    }

    #[tokio::test]
    async fn test_versions_newest_first() {
        let repo = Arc::new(InMemoryHoldRepository::new());
        let table = TableKey::new("proton_unit_id", 1);
        repo.provision(&table).await.unwrap();
        seed(&repo, &table, "v9.07.2", true).await;
        seed(&repo, &table, "v11.01", true).await;
        seed(&repo, &table, "v10.05", true).await;

        let service = MetaService::new(repo, catalog(), &Config::default());
        assert_eq!(service.versions().await.unwrap(), vec!["v11.01", "v10.05", "v9.07.2"]);
    }

    #[tokio::test]
    async fn test_top_holds_defaults_and_cache() {
        let repo = Arc::new(InMemoryHoldRepository::new());
        let table = TableKey::new("proton_unit_id", 1);
        repo.provision(&table).await.unwrap();
        let service = MetaService::new(repo.clone(), catalog(), &Config::default());

        let request = HoldsRequest {
            anchor_unit: "Proton".to_string(),
            wave: 1,
            version: None,
            secondary: None,
        };
        assert!(service.top_holds(&request).await.unwrap().is_empty());

        seed(&repo, &table, "v11.01", true).await;
        let ranked = service.top_holds(&request).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].version, "v11.01");

        // A second hold stays invisible until the cache is dropped.
        let board = "peewee_unit_id:1|-1:0,proton_unit_id:2|0:0";
        let other = Hold::seed(board, board, 105, "v11.01", &HoldTally::single(true, 5));
        let id = repo.insert_hold(&table, &other).await.unwrap();
        repo.insert_send(&table, &SendRecord::seed(id, "", 0, &SendTally::single(false, 0)))
            .await
            .unwrap();
        assert_eq!(service.top_holds(&request).await.unwrap().len(), 1);
        service.invalidate_rankings();
        assert_eq!(service.top_holds(&request).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_anchor() {
        let repo = Arc::new(InMemoryHoldRepository::new());
        let service = MetaService::new(repo, catalog(), &Config::default());
        let request = HoldsRequest {
            anchor_unit: "nobody".to_string(),
            wave: 1,
            version: None,
            secondary: None,
        };
        assert!(matches!(
            service.top_holds(&request).await,
            Err(DomainError::MissingUnit(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_guides_without_tables_is_empty() {
        let repo = Arc::new(InMemoryHoldRepository::new());
        let table = TableKey::new("proton_unit_id", 1);
        repo.provision(&table).await.unwrap();
        seed(&repo, &table, "v11.01", true).await;

        let service = MetaService::new(repo, catalog(), &Config::default());
        assert!(service.generate_guides(None).await.unwrap().is_empty());
    }
}
