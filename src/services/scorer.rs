//! Hold ranking.
//!
//! A Hold's score is its economic value minus the best net value any send
//! combination extracted against it; lower is better. A send's value is the
//! (income-adjusted) mythium the attacker spent, minus the gold the defender
//! lost to leaks.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::fingerprint::composition_key;
use crate::domain::models::{Hold, SendRecord, SendStats, Stats, TableKey, UnitCatalog};
use crate::domain::ports::HoldRepository;

/// Gold bounty of each wave that can be ranked, indexed from wave 1.
pub const WAVE_BOUNTIES: [u32; 8] = [72, 84, 90, 96, 108, 114, 120, 132];

/// Starting point of the best-send search; no send scores below it.
pub const SEND_SCORE_FLOOR: f64 = -300.0;

/// Mythium spent is worth this much more than gold lost.
const MYTHIUM_WEIGHT: f64 = 1.25;

/// Gold bounty of a wave.
pub fn bounty(wave: u8) -> DomainResult<u32> {
    usize::from(wave)
        .checked_sub(1)
        .and_then(|i| WAVE_BOUNTIES.get(i).copied())
        .ok_or(DomainError::UnsupportedWave(wave))
}

/// Fraction of the wave bounty lost per leak.
pub fn leak_rate(send: &SendRecord, bounty: u32) -> f64 {
    if send.leaked == 0 || bounty == 0 {
        return 0.0;
    }
    send.leaked_amount as f64 / f64::from(send.leaked) / f64::from(bounty)
}

/// Gold the defender is expected to lose against a send.
///
/// Held waves lose nothing; leaked waves lose `leak_rate` of the bounty.
pub fn gold_lost(held: u32, leaked: u32, leak_rate: f64, bounty: u32, leak_scaler: f64) -> f64 {
    let games = f64::from(held) + f64::from(leaked);
    if games == 0.0 {
        return 0.0;
    }
    let kept = f64::from(held) + f64::from(leaked) * (1.0 - leak_rate);
    (1.0 - kept / games) * f64::from(bounty) * leak_scaler
}

/// Parameters of one ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankQuery {
    pub anchor_unit: String,
    pub wave: u8,
    pub version: String,
    /// Only holds containing this unit are ranked.
    pub secondary: Option<String>,
    pub max_results: usize,
    /// Keep one hold per unit composition instead of one per fingerprint.
    pub dedupe: bool,
    pub leak_scaler: f64,
}

impl RankQuery {
    pub fn new(anchor_unit: impl Into<String>, wave: u8, version: impl Into<String>) -> Self {
        Self {
            anchor_unit: anchor_unit.into(),
            wave,
            version: version.into(),
            secondary: None,
            max_results: 20,
            dedupe: true,
            leak_scaler: 1.0,
        }
    }

    pub fn with_secondary(mut self, secondary: Option<String>) -> Self {
        self.secondary = secondary;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    pub fn with_leak_scaler(mut self, leak_scaler: f64) -> Self {
        self.leak_scaler = leak_scaler;
        self
    }

    pub fn table(&self) -> TableKey {
        TableKey::new(self.anchor_unit.clone(), self.wave)
    }
}

pub struct Scorer<R: HoldRepository> {
    repository: Arc<R>,
    catalog: Arc<UnitCatalog>,
    /// Anchors whose holds only count once some send was held against them.
    incubators: HashSet<String>,
}

impl<R: HoldRepository> Scorer<R> {
    pub fn new(
        repository: Arc<R>,
        catalog: Arc<UnitCatalog>,
        incubators: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            repository,
            catalog,
            incubators: incubators.into_iter().collect(),
        }
    }

    /// Rank the holds of one table, best (lowest score) first.
    ///
    /// # Errors
    /// * `UnsupportedWave` for waves without a bounty
    /// * `MissingHold` when a send references a hold that does not exist
    /// * `UnknownMercenary` when a send references a mercenary absent from
    ///   the catalog
    pub async fn rank(&self, query: &RankQuery) -> DomainResult<Vec<Stats>> {
        let bounty = bounty(query.wave)?;
        let table = query.table();

        let mut groups: BTreeMap<i64, Vec<SendRecord>> = BTreeMap::new();
        for send in self.repository.list_sends(&table).await? {
            groups.entry(send.hold_id).or_default().push(send);
        }

        let needs_held_send = self.incubators.contains(&query.anchor_unit);
        let mut ranked = Vec::with_capacity(groups.len());

        for (hold_id, sends) in groups {
            let hold = self
                .repository
                .find_hold_by_id(&table, hold_id)
                .await?
                .ok_or_else(|| DomainError::MissingHold {
                    table: table.name(),
                    id: hold_id,
                })?;

            if hold.version_added != query.version {
                continue;
            }
            if let Some(secondary) = &query.secondary {
                if !hold.contains_unit(secondary) {
                    continue;
                }
            }
            if needs_held_send && !sends.iter().any(|s| s.held > 0) {
                continue;
            }

            ranked.push(self.stats(&hold, sends, bounty, query.leak_scaler)?);
        }

        debug!(table = %table, candidates = ranked.len(), "Ranked holds");
        Ok(select(ranked, query.max_results, query.dedupe))
    }

    /// Score one hold against every send recorded for it.
    pub fn stats(
        &self,
        hold: &Hold,
        mut sends: Vec<SendRecord>,
        bounty: u32,
        leak_scaler: f64,
    ) -> DomainResult<Stats> {
        sends.sort_by(|a, b| a.total_mythium.cmp(&b.total_mythium).then(a.id.cmp(&b.id)));

        let mut best_score = SEND_SCORE_FLOOR;
        let mut best_send = None;
        let mut send_stats = Vec::with_capacity(sends.len());

        for send in &sends {
            let stats = self.send_stats(send, bounty, leak_scaler)?;
            if stats.score > best_score {
                best_score = stats.score;
                best_send = Some(stats.clone());
            }
            send_stats.push(stats);
        }

        Ok(Stats {
            hold_id: hold.id,
            score: i64::from(hold.total_value) - best_score.floor() as i64,
            sends: send_stats,
            best_send,
            position: hold.position.clone(),
            fingerprint: hold.fingerprint.clone(),
            total_value: hold.total_value,
            version: hold.version_added.clone(),
            win_rate: hold.win_rate(),
            workers: hold.average_workers(),
        })
    }

    /// Net value one send combination extracted.
    pub fn send_stats(
        &self,
        send: &SendRecord,
        bounty: u32,
        leak_scaler: f64,
    ) -> DomainResult<SendStats> {
        let adjusted_mythium = send
            .mercenaries()
            .map(|m| self.catalog.require_mercenary(m).map(|merc| merc.adjusted_mythium()))
            .sum::<DomainResult<f64>>()?;

        let rate = leak_rate(send, bounty);
        let lost = gold_lost(send.held, send.leaked, rate, bounty, leak_scaler);

        Ok(SendStats {
            sends: send.sends.clone(),
            total_mythium: send.total_mythium,
            held: send.held,
            leaked: send.leaked,
            leaked_ratio: (rate * 100.0).floor().max(0.0) as u32,
            score: adjusted_mythium * MYTHIUM_WEIGHT - lost,
        })
    }
}

/// Order ranked holds and keep the first `max_results`.
///
/// Ties on score go to the higher win rate, then to the older hold.
pub fn select(mut ranked: Vec<Stats>, max_results: usize, dedupe: bool) -> Vec<Stats> {
    ranked.sort_by(|a, b| {
        a.score
            .cmp(&b.score)
            .then(b.win_rate.cmp(&a.win_rate))
            .then(a.hold_id.cmp(&b.hold_id))
    });

    let mut seen = HashSet::new();
    let mut selected = Vec::with_capacity(max_results.min(ranked.len()));
    for stats in ranked {
        if selected.len() >= max_results {
            break;
        }
        let key = if dedupe {
            composition_key(&stats.fingerprint)
        } else {
            stats.fingerprint.clone()
        };
        if seen.insert(key) {
            selected.push(stats);
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryHoldRepository;
    use crate::domain::models::{HoldTally, Mercenary, SendTally, Unit, UpgradeGraph};

    const VERSION: &str = "v11.01";

    fn catalog() -> Arc<UnitCatalog> {
        Arc::new(UnitCatalog::new(
            vec![
                Unit::new("proton_unit_id", "Proton", 90),
                Unit::new("peewee_unit_id", "Peewee", 15),
            ],
            vec![
                Mercenary::new("snail_unit_id", "Snail", 20, 6),
                Mercenary::new("kobra_unit_id", "Kobra", 40, 0),
            ],
            UpgradeGraph::new(),
        ))
    }

    async fn seed(
        repo: &InMemoryHoldRepository,
        table: &TableKey,
        fingerprint: &str,
        sends: &str,
        held: u32,
        leaked: u32,
    ) -> i64 {
        let hold = Hold::seed(fingerprint, fingerprint, 90, VERSION, &HoldTally::single(true, 10));
        let hold_id = repo.insert_hold(table, &hold).await.unwrap();
        let mut send = SendRecord::seed(hold_id, sends, 40, &SendTally::default());
        send.held = held;
        send.leaked = leaked;
        send.leaked_amount = u64::from(leaked) * 36;
        repo.insert_send(table, &send).await.unwrap();
        hold_id
    }

    #[test]
    fn test_bounty_table() {
        assert_eq!(bounty(1).unwrap(), 72);
        assert_eq!(bounty(8).unwrap(), 132);
        assert!(matches!(bounty(0), Err(DomainError::UnsupportedWave(0))));
        assert!(matches!(bounty(9), Err(DomainError::UnsupportedWave(9))));
    }

    #[test]
    fn test_gold_lost() {
        assert_eq!(gold_lost(0, 0, 0.0, 72, 1.0), 0.0);
        assert_eq!(gold_lost(10, 0, 0.0, 72, 1.0), 0.0);
        // Half the games leaked half the bounty.
        assert!((gold_lost(5, 5, 0.5, 72, 1.0) - 18.0).abs() < 1e-9);
        assert!((gold_lost(5, 5, 0.5, 72, 2.0) - 36.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_held_send_outranks_leaky_send() {
        let repo = Arc::new(InMemoryHoldRepository::new());
        let table = TableKey::new("proton_unit_id", 1);
        repo.provision(&table).await.unwrap();

        let steady = seed(&repo, &table, "proton_unit_id:1|0:0", "kobra_unit_id", 10, 0).await;
        let leaky = seed(&repo, &table, "proton_unit_id:2|0:0", "kobra_unit_id", 5, 5).await;

        let scorer = Scorer::new(repo, catalog(), Vec::new());
        let ranked = scorer
            .rank(&RankQuery::new("proton_unit_id", 1, VERSION).with_dedupe(false))
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].hold_id, steady);
        assert_eq!(ranked[1].hold_id, leaky);
        // 90 - floor(40 * 1.25)
        assert_eq!(ranked[0].score, 40);
        assert_eq!(ranked[1].best_send.as_ref().unwrap().leaked_ratio, 50);
    }

    #[tokio::test]
    async fn test_dedupe_keeps_one_per_composition() {
        let repo = Arc::new(InMemoryHoldRepository::new());
        let table = TableKey::new("proton_unit_id", 1);
        repo.provision(&table).await.unwrap();

        seed(&repo, &table, "peewee_unit_id:1|1:0,proton_unit_id:1|0:0", "kobra_unit_id", 10, 0).await;
        seed(&repo, &table, "peewee_unit_id:3|1:0,proton_unit_id:1|0:0", "kobra_unit_id", 5, 5).await;
        seed(&repo, &table, "proton_unit_id:1|0:0", "snail_unit_id", 4, 0).await;

        let scorer = Scorer::new(repo, catalog(), Vec::new());
        let deduped = scorer
            .rank(&RankQuery::new("proton_unit_id", 1, VERSION))
            .await
            .unwrap();
        assert_eq!(deduped.len(), 2);

        let all = scorer
            .rank(&RankQuery::new("proton_unit_id", 1, VERSION).with_dedupe(false))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let capped = scorer
            .rank(&RankQuery::new("proton_unit_id", 1, VERSION).with_dedupe(false).with_max_results(1))
            .await
            .unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn test_filters_version_secondary_and_incubators() {
        let repo = Arc::new(InMemoryHoldRepository::new());
        let table = TableKey::new("proton_unit_id", 2);
        repo.provision(&table).await.unwrap();

        seed(&repo, &table, "peewee_unit_id:1|1:0,proton_unit_id:1|0:0", "kobra_unit_id", 0, 3).await;
        seed(&repo, &table, "proton_unit_id:1|0:0", "kobra_unit_id", 2, 0).await;

        let scorer = Scorer::new(repo.clone(), catalog(), Vec::new());
        let other_version = scorer
            .rank(&RankQuery::new("proton_unit_id", 2, "v10.00"))
            .await
            .unwrap();
        assert!(other_version.is_empty());

        let with_peewee = scorer
            .rank(&RankQuery::new("proton_unit_id", 2, VERSION).with_secondary(Some("peewee_unit_id".into())))
            .await
            .unwrap();
        assert_eq!(with_peewee.len(), 1);
        assert!(with_peewee[0].fingerprint.contains("peewee_unit_id"));

        let incubating = Scorer::new(repo, catalog(), vec!["proton_unit_id".to_string()]);
        let held_only = incubating
            .rank(&RankQuery::new("proton_unit_id", 2, VERSION))
            .await
            .unwrap();
        assert_eq!(held_only.len(), 1);
        assert_eq!(held_only[0].fingerprint, "proton_unit_id:1|0:0");
    }

    #[tokio::test]
    async fn test_rank_errors() {
        let repo = Arc::new(InMemoryHoldRepository::new());
        let table = TableKey::new("proton_unit_id", 9);
        repo.provision(&table).await.unwrap();
        let scorer = Scorer::new(repo.clone(), catalog(), Vec::new());
        let err = scorer.rank(&RankQuery::new("proton_unit_id", 9, VERSION)).await.unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedWave(9)));

        let table = TableKey::new("proton_unit_id", 1);
        repo.provision(&table).await.unwrap();
        seed(&repo, &table, "proton_unit_id:1|0:0", "dragon_unit_id", 1, 0).await;
        let err = scorer.rank(&RankQuery::new("proton_unit_id", 1, VERSION)).await.unwrap_err();
        assert!(matches!(err, DomainError::UnknownMercenary(_)));

        let orphan = SendRecord::seed(999, "kobra_unit_id", 40, &SendTally::single(false, 0));
        let table = TableKey::new("proton_unit_id", 3);
        repo.provision(&table).await.unwrap();
        repo.insert_send(&table, &orphan).await.unwrap();
        let err = scorer.rank(&RankQuery::new("proton_unit_id", 3, VERSION)).await.unwrap_err();
        assert!(matches!(err, DomainError::MissingHold { id: 999, .. }));
    }
}
