//! Multi-wave guide composition.
//!
//! Guides are built by a depth-first search over per-wave rankings. Wave 1
//! draws from the root anchor's ranking only; every later wave may continue
//! into any anchor's ranking as long as the board is a natural continuation
//! of the previous one (see [`Compatibility`]). Each branch carries its own
//! immutable path, so branches never observe each other's choices.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::domain::models::fingerprint::{decode_board, unit_ids};
use crate::domain::models::{
    Archetype, BuildEntry, Guide, GuideConfig, Stats, Unit, UnitCatalog, WaveGuide, GUIDE_WAVES,
};
use crate::services::compatibility::Compatibility;

/// Ranked holds per wave for one anchor.
pub type WaveStats = BTreeMap<u8, Vec<Stats>>;

/// Ranked holds per anchor, then per wave.
pub type AnchorStats = BTreeMap<String, WaveStats>;

/// A ranked hold with its literal board decoded once up front.
struct Candidate<'s> {
    stats: &'s Stats,
    entries: Vec<BuildEntry>,
}

impl<'s> Candidate<'s> {
    fn decode(stats: &'s Stats) -> Option<Self> {
        match decode_board(&stats.position) {
            Ok(entries) => Some(Self { stats, entries }),
            Err(e) => {
                warn!(hold_id = stats.hold_id, error = %e, "Skipping hold with malformed position");
                None
            }
        }
    }
}

/// Decoded candidates: wave 1 per anchor, later waves pooled across anchors.
struct CandidatePool<'s> {
    roots: BTreeMap<&'s str, Vec<Candidate<'s>>>,
    waves: HashMap<u8, Vec<Candidate<'s>>>,
}

impl<'s> CandidatePool<'s> {
    fn build(stats: &'s AnchorStats) -> Self {
        let mut roots = BTreeMap::new();
        let mut waves: HashMap<u8, Vec<Candidate<'s>>> = HashMap::new();

        for (anchor, by_wave) in stats {
            for (&wave, ranked) in by_wave {
                let decoded = ranked.iter().filter_map(Candidate::decode);
                if wave == 1 {
                    roots.insert(anchor.as_str(), decoded.collect());
                } else if wave <= GUIDE_WAVES {
                    waves.entry(wave).or_default().extend(decoded);
                }
            }
        }

        Self { roots, waves }
    }

    fn wave(&self, wave: u8) -> &[Candidate<'s>] {
        self.waves.get(&wave).map(Vec::as_slice).unwrap_or_default()
    }
}

pub struct GuideComposer<'a> {
    catalog: &'a UnitCatalog,
    compatibility: Compatibility<'a>,
    config: &'a GuideConfig,
}

impl<'a> GuideComposer<'a> {
    pub fn new(catalog: &'a UnitCatalog, config: &'a GuideConfig) -> Self {
        Self {
            catalog,
            compatibility: Compatibility::new(
                catalog.upgrades(),
                config.special_units.iter().map(String::as_str),
            ),
            config,
        }
    }

    /// Compose, classify and deduplicate guides for every root anchor.
    ///
    /// Returns at most `max_guides` guides, best (lowest score) first, one
    /// per (main, secondary) unit pair.
    pub fn compose(&self, stats: &AnchorStats) -> Vec<Guide> {
        let pool = CandidatePool::build(stats);
        let paths: Vec<Guide> = pool
            .roots
            .iter()
            .flat_map(|(root, candidates)| self.search_roots(root, candidates, &pool))
            .collect();
        debug!(paths = paths.len(), "Guide search complete");

        let mut best: HashMap<(String, Option<String>), Guide> = HashMap::new();
        for guide in paths.into_iter().filter_map(|g| self.classify(g)) {
            let key = (guide.main_unit.clone(), guide.secondary_unit.clone());
            match best.get(&key) {
                Some(existing) if existing.score <= guide.score => {}
                _ => {
                    best.insert(key, guide);
                }
            }
        }

        let mut guides: Vec<Guide> = best.into_values().collect();
        guides.sort_by(|a, b| {
            a.score
                .cmp(&b.score)
                .then_with(|| a.main_unit.cmp(&b.main_unit))
                .then_with(|| a.secondary_unit.cmp(&b.secondary_unit))
        });
        guides.truncate(self.config.max_guides);
        guides
    }

    /// Every complete path starting from one anchor's wave-1 ranking.
    ///
    /// Paths are unclassified: main and secondary units are left empty.
    pub fn paths(&self, root: &str, stats: &AnchorStats) -> Vec<Guide> {
        let pool = CandidatePool::build(stats);
        pool.roots
            .get(root)
            .map(|candidates| self.search_roots(root, candidates, &pool))
            .unwrap_or_default()
    }

    fn search_roots(
        &self,
        root: &str,
        candidates: &[Candidate<'_>],
        pool: &CandidatePool<'_>,
    ) -> Vec<Guide> {
        candidates
            .iter()
            .flat_map(|c| {
                let path = vec![WaveGuide::from_stats(1, c.stats)];
                self.extend(root, &path, &c.entries, 2, pool)
            })
            .collect()
    }

    fn extend(
        &self,
        root: &str,
        path: &[WaveGuide],
        previous: &[BuildEntry],
        wave: u8,
        pool: &CandidatePool<'_>,
    ) -> Vec<Guide> {
        if wave > GUIDE_WAVES {
            return vec![Guide::from_path(root, path.to_vec())];
        }

        pool.wave(wave)
            .iter()
            .filter(|c| self.compatibility.boards(previous, &c.entries))
            .flat_map(|c| {
                let mut next = path.to_vec();
                next.push(WaveGuide::from_stats(wave, c.stats));
                self.extend(root, &next, &c.entries, wave + 1, pool)
            })
            .collect()
    }

    /// Name the guide's defining units and archetype.
    ///
    /// Returns `None` for guides without a usable identity: no main unit, or
    /// neither a secondary unit nor any cheap filler.
    pub fn classify(&self, mut guide: Guide) -> Option<Guide> {
        let third = guide.wave(3)?.position.clone();
        let fifth = guide.wave(5)?.position.clone();

        let (mut main, mut secondary) = self.most_valuable(&third);
        if secondary.is_none() {
            let (p, s) = self.most_valuable(&fifth);
            if main.is_none() {
                main = p;
                secondary = s;
            } else if p.is_some() && p != main {
                secondary = p;
            } else {
                secondary = s;
            }
        }

        let main = main?;
        let has_filler = self.has_filler(&third) || self.has_filler(&fifth);
        if secondary.is_none() && !has_filler {
            return None;
        }

        guide.archetype = self.archetype(&guide, has_filler);
        guide.main_unit = main;
        guide.secondary_unit = secondary;
        Some(guide)
    }

    fn archetype(&self, guide: &Guide, has_filler: bool) -> Archetype {
        let fully_leaked = |wave: u8| {
            guide
                .wave(wave)
                .and_then(|w| w.best_send.as_ref())
                .is_some_and(|s| s.fully_leaked())
        };
        let value = |wave: u8| guide.wave(wave).map_or(0, |w| w.value);

        if fully_leaked(1) && fully_leaked(2) {
            Archetype::AllIn
        } else if value(1) > self.config.stall_value {
            Archetype::Stall
        } else if value(3) >= self.config.hybrid_value && !has_filler {
            Archetype::HybridEconomic
        } else {
            Archetype::Standard
        }
    }

    /// The two most valuable distinct units of a position, filler included.
    fn most_valuable(&self, position: &str) -> (Option<String>, Option<String>) {
        let mut units: Vec<&Unit> = Vec::new();
        for id in unit_ids(position) {
            if units.iter().any(|u| u.unit_id == id) {
                continue;
            }
            match self.catalog.unit(id) {
                Some(unit) => units.push(unit),
                None => debug!(unit_id = id, "Unit missing from catalog, ignored for identity"),
            }
        }
        units.sort_by(|a, b| b.total_value.cmp(&a.total_value).then(a.unit_id.cmp(&b.unit_id)));

        let mut ids = units.into_iter().map(|u| u.unit_id.clone());
        (ids.next(), ids.next())
    }

    fn has_filler(&self, position: &str) -> bool {
        unit_ids(position)
            .filter_map(|id| self.catalog.unit(id))
            .any(|u| self.is_filler(u))
    }

    fn is_filler(&self, unit: &Unit) -> bool {
        unit.total_value <= self.config.filler_value_max
    }
}
