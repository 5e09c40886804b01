//! Hold and send-record domain models.
//!
//! A Hold is a canonical board position, bucketed by anchor unit and wave,
//! with accumulated game outcomes. Each Hold owns send records: one per distinct
//! combination of mercenaries received while holding that position.
//!
//! Counters only grow. All accumulation goes through the tally types below so
//! the read-modify-write contract is testable without any storage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one (anchor unit x wave) table of holds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableKey {
    pub anchor_unit: String,
    pub wave: u8,
}

impl TableKey {
    pub fn new(anchor_unit: impl Into<String>, wave: u8) -> Self {
        Self {
            anchor_unit: anchor_unit.into(),
            wave,
        }
    }

    /// Storage name, e.g. `proton_unit_id_wave_3`.
    ///
    /// The full unit id is kept so distinct anchors never share a name.
    pub fn name(&self) -> String {
        format!("{}_wave_{}", self.anchor_unit, self.wave)
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Win/loss/worker increments produced by observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldTally {
    pub won: u32,
    pub lost: u32,
    pub workers: u64,
}

impl HoldTally {
    /// Tally of a single game.
    pub fn single(won: bool, workers: u32) -> Self {
        Self {
            won: u32::from(won),
            lost: u32::from(!won),
            workers: u64::from(workers),
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.won += other.won;
        self.lost += other.lost;
        self.workers += other.workers;
    }

    pub fn games(&self) -> u32 {
        self.won + self.lost
    }
}

/// Held/leaked increments produced by observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTally {
    pub held: u32,
    pub leaked: u32,
    pub leaked_amount: u64,
}

impl SendTally {
    /// Tally of a single wave. `leaked_amount` only counts when leaked.
    pub fn single(leaked: bool, leaked_amount: u32) -> Self {
        Self {
            held: u32::from(!leaked),
            leaked: u32::from(leaked),
            leaked_amount: if leaked { u64::from(leaked_amount) } else { 0 },
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.held += other.held;
        self.leaked += other.leaked;
        self.leaked_amount += other.leaked_amount;
    }
}

/// A persisted board position with accumulated outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hold {
    /// Storage id; zero until inserted.
    pub id: i64,
    /// Canonical translation-invariant fingerprint.
    pub fingerprint: String,
    /// Literal fingerprint of the first observation, for display only.
    pub position: String,
    /// Economic total value of the whole board.
    pub total_value: u32,
    pub won: u32,
    pub lost: u32,
    /// Sum of worker counts over every recorded game.
    pub workers: u64,
    pub version_added: String,
}

impl Hold {
    /// New unsaved hold seeded from its first tally.
    pub fn seed(
        fingerprint: impl Into<String>,
        position: impl Into<String>,
        total_value: u32,
        version: impl Into<String>,
        tally: &HoldTally,
    ) -> Self {
        Self {
            id: 0,
            fingerprint: fingerprint.into(),
            position: position.into(),
            total_value,
            won: tally.won,
            lost: tally.lost,
            workers: tally.workers,
            version_added: version.into(),
        }
    }

    pub fn absorb(&mut self, tally: &HoldTally) {
        self.won += tally.won;
        self.lost += tally.lost;
        self.workers += tally.workers;
    }

    pub fn games(&self) -> u32 {
        self.won + self.lost
    }

    /// Floored win percentage; zero when no games are recorded.
    pub fn win_rate(&self) -> u32 {
        match self.games() {
            0 => 0,
            games => ((f64::from(self.won) / f64::from(games)) * 100.0).floor() as u32,
        }
    }

    /// Average workers per game, floored to one decimal.
    pub fn average_workers(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            games => ((self.workers as f64 / f64::from(games)) * 10.0).floor() / 10.0,
        }
    }

    /// Unit ids present in the literal position.
    pub fn unit_ids(&self) -> impl Iterator<Item = &str> {
        crate::domain::models::fingerprint::unit_ids(&self.position)
    }

    pub fn contains_unit(&self, unit_id: &str) -> bool {
        self.unit_ids().any(|u| u == unit_id)
    }
}

/// Outcomes of one mercenary combination received against a Hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRecord {
    pub id: i64,
    pub hold_id: i64,
    /// Sorted comma-joined mercenary ids; empty when nothing was sent.
    pub sends: String,
    pub total_mythium: u32,
    pub held: u32,
    pub leaked: u32,
    /// Cumulative gold value of everything that leaked.
    pub leaked_amount: u64,
}

impl SendRecord {
    pub fn seed(hold_id: i64, sends: impl Into<String>, total_mythium: u32, tally: &SendTally) -> Self {
        Self {
            id: 0,
            hold_id,
            sends: sends.into(),
            total_mythium,
            held: tally.held,
            leaked: tally.leaked,
            leaked_amount: tally.leaked_amount,
        }
    }

    pub fn absorb(&mut self, tally: &SendTally) {
        self.held += tally.held;
        self.leaked += tally.leaked;
        self.leaked_amount += tally.leaked_amount;
    }

    pub fn games(&self) -> u32 {
        self.held + self.leaked
    }

    /// Mercenary ids in this send combination.
    pub fn mercenaries(&self) -> impl Iterator<Item = &str> {
        self.sends.split(',').filter(|s| !s.is_empty())
    }

    pub fn fully_leaked(&self) -> bool {
        self.held == 0 && self.leaked > 0
    }
}
