//! Multi-wave guide models.

use serde::{Deserialize, Serialize};

use crate::domain::models::stats::{SendStats, Stats};

/// Number of waves every guide covers.
pub const GUIDE_WAVES: u8 = 7;

/// Per-wave score weights, front-loaded: early efficiency compounds.
pub const WAVE_WEIGHTS: [f64; GUIDE_WAVES as usize] = [4.0, 3.0, 2.0, 1.5, 1.25, 1.0, 1.0];

/// Strategy archetype of a guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Both opening waves were sent fully leaked: all-in aggression.
    AllIn,
    /// Heavy wave-1 economy.
    Stall,
    /// Heavy wave-3 economy without cheap filler.
    HybridEconomic,
    Standard,
}

impl Archetype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllIn => "aggressive/all-in",
            Self::Stall => "economic stall",
            Self::HybridEconomic => "hybrid economic",
            Self::Standard => "standard",
        }
    }
}

/// One wave of a guide: a copy of the chosen ranking entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveGuide {
    pub wave: u8,
    /// Literal position; used for wave-to-wave compatibility.
    pub position: String,
    pub fingerprint: String,
    pub value: u32,
    pub score: i64,
    pub win_rate: u32,
    pub sends: Vec<SendStats>,
    pub best_send: Option<SendStats>,
    pub workers: f64,
}

impl WaveGuide {
    pub fn from_stats(wave: u8, stats: &Stats) -> Self {
        Self {
            wave,
            position: stats.position.clone(),
            fingerprint: stats.fingerprint.clone(),
            value: stats.total_value,
            score: stats.score,
            win_rate: stats.win_rate,
            sends: stats.sends.clone(),
            best_send: stats.best_send.clone(),
            workers: stats.workers,
        }
    }
}

/// A scored seven-wave strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    /// Anchor unit the search started from.
    pub root_unit: String,
    pub main_unit: String,
    pub secondary_unit: Option<String>,
    /// Weighted sum of per-wave scores; lower is better.
    pub score: i64,
    pub win_rate: u32,
    pub workers: f64,
    pub waves: Vec<WaveGuide>,
    pub archetype: Archetype,
}

impl Guide {
    /// Aggregate a complete path of wave guides.
    pub fn from_path(root_unit: impl Into<String>, waves: Vec<WaveGuide>) -> Self {
        let score = waves
            .iter()
            .zip(WAVE_WEIGHTS)
            .map(|(w, weight)| (w.score as f64 * weight).floor() as i64)
            .sum();

        let count = waves.len().max(1) as f64;
        let win_rate = (waves.iter().map(|w| f64::from(w.win_rate)).sum::<f64>() / count).floor() as u32;
        let workers = ((waves.iter().map(|w| w.workers).sum::<f64>() / count) * 10.0).floor() / 10.0;

        Self {
            root_unit: root_unit.into(),
            main_unit: String::new(),
            secondary_unit: None,
            score,
            win_rate,
            workers,
            waves,
            archetype: Archetype::Standard,
        }
    }

    /// Wave guide for a 1-based wave number.
    pub fn wave(&self, wave: u8) -> Option<&WaveGuide> {
        self.waves.get(usize::from(wave).checked_sub(1)?)
    }
}
