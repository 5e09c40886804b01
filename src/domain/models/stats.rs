//! Ranking output models.
//!
//! Stats are derived on demand from persisted holds and sends. They are
//! plain value snapshots, safe to cache and discard.

use serde::{Deserialize, Serialize};

/// One send combination as seen in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendStats {
    pub sends: String,
    pub total_mythium: u32,
    pub held: u32,
    pub leaked: u32,
    /// Floored percentage of the wave bounty lost per leak.
    pub leaked_ratio: u32,
    /// `adjusted_mythium * 1.25 - gold_lost`; higher is better.
    pub score: f64,
}

impl SendStats {
    pub fn fully_leaked(&self) -> bool {
        self.held == 0 && self.leaked > 0
    }
}

/// A ranked hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub hold_id: i64,
    /// `total_value - floor(best send score)`; lower is better.
    pub score: i64,
    /// Sends ascending by mythium cost.
    pub sends: Vec<SendStats>,
    /// The send with the highest send score.
    pub best_send: Option<SendStats>,
    /// Literal position of the first observation.
    pub position: String,
    /// Canonical fingerprint.
    pub fingerprint: String,
    pub total_value: u32,
    pub version: String,
    pub win_rate: u32,
    pub workers: f64,
}
