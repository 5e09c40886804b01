//! Per-player-per-wave observations.
//!
//! The ingestion transport turns every recorded game into one observation
//! per player per wave. The core only consumes this shape and is agnostic to
//! where it came from.

use serde::{Deserialize, Serialize};

use crate::domain::models::board::BoardSnapshot;

/// What happened to one player during one wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub player: String,
    pub wave: u8,
    pub board: BoardSnapshot,
    /// Board at the following wave, used to check incubator maturity.
    pub next_board: Option<BoardSnapshot>,
    /// Mercenaries received this wave.
    pub sends: Vec<String>,
    /// Creatures that leaked through this wave.
    pub leaks: Vec<String>,
    /// Gold value of everything that leaked.
    pub leaked_amount: u32,
    pub won: bool,
    pub workers: u32,
    pub rating: u32,
    pub version: String,
    pub queue_type: String,
}

impl Observation {
    /// True if any opposing damage leaked through.
    pub fn any_leak(&self) -> bool {
        !self.leaks.is_empty() || self.leaked_amount > 0
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::observation;

    #[test]
    fn test_any_leak() {
        let mut obs = observation(1, &["a_unit_id:1|1:0"]);
        assert!(!obs.any_leak());
        obs.leaks.push("crab_unit_id".to_string());
        assert!(obs.any_leak());
        obs.leaks.clear();
        obs.leaked_amount = 6;
        assert!(obs.any_leak());
    }
}
