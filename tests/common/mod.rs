//! Common test utilities for integration tests
//!
//! Shared catalog fixtures and observation builders.

#![allow(dead_code)]

use std::sync::Arc;

use ltd_meta::domain::models::{
    BoardSnapshot, Config, Mercenary, Observation, Unit, UnitCatalog, UpgradeGraph,
};

pub const VERSION: &str = "v11.01";

/// A small catalog: two fighters, one filler unit and two mercenaries.
pub fn catalog() -> Arc<UnitCatalog> {
    Arc::new(UnitCatalog::new(
        vec![
            Unit::new("proton_unit_id", "Proton", 90).with_version(VERSION),
            Unit::new("sovereign_unit_id", "Sovereign", 200).with_version(VERSION),
            Unit::new("peewee_unit_id", "Peewee", 15).with_version(VERSION),
        ],
        vec![
            Mercenary::new("snail_unit_id", "Snail", 20, 6),
            Mercenary::new("kobra_unit_id", "Kobra", 40, 0),
        ],
        UpgradeGraph::new().with_edge("proton_unit_id", "sovereign_unit_id"),
    ))
}

/// Config with a single fetch worker so page order is deterministic.
pub fn config() -> Config {
    let mut config = Config::default();
    config.ingest.workers = 1;
    config
}

/// A won, unleaked observation of `board` at `wave`.
pub fn observation(wave: u8, board: &[&str], sends: &[&str]) -> Observation {
    Observation {
        player: "fixture".to_string(),
        wave,
        board: BoardSnapshot::parse(board).expect("fixture board parses"),
        next_board: None,
        sends: sends.iter().map(ToString::to_string).collect(),
        leaks: Vec::new(),
        leaked_amount: 0,
        won: true,
        workers: 8,
        rating: 2400,
        version: VERSION.to_string(),
        queue_type: "Normal".to_string(),
    }
}

/// The same observation, lost with `amount` gold leaked.
pub fn leaked(mut observation: Observation, amount: u32) -> Observation {
    observation.leaks = vec!["crab_unit_id".to_string()];
    observation.leaked_amount = amount;
    observation.won = false;
    observation
}
