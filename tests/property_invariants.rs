//! Property tests for normalization, compatibility, selection and scoring.

mod common;

use std::sync::Arc;

use ltd_meta::adapters::ltdapi::leak_value;
use ltd_meta::adapters::memory::InMemoryHoldRepository;
use ltd_meta::domain::models::fingerprint::composition_key;
use ltd_meta::domain::models::{
    BoardSnapshot, BuildEntry, Coord, SendRecord, SendTally, Stats, UpgradeGraph,
};
use ltd_meta::services::{gold_lost, select, BoardNormalizer, Compatibility, Scorer, WAVE_BOUNTIES};
use proptest::prelude::*;

const UNITS: [&str; 3] = ["proton_unit_id", "sovereign_unit_id", "peewee_unit_id"];

/// Entries on a half-cell grid, like real placements.
fn entry() -> impl Strategy<Value = BuildEntry> {
    (0usize..UNITS.len(), 0i32..18, -28i32..28, 0u32..3).prop_map(|(unit, x, y, stacks)| {
        BuildEntry::new(
            UNITS[unit],
            Coord::from_tenths(x * 5),
            Coord::from_tenths(y * 5),
            stacks,
        )
    })
}

fn board() -> impl Strategy<Value = Vec<BuildEntry>> {
    prop::collection::vec(entry(), 1..12)
}

fn stats(hold_id: i64, score: i64, fingerprint: String) -> Stats {
    Stats {
        hold_id,
        score,
        sends: Vec::new(),
        best_send: None,
        position: fingerprint.clone(),
        fingerprint,
        total_value: 0,
        version: common::VERSION.to_string(),
        win_rate: 50,
        workers: 0.0,
    }
}

proptest! {
    /// Property: vertical translation never changes the fingerprint
    #[test]
    fn prop_fingerprint_translation_invariant(entries in board(), shift in -40i32..40) {
        let catalog = common::catalog();
        let normalizer = BoardNormalizer::new(&catalog);
        let no_sends: [&str; 0] = [];

        let board = BoardSnapshot::new(entries);
        let shifted = board.shifted(Coord::from_tenths(shift * 5));

        let a = normalizer.normalize(&board, &no_sends).unwrap();
        let b = normalizer.normalize(&shifted, &no_sends).unwrap();
        prop_assert_eq!(a.fingerprint, b.fingerprint);
        prop_assert_eq!(a.total_value, b.total_value);
        prop_assert_eq!(a.anchor.unit_id, b.anchor.unit_id);
    }

    /// Property: entry order never changes the fingerprint
    #[test]
    fn prop_fingerprint_permutation_invariant(
        (entries, shuffled) in board().prop_flat_map(|b| (Just(b.clone()), Just(b).prop_shuffle()))
    ) {
        let catalog = common::catalog();
        let normalizer = BoardNormalizer::new(&catalog);
        let sends = ["kobra_unit_id", "Snail"];
        let reversed = ["snail_unit_id", "Kobra"];

        let a = normalizer.normalize(&BoardSnapshot::new(entries), &sends).unwrap();
        let b = normalizer.normalize(&BoardSnapshot::new(shuffled), &reversed).unwrap();
        prop_assert_eq!(a.fingerprint, b.fingerprint);
        prop_assert_eq!(a.position, b.position);
        prop_assert_eq!(a.sends, b.sends);
        prop_assert_eq!(a.send_mythium, 60);
    }

    /// Property: every board can follow itself and any translation of itself
    #[test]
    fn prop_compatibility_reflexive(entries in board(), shift in -10i32..10) {
        let catalog = common::catalog();
        let compatibility = Compatibility::new(catalog.upgrades(), std::iter::empty());
        let shifted: Vec<BuildEntry> = entries
            .iter()
            .map(|e| e.shifted(Coord::from_tenths(shift * 5)))
            .collect();

        prop_assert!(compatibility.boards(&entries, &entries));
        prop_assert!(compatibility.boards(&entries, &shifted));
    }

    /// Property: a unit moved to another column breaks compatibility
    #[test]
    fn prop_column_change_incompatible(entries in board(), moved in 0usize..12) {
        // No upgrade edges, so only the identical unit can match.
        let upgrades = UpgradeGraph::new();
        let compatibility = Compatibility::new(&upgrades, std::iter::empty());
        let index = moved % entries.len();
        let target = &entries[index];
        // Move every entry sharing the target's unit and column, so no twin
        // can stand in for it.
        let later: Vec<BuildEntry> = entries
            .iter()
            .map(|e| {
                if e.unit_id == target.unit_id && e.x == target.x {
                    BuildEntry::new(e.unit_id.clone(), Coord::from_tenths(e.x.tenths() + 200), e.y, e.stacks)
                } else {
                    e.clone()
                }
            })
            .collect();

        prop_assert!(!compatibility.boards(&entries, &later));
    }
}

/// Property: dedupe keeps one hold per unit composition, best first
#[test_strategy::proptest]
fn prop_select_dedupes_compositions(
    #[strategy(prop::collection::vec((-200i64..400, 0usize..UNITS.len(), 0usize..UNITS.len(), 0i32..5), 0..40))]
    rows: Vec<(i64, usize, usize, i32)>,
    #[strategy(1usize..20)] max_results: usize,
) {
    let ranked: Vec<Stats> = rows
        .iter()
        .enumerate()
        .map(|(i, (score, a, b, x))| {
            let fingerprint = format!("{}:{x}|0:0,{}:9|0:0", UNITS[*a], UNITS[*b]);
            stats(i as i64, *score, fingerprint)
        })
        .collect();

    let selected = select(ranked.clone(), max_results, true);
    prop_assert!(selected.len() <= max_results);
    prop_assert!(selected.windows(2).all(|w| w[0].score <= w[1].score));

    let mut keys: Vec<String> = selected.iter().map(|s| composition_key(&s.fingerprint)).collect();
    let before = keys.len();
    keys.sort();
    keys.dedup();
    prop_assert_eq!(keys.len(), before);

    let undeduped = select(ranked, max_results, false);
    prop_assert!(undeduped.len() >= selected.len());
}

/// Property: more leaked games never lose less gold, and never more than the bounty
#[test_strategy::proptest]
fn prop_gold_lost_monotone_in_leaks(
    #[strategy(0u32..50)] held: u32,
    #[strategy(0u32..50)] leaked: u32,
    #[strategy(0.0f64..=1.0)] rate: f64,
    #[strategy(0usize..WAVE_BOUNTIES.len())] wave: usize,
) {
    let bounty = WAVE_BOUNTIES[wave];
    let lost = gold_lost(held, leaked, rate, bounty, 1.0);
    let more = gold_lost(held, leaked + 1, rate, bounty, 1.0);

    prop_assert!(lost >= 0.0);
    prop_assert!(more + 1e-9 >= lost);
    prop_assert!(more <= f64::from(bounty) + 1e-9);
}

/// Property: a higher leak rate strictly increases the gold lost
#[test_strategy::proptest]
fn prop_gold_lost_strictly_increases_with_leak_rate(
    #[strategy(0u32..50)] held: u32,
    #[strategy(1u32..50)] leaked: u32,
    #[strategy(0u32..100)] low: u32,
    #[strategy(1u32..=100)] step: u32,
    #[strategy(0usize..WAVE_BOUNTIES.len())] wave: usize,
) {
    let bounty = WAVE_BOUNTIES[wave];
    let r1 = f64::from(low) / 100.0;
    let r2 = f64::from(low + step) / 100.0;

    prop_assert!(gold_lost(held, leaked, r1, bounty, 1.0) < gold_lost(held, leaked, r2, bounty, 1.0));
}

/// Property: leaking more gold never raises a send's score
#[test_strategy::proptest]
fn prop_send_score_never_rises_with_leaked_amount(
    #[strategy(0u32..20)] held: u32,
    #[strategy(1u32..20)] leaked: u32,
    #[strategy(0u64..2_000)] amount: u64,
    #[strategy(1u64..500)] extra: u64,
    #[strategy(0usize..WAVE_BOUNTIES.len())] wave: usize,
) {
    let scorer = Scorer::new(Arc::new(InMemoryHoldRepository::new()), common::catalog(), Vec::new());
    let bounty = WAVE_BOUNTIES[wave];
    let send = |leaked_amount: u64| {
        let mut send = SendRecord::seed(1, "kobra_unit_id", 40, &SendTally::single(false, 0));
        send.held = held;
        send.leaked = leaked;
        send.leaked_amount = leaked_amount;
        send
    };

    let before = scorer.send_stats(&send(amount), bounty, 1.0).unwrap();
    let after = scorer.send_stats(&send(amount + extra), bounty, 1.0).unwrap();
    prop_assert!(after.score < before.score);
}

/// Property: leak value is capped at the bounty
#[test_strategy::proptest]
fn prop_leak_value_capped(#[strategy(0usize..100)] leaks: usize, #[strategy(1u32..30)] creatures: u32) {
    for bounty in WAVE_BOUNTIES {
        prop_assert!(leak_value(leaks, bounty, creatures) <= bounty);
    }
}
