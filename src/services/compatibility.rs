//! Wave-to-wave board compatibility.
//!
//! A later board is reachable from an earlier one when every earlier unit
//! can still be found in the later board: same unit or an upgrade of it, in
//! the same column, and with every unit moved vertically by one shared
//! offset.

use std::collections::HashSet;

use tracing::warn;

use crate::domain::models::fingerprint::decode_board;
use crate::domain::models::{BuildEntry, UpgradeGraph};

pub struct Compatibility<'a> {
    upgrades: &'a UpgradeGraph,
    special_units: HashSet<&'a str>,
}

impl<'a> Compatibility<'a> {
    pub fn new<I>(upgrades: &'a UpgradeGraph, special_units: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            upgrades,
            special_units: special_units.into_iter().collect(),
        }
    }

    /// Compare two fingerprints; unparseable input is never compatible.
    pub fn fingerprints(&self, earlier: &str, later: &str) -> bool {
        match (decode_board(earlier), decode_board(later)) {
            (Ok(a), Ok(b)) => self.boards(&a, &b),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Skipping compatibility check on malformed fingerprint");
                false
            }
        }
    }

    /// Whether `later` can follow `earlier`.
    ///
    /// The first earlier entry collects every vertical offset at which it
    /// finds a match; each following entry must match at one of those
    /// offsets.
    pub fn boards(&self, earlier: &[BuildEntry], later: &[BuildEntry]) -> bool {
        let mut offsets: HashSet<i32> = HashSet::new();

        for (i, a) in earlier.iter().enumerate() {
            let mut found = false;
            for b in later.iter().filter(|b| b.x == a.x && self.same_unit(a, b)) {
                let offset = a.y.diff(b.y).tenths();
                if i == 0 {
                    offsets.insert(offset);
                    found = true;
                } else if offsets.contains(&offset) {
                    found = true;
                    break;
                }
            }
            if !found {
                return false;
            }
        }
        true
    }

    /// Identity or upgrade relation; special units also need equal stacks.
    fn same_unit(&self, a: &BuildEntry, b: &BuildEntry) -> bool {
        let related = a.unit_id == b.unit_id || self.upgrades.related(&a.unit_id, &b.unit_id);
        if !related {
            return false;
        }
        if self.special_units.contains(a.unit_id.as_str()) {
            return a.stacks == b.stacks;
        }
        true
    }
}
