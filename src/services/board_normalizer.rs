//! Board normalization.
//!
//! Boards are compared by shape, not by where on the lane they were built.
//! The normalizer anchors every board on its most valuable unit and
//! translates it vertically so the anchor sits on row zero, which makes the
//! resulting fingerprint invariant under vertical translation and under
//! permutation of the input entries.

use std::cmp::Ordering;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::fingerprint::{encode_board, encode_sends};
use crate::domain::models::{BoardSnapshot, BuildEntry, Coord, UnitCatalog};

/// Canonical form of one observed board plus its send combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBoard {
    /// Translation-invariant fingerprint.
    pub fingerprint: String,
    /// Untranslated fingerprint, kept for display and compatibility checks.
    pub position: String,
    /// Entry every other entry was translated against.
    pub anchor: BuildEntry,
    /// Sum of the total value of every entry.
    pub total_value: u32,
    /// Sorted mercenary ids.
    pub sends: String,
    /// Mythium cost of the whole send.
    pub send_mythium: u32,
}

/// Normalizes boards against a catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct BoardNormalizer<'a> {
    catalog: &'a UnitCatalog,
}

impl<'a> BoardNormalizer<'a> {
    pub fn new(catalog: &'a UnitCatalog) -> Self {
        Self { catalog }
    }

    /// Normalize a board and the mercenaries received alongside it.
    ///
    /// # Errors
    /// * `NoAnchor` for an empty board
    /// * `MissingUnit` when an entry references a unit absent from the catalog
    /// * `UnknownMercenary` when a send is neither a known id nor a known name
    pub fn normalize<S: AsRef<str>>(
        &self,
        board: &BoardSnapshot,
        sends: &[S],
    ) -> DomainResult<NormalizedBoard> {
        let (anchor, total_value) = self.anchor(board)?;
        let offset = anchor.y;

        let fingerprint = encode_board(board.entries(), offset);
        let position = encode_board(board.entries(), Coord::ZERO);

        let mut mercenary_ids = Vec::with_capacity(sends.len());
        let mut send_mythium = 0u32;
        for send in sends.iter().map(AsRef::as_ref).filter(|s| !s.is_empty()) {
            let mercenary = self.catalog.require_mercenary(send)?;
            send_mythium += mercenary.mythium_cost;
            mercenary_ids.push(mercenary.unit_id.as_str());
        }

        Ok(NormalizedBoard {
            fingerprint,
            position,
            anchor: anchor.clone(),
            total_value,
            sends: encode_sends(&mercenary_ids),
            send_mythium,
        })
    }

    /// The most valuable entry and the total value of the board.
    ///
    /// Ties go to the smallest entry ordered by unit id, then x, then y.
    /// The order is numeric, so it does not change when the whole board is
    /// translated.
    pub fn anchor<'b>(&self, board: &'b BoardSnapshot) -> DomainResult<(&'b BuildEntry, u32)> {
        let mut best: Option<(&BuildEntry, u32)> = None;
        let mut total_value = 0u32;

        for entry in board.entries() {
            let value = self.catalog.require_unit(&entry.unit_id)?.total_value;
            total_value += value;

            best = match best {
                None => Some((entry, value)),
                Some((current, current_value)) => match value.cmp(&current_value) {
                    Ordering::Greater => Some((entry, value)),
                    Ordering::Equal if tie_order(entry, current) == Ordering::Less => {
                        Some((entry, value))
                    }
                    _ => Some((current, current_value)),
                },
            };
        }

        best.map(|(entry, _)| (entry, total_value))
            .ok_or(DomainError::NoAnchor)
    }
}

fn tie_order(a: &BuildEntry, b: &BuildEntry) -> Ordering {
    a.unit_id
        .cmp(&b.unit_id)
        .then(a.x.cmp(&b.x))
        .then(a.y.cmp(&b.y))
        .then(a.stacks.cmp(&b.stacks))
}
