//! Fingerprint serialization.
//!
//! Fingerprints are the only place boards and sends exist as strings. A
//! board fingerprint is the lexicographically sorted list of entry tokens
//! `unit_id:x|y:stacks` joined by `,`; a send fingerprint is the sorted list
//! of mercenary ids joined by `,`. Changing either layout requires bumping
//! [`FINGERPRINT_VERSION`] and reprocessing stored holds.

use crate::domain::errors::DomainResult;
use crate::domain::models::board::{BuildEntry, Coord};

/// Layout version of the strings produced by this module.
pub const FINGERPRINT_VERSION: u32 = 1;

const TOKEN_SEPARATOR: char = ',';

/// Token for one entry with its y translated by `-offset`.
pub fn encode_token(entry: &BuildEntry, offset: Coord) -> String {
    format!(
        "{}:{}|{}:{}",
        entry.unit_id,
        entry.x,
        entry.y.diff(offset),
        entry.stacks
    )
}

/// Sorted, joined board fingerprint translated by `-offset`.
pub fn encode_board<'a, I>(entries: I, offset: Coord) -> String
where
    I: IntoIterator<Item = &'a BuildEntry>,
{
    let mut tokens: Vec<String> = entries.into_iter().map(|e| encode_token(e, offset)).collect();
    tokens.sort();
    tokens.join(",")
}

/// Parse a board fingerprint back into typed entries.
pub fn decode_board(fingerprint: &str) -> DomainResult<Vec<BuildEntry>> {
    tokens(fingerprint).map(str::parse).collect()
}

/// Sorted, joined send fingerprint.
pub fn encode_sends<S: AsRef<str>>(mercenaries: &[S]) -> String {
    let mut ids: Vec<&str> = mercenaries
        .iter()
        .map(AsRef::as_ref)
        .filter(|m| !m.is_empty())
        .collect();
    ids.sort_unstable();
    ids.join(",")
}

/// Raw tokens of a fingerprint; empty for an empty string.
pub fn tokens(fingerprint: &str) -> impl Iterator<Item = &str> {
    fingerprint.split(TOKEN_SEPARATOR).filter(|t| !t.is_empty())
}

/// Unit ids of every token, in token order, duplicates kept.
pub fn unit_ids(fingerprint: &str) -> impl Iterator<Item = &str> {
    tokens(fingerprint).map(|t| t.split(':').next().unwrap_or(t))
}

/// Composition key: the sorted unit ids with positions and stacks stripped.
///
/// Two holds built from the same units in different layouts share a key.
pub fn composition_key(fingerprint: &str) -> String {
    let mut ids: Vec<&str> = unit_ids(fingerprint).collect();
    ids.sort_unstable();
    ids.join(",")
}
