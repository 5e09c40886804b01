//! Board domain model.
//!
//! A board is the set of units one player has placed at a given wave. Raw
//! observations encode each placement as `unit_id:x|y:stacks`; that string
//! form only exists at the parsing boundary and inside fingerprints. In
//! memory every placement is a typed [`BuildEntry`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::DomainError;

/// A board coordinate stored as a fixed-point number of tenths.
///
/// Grid positions are half or whole cells, so one decimal place is exact and
/// equality, hashing and subtraction stay free of floating point drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Coord(i32);

impl Coord {
    pub const ZERO: Self = Self(0);

    /// Build a coordinate from a count of tenths.
    pub const fn from_tenths(tenths: i32) -> Self {
        Self(tenths)
    }

    /// Round an arbitrary value to one decimal place.
    pub fn from_f64(value: f64) -> Self {
        Self((value * 10.0).round() as i32)
    }

    pub const fn tenths(self) -> i32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// Signed distance `self - other`.
    pub const fn diff(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }

    pub const fn offset_by(self, delta: Self) -> Self {
        Self(self.0 + delta.0)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

impl FromStr for Coord {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidBuildEntry(format!("bad coordinate '{s}'")))?;
        if !value.is_finite() {
            return Err(DomainError::InvalidBuildEntry(format!("bad coordinate '{s}'")));
        }
        Ok(Self::from_f64(value))
    }
}

/// One placed unit instance on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildEntry {
    pub unit_id: String,
    pub x: Coord,
    pub y: Coord,
    pub stacks: u32,
}

impl BuildEntry {
    pub fn new(unit_id: impl Into<String>, x: Coord, y: Coord, stacks: u32) -> Self {
        Self {
            unit_id: unit_id.into(),
            x,
            y,
            stacks,
        }
    }

    /// Same placement moved vertically by `dy`.
    pub fn shifted(&self, dy: Coord) -> Self {
        Self {
            y: self.y.offset_by(dy),
            ..self.clone()
        }
    }

    /// True when both entries sit on the same cell.
    pub fn same_cell(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl fmt::Display for BuildEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}|{}:{}", self.unit_id, self.x, self.y, self.stacks)
    }
}

impl FromStr for BuildEntry {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidBuildEntry(s.to_string());

        let mut parts = s.trim().split(':');
        let unit_id = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;
        let position = parts.next().ok_or_else(invalid)?;
        // Stack count is optional in older records.
        let stacks = match parts.next() {
            Some(raw) if !raw.is_empty() => raw.trim().parse().map_err(|_| invalid())?,
            _ => 0,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        let (x, y) = position.split_once('|').ok_or_else(invalid)?;
        Ok(Self::new(unit_id, x.parse()?, y.parse()?, stacks))
    }
}

/// All placements of one player at one wave.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    entries: Vec<BuildEntry>,
}

impl BoardSnapshot {
    pub fn new(entries: Vec<BuildEntry>) -> Self {
        Self { entries }
    }

    /// Parse a raw per-wave build list.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, DomainError> {
        raw.iter()
            .map(|r| r.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn entries(&self) -> &[BuildEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry moved vertically by the same `dy`.
    pub fn shifted(&self, dy: Coord) -> Self {
        Self::new(self.entries.iter().map(|e| e.shifted(dy)).collect())
    }

    /// Entry occupying the same cell as `entry`, if any.
    pub fn entry_at(&self, entry: &BuildEntry) -> Option<&BuildEntry> {
        self.entries.iter().find(|e| e.same_cell(entry))
    }
}

impl FromIterator<BuildEntry> for BoardSnapshot {
    fn from_iter<I: IntoIterator<Item = BuildEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_entry() {
        let entry: BuildEntry = "chaos_hound_unit_id:7.5|12:2".parse().unwrap();
        assert_eq!(entry.unit_id, "chaos_hound_unit_id");
        assert_eq!(entry.x, Coord::from_tenths(75));
        assert_eq!(entry.y, Coord::from_tenths(120));
        assert_eq!(entry.stacks, 2);
    }

    #[test]
    fn test_parse_entry_without_stacks() {
        let entry: BuildEntry = "proton_unit_id:1|2.5".parse().unwrap();
        assert_eq!(entry.stacks, 0);
        assert_eq!(entry.y, Coord::from_tenths(25));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<BuildEntry>().is_err());
        assert!("proton_unit_id".parse::<BuildEntry>().is_err());
        assert!("proton_unit_id:1-2:0".parse::<BuildEntry>().is_err());
        assert!("proton_unit_id:a|2:0".parse::<BuildEntry>().is_err());
        assert!("proton_unit_id:1|2:x".parse::<BuildEntry>().is_err());
    }

    #[test]
    fn test_display_round_trips_raw_form() {
        let raw = "proton_unit_id:-1.5|3:0";
        let entry: BuildEntry = raw.parse().unwrap();
        assert_eq!(entry.to_string(), raw);
    }

    #[test]
    fn test_coord_display() {
        assert_eq!(Coord::from_tenths(50).to_string(), "5");
        assert_eq!(Coord::from_tenths(-15).to_string(), "-1.5");
        assert_eq!(Coord::ZERO.to_string(), "0");
        assert_eq!(Coord::from_f64(0.25).to_string(), "0.3");
    }

    #[test]
    fn test_shift_and_lookup() {
        let board = BoardSnapshot::parse(&["a_unit_id:0|5:0", "b_unit_id:2|8:1"]).unwrap();
        let moved = board.shifted(Coord::from_tenths(-60));
        assert_eq!(moved.entries()[0].y, Coord::from_tenths(-10));
        assert_eq!(moved.entries()[1].y, Coord::from_tenths(20));

        let probe = BuildEntry::new("other_unit_id", Coord::from_tenths(20), Coord::from_tenths(80), 0);
        assert_eq!(board.entry_at(&probe).map(|e| e.unit_id.as_str()), Some("b_unit_id"));
    }
}
