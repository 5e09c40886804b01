//! Unit catalog domain model.
//!
//! The catalog is a read-only snapshot of every fighter unit, every
//! mercenary and the directed upgrade graph. It is loaded once per process
//! (or on explicit refresh) and passed into the core explicitly.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::domain::errors::{DomainError, DomainResult};

/// A placeable fighter unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub unit_id: String,
    pub name: String,
    /// Economic total value (gold including upgrades).
    pub total_value: u32,
    /// Whether the unit gets its own hold tables.
    pub usable: bool,
    pub version: String,
    #[serde(default)]
    pub icon_path: String,
}

impl Unit {
    pub fn new(unit_id: impl Into<String>, name: impl Into<String>, total_value: u32) -> Self {
        Self {
            unit_id: unit_id.into(),
            name: name.into(),
            total_value,
            usable: true,
            version: String::new(),
            icon_path: String::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn unusable(mut self) -> Self {
        self.usable = false;
        self
    }

    /// Mark the unit usable only when it is worth at least `min_value`.
    pub fn with_economy_floor(mut self, min_value: u32) -> Self {
        self.usable = self.total_value >= min_value;
        self
    }
}

/// A mercenary that can be sent against an opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mercenary {
    pub unit_id: String,
    pub name: String,
    pub mythium_cost: u32,
    pub income_bonus: u32,
    pub version: String,
    #[serde(default)]
    pub icon_path: String,
}

impl Mercenary {
    pub fn new(
        unit_id: impl Into<String>,
        name: impl Into<String>,
        mythium_cost: u32,
        income_bonus: u32,
    ) -> Self {
        Self {
            unit_id: unit_id.into(),
            name: name.into(),
            mythium_cost,
            income_bonus,
            version: String::new(),
            icon_path: String::new(),
        }
    }

    /// Strategic cost of sending this mercenary.
    ///
    /// Mercenaries without income bonus cost their full mythium; income
    /// mercenaries are discounted in proportion to how much income they buy.
    pub fn adjusted_mythium(&self) -> f64 {
        let cost = f64::from(self.mythium_cost);
        if self.income_bonus == 0 {
            cost
        } else {
            cost * (cost / f64::from(self.income_bonus) * 0.3)
        }
    }
}

/// Directed upgrade graph: base unit -> upgraded forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeGraph {
    edges: HashMap<String, BTreeSet<String>>,
}

impl UpgradeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, base: impl Into<String>, upgraded: impl Into<String>) {
        self.edges.entry(base.into()).or_default().insert(upgraded.into());
    }

    pub fn with_edge(mut self, base: impl Into<String>, upgraded: impl Into<String>) -> Self {
        self.add(base, upgraded);
        self
    }

    /// True when `upgraded` is a registered upgrade target of `base`.
    pub fn upgrades_to(&self, base: &str, upgraded: &str) -> bool {
        self.edges.get(base).is_some_and(|targets| targets.contains(upgraded))
    }

    /// True when either unit is a registered upgrade of the other.
    pub fn related(&self, a: &str, b: &str) -> bool {
        self.upgrades_to(a, b) || self.upgrades_to(b, a)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges
            .iter()
            .flat_map(|(base, targets)| targets.iter().map(move |t| (base.as_str(), t.as_str())))
    }

    pub fn len(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only snapshot of units, mercenaries and upgrades.
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    units: HashMap<String, Unit>,
    mercenaries: HashMap<String, Mercenary>,
    /// Mercenary name -> id; raw send lists use display names.
    mercenary_names: HashMap<String, String>,
    upgrades: UpgradeGraph,
}

impl UnitCatalog {
    pub fn new(units: Vec<Unit>, mercenaries: Vec<Mercenary>, upgrades: UpgradeGraph) -> Self {
        let mercenary_names = mercenaries
            .iter()
            .map(|m| (m.name.clone(), m.unit_id.clone()))
            .collect();
        Self {
            units: units.into_iter().map(|u| (u.unit_id.clone(), u)).collect(),
            mercenaries: mercenaries.into_iter().map(|m| (m.unit_id.clone(), m)).collect(),
            mercenary_names,
            upgrades,
        }
    }

    pub fn unit(&self, unit_id: &str) -> Option<&Unit> {
        self.units.get(unit_id)
    }

    /// Unit lookup that treats absence as a data-integrity error.
    pub fn require_unit(&self, unit_id: &str) -> DomainResult<&Unit> {
        self.unit(unit_id)
            .ok_or_else(|| DomainError::MissingUnit(unit_id.to_string()))
    }

    /// Mercenary lookup by id, falling back to display name.
    pub fn mercenary(&self, key: &str) -> Option<&Mercenary> {
        self.mercenaries.get(key).or_else(|| {
            self.mercenary_names
                .get(key)
                .and_then(|id| self.mercenaries.get(id))
        })
    }

    pub fn require_mercenary(&self, key: &str) -> DomainResult<&Mercenary> {
        self.mercenary(key)
            .ok_or_else(|| DomainError::UnknownMercenary(key.to_string()))
    }

    /// All units sorted by id.
    pub fn units(&self) -> Vec<&Unit> {
        let mut units: Vec<&Unit> = self.units.values().collect();
        units.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        units
    }

    /// Usable units sorted by id.
    pub fn usable_units(&self) -> Vec<&Unit> {
        self.units().into_iter().filter(|u| u.usable).collect()
    }

    pub fn mercenaries(&self) -> Vec<&Mercenary> {
        let mut mercs: Vec<&Mercenary> = self.mercenaries.values().collect();
        mercs.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        mercs
    }

    pub fn upgrades(&self) -> &UpgradeGraph {
        &self.upgrades
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn mercenary_count(&self) -> usize {
        self.mercenaries.len()
    }
}
