//! SQLite implementation of the CatalogRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Mercenary, Unit, UnitCatalog, UpgradeGraph};
use crate::domain::ports::CatalogRepository;

#[derive(Clone)]
pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn load_catalog(&self) -> DomainResult<UnitCatalog> {
        let units: Vec<UnitRow> = sqlx::query_as(
            "SELECT unit_id, name, total_value, usable, version, icon_path FROM units",
        )
        .fetch_all(&self.pool)
        .await?;

        let mercenaries: Vec<MercenaryRow> = sqlx::query_as(
            "SELECT unit_id, name, mythium_cost, income_bonus, version, icon_path FROM mercenaries",
        )
        .fetch_all(&self.pool)
        .await?;

        let edges: Vec<(String, String)> =
            sqlx::query_as("SELECT unit_id, upgrade_id FROM unit_upgrades")
                .fetch_all(&self.pool)
                .await?;

        let mut upgrades = UpgradeGraph::new();
        for (base, upgraded) in edges {
            upgrades.add(base, upgraded);
        }

        Ok(UnitCatalog::new(
            units.into_iter().map(Unit::try_from).collect::<DomainResult<_>>()?,
            mercenaries
                .into_iter()
                .map(Mercenary::try_from)
                .collect::<DomainResult<_>>()?,
            upgrades,
        ))
    }

    async fn save_unit(&self, unit: &Unit) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT OR REPLACE INTO units (unit_id, name, total_value, usable, version, icon_path)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&unit.unit_id)
        .bind(&unit.name)
        .bind(i64::from(unit.total_value))
        .bind(unit.usable)
        .bind(&unit.version)
        .bind(&unit.icon_path)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_mercenary(&self, mercenary: &Mercenary) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT OR REPLACE INTO mercenaries (unit_id, name, mythium_cost, income_bonus, version, icon_path)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&mercenary.unit_id)
        .bind(&mercenary.name)
        .bind(i64::from(mercenary.mythium_cost))
        .bind(i64::from(mercenary.income_bonus))
        .bind(&mercenary.version)
        .bind(&mercenary.icon_path)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_upgrade(&self, base: &str, upgraded: &str) -> DomainResult<()> {
        sqlx::query("INSERT OR IGNORE INTO unit_upgrades (unit_id, upgrade_id) VALUES (?, ?)")
            .bind(base)
            .bind(upgraded)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct UnitRow {
    unit_id: String,
    name: String,
    total_value: i64,
    usable: bool,
    version: String,
    icon_path: String,
}

impl TryFrom<UnitRow> for Unit {
    type Error = DomainError;

    fn try_from(row: UnitRow) -> Result<Self, Self::Error> {
        let total_value = u32::try_from(row.total_value).map_err(|_| {
            DomainError::SerializationError(format!("Invalid total value for {}", row.unit_id))
        })?;
        Ok(Unit {
            unit_id: row.unit_id,
            name: row.name,
            total_value,
            usable: row.usable,
            version: row.version,
            icon_path: row.icon_path,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MercenaryRow {
    unit_id: String,
    name: String,
    mythium_cost: i64,
    income_bonus: i64,
    version: String,
    icon_path: String,
}

impl TryFrom<MercenaryRow> for Mercenary {
    type Error = DomainError;

    fn try_from(row: MercenaryRow) -> Result<Self, Self::Error> {
        let invalid = |field: &str| {
            DomainError::SerializationError(format!("Invalid {field} for {}", row.unit_id))
        };
        let mythium_cost = u32::try_from(row.mythium_cost).map_err(|_| invalid("mythium cost"))?;
        let income_bonus = u32::try_from(row.income_bonus).map_err(|_| invalid("income bonus"))?;
        Ok(Mercenary {
            unit_id: row.unit_id,
            name: row.name,
            mythium_cost,
            income_bonus,
            version: row.version,
            icon_path: row.icon_path,
        })
    }
}
