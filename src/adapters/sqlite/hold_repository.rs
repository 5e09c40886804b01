//! SQLite implementation of the HoldRepository.
//!
//! Every (anchor unit x wave) table shares the `holds` and `sends` tables,
//! partitioned by a `table_name` column; `hold_tables` records which
//! partitions have been provisioned.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Hold, SendRecord, TableKey};
use crate::domain::ports::HoldRepository;

const HOLD_COLUMNS: &str =
    "id, fingerprint, position, total_value, won, lost, workers, version_added";
const SEND_COLUMNS: &str = "id, hold_id, sends, total_mythium, held, leaked, leaked_amount";

#[derive(Clone)]
pub struct SqliteHoldRepository {
    pool: SqlitePool,
}

impl SqliteHoldRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HoldRepository for SqliteHoldRepository {
    async fn is_provisioned(&self, table: &TableKey) -> DomainResult<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM hold_tables WHERE anchor_unit = ? AND wave = ?")
                .bind(&table.anchor_unit)
                .bind(i64::from(table.wave))
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn provision(&self, table: &TableKey) -> DomainResult<()> {
        sqlx::query("INSERT OR IGNORE INTO hold_tables (name, anchor_unit, wave) VALUES (?, ?, ?)")
            .bind(table.name())
            .bind(&table.anchor_unit)
            .bind(i64::from(table.wave))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_tables(&self) -> DomainResult<Vec<TableKey>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT anchor_unit, wave FROM hold_tables ORDER BY anchor_unit, wave")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(anchor, wave)| Ok(TableKey::new(anchor, to_u8(wave, "wave")?)))
            .collect()
    }

    async fn find_hold(
        &self,
        table: &TableKey,
        fingerprint: &str,
        version: &str,
    ) -> DomainResult<Option<Hold>> {
        let row: Option<HoldRow> = sqlx::query_as(&format!(
            "SELECT {HOLD_COLUMNS} FROM holds WHERE table_name = ? AND fingerprint = ? AND version_added = ?"
        ))
        .bind(table.name())
        .bind(fingerprint)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Hold::try_from).transpose()
    }

    async fn find_hold_by_id(&self, table: &TableKey, id: i64) -> DomainResult<Option<Hold>> {
        let row: Option<HoldRow> = sqlx::query_as(&format!(
            "SELECT {HOLD_COLUMNS} FROM holds WHERE table_name = ? AND id = ?"
        ))
        .bind(table.name())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Hold::try_from).transpose()
    }

    async fn insert_hold(&self, table: &TableKey, hold: &Hold) -> DomainResult<i64> {
        let result = sqlx::query(
            r#"INSERT INTO holds (table_name, fingerprint, position, total_value, won, lost, workers, version_added)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(table.name())
        .bind(&hold.fingerprint)
        .bind(&hold.position)
        .bind(i64::from(hold.total_value))
        .bind(i64::from(hold.won))
        .bind(i64::from(hold.lost))
        .bind(to_i64(hold.workers)?)
        .bind(&hold.version_added)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update_hold(&self, table: &TableKey, hold: &Hold) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE holds SET won = ?, lost = ?, workers = ? WHERE table_name = ? AND id = ?",
        )
        .bind(i64::from(hold.won))
        .bind(i64::from(hold.lost))
        .bind(to_i64(hold.workers)?)
        .bind(table.name())
        .bind(hold.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::MissingHold {
                table: table.name(),
                id: hold.id,
            });
        }
        Ok(())
    }

    async fn list_sends(&self, table: &TableKey) -> DomainResult<Vec<SendRecord>> {
        let rows: Vec<SendRow> = sqlx::query_as(&format!(
            "SELECT {SEND_COLUMNS} FROM sends WHERE table_name = ? ORDER BY id"
        ))
        .bind(table.name())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SendRecord::try_from).collect()
    }

    async fn find_send(
        &self,
        table: &TableKey,
        hold_id: i64,
        sends: &str,
    ) -> DomainResult<Option<SendRecord>> {
        let row: Option<SendRow> = sqlx::query_as(&format!(
            "SELECT {SEND_COLUMNS} FROM sends WHERE table_name = ? AND hold_id = ? AND sends = ?"
        ))
        .bind(table.name())
        .bind(hold_id)
        .bind(sends)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SendRecord::try_from).transpose()
    }

    async fn insert_send(&self, table: &TableKey, send: &SendRecord) -> DomainResult<i64> {
        let result = sqlx::query(
            r#"INSERT INTO sends (table_name, hold_id, sends, total_mythium, held, leaked, leaked_amount)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(table.name())
        .bind(send.hold_id)
        .bind(&send.sends)
        .bind(i64::from(send.total_mythium))
        .bind(i64::from(send.held))
        .bind(i64::from(send.leaked))
        .bind(to_i64(send.leaked_amount)?)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update_send(&self, table: &TableKey, send: &SendRecord) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE sends SET held = ?, leaked = ?, leaked_amount = ? WHERE table_name = ? AND id = ?",
        )
        .bind(i64::from(send.held))
        .bind(i64::from(send.leaked))
        .bind(to_i64(send.leaked_amount)?)
        .bind(table.name())
        .bind(send.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::DatabaseError(format!(
                "send {} not found in {}",
                send.id, table
            )));
        }
        Ok(())
    }

    async fn list_distinct_versions(&self, table: Option<&TableKey>) -> DomainResult<Vec<String>> {
        let rows: Vec<(String,)> = match table {
            Some(table) => {
                sqlx::query_as(
                    "SELECT DISTINCT version_added FROM holds WHERE table_name = ? ORDER BY version_added",
                )
                .bind(table.name())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT DISTINCT version_added FROM holds ORDER BY version_added")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(|(v,)| v).collect())
    }
}

#[derive(sqlx::FromRow)]
struct HoldRow {
    id: i64,
    fingerprint: String,
    position: String,
    total_value: i64,
    won: i64,
    lost: i64,
    workers: i64,
    version_added: String,
}

impl TryFrom<HoldRow> for Hold {
    type Error = DomainError;

    fn try_from(row: HoldRow) -> Result<Self, Self::Error> {
        Ok(Hold {
            id: row.id,
            fingerprint: row.fingerprint,
            position: row.position,
            total_value: to_u32(row.total_value, "total_value")?,
            won: to_u32(row.won, "won")?,
            lost: to_u32(row.lost, "lost")?,
            workers: to_u64(row.workers, "workers")?,
            version_added: row.version_added,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SendRow {
    id: i64,
    hold_id: i64,
    sends: String,
    total_mythium: i64,
    held: i64,
    leaked: i64,
    leaked_amount: i64,
}

impl TryFrom<SendRow> for SendRecord {
    type Error = DomainError;

    fn try_from(row: SendRow) -> Result<Self, Self::Error> {
        Ok(SendRecord {
            id: row.id,
            hold_id: row.hold_id,
            sends: row.sends,
            total_mythium: to_u32(row.total_mythium, "total_mythium")?,
            held: to_u32(row.held, "held")?,
            leaked: to_u32(row.leaked, "leaked")?,
            leaked_amount: to_u64(row.leaked_amount, "leaked_amount")?,
        })
    }
}

fn to_u32(value: i64, column: &str) -> DomainResult<u32> {
    u32::try_from(value)
        .map_err(|_| DomainError::SerializationError(format!("{column} out of range: {value}")))
}

fn to_u64(value: i64, column: &str) -> DomainResult<u64> {
    u64::try_from(value)
        .map_err(|_| DomainError::SerializationError(format!("{column} out of range: {value}")))
}

fn to_u8(value: i64, column: &str) -> DomainResult<u8> {
    u8::try_from(value)
        .map_err(|_| DomainError::SerializationError(format!("{column} out of range: {value}")))
}

fn to_i64(value: u64) -> DomainResult<i64> {
    i64::try_from(value)
        .map_err(|_| DomainError::SerializationError(format!("counter overflow: {value}")))
}
