use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Hold, SendRecord, TableKey};

/// Repository port for hold and send persistence.
///
/// Holds are bucketed by [`TableKey`]. A Hold is unique per
/// (table, fingerprint, version); a send record is unique per (hold, send
/// fingerprint). Counters are written back with read-modify-write through
/// `update_*`, so callers must not interleave two writers on the same key.
#[async_trait]
pub trait HoldRepository: Send + Sync {
    /// Whether the table for this anchor and wave exists
    async fn is_provisioned(&self, table: &TableKey) -> DomainResult<bool>;

    /// Create the table; a no-op when it already exists
    async fn provision(&self, table: &TableKey) -> DomainResult<()>;

    /// Every provisioned table, ordered by anchor then wave
    async fn list_tables(&self) -> DomainResult<Vec<TableKey>>;

    /// Find a hold by canonical fingerprint within one version
    async fn find_hold(
        &self,
        table: &TableKey,
        fingerprint: &str,
        version: &str,
    ) -> DomainResult<Option<Hold>>;

    /// Find a hold by storage id
    async fn find_hold_by_id(&self, table: &TableKey, id: i64) -> DomainResult<Option<Hold>>;

    /// Insert a new hold and return its id
    async fn insert_hold(&self, table: &TableKey, hold: &Hold) -> DomainResult<i64>;

    /// Overwrite the counters of an existing hold
    async fn update_hold(&self, table: &TableKey, hold: &Hold) -> DomainResult<()>;

    /// Every send recorded against holds of this table, ordered by id
    async fn list_sends(&self, table: &TableKey) -> DomainResult<Vec<SendRecord>>;

    /// Find the send row of one hold for a send fingerprint
    async fn find_send(
        &self,
        table: &TableKey,
        hold_id: i64,
        sends: &str,
    ) -> DomainResult<Option<SendRecord>>;

    /// Insert a new send and return its id
    async fn insert_send(&self, table: &TableKey, send: &SendRecord) -> DomainResult<i64>;

    /// Overwrite the counters of an existing send
    async fn update_send(&self, table: &TableKey, send: &SendRecord) -> DomainResult<()>;

    /// Distinct versions holds were recorded under; all tables when `None`
    async fn list_distinct_versions(&self, table: Option<&TableKey>) -> DomainResult<Vec<String>>;
}
