//! In-memory HoldRepository.
//!
//! A two-level keyed store: table -> (fingerprint, version) -> Hold, and
//! table -> hold id -> send fingerprint -> send record. Ids are assigned
//! from process-local counters starting at 1.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Hold, SendRecord, TableKey};
use crate::domain::ports::HoldRepository;

type HoldKey = (String, String);

#[derive(Debug, Default)]
struct Store {
    tables: BTreeSet<TableKey>,
    holds: HashMap<TableKey, HashMap<HoldKey, Hold>>,
    hold_index: HashMap<i64, (TableKey, HoldKey)>,
    sends: HashMap<TableKey, BTreeMap<i64, BTreeMap<String, SendRecord>>>,
    last_hold_id: i64,
    last_send_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryHoldRepository {
    store: RwLock<Store>,
}

impl InMemoryHoldRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total holds across every table.
    pub async fn hold_count(&self) -> usize {
        self.store.read().await.holds.values().map(HashMap::len).sum()
    }
}

#[async_trait]
impl HoldRepository for InMemoryHoldRepository {
    async fn is_provisioned(&self, table: &TableKey) -> DomainResult<bool> {
        Ok(self.store.read().await.tables.contains(table))
    }

    async fn provision(&self, table: &TableKey) -> DomainResult<()> {
        self.store.write().await.tables.insert(table.clone());
        Ok(())
    }

    async fn list_tables(&self) -> DomainResult<Vec<TableKey>> {
        Ok(self.store.read().await.tables.iter().cloned().collect())
    }

    async fn find_hold(
        &self,
        table: &TableKey,
        fingerprint: &str,
        version: &str,
    ) -> DomainResult<Option<Hold>> {
        let store = self.store.read().await;
        let key = (fingerprint.to_string(), version.to_string());
        Ok(store.holds.get(table).and_then(|h| h.get(&key)).cloned())
    }

    async fn find_hold_by_id(&self, table: &TableKey, id: i64) -> DomainResult<Option<Hold>> {
        let store = self.store.read().await;
        Ok(store
            .hold_index
            .get(&id)
            .filter(|(t, _)| t == table)
            .and_then(|(t, key)| store.holds.get(t).and_then(|h| h.get(key)))
            .cloned())
    }

    async fn insert_hold(&self, table: &TableKey, hold: &Hold) -> DomainResult<i64> {
        let mut store = self.store.write().await;
        let key = (hold.fingerprint.clone(), hold.version_added.clone());
        if store.holds.get(table).is_some_and(|h| h.contains_key(&key)) {
            return Err(DomainError::DatabaseError(format!(
                "hold {} already exists in {table}",
                hold.fingerprint
            )));
        }

        store.last_hold_id += 1;
        let id = store.last_hold_id;
        let mut stored = hold.clone();
        stored.id = id;

        store.hold_index.insert(id, (table.clone(), key.clone()));
        store.holds.entry(table.clone()).or_default().insert(key, stored);
        Ok(id)
    }

    async fn update_hold(&self, table: &TableKey, hold: &Hold) -> DomainResult<()> {
        let mut store = self.store.write().await;
        let missing = || DomainError::MissingHold {
            table: table.name(),
            id: hold.id,
        };

        let key = match store.hold_index.get(&hold.id) {
            Some((t, key)) if t == table => key.clone(),
            _ => return Err(missing()),
        };
        let stored = store
            .holds
            .get_mut(table)
            .and_then(|h| h.get_mut(&key))
            .ok_or_else(missing)?;
        stored.won = hold.won;
        stored.lost = hold.lost;
        stored.workers = hold.workers;
        Ok(())
    }

    async fn list_sends(&self, table: &TableKey) -> DomainResult<Vec<SendRecord>> {
        let store = self.store.read().await;
        let mut sends: Vec<SendRecord> = store
            .sends
            .get(table)
            .into_iter()
            .flat_map(|by_hold| by_hold.values().flat_map(BTreeMap::values))
            .cloned()
            .collect();
        sends.sort_by_key(|s| s.id);
        Ok(sends)
    }

    async fn find_send(
        &self,
        table: &TableKey,
        hold_id: i64,
        sends: &str,
    ) -> DomainResult<Option<SendRecord>> {
        let store = self.store.read().await;
        Ok(store
            .sends
            .get(table)
            .and_then(|by_hold| by_hold.get(&hold_id))
            .and_then(|by_fp| by_fp.get(sends))
            .cloned())
    }

    async fn insert_send(&self, table: &TableKey, send: &SendRecord) -> DomainResult<i64> {
        let mut store = self.store.write().await;
        store.last_send_id += 1;
        let id = store.last_send_id;
        let mut stored = send.clone();
        stored.id = id;

        store
            .sends
            .entry(table.clone())
            .or_default()
            .entry(send.hold_id)
            .or_default()
            .insert(send.sends.clone(), stored);
        Ok(id)
    }

    async fn update_send(&self, table: &TableKey, send: &SendRecord) -> DomainResult<()> {
        let mut store = self.store.write().await;
        let stored = store
            .sends
            .get_mut(table)
            .and_then(|by_hold| by_hold.get_mut(&send.hold_id))
            .and_then(|by_fp| by_fp.get_mut(&send.sends))
            .filter(|s| s.id == send.id)
            .ok_or_else(|| {
                DomainError::DatabaseError(format!("send {} not found in {table}", send.id))
            })?;
        stored.held = send.held;
        stored.leaked = send.leaked;
        stored.leaked_amount = send.leaked_amount;
        Ok(())
    }

    async fn list_distinct_versions(&self, table: Option<&TableKey>) -> DomainResult<Vec<String>> {
        let store = self.store.read().await;
        let versions: BTreeSet<String> = store
            .holds
            .iter()
            .filter(|(t, _)| table.map_or(true, |wanted| *t == wanted))
            .flat_map(|(_, holds)| holds.keys().map(|(_, version)| version.clone()))
            .collect();
        Ok(versions.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{HoldTally, SendTally};

    #[tokio::test]
    async fn test_holds_are_keyed_by_table_fingerprint_and_version() {
        let repo = InMemoryHoldRepository::new();
        let table = TableKey::new("proton_unit_id", 1);
        let other = TableKey::new("proton_unit_id", 2);

        let hold = Hold::seed("fp", "fp", 90, "v1", &HoldTally::single(true, 10));
        let id = repo.insert_hold(&table, &hold).await.unwrap();
        let newer = repo
            .insert_hold(&table, &Hold::seed("fp", "fp", 90, "v2", &HoldTally::default()))
            .await
            .unwrap();
        assert_ne!(id, newer);
        assert!(repo.insert_hold(&table, &hold).await.is_err());

        assert_eq!(repo.find_hold(&table, "fp", "v1").await.unwrap().unwrap().id, id);
        assert!(repo.find_hold(&other, "fp", "v1").await.unwrap().is_none());
        assert!(repo.find_hold_by_id(&other, id).await.unwrap().is_none());
        assert_eq!(repo.hold_count().await, 2);
        assert_eq!(repo.list_distinct_versions(None).await.unwrap(), vec!["v1", "v2"]);
        assert!(repo.list_distinct_versions(Some(&other)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_counters() {
        let repo = InMemoryHoldRepository::new();
        let table = TableKey::new("proton_unit_id", 1);

        let id = repo
            .insert_hold(&table, &Hold::seed("fp", "fp", 90, "v1", &HoldTally::single(true, 10)))
            .await
            .unwrap();
        let mut hold = repo.find_hold_by_id(&table, id).await.unwrap().unwrap();
        hold.absorb(&HoldTally::single(false, 6));
        repo.update_hold(&table, &hold).await.unwrap();
        let hold = repo.find_hold_by_id(&table, id).await.unwrap().unwrap();
        assert_eq!((hold.won, hold.lost, hold.workers), (1, 1, 16));

        repo.insert_send(&table, &SendRecord::seed(id, "snail_unit_id", 20, &SendTally::single(true, 4)))
            .await
            .unwrap();
        let mut send = repo.find_send(&table, id, "snail_unit_id").await.unwrap().unwrap();
        send.absorb(&SendTally::single(false, 4));
        repo.update_send(&table, &send).await.unwrap();

        let sends = repo.list_sends(&table).await.unwrap();
        assert_eq!(sends.len(), 1);
        assert_eq!((sends[0].held, sends[0].leaked, sends[0].leaked_amount), (1, 1, 4));
    }

    #[tokio::test]
    async fn test_update_unknown_rows_fails() {
        let repo = InMemoryHoldRepository::new();
        let table = TableKey::new("proton_unit_id", 1);

        let mut hold = Hold::seed("fp", "fp", 90, "v1", &HoldTally::default());
        hold.id = 7;
        assert!(matches!(
            repo.update_hold(&table, &hold).await,
            Err(DomainError::MissingHold { id: 7, .. })
        ));

        let send = SendRecord::seed(7, "", 0, &SendTally::default());
        assert!(repo.update_send(&table, &send).await.is_err());
    }
}
