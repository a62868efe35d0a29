//! Embedded document store backing the local adapter.
//!
//! One collection per [`Table`], rows keyed by id, with secondary indices on
//! the table's foreign-key-shaped columns. The store is process-local. When
//! opened with a path it keeps a JSON snapshot on disk, written after each
//! committed write.

use crate::domain::table::Table;
use crate::utils::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub const SCHEMA_VERSION: u32 = 2;

#[derive(Debug)]
struct Collection {
    table: Table,
    rows: BTreeMap<String, Value>,
    indexes: HashMap<&'static str, BTreeMap<String, BTreeSet<String>>>,
}

fn index_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Value `row` is indexed under for `column`. Falls back to the column's
/// legacy spellings, matching what the mapping layer reads.
fn indexed_value<'a>(table: Table, row: &'a Value, column: &str) -> Option<&'a Value> {
    std::iter::once(column)
        .chain(table.legacy_columns(column).iter().copied())
        .filter_map(|name| row.get(name))
        .find(|value| !value.is_null())
}

impl Collection {
    fn new(table: Table) -> Self {
        Self {
            table,
            rows: BTreeMap::new(),
            indexes: table
                .indexes()
                .iter()
                .map(|column| (*column, BTreeMap::new()))
                .collect(),
        }
    }

    fn unindex(&mut self, id: &str, row: &Value) {
        for (column, index) in self.indexes.iter_mut() {
            if let Some(key) = indexed_value(self.table, row, column).and_then(index_key) {
                if let Some(ids) = index.get_mut(&key) {
                    ids.remove(id);
                    if ids.is_empty() {
                        index.remove(&key);
                    }
                }
            }
        }
    }

    fn reindex(&mut self, id: &str, row: &Value) {
        for (column, index) in self.indexes.iter_mut() {
            if let Some(key) = indexed_value(self.table, row, column).and_then(index_key) {
                index.entry(key).or_default().insert(id.to_string());
            }
        }
    }

    fn put(&mut self, id: String, row: Value) -> Option<Value> {
        let previous = self.rows.remove(&id);
        if let Some(previous) = &previous {
            self.unindex(&id, previous);
        }
        self.reindex(&id, &row);
        self.rows.insert(id, row);
        previous
    }

    fn remove(&mut self, id: &str) -> Option<Value> {
        let previous = self.rows.remove(id)?;
        self.unindex(id, &previous);
        Some(previous)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    collections: HashMap<Table, Collection>,
}

impl StoreState {
    fn empty() -> Self {
        Self {
            collections: Table::ALL
                .iter()
                .map(|table| (*table, Collection::new(*table)))
                .collect(),
        }
    }

    fn collection(&mut self, table: Table) -> &mut Collection {
        self.collections
            .entry(table)
            .or_insert_with(|| Collection::new(table))
    }
}

/// On-disk snapshot layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    collections: BTreeMap<String, Vec<Value>>,
}

/// Upgrades a snapshot written by an older schema version in place.
fn migrate(snapshot: &mut Snapshot) -> Result<()> {
    if snapshot.version > SCHEMA_VERSION {
        return Err(DataError::ConfigError {
            message: format!(
                "local store schema version {} is newer than supported version {}",
                snapshot.version, SCHEMA_VERSION
            ),
        });
    }

    if snapshot.version < 2 {
        // v1 kept Bible Bee cycles under their old collection name
        if let Some(rows) = snapshot.collections.remove("competition_years") {
            snapshot
                .collections
                .entry(Table::BibleBeeCycles.as_str().to_string())
                .or_default()
                .extend(rows);
        }
        tracing::info!(from = snapshot.version, to = 2, "migrated local store schema");
        snapshot.version = 2;
    }

    Ok(())
}

#[derive(Debug)]
pub struct LocalStore {
    state: RwLock<StoreState>,
    write_gate: Arc<Mutex<()>>,
    path: Option<PathBuf>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(StoreState::empty()),
            write_gate: Arc::new(Mutex::new(())),
            path: None,
        }
    }

    /// Opens (or creates) a store persisted at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut state = StoreState::empty();

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let mut snapshot: Snapshot = serde_json::from_str(&content)?;
                migrate(&mut snapshot)?;

                for (name, rows) in snapshot.collections {
                    let Ok(table) = name.parse::<Table>() else {
                        tracing::warn!(collection = %name, "skipping unknown collection in local store snapshot");
                        continue;
                    };
                    let collection = state.collection(table);
                    for row in rows {
                        match row.get(table.id_column()).and_then(Value::as_str) {
                            Some(id) => {
                                let id = id.to_string();
                                collection.put(id, row);
                            }
                            None => tracing::warn!(table = %table, "skipping snapshot row without id"),
                        }
                    }
                }
                tracing::debug!(path = %path.display(), "loaded local store snapshot");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no local store snapshot yet, starting empty");
            }
            Err(e) => return Err(DataError::IoError(e)),
        }

        Ok(Self {
            state: RwLock::new(state),
            write_gate: Arc::new(Mutex::new(())),
            path: Some(path),
        })
    }

    pub fn version(&self) -> u32 {
        SCHEMA_VERSION
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Serializes writers. Held for a single write, or for a whole transaction.
    pub(crate) fn write_gate(&self) -> Arc<Mutex<()>> {
        self.write_gate.clone()
    }

    pub async fn get(&self, table: Table, id: &str) -> Option<Value> {
        let state = self.state.read().await;
        state
            .collections
            .get(&table)
            .and_then(|collection| collection.rows.get(id))
            .cloned()
    }

    /// All rows of `table`, or only those whose indexed `column` equals `value`.
    pub async fn scan(&self, table: Table, index: Option<(&str, &Value)>) -> Vec<Value> {
        let state = self.state.read().await;
        let Some(collection) = state.collections.get(&table) else {
            return Vec::new();
        };

        match index.and_then(|(column, value)| {
            collection
                .indexes
                .get(column)
                .map(|idx| (idx, index_key(value)))
        }) {
            Some((idx, Some(key))) => idx
                .get(&key)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| collection.rows.get(id).cloned())
                        .collect()
                })
                .unwrap_or_default(),
            Some((_, None)) => collection
                .rows
                .values()
                .filter(|row| {
                    index
                        .map(|(column, _)| indexed_value(table, row, column).is_none())
                        .unwrap_or(true)
                })
                .cloned()
                .collect(),
            None => collection.rows.values().cloned().collect(),
        }
    }

    pub async fn len(&self, table: Table) -> usize {
        let state = self.state.read().await;
        state
            .collections
            .get(&table)
            .map(|collection| collection.rows.len())
            .unwrap_or(0)
    }

    /// Inserts a row under a fresh id; fails if the id is taken.
    pub(crate) async fn insert(&self, table: Table, id: &str, row: Value) -> Result<()> {
        let mut state = self.state.write().await;
        let collection = state.collection(table);
        if collection.rows.contains_key(id) {
            return Err(DataError::validation(format!(
                "{} record already exists: {}",
                table, id
            )));
        }
        collection.put(id.to_string(), row);
        Ok(())
    }

    /// Replaces the row stored under `id`, returning the previous one.
    pub(crate) async fn put(&self, table: Table, id: &str, row: Value) -> Option<Value> {
        let mut state = self.state.write().await;
        state.collection(table).put(id.to_string(), row)
    }

    pub(crate) async fn remove(&self, table: Table, id: &str) -> Option<Value> {
        let mut state = self.state.write().await;
        state.collection(table).remove(id)
    }

    /// Puts back what a write replaced; `None` removes the row.
    pub(crate) async fn restore(&self, table: Table, id: &str, previous: Option<Value>) {
        let mut state = self.state.write().await;
        let collection = state.collection(table);
        match previous {
            Some(row) => {
                collection.put(id.to_string(), row);
            }
            None => {
                collection.remove(id);
            }
        }
    }

    /// Writes the snapshot file if this store is persistent.
    pub async fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = {
            let state = self.state.read().await;
            let snapshot = Snapshot {
                version: SCHEMA_VERSION,
                collections: state
                    .collections
                    .iter()
                    .filter(|(_, collection)| !collection.rows.is_empty())
                    .map(|(table, collection)| {
                        (
                            table.as_str().to_string(),
                            collection.rows.values().cloned().collect(),
                        )
                    })
                    .collect(),
            };
            serde_json::to_string_pretty(&snapshot)?
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let staging = path.with_extension("tmp");
        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, path).await?;
        tracing::debug!(path = %path.display(), "persisted local store snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_index_tracks_updates_and_removals() {
        let store = LocalStore::in_memory();
        store
            .insert(Table::Children, "c1", json!({"child_id": "c1", "household_id": "h1"}))
            .await
            .unwrap();
        store
            .insert(Table::Children, "c2", json!({"child_id": "c2", "household_id": "h1"}))
            .await
            .unwrap();

        let h1 = json!("h1");
        assert_eq!(store.scan(Table::Children, Some(("household_id", &h1))).await.len(), 2);

        store
            .put(Table::Children, "c2", json!({"child_id": "c2", "household_id": "h2"}))
            .await;
        assert_eq!(store.scan(Table::Children, Some(("household_id", &h1))).await.len(), 1);

        store.remove(Table::Children, "c1").await;
        assert!(store.scan(Table::Children, Some(("household_id", &h1))).await.is_empty());
        assert_eq!(store.len(Table::Children).await, 1);
    }

    #[tokio::test]
    async fn test_legacy_column_is_indexed_under_canonical_name() {
        let store = LocalStore::in_memory();
        store
            .insert(Table::Divisions, "d1", json!({"id": "d1", "year_id": "y1"}))
            .await
            .unwrap();
        store
            .insert(Table::Divisions, "d2", json!({"id": "d2", "bible_bee_cycle_id": "y2"}))
            .await
            .unwrap();

        let y1 = json!("y1");
        let rows = store
            .scan(Table::Divisions, Some(("bible_bee_cycle_id", &y1)))
            .await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "d1");

        store.remove(Table::Divisions, "d1").await;
        assert!(store
            .scan(Table::Divisions, Some(("bible_bee_cycle_id", &y1)))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let store = LocalStore::in_memory();
        store
            .insert(Table::Households, "h1", json!({"household_id": "h1"}))
            .await
            .unwrap();
        let err = store
            .insert(Table::Households, "h1", json!({"household_id": "h1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let store = LocalStore::open(&path).await.unwrap();
        store
            .insert(Table::Households, "h1", json!({"household_id": "h1", "city": "Testville"}))
            .await
            .unwrap();
        store.persist().await.unwrap();

        let reopened = LocalStore::open(&path).await.unwrap();
        let row = reopened.get(Table::Households, "h1").await.unwrap();
        assert_eq!(row["city"], "Testville");
    }

    #[tokio::test]
    async fn test_v1_snapshot_is_migrated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{"version": 1, "collections": {"competition_years": [{"id": "y1", "name": "2024"}]}}"#,
        )
        .unwrap();

        let store = LocalStore::open(&path).await.unwrap();
        assert!(store.get(Table::BibleBeeCycles, "y1").await.is_some());
    }

    #[tokio::test]
    async fn test_newer_snapshot_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"version": 99, "collections": {}}"#).unwrap();

        let err = LocalStore::open(&path).await.unwrap_err();
        assert!(matches!(err, DataError::ConfigError { .. }));
    }
}
