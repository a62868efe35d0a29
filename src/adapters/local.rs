use crate::adapters::local_store::LocalStore;
use crate::domain::events::{ChangeCallback, Subscription};
use crate::domain::filter::ListFilter;
use crate::domain::model::Document;
use crate::domain::ports::{BackendKind, DatabaseAdapter};
use crate::domain::table::Table;
use crate::mapping::{self, Entity, MappingContext};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::diagnostics::{DiagnosticSink, TracingSink};
use crate::utils::error::{DataError, Result};
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug)]
struct UndoEntry {
    table: Table,
    id: String,
    previous: Option<Value>,
}

/// Undo journal for one open transaction.
#[derive(Debug, Default)]
struct TxScope {
    open: AtomicBool,
    undo: Mutex<Vec<UndoEntry>>,
}

impl TxScope {
    fn begin() -> Arc<Self> {
        Arc::new(Self {
            open: AtomicBool::new(true),
            undo: Mutex::new(Vec::new()),
        })
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn record(&self, table: Table, id: &str, previous: Option<Value>) {
        if let Ok(mut undo) = self.undo.lock() {
            undo.push(UndoEntry {
                table,
                id: id.to_string(),
                previous,
            });
        }
    }

    fn close(&self) -> Vec<UndoEntry> {
        self.open.store(false, Ordering::SeqCst);
        self.undo
            .lock()
            .map(|mut undo| std::mem::take(&mut *undo))
            .unwrap_or_default()
    }
}

/// Adapter over the embedded [`LocalStore`].
///
/// Transactions are atomic within this process: the write gate is held for the
/// whole body and every write is journaled so a failing body is rolled back.
/// There is no change source, so subscriptions never fire.
#[derive(Clone)]
pub struct LocalAdapter {
    store: Arc<LocalStore>,
    diagnostics: Arc<dyn DiagnosticSink>,
    clock: Arc<dyn Clock>,
    scope: Option<Arc<TxScope>>,
}

enum Write {
    Insert(Value),
    Put(Value),
    Remove,
}

impl LocalAdapter {
    pub fn new(store: LocalStore, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            store: Arc::new(store),
            diagnostics,
            clock: Arc::new(SystemClock),
            scope: None,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(LocalStore::in_memory(), Arc::new(TracingSink))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    fn mapping(&self) -> MappingContext<'_> {
        MappingContext::new(self.diagnostics.as_ref(), self.clock.as_ref())
    }

    fn open_scope(&self) -> Option<&Arc<TxScope>> {
        self.scope.as_ref().filter(|scope| scope.is_open())
    }

    async fn apply(&self, table: Table, id: &str, write: Write) -> Result<Option<Value>> {
        match write {
            Write::Insert(row) => {
                self.store.insert(table, id, row).await?;
                Ok(None)
            }
            Write::Put(row) => Ok(self.store.put(table, id, row).await),
            Write::Remove => Ok(self.store.remove(table, id).await),
        }
    }

    /// Takes the write gate unless this handle belongs to an open
    /// transaction, which already holds it. Callers keep the guard across
    /// their read-modify-write so no uncommitted row is read outside it.
    async fn exclusive(&self) -> Option<OwnedMutexGuard<()>> {
        match self.open_scope() {
            Some(_) => None,
            None => Some(self.store.write_gate().lock_owned().await),
        }
    }

    /// Runs one write under the transaction journal when inside a
    /// transaction, otherwise applies and persists it. A failed persist puts
    /// the previous row back. The caller holds the gate.
    async fn write(&self, table: Table, id: &str, write: Write) -> Result<()> {
        let previous = self.apply(table, id, write).await?;

        if let Some(scope) = self.open_scope() {
            scope.record(table, id, previous);
            return Ok(());
        }

        if let Err(e) = self.store.persist().await {
            self.store.restore(table, id, previous).await;
            tracing::warn!(table = %table, id, error = %e, "local write reverted, snapshot not saved");
            return Err(e);
        }
        Ok(())
    }

    async fn rollback(&self, undo: Vec<UndoEntry>) {
        let count = undo.len();
        for entry in undo.into_iter().rev() {
            self.store.restore(entry.table, &entry.id, entry.previous).await;
        }
        tracing::debug!(writes = count, "local transaction rolled back");
    }
}

impl DatabaseAdapter for LocalAdapter {
    fn backend(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>> {
        match self.store.get(E::TABLE, id).await {
            Some(raw) => Ok(Some(mapping::decode(raw, &self.mapping())?)),
            None => Ok(None),
        }
    }

    async fn create<E: Entity>(&self, data: Document) -> Result<E> {
        let entity: E = mapping::new_entity(data, self.clock.as_ref())?;
        let row = mapping::encode(&entity)?;
        let _guard = self.exclusive().await;
        self.write(E::TABLE, entity.id(), Write::Insert(Value::Object(row)))
            .await?;
        tracing::debug!(table = %E::TABLE, id = entity.id(), "created local record");
        Ok(entity)
    }

    async fn update<E: Entity>(&self, id: &str, patch: Document) -> Result<E> {
        let _guard = self.exclusive().await;
        let current: E = self
            .get(id)
            .await?
            .ok_or_else(|| DataError::not_found(E::TABLE.as_str(), id))?;

        let merged = mapping::apply_patch(&current, &patch, self.clock.as_ref())?;
        let row = mapping::encode(&merged)?;
        self.write(E::TABLE, id, Write::Put(Value::Object(row))).await?;
        Ok(merged)
    }

    async fn delete<E: Entity>(&self, id: &str) -> Result<()> {
        let _guard = self.exclusive().await;
        if self.store.get(E::TABLE, id).await.is_none() {
            tracing::debug!(table = %E::TABLE, id, "delete of absent local record");
            return Ok(());
        }
        self.write(E::TABLE, id, Write::Remove).await
    }

    async fn list<E: Entity>(&self, filter: &ListFilter) -> Result<Vec<E>> {
        let resolved = filter.resolve(E::TABLE);
        let rows = self
            .store
            .scan(E::TABLE, resolved.indexed_predicate(E::TABLE))
            .await;

        let ctx = self.mapping();
        let mut matched: Vec<E> = Vec::new();
        for raw in rows {
            let entity: E = mapping::decode(raw, &ctx)?;
            let matches = match serde_json::to_value(&entity)? {
                Value::Object(object) => resolved.matches(&object),
                _ => false,
            };
            if matches {
                matched.push(entity);
            }
        }

        matched.sort_by(|a, b| {
            a.created_at()
                .cmp(b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(resolved.paginate(matched))
    }

    async fn transaction<F, Fut, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(Self) -> Fut + Send,
        Fut: Future<Output = Result<R>> + Send,
        R: Send,
    {
        if self.open_scope().is_some() {
            // nested: join the enclosing transaction
            return f(self.clone()).await;
        }

        let gate = self.store.write_gate();
        let _guard = gate.lock_owned().await;

        let scope = TxScope::begin();
        let handle = LocalAdapter {
            scope: Some(scope.clone()),
            ..self.clone()
        };

        let outcome = f(handle).await;
        let undo = scope.close();

        match outcome {
            Ok(value) => {
                if !undo.is_empty() {
                    if let Err(e) = self.store.persist().await {
                        self.rollback(undo).await;
                        return Err(e);
                    }
                }
                Ok(value)
            }
            Err(e) => {
                self.rollback(undo).await;
                Err(e)
            }
        }
    }

    async fn subscribe_to_table(&self, table: &str, _callback: ChangeCallback) -> Result<Subscription> {
        let table: Table = table.parse()?;
        tracing::debug!(table = %table, "local backend has no change feed; subscription is inert");
        Ok(Subscription::inert(table.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Child, Household};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_rollback_restores_previous_rows() {
        let adapter = LocalAdapter::in_memory();
        let existing: Household = adapter
            .create(doc(json!({"household_id": "h1", "city": "Before"})))
            .await
            .unwrap();

        let result: Result<()> = adapter
            .transaction(|tx| async move {
                tx.update::<Household>("h1", doc(json!({"city": "After"}))).await?;
                tx.create::<Household>(doc(json!({"household_id": "h2"}))).await?;
                tx.delete::<Household>("h1").await?;
                Err(DataError::validation("abort"))
            })
            .await;
        assert!(result.is_err());

        let restored: Household = adapter.get("h1").await.unwrap().unwrap();
        assert_eq!(restored, existing);
        assert!(adapter.get::<Household>("h2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_update_waits_for_rollback() {
        let adapter = LocalAdapter::in_memory();
        adapter
            .create::<Household>(doc(json!({"household_id": "h1", "city": "Before"})))
            .await
            .unwrap();

        let (started, wait_started) = tokio::sync::oneshot::channel::<()>();
        let outer = adapter.clone();
        let concurrent = tokio::spawn(async move {
            wait_started.await.unwrap();
            outer
                .update::<Household>("h1", doc(json!({"name": "Smith"})))
                .await
        });

        let result: Result<()> = adapter
            .transaction(|tx| async move {
                tx.update::<Household>("h1", doc(json!({"city": "After"}))).await?;
                let _ = started.send(());
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(DataError::validation("abort"))
            })
            .await;
        assert!(result.is_err());

        let updated = concurrent.await.unwrap().unwrap();
        assert_eq!(updated.city, "Before");
        assert_eq!(updated.name.as_deref(), Some("Smith"));

        let stored: Household = adapter.get("h1").await.unwrap().unwrap();
        assert_eq!(stored.city, "Before");
    }

    /// A directory at the staging path makes every snapshot write fail.
    async fn unwritable_adapter(dir: &TempDir) -> LocalAdapter {
        let path = dir.path().join("store.json");
        let store = LocalStore::open(&path).await.unwrap();
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        LocalAdapter::new(store, Arc::new(TracingSink))
    }

    #[tokio::test]
    async fn test_failed_persist_reverts_write() {
        let dir = TempDir::new().unwrap();
        let adapter = unwritable_adapter(&dir).await;

        let result = adapter
            .create::<Household>(doc(json!({"household_id": "h1"})))
            .await;
        assert!(result.is_err());
        assert!(adapter.get::<Household>("h1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back_transaction() {
        let dir = TempDir::new().unwrap();
        let adapter = unwritable_adapter(&dir).await;

        let result = adapter
            .transaction(|tx| async move {
                tx.create::<Household>(doc(json!({"household_id": "h1"}))).await?;
                tx.create::<Child>(doc(json!({"child_id": "c1", "household_id": "h1"})))
                    .await?;
                Ok(())
            })
            .await;

        assert!(result.is_err());
        assert!(adapter.get::<Household>("h1").await.unwrap().is_none());
        assert!(adapter.get::<Child>("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_nested_transaction_joins_outer() {
        let adapter = LocalAdapter::in_memory();

        let result: Result<()> = adapter
            .transaction(|tx| async move {
                tx.transaction(|inner| async move {
                    inner
                        .create::<Child>(doc(json!({"child_id": "c1", "first_name": "Ann"})))
                        .await?;
                    Ok(())
                })
                .await?;
                Err(DataError::validation("outer fails"))
            })
            .await;
        assert!(result.is_err());
        assert!(adapter.get::<Child>("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_writes_after_transaction_are_not_journaled() {
        let adapter = LocalAdapter::in_memory();

        let escaped = adapter
            .transaction(|tx| async move { Ok(tx) })
            .await
            .unwrap();
        escaped
            .create::<Household>(doc(json!({"household_id": "h9"})))
            .await
            .unwrap();

        assert!(adapter.get::<Household>("h9").await.unwrap().is_some());
    }
}
