use crate::adapters::realtime::{ChangeFeed, SnapshotSource};
use crate::adapters::rest_client::RestClient;
use crate::domain::events::{ChangeCallback, Subscription};
use crate::domain::filter::{ListFilter, ResolvedFilter};
use crate::domain::model::Document;
use crate::domain::ports::{BackendKind, DatabaseAdapter};
use crate::domain::table::Table;
use crate::mapping::{self, Entity, MappingContext};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::diagnostics::{AppliedWrite, Diagnostic, DiagnosticSink, WriteOp};
use crate::utils::error::{DataError, Result};
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl RemoteSettings {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Adapter over the hosted relational store.
///
/// Writes are applied one request at a time. `transaction` does not roll back:
/// when the body fails after some writes were accepted, those writes stay and
/// are reported as a `PartialTransaction` diagnostic so they can be compensated
/// by hand. Concurrent writers resolve last-write-wins at the backend.
#[derive(Clone)]
pub struct RemoteAdapter {
    client: RestClient,
    feed: ChangeFeed,
    diagnostics: Arc<dyn DiagnosticSink>,
    clock: Arc<dyn Clock>,
    journal: Option<Arc<Mutex<Vec<AppliedWrite>>>>,
}

impl RemoteAdapter {
    pub fn new(settings: RemoteSettings, diagnostics: Arc<dyn DiagnosticSink>) -> Result<Self> {
        if settings.timeout.is_zero() || settings.poll_interval.is_zero() {
            return Err(DataError::ConfigError {
                message: "remote timeout and poll interval must be non-zero".to_string(),
            });
        }
        let client = RestClient::new(&settings.url, &settings.api_key, settings.timeout)?;
        let feed = ChangeFeed::new(Arc::new(client.clone()), settings.poll_interval);
        tracing::debug!(url = %settings.url, "remote adapter configured");

        Ok(Self {
            client,
            feed,
            diagnostics,
            clock: Arc::new(SystemClock),
            journal: None,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces where the change feed reads snapshots from.
    pub fn with_change_source(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.feed = ChangeFeed::new(source, self.feed.interval());
        self
    }

    fn mapping(&self) -> MappingContext<'_> {
        MappingContext::new(self.diagnostics.as_ref(), self.clock.as_ref())
    }

    fn record(&self, table: Table, id: &str, op: WriteOp) {
        if let Some(journal) = &self.journal {
            if let Ok(mut journal) = journal.lock() {
                journal.push(AppliedWrite {
                    table: table.as_str(),
                    id: id.to_string(),
                    op,
                });
            }
        }
    }
}

/// Query-string predicates for a resolved list filter.
pub(crate) fn query_params(table: Table, filter: &ResolvedFilter) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];

    for (column, value) in &filter.equals {
        let predicate = match value {
            Value::Null => "is.null".to_string(),
            Value::Bool(flag) => format!("is.{}", flag),
            Value::String(text) => format!("eq.{}", text),
            other => format!("eq.{}", other),
        };
        params.push((column.to_string(), predicate));
    }

    if let Some(term) = &filter.search {
        let clauses: Vec<String> = filter
            .search_columns
            .iter()
            .map(|column| format!("{}.ilike.*{}*", column, term))
            .collect();
        params.push(("or".to_string(), format!("({})", clauses.join(","))));
    }

    params.push((
        "order".to_string(),
        format!("created_at.asc,{}.asc", table.id_column()),
    ));
    if let Some(limit) = filter.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(offset) = filter.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }
    params
}

impl DatabaseAdapter for RemoteAdapter {
    fn backend(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>> {
        match self.client.select_one(E::TABLE, id).await? {
            Some(raw) => Ok(Some(mapping::decode(raw, &self.mapping())?)),
            None => Ok(None),
        }
    }

    async fn create<E: Entity>(&self, data: Document) -> Result<E> {
        let entity: E = mapping::new_entity(data, self.clock.as_ref())?;
        let row = mapping::encode(&entity)?;
        let stored = self.client.insert(E::TABLE, &row).await?;
        self.record(E::TABLE, entity.id(), WriteOp::Insert);
        mapping::decode(stored, &self.mapping())
    }

    async fn update<E: Entity>(&self, id: &str, patch: Document) -> Result<E> {
        let current: E = self
            .get(id)
            .await?
            .ok_or_else(|| DataError::not_found(E::TABLE.as_str(), id))?;

        let merged = mapping::apply_patch(&current, &patch, self.clock.as_ref())?;
        let columns = mapping::patch_columns(&merged, &patch)?;
        let stored = self
            .client
            .update(E::TABLE, id, &columns)
            .await?
            .ok_or_else(|| DataError::not_found(E::TABLE.as_str(), id))?;
        self.record(E::TABLE, id, WriteOp::Update);
        mapping::decode(stored, &self.mapping())
    }

    async fn delete<E: Entity>(&self, id: &str) -> Result<()> {
        self.client.delete(E::TABLE, id).await?;
        self.record(E::TABLE, id, WriteOp::Delete);
        Ok(())
    }

    async fn list<E: Entity>(&self, filter: &ListFilter) -> Result<Vec<E>> {
        let resolved = filter.resolve(E::TABLE);
        let rows = self
            .client
            .select(E::TABLE, &query_params(E::TABLE, &resolved))
            .await?;

        let ctx = self.mapping();
        rows.into_iter()
            .map(|raw| mapping::decode(raw, &ctx))
            .collect()
    }

    async fn transaction<F, Fut, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(Self) -> Fut + Send,
        Fut: Future<Output = Result<R>> + Send,
        R: Send,
    {
        if self.journal.is_some() {
            return f(self.clone()).await;
        }

        let journal = Arc::new(Mutex::new(Vec::new()));
        let handle = RemoteAdapter {
            journal: Some(journal.clone()),
            ..self.clone()
        };

        match f(handle).await {
            Ok(value) => Ok(value),
            Err(e) => {
                let applied = journal
                    .lock()
                    .map(|mut writes| std::mem::take(&mut *writes))
                    .unwrap_or_default();
                if !applied.is_empty() {
                    self.diagnostics.emit(Diagnostic::PartialTransaction {
                        applied,
                        error: e.to_string(),
                    });
                }
                Err(e)
            }
        }
    }

    async fn subscribe_to_table(&self, table: &str, callback: ChangeCallback) -> Result<Subscription> {
        let table: Table = table.parse()?;
        Ok(self.feed.subscribe(table, callback))
    }
}
