use crate::domain::events::{ChangeCallback, Subscription};
use crate::domain::filter::ListFilter;
use crate::domain::model::Document;
use crate::mapping::Entity;
use crate::utils::error::Result;
use std::fmt;
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Remote => f.write_str("remote"),
        }
    }
}

/// Operation set every backend implements. Per-entity operations are generic
/// over [`Entity`]: `get::<Household>(id)` is "get household".
///
/// - `get` returns `Ok(None)` for a missing id.
/// - `update` on a missing id fails with `DataError::NotFound`.
/// - `delete` is idempotent.
/// - `list` ignores filter keys the entity does not recognize.
/// - `transaction` returns whatever `f` returns. It is atomic only on the local
///   backend; the remote backend applies each write as it is issued.
pub trait DatabaseAdapter: Clone + Send + Sync + 'static {
    fn backend(&self) -> BackendKind;

    fn get<E: Entity>(&self, id: &str) -> impl Future<Output = Result<Option<E>>> + Send;

    fn create<E: Entity>(&self, data: Document) -> impl Future<Output = Result<E>> + Send;

    fn update<E: Entity>(
        &self,
        id: &str,
        patch: Document,
    ) -> impl Future<Output = Result<E>> + Send;

    fn delete<E: Entity>(&self, id: &str) -> impl Future<Output = Result<()>> + Send;

    fn list<E: Entity>(&self, filter: &ListFilter)
        -> impl Future<Output = Result<Vec<E>>> + Send;

    /// Runs `f` with a handle bound to this transaction and returns its result.
    fn transaction<F, Fut, R>(&self, f: F) -> impl Future<Output = Result<R>> + Send
    where
        F: FnOnce(Self) -> Fut + Send,
        Fut: Future<Output = Result<R>> + Send,
        R: Send;

    /// Registers `callback` for changes to `table`. Unknown table names are a
    /// validation error.
    fn subscribe_to_table(
        &self,
        table: &str,
        callback: ChangeCallback,
    ) -> impl Future<Output = Result<Subscription>> + Send;
}
