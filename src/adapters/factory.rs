use crate::adapters::local::LocalAdapter;
use crate::adapters::local_store::LocalStore;
use crate::adapters::remote::{RemoteAdapter, RemoteSettings};
use crate::config::{AdapterConfig, BackendMode};
use crate::domain::events::{ChangeCallback, Subscription};
use crate::domain::filter::ListFilter;
use crate::domain::model::Document;
use crate::domain::ports::{BackendKind, DatabaseAdapter};
use crate::mapping::Entity;
use crate::utils::diagnostics::{Diagnostic, DiagnosticSink};
use crate::utils::error::{DataError, Result};
use crate::utils::validation::{validate_url, Validate};
use std::future::Future;
use std::sync::Arc;

/// The adapter selected at startup. Construct it once and pass it to
/// whatever needs data access.
#[derive(Clone)]
pub enum Adapter {
    Local(LocalAdapter),
    Remote(RemoteAdapter),
}

impl Adapter {
    pub fn is_local(&self) -> bool {
        matches!(self, Adapter::Local(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Adapter::Remote(_))
    }
}

/// Picks the backend for `config`. Never fails: whenever the remote backend
/// cannot be built the local store is returned and the reason goes to
/// `diagnostics`.
pub async fn create_adapter(config: &AdapterConfig, diagnostics: Arc<dyn DiagnosticSink>) -> Adapter {
    if config.mode == BackendMode::Remote {
        match remote_adapter(config, diagnostics.clone()) {
            Ok(remote) => {
                tracing::info!(url = config.remote_url().unwrap_or_default(), "using remote backend");
                return Adapter::Remote(remote);
            }
            Err(diagnostic) => diagnostics.emit(diagnostic),
        }
    }

    let local = local_adapter(config, diagnostics).await;
    tracing::info!(
        path = ?local.store().path(),
        "using local backend"
    );
    Adapter::Local(local)
}

fn remote_adapter(
    config: &AdapterConfig,
    diagnostics: Arc<dyn DiagnosticSink>,
) -> std::result::Result<RemoteAdapter, Diagnostic> {
    let (Some(url), Some(key)) = (config.remote_url(), config.remote_anon_key()) else {
        return Err(Diagnostic::MissingCredentials {
            missing: config.missing_credentials(),
        });
    };
    let invalid = |e: DataError| Diagnostic::InvalidRemoteConfig {
        reason: e.to_string(),
    };

    validate_url("remote_url", url).map_err(invalid)?;
    config.remote.validate().map_err(invalid)?;
    let settings = RemoteSettings {
        url: url.to_string(),
        api_key: key.to_string(),
        timeout: config.timeout(),
        poll_interval: config.poll_interval(),
    };
    RemoteAdapter::new(settings, diagnostics).map_err(invalid)
}

async fn local_adapter(config: &AdapterConfig, diagnostics: Arc<dyn DiagnosticSink>) -> LocalAdapter {
    let store = match &config.local.path {
        Some(path) => match LocalStore::open(path).await {
            Ok(store) => store,
            Err(e) => {
                diagnostics.emit(Diagnostic::LocalStoreUnavailable {
                    reason: format!("{}: {}", path.display(), e),
                });
                LocalStore::in_memory()
            }
        },
        None => LocalStore::in_memory(),
    };
    LocalAdapter::new(store, diagnostics)
}

impl DatabaseAdapter for Adapter {
    fn backend(&self) -> BackendKind {
        match self {
            Adapter::Local(adapter) => adapter.backend(),
            Adapter::Remote(adapter) => adapter.backend(),
        }
    }

    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>> {
        match self {
            Adapter::Local(adapter) => adapter.get(id).await,
            Adapter::Remote(adapter) => adapter.get(id).await,
        }
    }

    async fn create<E: Entity>(&self, data: Document) -> Result<E> {
        match self {
            Adapter::Local(adapter) => adapter.create(data).await,
            Adapter::Remote(adapter) => adapter.create(data).await,
        }
    }

    async fn update<E: Entity>(&self, id: &str, patch: Document) -> Result<E> {
        match self {
            Adapter::Local(adapter) => adapter.update(id, patch).await,
            Adapter::Remote(adapter) => adapter.update(id, patch).await,
        }
    }

    async fn delete<E: Entity>(&self, id: &str) -> Result<()> {
        match self {
            Adapter::Local(adapter) => adapter.delete::<E>(id).await,
            Adapter::Remote(adapter) => adapter.delete::<E>(id).await,
        }
    }

    async fn list<E: Entity>(&self, filter: &ListFilter) -> Result<Vec<E>> {
        match self {
            Adapter::Local(adapter) => adapter.list(filter).await,
            Adapter::Remote(adapter) => adapter.list(filter).await,
        }
    }

    async fn transaction<F, Fut, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(Self) -> Fut + Send,
        Fut: Future<Output = Result<R>> + Send,
        R: Send,
    {
        match self {
            Adapter::Local(adapter) => {
                adapter
                    .transaction(move |tx| f(Adapter::Local(tx)))
                    .await
            }
            Adapter::Remote(adapter) => {
                adapter
                    .transaction(move |tx| f(Adapter::Remote(tx)))
                    .await
            }
        }
    }

    async fn subscribe_to_table(&self, table: &str, callback: ChangeCallback) -> Result<Subscription> {
        match self {
            Adapter::Local(adapter) => adapter.subscribe_to_table(table, callback).await,
            Adapter::Remote(adapter) => adapter.subscribe_to_table(table, callback).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::diagnostics::{Credential, MemorySink};

    fn remote_config(url: Option<&str>, key: Option<&str>) -> AdapterConfig {
        AdapterConfig {
            mode: BackendMode::Remote,
            remote_url: url.map(str::to_string),
            remote_anon_key: key.map(str::to_string),
            ..AdapterConfig::default()
        }
    }

    #[tokio::test]
    async fn test_remote_without_key_falls_back() {
        let sink = MemorySink::new();
        let adapter = create_adapter(
            &remote_config(Some("https://db.example.org"), None),
            Arc::new(sink.clone()),
        )
        .await;

        assert!(adapter.is_local());
        assert_eq!(
            sink.events(),
            vec![Diagnostic::MissingCredentials {
                missing: vec![Credential::AnonKey]
            }]
        );
    }

    #[tokio::test]
    async fn test_unsupported_scheme_falls_back() {
        let sink = MemorySink::new();
        let adapter = create_adapter(
            &remote_config(Some("ftp://db.example.org"), Some("anon")),
            Arc::new(sink.clone()),
        )
        .await;

        assert!(adapter.is_local());
        assert!(matches!(
            sink.events().as_slice(),
            [Diagnostic::InvalidRemoteConfig { .. }]
        ));
    }

    #[tokio::test]
    async fn test_zero_poll_interval_falls_back() {
        let sink = MemorySink::new();
        let mut config = remote_config(Some("https://db.example.org"), Some("anon"));
        config.remote.realtime_poll_interval_ms = 0;

        let adapter = create_adapter(&config, Arc::new(sink.clone())).await;

        assert!(adapter.is_local());
        assert!(matches!(
            sink.events().as_slice(),
            [Diagnostic::InvalidRemoteConfig { reason }] if reason.contains("realtime_poll_interval_ms")
        ));
    }

    #[tokio::test]
    async fn test_service_role_key_alone_is_not_enough() {
        let sink = MemorySink::new();
        let mut config = remote_config(Some("https://db.example.org"), None);
        config.remote_service_role_key = Some("service".to_string());

        let adapter = create_adapter(&config, Arc::new(sink.clone())).await;
        assert!(adapter.is_local());
        assert_eq!(sink.len(), 1);
    }
}
