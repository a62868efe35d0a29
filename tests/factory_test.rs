use ministry_data::config::{ENV_MODE, ENV_REMOTE_ANON_KEY, ENV_REMOTE_URL};
use ministry_data::utils::diagnostics::Credential;
use ministry_data::*;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn remote_config(url: Option<&str>, key: Option<&str>) -> AdapterConfig {
    AdapterConfig {
        mode: BackendMode::Remote,
        remote_url: url.map(str::to_string),
        remote_anon_key: key.map(str::to_string),
        ..AdapterConfig::default()
    }
}

#[tokio::test]
async fn test_remote_without_credentials_falls_back_to_local() {
    let sink = MemorySink::new();

    let adapter = create_adapter(&remote_config(None, None), Arc::new(sink.clone())).await;

    assert!(adapter.is_local());
    assert_eq!(adapter.backend(), BackendKind::Local);
    assert_eq!(
        sink.events(),
        vec![Diagnostic::MissingCredentials {
            missing: vec![Credential::RemoteUrl, Credential::AnonKey]
        }]
    );
}

#[tokio::test]
async fn test_remote_missing_url_names_only_url() {
    let sink = MemorySink::new();

    let adapter = create_adapter(&remote_config(None, Some("anon")), Arc::new(sink.clone())).await;

    assert!(adapter.is_local());
    assert_eq!(
        sink.events(),
        vec![Diagnostic::MissingCredentials {
            missing: vec![Credential::RemoteUrl]
        }]
    );
}

#[tokio::test]
async fn test_remote_with_credentials_selects_remote() {
    let sink = MemorySink::new();

    let adapter = create_adapter(
        &remote_config(Some("https://db.example.org"), Some("anon")),
        Arc::new(sink.clone()),
    )
    .await;

    assert!(adapter.is_remote());
    assert_eq!(adapter.backend(), BackendKind::Remote);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_local_or_unset_mode_selects_local() {
    let sink = MemorySink::new();

    let adapter = create_adapter(&AdapterConfig::default(), Arc::new(sink.clone())).await;
    assert!(adapter.is_local());

    // credentials alone do not switch backends
    let mut config = remote_config(Some("https://db.example.org"), Some("anon"));
    config.mode = BackendMode::Local;
    let adapter = create_adapter(&config, Arc::new(sink.clone())).await;
    assert!(adapter.is_local());

    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_env_style_config_drives_selection() {
    let vars = [
        (ENV_MODE, "supabase"),
        (ENV_REMOTE_URL, "https://db.example.org"),
        (ENV_REMOTE_ANON_KEY, "anon"),
    ];
    let config = AdapterConfig::from_lookup(|key| {
        vars.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
    });

    let adapter = create_adapter(&config, Arc::new(MemorySink::new())).await;
    assert!(adapter.is_remote());
}

#[tokio::test]
async fn test_unreadable_local_file_falls_back_to_memory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "not json at all").unwrap();

    let sink = MemorySink::new();
    let mut config = AdapterConfig::default();
    config.local.path = Some(path);

    let adapter = create_adapter(&config, Arc::new(sink.clone())).await;

    assert!(adapter.is_local());
    assert!(matches!(
        sink.events().as_slice(),
        [Diagnostic::LocalStoreUnavailable { .. }]
    ));

    let household: Household = adapter
        .create(json!({"city": "Testville"}).as_object().cloned().unwrap())
        .await
        .unwrap();
    assert!(!household.household_id.is_empty());
}

#[tokio::test]
async fn test_selected_adapter_passes_transaction_result_through() {
    let adapter = create_adapter(&AdapterConfig::default(), Arc::new(MemorySink::new())).await;

    let value = adapter
        .transaction(|tx| async move {
            assert!(tx.is_local());
            let ministry: Ministry = tx
                .create(json!({"name": "Choir"}).as_object().cloned().unwrap())
                .await?;
            Ok((ministry.name, 7))
        })
        .await
        .unwrap();

    assert_eq!(value, ("Choir".to_string(), 7));
}
