pub mod toml_config;

use crate::adapters::remote::RemoteSettings;
use crate::utils::diagnostics::Credential;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_MODE: &str = "DATABASE_MODE";
pub const ENV_REMOTE_URL: &str = "REMOTE_DB_URL";
pub const ENV_REMOTE_ANON_KEY: &str = "REMOTE_DB_ANON_KEY";
pub const ENV_REMOTE_SERVICE_ROLE_KEY: &str = "REMOTE_DB_SERVICE_ROLE_KEY";
pub const ENV_LOCAL_PATH: &str = "LOCAL_DB_PATH";

/// Which backend the factory should try to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum BackendMode {
    #[default]
    Local,
    Remote,
}

impl BackendMode {
    /// Lenient parse: anything not recognized as remote is local.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" | "supabase" | "postgrest" => BackendMode::Remote,
            "" | "local" | "demo" | "indexeddb" => BackendMode::Local,
            other => {
                tracing::warn!(mode = other, "unknown database mode, using local");
                BackendMode::Local
            }
        }
    }
}

impl From<String> for BackendMode {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Snapshot file; the store stays in memory when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteOptions {
    pub timeout_seconds: u64,
    pub realtime_poll_interval_ms: u64,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            realtime_poll_interval_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub mode: BackendMode,
    pub remote_url: Option<String>,
    pub remote_anon_key: Option<String>,
    /// Only for maintenance tooling. The factory never reads it.
    pub remote_service_role_key: Option<String>,
    pub local: LocalConfig,
    pub remote: RemoteOptions,
}

/// Blank values and unresolved `${VAR}` placeholders count as absent.
fn credential(value: &Option<String>) -> Option<&str> {
    if !validation::is_present(value) {
        return None;
    }
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !(v.starts_with("${") && v.ends_with('}')))
}

impl AdapterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup shaped like the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            mode: lookup(ENV_MODE)
                .map(|mode| BackendMode::parse(&mode))
                .unwrap_or_default(),
            remote_url: lookup(ENV_REMOTE_URL),
            remote_anon_key: lookup(ENV_REMOTE_ANON_KEY),
            remote_service_role_key: lookup(ENV_REMOTE_SERVICE_ROLE_KEY),
            ..Self::default()
        };
        config.local.path = lookup(ENV_LOCAL_PATH)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        config
    }

    pub fn remote_url(&self) -> Option<&str> {
        credential(&self.remote_url)
    }

    pub fn remote_anon_key(&self) -> Option<&str> {
        credential(&self.remote_anon_key)
    }

    pub fn remote_service_role_key(&self) -> Option<&str> {
        credential(&self.remote_service_role_key)
    }

    /// Credentials the remote backend needs that are not set, in a fixed order.
    pub fn missing_credentials(&self) -> Vec<Credential> {
        let mut missing = Vec::new();
        if self.remote_url().is_none() {
            missing.push(Credential::RemoteUrl);
        }
        if self.remote_anon_key().is_none() {
            missing.push(Credential::AnonKey);
        }
        missing
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.remote.realtime_poll_interval_ms)
    }

    /// Remote settings authenticated with `key`; `None` without a URL.
    pub fn remote_settings(&self, key: &str) -> Option<RemoteSettings> {
        let url = self.remote_url()?;
        let mut settings = RemoteSettings::new(url, key);
        settings.timeout = self.timeout();
        settings.poll_interval = self.poll_interval();
        Some(settings)
    }
}

impl Validate for AdapterConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = self.remote_url() {
            validation::validate_url("remote_url", url)?;
        }
        if let Some(path) = &self.local.path {
            validation::validate_path("local.path", &path.to_string_lossy())?;
        }
        self.remote.validate()
    }
}

impl Validate for RemoteOptions {
    fn validate(&self) -> Result<()> {
        validation::validate_positive_number("remote.timeout_seconds", self.timeout_seconds, 1)?;
        validation::validate_positive_number(
            "remote.realtime_poll_interval_ms",
            self.realtime_poll_interval_ms,
            10,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(BackendMode::parse("supabase"), BackendMode::Remote);
        assert_eq!(BackendMode::parse(" Remote "), BackendMode::Remote);
        assert_eq!(BackendMode::parse("demo"), BackendMode::Local);
        assert_eq!(BackendMode::parse(""), BackendMode::Local);
        assert_eq!(BackendMode::parse("mongodb"), BackendMode::Local);
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let config = AdapterConfig::from_lookup(lookup(&[
            (ENV_MODE, "remote"),
            (ENV_REMOTE_URL, "https://db.example.org"),
            (ENV_REMOTE_ANON_KEY, "anon"),
            (ENV_REMOTE_SERVICE_ROLE_KEY, "service"),
            (ENV_LOCAL_PATH, "/tmp/ministry.json"),
        ]));

        assert_eq!(config.mode, BackendMode::Remote);
        assert_eq!(config.remote_url(), Some("https://db.example.org"));
        assert_eq!(config.remote_anon_key(), Some("anon"));
        assert_eq!(config.remote_service_role_key(), Some("service"));
        assert_eq!(config.local.path, Some(PathBuf::from("/tmp/ministry.json")));
        assert!(config.missing_credentials().is_empty());
    }

    #[test]
    fn test_missing_credentials_are_listed_in_order() {
        let config = AdapterConfig::from_lookup(lookup(&[(ENV_MODE, "remote")]));
        assert_eq!(
            config.missing_credentials(),
            vec![Credential::RemoteUrl, Credential::AnonKey]
        );

        let config = AdapterConfig::from_lookup(lookup(&[
            (ENV_MODE, "remote"),
            (ENV_REMOTE_URL, "https://db.example.org"),
            (ENV_REMOTE_ANON_KEY, "  "),
        ]));
        assert_eq!(config.missing_credentials(), vec![Credential::AnonKey]);
    }

    #[test]
    fn test_unresolved_placeholder_is_absent() {
        let config = AdapterConfig {
            remote_anon_key: Some("${REMOTE_DB_ANON_KEY}".to_string()),
            ..AdapterConfig::default()
        };
        assert_eq!(config.remote_anon_key(), None);
    }

    #[test]
    fn test_validation() {
        let mut config = AdapterConfig::default();
        assert!(config.validate().is_ok());

        config.remote_url = Some("invalid-url".to_string());
        assert!(config.validate().is_err());

        config.remote_url = Some("https://db.example.org".to_string());
        config.remote.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_remote_settings_carry_options() {
        let mut config = AdapterConfig {
            remote_url: Some("https://db.example.org".to_string()),
            ..AdapterConfig::default()
        };
        config.remote.timeout_seconds = 5;
        config.remote.realtime_poll_interval_ms = 250;

        let settings = config.remote_settings("key").unwrap();
        assert_eq!(settings.url, "https://db.example.org");
        assert_eq!(settings.api_key, "key");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.poll_interval, Duration::from_millis(250));

        assert!(AdapterConfig::default().remote_settings("key").is_none());
    }
}
