//! Structured, non-fatal diagnostics.
//!
//! Components that notice something worth reporting without failing the call
//! (a legacy field spelling on read, a factory fallback, a partially applied
//! remote transaction) emit a [`Diagnostic`] through an injected
//! [`DiagnosticSink`]. Production code uses [`TracingSink`]; tests use
//! [`MemorySink`] and assert on what was captured.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Remote credential the factory needs before it will select the remote backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    RemoteUrl,
    AnonKey,
}

impl Credential {
    pub fn as_str(self) -> &'static str {
        match self {
            Credential::RemoteUrl => "remote_url",
            Credential::AnonKey => "remote_anon_key",
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Insert,
    Update,
    Delete,
}

/// A write the remote backend accepted inside a transaction body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedWrite {
    pub table: &'static str,
    pub id: String,
    pub op: WriteOp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    LegacyField {
        entity: &'static str,
        record_id: String,
        legacy: &'static str,
        canonical: &'static str,
    },
    MissingCredentials {
        missing: Vec<Credential>,
    },
    InvalidRemoteConfig {
        reason: String,
    },
    LocalStoreUnavailable {
        reason: String,
    },
    PartialTransaction {
        applied: Vec<AppliedWrite>,
        error: String,
    },
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::LegacyField {
                entity,
                record_id,
                legacy,
                canonical,
            } => {
                tracing::warn!(
                    entity,
                    record_id = %record_id,
                    legacy,
                    canonical,
                    "legacy field spelling mapped to canonical field"
                );
            }
            Diagnostic::MissingCredentials { missing } => {
                let names: Vec<&str> = missing.iter().map(|c| c.as_str()).collect();
                tracing::warn!(
                    missing = ?names,
                    "remote backend requested but credentials are missing, using local store"
                );
            }
            Diagnostic::InvalidRemoteConfig { reason } => {
                tracing::warn!(reason = %reason, "remote backend misconfigured, using local store");
            }
            Diagnostic::LocalStoreUnavailable { reason } => {
                tracing::warn!(reason = %reason, "local store file unavailable, using in-memory store");
            }
            Diagnostic::PartialTransaction { applied, error } => {
                tracing::warn!(
                    applied = applied.len(),
                    writes = ?applied,
                    error = %error,
                    "remote transaction failed after writes were applied; they were not rolled back"
                );
            }
        }
    }
}

/// Captures diagnostics in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic);
        }
    }
}
