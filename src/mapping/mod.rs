//! Type mapping between backend rows and canonical domain objects.
//!
//! Each entity declares a row schema (`Entity::Row`) listing every column the
//! backends may hand back, legacy spellings included. `to_domain` folds legacy
//! spellings into canonical fields and reports each one through the
//! [`DiagnosticSink`]; `to_backend` only ever writes canonical columns.
//!
//! Adapters call into this module on every read and write; nothing upstream
//! of an adapter should need it.

pub mod admin;
pub mod bible_bee;
pub mod family;
pub mod ministry;

pub use admin::{BrandingSettingsRow, UserRow};
pub use bible_bee::{
    BibleBeeCycleRow, DivisionRow, EssayPromptRow, ScriptureRow, StudentEssayRow,
    StudentScriptureRow,
};
pub use family::{ChildRow, GuardianRow, HouseholdRow};
pub use ministry::{AttendanceRow, IncidentRow, MinistryEnrollmentRow, MinistryRow, RegistrationCycleRow};

use crate::domain::model::Document;
use crate::domain::table::Table;
use crate::utils::clock::{next_timestamp, Clock};
use crate::utils::diagnostics::{Diagnostic, DiagnosticSink};
use crate::utils::error::{DataError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

/// A canonical domain object and its backend row schema.
pub trait Entity:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Row: Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static;

    const TABLE: Table;

    fn id(&self) -> &str;
    fn created_at(&self) -> &str;
    fn updated_at(&self) -> &str;

    fn to_domain(row: Self::Row, ctx: &MappingContext<'_>) -> Self;
    fn to_backend(&self) -> Self::Row;
}

/// Collaborators a mapping needs: where diagnostics go, and the clock used to
/// repair a missing `updated_at`.
#[derive(Clone, Copy)]
pub struct MappingContext<'a> {
    diagnostics: &'a dyn DiagnosticSink,
    clock: &'a dyn Clock,
}

impl<'a> MappingContext<'a> {
    pub fn new(diagnostics: &'a dyn DiagnosticSink, clock: &'a dyn Clock) -> Self {
        Self { diagnostics, clock }
    }

    pub fn record(&self, table: Table, record_id: impl Into<String>) -> RecordScope<'a> {
        RecordScope {
            ctx: *self,
            table,
            record_id: record_id.into(),
        }
    }
}

/// Mapping state for a single row.
pub struct RecordScope<'a> {
    ctx: MappingContext<'a>,
    table: Table,
    record_id: String,
}

impl RecordScope<'_> {
    /// Canonical value if present, otherwise the legacy one (reported once).
    pub fn prefer<T>(
        &self,
        canonical: &'static str,
        value: Option<T>,
        legacy: &'static str,
        legacy_value: Option<T>,
    ) -> Option<T> {
        match (value, legacy_value) {
            (Some(value), _) => Some(value),
            (None, Some(value)) => {
                self.ctx.diagnostics.emit(Diagnostic::LegacyField {
                    entity: self.table.as_str(),
                    record_id: self.record_id.clone(),
                    legacy,
                    canonical,
                });
                Some(value)
            }
            (None, None) => None,
        }
    }

    /// Both timestamps, stamping the clock only when `updated_at` is missing.
    pub fn timestamps(&self, created_at: Option<String>, updated_at: Option<String>) -> (String, String) {
        let updated_at = match updated_at {
            Some(updated_at) => updated_at,
            None => {
                tracing::debug!(
                    table = %self.table,
                    record_id = %self.record_id,
                    "row has no updated_at, stamping current time"
                );
                self.ctx.clock.timestamp()
            }
        };
        let created_at = created_at.unwrap_or_else(|| updated_at.clone());
        (created_at, updated_at)
    }
}

/// SQL NULL to the blank-string convention.
pub(crate) fn text(value: Option<String>) -> String {
    value.unwrap_or_default()
}

/// Blank-string convention back to SQL NULL.
pub(crate) fn nullable(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Raw backend row to domain object.
pub fn decode<E: Entity>(raw: Value, ctx: &MappingContext<'_>) -> Result<E> {
    let row: E::Row = serde_json::from_value(raw)?;
    Ok(E::to_domain(row, ctx))
}

/// Domain object to a raw backend row.
pub fn encode<E: Entity>(entity: &E) -> Result<Document> {
    match serde_json::to_value(entity.to_backend())? {
        Value::Object(row) => Ok(row),
        other => Err(DataError::validation(format!(
            "{} row did not encode to an object: {}",
            E::TABLE,
            other
        ))),
    }
}

fn to_document<E: Entity>(entity: &E) -> Result<Document> {
    match serde_json::to_value(entity)? {
        Value::Object(object) => Ok(object),
        _ => Err(DataError::validation(format!(
            "{} did not serialize to an object",
            E::TABLE
        ))),
    }
}

fn from_document<E: Entity>(document: Document) -> Result<E> {
    serde_json::from_value(Value::Object(document))
        .map_err(|e| DataError::validation(format!("invalid {} data: {}", E::TABLE, e)))
}

/// Builds a new domain object from create data: assigns an id when the caller
/// did not supply one and stamps both timestamps.
pub fn new_entity<E: Entity>(mut data: Document, clock: &dyn Clock) -> Result<E> {
    let id_column = E::TABLE.id_column();
    let id = match data.remove(id_column) {
        None | Some(Value::Null) => uuid::Uuid::new_v4().to_string(),
        Some(Value::String(id)) if !id.trim().is_empty() => id,
        Some(other) => {
            return Err(DataError::validation(format!(
                "{}.{} must be a non-empty string, got {}",
                E::TABLE,
                id_column,
                other
            )))
        }
    };

    let now = clock.timestamp();
    data.insert(id_column.to_string(), Value::String(id));
    data.insert("created_at".to_string(), Value::String(now.clone()));
    data.insert("updated_at".to_string(), Value::String(now));

    from_document(data)
}

/// Shallow-merges `patch` onto `current`. The id must not change, `created_at`
/// is kept, and `updated_at` moves forward.
pub fn apply_patch<E: Entity>(current: &E, patch: &Document, clock: &dyn Clock) -> Result<E> {
    let id_column = E::TABLE.id_column();
    let mut merged = to_document(current)?;

    for (key, value) in patch {
        match key.as_str() {
            "created_at" | "updated_at" => continue,
            column if column == id_column => {
                if value.as_str() != Some(current.id()) {
                    return Err(DataError::validation(format!(
                        "{}.{} is immutable",
                        E::TABLE,
                        id_column
                    )));
                }
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    merged.insert(
        "updated_at".to_string(),
        Value::String(next_timestamp(current.updated_at(), clock)),
    );
    from_document(merged)
}

/// The backend columns an update needs to send: every patched column that
/// exists on the row, plus `updated_at`.
pub fn patch_columns<E: Entity>(merged: &E, patch: &Document) -> Result<Document> {
    let id_column = E::TABLE.id_column();
    let row = encode(merged)?;
    Ok(row
        .into_iter()
        .filter(|(column, _)| {
            column == "updated_at"
                || (column != id_column && column != "created_at" && patch.contains_key(column))
        })
        .collect())
}
