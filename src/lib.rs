pub mod adapters;
pub mod config;
pub mod domain;
pub mod mapping;
pub mod utils;

pub use adapters::{create_adapter, Adapter, LocalAdapter, LocalStore, RemoteAdapter, RemoteSettings};
pub use config::{AdapterConfig, BackendMode};
pub use domain::events::{ChangeCallback, ChangeEvent, ChangeKind, Subscription};
pub use domain::filter::ListFilter;
pub use domain::model::*;
pub use domain::ports::{BackendKind, DatabaseAdapter};
pub use domain::table::Table;
pub use mapping::{Entity, MappingContext};
pub use utils::diagnostics::{Diagnostic, DiagnosticSink, MemorySink, TracingSink};
pub use utils::error::{DataError, Result};
