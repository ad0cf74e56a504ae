//! Soft-delete ("trash") support for records held in an external store.
//!
//! Records are marked deleted by a nullable timestamp column instead of being
//! removed. This crate owns the semantics of that column: state predicates,
//! trash/restore transitions with hooks, bulk variants and query scopes.

pub mod config;
pub mod db;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scope;
pub mod service;

pub use config::{ConfigError, TrashColumn, TrashConfig, TrashTable, DEFAULT_TRASH_COLUMN};
pub use db::{open_db, open_db_in_memory, DbError, SoftTrashSchema};
pub use error::{RecordNotRestored, RecordNotTrashed, SoftTrashError, TransitionFailure};
pub use hooks::{HookEvent, HookOutcome, HookRegistry, NoHooks, TrashHooks};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::record::{is_active, is_trashed, HasTrashState, RecordKey, TrashedAt};
pub use repo::trash_store::{
    MATCH_ALL, SqliteTrashRecord, SqliteTrashStore, StoreError, StoreResult, TableRow, TrashStore,
};
pub use scope::{filter_records, TrashScope};
pub use service::trash_service::{BulkItem, BulkOutcome, Clock, SystemClock, TrashService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
