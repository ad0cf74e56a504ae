//! Error kinds raised by strict lifecycle operations.
//!
//! # Responsibility
//! - Carry the offending record and the exact failure cause.
//! - Render messages that distinguish "already in state" from "failed".
//!
//! # Invariants
//! - Non-strict operations never construct these errors.

use crate::model::record::{HasTrashState, RecordKey};
use crate::repo::trash_store::StoreError;
use log::Level;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Why a single trash/restore transition did not happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionFailure {
    /// Record already was in the target state.
    AlreadyInState,
    /// A `before_*` hook returned `HookOutcome::Abort`.
    HookAborted,
    /// The store refused to persist the new attribute value.
    Persistence(String),
}

impl TransitionFailure {
    /// Level at which the lifecycle logs this refusal.
    pub fn log_level(&self) -> Level {
        match self {
            Self::AlreadyInState => Level::Debug,
            Self::HookAborted | Self::Persistence(_) => Level::Warn,
        }
    }
}

/// Raised by strict trash operations.
#[derive(Debug, Clone)]
pub struct RecordNotTrashed<R> {
    pub record: R,
    pub reason: TransitionFailure,
}

impl<R> RecordNotTrashed<R> {
    pub fn message(&self) -> &'static str {
        match self.reason {
            TransitionFailure::AlreadyInState => "a trashed record cannot be trashed",
            _ => "failed to trash the record",
        }
    }
}

impl<R: HasTrashState> RecordNotTrashed<R> {
    pub fn record_key(&self) -> RecordKey {
        self.record.record_key()
    }
}

impl<R: HasTrashState> Display for RecordNotTrashed<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (key={})", self.message(), self.record.record_key())?;
        if let TransitionFailure::Persistence(cause) = &self.reason {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl<R: HasTrashState + Debug> Error for RecordNotTrashed<R> {}

/// Raised by strict restore operations.
#[derive(Debug, Clone)]
pub struct RecordNotRestored<R> {
    pub record: R,
    pub reason: TransitionFailure,
}

impl<R> RecordNotRestored<R> {
    pub fn message(&self) -> &'static str {
        match self.reason {
            TransitionFailure::AlreadyInState => "an active record cannot be restored",
            _ => "failed to restore the record",
        }
    }
}

impl<R: HasTrashState> RecordNotRestored<R> {
    pub fn record_key(&self) -> RecordKey {
        self.record.record_key()
    }
}

impl<R: HasTrashState> Display for RecordNotRestored<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (key={})", self.message(), self.record.record_key())?;
        if let TransitionFailure::Persistence(cause) = &self.reason {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl<R: HasTrashState + Debug> Error for RecordNotRestored<R> {}

/// Error returned by strict bulk operations.
#[derive(Debug)]
pub enum SoftTrashError<R> {
    NotTrashed(RecordNotTrashed<R>),
    NotRestored(RecordNotRestored<R>),
    /// An entry of the bulk collection failed to load.
    Store(StoreError),
}

impl<R: HasTrashState> Display for SoftTrashError<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotTrashed(err) => write!(f, "{err}"),
            Self::NotRestored(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl<R: HasTrashState + Debug + 'static> Error for SoftTrashError<R> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotTrashed(err) => Some(err),
            Self::NotRestored(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl<R> From<RecordNotTrashed<R>> for SoftTrashError<R> {
    fn from(value: RecordNotTrashed<R>) -> Self {
        Self::NotTrashed(value)
    }
}

impl<R> From<RecordNotRestored<R>> for SoftTrashError<R> {
    fn from(value: RecordNotRestored<R>) -> Self {
        Self::NotRestored(value)
    }
}

impl<R> From<StoreError> for SoftTrashError<R> {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordNotRestored, RecordNotTrashed, SoftTrashError, TransitionFailure};
    use crate::model::record::RecordKey;
    use crate::repo::trash_store::{StoreError, TableRow};
    use log::Level;

    fn row() -> TableRow {
        TableRow {
            key: RecordKey::Integer(5),
            trashed_at: Some(10),
        }
    }

    #[test]
    fn messages_distinguish_state_from_failure() {
        let already = RecordNotTrashed {
            record: row(),
            reason: TransitionFailure::AlreadyInState,
        };
        assert_eq!(already.to_string(), "a trashed record cannot be trashed (key=5)");

        let failed = RecordNotTrashed {
            record: row(),
            reason: TransitionFailure::Persistence("disk full".to_string()),
        };
        assert_eq!(failed.to_string(), "failed to trash the record (key=5): disk full");

        let aborted = RecordNotRestored {
            record: row(),
            reason: TransitionFailure::HookAborted,
        };
        assert_eq!(aborted.message(), "failed to restore the record");

        let active = RecordNotRestored {
            record: row(),
            reason: TransitionFailure::AlreadyInState,
        };
        assert_eq!(active.message(), "an active record cannot be restored");
    }

    #[test]
    fn refusals_log_at_their_severity() {
        assert_eq!(TransitionFailure::AlreadyInState.log_level(), Level::Debug);
        assert_eq!(TransitionFailure::HookAborted.log_level(), Level::Warn);
        assert_eq!(
            TransitionFailure::Persistence("locked".to_string()).log_level(),
            Level::Warn
        );
    }

    #[test]
    fn bulk_error_wraps_store_failures() {
        let err: SoftTrashError<TableRow> =
            StoreError::NotFound(RecordKey::Text("x".to_string())).into();
        assert_eq!(err.to_string(), "record not found: x");
    }
}
