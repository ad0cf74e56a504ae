//! Trashable record contract.
//!
//! # Responsibility
//! - Describe how core reads and writes the trash timestamp of a record.
//! - Provide `is_trashed` / `is_active` predicates shared by every caller.
//!
//! # Invariants
//! - `trashed_at == None` means active, `Some(_)` means trashed.
//! - No other encoding of trash state is permitted.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Unix epoch milliseconds written into the trash column.
pub type TrashedAt = i64;

/// Stable identifier of a record, used for persistence lookups, logs and errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Integer(i64),
    Text(String),
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<String> for RecordKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Uuid> for RecordKey {
    fn from(value: Uuid) -> Self {
        Self::Text(value.to_string())
    }
}

/// Contract implemented by any record type that supports soft delete.
///
/// Implementors expose only the designated timestamp attribute; everything
/// else about the record stays opaque to core.
pub trait HasTrashState {
    /// Identity of this record in its backing store.
    fn record_key(&self) -> RecordKey;

    /// Current value of the trash timestamp attribute.
    fn trashed_at(&self) -> Option<TrashedAt>;

    /// Overwrites the trash timestamp attribute in memory.
    ///
    /// Persistence is the store's job; this must not perform I/O.
    fn set_trashed_at(&mut self, value: Option<TrashedAt>);

    fn is_trashed(&self) -> bool {
        self.trashed_at().is_some()
    }

    fn is_active(&self) -> bool {
        !self.is_trashed()
    }
}

/// Returns whether `record` is currently soft-deleted.
pub fn is_trashed<R: HasTrashState + ?Sized>(record: &R) -> bool {
    record.is_trashed()
}

/// Returns whether `record` is currently visible.
pub fn is_active<R: HasTrashState + ?Sized>(record: &R) -> bool {
    record.is_active()
}

#[cfg(test)]
mod tests {
    use super::{is_active, is_trashed, HasTrashState, RecordKey, TrashedAt};
    use uuid::Uuid;

    struct Doc {
        id: i64,
        deleted_at: Option<TrashedAt>,
    }

    impl HasTrashState for Doc {
        fn record_key(&self) -> RecordKey {
            self.id.into()
        }

        fn trashed_at(&self) -> Option<TrashedAt> {
            self.deleted_at
        }

        fn set_trashed_at(&mut self, value: Option<TrashedAt>) {
            self.deleted_at = value;
        }
    }

    #[test]
    fn predicates_follow_timestamp_presence() {
        let mut doc = Doc {
            id: 7,
            deleted_at: None,
        };
        assert!(is_active(&doc));
        assert!(!is_trashed(&doc));

        doc.set_trashed_at(Some(0));
        assert!(is_trashed(&doc));
        assert!(!is_active(&doc));
    }

    #[test]
    fn record_key_displays_inner_value() {
        assert_eq!(RecordKey::from(42).to_string(), "42");
        assert_eq!(RecordKey::from("abc").to_string(), "abc");

        let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
        assert_eq!(
            RecordKey::from(id),
            RecordKey::Text("11111111-2222-4333-8444-555555555555".to_string())
        );
    }
}
