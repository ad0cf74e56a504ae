//! Named query scopes over the trash column.
//!
//! # Responsibility
//! - Express `active` / `deleted` as pure filter specifications.
//! - Render each scope as a SQL predicate composable into larger queries.
//!
//! # Invariants
//! - `Active` matches exactly the records with a null trash timestamp.
//! - `Deleted` matches exactly the records with a non-null trash timestamp.

use crate::config::TrashColumn;
use crate::model::record::HasTrashState;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Filter over a record collection by trash state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrashScope {
    /// Records that are not trashed.
    #[default]
    Active,
    /// Records that are trashed.
    Deleted,
    /// No filtering; includes both active and trashed records.
    All,
}

impl TrashScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
            Self::All => "all",
        }
    }

    pub fn matches<R: HasTrashState + ?Sized>(self, record: &R) -> bool {
        match self {
            Self::Active => record.is_active(),
            Self::Deleted => record.is_trashed(),
            Self::All => true,
        }
    }

    /// SQL boolean expression selecting this scope on `column`.
    pub fn sql_predicate(self, column: &TrashColumn) -> String {
        match self {
            Self::Active => format!("{column} IS NULL"),
            Self::Deleted => format!("{column} IS NOT NULL"),
            Self::All => "1 = 1".to_string(),
        }
    }
}

impl Display for TrashScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrashScope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "deleted" | "trashed" => Ok(Self::Deleted),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unsupported scope `{other}`; expected active|deleted|all"
            )),
        }
    }
}

/// Applies `scope` to an in-memory collection, keeping iteration order.
pub fn filter_records<R, I>(scope: TrashScope, records: I) -> Vec<R>
where
    R: HasTrashState,
    I: IntoIterator<Item = R>,
{
    records
        .into_iter()
        .filter(|record| scope.matches(record))
        .collect()
}
