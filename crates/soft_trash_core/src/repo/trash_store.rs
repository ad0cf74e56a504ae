//! Trash store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define what core consumes from a record store: persisting the trash
//!   attribute and evaluating trash scopes.
//! - Provide a SQLite-backed store usable with any table that carries a
//!   trash column.
//!
//! # Invariants
//! - `persist_trash_state` writes only the trash column of one row.
//! - Missing target rows are reported as `NotFound`, never as success.
//! - Read paths reject rows that cannot be decoded instead of masking them;
//!   `find_scoped_where` reports them per row so one bad row does not hide
//!   the rest.

use crate::config::TrashTable;
use crate::db::schema::{table_exists, table_has_column};
use crate::db::DbError;
use crate::model::record::{HasTrashState, RecordKey, TrashedAt};
use crate::scope::TrashScope;
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Params, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter accepted by `find_scoped_where` that keeps every row.
pub const MATCH_ALL: &str = "1 = 1";

/// Store-level failure reported to the lifecycle service.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound(RecordKey),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "record not found: {key}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence and filtering services consumed by the trash lifecycle.
pub trait TrashStore<R: HasTrashState> {
    /// Commits the current trash attribute of `record`.
    fn persist_trash_state(&self, record: &R) -> StoreResult<()>;

    /// Returns every record matching `scope`, in store iteration order.
    fn find_scoped(&self, scope: TrashScope) -> StoreResult<Vec<R>>;
}

impl<R: HasTrashState, S: TrashStore<R> + ?Sized> TrashStore<R> for &S {
    fn persist_trash_state(&self, record: &R) -> StoreResult<()> {
        (**self).persist_trash_state(record)
    }

    fn find_scoped(&self, scope: TrashScope) -> StoreResult<Vec<R>> {
        (**self).find_scoped(scope)
    }
}

/// Record decodable from a row of a `TrashTable`.
pub trait SqliteTrashRecord: HasTrashState + Sized {
    /// Decodes one `SELECT *` row; `table` names the key and trash columns.
    fn from_row(row: &Row<'_>, table: &TrashTable) -> StoreResult<Self>;
}

/// Minimal projection of any trashable table: key plus trash timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub key: RecordKey,
    pub trashed_at: Option<TrashedAt>,
}

impl HasTrashState for TableRow {
    fn record_key(&self) -> RecordKey {
        self.key.clone()
    }

    fn trashed_at(&self) -> Option<TrashedAt> {
        self.trashed_at
    }

    fn set_trashed_at(&mut self, value: Option<TrashedAt>) {
        self.trashed_at = value;
    }
}

impl SqliteTrashRecord for TableRow {
    fn from_row(row: &Row<'_>, table: &TrashTable) -> StoreResult<Self> {
        let key = match row.get::<_, Value>(table.key_column())? {
            Value::Integer(value) => RecordKey::Integer(value),
            Value::Text(value) => RecordKey::Text(value),
            other => {
                return Err(StoreError::InvalidData(format!(
                    "unsupported key value `{other:?}` in {}.{}",
                    table.table(),
                    table.key_column()
                )));
            }
        };
        let trashed_at = read_trashed_at(row, table)?;
        Ok(Self { key, trashed_at })
    }
}

/// Reads the trash column of `row`, rejecting non-integer values.
pub fn read_trashed_at(row: &Row<'_>, table: &TrashTable) -> StoreResult<Option<TrashedAt>> {
    match row.get::<_, Value>(table.column().as_str())? {
        Value::Null => Ok(None),
        Value::Integer(value) => Ok(Some(value)),
        other => Err(StoreError::InvalidData(format!(
            "invalid trash timestamp `{other:?}` in {}.{}",
            table.table(),
            table.column()
        ))),
    }
}

fn key_to_value(key: RecordKey) -> Value {
    match key {
        RecordKey::Integer(value) => Value::Integer(value),
        RecordKey::Text(value) => Value::Text(value),
    }
}

/// SQLite-backed trash store over one table.
pub struct SqliteTrashStore<'conn, R> {
    conn: &'conn Connection,
    table: TrashTable,
    _record: PhantomData<fn() -> R>,
}

impl<'conn, R: SqliteTrashRecord> SqliteTrashStore<'conn, R> {
    /// Creates a store after checking the table and both columns exist.
    pub fn try_new(conn: &'conn Connection, table: TrashTable) -> StoreResult<Self> {
        if !table_exists(conn, table.table())? {
            return Err(DbError::MissingTable(table.table().to_string()).into());
        }
        for column in [table.key_column(), table.column().as_str()] {
            if !table_has_column(conn, table.table(), column)? {
                return Err(DbError::MissingColumn {
                    table: table.table().to_string(),
                    column: column.to_string(),
                }
                .into());
            }
        }

        Ok(Self {
            conn,
            table,
            _record: PhantomData,
        })
    }

    pub fn table(&self) -> &TrashTable {
        &self.table
    }

    /// Loads one record by key regardless of trash state.
    pub fn get(&self, key: &RecordKey) -> StoreResult<Option<R>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM {} WHERE {} = ?1;",
            self.table.table(),
            self.table.key_column()
        ))?;
        let mut rows = stmt.query([key_to_value(key.clone())])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(R::from_row(row, &self.table)?));
        }
        Ok(None)
    }

    /// Counts records matching `scope` without materializing them.
    pub fn count_scoped(&self, scope: TrashScope) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE {};",
                self.table.table(),
                scope.sql_predicate(self.table.column())
            ),
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative row count `{count}`")))
    }

    /// Loads rows in `scope` that also match the SQL boolean `filter`.
    ///
    /// `filter` is ANDed onto the scope predicate and may use positional
    /// placeholders bound from `params`. Each row is decoded on its own: an
    /// undecodable row becomes an `Err` entry and the remaining rows still
    /// load. The outer error covers only preparing or running the query.
    pub fn find_scoped_where<P: Params>(
        &self,
        scope: TrashScope,
        filter: &str,
        params: P,
    ) -> StoreResult<Vec<StoreResult<R>>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM {} WHERE ({}) AND ({}) ORDER BY {} ASC;",
            self.table.table(),
            scope.sql_predicate(self.table.column()),
            filter,
            self.table.key_column()
        ))?;
        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            let decoded = R::from_row(row, &self.table);
            if let Err(err) = &decoded {
                warn!(
                    "event=store_decode module=repo status=error table={} error={}",
                    self.table.table(),
                    err
                );
            }
            records.push(decoded);
        }

        Ok(records)
    }
}

impl<R: SqliteTrashRecord> TrashStore<R> for SqliteTrashStore<'_, R> {
    fn persist_trash_state(&self, record: &R) -> StoreResult<()> {
        let key = record.record_key();
        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET {} = ?1 WHERE {} = ?2;",
                self.table.table(),
                self.table.column(),
                self.table.key_column()
            ),
            params![record.trashed_at(), key_to_value(key.clone())],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(key));
        }

        Ok(())
    }

    fn find_scoped(&self, scope: TrashScope) -> StoreResult<Vec<R>> {
        self.find_scoped_where(scope, MATCH_ALL, [])?
            .into_iter()
            .collect()
    }
}
