//! Table-definition helper for the trash column.
//!
//! # Responsibility
//! - Declare the nullable trash timestamp column and its secondary index.
//! - Provision both on an existing table, idempotently.
//!
//! # Invariants
//! - The column is `INTEGER` epoch milliseconds with default `NULL`.
//! - Provisioning runs in one transaction; a failed index leaves no column.

use super::{DbError, DbResult};
use crate::config::{ConfigError, TrashColumn, TrashConfig, TrashTable};
use log::info;
use rusqlite::Connection;

/// What `SoftTrashSchema::apply` changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaApplyOutcome {
    pub column_added: bool,
    pub index_ensured: bool,
}

/// Trash column declaration for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftTrashSchema {
    table: String,
    column: TrashColumn,
    create_index: bool,
}

impl SoftTrashSchema {
    pub fn new(table: &str, config: &TrashConfig) -> Result<Self, ConfigError> {
        let descriptor = TrashTable::with_config(table, config)?;
        Ok(Self::for_table(&descriptor, config.create_index))
    }

    pub fn for_table(table: &TrashTable, create_index: bool) -> Self {
        Self {
            table: table.table().to_string(),
            column: table.column().clone(),
            create_index,
        }
    }

    pub fn column(&self) -> &TrashColumn {
        &self.column
    }

    /// Column clause usable inside `CREATE TABLE (...)`.
    pub fn column_definition(&self) -> String {
        format!("{} INTEGER DEFAULT NULL", self.column)
    }

    pub fn add_column_sql(&self) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {};",
            self.table,
            self.column_definition()
        )
    }

    pub fn index_name(&self) -> String {
        format!("idx_{}_{}", self.table, self.column)
    }

    /// `CREATE INDEX` statement, or `None` when indexing is disabled.
    pub fn index_sql(&self) -> Option<String> {
        self.create_index.then(|| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}({});",
                self.index_name(),
                self.table,
                self.column
            )
        })
    }

    /// Full DDL script for provisioning an existing table.
    pub fn ddl(&self) -> String {
        match self.index_sql() {
            Some(index) => format!("{}\n{}", self.add_column_sql(), index),
            None => self.add_column_sql(),
        }
    }

    pub fn has_column(&self, conn: &Connection) -> DbResult<bool> {
        table_has_column(conn, &self.table, self.column.as_str())
    }

    /// Adds the column (when missing) and its index to an existing table.
    ///
    /// # Errors
    /// - `DbError::MissingTable` when the target table does not exist.
    /// - `DbError::Sqlite` when DDL execution fails; nothing is committed.
    pub fn apply(&self, conn: &mut Connection) -> DbResult<SchemaApplyOutcome> {
        if !table_exists(conn, &self.table)? {
            return Err(DbError::MissingTable(self.table.clone()));
        }

        let column_added = !self.has_column(conn)?;
        let tx = conn.transaction()?;
        if column_added {
            tx.execute_batch(&self.add_column_sql())?;
        }
        let index_sql = self.index_sql();
        if let Some(sql) = &index_sql {
            tx.execute_batch(sql)?;
        }
        tx.commit()?;

        info!(
            "event=schema_apply module=db status=ok table={} column={} column_added={} index={}",
            self.table,
            self.column,
            column_added,
            index_sql.is_some()
        );

        Ok(SchemaApplyOutcome {
            column_added,
            index_ensured: index_sql.is_some(),
        })
    }
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM pragma_table_info(?1)
            WHERE name = ?2
        );",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
