//! Operator CLI for soft-trash tables in a SQLite database.
//!
//! # Responsibility
//! - Provision the trash column on a table and print its DDL.
//! - Drive trash/restore (single and bulk) through `TrashService`; bulk
//!   commands act on the rows selected by the scope and an optional
//!   `--where` SQL filter.
//! - Keep output line-oriented (`key=... trashed_at=...`) for scripting.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use soft_trash_core::{
    init_logging, open_db, BulkOutcome, RecordKey, SoftTrashSchema, SqliteTrashStore, StoreResult,
    TableRow, TrashConfig, TrashScope, TrashService, TrashTable, MATCH_ALL,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "soft-trash")]
#[command(about = "Soft-delete records by timestamp instead of removing rows")]
#[command(version = soft_trash_core::core_version())]
struct Cli {
    #[command(flatten)]
    target: Target,

    /// Absolute directory for rolling log files; logging stays off when unset
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[arg(long, global = true, default_value = soft_trash_core::default_log_level())]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// SQLite database file
    #[arg(long, global = true, default_value = "soft_trash.db")]
    db: PathBuf,

    /// Table holding the records
    #[arg(long, global = true, default_value = "records")]
    table: String,

    #[arg(long, global = true, default_value = "id")]
    key_column: String,

    /// Nullable timestamp column marking trashed rows [default: deleted_at]
    #[arg(long, global = true)]
    column: Option<String>,

    /// JSON trash config (`{"column": ..., "create_index": ...}`); `--column`
    /// and `--no-index` take precedence over it
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add the trash column and its index to the table
    Provision {
        #[arg(long)]
        no_index: bool,
    },

    /// Print the provisioning DDL without touching the database
    Schema {
        #[arg(long)]
        no_index: bool,
    },

    /// List records in a scope (active, deleted, all)
    List {
        #[arg(long, default_value = "active")]
        scope: TrashScope,
        #[command(flatten)]
        filter: RowFilter,
    },

    /// Trash one record by key
    Trash {
        key: String,
        #[arg(long)]
        strict: bool,
    },

    /// Restore one record by key
    Restore {
        key: String,
        #[arg(long)]
        strict: bool,
    },

    /// Trash every active record matching the filter, running hooks per record
    TrashAll {
        #[arg(long)]
        strict: bool,
        #[command(flatten)]
        filter: RowFilter,
    },

    /// Restore every trashed record matching the filter, running hooks per record
    RestoreAll {
        #[arg(long)]
        strict: bool,
        #[command(flatten)]
        filter: RowFilter,
    },
}

#[derive(Args)]
struct RowFilter {
    /// SQL boolean expression ANDed onto the scope, e.g. "project = 'p1'"
    #[arg(long = "where", value_name = "SQL")]
    condition: Option<String>,
}

impl RowFilter {
    fn as_sql(&self) -> &str {
        self.condition.as_deref().unwrap_or(MATCH_ALL)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        init_logging(&cli.log_level, log_dir).context("failed to initialize logging")?;
    }

    run(&cli.target, &cli.command)
}

fn run(target: &Target, command: &Commands) -> Result<()> {
    match command {
        Commands::Schema { no_index } => {
            println!("{}", schema_for(target, *no_index)?.ddl());
            Ok(())
        }
        Commands::Provision { no_index } => {
            let schema = schema_for(target, *no_index)?;
            let mut conn = open(target)?;
            let outcome = schema
                .apply(&mut conn)
                .with_context(|| format!("failed to provision table `{}`", target.table))?;
            println!(
                "column_added={} index={}",
                outcome.column_added, outcome.index_ensured
            );
            Ok(())
        }
        Commands::List { scope, filter } => {
            let conn = open(target)?;
            let store = store_for(&conn, target)?;
            for row in select(&store, *scope, filter)? {
                match row {
                    Ok(row) => print_row(&row),
                    Err(err) => println!("error={err}"),
                }
            }
            Ok(())
        }
        Commands::Trash { key, strict } => {
            let conn = open(target)?;
            let store = store_for(&conn, target)?;
            let mut row = load_row(&store, key)?;
            let service = TrashService::new(&store);
            if *strict {
                service.trash_strict(&mut row)?;
            } else if !service.trash(&mut row) {
                println!("unchanged key={}", row.key);
                return Ok(());
            }
            print_row(&row);
            Ok(())
        }
        Commands::Restore { key, strict } => {
            let conn = open(target)?;
            let store = store_for(&conn, target)?;
            let mut row = load_row(&store, key)?;
            let service = TrashService::new(&store);
            if *strict {
                service.restore_strict(&mut row)?;
            } else if !service.restore(&mut row) {
                println!("unchanged key={}", row.key);
                return Ok(());
            }
            print_row(&row);
            Ok(())
        }
        Commands::TrashAll { strict, filter } => {
            let conn = open(target)?;
            let store = store_for(&conn, target)?;
            let rows = select(&store, TrashScope::Active, filter)?;
            let service = TrashService::new(&store);
            let outcome: BulkOutcome<TableRow> = if *strict {
                service.trash_all_strict(rows)?
            } else {
                service.trash_all(rows)
            };
            print_outcome(&outcome);
            Ok(())
        }
        Commands::RestoreAll { strict, filter } => {
            let conn = open(target)?;
            let store = store_for(&conn, target)?;
            let rows = select(&store, TrashScope::Deleted, filter)?;
            let service = TrashService::new(&store);
            let outcome: BulkOutcome<TableRow> = if *strict {
                service.restore_all_strict(rows)?
            } else {
                service.restore_all(rows)
            };
            print_outcome(&outcome);
            Ok(())
        }
    }
}

/// Resolves the trash config: defaults, then `--config`, then `--column`.
fn config_for(target: &Target) -> Result<TrashConfig> {
    let mut config = match &target.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config `{}`", path.display()))?;
            TrashConfig::from_json_str(&raw)
                .with_context(|| format!("invalid config `{}`", path.display()))?
        }
        None => TrashConfig::default(),
    };
    if let Some(column) = &target.column {
        config.column = column.clone();
    }
    config.validate()?;
    Ok(config)
}

fn table_for(target: &Target) -> Result<TrashTable> {
    let config = config_for(target)?;
    Ok(TrashTable::new(
        &target.table,
        &target.key_column,
        &config.column,
    )?)
}

fn schema_for(target: &Target, no_index: bool) -> Result<SoftTrashSchema> {
    let config = config_for(target)?;
    Ok(SoftTrashSchema::for_table(
        &table_for(target)?,
        config.create_index && !no_index,
    ))
}

fn open(target: &Target) -> Result<rusqlite::Connection> {
    open_db(&target.db).with_context(|| format!("failed to open `{}`", target.db.display()))
}

fn store_for<'conn>(
    conn: &'conn rusqlite::Connection,
    target: &Target,
) -> Result<SqliteTrashStore<'conn, TableRow>> {
    Ok(SqliteTrashStore::try_new(conn, table_for(target)?)?)
}

fn select(
    store: &SqliteTrashStore<'_, TableRow>,
    scope: TrashScope,
    filter: &RowFilter,
) -> Result<Vec<StoreResult<TableRow>>> {
    store
        .find_scoped_where(scope, filter.as_sql(), [])
        .with_context(|| format!("failed to select {scope} rows with `{}`", filter.as_sql()))
}

fn load_row(store: &SqliteTrashStore<'_, TableRow>, raw_key: &str) -> Result<TableRow> {
    let key = parse_key(raw_key);
    match store.get(&key)? {
        Some(row) => Ok(row),
        None => bail!("no record with key `{key}` in `{}`", store.table().table()),
    }
}

fn parse_key(raw: &str) -> RecordKey {
    raw.trim()
        .parse::<i64>()
        .map(RecordKey::Integer)
        .unwrap_or_else(|_| RecordKey::from(raw.trim()))
}

fn print_row(row: &TableRow) {
    match row.trashed_at {
        Some(at) => println!("key={} trashed_at={at}", row.key),
        None => println!("key={} trashed_at=null", row.key),
    }
}

fn print_outcome(outcome: &BulkOutcome<TableRow>) {
    for row in &outcome.records {
        print_row(row);
    }
    println!(
        "succeeded={} failed={}",
        outcome.succeeded, outcome.failed
    );
}
