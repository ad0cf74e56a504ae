//! Soft-trash configuration and validated SQL identifiers.
//!
//! # Responsibility
//! - Hold the configurable trash column name (default `deleted_at`).
//! - Validate table/column identifiers once, before they reach SQL text.
//!
//! # Invariants
//! - Every `TrashColumn` and `TrashTable` name matches `^[A-Za-z_][A-Za-z0-9_]*$`.
//! - Configuration is an explicit value passed to stores and schema helpers,
//!   never process-global state.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default name of the trash timestamp column.
pub const DEFAULT_TRASH_COLUMN: &str = "deleted_at";

/// Default primary key column used by table descriptors.
pub const DEFAULT_KEY_COLUMN: &str = "id";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Errors raised while building or loading soft-trash configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Name cannot be safely embedded into SQL as an identifier.
    InvalidIdentifier { role: &'static str, value: String },
    /// Serialized configuration could not be decoded.
    Parse(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier { role, value } => {
                write!(f, "invalid {role} identifier `{value}`")
            }
            Self::Parse(message) => write!(f, "invalid soft-trash config: {message}"),
        }
    }
}

impl Error for ConfigError {}

fn validate_identifier(role: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if !IDENTIFIER_RE.is_match(trimmed) {
        return Err(ConfigError::InvalidIdentifier {
            role,
            value: value.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Validated name of the trash timestamp column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrashColumn(String);

impl TrashColumn {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        validate_identifier("column", name).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for TrashColumn {
    fn default() -> Self {
        Self(DEFAULT_TRASH_COLUMN.to_string())
    }
}

impl Display for TrashColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Table descriptor for stores backed by SQL tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashTable {
    table: String,
    key_column: String,
    column: TrashColumn,
}

impl TrashTable {
    /// Builds a descriptor, validating every identifier.
    ///
    /// # Errors
    /// - `ConfigError::InvalidIdentifier` for any name that is not a plain
    ///   SQL identifier.
    pub fn new(table: &str, key_column: &str, column: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            table: validate_identifier("table", table)?,
            key_column: validate_identifier("key column", key_column)?,
            column: TrashColumn::parse(column)?,
        })
    }

    /// Descriptor using `id` as key and the column named by `config`.
    pub fn with_config(table: &str, config: &TrashConfig) -> Result<Self, ConfigError> {
        Self::new(table, DEFAULT_KEY_COLUMN, &config.column)
    }

    pub fn table(&self) -> &str {
        self.table.as_str()
    }

    pub fn key_column(&self) -> &str {
        self.key_column.as_str()
    }

    pub fn column(&self) -> &TrashColumn {
        &self.column
    }
}

/// User-facing soft-trash settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrashConfig {
    /// Name of the nullable timestamp column.
    pub column: String,
    /// Whether schema provisioning also creates an index on the column.
    pub create_index: bool,
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            column: DEFAULT_TRASH_COLUMN.to_string(),
            create_index: true,
        }
    }
}

impl TrashConfig {
    /// Decodes and validates a JSON config document.
    ///
    /// Missing fields fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trash_column().map(|_| ())
    }

    pub fn trash_column(&self) -> Result<TrashColumn, ConfigError> {
        TrashColumn::parse(&self.column)
    }
}
