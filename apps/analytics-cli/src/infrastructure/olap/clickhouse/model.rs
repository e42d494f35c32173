use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::errors::{validate_clickhouse_identifier, ClickhouseError};
use super::type_parser::RuntimeType;

/// Structured description of a single `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedSchema {
    /// `[db.]name` from the statement head
    pub table: Option<TableIdentifier>,
    pub engine: Option<String>,
    /// First positional engine argument, e.g. the `ReplacingMergeTree` version column
    pub version_column: Option<String>,
    /// Second positional engine argument, e.g. `_peerdb_is_deleted`
    pub soft_delete_column: Option<String>,
    pub primary_key: Vec<String>,
    pub order_by: Vec<String>,
    /// Setting values are kept as literal source text
    pub settings: BTreeMap<String, String>,
    pub columns: Vec<ColumnInfo>,
}

impl ParsedSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|column| column.is_primary_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub is_primary_key: bool,
    pub is_nullable: bool,
    pub source_type: String,
    pub mapped_runtime_type: RuntimeType,
    pub target_field_type_expression: String,
    pub target_storage_type_expression: String,
}

/// A `[database.]table` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableIdentifier {
    pub database: Option<String>,
    pub table: String,
}

impl TableIdentifier {
    pub fn new(database: Option<String>, table: impl Into<String>) -> Self {
        Self {
            database,
            table: table.into(),
        }
    }

    /// Parses `table`, `db.table` or the backtick-quoted forms of either.
    ///
    /// Unquoted parts must be valid ClickHouse identifiers; quoted parts are taken as is.
    pub fn from_string(value: &str) -> Result<Self, ClickhouseError> {
        let parts = split_qualified_name(value);
        let mut parts = parts.into_iter().map(|(part, quoted)| {
            if !quoted {
                validate_clickhouse_identifier(&part, "table identifier")?;
            }
            Ok::<_, ClickhouseError>(part)
        });

        match (parts.next(), parts.next(), parts.next()) {
            (Some(table), None, None) => Ok(Self::new(None, table?)),
            (Some(database), Some(table), None) => Ok(Self::new(Some(database?), table?)),
            _ => Err(ClickhouseError::InvalidIdentifier {
                identifier_type: "table identifier".to_string(),
                name: value.to_string(),
                reason: "expected `table` or `database.table`".to_string(),
            }),
        }
    }

    /// Database name, falling back to `default_database` when the identifier is unqualified.
    pub fn database_or<'a>(&'a self, default_database: &'a str) -> &'a str {
        self.database.as_deref().unwrap_or(default_database)
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(database) => write!(f, "`{database}`.`{}`", self.table),
            None => write!(f, "`{}`", self.table),
        }
    }
}

/// Splits on dots outside backticks, returning each part unquoted with a flag telling
/// whether it was quoted.
fn split_qualified_name(value: &str) -> Vec<(String, bool)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quotes = false;

    for c in value.trim().chars() {
        match c {
            '`' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            '.' if !in_quotes => {
                parts.push((std::mem::take(&mut current), quoted));
                quoted = false;
            }
            _ => current.push(c),
        }
    }
    parts.push((current, quoted));

    parts
}

/// A row of `system.tables` carrying the table's DDL.
#[derive(Debug, Clone, Deserialize, Serialize, clickhouse::Row)]
pub struct ClickHouseTableDefinitionRow {
    #[serde(with = "clickhouse::serde::uuid")]
    pub uuid: uuid::Uuid,
    pub database: String,
    pub name: String,
    pub engine: String,
    pub create_table_query: String,
}
