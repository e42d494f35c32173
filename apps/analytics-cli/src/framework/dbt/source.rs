//! # dbt Sources
//!
//! Loads dbt `sources.yml` files. Each source names a ClickHouse database and lists the
//! tables to generate models for; table and column `meta` blocks carry the generator's
//! metadata:
//!
//! ```yaml
//! version: 2
//! sources:
//!   - name: analytics
//!     tables:
//!       - name: events
//!         meta:
//!           python_class: Event
//!         columns:
//!           - name: payload
//!             meta:
//!               sqlalchemy_type: types.JSON
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SourcesError {
    #[error("Failed to read dbt sources file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse dbt sources file {path}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesFile {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    /// dbt defaults the schema to the source name; for ClickHouse the schema is the database.
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub tables: Vec<SourceTable>,
}

impl Source {
    pub fn database(&self) -> &str {
        self.schema.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    pub name: String,
    #[serde(default)]
    pub meta: Option<TableMeta>,
    #[serde(default)]
    pub columns: Vec<SourceColumn>,
}

impl SourceTable {
    pub fn python_class(&self) -> Option<&str> {
        self.meta.as_ref()?.python_class.as_deref()
    }

    pub fn column(&self, name: &str) -> Option<&SourceColumn> {
        self.columns.iter().find(|column| column.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    #[serde(default)]
    pub python_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceColumn {
    pub name: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub meta: Option<ColumnMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Storage type written verbatim into the model instead of the one derived from the DDL
    #[serde(default)]
    pub sqlalchemy_type: Option<String>,
}

impl SourcesFile {
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Every table of every source, in file order.
    pub fn tables(&self) -> impl Iterator<Item = (&Source, &SourceTable)> {
        self.sources
            .iter()
            .flat_map(|source| source.tables.iter().map(move |table| (source, table)))
    }

    /// Finds a table by `name` or `source.name`.
    pub fn find_table(&self, name: &str) -> Option<(&Source, &SourceTable)> {
        match name.split_once('.') {
            Some((source_name, table_name)) => self
                .tables()
                .find(|(source, table)| source.name == source_name && table.name == table_name),
            None => self.tables().find(|(_, table)| table.name == name),
        }
    }
}

pub fn load_sources(path: &Path) -> Result<SourcesFile, SourcesError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SourcesError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    SourcesFile::from_yaml(&contents).map_err(|source| SourcesError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
