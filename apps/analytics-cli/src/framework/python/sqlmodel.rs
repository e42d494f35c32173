//! # SQLModel Generation
//!
//! Turns a parsed ClickHouse table into the source of a `SQLModel` class backed by
//! `clickhouse_sqlalchemy`, plus its polyfactory factory (see [`super::factory`]).
//!
//! Generation first builds a [`ModelFile`] (imports, class header, engine declaration and
//! one [`FieldDescriptor`] per column) and then renders it in a single step, so output is
//! byte-identical for identical inputs.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use super::factory::FactoryFile;
use super::naming::to_field_name;
use crate::framework::dbt::source::SourceTable;
use crate::infrastructure::olap::clickhouse::model::{ParsedSchema, TableIdentifier};
use crate::infrastructure::olap::clickhouse::type_parser::RuntimeType;
use crate::utilities::identifiers::{
    is_python_identifier, is_python_keyword, python_string_literal, python_string_tuple,
};

pub const INDENT: &str = "    ";

/// Version column PeerDB adds to every mirrored table.
pub const PEERDB_VERSION_COLUMN: &str = "_peerdb_version";

const BASE_MODEL_IMPORTS: &[&str] = &[
    "from package.polyfactory.mixins import BaseMixin",
    "from sqlmodel import Column, Field, SQLModel",
];
const ENGINES_IMPORT: &str = "from clickhouse_sqlalchemy import engines";
const TYPES_IMPORT: &str = "from package.sqlalchemy.clickhouse import types";

/// Which columns are declared `primary_key=True` on the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryKeyPolicy {
    /// Only the columns in the table's primary key.
    #[default]
    Declared,
    /// The primary key plus the engine's version column (or `_peerdb_version` when the
    /// engine names none), so each row version has a unique identity on the SQLAlchemy side.
    ExtendWithVersion,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodegenOptions {
    pub random_seed: u64,
    pub primary_key_policy: PrimaryKeyPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MissingMetadataError {
    #[error("Source table '{table}' has no `meta.python_class`")]
    PythonClass { table: String },

    #[error(
        "Source table '{table}' has `meta.python_class` '{python_class}', \
         which is not a valid Python class name"
    )]
    InvalidPythonClass { table: String, python_class: String },

    #[error("Column '{column}' of '{table}' has a `meta` block without `sqlalchemy_type`")]
    ColumnOverride { table: String, column: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModel {
    pub class_name: String,
    pub model_code: String,
    pub factory_code: String,
}

/// `engines.<Name>(<kwargs>)` on the model's `__table_args__`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineDeclaration {
    pub name: String,
    /// Keyword arguments as already-rendered Python expressions, in emission order.
    pub kwargs: Vec<(String, String)>,
}

impl EngineDeclaration {
    /// Keyword arguments go out as `version`, `order_by`, `primary_key`, then the settings
    /// in key order.
    pub fn from_schema(schema: &ParsedSchema) -> Option<Self> {
        let name = schema.engine.clone()?;
        let mut kwargs = Vec::new();

        if let Some(version) = &schema.version_column {
            kwargs.push(("version".to_string(), python_string_literal(version)));
        }
        if !schema.order_by.is_empty() {
            kwargs.push(("order_by".to_string(), python_string_tuple(&schema.order_by)));
        }
        if !schema.primary_key.is_empty() {
            kwargs.push((
                "primary_key".to_string(),
                python_string_tuple(&schema.primary_key),
            ));
        }
        for (key, value) in &schema.settings {
            kwargs.push((key.clone(), value.clone()));
        }

        Some(Self { name, kwargs })
    }

    pub fn render(&self) -> String {
        format!(
            "engines.{}({})",
            self.name,
            self.kwargs
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .join(", ")
        )
    }
}

/// One model field and the storage column behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field_name: String,
    pub field_type: String,
    pub column_name: String,
    pub storage_type: String,
    pub runtime_type: RuntimeType,
    pub primary_key: bool,
    pub nullable: bool,
}

impl FieldDescriptor {
    pub fn render(&self) -> String {
        // Key columns are implicitly non-null, so they never carry `nullable=`
        let constraint = if self.primary_key {
            "primary_key=True".to_string()
        } else {
            format!("nullable={}", python_bool(self.nullable))
        };

        format!(
            "{}: {} = Field(sa_column=Column(name={}, type_={}, {}))",
            self.field_name,
            self.field_type,
            python_string_literal(&self.column_name),
            self.storage_type,
            constraint
        )
    }
}

/// Structured form of a generated model module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFile {
    /// DDL embedded in the module docstring
    pub statement: String,
    pub imports: BTreeSet<String>,
    pub class_name: String,
    pub table_name: String,
    pub schema: Option<String>,
    pub engine: Option<EngineDeclaration>,
    pub fields: Vec<FieldDescriptor>,
}

impl ModelFile {
    pub fn build(
        schema: &ParsedSchema,
        statement: &str,
        table: &TableIdentifier,
        source: &SourceTable,
        options: &CodegenOptions,
    ) -> Result<Self, MissingMetadataError> {
        let class_name = source
            .python_class()
            .ok_or_else(|| MissingMetadataError::PythonClass {
                table: source.name.clone(),
            })?;
        if !is_python_identifier(class_name) {
            return Err(MissingMetadataError::InvalidPythonClass {
                table: source.name.clone(),
                python_class: class_name.to_string(),
            });
        }

        let key_columns = model_key_columns(schema, options.primary_key_policy);

        let mut fields = Vec::with_capacity(schema.columns.len());
        for column in &schema.columns {
            let storage_type = match source.column(&column.name).and_then(|c| c.meta.as_ref()) {
                Some(meta) => meta.sqlalchemy_type.clone().ok_or_else(|| {
                    MissingMetadataError::ColumnOverride {
                        table: source.name.clone(),
                        column: column.name.clone(),
                    }
                })?,
                None => column.target_storage_type_expression.clone(),
            };

            let field_name = to_field_name(&column.name);
            if is_python_keyword(&field_name) {
                warn!(
                    "Column `{}` of {} maps to the Python keyword `{}`; the model will not import",
                    column.name, table, field_name
                );
            }

            fields.push(FieldDescriptor {
                field_name,
                field_type: column.target_field_type_expression.clone(),
                column_name: column.name.clone(),
                storage_type,
                runtime_type: column.mapped_runtime_type,
                primary_key: key_columns.contains(column.name.as_str()),
                nullable: column.is_nullable,
            });
        }

        let engine = EngineDeclaration::from_schema(schema);

        let mut imports: BTreeSet<String> =
            BASE_MODEL_IMPORTS.iter().map(|i| i.to_string()).collect();
        if engine.is_some() {
            imports.insert(ENGINES_IMPORT.to_string());
        }
        if fields.iter().any(|field| field.storage_type.contains("types.")) {
            imports.insert(TYPES_IMPORT.to_string());
        }
        imports.extend(
            fields
                .iter()
                .filter_map(|field| field.runtime_type.python_import())
                .map(str::to_string),
        );

        let schema_name = table
            .database
            .clone()
            .or_else(|| schema.table.as_ref().and_then(|t| t.database.clone()));

        debug!(
            "Built model {} for {} with {} fields",
            class_name,
            table,
            fields.len()
        );

        Ok(Self {
            statement: statement.to_string(),
            imports,
            class_name: class_name.to_string(),
            table_name: table.table.clone(),
            schema: schema_name,
            engine,
            fields,
        })
    }

    pub fn table_args(&self) -> Option<String> {
        let mut args = Vec::new();
        if let Some(engine) = &self.engine {
            args.push(engine.render());
        }
        if let Some(schema) = &self.schema {
            args.push(format!("{{'schema': {}}}", python_string_literal(schema)));
        }

        if args.is_empty() {
            None
        } else {
            Some(format!("({},)", args.join(", ")))
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            format!(
                "\"\"\"\nCreated from:\n\n{}\n\"\"\"",
                docstring_text(&self.statement)
            ),
            String::new(),
        ];
        lines.extend(self.imports.iter().cloned());
        lines.push(String::new());
        lines.push(String::new());

        lines.push(format!(
            "class {}(BaseMixin, SQLModel, table=True):",
            self.class_name
        ));
        lines.push(format!(
            "{INDENT}__tablename__ = {}",
            python_string_literal(&self.table_name)
        ));
        if let Some(table_args) = self.table_args() {
            lines.push(format!("{INDENT}__table_args__ = {table_args}"));
        }
        lines.push(String::new());

        for field in &self.fields {
            lines.push(format!("{INDENT}{}", field.render()));
        }

        lines.join("\n") + "\n"
    }
}

/// Columns declared `primary_key=True` under `policy`.
fn model_key_columns(schema: &ParsedSchema, policy: PrimaryKeyPolicy) -> BTreeSet<&str> {
    let mut columns: BTreeSet<&str> = schema
        .primary_key_columns()
        .map(|column| column.name.as_str())
        .collect();

    if policy == PrimaryKeyPolicy::ExtendWithVersion {
        let version = schema
            .version_column
            .as_deref()
            .unwrap_or(PEERDB_VERSION_COLUMN);
        if let Some(column) = schema.column(version) {
            columns.insert(column.name.as_str());
        }
    }

    columns
}

fn python_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Escapes the statement so the docstring's value is the statement itself.
fn docstring_text(statement: &str) -> String {
    statement
        .replace('\\', "\\\\")
        .replace("\"\"\"", "\\\"\\\"\\\"")
}

/// Generates the model and factory modules for one table.
///
/// `statement` is the DDL `schema` was parsed from; it is embedded in the model docstring.
/// Fails before producing any output when the dbt metadata is incomplete.
pub fn create_model_code(
    schema: &ParsedSchema,
    statement: &str,
    table: &TableIdentifier,
    source: &SourceTable,
    options: &CodegenOptions,
) -> Result<GeneratedModel, MissingMetadataError> {
    let model = ModelFile::build(schema, statement, table, source, options)?;
    let factory = FactoryFile::from_model(&model, options.random_seed);

    Ok(GeneratedModel {
        class_name: model.class_name.clone(),
        model_code: model.render(),
        factory_code: factory.render(),
    })
}
