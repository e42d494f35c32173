use itertools::Itertools;
use std::io::Read;
use std::path::Path;
use tracing::info;

use super::{RoutineFailure, RoutineSuccess};
use crate::cli::display::Message;
use crate::infrastructure::olap::clickhouse::model::ParsedSchema;
use crate::infrastructure::olap::clickhouse::sql_parser::parse_create_table_statement;

fn read_ddl(ddl_file: &Path) -> std::io::Result<String> {
    if ddl_file == Path::new("-") {
        let mut statement = String::new();
        std::io::stdin().read_to_string(&mut statement)?;
        Ok(statement)
    } else {
        std::fs::read_to_string(ddl_file)
    }
}

fn or_none(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// Plain-text rendering of a parsed schema, one property per line followed by the columns.
pub fn render_schema_summary(schema: &ParsedSchema) -> String {
    let mut lines = vec![
        format!(
            "table: {}",
            schema
                .table
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string())
        ),
        format!("engine: {}", or_none(schema.engine.as_deref())),
        format!("version column: {}", or_none(schema.version_column.as_deref())),
        format!(
            "soft delete column: {}",
            or_none(schema.soft_delete_column.as_deref())
        ),
        format!("primary key: ({})", schema.primary_key.join(", ")),
        format!("order by: ({})", schema.order_by.join(", ")),
        format!(
            "settings: {}",
            schema
                .settings
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .join(", ")
        ),
        "columns:".to_string(),
    ];

    let name_width = schema
        .columns
        .iter()
        .map(|column| column.name.len())
        .max()
        .unwrap_or(0);
    for column in &schema.columns {
        let mut flags = Vec::new();
        if column.is_primary_key {
            flags.push("primary key");
        }
        if column.is_nullable {
            flags.push("nullable");
        }

        lines.push(
            format!(
                "  {:<name_width$}  {}  -> {}  {}",
                column.name,
                column.source_type,
                column.target_field_type_expression,
                flags.join(", ")
            )
            .trim_end()
            .to_string(),
        );
    }

    lines.join("\n")
}

pub fn parse_ddl_file(ddl_file: &Path, json: bool) -> Result<RoutineSuccess, RoutineFailure> {
    let statement = read_ddl(ddl_file).map_err(|e| {
        RoutineFailure::new(
            Message::new("Failed".to_string(), format!("to read {}", ddl_file.display())),
            e,
        )
    })?;

    let schema = parse_create_table_statement(&statement).map_err(|e| {
        RoutineFailure::new(
            Message::new(
                "Parse".to_string(),
                format!("failed for {}: {e}", ddl_file.display()),
            ),
            e,
        )
    })?;
    info!(
        "Parsed {} with {} columns",
        ddl_file.display(),
        schema.columns.len()
    );

    if json {
        let output = serde_json::to_string_pretty(&schema).map_err(|e| {
            RoutineFailure::new(
                Message::new("Failed".to_string(), "to serialize the schema".to_string()),
                e,
            )
        })?;
        println!("{output}");
        return Ok(RoutineSuccess::silent());
    }

    println!("{}", render_schema_summary(&schema));
    Ok(RoutineSuccess::success(Message::new(
        "Parsed".to_string(),
        format!("{} columns", schema.columns.len()),
    )))
}
