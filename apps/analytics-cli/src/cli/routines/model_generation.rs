//! # Model Generation
//!
//! Backs `generate`: for each selected dbt source table, fetch the table's DDL, generate the
//! SQLModel class and its factory, write whichever files are missing (or asked to be
//! replaced) and finally rewrite the package `__init__.py`.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{RoutineFailure, RoutineSuccess};
use crate::cli::commands::GenerateArgs;
use crate::cli::display::{Message, MessageType};
use crate::cli::settings::Settings;
use crate::framework::dbt::source::{load_sources, Source, SourceTable, SourcesFile};
use crate::framework::python::files::{
    create_init_file, write_generated_model, ModelFilePaths, ReplaceOptions, WritePlan,
};
use crate::framework::python::sqlmodel::{
    create_model_code, CodegenOptions, MissingMetadataError, PrimaryKeyPolicy,
};
use crate::infrastructure::olap::clickhouse::errors::ClickhouseError;
use crate::infrastructure::olap::clickhouse::model::TableIdentifier;
use crate::infrastructure::olap::clickhouse::{check_ready, create_client};
use crate::infrastructure::olap::{OlapError, OlapOperations};

/// Serves one statement read from disk in place of a ClickHouse lookup.
pub struct DdlFile {
    pub path: PathBuf,
    pub statement: String,
}

impl DdlFile {
    pub fn read(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            statement: std::fs::read_to_string(path)?,
        })
    }
}

#[async_trait::async_trait]
impl OlapOperations for DdlFile {
    async fn get_create_table_statement(
        &self,
        table: &TableIdentifier,
        _default_database: &str,
    ) -> Result<String, OlapError> {
        debug!("Using {} as the DDL of {}", self.path.display(), table);
        Ok(self.statement.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    MissingMetadata(#[from] MissingMetadataError),

    #[error(transparent)]
    Olap(#[from] OlapError),

    #[error(transparent)]
    Write(#[from] crate::framework::python::files::FileWriteError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    Written(Vec<PathBuf>),
    /// Both files exist and neither is to be replaced
    Skipped,
}

/// Options resolved from the settings and the command line, the latter taking precedence.
pub fn resolve_options(settings: &Settings, args: &GenerateArgs) -> CodegenOptions {
    let mut options = settings.codegen.options();
    if let Some(seed) = args.random_seed {
        options.random_seed = seed;
    }
    if args.extend_primary_key {
        options.primary_key_policy = PrimaryKeyPolicy::ExtendWithVersion;
    }
    options
}

/// Generates and writes one table's model and factory.
///
/// The DDL is only fetched when at least one of the two files is going to be written.
pub async fn generate_table(
    olap: &dyn OlapOperations,
    source: &Source,
    table: &SourceTable,
    default_database: &str,
    out_dir: &Path,
    options: &CodegenOptions,
    replace: ReplaceOptions,
) -> Result<TableOutcome, GenerationError> {
    let class_name = table
        .python_class()
        .ok_or_else(|| MissingMetadataError::PythonClass {
            table: table.name.clone(),
        })?;

    let paths = ModelFilePaths::new(out_dir, class_name);
    let plan = WritePlan::new(&paths, replace);
    if plan.is_empty() {
        info!("Skipping {}: both files exist", table.name);
        return Ok(TableOutcome::Skipped);
    }

    let identifier = TableIdentifier::new(Some(source.database().to_string()), table.name.clone());
    let (statement, schema) = olap.get_table(&identifier, default_database).await?;
    let generated = create_model_code(&schema, &statement, &identifier, table, options)?;

    Ok(TableOutcome::Written(write_generated_model(
        &paths, plan, &generated,
    )?))
}

/// Classes to export from `__init__.py`: every table with a `python_class` whose model
/// module exists in `out_dir`.
pub fn exported_classes(sources: &SourcesFile, out_dir: &Path) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();
    for (_, table) in sources.tables() {
        if let Some(class_name) = table.python_class() {
            let exists = ModelFilePaths::new(out_dir, class_name).model.exists();
            if exists && !classes.iter().any(|c| c == class_name) {
                classes.push(class_name.to_string());
            }
        }
    }
    classes
}

fn selected_tables<'a>(
    sources: &'a SourcesFile,
    args: &GenerateArgs,
) -> Result<Vec<(&'a Source, &'a SourceTable)>, RoutineFailure> {
    if args.all {
        return Ok(sources.tables().collect());
    }

    let name = args.table.as_deref().unwrap_or_default();
    sources
        .find_table(name)
        .map(|found| vec![found])
        .ok_or_else(|| {
            RoutineFailure::error(Message::new(
                "Not found".to_string(),
                format!("table '{name}' in {}", args.sources.display()),
            ))
        })
}

async fn connect(settings: &Settings) -> Result<Box<dyn OlapOperations>, RoutineFailure> {
    let client = create_client(settings.clickhouse.clone());
    check_ready(&client).await.map_err(|e| {
        RoutineFailure::new(
            Message::new(
                "Connection".to_string(),
                format!("to ClickHouse at {} failed", settings.clickhouse.display_url()),
            ),
            ClickhouseError::Client {
                resource: settings.clickhouse.display_url(),
                error: e,
            },
        )
    })?;
    Ok(Box::new(client))
}

pub async fn generate_models(
    settings: &Settings,
    args: &GenerateArgs,
) -> Result<RoutineSuccess, RoutineFailure> {
    let sources = load_sources(&args.sources).map_err(|e| {
        RoutineFailure::new(
            Message::new(
                "Loading".to_string(),
                format!("dbt sources from {}", args.sources.display()),
            ),
            e,
        )
    })?;
    let tables = selected_tables(&sources, args)?;

    let olap: Box<dyn OlapOperations> = match &args.ddl_file {
        Some(path) => Box::new(DdlFile::read(path).map_err(|e| {
            RoutineFailure::new(
                Message::new("Failed".to_string(), format!("to read {}", path.display())),
                e,
            )
        })?),
        None => connect(settings).await?,
    };

    let options = resolve_options(settings, args);
    let replace = ReplaceOptions {
        replace_model: args.replace_model,
        replace_factory: args.replace_factory,
    };

    let mut written = 0;
    let mut failed = Vec::new();
    for (source, table) in &tables {
        let outcome = generate_table(
            olap.as_ref(),
            source,
            table,
            &settings.clickhouse.db_name,
            &args.out_dir,
            &options,
            replace,
        )
        .await;

        match outcome {
            Ok(TableOutcome::Written(paths)) => {
                written += 1;
                for path in paths {
                    show_message!(
                        MessageType::Success,
                        Message::new("Generated".to_string(), path.display().to_string())
                    );
                }
            }
            Ok(TableOutcome::Skipped) => {
                show_message!(
                    MessageType::Info,
                    Message::new(
                        "Skipped".to_string(),
                        format!("{}: model and factory already exist", table.name)
                    )
                );
            }
            Err(e) => {
                warn!("Generating {} failed: {:?}", table.name, e);
                show_message!(
                    MessageType::Error,
                    Message::new("Failed".to_string(), format!("{}: {e}", table.name))
                );
                failed.push(table.name.clone());
            }
        }
    }

    let classes = exported_classes(&sources, &args.out_dir);
    if !classes.is_empty() {
        let path = create_init_file(&args.out_dir, &classes).map_err(|e| {
            RoutineFailure::new(
                Message::new(
                    "Failed".to_string(),
                    format!("to write the package init file in {}", args.out_dir.display()),
                ),
                e,
            )
        })?;
        info!("Exported {} classes from {}", classes.len(), path.display());
    }

    if !failed.is_empty() {
        return Err(RoutineFailure::error(Message::new(
            "Failed".to_string(),
            format!(
                "{} of {} tables: {}",
                failed.len(),
                tables.len(),
                failed.join(", ")
            ),
        )));
    }

    Ok(RoutineSuccess::success(Message::new(
        "Generated".to_string(),
        format!(
            "{written} of {} tables in {}",
            tables.len(),
            args.out_dir.display()
        ),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::dbt::source::TableMeta;
    use std::fs;
    use tempfile::tempdir;

    const STATEMENT: &str = "CREATE TABLE analytics.page_views
(
    `id` UInt64,
    `url` String,
    `_peerdb_version` Int64
)
ENGINE = ReplacingMergeTree(_peerdb_version)
PRIMARY KEY id
ORDER BY id";

    fn ddl() -> DdlFile {
        DdlFile {
            path: PathBuf::from("page_views.sql"),
            statement: STATEMENT.to_string(),
        }
    }

    fn source(python_class: Option<&str>) -> Source {
        Source {
            name: "analytics".to_string(),
            schema: None,
            tables: vec![SourceTable {
                name: "page_views".to_string(),
                meta: python_class.map(|class| TableMeta {
                    python_class: Some(class.to_string()),
                }),
                columns: vec![],
            }],
        }
    }

    fn args(all: bool, random_seed: Option<u64>, extend_primary_key: bool) -> GenerateArgs {
        GenerateArgs {
            sources: PathBuf::from("sources.yml"),
            table: None,
            all,
            ddl_file: None,
            out_dir: PathBuf::from("models"),
            replace_model: false,
            replace_factory: false,
            extend_primary_key,
            random_seed,
        }
    }

    #[tokio::test]
    async fn test_generate_table_writes_then_skips() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        let source = source(Some("PageView"));
        let options = CodegenOptions::default();

        let outcome = generate_table(
            &ddl(),
            &source,
            &source.tables[0],
            "default",
            dir,
            &options,
            ReplaceOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            outcome,
            TableOutcome::Written(vec![
                dir.join("page_view.py"),
                dir.join("page_view_factory.py")
            ])
        );

        let model = fs::read_to_string(dir.join("page_view.py")).unwrap();
        assert!(model.contains("class PageView(BaseMixin, SQLModel, table=True):"));
        assert!(model.contains("{'schema': 'analytics'}"));

        let outcome = generate_table(
            &ddl(),
            &source,
            &source.tables[0],
            "default",
            dir,
            &options,
            ReplaceOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(outcome, TableOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_generate_table_requires_python_class() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        let source = source(None);

        let result = generate_table(
            &ddl(),
            &source,
            &source.tables[0],
            "default",
            dir,
            &CodegenOptions::default(),
            ReplaceOptions::default(),
        )
        .await;

        assert!(matches!(
            result,
            Err(GenerationError::MissingMetadata(MissingMetadataError::PythonClass { .. }))
        ));
        assert_eq!(fs::read_dir(dir).unwrap().count(), 0);
    }

    #[test]
    fn test_exported_classes_only_lists_existing_models() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("page_view.py"), "").unwrap();

        let sources = SourcesFile::from_yaml(
            r#"
sources:
  - name: analytics
    tables:
      - name: page_views
        meta:
          python_class: PageView
      - name: sessions
        meta:
          python_class: Session
      - name: raw
"#,
        )
        .unwrap();

        assert_eq!(exported_classes(&sources, dir), vec!["PageView"]);
    }

    #[test]
    fn test_command_line_overrides_settings() {
        let settings = Settings::default();

        assert_eq!(
            resolve_options(&settings, &args(true, None, false)),
            CodegenOptions::default()
        );
        assert_eq!(
            resolve_options(&settings, &args(true, Some(9), true)),
            CodegenOptions {
                random_seed: 9,
                primary_key_policy: PrimaryKeyPolicy::ExtendWithVersion,
            }
        );
    }
}
