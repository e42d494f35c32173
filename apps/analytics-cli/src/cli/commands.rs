//! # CLI Commands
//! A module for all the commands that can be run from the CLI

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::utilities::constants::DEFAULT_MODELS_DIRECTORY;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parses a ClickHouse CREATE TABLE statement and prints the resulting schema
    Parse {
        /// File holding the statement, `-` reads it from stdin
        ddl_file: PathBuf,

        /// Print the schema as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Generates SQLModel classes and polyfactory factories for dbt source tables
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// dbt sources file listing the tables and their `python_class`
    #[arg(short, long, value_name = "SOURCES_YML")]
    pub sources: PathBuf,

    /// Table to generate, as `table` or `source.table`
    #[arg(short, long, required_unless_present = "all", conflicts_with = "all")]
    pub table: Option<String>,

    /// Generate every table of the sources file
    #[arg(long)]
    pub all: bool,

    /// Read the table's DDL from this file instead of ClickHouse
    #[arg(long, requires = "table", conflicts_with = "all")]
    pub ddl_file: Option<PathBuf>,

    /// Directory the Python modules are written to
    #[arg(short, long, default_value = DEFAULT_MODELS_DIRECTORY)]
    pub out_dir: PathBuf,

    /// Overwrite an existing model file
    #[arg(long)]
    pub replace_model: bool,

    /// Overwrite an existing factory file
    #[arg(long)]
    pub replace_factory: bool,

    /// Also declare the engine's version column as part of the model's primary key
    #[arg(long)]
    pub extend_primary_key: bool,

    /// `__random_seed__` of the generated factories, overriding the configured seed
    #[arg(long)]
    pub random_seed: Option<u64>,
}
