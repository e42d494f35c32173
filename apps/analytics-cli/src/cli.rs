#[macro_use]
pub(crate) mod display;

pub mod commands;
pub mod logger;
pub mod routines;
pub mod settings;

use clap::Parser;
use commands::Commands;
use tracing::info;

use routines::{RoutineFailure, RoutineSuccess};
use settings::Settings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, arg_required_else_help(true), next_display_order = None)]
pub struct Cli {
    /// Turn debugging information on
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Print backtraces for all errors (same as RUST_LIB_BACKTRACE=1)
    #[arg(
        long,
        global = true,
        help = "Print backtraces for all errors (same as RUST_LIB_BACKTRACE=1)"
    )]
    pub backtrace: bool,

    #[command(subcommand)]
    pub command: Commands,
}

pub async fn top_command_handler(
    settings: Settings,
    commands: &Commands,
) -> Result<RoutineSuccess, RoutineFailure> {
    match commands {
        Commands::Parse { ddl_file, json } => {
            info!("Running parse command on {}", ddl_file.display());
            routines::parse::parse_ddl_file(ddl_file, *json)
        }
        Commands::Generate(args) => {
            info!(
                "Running generate command with sources {}",
                args.sources.display()
            );
            routines::model_generation::generate_models(&settings, args).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_requires_table_or_all() {
        assert!(Cli::try_parse_from(["analytics-cli", "generate", "--sources", "s.yml"]).is_err());
        assert!(Cli::try_parse_from([
            "analytics-cli",
            "generate",
            "--sources",
            "s.yml",
            "--all",
            "--table",
            "t"
        ])
        .is_err());

        let cli =
            Cli::try_parse_from(["analytics-cli", "generate", "-s", "s.yml", "--all"]).unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert!(args.all);
                assert_eq!(args.out_dir, std::path::PathBuf::from("models"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_ddl_file_requires_table() {
        assert!(Cli::try_parse_from([
            "analytics-cli",
            "generate",
            "--sources",
            "s.yml",
            "--all",
            "--ddl-file",
            "t.sql"
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "analytics-cli",
            "generate",
            "--sources",
            "s.yml",
            "--table",
            "events",
            "--ddl-file",
            "t.sql",
            "--random-seed",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.table.as_deref(), Some("events"));
                assert_eq!(args.random_seed, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
