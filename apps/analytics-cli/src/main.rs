#[macro_use]
mod cli;
pub mod framework;
pub mod infrastructure;
pub mod utilities;

use std::process::ExitCode;

use clap::Parser;
use cli::display::{Message, MessageType};
use cli::logger::LoggerLevel;

// Entry point for the CLI application
fn main() -> ExitCode {
    // Parse first so --help and --version never touch the user directory
    let cli_result = cli::Cli::parse();

    if let Err(e) = cli::settings::setup_user_directory() {
        show_message!(
            MessageType::Error,
            Message {
                action: "Init".to_string(),
                details: format!(
                    "Failed to initialize {}, please check your permissions: {e:?}",
                    cli::settings::user_directory().display()
                ),
            }
        );
        return ExitCode::from(1);
    }

    if let Err(e) = cli::settings::init_config_file() {
        show_message!(
            MessageType::Error,
            Message {
                action: "Init".to_string(),
                details: format!("Failed to write the default config file: {e}"),
            }
        );
        return ExitCode::from(1);
    }

    let config = match cli::settings::read_settings() {
        Ok(config) => config,
        Err(e) => {
            show_message!(
                MessageType::Error,
                Message {
                    action: "Settings".to_string(),
                    details: format!(
                        "Failed to read {}: {e}",
                        cli::settings::config_path().display()
                    ),
                }
            );
            return ExitCode::from(1);
        }
    };

    if cli_result.backtrace {
        // Safe: no other threads have started and no errors have been created yet.
        std::env::set_var("RUST_LIB_BACKTRACE", "1");
    }

    let mut logger_settings = config.logger.clone();
    if cli_result.debug {
        logger_settings.level = LoggerLevel::Debug;
    }
    let session_id = uuid::Uuid::new_v4().to_string();
    cli::logger::setup_logging(&logger_settings, &session_id);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            show_message!(
                MessageType::Error,
                Message {
                    action: "Init".to_string(),
                    details: format!("Failed to create the Tokio runtime: {e}"),
                }
            );
            return ExitCode::from(1);
        }
    };

    let result = runtime.block_on(cli::top_command_handler(config, &cli_result.command));

    match result {
        Ok(s) => {
            s.show();
            ExitCode::from(0)
        }
        Err(e) => {
            show_message!(e.message_type, e.message);
            if let Some(err) = e.error {
                eprintln!("{err:?}");
            }
            ExitCode::from(1)
        }
    }
}
