//! # Logger Module
//!
//! Logging for the CLI is built from `tracing-subscriber` layers:
//! - **EnvFilter Layer**: `RUST_LOG` support for module-level filtering, falling back to the
//!   configured level
//! - **Format Layer**: either the legacy line format or tracing's native formatting
//!
//! ## Formats
//!
//! - **Legacy Format** (default)
//!   - Text: `[timestamp LEVEL - target] message`
//!   - JSON: `{"timestamp": "...", "severity": "INFO", "target": "...", "message": "..."}`
//! - **Modern Format** (opt-in via `ANALYTICS_LOGGER__USE_TRACING_FORMAT=true`)
//!
//! Logs go to a daily-rolling `cli.log` file in the user directory unless `stdout` is set.
//! Log files older than 7 days are deleted on startup.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: e.g. `RUST_LOG=analytics_cli::infrastructure=debug`
//! - `ANALYTICS_LOGGER__LEVEL`: DEBUG, INFO, WARN or ERROR
//! - `ANALYTICS_LOGGER__STDOUT`: output to stdout instead of the log file (default: `false`)
//! - `ANALYTICS_LOGGER__FORMAT`: Text or Json (default: Text)
//! - `ANALYTICS_LOGGER__INCLUDE_SESSION_ID`: include the session ID in each line (default: `false`)

use serde::Deserialize;
use std::env;
use std::fmt;
use std::io::Write;
use std::time::{Duration, SystemTime};
use tracing::field::{Field, Visit};
use tracing::{warn, Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use super::settings::user_directory;

/// Default date format for log file names: YYYY-MM-DD-cli.log
pub const DEFAULT_LOG_FILE_FORMAT: &str = "%Y-%m-%d-cli.log";

const LOG_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Deserialize, Debug, Clone)]
pub enum LoggerLevel {
    #[serde(alias = "DEBUG", alias = "debug")]
    Debug,
    #[serde(alias = "INFO", alias = "info")]
    Info,
    #[serde(alias = "WARN", alias = "warn")]
    Warn,
    #[serde(alias = "ERROR", alias = "error")]
    Error,
}

impl LoggerLevel {
    pub fn to_tracing_level(&self) -> LevelFilter {
        match self {
            LoggerLevel::Debug => LevelFilter::DEBUG,
            LoggerLevel::Info => LevelFilter::INFO,
            LoggerLevel::Warn => LevelFilter::WARN,
            LoggerLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub enum LogFormat {
    #[serde(alias = "json", alias = "JSON")]
    Json,
    #[serde(alias = "text", alias = "TEXT")]
    Text,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoggerSettings {
    #[serde(default = "default_log_file")]
    pub log_file_date_format: String,
    #[serde(default = "default_log_level")]
    pub level: LoggerLevel,
    #[serde(default = "default_log_stdout")]
    pub stdout: bool,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    #[serde(default = "default_include_session_id")]
    pub include_session_id: bool,

    #[serde(default = "default_use_tracing_format")]
    pub use_tracing_format: bool,
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE_FORMAT.to_string()
}

fn default_log_level() -> LoggerLevel {
    LoggerLevel::Info
}

fn default_log_stdout() -> bool {
    false
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_include_session_id() -> bool {
    false
}

fn default_use_tracing_format() -> bool {
    env::var("ANALYTICS_LOGGER__USE_TRACING_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false)
}

impl Default for LoggerSettings {
    fn default() -> Self {
        LoggerSettings {
            log_file_date_format: default_log_file(),
            level: default_log_level(),
            stdout: default_log_stdout(),
            format: default_log_format(),
            include_session_id: default_include_session_id(),
            use_tracing_format: default_use_tracing_format(),
        }
    }
}

// House-keeping: delete log files older than 7 days. Failures never abort the CLI.
fn clean_old_logs() {
    let cut_off = SystemTime::now() - LOG_RETENTION;

    if let Ok(dir) = user_directory().read_dir() {
        for entry in dir.flatten() {
            let path = entry.path();
            let is_log = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(".log") || name.contains(".log."));
            if !is_log {
                continue;
            }

            match entry.metadata().and_then(|md| md.modified()) {
                // Smaller time means older than the cut_off
                Ok(t) if t < cut_off => {
                    let _ = std::fs::remove_file(&path);
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to read modification time for {:?}. {}", path, e),
            }
        }
    } else {
        warn!("failed to read directory")
    }
}

/// Layer that writes one line per event in the legacy text or JSON format
struct LegacyFormatLayer<W> {
    writer: W,
    format: LogFormat,
    include_session_id: bool,
    session_id: String,
}

impl<W> LegacyFormatLayer<W> {
    fn new(writer: W, format: LogFormat, include_session_id: bool, session_id: String) -> Self {
        Self {
            writer,
            format,
            include_session_id,
            session_id,
        }
    }

    fn format_text(&self, level: &Level, target: &str, message: &str) -> String {
        format!(
            "[{} {}{} - {}] {}",
            humantime::format_rfc3339_seconds(SystemTime::now()),
            level,
            if self.include_session_id {
                format!(" {}", self.session_id)
            } else {
                String::new()
            },
            target,
            message
        )
    }

    fn format_json(&self, level: &Level, target: &str, message: &str) -> String {
        let mut log_json = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "severity": level.to_string(),
            "target": target,
            "message": message,
        });

        if self.include_session_id {
            log_json["session_id"] = serde_json::Value::String(self.session_id.clone());
        }

        log_json.to_string()
    }
}

impl<S, W> Layer<S> for LegacyFormatLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let output = if self.format == LogFormat::Text {
            self.format_text(metadata.level(), metadata.target(), &visitor.message)
        } else {
            self.format_json(metadata.level(), metadata.target(), &visitor.message)
        };

        let mut writer = self.writer.make_writer();
        let _ = writer.write_all(output.as_bytes());
        let _ = writer.write_all(b"\n");
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
            // Remove surrounding quotes from debug format
            if self.message.len() >= 2
                && self.message.starts_with('"')
                && self.message.ends_with('"')
            {
                self.message = self.message[1..self.message.len() - 1].to_string();
            }
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn env_filter(settings: &LoggerSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_tracing_level().to_string()))
}

pub fn setup_logging(settings: &LoggerSettings, session_id: &str) {
    clean_old_logs();

    if settings.use_tracing_format {
        setup_modern_format(settings);
    } else {
        setup_legacy_format(settings, session_id);
    }
}

fn setup_modern_format(settings: &LoggerSettings) {
    let env_filter = env_filter(settings);

    if settings.stdout {
        let format_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_level(true);

        if settings.format == LogFormat::Json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(format_layer.json())
                .init();
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(format_layer.compact())
                .init();
        }
    } else {
        let file_appender = tracing_appender::rolling::daily(user_directory(), "cli.log");
        let format_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_target(true)
            .with_level(true);

        if settings.format == LogFormat::Json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(format_layer.json())
                .init();
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(format_layer.compact())
                .init();
        }
    }
}

fn setup_legacy_format(settings: &LoggerSettings, session_id: &str) {
    let env_filter = env_filter(settings);

    if settings.stdout {
        let legacy_layer = LegacyFormatLayer::new(
            std::io::stdout,
            settings.format.clone(),
            settings.include_session_id,
            session_id.to_string(),
        );

        tracing_subscriber::registry()
            .with(env_filter)
            .with(legacy_layer)
            .init();
    } else {
        let file_appender = tracing_appender::rolling::daily(user_directory(), "cli.log");
        let legacy_layer = LegacyFormatLayer::new(
            file_appender,
            settings.format.clone(),
            settings.include_session_id,
            session_id.to_string(),
        );

        tracing_subscriber::registry()
            .with(env_filter)
            .with(legacy_layer)
            .init();
    }
}
