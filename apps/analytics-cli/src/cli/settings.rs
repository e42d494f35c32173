//! # Settings
//!
//! CLI settings are read from `config.toml` in the user directory (`~/.analytics` unless
//! `ANALYTICS_HOME` points elsewhere) and overlaid with `ANALYTICS_*` environment variables,
//! using `__` to reach nested keys:
//!
//! ```bash
//! ANALYTICS_CLICKHOUSE__HOST=clickhouse.internal
//! ANALYTICS_CODEGEN__PRIMARY_KEY_POLICY=extend_with_version
//! ANALYTICS_LOGGER__LEVEL=debug
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use super::logger::LoggerSettings;
use crate::framework::python::sqlmodel::{CodegenOptions, PrimaryKeyPolicy};
use crate::infrastructure::olap::clickhouse::config::ClickHouseConfig;
use crate::utilities::constants::{
    CLI_CONFIG_FILE, CLI_USER_DIRECTORY, ENVIRONMENT_VARIABLE_PREFIX, ENV_USER_DIRECTORY,
};

const CONFIG_FILE_TEMPLATE: &str = r#"# analytics-cli configuration
#
# Every key can also be set through the environment, e.g. ANALYTICS_CLICKHOUSE__HOST

[logger]
# DEBUG, INFO, WARN or ERROR
level = "INFO"
stdout = false
# Text or Json
format = "Text"

[clickhouse]
host = "localhost"
host_port = 8123
user = "default"
password = ""
db_name = "default"
use_ssl = false

[codegen]
random_seed = 0
# declared or extend_with_version
primary_key_policy = "declared"
"#;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CodegenSettings {
    #[serde(default)]
    pub random_seed: u64,
    #[serde(default)]
    pub primary_key_policy: PrimaryKeyPolicy,
}

impl CodegenSettings {
    pub fn options(&self) -> CodegenOptions {
        CodegenOptions {
            random_seed: self.random_seed,
            primary_key_policy: self.primary_key_policy,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub logger: LoggerSettings,
    #[serde(default)]
    pub clickhouse: ClickHouseConfig,
    #[serde(default)]
    pub codegen: CodegenSettings,
}

pub fn user_directory() -> PathBuf {
    if let Some(dir) = env::var_os(ENV_USER_DIRECTORY).filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }

    match home::home_dir() {
        Some(home) => home.join(CLI_USER_DIRECTORY),
        None => PathBuf::from(CLI_USER_DIRECTORY),
    }
}

pub fn config_path() -> PathBuf {
    user_directory().join(CLI_CONFIG_FILE)
}

pub fn setup_user_directory() -> std::io::Result<()> {
    std::fs::create_dir_all(user_directory())
}

/// Writes the commented default config file on first run.
pub fn init_config_file() -> std::io::Result<()> {
    let path = config_path();
    if !path.exists() {
        std::fs::write(path, CONFIG_FILE_TEMPLATE)?;
    }
    Ok(())
}

fn environment_source() -> Environment {
    Environment::with_prefix(ENVIRONMENT_VARIABLE_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

pub fn read_settings() -> Result<Settings, ConfigError> {
    Config::builder()
        .add_source(File::from(config_path()).required(false))
        .add_source(environment_source())
        .build()?
        .try_deserialize()
}
