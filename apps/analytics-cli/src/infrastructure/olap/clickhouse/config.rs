//! # Clickhouse Config
//! Connection settings for the ClickHouse server the DDL is fetched from.

use serde::{Deserialize, Serialize};

/// Database used when neither the settings nor the dbt source name one.
pub const DEFAULT_DATABASE_NAME: &str = "default";

fn default_host() -> String {
    "localhost".to_string()
}

fn default_host_port() -> i32 {
    8123
}

fn default_user() -> String {
    "default".to_string()
}

fn default_db_name() -> String {
    DEFAULT_DATABASE_NAME.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClickHouseConfig {
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default = "default_host")]
    pub host: String, // e.g. localhost
    #[serde(default = "default_host_port")]
    pub host_port: i32, // e.g. 8123
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            db_name: default_db_name(),
            user: default_user(),
            password: String::new(),
            use_ssl: false,
            host: default_host(),
            host_port: default_host_port(),
        }
    }
}

impl ClickHouseConfig {
    /// Returns a display-safe connection URL with the password masked.
    pub fn display_url(&self) -> String {
        let protocol = if self.use_ssl { "https" } else { "http" };
        if self.password.is_empty() {
            format!(
                "{}://{}@{}:{}/?database={}",
                protocol, self.user, self.host, self.host_port, self.db_name
            )
        } else {
            format!(
                "{}://{}:******@{}:{}/?database={}",
                protocol, self.user, self.host, self.host_port, self.db_name
            )
        }
    }
}
