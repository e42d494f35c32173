//! # ClickHouse OLAP Implementation
//!
//! Reads table definitions from a ClickHouse server and parses them into the structures
//! model generation works from.
//!
//! ## Usage Example
//! ```rust
//! let client = create_client(config);
//! let ddl = client.get_create_table_statement(&table, "default").await?;
//! let schema = sql_parser::parse_create_table_statement(&ddl)?;
//! ```

use clickhouse::Client;
use tracing::debug;

use self::errors::ClickhouseError;
use self::model::{ClickHouseTableDefinitionRow, TableIdentifier};
use crate::infrastructure::olap::{OlapError, OlapOperations};

pub mod config;
pub mod errors;
pub mod model;
pub mod sql_parser;
pub mod type_parser;

pub use config::ClickHouseConfig;

#[derive(Clone)]
pub struct ConfiguredDBClient {
    pub client: Client,
    pub config: ClickHouseConfig,
}

/// Creates a configured ClickHouse client with the provided configuration
///
/// # Arguments
/// * `clickhouse_config` - Configuration for the ClickHouse connection
///
/// # Returns
/// * `ConfiguredDBClient` - A configured client ready for database operations
pub fn create_client(clickhouse_config: ClickHouseConfig) -> ConfiguredDBClient {
    let protocol = if clickhouse_config.use_ssl {
        "https"
    } else {
        "http"
    };
    ConfiguredDBClient {
        client: Client::default()
            .with_url(format!(
                "{}://{}:{}",
                protocol, clickhouse_config.host, clickhouse_config.host_port
            ))
            .with_user(clickhouse_config.user.to_string())
            .with_password(clickhouse_config.password.to_string())
            .with_database(clickhouse_config.db_name.to_string()),
        config: clickhouse_config,
    }
}

/// Executes a SQL query against the ClickHouse database
pub async fn run_query(
    query: &str,
    configured_client: &ConfiguredDBClient,
) -> Result<(), clickhouse::error::Error> {
    debug!("Running query: {:?}", query);
    let client = &configured_client.client;
    client.query(query).execute().await
}

/// Checks if the ClickHouse database is ready for operations
///
/// Runs `SELECT version()`, retrying up to 5 times with a 200ms delay when the error
/// looks like a transient network failure.
pub async fn check_ready(
    configured_client: &ConfiguredDBClient,
) -> Result<(), clickhouse::error::Error> {
    let dummy_query = "SELECT version()".to_owned();
    crate::utilities::retry::retry(
        || run_query(&dummy_query, configured_client),
        |i, e| {
            i < 5
                && match e {
                    clickhouse::error::Error::Network(v) => {
                        let err_string = v.to_string();
                        debug!("Network error is {}", err_string);
                        err_string.contains("connection closed before message completed")
                            || err_string.contains("connection error: Connection reset by peer")
                            || err_string
                                .contains("operation was canceled: connection was not ready")
                            || err_string.contains("channel closed")
                    }
                    _ => {
                        debug!("Error is {} instead of network error. Will not retry.", e);
                        false
                    }
                }
        },
        tokio::time::Duration::from_millis(200),
    )
    .await
}

/// Looks up a table's row in `system.tables`.
pub async fn fetch_table_definition(
    configured_client: &ConfiguredDBClient,
    database: &str,
    table: &str,
) -> Result<Option<ClickHouseTableDefinitionRow>, clickhouse::error::Error> {
    let query = "SELECT uuid, database, name, engine, create_table_query FROM system.tables WHERE database = ? AND name = ?";

    let rows = configured_client
        .client
        .query(query)
        .bind(database)
        .bind(table)
        .fetch_all::<ClickHouseTableDefinitionRow>()
        .await?;

    Ok(rows.into_iter().next())
}

#[async_trait::async_trait]
impl OlapOperations for ConfiguredDBClient {
    async fn get_create_table_statement(
        &self,
        table: &TableIdentifier,
        default_database: &str,
    ) -> Result<String, OlapError> {
        let database = table.database_or(default_database);
        let qualified = TableIdentifier::new(Some(database.to_string()), table.table.clone());
        debug!("Fetching DDL for {}", qualified);

        let row = fetch_table_definition(self, database, &table.table)
            .await
            .map_err(|error| ClickhouseError::Client {
                resource: qualified.to_string(),
                error,
            })?;

        match row {
            Some(row) => {
                debug!("Found {} table {} ({})", row.engine, qualified, row.uuid);
                Ok(row.create_table_query)
            }
            None => Err(ClickhouseError::TableNotFound {
                table: qualified.to_string(),
            }
            .into()),
        }
    }
}
