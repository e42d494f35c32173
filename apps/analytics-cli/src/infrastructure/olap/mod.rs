use self::clickhouse::errors::ClickhouseError;
use self::clickhouse::model::{ParsedSchema, TableIdentifier};
use self::clickhouse::sql_parser::{parse_create_table_statement, ParseError};

pub mod clickhouse;

#[derive(Debug, thiserror::Error)]
pub enum OlapError {
    #[error("Failed to read the table definition from Clickhouse")]
    Clickhouse(#[from] ClickhouseError),

    #[error("Failed to parse ClickHouse SQL: {0}")]
    ClickhouseSqlParse(#[from] ParseError),
}

/// Trait defining operations that can be performed on an OLAP database
#[async_trait::async_trait]
pub trait OlapOperations: Send + Sync {
    /// Retrieves the `CREATE TABLE` statement of a table
    ///
    /// # Arguments
    ///
    /// * `table` - The table to look up
    /// * `default_database` - Database used when `table` is not qualified
    ///
    /// # Errors
    ///
    /// Returns `OlapError` if the query fails or the table does not exist
    async fn get_create_table_statement(
        &self,
        table: &TableIdentifier,
        default_database: &str,
    ) -> Result<String, OlapError>;

    /// Retrieves a table's DDL and parses it
    async fn get_table(
        &self,
        table: &TableIdentifier,
        default_database: &str,
    ) -> Result<(String, ParsedSchema), OlapError> {
        let statement = self
            .get_create_table_statement(table, default_database)
            .await?;
        let schema = parse_create_table_statement(&statement)?;
        Ok((statement, schema))
    }
}
