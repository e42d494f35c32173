#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClickhouseError {
    #[error("Clickhouse - Invalid {identifier_type}: '{name}' - {reason}")]
    InvalidIdentifier {
        identifier_type: String,
        name: String,
        reason: String,
    },
    #[error("Clickhouse - Table {table} does not exist")]
    TableNotFound { table: String },
    #[error("Clickhouse - Query failed for '{resource}'")]
    Client {
        resource: String,
        #[source]
        error: clickhouse::error::Error,
    },
}

/// Checks if a string is a valid unquoted ClickHouse identifier.
///
/// ClickHouse identifiers (database names, table names, cluster names, etc.) must:
/// - Be non-empty
/// - Contain only alphanumeric characters and underscores
/// - Not start with a digit
///
/// Names that break these rules are still legal when backtick-quoted.
pub fn is_valid_clickhouse_identifier(name: &str) -> bool {
    match name.chars().next() {
        Some(first) => {
            !first.is_ascii_digit() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Validates that a string is a valid ClickHouse identifier, returning a typed error on failure.
pub fn validate_clickhouse_identifier(
    name: &str,
    identifier_type: &str,
) -> Result<(), ClickhouseError> {
    if is_valid_clickhouse_identifier(name) {
        return Ok(());
    }

    let reason = if name.is_empty() {
        "cannot be empty"
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        "cannot start with a digit"
    } else {
        "contains invalid characters (only alphanumeric and underscore allowed)"
    };

    Err(ClickhouseError::InvalidIdentifier {
        identifier_type: identifier_type.to_string(),
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(is_valid_clickhouse_identifier("events"));
        assert!(is_valid_clickhouse_identifier("_peerdb_raw"));
        assert!(is_valid_clickhouse_identifier("table_2024"));
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(!is_valid_clickhouse_identifier(""));
        assert!(!is_valid_clickhouse_identifier("2024_events"));
        assert!(!is_valid_clickhouse_identifier("events; DROP TABLE users"));
        assert!(!is_valid_clickhouse_identifier("my-table"));
    }

    #[test]
    fn test_validate_reports_reason() {
        match validate_clickhouse_identifier("1abc", "table") {
            Err(ClickhouseError::InvalidIdentifier { reason, .. }) => {
                assert_eq!(reason, "cannot start with a digit")
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(validate_clickhouse_identifier("events", "table").is_ok());
    }
}
