//! Errors raised while preparing the goal store
//!
//! Covers opening the SQLite pool, applying the schema and probing
//! connectivity. Request-time query failures are reported by the services
//! through their own error types.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Failure of a goal store setup step
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The SQLite file could not be opened or created
    #[error("Cannot open SQLite database: {0}")]
    Connection(#[source] SqlxError),

    /// The `SELECT 1` health probe failed on an open pool
    #[error("SQLite health probe failed: {0}")]
    Query(#[source] SqlxError),

    /// A `CREATE TABLE` or `CREATE INDEX` statement was rejected
    #[error("Schema migration failed: {0}")]
    Migration(String),

    /// The database URL or pool settings are unusable
    #[error("Invalid database settings: {0}")]
    Configuration(String),
}

/// Result of a goal store setup step
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failed_step() {
        let error = DatabaseError::Query(SqlxError::PoolClosed);
        assert!(error.to_string().starts_with("SQLite health probe failed"));

        let error = DatabaseError::Configuration("Invalid database URL: bad".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid database settings: Invalid database URL: bad"
        );
    }
}
