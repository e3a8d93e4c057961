//! Error types for the database client

use pollcal_common::PollcalError;
use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// Error sealing a secret before storage
    #[error("Encryption error: {0}")]
    EncryptionError(String),
}

impl From<DbError> for PollcalError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConfigError(msg) => PollcalError::ConfigError(msg),
            other => PollcalError::DatabaseError(other.to_string()),
        }
    }
}
