//! Core error types for OptionWatch.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.
//!
//! "No data" is not an error anywhere in this crate: empty results are
//! reported through `Option`/empty collections so callers can tell them
//! apart from a failing collaborator.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

pub use optionwatch_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Forecast failed: {0}")]
    Forecast(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint was violated.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Not yet defined: {0}")]
    Unsupported(String),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Missing configuration key: {0}")]
    MissingKey(String),
}

// === From implementations for common error types ===

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Config(ConfigError::Io(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(ConfigError::Parse(err.to_string()))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_data_error_converts() {
        let err: Error = MarketDataError::SymbolNotFound("ZZZZ".to_string()).into();
        assert!(matches!(err, Error::MarketData(_)));
        assert_eq!(
            err.to_string(),
            "Market data operation failed: Symbol not found: ZZZZ"
        );
    }

    #[test]
    fn test_database_error_display() {
        let err: Error = DatabaseError::NotFound("expiration 7".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Database operation failed: Record not found: expiration 7"
        );
    }

    #[test]
    fn test_unsupported_validation() {
        let err = Error::Validation(ValidationError::Unsupported("put extrinsic value".into()));
        assert_eq!(
            String::from(err),
            "Input validation failed: Not yet defined: put extrinsic value"
        );
    }
}
