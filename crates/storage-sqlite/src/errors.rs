//! Storage-specific error types for SQLite operations.
//!
//! Diesel and r2d2 errors stay inside this crate; callers only ever see the
//! database-agnostic `optionwatch_core::Error`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use optionwatch_core::errors::{DatabaseError, Error};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value that no longer parses into its domain type
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("{0}")]
    CoreError(Error),
}

/// Lets a writer job fail with a core error inside a Diesel transaction.
impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::CoreError(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::PoolError(e) => {
                Error::Database(DatabaseError::PoolCreationFailed(e.to_string()))
            }
            StorageError::QueryFailed(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => Error::Database(DatabaseError::UniqueViolation(info.message().to_string())),
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                info,
            )) => Error::Database(DatabaseError::ForeignKeyViolation(
                info.message().to_string(),
            )),
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::MigrationFailed(e) => Error::Database(DatabaseError::MigrationFailed(e)),
            StorageError::CorruptRow(e) => Error::Database(DatabaseError::Internal(e)),
            StorageError::CoreError(e) => e,
        }
    }
}

/// `.into_core()` on Diesel and r2d2 results.
pub trait IntoCore<T> {
    fn into_core(self) -> optionwatch_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> optionwatch_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> optionwatch_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}
