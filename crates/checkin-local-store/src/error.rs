//! Local store error types.

use thiserror::Error;

/// Local store error type.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// The backend refused the write (quota, read-only, injected failure).
    #[error("Write rejected: {0}")]
    WriteRejected(String),
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;
