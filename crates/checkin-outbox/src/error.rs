//! Outbox error types.

use thiserror::Error;

/// Outbox error type.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// Local store error
    #[error("Local store error: {0}")]
    Store(#[from] checkin_local_store::StoreError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;

/// Reasons a check-in cannot be sent as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("energy level {0} is outside 1..=10")]
    EnergyOutOfRange(u8),

    #[error("check-in has neither thoughts nor emotions")]
    Empty,
}
