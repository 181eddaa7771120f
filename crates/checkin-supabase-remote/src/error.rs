//! Error types for Supabase check-in operations.

use crate::client::classify_status;
use checkin_outbox::{RemoteError, RemoteErrorKind};
use thiserror::Error;

/// Error type for Supabase check-in requests.
#[derive(Debug, Error)]
pub enum SupabaseRemoteError {
    /// Network or transport-level HTTP error from reqwest.
    ///
    /// Includes connection failures, timeouts, and TLS errors.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Supabase API returned a non-success HTTP status.
    #[error("Supabase error: {status} - {message}")]
    Supabase {
        /// The HTTP status code returned by Supabase.
        status: u16,
        /// The response body, typically containing error details.
        message: String,
    },

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No access token; the user is signed out.
    #[error("not logged in")]
    NotLoggedIn,

    /// Configuration or initialization error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience Result type alias for Supabase check-in operations.
pub type SupabaseRemoteResult<T> = Result<T, SupabaseRemoteError>;

impl SupabaseRemoteError {
    /// The retry class of this failure.
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::Http(e) if e.is_timeout() => RemoteErrorKind::Timeout,
            Self::Http(e) if e.is_connect() || e.is_request() => RemoteErrorKind::Network,
            Self::Http(e) if e.is_builder() => RemoteErrorKind::InvalidPayload,
            Self::Http(_) => RemoteErrorKind::Unknown,
            Self::Supabase { status, message } => classify_status(*status, message),
            Self::Json(_) => RemoteErrorKind::InvalidPayload,
            Self::NotLoggedIn => RemoteErrorKind::Unauthenticated,
            Self::Config(_) => RemoteErrorKind::Unknown,
        }
    }
}

impl From<SupabaseRemoteError> for RemoteError {
    fn from(err: SupabaseRemoteError) -> Self {
        RemoteError::new(err.kind(), err.to_string())
    }
}
