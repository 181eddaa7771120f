//! Remote failure classification.
//!
//! A failed remote write is either worth keeping in the queue (the network
//! or server may recover) or permanently doomed (bad credentials, bad
//! data). Permanent failures are dropped so they never block the operations
//! queued behind them.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Closed set of remote failure causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// No session, or the session was rejected.
    Unauthenticated,
    /// Authenticated but not allowed (row-level security, forbidden).
    PermissionDenied,
    /// Token malformed or expired.
    InvalidToken,
    /// Unique/foreign-key/check constraint rejected the row.
    ConstraintViolation,
    /// The payload shape was rejected.
    InvalidPayload,
    /// Could not reach the remote store.
    Network,
    Timeout,
    RateLimited,
    /// 5xx or equivalent.
    Server,
    /// Anything unrecognized.
    Unknown,
}

impl RemoteErrorKind {
    /// Whether an operation failing this way should stay queued.
    pub fn is_retryable(self) -> bool {
        match self {
            Self::Unauthenticated
            | Self::PermissionDenied
            | Self::InvalidToken
            | Self::ConstraintViolation
            | Self::InvalidPayload => false,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Server | Self::Unknown => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::PermissionDenied => "permission_denied",
            Self::InvalidToken => "invalid_token",
            Self::ConstraintViolation => "constraint_violation",
            Self::InvalidPayload => "invalid_payload",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::Server => "server",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a remote check-in store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build an error whose kind is inferred from the message text.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify_message(&message),
            message,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Result type alias using RemoteError.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Permanent markers are checked before transient ones.
const MESSAGE_MARKERS: &[(&str, RemoteErrorKind)] = &[
    ("not logged in", RemoteErrorKind::Unauthenticated),
    ("not authenticated", RemoteErrorKind::Unauthenticated),
    ("invalid token", RemoteErrorKind::InvalidToken),
    ("jwt", RemoteErrorKind::InvalidToken),
    ("unauthorized", RemoteErrorKind::Unauthenticated),
    ("forbidden", RemoteErrorKind::PermissionDenied),
    ("permission", RemoteErrorKind::PermissionDenied),
    ("violates", RemoteErrorKind::ConstraintViolation),
    ("constraint", RemoteErrorKind::ConstraintViolation),
    ("invalid input", RemoteErrorKind::InvalidPayload),
    ("invalid payload", RemoteErrorKind::InvalidPayload),
    ("invalid shape", RemoteErrorKind::InvalidPayload),
    ("malformed", RemoteErrorKind::InvalidPayload),
    ("timed out", RemoteErrorKind::Timeout),
    ("timeout", RemoteErrorKind::Timeout),
    ("rate limit", RemoteErrorKind::RateLimited),
    ("too many requests", RemoteErrorKind::RateLimited),
    ("failed to fetch", RemoteErrorKind::Network),
    ("network", RemoteErrorKind::Network),
    ("connection", RemoteErrorKind::Network),
];

/// Infer a failure kind from free-form error text.
///
/// Case-insensitive substring match. `-` and `_` count as spaces, so error
/// codes like `invalid_token` match the same marker as the prose form.
/// Unrecognized text is [`RemoteErrorKind::Unknown`], which is retryable.
pub fn classify_message(message: &str) -> RemoteErrorKind {
    let normalized = message.to_lowercase().replace(['-', '_'], " ");
    MESSAGE_MARKERS
        .iter()
        .find(|(marker, _)| normalized.contains(marker))
        .map(|(_, kind)| *kind)
        .unwrap_or(RemoteErrorKind::Unknown)
}

/// Whether an operation that failed with `message` should stay queued.
pub fn should_retry(message: &str) -> bool {
    classify_message(message).is_retryable()
}
