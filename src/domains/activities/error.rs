//! Activity domain error types.

use std::time::Duration;

use thiserror::Error;

/// Result type for activity operations.
pub type ActivityResult<T> = Result<T, ActivityError>;

/// Errors raised while fetching or extracting the activity listing.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// The listing page could not be retrieved.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// The listing page could not be interpreted at all.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured source is unusable (bad URL, bad header value).
    #[error("Invalid source: {0}")]
    InvalidSource(String),
}

impl ActivityError {
    /// Create a new parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a new invalid source error.
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource(msg.into())
    }
}

/// Reason a single fetch attempt failed.
///
/// Callers may treat all variants alike; the variant is the reason code.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} {reason}")]
    Status { status: u16, reason: String },

    /// Connection, TLS or body read failure.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

impl NetworkError {
    /// Build a status error from a response status code.
    pub fn status(status: reqwest::StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    /// Short machine-readable reason code.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Status { .. } => "bad_status",
            Self::Transport(_) => "transport",
        }
    }
}
