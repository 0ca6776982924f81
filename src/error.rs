//! Error types for retrier
//!
//! The retry loop itself never produces these; it hands back the wrapped
//! operation's own failure. They cover configuration and subscriber setup.

use thiserror::Error;

/// Errors raised while building a [`Retrier`](crate::Retrier) or installing
/// the tracing subscriber.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A retry policy or environment value was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Telemetry initialization error
    #[error("Telemetry initialization error: {0}")]
    TelemetryInit(String),
}

impl Error {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result type for retrier configuration operations
pub type Result<T> = std::result::Result<T, Error>;
