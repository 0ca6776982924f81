//! Default Configuration Values
//!
//! Centralizes the defaults used by the retry policy and the subscriber setup.

use std::time::Duration;

/// Retry policy defaults
pub mod retry {
    use super::*;

    /// Maximum number of attempts, counting the first one
    pub const MAX_RETRIES: u32 = 3;

    /// Base of the exponential delay
    pub const BACKOFF_FACTOR: f64 = 2.0;

    /// One "time unit": the delay before the first retry
    pub const BASE_DELAY: Duration = Duration::from_secs(1);

    /// Jitter spread used when jitter is switched on
    pub const JITTER_FACTOR: f64 = 0.1;
}

/// Environment variable names
pub mod env {
    pub const MAX_RETRIES: &str = "RETRIER_MAX_RETRIES";
    pub const BACKOFF_FACTOR: &str = "RETRIER_BACKOFF_FACTOR";
    pub const BASE_DELAY_MS: &str = "RETRIER_BASE_DELAY_MS";
    pub const MAX_DELAY_MS: &str = "RETRIER_MAX_DELAY_MS";
    pub const JITTER: &str = "RETRIER_JITTER";

    pub const LOG_LEVEL: &str = "RETRIER_LOG_LEVEL";
    pub const LOG_FORMAT: &str = "RETRIER_LOG_FORMAT";
    pub const SUPPRESS_WARNINGS: &str = "RETRIER_SUPPRESS_WARNINGS";
}
