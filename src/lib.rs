//! retrier
//!
//! Retries a single asynchronous operation with exponential backoff, and
//! installs the process-wide log filter (including warning suppression) at
//! startup.
//!
//! ```rust,no_run
//! use retrier::{QualifyingFailures, Retrier, RetryPolicy};
//!
//! # #[derive(Debug)] struct Timeout;
//! # impl std::fmt::Display for Timeout {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str("timeout") }
//! # }
//! # impl std::error::Error for Timeout {}
//! # async fn fetch() -> Result<u32, Timeout> { Ok(1) }
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Default policy: 3 attempts, factor 2.0, every failure qualifies.
//! let value = retrier::retry(|| fetch()).await?;
//!
//! // Custom policy, only retry when the predicate matches.
//! let retrier = Retrier::new(RetryPolicy::new().with_max_retries(5))?
//!     .with_qualifying(QualifyingFailures::matching(|_: &Timeout| true));
//! let value = retrier.execute(|| fetch()).await?;
//! # let _ = value;
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]

pub mod defaults;
pub mod error;
pub mod retry;
pub mod telemetry;

pub use error::{Error, Result};
pub use retry::{FailureKind, QualifyingFailures, Retrier, RetryPolicy, retry, retry_on};
pub use telemetry::{OutputFormat, SubscriberConfig, WarningSuppression, init_subscriber};
