//! Retry module (ergonomic namespace)
//! - policy.rs: attempt bound and exponential delay schedule
//! - qualify.rs: which failures are eligible for another attempt
//! - retrier.rs: the retry loop and the free `retry` helpers

pub mod policy;
pub mod qualify;
pub mod retrier;

pub use policy::RetryPolicy;
pub use qualify::{FailureKind, QualifyingFailures};
pub use retrier::{Retrier, retry, retry_on};
