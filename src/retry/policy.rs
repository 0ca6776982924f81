//! Retry Policy
//!
//! Attempt bound plus the exponential delay schedule, with an optional cap
//! and optional jitter.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::defaults;
use crate::error::{Error, Result};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts, counting the first one
    pub max_retries: u32,
    /// Base of the exponential delay
    pub backoff_factor: f64,
    /// Delay before the first retry; later delays are multiples of it
    pub base_delay: Duration,
    /// Upper bound applied to every computed delay
    pub max_delay: Option<Duration>,
    /// Whether to add jitter to delays
    pub use_jitter: bool,
    /// Maximum jitter percentage (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::retry::MAX_RETRIES,
            backoff_factor: defaults::retry::BACKOFF_FACTOR,
            base_delay: defaults::retry::BASE_DELAY,
            max_delay: None,
            use_jitter: false,
            jitter_factor: defaults::retry::JITTER_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum attempts
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set backoff factor
    pub const fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the delay unit
    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set maximum delay
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Enable or disable jitter
    pub const fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    /// Set jitter factor
    pub const fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Reject policies the retry loop cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::invalid_config("max_retries must be at least 1"));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor <= 0.0 {
            return Err(Error::invalid_config(format!(
                "backoff_factor must be a positive finite number, got {}",
                self.backoff_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(Error::invalid_config(format!(
                "jitter_factor must be within 0.0..=1.0, got {}",
                self.jitter_factor
            )));
        }
        Ok(())
    }

    /// Delay to wait before the `retry`-th retry (1-based).
    ///
    /// Without jitter or cap this is `base_delay * backoff_factor^(retry - 1)`,
    /// so the first retry always waits exactly one `base_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let mut delay = if secs.is_nan() {
            Duration::ZERO
        } else {
            // Overflow saturates; underflow lands on zero
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        };

        if let Some(max_delay) = self.max_delay {
            delay = delay.min(max_delay);
        }

        if self.use_jitter {
            self.add_jitter(delay)
        } else {
            delay
        }
    }

    /// Add jitter to a delay
    fn add_jitter(&self, delay: Duration) -> Duration {
        if delay.is_zero() {
            return delay;
        }
        let mut rng = rand::thread_rng();
        let secs = delay.as_secs_f64();
        let jitter_range = secs * self.jitter_factor.clamp(0.0, 1.0);
        let jitter = rng.gen_range(-jitter_range..=jitter_range);

        Duration::try_from_secs_f64((secs + jitter).max(0.0)).unwrap_or(delay)
    }

    /// Build a policy from the `RETRIER_*` environment variables, falling back
    /// to defaults for anything unset.
    ///
    /// Supported environment variables:
    /// - `RETRIER_MAX_RETRIES`: attempt bound
    /// - `RETRIER_BACKOFF_FACTOR`: exponential base
    /// - `RETRIER_BASE_DELAY_MS`: delay unit in milliseconds
    /// - `RETRIER_MAX_DELAY_MS`: delay cap in milliseconds
    /// - `RETRIER_JITTER`: `true`/`false`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RetryPolicy::from_env`], reading values through `lookup`.
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut policy = Self::default();

        if let Some(value) = lookup(defaults::env::MAX_RETRIES) {
            policy.max_retries = parse_var(defaults::env::MAX_RETRIES, &value)?;
        }
        if let Some(value) = lookup(defaults::env::BACKOFF_FACTOR) {
            policy.backoff_factor = parse_var(defaults::env::BACKOFF_FACTOR, &value)?;
        }
        if let Some(value) = lookup(defaults::env::BASE_DELAY_MS) {
            policy.base_delay =
                Duration::from_millis(parse_var(defaults::env::BASE_DELAY_MS, &value)?);
        }
        if let Some(value) = lookup(defaults::env::MAX_DELAY_MS) {
            policy.max_delay = Some(Duration::from_millis(parse_var(
                defaults::env::MAX_DELAY_MS,
                &value,
            )?));
        }
        if let Some(value) = lookup(defaults::env::JITTER) {
            policy.use_jitter = parse_var(defaults::env::JITTER, &value)?;
        }

        policy.validate()?;
        Ok(policy)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::invalid_config(format!("{key}={value:?}: {e}")))
}
