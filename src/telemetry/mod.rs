//! Telemetry and tracing utilities
//!
//! Installs the process-wide tracing subscriber, including the warning
//! suppression filter. Call once at startup, before the first retry.
//!
//! ## Example
//!
//! ```rust,no_run
//! use retrier::telemetry::{init_subscriber, OutputFormat, SubscriberConfig, WarningSuppression};
//!
//! # fn main() -> retrier::Result<()> {
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::INFO)
//!     .output_format(OutputFormat::Json)
//!     .suppress_warnings(WarningSuppression::targets(["hyper", "h2"]))
//!     .build();
//! init_subscriber(config)?;
//! # Ok(())
//! # }
//! ```

use std::sync::OnceLock;
use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::defaults;
use crate::error::{Error, Result};

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON, one object per line
    Json,
    /// JSON with event fields flattened into the top-level object
    JsonCompact,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            other => Err(Error::TelemetryInit(format!(
                "Invalid log format: {other}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Which warnings are silenced process-wide.
///
/// Suppressing a target raises its minimum level to ERROR, so WARN and
/// anything more verbose from it is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WarningSuppression {
    /// Keep all warnings
    #[default]
    None,
    /// Drop warnings from every target
    All,
    /// Drop warnings from the listed targets (module path prefixes)
    Targets(Vec<String>),
}

impl WarningSuppression {
    pub fn targets<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Targets(targets.into_iter().map(Into::into).collect())
    }

    /// Parse `all`, `none`, or a comma-separated target list.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        if value.is_empty() || value.eq_ignore_ascii_case("none") {
            return Self::None;
        }
        Self::targets(
            value
                .split(',')
                .map(str::trim)
                .filter(|target| !target.is_empty()),
        )
    }

    fn directives(&self) -> Vec<String> {
        match self {
            Self::None | Self::All => Vec::new(),
            Self::Targets(targets) => targets
                .iter()
                .map(|target| format!("{target}=error"))
                .collect(),
        }
    }
}

/// Configuration for tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Log level
    pub log_level: tracing::Level,
    /// Output format
    pub output_format: OutputFormat,
    /// Warnings to silence
    pub warnings: WarningSuppression,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            warnings: WarningSuppression::None,
        }
    }
}

impl SubscriberConfig {
    /// Create a new builder for SubscriberConfig
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Build from the `RETRIER_*` environment variables
    ///
    /// Supported environment variables:
    /// - `RETRIER_LOG_LEVEL`: Log level (trace, debug, info, warn, error)
    /// - `RETRIER_LOG_FORMAT`: Output format (text, json, json-compact)
    /// - `RETRIER_SUPPRESS_WARNINGS`: `all` or comma-separated targets
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SubscriberConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(level) = lookup(defaults::env::LOG_LEVEL) {
            builder = builder.log_level_str(&level)?;
        }
        if let Some(format) = lookup(defaults::env::LOG_FORMAT) {
            builder = builder.output_format(OutputFormat::parse(&format)?);
        }
        if let Some(targets) = lookup(defaults::env::SUPPRESS_WARNINGS) {
            builder = builder.suppress_warnings(WarningSuppression::parse(&targets));
        }

        Ok(builder.build())
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    warnings: Option<WarningSuppression>,
}

impl SubscriberConfigBuilder {
    /// Set the log level
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self> {
        let level = match level.trim().to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => {
                return Err(Error::TelemetryInit(format!(
                    "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
                )));
            }
        };
        self.log_level = Some(level);
        Ok(self)
    }

    /// Set the output format
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Set which warnings are silenced
    pub fn suppress_warnings(mut self, warnings: WarningSuppression) -> Self {
        self.warnings = Some(warnings);
        self
    }

    /// Build the configuration
    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            warnings: self.warnings.unwrap_or_default(),
        }
    }
}

/// Build the level filter `init_subscriber` installs.
pub fn build_filter(config: &SubscriberConfig) -> Result<EnvFilter> {
    let mut level = LevelFilter::from_level(config.log_level);
    if config.warnings == WarningSuppression::All {
        level = level.min(LevelFilter::ERROR);
    }

    let directives = std::iter::once(level.to_string())
        .chain(config.warnings.directives())
        .collect::<Vec<_>>()
        .join(",");

    EnvFilter::builder()
        .parse(&directives)
        .map_err(|e| Error::TelemetryInit(format!("Invalid filter {directives:?}: {e}")))
}

/// Install the global tracing subscriber.
///
/// `log` records are bridged into tracing when no `log` logger is set yet.
/// A logger installed earlier by the host is kept and does not fail the call.
///
/// ## Returns
///
/// - `Ok(true)` when this call installed the subscriber
/// - `Ok(false)` when a subscriber was already installed; the existing one is
///   left untouched
/// - `Err(Error::TelemetryInit)` if the filter is invalid
pub fn init_subscriber(config: SubscriberConfig) -> Result<bool> {
    if INSTALLED.get().is_some() {
        return Ok(false);
    }

    let filter = build_filter(&config)?;

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.output_format {
        OutputFormat::Json => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .json()
                .finish(),
        ),
        OutputFormat::JsonCompact => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .json()
                .flatten_event(true)
                .finish(),
        ),
        OutputFormat::Text => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .finish(),
        ),
    };

    let installed = tracing::subscriber::set_global_default(subscriber).is_ok();
    // Either we installed it or the host did; both count as done
    let _ = INSTALLED.set(());

    if installed {
        if let Err(e) = tracing_log::LogTracer::init() {
            tracing::debug!(error = %e, "log records not bridged, a logger is already set");
        }
    }

    Ok(installed)
}

/// Initialize tracing subscriber with default configuration
pub fn init_default() -> Result<bool> {
    init_subscriber(SubscriberConfig::default())
}

/// Initialize tracing subscriber from environment variables
pub fn init_from_env() -> Result<bool> {
    init_subscriber(SubscriberConfig::from_env()?)
}
