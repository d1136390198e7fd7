//! Structured logging for Thales.
//!
//! The engine emits `tracing` events: a `bind` span per bind call, `debug`
//! events for hydration and unmatched properties, `trace` events per source
//! attempt and `warn` events for unserved sources. This module installs a
//! `tracing-subscriber` that renders them as JSON or pretty text.
//!
//! # Example
//!
//! ```rust,ignore
//! use thales_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::info!(model = "Product", "binder ready");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use thales_config::{LogFormat, LoggingConfig};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g. "info", "thales_engine=trace").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to emit ANSI colors (pretty format only).
    pub ansi: bool,

    /// Whether to include span open/close events.
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            ansi: false,
            span_events: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            ansi: true,
            span_events: true,
            file_line_info: true,
            include_target: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            format: config.format,
            ansi: config.ansi_enabled,
            span_events: false,
            file_line_info: config.include_location,
            include_target: true,
        }
    }
}

/// Initializes the global logging subscriber.
///
/// Does nothing when `config.enabled` is false.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a bad filter directive and
/// [`TelemetryError::LoggingInit`] if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_events(span_events)
                .with_file(config.file_line_info)
                .with_line_number(config.file_line_info)
                .with_target(config.include_target)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_ansi(config.ansi)
                .with_span_events(span_events)
                .with_file(config.file_line_info)
                .with_line_number(config.file_line_info)
                .with_target(config.include_target)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
        }
    }

    Ok(())
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}

/// Field names used by the engine's log events.
pub mod fields {
    /// Model type name.
    pub const MODEL: &str = "model";

    /// Call-site name.
    pub const CALL_SITE: &str = "call_site";

    /// Property name.
    pub const PROPERTY: &str = "property";

    /// Binding source.
    pub const SOURCE: &str = "source";

    /// Lookup key.
    pub const KEY: &str = "key";

    /// Strategy name.
    pub const STRATEGY: &str = "strategy";

    /// Hydrator name.
    pub const HYDRATOR: &str = "hydrator";

    /// Error field name.
    pub const ERROR: &str = "error";
}
