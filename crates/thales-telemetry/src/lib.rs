//! Logging setup for Thales.
//!
//! The engine crates only emit `tracing` events. Hosts that do not install
//! their own subscriber can call [`init_logging`] (or [`init_from_config`])
//! once at startup.
//!
//! # Example
//!
//! ```rust,ignore
//! use thales_config::ConfigLoader;
//!
//! let config = ConfigLoader::new().with_env_prefix("THALES").load()?;
//! thales_telemetry::init_from_config(&config.logging)?;
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

use thales_config::LoggingConfig;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging from the `[logging]` configuration section.
///
/// # Errors
///
/// See [`init_logging`].
pub fn init_from_config(config: &LoggingConfig) -> TelemetryResult<()> {
    init_logging(&LogConfig::from(config))
}
