//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};
use thales_core::StrategyKind;

/// Binding engine configuration section.
///
/// # Example
///
/// ```
/// use thales_config::BindingConfig;
/// use thales_core::StrategyKind;
///
/// let config = BindingConfig::default();
/// assert_eq!(config.default_strategy, StrategyKind::FirstInWins);
/// assert_eq!(config.max_body_size, 1024 * 1024);
/// assert!(!config.hydrate_form_bodies);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    /// Strategy used by properties and attempts without an override.
    #[serde(default)]
    pub default_strategy: StrategyKind,

    /// Maximum JSON body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Also hydrate URL-encoded form bodies into the body document.
    #[serde(default)]
    pub hydrate_form_bodies: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            default_strategy: StrategyKind::default(),
            max_body_size: default_max_body_size(),
            hydrate_form_bodies: false,
        }
    }
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

/// Multipart form limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MultipartConfig {
    /// Maximum total multipart body size in bytes.
    #[serde(default = "default_multipart_body_size")]
    pub max_body_size: usize,

    /// Maximum size of one part in bytes.
    #[serde(default = "default_max_field_size")]
    pub max_field_size: usize,

    /// Maximum number of parts.
    #[serde(default = "default_max_fields")]
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_body_size: default_multipart_body_size(),
            max_field_size: default_max_field_size(),
            max_fields: default_max_fields(),
        }
    }
}

fn default_multipart_body_size() -> usize {
    50 * 1024 * 1024
}

fn default_max_field_size() -> usize {
    10 * 1024 * 1024
}

fn default_max_fields() -> usize {
    100
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
