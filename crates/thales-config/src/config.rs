//! Main configuration types.
//!
//! This module provides the top-level [`ThalesConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{BindingConfig, ConfigError, LogFormat, LoggingConfig, MultipartConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete Thales configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use thales_config::ThalesConfig;
///
/// let config = ThalesConfig::default();
/// assert_eq!(config.multipart.max_fields, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ThalesConfig {
    /// Binding engine configuration.
    #[serde(default)]
    pub binding: BindingConfig,

    /// Multipart form limits.
    #[serde(default)]
    pub multipart: MultipartConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ThalesConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ThalesConfigBuilder {
        ThalesConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - A size or count limit is zero
    /// - The multipart part limit exceeds the multipart body limit
    /// - The log level is unknown
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.binding.max_body_size == 0 {
            return Err(ConfigError::invalid_value(
                "binding.max_body_size",
                "must be greater than zero",
            ));
        }

        if self.multipart.max_body_size == 0 {
            return Err(ConfigError::invalid_value(
                "multipart.max_body_size",
                "must be greater than zero",
            ));
        }

        if self.multipart.max_fields == 0 {
            return Err(ConfigError::invalid_value(
                "multipart.max_fields",
                "must be greater than zero",
            ));
        }

        if self.multipart.max_field_size == 0
            || self.multipart.max_field_size > self.multipart.max_body_size
        {
            return Err(ConfigError::invalid_value(
                "multipart.max_field_size",
                format!(
                    "must be between 1 and multipart.max_body_size ({})",
                    self.multipart.max_body_size
                ),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown level '{}'", self.logging.level),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, colored debug logs with source locations.
    ///
    /// # Example
    ///
    /// ```
    /// use thales_config::ThalesConfig;
    ///
    /// let config = ThalesConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs at info level.
    ///
    /// # Example
    ///
    /// ```
    /// use thales_config::ThalesConfig;
    ///
    /// let config = ThalesConfig::production();
    /// assert_eq!(config.logging.format, thales_config::LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config
    }
}

/// Builder for [`ThalesConfig`].
#[derive(Debug, Default)]
pub struct ThalesConfigBuilder {
    binding: Option<BindingConfig>,
    multipart: Option<MultipartConfig>,
    logging: Option<LoggingConfig>,
}

impl ThalesConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the binding configuration.
    #[must_use]
    pub fn binding(mut self, binding: BindingConfig) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Set the multipart configuration.
    #[must_use]
    pub fn multipart(mut self, multipart: MultipartConfig) -> Self {
        self.multipart = Some(multipart);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> ThalesConfig {
        ThalesConfig {
            binding: self.binding.unwrap_or_default(),
            multipart: self.multipart.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ThalesConfig::default().validate().is_ok());
        assert!(ThalesConfig::development().validate().is_ok());
        assert!(ThalesConfig::production().validate().is_ok());
    }

    #[test]
    fn test_zero_body_size_invalid() {
        let config = ThalesConfig::builder()
            .binding(BindingConfig {
                max_body_size: 0,
                ..Default::default()
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("binding.max_body_size"));
    }

    #[test]
    fn test_field_larger_than_body_invalid() {
        let config = ThalesConfig::builder()
            .multipart(MultipartConfig {
                max_body_size: 10,
                max_field_size: 20,
                max_fields: 1,
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("multipart.max_field_size"));
    }

    #[test]
    fn test_unknown_log_level_invalid() {
        let mut config = ThalesConfig::default();
        config.logging.level = "verbose".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<ThalesConfig, _> = toml::from_str("[server]\nport = 1");
        assert!(result.is_err());
    }
}
