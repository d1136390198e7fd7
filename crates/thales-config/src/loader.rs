//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, LogFormat, ThalesConfig};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file or string (TOML or JSON)
/// 3. Environment variables, optionally seeded from a `.env` file
///
/// # Example
///
/// ```no_run
/// use thales_config::ConfigLoader;
///
/// # fn main() -> Result<(), thales_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("thales.toml")?
///     .with_env_prefix("THALES")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: ThalesConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ThalesConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = ThalesConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use thales_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = ThalesConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = ThalesConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist, cannot be read,
    /// has an unsupported extension, or does not parse (unknown fields
    /// included).
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`"toml"` or
    /// `"json"`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use thales_config::ConfigLoader;
    /// use thales_core::StrategyKind;
    ///
    /// let toml = r#"
    ///     [binding]
    ///     default_strategy = "passthrough"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.binding.default_strategy, StrategyKind::Passthrough);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `THALES__BINDING__DEFAULT_STRATEGY=passthrough`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory into the environment.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    /// Finalize: apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation
    /// fails.
    pub fn load(mut self) -> Result<ThalesConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: Vec<(String, String)> =
                env::vars().filter(|(k, _)| k.starts_with(&prefix)).collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ThalesConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<ThalesConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        let size = || {
            value
                .parse::<usize>()
                .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
        };
        let flag = || parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"));

        match parts.as_slice() {
            ["BINDING", "DEFAULT_STRATEGY"] => {
                self.config.binding.default_strategy = value
                    .parse()
                    .map_err(|e: thales_core::UnknownStrategy| ConfigError::env_parse_error(key, e.to_string()))?;
            }
            ["BINDING", "MAX_BODY_SIZE"] => self.config.binding.max_body_size = size()?,
            ["BINDING", "HYDRATE_FORM_BODIES"] => self.config.binding.hydrate_form_bodies = flag()?,

            ["MULTIPART", "MAX_BODY_SIZE"] => self.config.multipart.max_body_size = size()?,
            ["MULTIPART", "MAX_FIELD_SIZE"] => self.config.multipart.max_field_size = size()?,
            ["MULTIPART", "MAX_FIELDS"] => self.config.multipart.max_fields = size()?,

            ["LOGGING", "ENABLED"] => self.config.logging.enabled = flag()?,
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => self.config.logging.ansi_enabled = flag()?,
            ["LOGGING", "INCLUDE_LOCATION"] => self.config.logging.include_location = flag()?,

            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
