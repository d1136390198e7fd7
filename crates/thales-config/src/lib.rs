//! Typed configuration for Thales.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! [binding]
//! default_strategy = "first_in_wins"
//! max_body_size = 1048576
//! hydrate_form_bodies = false
//!
//! [multipart]
//! max_body_size = 52428800
//! max_field_size = 10485760
//! max_fields = 100
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every value can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `THALES__BINDING__DEFAULT_STRATEGY=passthrough`
//! - `THALES__MULTIPART__MAX_FIELDS=20`
//! - `THALES__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{ThalesConfig, ThalesConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{BindingConfig, LogFormat, LoggingConfig, MultipartConfig};
