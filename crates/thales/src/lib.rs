//! # Thales
//!
//! **Hybrid model binding for the Themis Platform**
//!
//! Thales populates one typed model from several parts of a request at
//! once: the JSON body, form fields and files, route values, the query
//! string, headers, authenticated claims and any custom source a host
//! registers.
//!
//! - Per-property source annotations with aliases, ranks and strategies
//! - Call-site, class-level and global fallback source orders
//! - Pluggable binding strategies (`FirstInWins`, `Passthrough`)
//! - Provenance: which source supplied every bound property
//! - Resettable body reads, so binding never consumes the payload
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use thales::prelude::*;
//!
//! #[derive(Debug, Default, BindModel)]
//! struct Product {
//!     #[bind(from(Route))]
//!     id: i32,
//!     #[bind(from(Body))]
//!     name: String,
//!     #[bind(from(Header), alias = "x-tenant")]
//!     tenant: Option<String>,
//! }
//!
//! let registry = Arc::new(BindingRegistry::standard(&ThalesConfig::default()));
//! let binder = Binder::<Product>::for_model(registry)?;
//!
//! let bound = binder.bind(&ctx).await?;
//! println!("{:?} bound from {:?}", bound.model, bound.provenance);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! BindingContext → hydrators → base instance → providers → per-property attempts
//!                                                                    ↓
//!                                          Bound { model, provenance } ←┘
//! ```

#![doc(html_root_url = "https://docs.rs/thales/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use thales_core as core;

// Re-export value providers and hydrators
pub use thales_providers as providers;

// Re-export the engine
pub use thales_engine as engine;

// Re-export configuration
pub use thales_config as config;

// Re-export logging setup
pub use thales_telemetry as telemetry;

// Flat re-exports; the derive expands to these paths
pub use thales_core::{
    BindError, BindingContext, Provenance, ProvidesProvenance, SourceId, StrategyKind,
    UploadedFile, GLOBAL_FALLBACK_ORDER,
};
pub use thales_engine::{
    BindAnnotation, BindModel, Binder, BindingRegistry, BindingStrategy, Bound,
    CallSiteBindingSpec, ClassBindingSpec, ModelSchema, Property, SchemaError,
};
pub use thales_macros::BindModel;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use thales::prelude::*;
/// ```
pub mod prelude {
    pub use thales_core::{
        BindError, BindingContext, CancellationFlag, ConversionError, Provenance,
        ProvidesProvenance, SourceId, StrategyKind, UploadedFile,
    };

    pub use thales_engine::{
        BindAnnotation, BindModel, Binder, BindingRegistry, BindingStrategy, Bound,
        CallSiteBindingSpec, ClassBindingSpec, FirstInWins, FromRawValue, ModelSchema,
        Passthrough, Property, SchemaError,
    };

    pub use thales_providers::{BodyHydrator, ValueProvider, ValueProviderFactory};

    pub use thales_config::{ConfigLoader, ThalesConfig};

    // Re-export the derive macro
    pub use thales_macros::BindModel;
}
