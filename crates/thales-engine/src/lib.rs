//! # Thales Engine
//!
//! The binding engine: resolves per-property source metadata, applies
//! binding strategies and populates models from a [`BindingContext`].
//!
//! ## Pipeline
//!
//! ```text
//! BindingContext
//!     │
//!     ├─► body hydrators ──► BodyDocument ──► base instance
//!     │
//!     ├─► value providers (one per referenced source)
//!     │
//!     └─► per property: attempts in resolved order
//!             strategy.attempt? ─► fetch ─► convert ─► assign + provenance
//! ```
//!
//! ## Source order resolution
//!
//! Explicit annotations win. Without them a property falls back to the
//! call-site order, then the class-level order, then
//! [`GLOBAL_FALLBACK_ORDER`](thales_core::GLOBAL_FALLBACK_ORDER).
//!
//! [`BindingContext`]: thales_core::BindingContext

#![doc(html_root_url = "https://docs.rs/thales-engine/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
pub mod coerce;
mod metadata;
mod registry;
mod schema;
mod strategy;

pub use binder::{Binder, Bound};
pub use coerce::{FromRawValue, SourceValue};
pub use metadata::{
    resolve_property, BindAnnotation, CallSiteBindingSpec, ClassBindingSpec, MetadataResolver,
    PropertyBindingSpec, PropertyDescriptor, ResolvedMetadata, SourceAttempt,
};
pub use registry::{BindingRegistry, BindingRegistryBuilder};
pub use schema::{BindModel, ModelSchema, ModelSchemaBuilder, Property, PropertyShape, SchemaError};
pub use strategy::{strategy_for, BindingStrategy, FirstInWins, Passthrough, StrategyRef};
