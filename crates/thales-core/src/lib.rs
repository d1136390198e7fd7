//! # Thales Core
//!
//! Core types shared by every Thales crate:
//!
//! - [`SourceId`] and [`GLOBAL_FALLBACK_ORDER`] - binding source identifiers
//! - [`BindingContext`] - the per-request view value providers read from
//! - [`RequestBody`] / [`BodyReadScope`] - resettable payload reads
//! - [`RouteValues`], [`Claims`], [`UploadedFile`] - raw request inputs
//! - [`Provenance`] - which source supplied each bound property
//! - [`StrategyKind`] - names of the built-in binding strategies
//! - [`BindError`] / [`ConversionError`] - the error taxonomy

#![doc(html_root_url = "https://docs.rs/thales-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod claims;
mod context;
mod error;
mod file;
mod provenance;
mod route;
mod source;
mod strategy;

pub use claims::{Claim, Claims};
pub use context::{
    BindingContext, BindingContextBuilder, BodyReadScope, CancellationFlag, RequestBody,
};
pub use error::{BindError, BindResult, ConversionError};
pub use file::UploadedFile;
pub use provenance::{Provenance, ProvidesProvenance};
pub use route::RouteValues;
pub use source::{CustomSource, EmptySourceName, SourceId, GLOBAL_FALLBACK_ORDER};
pub use strategy::{StrategyKind, UnknownStrategy};
