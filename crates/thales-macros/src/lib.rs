//! Derive macro for Thales binding schemas.
//!
//! `#[derive(BindModel)]` turns a struct's fields into binding properties
//! and generates an `impl thales::BindModel`.
//!
//! # Example
//!
//! ```rust,ignore
//! use thales::prelude::*;
//!
//! #[derive(Debug, Default, BindModel)]
//! #[bind(sources(Route, QueryString))]
//! struct Product {
//!     #[bind(name = "Id")]
//!     id: i32,
//!     #[bind(from(Header), alias = "x-tenant")]
//!     tenant: Option<String>,
//!     tags: Vec<String>,
//! }
//! ```

mod derive;
mod parse;

use proc_macro::TokenStream;

/// Derives `thales::BindModel` for a struct with named fields.
///
/// # Struct attributes
///
/// - `sources(Route, Header, "Tenant")`: class-level default source order
/// - `factory = path::to::fn`: creates base instances instead of `Default`
/// - `hydrate_body`: deserialize the base instance from the JSON body
///   (requires `serde::Deserialize`)
/// - `no_default`: do not fall back to `Default`
///
/// # Field attributes
///
/// - `from(Route, QueryString)`: an explicit source annotation; `alias`,
///   `rank` and `strategy` in the same attribute belong to it
/// - `alias = "key"`: property-level lookup key
/// - `strategy = "passthrough"`: property-level strategy
/// - `name = "Id"`: property name (defaults to the field name)
/// - `skip`: not bound
/// - `provenance`: a `Provenance` field that receives the provenance map
///
/// Field types decide the shape: `UploadedFile`, `Option<UploadedFile>` and
/// `Vec<UploadedFile>` bind files, other `Vec<_>` fields bind collections
/// and everything else binds a scalar.
#[proc_macro_derive(BindModel, attributes(bind))]
pub fn derive_bind_model(input: TokenStream) -> TokenStream {
    derive::expand_bind_model(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
