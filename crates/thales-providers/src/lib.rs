//! # Thales Providers
//!
//! Value providers and body hydrators for the Thales model-binding engine.
//!
//! Every binding source is served by a provider created per bind call:
//!
//! | Factory / provider | Source | Description |
//! |--------------------|--------|-------------|
//! | [`RouteProviderFactory`] | `Route` | Values captured by the host router |
//! | [`QueryStringProviderFactory`] | `QueryString` | URL-decoded query pairs |
//! | [`HeaderProviderFactory`] | `Header` | Every value of a header |
//! | [`ClaimProviderFactory`] | `Claim` | Claims of the authenticated principal |
//! | [`FormProviderFactory`] | `Form` | URL-encoded or multipart fields and files |
//! | [`BodyValueProvider`] | `Body` | Typed values from the hydrated body |
//!
//! The body is hydrated by [`BodyHydrator`]s ([`JsonHydrator`],
//! [`FormHydrator`]) into a [`BodyDocument`].
//!
//! ## Example
//!
//! ```rust
//! use thales_core::BindingContext;
//! use thales_providers::{HeaderProviderFactory, ValueProviderFactory};
//!
//! # tokio_test::block_on(async {
//! let ctx = BindingContext::builder().header("x-request-id", "abc").build();
//! let headers = HeaderProviderFactory.create(&ctx).await.unwrap();
//!
//! assert_eq!(headers.get_values("X-Request-Id"), vec!["abc"]);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/thales-providers/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod claim;
mod form;
mod header;
pub mod multipart;
mod provider;
mod query;
mod route;

pub use body::{
    BodyDocument, BodyHydrator, BodyValueProvider, FormHydrator, JsonHydrator,
    DEFAULT_MAX_BODY_SIZE,
};
pub use claim::ClaimProviderFactory;
pub use form::FormProviderFactory;
pub use header::{HeaderProviderFactory, HeaderValueProvider};
pub use multipart::{FormData, MultipartLimits};
pub use provider::{PairsValueProvider, ValueProvider, ValueProviderFactory};
pub use query::QueryStringProviderFactory;
pub use route::RouteProviderFactory;
