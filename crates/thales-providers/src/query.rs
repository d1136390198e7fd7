//! Query string value provider.

use crate::{PairsValueProvider, ValueProvider, ValueProviderFactory};
use async_trait::async_trait;
use thales_core::{BindError, BindingContext, SourceId};

/// Creates providers over the URL query string.
///
/// Repeated keys are preserved in order, so `?tag=a&tag=b` yields
/// `["a", "b"]` for `tag`.
///
/// # Example
///
/// ```rust
/// use http::Uri;
/// use thales_core::BindingContext;
/// use thales_providers::{QueryStringProviderFactory, ValueProviderFactory};
///
/// # tokio_test::block_on(async {
/// let ctx = BindingContext::builder()
///     .uri(Uri::from_static("/items?tag=a&tag=b&q=hello+world"))
///     .build();
/// let provider = QueryStringProviderFactory.create(&ctx).await.unwrap();
///
/// assert_eq!(provider.get_values("tag"), vec!["a", "b"]);
/// assert_eq!(provider.get_values("q"), vec!["hello world"]);
/// # });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryStringProviderFactory;

/// Decodes `application/x-www-form-urlencoded` pairs, keeping repeated keys.
pub(crate) fn decode_pairs(encoded: &str) -> Result<Vec<(String, String)>, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(encoded).map_err(|e| e.to_string())
}

#[async_trait]
impl ValueProviderFactory for QueryStringProviderFactory {
    fn source(&self) -> SourceId {
        SourceId::QueryString
    }

    async fn create(&self, ctx: &BindingContext) -> Result<Box<dyn ValueProvider>, BindError> {
        let query = ctx.query_string().unwrap_or("");

        let pairs = match decode_pairs(query) {
            Ok(pairs) => pairs,
            Err(reason) => {
                tracing::debug!(%reason, "ignoring undecodable query string");
                Vec::new()
            }
        };

        Ok(Box::new(PairsValueProvider::new(SourceId::QueryString, pairs)))
    }
}
