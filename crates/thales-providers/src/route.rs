//! Route value provider.

use crate::{PairsValueProvider, ValueProvider, ValueProviderFactory};
use async_trait::async_trait;
use thales_core::{BindError, BindingContext, SourceId};

/// Creates providers over the route values captured by the host router.
///
/// # Example
///
/// ```rust
/// use thales_core::BindingContext;
/// use thales_providers::{RouteProviderFactory, ValueProviderFactory};
///
/// # tokio_test::block_on(async {
/// let ctx = BindingContext::builder().route_value("id", "42").build();
/// let provider = RouteProviderFactory.create(&ctx).await.unwrap();
///
/// assert_eq!(provider.get_values("Id"), vec!["42"]);
/// # });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteProviderFactory;

#[async_trait]
impl ValueProviderFactory for RouteProviderFactory {
    fn source(&self) -> SourceId {
        SourceId::Route
    }

    async fn create(&self, ctx: &BindingContext) -> Result<Box<dyn ValueProvider>, BindError> {
        let pairs = ctx
            .route_values()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(Box::new(PairsValueProvider::new(SourceId::Route, pairs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_route_values() {
        let ctx = BindingContext::builder()
            .route_value("productId", "7")
            .route_value("slug", "blue-widget")
            .build();

        let provider = RouteProviderFactory.create(&ctx).await.unwrap();

        assert_eq!(provider.source(), &SourceId::Route);
        assert_eq!(provider.get_values("productid"), vec!["7"]);
        assert_eq!(provider.get_values("slug"), vec!["blue-widget"]);
        assert!(provider.get_values("missing").is_empty());
    }
}
