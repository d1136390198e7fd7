//! Header value provider.

use crate::{ValueProvider, ValueProviderFactory};
use async_trait::async_trait;
use http::{HeaderMap, HeaderName};
use thales_core::{BindError, BindingContext, SourceId};

/// Provider over the request headers.
///
/// Header names are case-insensitive. Every occurrence of a header yields one
/// value, trimmed of surrounding whitespace; values that are not visible
/// ASCII are skipped.
#[derive(Debug, Clone)]
pub struct HeaderValueProvider {
    source: SourceId,
    headers: HeaderMap,
}

impl HeaderValueProvider {
    /// Creates a provider over `headers`.
    #[must_use]
    pub fn new(headers: HeaderMap) -> Self {
        Self {
            source: SourceId::Header,
            headers,
        }
    }
}

impl ValueProvider for HeaderValueProvider {
    fn source(&self) -> &SourceId {
        &self.source
    }

    fn get_values(&self, key: &str) -> Vec<String> {
        let Ok(name) = HeaderName::from_bytes(key.as_bytes()) else {
            return Vec::new();
        };

        self.headers
            .get_all(&name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .collect()
    }
}

/// Creates [`HeaderValueProvider`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderProviderFactory;

#[async_trait]
impl ValueProviderFactory for HeaderProviderFactory {
    fn source(&self) -> SourceId {
        SourceId::Header
    }

    async fn create(&self, ctx: &BindingContext) -> Result<Box<dyn ValueProvider>, BindError> {
        Ok(Box::new(HeaderValueProvider::new(ctx.headers().clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(items: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in items {
            map.append(*name, value.parse().unwrap());
        }
        map
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let provider = HeaderValueProvider::new(headers(&[("x-request-id", "abc-123")]));

        assert_eq!(provider.get_values("X-Request-Id"), vec!["abc-123"]);
        assert_eq!(provider.get_values("x-request-id"), vec!["abc-123"]);
    }

    #[test]
    fn test_repeated_headers() {
        let provider = HeaderValueProvider::new(headers(&[("x-tag", "a"), ("x-tag", " b ")]));
        assert_eq!(provider.get_values("x-tag"), vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_name_yields_nothing() {
        let provider = HeaderValueProvider::new(headers(&[("x-tag", "a")]));
        assert!(provider.get_values("not a header").is_empty());
        assert!(provider.get_values("").is_empty());
    }

    #[test]
    fn test_missing_header() {
        let provider = HeaderValueProvider::new(HeaderMap::new());
        assert!(provider.get_values("accept").is_empty());
    }

    #[tokio::test]
    async fn test_factory_copies_context_headers() {
        let ctx = BindingContext::builder().header("foo", "bar").build();
        let provider = HeaderProviderFactory.create(&ctx).await.unwrap();

        assert_eq!(provider.source(), &SourceId::Header);
        assert_eq!(provider.get_values("Foo"), vec!["bar"]);
    }
}
