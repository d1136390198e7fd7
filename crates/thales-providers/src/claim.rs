//! Claim value provider.

use crate::{PairsValueProvider, ValueProvider, ValueProviderFactory};
use async_trait::async_trait;
use thales_core::{BindError, BindingContext, SourceId};

/// Creates providers over the claims of the authenticated principal.
///
/// Keys are claim types; every claim of a type contributes one value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimProviderFactory;

#[async_trait]
impl ValueProviderFactory for ClaimProviderFactory {
    fn source(&self) -> SourceId {
        SourceId::Claim
    }

    async fn create(&self, ctx: &BindingContext) -> Result<Box<dyn ValueProvider>, BindError> {
        let pairs = ctx
            .claims()
            .iter()
            .map(|c| (c.kind.clone(), c.value.clone()))
            .collect();
        Ok(Box::new(PairsValueProvider::new(SourceId::Claim, pairs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_values() {
        let ctx = BindingContext::builder()
            .claim("sub", "user-1")
            .claim("role", "admin")
            .claim("role", "auditor")
            .build();

        let provider = ClaimProviderFactory.create(&ctx).await.unwrap();

        assert_eq!(provider.get_values("SUB"), vec!["user-1"]);
        assert_eq!(provider.get_values("role"), vec!["admin", "auditor"]);
    }

    #[tokio::test]
    async fn test_anonymous_principal() {
        let ctx = BindingContext::builder().build();
        let provider = ClaimProviderFactory.create(&ctx).await.unwrap();
        assert!(provider.get_values("sub").is_empty());
    }
}
