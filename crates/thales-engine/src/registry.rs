//! The process-lifetime binding registry.
//!
//! Holds the body hydrators, one value provider factory per source and the
//! default strategy. Built once at startup and shared read-only by every
//! binder.

use crate::metadata::MetadataResolver;
use crate::strategy::{strategy_for, BindingStrategy, StrategyRef};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use thales_config::ThalesConfig;
use thales_core::SourceId;
use thales_providers::{
    BodyHydrator, ClaimProviderFactory, FormHydrator, FormProviderFactory, HeaderProviderFactory,
    JsonHydrator, MultipartLimits, QueryStringProviderFactory, RouteProviderFactory,
    ValueProviderFactory,
};

/// Registered hydrators, provider factories and the default strategy.
///
/// # Example
///
/// ```rust
/// use thales_config::ThalesConfig;
/// use thales_core::SourceId;
/// use thales_engine::BindingRegistry;
///
/// let registry = BindingRegistry::standard(&ThalesConfig::default());
///
/// assert!(registry.provider(&SourceId::Route).is_some());
/// assert!(registry.provider(&SourceId::custom("Session")).is_none());
/// assert_eq!(registry.hydrators().len(), 1);
/// ```
pub struct BindingRegistry {
    hydrators: Vec<Arc<dyn BodyHydrator>>,
    providers: IndexMap<SourceId, Arc<dyn ValueProviderFactory>>,
    default_strategy: StrategyRef,
    metadata: MetadataResolver,
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hydrators: Vec<&str> = self.hydrators.iter().map(|h| h.name()).collect();
        let providers: Vec<&SourceId> = self.providers.keys().collect();

        f.debug_struct("BindingRegistry")
            .field("hydrators", &hydrators)
            .field("providers", &providers)
            .field("default_strategy", &self.default_strategy.name())
            .finish_non_exhaustive()
    }
}

impl BindingRegistry {
    /// Returns an empty builder.
    #[must_use]
    pub fn builder() -> BindingRegistryBuilder {
        BindingRegistryBuilder::new()
    }

    /// Builds a registry with every built-in hydrator and provider.
    #[must_use]
    pub fn standard(config: &ThalesConfig) -> Self {
        BindingRegistryBuilder::standard(config).build()
    }

    /// Returns the hydrators in registration order.
    #[must_use]
    pub fn hydrators(&self) -> &[Arc<dyn BodyHydrator>] {
        &self.hydrators
    }

    /// Returns the provider factory registered for `source`.
    #[must_use]
    pub fn provider(&self, source: &SourceId) -> Option<&Arc<dyn ValueProviderFactory>> {
        self.providers.get(source)
    }

    /// Returns true if `source` can be served: the body always can when a
    /// hydrator is registered, other sources need a provider factory.
    #[must_use]
    pub fn serves(&self, source: &SourceId) -> bool {
        if source.is_body() {
            !self.hydrators.is_empty()
        } else {
            self.providers.contains_key(source)
        }
    }

    /// Returns the default strategy.
    #[must_use]
    pub fn default_strategy(&self) -> &StrategyRef {
        &self.default_strategy
    }

    /// Returns the metadata cache shared by binders built on this registry.
    #[must_use]
    pub fn metadata(&self) -> &MetadataResolver {
        &self.metadata
    }
}

/// Builder for [`BindingRegistry`].
pub struct BindingRegistryBuilder {
    hydrators: Vec<Arc<dyn BodyHydrator>>,
    providers: IndexMap<SourceId, Arc<dyn ValueProviderFactory>>,
    default_strategy: StrategyRef,
}

impl fmt::Debug for BindingRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRegistryBuilder")
            .field("hydrators", &self.hydrators.len())
            .field("providers", &self.providers.len())
            .finish_non_exhaustive()
    }
}

impl Default for BindingRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingRegistryBuilder {
    /// Creates an empty builder with the `FirstInWins` default strategy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hydrators: Vec::new(),
            providers: IndexMap::new(),
            default_strategy: strategy_for(thales_core::StrategyKind::FirstInWins),
        }
    }

    /// Creates a builder with every built-in hydrator and provider.
    ///
    /// The JSON hydrator is always registered; the form hydrator only when
    /// `binding.hydrate_form_bodies` is set.
    #[must_use]
    pub fn standard(config: &ThalesConfig) -> Self {
        let limits = MultipartLimits::default()
            .max_body_size(config.multipart.max_body_size)
            .max_field_size(config.multipart.max_field_size)
            .max_fields(config.multipart.max_fields);

        let mut builder = Self::new()
            .default_strategy_kind(config.binding.default_strategy)
            .hydrator(JsonHydrator::new(config.binding.max_body_size));

        if config.binding.hydrate_form_bodies {
            builder = builder.hydrator(FormHydrator);
        }

        builder
            .provider(SourceId::Form, FormProviderFactory::new(limits))
            .provider(SourceId::Route, RouteProviderFactory)
            .provider(SourceId::QueryString, QueryStringProviderFactory)
            .provider(SourceId::Header, HeaderProviderFactory)
            .provider(SourceId::Claim, ClaimProviderFactory)
    }

    /// Appends a body hydrator. Hydrators are tried in registration order.
    #[must_use]
    pub fn hydrator(mut self, hydrator: impl BodyHydrator + 'static) -> Self {
        self.hydrators.push(Arc::new(hydrator));
        self
    }

    /// Registers the provider factory for `source`, replacing any earlier
    /// registration.
    ///
    /// The body is served by hydrators, so registering a factory for
    /// `Body` is ignored.
    #[must_use]
    pub fn provider(mut self, source: SourceId, factory: impl ValueProviderFactory + 'static) -> Self {
        if source.is_body() {
            tracing::warn!("ignoring value provider registered for the Body source; register a hydrator instead");
            return self;
        }

        if self.providers.insert(source.clone(), Arc::new(factory)).is_some() {
            tracing::debug!(%source, "replaced value provider registration");
        }
        self
    }

    /// Sets the default strategy.
    #[must_use]
    pub fn default_strategy(mut self, strategy: impl BindingStrategy + 'static) -> Self {
        self.default_strategy = Arc::new(strategy);
        self
    }

    /// Sets the default strategy to a built-in one.
    #[must_use]
    pub fn default_strategy_kind(mut self, kind: thales_core::StrategyKind) -> Self {
        self.default_strategy = strategy_for(kind);
        self
    }

    /// Builds the registry.
    #[must_use]
    pub fn build(self) -> BindingRegistry {
        tracing::debug!(
            hydrators = self.hydrators.len(),
            providers = self.providers.len(),
            default_strategy = self.default_strategy.name(),
            "built binding registry"
        );

        BindingRegistry {
            hydrators: self.hydrators,
            providers: self.providers,
            default_strategy: self.default_strategy,
            metadata: MetadataResolver::new(),
        }
    }
}
