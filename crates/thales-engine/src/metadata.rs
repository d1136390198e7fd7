//! Binding metadata and its resolution.
//!
//! Annotations declared on a schema are resolved once into one
//! [`PropertyBindingSpec`] per bindable property. The resolved form is
//! cached per model type and call-site by the [`MetadataResolver`].

use crate::strategy::{strategy_for, BindingStrategy, StrategyRef};
use dashmap::DashMap;
use indexmap::IndexSet;
use std::any::TypeId;
use std::sync::Arc;
use thales_core::{SourceId, StrategyKind, GLOBAL_FALLBACK_ORDER};

/// One per-property binding annotation.
///
/// A property may carry several annotations. They are ordered by explicit
/// rank (ranked before unranked, ascending), then by declaration order.
///
/// # Example
///
/// ```rust
/// use thales_core::{SourceId, StrategyKind};
/// use thales_engine::BindAnnotation;
///
/// let annotation = BindAnnotation::new([SourceId::Header, SourceId::QueryString])
///     .alias("x-tenant")
///     .rank(1)
///     .strategy_kind(StrategyKind::Passthrough);
///
/// assert_eq!(annotation.sources(), &[SourceId::Header, SourceId::QueryString]);
/// assert_eq!(annotation.alias_key(), Some("x-tenant"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BindAnnotation {
    sources: Vec<SourceId>,
    alias: Option<String>,
    rank: Option<i32>,
    strategy: Option<StrategyRef>,
}

impl BindAnnotation {
    /// Creates an annotation over the given sources, in order.
    #[must_use]
    pub fn new(sources: impl IntoIterator<Item = SourceId>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Creates an annotation over a single source.
    #[must_use]
    pub fn from_source(source: SourceId) -> Self {
        Self::new([source])
    }

    /// Sets the key looked up in these sources.
    #[must_use]
    pub fn alias(mut self, key: impl Into<String>) -> Self {
        self.alias = Some(key.into());
        self
    }

    /// Sets the explicit rank.
    #[must_use]
    pub fn rank(mut self, rank: i32) -> Self {
        self.rank = Some(rank);
        self
    }

    /// Overrides the strategy for attempts of these sources.
    #[must_use]
    pub fn strategy(mut self, strategy: impl BindingStrategy + 'static) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    /// Overrides the strategy with a built-in one.
    #[must_use]
    pub fn strategy_kind(mut self, kind: StrategyKind) -> Self {
        self.strategy = Some(strategy_for(kind));
        self
    }

    /// Returns the sources in declaration order.
    #[must_use]
    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }

    /// Returns the alias key, if any.
    #[must_use]
    pub fn alias_key(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Returns the explicit rank, if any.
    #[must_use]
    pub fn explicit_rank(&self) -> Option<i32> {
        self.rank
    }

    /// Returns the strategy override, if any.
    #[must_use]
    pub fn strategy_override(&self) -> Option<&StrategyRef> {
        self.strategy.as_ref()
    }
}

/// Default source order of a model type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBindingSpec {
    default_source_order: Vec<SourceId>,
}

impl ClassBindingSpec {
    /// Creates a class-level default order.
    #[must_use]
    pub fn new(order: impl IntoIterator<Item = SourceId>) -> Self {
        Self {
            default_source_order: order.into_iter().collect(),
        }
    }

    /// Returns the default order.
    #[must_use]
    pub fn default_source_order(&self) -> &[SourceId] {
        &self.default_source_order
    }
}

/// Default source order of one call-site, such as one handler parameter.
///
/// Takes precedence over the class-level order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSiteBindingSpec {
    name: String,
    default_source_order: Vec<SourceId>,
}

impl CallSiteBindingSpec {
    /// Creates a call-site order. Together with the order, `name` keys the
    /// call-site in the metadata cache.
    #[must_use]
    pub fn new(name: impl Into<String>, order: impl IntoIterator<Item = SourceId>) -> Self {
        Self {
            name: name.into(),
            default_source_order: order.into_iter().collect(),
        }
    }

    /// Returns the call-site name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the default order.
    #[must_use]
    pub fn default_source_order(&self) -> &[SourceId] {
        &self.default_source_order
    }
}

/// One resolved lookup: which source to try, under which key.
#[derive(Debug, Clone)]
pub struct SourceAttempt {
    /// Source to look in.
    pub source: SourceId,
    /// Key looked up in the source.
    pub key: String,
    /// Strategy override of the annotation that supplied this attempt.
    pub strategy: Option<StrategyRef>,
}

/// Resolved binding metadata of one property.
#[derive(Debug, Clone)]
pub struct PropertyBindingSpec {
    property_name: String,
    key_alias: Option<String>,
    candidate_sources: Vec<SourceId>,
    explicit_order_rank: Option<i32>,
    strategy_override: Option<StrategyRef>,
    attempts: Vec<SourceAttempt>,
}

impl PropertyBindingSpec {
    /// Returns the property name, as recorded in provenance.
    #[must_use]
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// Returns the property-wide key alias, if any.
    #[must_use]
    pub fn key_alias(&self) -> Option<&str> {
        self.key_alias.as_deref()
    }

    /// Returns the distinct candidate sources in resolved order.
    #[must_use]
    pub fn candidate_sources(&self) -> &[SourceId] {
        &self.candidate_sources
    }

    /// Returns the lowest explicit rank among the property's annotations.
    #[must_use]
    pub fn explicit_order_rank(&self) -> Option<i32> {
        self.explicit_order_rank
    }

    /// Returns the property-wide strategy override, if any.
    #[must_use]
    pub fn strategy_override(&self) -> Option<&StrategyRef> {
        self.strategy_override.as_ref()
    }

    /// Returns the attempts in resolved order.
    #[must_use]
    pub fn attempts(&self) -> &[SourceAttempt] {
        &self.attempts
    }
}

/// Unresolved description of one bindable property.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Property name.
    pub name: String,
    /// Property-wide key alias.
    pub alias: Option<String>,
    /// Property-wide strategy override.
    pub strategy: Option<StrategyRef>,
    /// Annotations in declaration order.
    pub annotations: Vec<BindAnnotation>,
}

/// Resolves one property.
///
/// With annotations, the candidate list is the flattened, rank-sorted
/// annotation sources. Without, it is the call-site order, else the class
/// order, else [`GLOBAL_FALLBACK_ORDER`].
#[must_use]
pub fn resolve_property(
    property: &PropertyDescriptor,
    class: Option<&ClassBindingSpec>,
    call_site: Option<&CallSiteBindingSpec>,
) -> PropertyBindingSpec {
    let default_key = property.alias.as_deref().unwrap_or(&property.name);
    let mut attempts: Vec<SourceAttempt> = Vec::new();

    if property.annotations.is_empty() {
        let global = GLOBAL_FALLBACK_ORDER;
        let order = call_site
            .map(CallSiteBindingSpec::default_source_order)
            .filter(|o| !o.is_empty())
            .or_else(|| {
                class
                    .map(ClassBindingSpec::default_source_order)
                    .filter(|o| !o.is_empty())
            })
            .unwrap_or(&global[..]);

        attempts.extend(order.iter().map(|source| SourceAttempt {
            source: source.clone(),
            key: default_key.to_string(),
            strategy: None,
        }));
    } else {
        let mut annotations: Vec<&BindAnnotation> = property.annotations.iter().collect();
        // Stable: equal ranks and unranked annotations keep declaration order.
        annotations.sort_by_key(|a| (a.rank.is_none(), a.rank.unwrap_or(0)));

        for annotation in annotations {
            let key = annotation.alias.as_deref().unwrap_or(default_key);
            for source in &annotation.sources {
                let duplicate = attempts.iter().any(|a| &a.source == source && a.key == key);
                if !duplicate {
                    attempts.push(SourceAttempt {
                        source: source.clone(),
                        key: key.to_string(),
                        strategy: annotation.strategy.clone(),
                    });
                }
            }
        }
    }

    let candidate_sources: IndexSet<SourceId> = attempts.iter().map(|a| a.source.clone()).collect();

    PropertyBindingSpec {
        property_name: property.name.clone(),
        key_alias: property.alias.clone(),
        candidate_sources: candidate_sources.into_iter().collect(),
        explicit_order_rank: property.annotations.iter().filter_map(|a| a.rank).min(),
        strategy_override: property.strategy.clone(),
        attempts,
    }
}

/// Resolved metadata of one model type at one call-site.
#[derive(Debug, Clone)]
pub struct ResolvedMetadata {
    model: &'static str,
    properties: Vec<PropertyBindingSpec>,
    referenced_sources: IndexSet<SourceId>,
    needs_body: bool,
}

impl ResolvedMetadata {
    /// Resolves every property of a model.
    #[must_use]
    pub fn resolve(
        model: &'static str,
        properties: &[PropertyDescriptor],
        class: Option<&ClassBindingSpec>,
        call_site: Option<&CallSiteBindingSpec>,
        hydrates_from_body: bool,
    ) -> Self {
        let properties: Vec<PropertyBindingSpec> = properties
            .iter()
            .map(|p| resolve_property(p, class, call_site))
            .collect();

        let referenced_sources: IndexSet<SourceId> = properties
            .iter()
            .flat_map(|p| p.candidate_sources.iter().cloned())
            .collect();

        let needs_body = hydrates_from_body || referenced_sources.contains(&SourceId::Body);

        Self {
            model,
            properties,
            referenced_sources,
            needs_body,
        }
    }

    /// Returns the model type name.
    #[must_use]
    pub fn model(&self) -> &'static str {
        self.model
    }

    /// Returns the resolved properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[PropertyBindingSpec] {
        &self.properties
    }

    /// Returns a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyBindingSpec> {
        self.properties.iter().find(|p| p.property_name == name)
    }

    /// Returns every source referenced by any property, in first-use order.
    #[must_use]
    pub fn referenced_sources(&self) -> &IndexSet<SourceId> {
        &self.referenced_sources
    }

    /// Returns true if the body must be hydrated for this model.
    #[must_use]
    pub fn needs_body(&self) -> bool {
        self.needs_body
    }
}

/// Cache key: model type, schema instance and the full call-site spec.
type CacheKey = (TypeId, u64, Option<CallSiteBindingSpec>);

/// Concurrent cache of resolved metadata.
///
/// Written while binders are built at startup, read-only afterwards.
#[derive(Debug, Default)]
pub struct MetadataResolver {
    cache: DashMap<CacheKey, Arc<ResolvedMetadata>>,
}

impl MetadataResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached metadata for `key`, resolving it on first use.
    pub(crate) fn get_or_resolve(
        &self,
        model: TypeId,
        schema_id: u64,
        call_site: Option<&CallSiteBindingSpec>,
        resolve: impl FnOnce() -> ResolvedMetadata,
    ) -> Arc<ResolvedMetadata> {
        let key = (model, schema_id, call_site.cloned());

        self.cache
            .entry(key)
            .or_insert_with(|| {
                let resolved = resolve();
                tracing::debug!(
                    model = resolved.model(),
                    call_site = call_site.map(CallSiteBindingSpec::name),
                    properties = resolved.properties().len(),
                    "resolved binding metadata"
                );
                Arc::new(resolved)
            })
            .clone()
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(name: &str, annotations: Vec<BindAnnotation>) -> PropertyDescriptor {
        PropertyDescriptor {
            name: name.to_string(),
            alias: None,
            strategy: None,
            annotations,
        }
    }

    fn order(spec: &PropertyBindingSpec) -> Vec<(SourceId, String)> {
        spec.attempts()
            .iter()
            .map(|a| (a.source.clone(), a.key.clone()))
            .collect()
    }

    #[test]
    fn test_unannotated_uses_global_order() {
        let spec = resolve_property(&property("Id", vec![]), None, None);

        assert_eq!(spec.candidate_sources(), &GLOBAL_FALLBACK_ORDER);
        assert!(spec.attempts().iter().all(|a| a.key == "Id"));
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let p = property("Id", vec![]);
        let first = resolve_property(&p, None, None);
        let second = resolve_property(&p, None, None);

        assert_eq!(first.candidate_sources(), second.candidate_sources());
    }

    #[test]
    fn test_call_site_over_class_over_global() {
        let p = property("Id", vec![]);
        let class = ClassBindingSpec::new([SourceId::QueryString, SourceId::Route]);
        let call_site = CallSiteBindingSpec::new("get_item", [SourceId::Header]);

        let spec = resolve_property(&p, Some(&class), None);
        assert_eq!(spec.candidate_sources(), &[SourceId::QueryString, SourceId::Route]);

        let spec = resolve_property(&p, Some(&class), Some(&call_site));
        assert_eq!(spec.candidate_sources(), &[SourceId::Header]);
    }

    #[test]
    fn test_annotations_override_defaults() {
        let p = property("Id", vec![BindAnnotation::from_source(SourceId::Route)]);
        let class = ClassBindingSpec::new([SourceId::QueryString]);

        let spec = resolve_property(&p, Some(&class), None);
        assert_eq!(spec.candidate_sources(), &[SourceId::Route]);
    }

    #[test]
    fn test_ranked_before_unranked() {
        let p = property(
            "Id",
            vec![
                BindAnnotation::new([SourceId::Body, SourceId::Form]),
                BindAnnotation::from_source(SourceId::Header).rank(2),
                BindAnnotation::from_source(SourceId::Route).rank(1),
                BindAnnotation::from_source(SourceId::Claim),
            ],
        );

        let spec = resolve_property(&p, None, None);
        assert_eq!(
            spec.candidate_sources(),
            &[
                SourceId::Route,
                SourceId::Header,
                SourceId::Body,
                SourceId::Form,
                SourceId::Claim,
            ]
        );
        assert_eq!(spec.explicit_order_rank(), Some(1));
    }

    #[test]
    fn test_alias_per_annotation() {
        let mut p = property(
            "TenantId",
            vec![
                BindAnnotation::from_source(SourceId::Header).alias("x-tenant"),
                BindAnnotation::from_source(SourceId::QueryString),
            ],
        );
        p.alias = Some("tenant".to_string());

        let spec = resolve_property(&p, None, None);
        assert_eq!(
            order(&spec),
            vec![
                (SourceId::Header, "x-tenant".to_string()),
                (SourceId::QueryString, "tenant".to_string()),
            ]
        );
        assert_eq!(spec.key_alias(), Some("tenant"));
    }

    #[test]
    fn test_duplicate_attempts_dropped() {
        let p = property(
            "Id",
            vec![
                BindAnnotation::new([SourceId::Route, SourceId::Route]),
                BindAnnotation::from_source(SourceId::Route),
                BindAnnotation::from_source(SourceId::Route).alias("id2"),
            ],
        );

        let spec = resolve_property(&p, None, None);
        assert_eq!(
            order(&spec),
            vec![
                (SourceId::Route, "Id".to_string()),
                (SourceId::Route, "id2".to_string()),
            ]
        );
        assert_eq!(spec.candidate_sources(), &[SourceId::Route]);
    }

    #[test]
    fn test_attempt_keeps_annotation_strategy() {
        let p = property(
            "Id",
            vec![
                BindAnnotation::from_source(SourceId::Route),
                BindAnnotation::from_source(SourceId::Header).strategy_kind(StrategyKind::Passthrough),
            ],
        );

        let spec = resolve_property(&p, None, None);
        assert!(spec.attempts()[0].strategy.is_none());
        assert_eq!(
            spec.attempts()[1].strategy.as_ref().map(|s| s.name()),
            Some("passthrough")
        );
    }

    #[test]
    fn test_needs_body() {
        let props = vec![property("Id", vec![BindAnnotation::from_source(SourceId::Route)])];
        assert!(!ResolvedMetadata::resolve("M", &props, None, None, false).needs_body());
        assert!(ResolvedMetadata::resolve("M", &props, None, None, true).needs_body());

        let props = vec![property("Id", vec![])];
        let resolved = ResolvedMetadata::resolve("M", &props, None, None, false);
        assert!(resolved.needs_body());
        assert_eq!(resolved.referenced_sources().len(), GLOBAL_FALLBACK_ORDER.len());
    }

    #[test]
    fn test_cache_per_call_site() {
        struct Model;

        let resolver = MetadataResolver::new();
        let props = vec![property("Id", vec![])];
        let site = CallSiteBindingSpec::new("handler", [SourceId::Route]);
        let resolve = || ResolvedMetadata::resolve("Model", &props, None, None, false);

        let a = resolver.get_or_resolve(TypeId::of::<Model>(), 1, None, resolve);
        let b = resolver.get_or_resolve(TypeId::of::<Model>(), 1, None, || unreachable!());
        assert!(Arc::ptr_eq(&a, &b));

        let _ = resolver.get_or_resolve(TypeId::of::<Model>(), 1, Some(&site), || {
            ResolvedMetadata::resolve("Model", &props, None, Some(&site), false)
        });
        assert_eq!(resolver.len(), 2);

        let same_name = CallSiteBindingSpec::new("handler", [SourceId::Header]);
        let c = resolver.get_or_resolve(TypeId::of::<Model>(), 1, Some(&same_name), || {
            ResolvedMetadata::resolve("Model", &props, None, Some(&same_name), false)
        });
        assert_eq!(c.properties()[0].candidate_sources(), &[SourceId::Header]);
        assert_eq!(resolver.len(), 3);
    }
}
