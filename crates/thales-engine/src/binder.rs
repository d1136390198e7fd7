//! The bind orchestrator.
//!
//! A [`Binder`] is built once per call-site from a schema and the registry.
//! Each [`Binder::bind`] call hydrates the body, constructs the base
//! instance, creates the referenced value providers and then walks every
//! property through its resolved attempts.

use crate::coerce::SourceValue;
use crate::metadata::{CallSiteBindingSpec, PropertyBindingSpec, ResolvedMetadata};
use crate::registry::BindingRegistry;
use crate::schema::{BindModel, ModelSchema, Property, SchemaError};
use indexmap::{IndexMap, IndexSet};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use thales_core::{BindError, BindingContext, Provenance, SourceId};
use thales_providers::{BodyDocument, BodyValueProvider, ValueProvider};
use tracing::Instrument;

/// A bound model together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound<T> {
    /// The bound model.
    pub model: T,
    /// Which source supplied each bound property.
    pub provenance: Provenance,
}

impl<T> Bound<T> {
    /// Returns the model, discarding provenance.
    pub fn into_inner(self) -> T {
        self.model
    }

    /// Splits into model and provenance.
    pub fn into_parts(self) -> (T, Provenance) {
        (self.model, self.provenance)
    }
}

/// Binds requests into model `T`.
///
/// Cheap to clone; every clone shares the schema, registry and resolved
/// metadata.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use thales_config::ThalesConfig;
/// use thales_core::{BindingContext, SourceId};
/// use thales_engine::{Binder, BindingRegistry, ModelSchema, Property};
///
/// #[derive(Debug, Default)]
/// struct Product {
///     id: i32,
///     name: String,
/// }
///
/// let schema = ModelSchema::<Product>::builder()
///     .property(Property::scalar("Id", |m: &mut Product, v: i32| m.id = v).from_sources([SourceId::Route]))
///     .property(Property::scalar("Name", |m: &mut Product, v: String| m.name = v).from_sources([SourceId::Body]))
///     .default_constructor()
///     .build()
///     .unwrap();
/// let registry = Arc::new(BindingRegistry::standard(&ThalesConfig::default()));
/// let binder = Binder::new(Arc::new(schema), registry);
///
/// let ctx = BindingContext::builder()
///     .route_value("Id", "42")
///     .json(r#"{"Name":"Widget"}"#)
///     .build();
///
/// # tokio_test::block_on(async {
/// let bound = binder.bind(&ctx).await.unwrap();
/// assert_eq!(bound.model.id, 42);
/// assert_eq!(bound.model.name, "Widget");
/// assert_eq!(bound.provenance.source_of("Id"), Some(&SourceId::Route));
/// # });
/// ```
pub struct Binder<T> {
    schema: Arc<ModelSchema<T>>,
    registry: Arc<BindingRegistry>,
    metadata: Arc<ResolvedMetadata>,
    call_site: Option<Arc<str>>,
}

impl<T> Clone for Binder<T> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            registry: Arc::clone(&self.registry),
            metadata: Arc::clone(&self.metadata),
            call_site: self.call_site.clone(),
        }
    }
}

impl<T> fmt::Debug for Binder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("model", &self.schema.name())
            .field("call_site", &self.call_site)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Binder<T> {
    /// Creates a binder using the class-level and global orders.
    #[must_use]
    pub fn new(schema: Arc<ModelSchema<T>>, registry: Arc<BindingRegistry>) -> Self {
        Self::build(schema, registry, None)
    }

    /// Creates a binder whose call-site order takes precedence over the
    /// class-level order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyCallSiteOrder`] if the call-site order is
    /// empty.
    pub fn for_call_site(
        schema: Arc<ModelSchema<T>>,
        registry: Arc<BindingRegistry>,
        call_site: &CallSiteBindingSpec,
    ) -> Result<Self, SchemaError> {
        if call_site.default_source_order().is_empty() {
            return Err(SchemaError::EmptyCallSiteOrder {
                call_site: call_site.name().to_string(),
            });
        }
        Ok(Self::build(schema, registry, Some(call_site)))
    }

    /// Creates a binder from the schema a model provides for itself.
    ///
    /// # Errors
    ///
    /// Returns the [`SchemaError`] of an inconsistent schema.
    pub fn for_model(registry: Arc<BindingRegistry>) -> Result<Self, SchemaError>
    where
        T: BindModel,
    {
        Ok(Self::new(Arc::new(T::schema()?), registry))
    }

    fn build(
        schema: Arc<ModelSchema<T>>,
        registry: Arc<BindingRegistry>,
        call_site: Option<&CallSiteBindingSpec>,
    ) -> Self {
        let metadata = registry.metadata().get_or_resolve(
            TypeId::of::<T>(),
            schema.id(),
            call_site,
            || {
                ResolvedMetadata::resolve(
                    schema.name(),
                    &schema.descriptors(),
                    schema.class(),
                    call_site,
                    schema.hydrates_from_body(),
                )
            },
        );

        for source in metadata.referenced_sources() {
            if !registry.serves(source) {
                tracing::warn!(
                    model = schema.name(),
                    %source,
                    "no provider registered for referenced binding source; attempts will be skipped"
                );
            }
        }

        Self {
            schema,
            registry,
            metadata,
            call_site: call_site.map(|c| Arc::from(c.name())),
        }
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &ModelSchema<T> {
        &self.schema
    }

    /// Returns the resolved metadata.
    #[must_use]
    pub fn metadata(&self) -> &ResolvedMetadata {
        &self.metadata
    }

    /// Binds one request.
    ///
    /// # Errors
    ///
    /// - [`BindError::BodyParse`] / [`BindError::PayloadTooLarge`] for a
    ///   malformed or oversize body or form payload
    /// - [`BindError::ModelConstruction`] if no base instance can be created
    /// - [`BindError::Cancelled`] if the request is cancelled before or
    ///   between properties
    pub async fn bind(&self, ctx: &BindingContext) -> Result<Bound<T>, BindError> {
        let span = tracing::debug_span!(
            "bind",
            model = self.schema.name(),
            call_site = self.call_site.as_deref(),
        );

        self.bind_inner(ctx).instrument(span).await
    }

    async fn bind_inner(&self, ctx: &BindingContext) -> Result<Bound<T>, BindError> {
        let model_name = self.schema.name();

        if ctx.is_cancelled() {
            return Err(BindError::cancelled(model_name));
        }

        let document = if self.metadata.needs_body() {
            self.hydrate(ctx).await?.map(Arc::new)
        } else {
            None
        };

        let mut model = self.schema.construct(document.as_deref())?;
        let body = BodyValueProvider::new(document);
        let providers = self.create_providers(ctx).await?;

        let mut provenance = Provenance::new();
        for (property, spec) in self.schema.properties().iter().zip(self.metadata.properties()) {
            if ctx.is_cancelled() {
                tracing::debug!(property = spec.property_name(), "bind cancelled");
                return Err(BindError::cancelled(model_name));
            }

            self.bind_property(&mut model, property, spec, &body, &providers, &mut provenance);
        }

        self.schema.deliver_provenance(&mut model, &provenance);

        tracing::debug!(bound = provenance.len(), "bind complete");
        Ok(Bound { model, provenance })
    }

    /// Runs the hydrators in order inside a scoped body read.
    async fn hydrate(&self, ctx: &BindingContext) -> Result<Option<BodyDocument>, BindError> {
        let scope = ctx.body().scope();
        let payload = scope.read_to_end();

        for hydrator in self.registry.hydrators() {
            if let Some(document) = hydrator.hydrate(ctx, &payload).await? {
                tracing::debug!(
                    hydrator = hydrator.name(),
                    members = document.len(),
                    "hydrated body"
                );
                return Ok(Some(document));
            }
        }

        tracing::debug!(bytes = payload.len(), "no hydrator produced a body object");
        Ok(None)
    }

    /// Creates each referenced string-keyed provider exactly once.
    async fn create_providers(
        &self,
        ctx: &BindingContext,
    ) -> Result<IndexMap<SourceId, Box<dyn ValueProvider>>, BindError> {
        let mut providers = IndexMap::new();

        for source in self.metadata.referenced_sources() {
            if source.is_body() {
                continue;
            }
            if let Some(factory) = self.registry.provider(source) {
                providers.insert(source.clone(), factory.create(ctx).await?);
            }
        }

        Ok(providers)
    }

    fn bind_property(
        &self,
        model: &mut T,
        property: &Property<T>,
        spec: &PropertyBindingSpec,
        body: &BodyValueProvider,
        providers: &IndexMap<SourceId, Box<dyn ValueProvider>>,
        provenance: &mut Provenance,
    ) {
        let name = spec.property_name();
        let mut bound: IndexSet<SourceId> = IndexSet::new();

        for attempt in spec.attempts() {
            let strategy = attempt
                .strategy
                .as_ref()
                .or_else(|| spec.strategy_override())
                .unwrap_or_else(|| self.registry.default_strategy());

            if !strategy.attempt(&bound, spec.candidate_sources()) {
                tracing::trace!(
                    property = name,
                    source = %attempt.source,
                    strategy = strategy.name(),
                    "strategy skipped source"
                );
                continue;
            }

            let Some(value) = fetch(property, &attempt.source, &attempt.key, body, providers) else {
                tracing::trace!(property = name, source = %attempt.source, key = %attempt.key, "no raw values");
                continue;
            };

            match property.apply(model, value) {
                Ok(()) => {
                    tracing::trace!(property = name, source = %attempt.source, "bound property");
                    bound.insert(attempt.source.clone());
                    provenance.record(name, attempt.source.clone());
                }
                Err(e) => {
                    tracing::trace!(property = name, source = %attempt.source, error = %e, "conversion failed");
                }
            }
        }

        if bound.is_empty() {
            tracing::debug!(property = name, "no source matched");
        }
    }
}

/// Looks up the raw values of one attempt.
fn fetch<'a, T>(
    property: &Property<T>,
    source: &SourceId,
    key: &str,
    body: &'a BodyValueProvider,
    providers: &IndexMap<SourceId, Box<dyn ValueProvider>>,
) -> Option<SourceValue<'a>> {
    if source.is_body() {
        return body.get_object(key).map(SourceValue::Json);
    }

    let provider = providers.get(source)?;

    if property.shape().is_file() {
        let files = provider.get_files(key);
        (!files.is_empty()).then_some(SourceValue::Files(files))
    } else {
        let values = provider.get_values(key);
        (!values.is_empty()).then_some(SourceValue::Text(values))
    }
}
