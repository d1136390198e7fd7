//! Declarative model schemas.
//!
//! A [`ModelSchema`] is the flat, precomputed description of one model
//! type: its bindable properties with their annotations, its class-level
//! default order, and how to construct the base instance. Schemas are built
//! once at startup, either by hand or by `#[derive(BindModel)]`.

use crate::coerce::{collection_from, file_from, files_from, scalar_from, FromRawValue, SourceValue};
use crate::metadata::{BindAnnotation, ClassBindingSpec, PropertyDescriptor};
use crate::strategy::{strategy_for, BindingStrategy};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thales_core::{
    BindError, ConversionError, Provenance, ProvidesProvenance, SourceId, StrategyKind,
    UploadedFile,
};
use thales_providers::BodyDocument;
use thiserror::Error;

static NEXT_SCHEMA_ID: AtomicU64 = AtomicU64::new(1);

/// Errors detected while building a schema or binder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// An annotation lists no sources.
    #[error("annotation on property '{property}' of `{model}` lists no sources")]
    EmptyAnnotation {
        /// Model type name.
        model: &'static str,
        /// Property name.
        property: String,
    },

    /// Two properties share a name.
    #[error("property '{property}' is declared twice on `{model}`")]
    DuplicateProperty {
        /// Model type name.
        model: &'static str,
        /// Property name.
        property: String,
    },

    /// The class-level default order is empty.
    #[error("default source order of `{model}` is empty")]
    EmptyClassOrder {
        /// Model type name.
        model: &'static str,
    },

    /// A call-site default order is empty.
    #[error("default source order of call-site '{call_site}' is empty")]
    EmptyCallSiteOrder {
        /// Call-site name.
        call_site: String,
    },

    /// The model has no body deserializer, factory or default constructor.
    #[error("`{model}` has no body deserializer, factory or default constructor")]
    NoConstructor {
        /// Model type name.
        model: &'static str,
    },
}

/// Target shape of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyShape {
    /// One value converted from the first raw value.
    Scalar,
    /// A sequence aggregated from every raw value.
    Collection,
    /// One uploaded file.
    File,
    /// Every uploaded file.
    Files,
}

impl PropertyShape {
    /// Returns true for file-like shapes.
    #[must_use]
    pub fn is_file(self) -> bool {
        matches!(self, Self::File | Self::Files)
    }
}

type Apply<T> =
    Arc<dyn Fn(&mut T, SourceValue<'_>) -> Result<(), ConversionError> + Send + Sync>;

/// One bindable property: its metadata and how to assign it.
///
/// # Example
///
/// ```rust
/// use thales_core::SourceId;
/// use thales_engine::{BindAnnotation, Property, PropertyShape};
///
/// #[derive(Default)]
/// struct Search {
///     tags: Vec<String>,
/// }
///
/// let tags = Property::collection("Tags", |m: &mut Search, v: Vec<String>| m.tags = v)
///     .bind(BindAnnotation::from_source(SourceId::QueryString).alias("tag"));
///
/// assert_eq!(tags.name(), "Tags");
/// assert_eq!(tags.shape(), PropertyShape::Collection);
/// ```
pub struct Property<T> {
    descriptor: PropertyDescriptor,
    shape: PropertyShape,
    apply: Apply<T>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            shape: self.shape,
            apply: Arc::clone(&self.apply),
        }
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("descriptor", &self.descriptor)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Property<T> {
    fn with_apply<F>(name: impl Into<String>, shape: PropertyShape, apply: F) -> Self
    where
        F: Fn(&mut T, SourceValue<'_>) -> Result<(), ConversionError> + Send + Sync + 'static,
    {
        Self {
            descriptor: PropertyDescriptor {
                name: name.into(),
                alias: None,
                strategy: None,
                annotations: Vec::new(),
            },
            shape,
            apply: Arc::new(apply),
        }
    }

    /// A scalar property of type `V`.
    ///
    /// Optional properties use `V = Option<_>`.
    pub fn scalar<V, F>(name: impl Into<String>, set: F) -> Self
    where
        V: FromRawValue + DeserializeOwned + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self::with_apply(name, PropertyShape::Scalar, move |model, value| {
            set(model, scalar_from::<V>(value)?);
            Ok(())
        })
    }

    /// A collection property of type `Vec<V>`.
    pub fn collection<V, F>(name: impl Into<String>, set: F) -> Self
    where
        V: FromRawValue + DeserializeOwned + 'static,
        F: Fn(&mut T, Vec<V>) + Send + Sync + 'static,
    {
        Self::with_apply(name, PropertyShape::Collection, move |model, value| {
            set(model, collection_from::<V>(value)?);
            Ok(())
        })
    }

    /// A single uploaded file.
    pub fn file<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, UploadedFile) + Send + Sync + 'static,
    {
        Self::with_apply(name, PropertyShape::File, move |model, value| {
            set(model, file_from(value)?);
            Ok(())
        })
    }

    /// Every uploaded file under the property's key.
    pub fn files<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, Vec<UploadedFile>) + Send + Sync + 'static,
    {
        Self::with_apply(name, PropertyShape::Files, move |model, value| {
            set(model, files_from(value)?);
            Ok(())
        })
    }
}

impl<T> Property<T> {
    /// Adds an annotation. May be called several times.
    #[must_use]
    pub fn bind(mut self, annotation: BindAnnotation) -> Self {
        self.descriptor.annotations.push(annotation);
        self
    }

    /// Adds an annotation over `sources`.
    #[must_use]
    pub fn from_sources(self, sources: impl IntoIterator<Item = SourceId>) -> Self {
        self.bind(BindAnnotation::new(sources))
    }

    /// Sets the key looked up in every source without its own alias.
    #[must_use]
    pub fn alias(mut self, key: impl Into<String>) -> Self {
        self.descriptor.alias = Some(key.into());
        self
    }

    /// Overrides the strategy for this property.
    #[must_use]
    pub fn strategy(mut self, strategy: impl BindingStrategy + 'static) -> Self {
        self.descriptor.strategy = Some(Arc::new(strategy));
        self
    }

    /// Overrides the strategy for this property with a built-in one.
    #[must_use]
    pub fn strategy_kind(mut self, kind: StrategyKind) -> Self {
        self.descriptor.strategy = Some(strategy_for(kind));
        self
    }

    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Returns the target shape.
    #[must_use]
    pub fn shape(&self) -> PropertyShape {
        self.shape
    }

    /// Returns the unresolved metadata.
    #[must_use]
    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.descriptor
    }

    pub(crate) fn apply(&self, model: &mut T, value: SourceValue<'_>) -> Result<(), ConversionError> {
        (self.apply)(model, value)
    }
}

/// Types that provide their own schema.
///
/// Implemented by `#[derive(BindModel)]`.
pub trait BindModel: Sized + Send + 'static {
    /// Builds the schema of this type.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the declared metadata is inconsistent.
    fn schema() -> Result<ModelSchema<Self>, SchemaError>;
}

/// The binding schema of model type `T`.
///
/// # Example
///
/// ```rust
/// use thales_core::SourceId;
/// use thales_engine::{ModelSchema, Property};
///
/// #[derive(Default)]
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
///
/// assert_eq!(schema.properties().len(), 2);
/// ```
pub struct ModelSchema<T> {
    id: u64,
    name: &'static str,
    class: Option<ClassBindingSpec>,
    properties: Vec<Property<T>>,
    from_body: Option<fn(&BodyDocument) -> Result<T, serde_json::Error>>,
    factory: Option<Arc<dyn Fn() -> T + Send + Sync>>,
    default_ctor: Option<fn() -> T>,
    provenance_sink: Option<fn(&mut T, Provenance)>,
}

impl<T> fmt::Debug for ModelSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("properties", &self.properties)
            .field("hydrates_from_body", &self.from_body.is_some())
            .field("has_factory", &self.factory.is_some())
            .field("has_default", &self.default_ctor.is_some())
            .field("receives_provenance", &self.provenance_sink.is_some())
            .finish()
    }
}

impl<T: 'static> ModelSchema<T> {
    /// Returns a builder for the schema of `T`.
    #[must_use]
    pub fn builder() -> ModelSchemaBuilder<T> {
        ModelSchemaBuilder::new()
    }
}

impl<T> ModelSchema<T> {
    /// Unique id of this schema instance.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the model type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the class-level default order, if declared.
    #[must_use]
    pub fn class(&self) -> Option<&ClassBindingSpec> {
        self.class.as_ref()
    }

    /// Returns the properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[Property<T>] {
        &self.properties
    }

    /// Returns the unresolved metadata of every property.
    #[must_use]
    pub fn descriptors(&self) -> Vec<PropertyDescriptor> {
        self.properties.iter().map(|p| p.descriptor.clone()).collect()
    }

    /// Returns true if the base instance is deserialized from the body.
    #[must_use]
    pub fn hydrates_from_body(&self) -> bool {
        self.from_body.is_some()
    }

    /// Returns true if the model receives its provenance map.
    #[must_use]
    pub fn receives_provenance(&self) -> bool {
        self.provenance_sink.is_some()
    }

    /// Creates the base instance.
    ///
    /// Tries the body deserializer on the hydrated document, then the
    /// factory, then the default constructor.
    pub(crate) fn construct(&self, document: Option<&BodyDocument>) -> Result<T, BindError> {
        if let (Some(from_body), Some(document)) = (self.from_body, document) {
            match from_body(document) {
                Ok(model) => return Ok(model),
                Err(e) => tracing::debug!(
                    model = self.name,
                    error = %e,
                    "body does not deserialize into model, falling back"
                ),
            }
        }

        if let Some(factory) = &self.factory {
            return Ok(factory());
        }

        if let Some(default_ctor) = self.default_ctor {
            return Ok(default_ctor());
        }

        Err(BindError::model_construction(
            self.name,
            "no hydrated body object, factory or default constructor produced an instance",
        ))
    }

    pub(crate) fn deliver_provenance(&self, model: &mut T, provenance: &Provenance) {
        if let Some(sink) = self.provenance_sink {
            sink(model, provenance.clone());
        }
    }
}

/// Builder for [`ModelSchema`].
pub struct ModelSchemaBuilder<T> {
    name: &'static str,
    class: Option<ClassBindingSpec>,
    properties: Vec<Property<T>>,
    from_body: Option<fn(&BodyDocument) -> Result<T, serde_json::Error>>,
    factory: Option<Arc<dyn Fn() -> T + Send + Sync>>,
    default_ctor: Option<fn() -> T>,
    provenance_sink: Option<fn(&mut T, Provenance)>,
}

impl<T> fmt::Debug for ModelSchemaBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchemaBuilder")
            .field("name", &self.name)
            .field("properties", &self.properties.len())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Default for ModelSchemaBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ModelSchemaBuilder<T> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            class: None,
            properties: Vec::new(),
            from_body: None,
            factory: None,
            default_ctor: None,
            provenance_sink: None,
        }
    }

    /// Sets the class-level default source order.
    #[must_use]
    pub fn sources(mut self, order: impl IntoIterator<Item = SourceId>) -> Self {
        self.class = Some(ClassBindingSpec::new(order));
        self
    }

    /// Sets the class-level binding spec.
    #[must_use]
    pub fn class(mut self, class: ClassBindingSpec) -> Self {
        self.class = Some(class);
        self
    }

    /// Appends a property. Declaration order is binding order.
    #[must_use]
    pub fn property(mut self, property: Property<T>) -> Self {
        self.properties.push(property);
        self
    }

    /// Uses `factory` to create base instances.
    #[must_use]
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Uses `Default` to create base instances.
    #[must_use]
    pub fn default_constructor(mut self) -> Self
    where
        T: Default,
    {
        self.default_ctor = Some(T::default as fn() -> T);
        self
    }

    /// Deserializes the base instance from the hydrated body when possible.
    #[must_use]
    pub fn hydrate_from_body(mut self) -> Self
    where
        T: DeserializeOwned,
    {
        self.from_body = Some(|document: &BodyDocument| document.deserialize::<T>());
        self
    }

    /// Hands the provenance map to the model after binding.
    #[must_use]
    pub fn with_provenance(mut self) -> Self
    where
        T: ProvidesProvenance,
    {
        self.provenance_sink = Some(|model: &mut T, provenance: Provenance| {
            model.receive_provenance(provenance);
        });
        self
    }

    /// Validates and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] for empty annotations or orders, duplicate
    /// property names, or a model with no way to be constructed.
    pub fn build(self) -> Result<ModelSchema<T>, SchemaError> {
        let model = self.name;

        if self
            .class
            .as_ref()
            .is_some_and(|c| c.default_source_order().is_empty())
        {
            return Err(SchemaError::EmptyClassOrder { model });
        }

        for (i, property) in self.properties.iter().enumerate() {
            if property.descriptor.annotations.iter().any(|a| a.sources().is_empty()) {
                return Err(SchemaError::EmptyAnnotation {
                    model,
                    property: property.name().to_string(),
                });
            }
            if self.properties[..i].iter().any(|p| p.name() == property.name()) {
                return Err(SchemaError::DuplicateProperty {
                    model,
                    property: property.name().to_string(),
                });
            }
        }

        if self.from_body.is_none() && self.factory.is_none() && self.default_ctor.is_none() {
            return Err(SchemaError::NoConstructor { model });
        }

        Ok(ModelSchema {
            id: NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            class: self.class,
            properties: self.properties,
            from_body: self.from_body,
            factory: self.factory,
            default_ctor: self.default_ctor,
            provenance_sink: self.provenance_sink,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Widget {
        #[serde(default)]
        id: i32,
        #[serde(default)]
        name: String,
    }

    fn id() -> Property<Widget> {
        Property::scalar("Id", |m: &mut Widget, v: i32| m.id = v)
    }

    #[test]
    fn test_empty_annotation_rejected() {
        let err = ModelSchema::<Widget>::builder()
            .property(id().from_sources([]))
            .default_constructor()
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaError::EmptyAnnotation { .. }));
    }

    #[test]
    fn test_duplicate_property_rejected() {
        let err = ModelSchema::<Widget>::builder()
            .property(id())
            .property(id())
            .default_constructor()
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SchemaError::DuplicateProperty {
                model: std::any::type_name::<Widget>(),
                property: "Id".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_class_order_rejected() {
        let err = ModelSchema::<Widget>::builder()
            .sources([])
            .default_constructor()
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaError::EmptyClassOrder { .. }));
    }

    #[test]
    fn test_no_constructor_rejected() {
        let err = ModelSchema::<Widget>::builder().property(id()).build().unwrap_err();
        assert!(matches!(err, SchemaError::NoConstructor { .. }));
    }

    #[test]
    fn test_construct_prefers_body() {
        let schema = ModelSchema::<Widget>::builder()
            .hydrate_from_body()
            .factory(|| Widget { id: 7, name: "factory".into() })
            .build()
            .unwrap();

        let doc = BodyDocument::from_value(json!({"id": 1, "name": "body"})).unwrap();
        assert_eq!(schema.construct(Some(&doc)).unwrap().name, "body");
        assert_eq!(schema.construct(None).unwrap().name, "factory");
    }

    #[test]
    fn test_construct_falls_back_when_body_does_not_fit() {
        let schema = ModelSchema::<Widget>::builder()
            .hydrate_from_body()
            .default_constructor()
            .build()
            .unwrap();

        let doc = BodyDocument::from_value(json!({"id": "not a number"})).unwrap();
        assert_eq!(schema.construct(Some(&doc)).unwrap(), Widget::default());
    }

    #[test]
    fn test_construct_without_body_fails() {
        let schema = ModelSchema::<Widget>::builder().hydrate_from_body().build().unwrap();

        let err = schema.construct(None).unwrap_err();
        assert!(matches!(err, BindError::ModelConstruction { .. }));
    }

    #[test]
    fn test_schema_ids_are_unique() {
        let a = ModelSchema::<Widget>::builder().default_constructor().build().unwrap();
        let b = ModelSchema::<Widget>::builder().default_constructor().build().unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_apply_scalar_and_collection() {
        #[derive(Default)]
        struct Search {
            page: u32,
            tags: Vec<i32>,
        }

        let page = Property::scalar("page", |m: &mut Search, v: u32| m.page = v);
        let tags = Property::collection("tags", |m: &mut Search, v: Vec<i32>| m.tags = v);
        let mut model = Search::default();

        page.apply(&mut model, SourceValue::Text(vec!["3".into()])).unwrap();
        tags.apply(&mut model, SourceValue::Text(vec!["1".into(), "x".into(), "2".into()]))
            .unwrap();
        assert!(page.apply(&mut model, SourceValue::Text(vec!["x".into()])).is_err());

        assert_eq!(model.page, 3);
        assert_eq!(model.tags, vec![1, 2]);
    }
}
