//! Body hydration and the body object provider.
//!
//! Unlike the other sources, the body yields typed JSON values. A
//! [`BodyHydrator`] turns the raw payload into a [`BodyDocument`], and the
//! [`BodyValueProvider`] serves property values out of that document.

use crate::form::{form_kind, FormKind};
use crate::query::decode_pairs;
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use thales_core::{BindError, BindingContext, SourceId};

/// Default maximum body size for JSON hydration (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// A hydrated request body: one JSON object.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use thales_providers::BodyDocument;
///
/// let doc = BodyDocument::from_value(json!({"Name": "Widget", "note": null})).unwrap();
///
/// assert_eq!(doc.get("Name"), Some(&json!("Widget")));
/// assert_eq!(doc.get("name"), Some(&json!("Widget")));
/// assert_eq!(doc.get("note"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyDocument {
    fields: Map<String, Value>,
}

impl BodyDocument {
    /// Wraps a JSON object.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Wraps a JSON value, returning `None` unless it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::new(fields)),
            _ => None,
        }
    }

    /// Looks up a member by exact name, then case-insensitively.
    ///
    /// JSON `null` counts as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields
            .get(key)
            .filter(|v| !v.is_null())
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(k, v)| k.eq_ignore_ascii_case(key) && !v.is_null())
                    .map(|(_, v)| v)
            })
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the object has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the underlying object.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Deserializes the whole document into `T`.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the document does not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }
}

/// Turns a raw body payload into a [`BodyDocument`].
///
/// Hydrators are tried in registration order; the first one that returns a
/// document wins. A hydrator that does not understand the payload returns
/// `Ok(None)`.
#[async_trait]
pub trait BodyHydrator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Hydrates the payload.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] when the payload is meant for this hydrator
    /// but cannot be parsed. Such errors abort the bind.
    async fn hydrate(
        &self,
        ctx: &BindingContext,
        payload: &Bytes,
    ) -> Result<Option<BodyDocument>, BindError>;
}

fn is_json(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let Ok(mime) = content_type.parse::<mime::Mime>() else {
        return false;
    };

    mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON)
}

/// Hydrates JSON bodies.
///
/// Accepts `application/json`, `*/*+json` and requests without a content
/// type. An empty or whitespace-only payload yields no document.
#[derive(Debug, Clone)]
pub struct JsonHydrator {
    max_body_size: usize,
}

impl Default for JsonHydrator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY_SIZE)
    }
}

impl JsonHydrator {
    /// Creates a hydrator with the given size limit.
    #[must_use]
    pub fn new(max_body_size: usize) -> Self {
        Self { max_body_size }
    }

    /// Returns the size limit.
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}

#[async_trait]
impl BodyHydrator for JsonHydrator {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn hydrate(
        &self,
        ctx: &BindingContext,
        payload: &Bytes,
    ) -> Result<Option<BodyDocument>, BindError> {
        if !is_json(ctx.content_type()) {
            return Ok(None);
        }

        if payload.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        if payload.len() > self.max_body_size {
            return Err(BindError::payload_too_large(
                SourceId::Body,
                self.max_body_size,
                payload.len(),
            ));
        }

        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| BindError::body_parse(SourceId::Body, e.to_string()))?;

        match BodyDocument::from_value(value) {
            Some(doc) => Ok(Some(doc)),
            None => Err(BindError::body_parse(
                SourceId::Body,
                "expected a JSON object at the top level",
            )),
        }
    }
}

/// Hydrates URL-encoded form bodies into a string-valued document.
///
/// Repeated keys become arrays. Not registered by default; enable it with
/// `binding.hydrate_form_bodies`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormHydrator;

#[async_trait]
impl BodyHydrator for FormHydrator {
    fn name(&self) -> &'static str {
        "form"
    }

    async fn hydrate(
        &self,
        ctx: &BindingContext,
        payload: &Bytes,
    ) -> Result<Option<BodyDocument>, BindError> {
        if form_kind(ctx.content_type()) != Some(FormKind::UrlEncoded) || payload.is_empty() {
            return Ok(None);
        }

        let text = std::str::from_utf8(payload)
            .map_err(|e| BindError::body_parse(SourceId::Body, format!("form body is not UTF-8: {e}")))?;
        let pairs = decode_pairs(text).map_err(|reason| BindError::body_parse(SourceId::Body, reason))?;

        let mut fields = Map::new();
        for (key, value) in pairs {
            match fields.get_mut(&key) {
                Some(Value::Array(items)) => items.push(Value::String(value)),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value)]);
                }
                None => {
                    fields.insert(key, Value::String(value));
                }
            }
        }

        Ok(Some(BodyDocument::new(fields)))
    }
}

/// Object provider over the hydrated body.
///
/// With no document every lookup returns `None`.
#[derive(Debug, Clone, Default)]
pub struct BodyValueProvider {
    document: Option<Arc<BodyDocument>>,
}

impl BodyValueProvider {
    /// Creates a provider over an optional document.
    #[must_use]
    pub fn new(document: Option<Arc<BodyDocument>>) -> Self {
        Self { document }
    }

    /// The source this provider reads from.
    #[must_use]
    pub fn source(&self) -> SourceId {
        SourceId::Body
    }

    /// Returns the document, if the body was hydrated.
    #[must_use]
    pub fn document(&self) -> Option<&BodyDocument> {
        self.document.as_deref()
    }

    /// Returns the typed value stored under `key`.
    #[must_use]
    pub fn get_object(&self, key: &str) -> Option<&Value> {
        self.document.as_deref()?.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_ctx(body: &'static str) -> (BindingContext, Bytes) {
        let ctx = BindingContext::builder().json(body).build();
        let payload = ctx.body().bytes().clone();
        (ctx, payload)
    }

    #[test]
    fn test_document_exact_match_wins() {
        let doc = BodyDocument::from_value(json!({"id": 1, "ID": 2})).unwrap();
        assert_eq!(doc.get("ID"), Some(&json!(2)));
        assert_eq!(doc.get("id"), Some(&json!(1)));

        let doc = BodyDocument::from_value(json!({"name": "Widget"})).unwrap();
        assert_eq!(doc.get("NAME"), Some(&json!("Widget")));
    }

    #[test]
    fn test_document_null_falls_through_to_case_insensitive() {
        let doc = BodyDocument::from_value(json!({"Name": null, "name": "Widget"})).unwrap();
        assert_eq!(doc.get("Name"), Some(&json!("Widget")));

        let doc = BodyDocument::from_value(json!({"Name": null})).unwrap();
        assert_eq!(doc.get("Name"), None);
        assert_eq!(doc.get("name"), None);
    }

    #[test]
    fn test_document_rejects_non_object() {
        assert!(BodyDocument::from_value(json!([1, 2])).is_none());
        assert!(BodyDocument::from_value(json!("text")).is_none());
    }

    #[tokio::test]
    async fn test_json_object() {
        let (ctx, payload) = json_ctx(r#"{"name":"Widget","qty":3}"#);
        let doc = JsonHydrator::default()
            .hydrate(&ctx, &payload)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(doc.get("qty"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_json_empty_payload() {
        let (ctx, payload) = json_ctx("  \n ");
        let doc = JsonHydrator::default().hydrate(&ctx, &payload).await.unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_json_malformed() {
        let (ctx, payload) = json_ctx(r#"{"name":"#);
        let err = JsonHydrator::default()
            .hydrate(&ctx, &payload)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_json_top_level_array() {
        let (ctx, payload) = json_ctx("[1,2,3]");
        let err = JsonHydrator::default()
            .hydrate(&ctx, &payload)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("JSON object"));
    }

    #[tokio::test]
    async fn test_json_too_large() {
        let (ctx, payload) = json_ctx(r#"{"name":"Widget"}"#);
        let err = JsonHydrator::new(4).hydrate(&ctx, &payload).await.unwrap_err();

        assert!(matches!(err, BindError::PayloadTooLarge { max_size: 4, .. }));
    }

    #[tokio::test]
    async fn test_json_skips_other_content_types() {
        let ctx = BindingContext::builder()
            .header("content-type", "text/plain")
            .body("{}")
            .build();
        let payload = ctx.body().bytes().clone();

        assert!(JsonHydrator::default().hydrate(&ctx, &payload).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_suffix_content_type() {
        let ctx = BindingContext::builder()
            .header("content-type", "application/problem+json")
            .body(r#"{"a":1}"#)
            .build();
        let payload = ctx.body().bytes().clone();

        assert!(JsonHydrator::default().hydrate(&ctx, &payload).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_form_hydrator_repeated_keys() {
        let ctx = BindingContext::builder()
            .header("content-type", "application/x-www-form-urlencoded")
            .body("name=Widget&tag=a&tag=b&tag=c")
            .build();
        let payload = ctx.body().bytes().clone();

        let doc = FormHydrator.hydrate(&ctx, &payload).await.unwrap().unwrap();
        assert_eq!(doc.get("name"), Some(&json!("Widget")));
        assert_eq!(doc.get("tag"), Some(&json!(["a", "b", "c"])));
    }

    #[test]
    fn test_provider_without_document() {
        let provider = BodyValueProvider::default();
        assert!(provider.get_object("anything").is_none());
        assert_eq!(provider.source(), SourceId::Body);
    }
}
