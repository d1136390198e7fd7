//! Form value provider.
//!
//! Handles both `application/x-www-form-urlencoded` and
//! `multipart/form-data` payloads. Requests with any other content type get
//! an empty provider.

use crate::multipart::{read_multipart, MultipartLimits};
use crate::query::decode_pairs;
use crate::{PairsValueProvider, ValueProvider, ValueProviderFactory};
use async_trait::async_trait;
use thales_core::{BindError, BindingContext, SourceId};

/// The kind of form payload carried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormKind {
    UrlEncoded,
    Multipart,
}

/// Classifies a `Content-Type` header value.
pub(crate) fn form_kind(content_type: Option<&str>) -> Option<FormKind> {
    let mime: mime::Mime = content_type?.parse().ok()?;

    match (mime.type_(), mime.subtype()) {
        (mime::APPLICATION, mime::WWW_FORM_URLENCODED) => Some(FormKind::UrlEncoded),
        (mime::MULTIPART, mime::FORM_DATA) => Some(FormKind::Multipart),
        _ => None,
    }
}

/// Creates providers over form fields and uploaded files.
///
/// The payload is read through a [`thales_core::BodyReadScope`], so the
/// body position seen by other readers is unchanged afterwards.
///
/// # Example
///
/// ```rust
/// use thales_core::BindingContext;
/// use thales_providers::{FormProviderFactory, ValueProviderFactory};
///
/// # tokio_test::block_on(async {
/// let ctx = BindingContext::builder()
///     .header("content-type", "application/x-www-form-urlencoded")
///     .body("name=Widget&tag=a&tag=b")
///     .build();
/// let provider = FormProviderFactory::default().create(&ctx).await.unwrap();
///
/// assert_eq!(provider.get_values("name"), vec!["Widget"]);
/// assert_eq!(provider.get_values("tag"), vec!["a", "b"]);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormProviderFactory {
    limits: MultipartLimits,
}

impl FormProviderFactory {
    /// Creates a factory with the given multipart limits.
    #[must_use]
    pub fn new(limits: MultipartLimits) -> Self {
        Self { limits }
    }

    /// Returns the multipart limits.
    #[must_use]
    pub fn limits(&self) -> &MultipartLimits {
        &self.limits
    }
}

#[async_trait]
impl ValueProviderFactory for FormProviderFactory {
    fn source(&self) -> SourceId {
        SourceId::Form
    }

    async fn create(&self, ctx: &BindingContext) -> Result<Box<dyn ValueProvider>, BindError> {
        let content_type = ctx.content_type();

        let Some(kind) = form_kind(content_type) else {
            return Ok(Box::new(PairsValueProvider::empty(SourceId::Form)));
        };

        let payload = {
            let scope = ctx.body().scope();
            scope.read_to_end()
        };

        let provider = match kind {
            FormKind::UrlEncoded => {
                let text = std::str::from_utf8(&payload).map_err(|e| {
                    BindError::body_parse(SourceId::Form, format!("form body is not UTF-8: {e}"))
                })?;
                let pairs = decode_pairs(text)
                    .map_err(|reason| BindError::body_parse(SourceId::Form, reason))?;
                PairsValueProvider::new(SourceId::Form, pairs)
            }
            FormKind::Multipart => {
                let form =
                    read_multipart(content_type.unwrap_or_default(), payload, &self.limits).await?;
                tracing::debug!(
                    fields = form.fields.len(),
                    files = form.files.len(),
                    "read multipart form"
                );
                PairsValueProvider::new(SourceId::Form, form.fields).with_files(form.files)
            }
        };

        Ok(Box::new(provider))
    }
}
