//! Core value provider traits.
//!
//! A [`ValueProvider`] exposes key-based lookup over one string-valued
//! binding source. A [`ValueProviderFactory`] creates one provider per bind
//! call from the [`BindingContext`].

use async_trait::async_trait;
use thales_core::{BindError, BindingContext, SourceId, UploadedFile};

/// Key-based lookup over one string-valued binding source.
///
/// Lookups never fail: an absent key yields an empty sequence.
///
/// # Implementing `ValueProvider`
///
/// ```rust
/// use thales_core::SourceId;
/// use thales_providers::ValueProvider;
///
/// // Serves a fixed tenant id for every request.
/// struct TenantProvider {
///     source: SourceId,
///     tenant: String,
/// }
///
/// impl ValueProvider for TenantProvider {
///     fn source(&self) -> &SourceId {
///         &self.source
///     }
///
///     fn get_values(&self, key: &str) -> Vec<String> {
///         if key.eq_ignore_ascii_case("tenant") {
///             vec![self.tenant.clone()]
///         } else {
///             Vec::new()
///         }
///     }
/// }
///
/// let provider = TenantProvider { source: SourceId::custom("Tenant"), tenant: "acme".into() };
/// assert_eq!(provider.get_values("Tenant"), vec!["acme"]);
/// assert!(provider.get_values("other").is_empty());
/// ```
pub trait ValueProvider: Send + Sync {
    /// The source this provider reads from.
    fn source(&self) -> &SourceId;

    /// Returns every raw value stored under `key`, in source order.
    fn get_values(&self, key: &str) -> Vec<String>;

    /// Returns every uploaded file stored under `key`.
    ///
    /// Only sources that carry files override this.
    fn get_files(&self, _key: &str) -> Vec<UploadedFile> {
        Vec::new()
    }
}

/// Creates one [`ValueProvider`] per bind call.
///
/// Factories are registered once at startup and shared by every request.
#[async_trait]
pub trait ValueProviderFactory: Send + Sync {
    /// The source the created providers read from.
    fn source(&self) -> SourceId;

    /// Creates the provider for one request.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] when the underlying payload is malformed.
    async fn create(&self, ctx: &BindingContext) -> Result<Box<dyn ValueProvider>, BindError>;
}

/// A provider backed by a list of `(key, value)` pairs.
///
/// Used by the built-in query string, route, claim and URL-encoded form
/// providers, all of which match keys case-insensitively.
#[derive(Debug, Clone)]
pub struct PairsValueProvider {
    source: SourceId,
    pairs: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

impl PairsValueProvider {
    /// Creates a provider over `pairs`.
    #[must_use]
    pub fn new(source: SourceId, pairs: Vec<(String, String)>) -> Self {
        Self {
            source,
            pairs,
            files: Vec::new(),
        }
    }

    /// Creates a provider with no values.
    #[must_use]
    pub fn empty(source: SourceId) -> Self {
        Self::new(source, Vec::new())
    }

    /// Attaches uploaded files, looked up by their field name.
    #[must_use]
    pub fn with_files(mut self, files: Vec<UploadedFile>) -> Self {
        self.files = files;
        self
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no values or files are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.files.is_empty()
    }
}

impl ValueProvider for PairsValueProvider {
    fn source(&self) -> &SourceId {
        &self.source
    }

    fn get_values(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn get_files(&self, key: &str) -> Vec<UploadedFile> {
        self.files
            .iter()
            .filter(|f| f.field_name().eq_ignore_ascii_case(key))
            .cloned()
            .collect()
    }
}
