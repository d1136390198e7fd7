//! Binding context providing access to request data.
//!
//! The [`BindingContext`] is everything a value provider or body hydrator may
//! look at. Hosts build one per request from whatever HTTP stack they run.

use crate::{Claims, RouteValues};
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Request payload with a shared read position.
///
/// Several consumers may read the same payload. Readers that need the whole
/// payload open a [`BodyReadScope`], which rewinds to the start and puts the
/// position back where it was when the scope is dropped.
///
/// # Example
///
/// ```rust
/// use thales_core::RequestBody;
///
/// let body = RequestBody::new("hello world");
/// assert_eq!(&body.read(5)[..], b"hello");
///
/// {
///     let scope = body.scope();
///     assert_eq!(&scope.read_to_end()[..], b"hello world");
/// }
///
/// // The earlier reader continues where it left off.
/// assert_eq!(body.position(), 5);
/// assert_eq!(&body.remaining()[..], b" world");
/// ```
#[derive(Debug, Default)]
pub struct RequestBody {
    bytes: Bytes,
    position: AtomicUsize,
}

impl RequestBody {
    /// Wraps a payload with its read position at the start.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            position: AtomicUsize::new(0),
        }
    }

    /// Returns the full payload regardless of the read position.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Returns the payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the current read position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    /// Moves the read position, clamped to the payload length.
    pub fn seek(&self, position: usize) {
        self.position
            .store(position.min(self.bytes.len()), Ordering::Release);
    }

    /// Reads up to `max` bytes from the current position and advances it.
    #[must_use]
    pub fn read(&self, max: usize) -> Bytes {
        let start = self.position();
        let end = start.saturating_add(max).min(self.bytes.len());
        self.position.store(end, Ordering::Release);
        self.bytes.slice(start..end)
    }

    /// Returns the unread remainder without advancing.
    #[must_use]
    pub fn remaining(&self) -> Bytes {
        self.bytes.slice(self.position()..)
    }

    /// Opens a scope that rewinds to the start of the payload.
    ///
    /// The previous position is restored when the scope is dropped, on every
    /// exit path.
    #[must_use]
    pub fn scope(&self) -> BodyReadScope<'_> {
        let saved = self.position();
        self.seek(0);
        BodyReadScope { body: self, saved }
    }
}

impl Clone for RequestBody {
    fn clone(&self) -> Self {
        Self {
            bytes: self.bytes.clone(),
            position: AtomicUsize::new(self.position()),
        }
    }
}

/// Scoped, resettable read of a [`RequestBody`].
#[derive(Debug)]
pub struct BodyReadScope<'a> {
    body: &'a RequestBody,
    saved: usize,
}

impl BodyReadScope<'_> {
    /// Reads everything from the scope's position to the end of the payload.
    #[must_use]
    pub fn read_to_end(&self) -> Bytes {
        self.body.read(usize::MAX)
    }

    /// Returns the position that will be restored on drop.
    #[must_use]
    pub fn saved_position(&self) -> usize {
        self.saved
    }
}

impl Drop for BodyReadScope<'_> {
    fn drop(&mut self) {
        self.body.seek(self.saved);
    }
}

/// Cooperative cancellation signal for a bind call.
///
/// Clones share the same flag, so the host keeps one handle and gives the
/// other to the context.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Creates a flag that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once cancellation was signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Context providing access to all request data a bind may consult.
///
/// # Example
///
/// ```rust
/// use thales_core::{BindingContext, Claims, RouteValues};
/// use http::{HeaderMap, Method, Uri};
///
/// let mut route = RouteValues::new();
/// route.push("id", "123");
///
/// let ctx = BindingContext::new(
///     Method::GET,
///     Uri::from_static("/products/123?expand=true"),
///     HeaderMap::new(),
///     "",
///     route,
///     Claims::new(),
/// );
///
/// assert_eq!(ctx.route_values().get("id"), Some("123"));
/// assert_eq!(ctx.query_string(), Some("expand=true"));
/// ```
#[derive(Debug, Clone)]
pub struct BindingContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: RequestBody,
    route_values: RouteValues,
    claims: Claims,
    cancellation: CancellationFlag,
}

impl BindingContext {
    /// Creates a new binding context.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: impl Into<Bytes>,
        route_values: RouteValues,
        claims: Claims,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body: RequestBody::new(body),
            route_values,
            claims,
            cancellation: CancellationFlag::new(),
        }
    }

    /// Returns a builder for a binding context.
    #[must_use]
    pub fn builder() -> BindingContextBuilder {
        BindingContextBuilder::new()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a specific header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Returns the route values.
    #[must_use]
    pub fn route_values(&self) -> &RouteValues {
        &self.route_values
    }

    /// Returns the claims of the authenticated principal.
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Returns the cancellation flag of this bind.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    /// Returns true once the surrounding request was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Builder for constructing a [`BindingContext`].
#[derive(Debug, Default)]
pub struct BindingContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    route_values: RouteValues,
    claims: Claims,
    cancellation: CancellationFlag,
}

impl BindingContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method (defaults to `GET`).
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI (defaults to `/`).
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Sets the headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Appends a single header; invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body together with its content type.
    #[must_use]
    pub fn json(self, body: impl Into<Bytes>) -> Self {
        self.header("content-type", "application/json").body(body)
    }

    /// Sets the route values.
    #[must_use]
    pub fn route_values(mut self, values: RouteValues) -> Self {
        self.route_values = values;
        self
    }

    /// Adds a single route value.
    #[must_use]
    pub fn route_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.push(name, value);
        self
    }

    /// Sets the claims.
    #[must_use]
    pub fn claims(mut self, claims: Claims) -> Self {
        self.claims = claims;
        self
    }

    /// Adds a single claim.
    #[must_use]
    pub fn claim(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(kind, value);
        self
    }

    /// Shares a cancellation flag with the host.
    #[must_use]
    pub fn cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    /// Builds the binding context.
    #[must_use]
    pub fn build(self) -> BindingContext {
        BindingContext {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            body: RequestBody::new(self.body),
            route_values: self.route_values,
            claims: self.claims,
            cancellation: self.cancellation,
        }
    }
}
