//! Route values captured by the host router.
//!
//! Routers usually capture one to four values per path, so storage is kept
//! inline on the stack for the common case.

use smallvec::SmallVec;

/// Maximum number of values stored inline (stack allocated).
const INLINE_VALUES: usize = 4;

/// Ordered route values as `(name, value)` pairs.
///
/// Lookups match names case-insensitively; the same name may appear more
/// than once (catch-all segments expanded by some routers).
///
/// # Example
///
/// ```rust
/// use thales_core::RouteValues;
///
/// let mut values = RouteValues::new();
/// values.push("id", "42");
///
/// assert_eq!(values.get("Id"), Some("42"));
/// assert_eq!(values.get_all("ID"), vec!["42"]);
/// assert_eq!(values.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteValues {
    inner: SmallVec<[(String, String); INLINE_VALUES]>,
}

impl RouteValues {
    /// Creates an empty set of route values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the first value whose name matches `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value whose name matches `name`, in insertion order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.inner
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if there are no route values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of route values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the route values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
