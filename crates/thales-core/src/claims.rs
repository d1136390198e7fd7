//! Claims of the authenticated principal.
//!
//! Authentication happens elsewhere; the host copies the principal's claims
//! into the binding context so models can bind from them.

/// A single claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Claim type, e.g. `sub` or `tenant_id`.
    pub kind: String,
    /// Claim value.
    pub value: String,
}

/// The claims of one principal, in issue order.
///
/// # Example
///
/// ```rust
/// use thales_core::Claims;
///
/// let claims = Claims::new()
///     .with("sub", "user-1")
///     .with("role", "admin")
///     .with("role", "auditor");
///
/// assert_eq!(claims.first("SUB"), Some("user-1"));
/// assert_eq!(claims.values("role"), vec!["admin", "auditor"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Claims {
    inner: Vec<Claim>,
}

impl Claims {
    /// Creates an empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a claim, builder style.
    #[must_use]
    pub fn with(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(kind, value);
        self
    }

    /// Adds a claim.
    pub fn push(&mut self, kind: impl Into<String>, value: impl Into<String>) {
        self.inner.push(Claim {
            kind: kind.into(),
            value: value.into(),
        });
    }

    /// Returns every value of claims of the given type (case-insensitive).
    #[must_use]
    pub fn values(&self, kind: &str) -> Vec<&str> {
        self.inner
            .iter()
            .filter(|c| c.kind.eq_ignore_ascii_case(kind))
            .map(|c| c.value.as_str())
            .collect()
    }

    /// Returns the first value of the given claim type.
    #[must_use]
    pub fn first(&self, kind: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|c| c.kind.eq_ignore_ascii_case(kind))
            .map(|c| c.value.as_str())
    }

    /// Returns true if there are no claims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over all claims.
    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.inner.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Claims {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut claims = Self::new();
        for (kind, value) in iter {
            claims.push(kind, value);
        }
        claims
    }
}
