//! Binding source identifiers.
//!
//! A [`SourceId`] names one origin of request data. The built-in identifiers
//! carry stable string names that are part of the public contract, so they
//! must never be renamed.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The order used for any property that has no explicit annotation and whose
/// model type and call-site declare no default order.
///
/// Existing models depend on this exact sequence.
pub const GLOBAL_FALLBACK_ORDER: [SourceId; 6] = [
    SourceId::Body,
    SourceId::Form,
    SourceId::Route,
    SourceId::QueryString,
    SourceId::Header,
    SourceId::Claim,
];

/// Identifier of a binding source.
///
/// # Example
///
/// ```rust
/// use thales_core::SourceId;
///
/// let id: SourceId = "querystring".parse().unwrap();
/// assert_eq!(id, SourceId::QueryString);
/// assert_eq!(id.to_string(), "QueryString");
///
/// let custom: SourceId = "Session".parse().unwrap();
/// assert_eq!(custom, SourceId::custom("Session"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    /// The hydrated request body (object provider).
    Body,
    /// Form fields and uploaded files.
    Form,
    /// Values captured by the router from the request path.
    Route,
    /// URL query string parameters.
    QueryString,
    /// HTTP request headers.
    Header,
    /// Claims of the authenticated principal.
    Claim,
    /// A host-defined source, built through [`SourceId::custom`] or parsing.
    Custom(CustomSource),
}

/// Name of a host-defined source.
///
/// Only constructible through [`SourceId::custom`] or [`FromStr`], so a name
/// matching a built-in source always resolves to the built-in variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomSource(Arc<str>);

impl CustomSource {
    /// Returns the source name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SourceId {
    /// Creates a custom source identifier.
    ///
    /// Names matching a built-in source (case-insensitively) resolve to the
    /// built-in variant.
    #[must_use]
    pub fn custom(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        Self::builtin(name).unwrap_or_else(|| Self::Custom(CustomSource(Arc::from(name))))
    }

    /// Returns the stable string name of this source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Body => "Body",
            Self::Form => "Form",
            Self::Route => "Route",
            Self::QueryString => "QueryString",
            Self::Header => "Header",
            Self::Claim => "Claim",
            Self::Custom(name) => name.as_str(),
        }
    }

    /// Returns true for the object-valued body source.
    #[must_use]
    pub fn is_body(&self) -> bool {
        matches!(self, Self::Body)
    }

    fn builtin(name: &str) -> Option<Self> {
        GLOBAL_FALLBACK_ORDER
            .iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(name))
            .cloned()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an empty source name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("binding source name must not be empty")]
pub struct EmptySourceName;

impl FromStr for SourceId {
    type Err = EmptySourceName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EmptySourceName);
        }
        Ok(Self::custom(trimmed))
    }
}

impl Serialize for SourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SourceIdVisitor;

        impl Visitor<'_> for SourceIdVisitor {
            type Value = SourceId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a binding source name")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(SourceIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_fallback_order_literal() {
        let names: Vec<_> = GLOBAL_FALLBACK_ORDER.iter().map(SourceId::as_str).collect();
        assert_eq!(
            names,
            vec!["Body", "Form", "Route", "QueryString", "Header", "Claim"]
        );
    }

    #[test]
    fn test_parse_builtin_case_insensitive() {
        assert_eq!("ROUTE".parse::<SourceId>().unwrap(), SourceId::Route);
        assert_eq!("header".parse::<SourceId>().unwrap(), SourceId::Header);
        assert_eq!(" Claim ".parse::<SourceId>().unwrap(), SourceId::Claim);
    }

    #[test]
    fn test_parse_custom() {
        let id: SourceId = "Session".parse().unwrap();
        assert!(matches!(id, SourceId::Custom(_)));
        assert_eq!(id.as_str(), "Session");
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!("".parse::<SourceId>().is_err());
        assert!("   ".parse::<SourceId>().is_err());
    }

    #[test]
    fn test_custom_with_builtin_name() {
        assert_eq!(SourceId::custom("body"), SourceId::Body);
        assert_eq!(SourceId::custom("Body"), GLOBAL_FALLBACK_ORDER[0]);
        assert!(!matches!(SourceId::custom("Body"), SourceId::Custom(_)));
    }

    #[test]
    fn test_custom_name_exposed() {
        let SourceId::Custom(custom) = SourceId::custom("Tenant") else {
            panic!("expected a custom source");
        };
        assert_eq!(custom.as_str(), "Tenant");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&vec![SourceId::Route, SourceId::custom("Tenant")]).unwrap();
        assert_eq!(json, r#"["Route","Tenant"]"#);

        let back: Vec<SourceId> = serde_json::from_str(r#"["querystring","Tenant"]"#).unwrap();
        assert_eq!(back, vec![SourceId::QueryString, SourceId::custom("Tenant")]);
    }

    #[test]
    fn test_is_body() {
        assert!(SourceId::Body.is_body());
        assert!(!SourceId::Form.is_body());
    }
}
