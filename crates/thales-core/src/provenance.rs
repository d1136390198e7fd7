//! Provenance of bound property values.

use crate::SourceId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Records which source supplied each bound property's current value.
///
/// Holds at most one entry per property. A property without an entry was
/// never bound and kept its constructed value.
///
/// # Example
///
/// ```rust
/// use thales_core::{Provenance, SourceId};
///
/// let mut provenance = Provenance::new();
/// provenance.record("Id", SourceId::Route);
/// provenance.record("Id", SourceId::Header);
///
/// assert_eq!(provenance.source_of("Id"), Some(&SourceId::Header));
/// assert_eq!(provenance.len(), 1);
/// assert!(provenance.source_of("Name").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Provenance {
    entries: IndexMap<String, SourceId>,
}

impl Provenance {
    /// Creates an empty provenance map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or overwrites) the source of a property.
    pub fn record(&mut self, property: impl Into<String>, source: SourceId) {
        self.entries.insert(property.into(), source);
    }

    /// Returns the source that supplied a property, if it was bound.
    #[must_use]
    pub fn source_of(&self, property: &str) -> Option<&SourceId> {
        self.entries.get(property)
    }

    /// Returns true if the property was bound from any source.
    #[must_use]
    pub fn is_bound(&self, property: &str) -> bool {
        self.entries.contains_key(property)
    }

    /// Returns the number of bound properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(property, source)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceId)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Capability of models that want to receive their own provenance map.
///
/// Register it on a schema with `with_provenance`; the binder hands the
/// finished map to the model before returning it.
pub trait ProvidesProvenance {
    /// Receives the provenance of the bind that produced this model.
    fn receive_provenance(&mut self, provenance: Provenance);
}
