//! Conflict-resolution strategies.
//!
//! A strategy decides, before each candidate source is tried for a property,
//! whether that source should be attempted at all given the sources that
//! already supplied a value.

use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;
use thales_core::{SourceId, StrategyKind};

/// Decision function gating each candidate source of a property.
///
/// # Implementing `BindingStrategy`
///
/// ```rust
/// use indexmap::IndexSet;
/// use thales_core::SourceId;
/// use thales_engine::BindingStrategy;
///
/// /// Lets at most two sources supply a value.
/// #[derive(Debug)]
/// struct AtMostTwice;
///
/// impl BindingStrategy for AtMostTwice {
///     fn name(&self) -> &'static str {
///         "at_most_twice"
///     }
///
///     fn attempt(&self, bound: &IndexSet<SourceId>, _candidates: &[SourceId]) -> bool {
///         bound.len() < 2
///     }
/// }
///
/// let mut bound = IndexSet::new();
/// bound.insert(SourceId::Route);
/// assert!(AtMostTwice.attempt(&bound, &[]));
/// ```
pub trait BindingStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns true if the next candidate source should be attempted.
    ///
    /// `bound_sources` holds the sources that already supplied a value for
    /// this property, in binding order. `candidate_sources` is the
    /// property's full resolved order.
    fn attempt(&self, bound_sources: &IndexSet<SourceId>, candidate_sources: &[SourceId]) -> bool;
}

/// Shared handle to a strategy.
pub type StrategyRef = Arc<dyn BindingStrategy>;

/// Bind from the first source that yields a usable value; skip the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstInWins;

impl BindingStrategy for FirstInWins {
    fn name(&self) -> &'static str {
        "first_in_wins"
    }

    fn attempt(&self, bound_sources: &IndexSet<SourceId>, _candidate_sources: &[SourceId]) -> bool {
        bound_sources.is_empty()
    }
}

/// Attempt every source; each success overwrites the previous value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl BindingStrategy for Passthrough {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn attempt(&self, _bound_sources: &IndexSet<SourceId>, _candidate_sources: &[SourceId]) -> bool {
        true
    }
}

/// Returns the built-in strategy named by `kind`.
#[must_use]
pub fn strategy_for(kind: StrategyKind) -> StrategyRef {
    match kind {
        StrategyKind::FirstInWins => Arc::new(FirstInWins),
        StrategyKind::Passthrough => Arc::new(Passthrough),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use thales_core::GLOBAL_FALLBACK_ORDER;

    fn source() -> impl Strategy<Value = SourceId> {
        prop::sample::select(GLOBAL_FALLBACK_ORDER.to_vec())
    }

    #[test]
    fn test_first_in_wins_only_when_unbound() {
        let mut bound = IndexSet::new();
        assert!(FirstInWins.attempt(&bound, &GLOBAL_FALLBACK_ORDER));

        bound.insert(SourceId::Route);
        assert!(!FirstInWins.attempt(&bound, &GLOBAL_FALLBACK_ORDER));
    }

    #[test]
    fn test_strategy_for_kind() {
        assert_eq!(strategy_for(StrategyKind::FirstInWins).name(), "first_in_wins");
        assert_eq!(strategy_for(StrategyKind::Passthrough).name(), "passthrough");
    }

    proptest! {
        #[test]
        fn first_in_wins_refuses_after_any_binding(
            bound in prop::collection::vec(source(), 1..6),
            candidates in prop::collection::vec(source(), 0..6),
        ) {
            let bound: IndexSet<SourceId> = bound.into_iter().collect();
            prop_assert!(!FirstInWins.attempt(&bound, &candidates));
        }

        #[test]
        fn passthrough_always_attempts(
            bound in prop::collection::vec(source(), 0..6),
            candidates in prop::collection::vec(source(), 0..6),
        ) {
            let bound: IndexSet<SourceId> = bound.into_iter().collect();
            prop_assert!(Passthrough.attempt(&bound, &candidates));
        }
    }
}
