//! Names of the built-in binding strategies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A built-in conflict-resolution strategy, by name.
///
/// Used wherever a strategy is chosen from text: derive attributes and
/// configuration files.
///
/// # Example
///
/// ```rust
/// use thales_core::StrategyKind;
///
/// assert_eq!("passthrough".parse::<StrategyKind>().unwrap(), StrategyKind::Passthrough);
/// assert_eq!("First-In-Wins".parse::<StrategyKind>().unwrap(), StrategyKind::FirstInWins);
/// assert_eq!(StrategyKind::default(), StrategyKind::FirstInWins);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Bind from the first source that yields a usable value.
    #[default]
    FirstInWins,
    /// Try every source; the last one that yields a value wins.
    Passthrough,
}

impl StrategyKind {
    /// Returns the canonical name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstInWins => "first_in_wins",
            Self::Passthrough => "passthrough",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown binding strategy '{0}' (expected 'first_in_wins' or 'passthrough')")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "firstinwins" => Ok(Self::FirstInWins),
            "passthrough" => Ok(Self::Passthrough),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}
