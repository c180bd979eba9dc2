//! Identifier management for graph elements.
//!
//! Every node, edge, and dag carries an [`Id`] that is unique across all
//! compilations and never reassigned once an element exists. Identifiers are
//! opaque: callers compare them, hash them, and print them, but never derive
//! meaning from their value.

use std::{fmt, str::FromStr};

use uuid::Uuid;

/// Opaque, globally unique identifier of a graph element.
///
/// # Examples
///
/// ```
/// use fiz_core::identifier::Id;
///
/// let first = Id::fresh();
/// let second = Id::fresh();
/// assert_ne!(first, second);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(Uuid);

impl Id {
    /// Generates a new random identifier.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
