//! Qualified names spanning nesting levels.
//!
//! A [`QualifiedPath`] is an ordered list of name segments. Variables and style
//! tags both use it: `ns.result` reaches the `result` variable of the child
//! level named `ns`, and `#lib.bold` names the `bold` tag of the child `lib`.

use std::fmt;

/// Separator placed between segments in the joined form of a path.
pub const SEPARATOR: char = '.';

/// An ordered sequence of name segments.
///
/// # Examples
///
/// ```
/// use fiz_core::path::QualifiedPath;
///
/// let path = QualifiedPath::from("kitchen.oven");
/// assert_eq!(path.segments(), ["kitchen", "oven"]);
/// assert_eq!(path.joined(), "kitchen.oven");
/// assert!(path.is_qualified());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedPath(Vec<String>);

impl QualifiedPath {
    /// Creates a path from its segments.
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Creates a single-segment path.
    pub fn single(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Borrow the segments in order.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The first segment, if any.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// The last segment, if any. For variables this is the local name.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` when the path reaches into at least one child level.
    pub fn is_qualified(&self) -> bool {
        self.0.len() > 1
    }

    /// The segments joined with [`SEPARATOR`], used as a registry key.
    pub fn joined(&self) -> String {
        self.0.join(&SEPARATOR.to_string())
    }
}

impl fmt::Display for QualifiedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.joined())
    }
}

impl From<&str> for QualifiedPath {
    /// Splits a joined path on [`SEPARATOR`].
    fn from(joined: &str) -> Self {
        Self(joined.split(SEPARATOR).map(str::to_string).collect())
    }
}

impl From<Vec<String>> for QualifiedPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl FromIterator<String> for QualifiedPath {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_segment() {
        let path = QualifiedPath::single("water");
        assert_eq!(path.len(), 1);
        assert_eq!(path.first(), Some("water"));
        assert_eq!(path.last(), Some("water"));
        assert!(!path.is_qualified());
        assert_eq!(path.to_string(), "water");
    }

    #[test]
    fn test_split_and_join() {
        let path = QualifiedPath::from("a.b.c");
        assert_eq!(path.segments(), ["a", "b", "c"]);
        assert_eq!(path.first(), Some("a"));
        assert_eq!(path.last(), Some("c"));
        assert_eq!(path.joined(), "a.b.c");
    }

    #[test]
    fn test_empty_path() {
        let path = QualifiedPath::default();
        assert!(path.is_empty());
        assert_eq!(path.last(), None);
        assert_eq!(path.joined(), "");
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    // ===================
    // Strategies
    // ===================

    /// Strategy for generating dot-free identifier segments.
    fn segment_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z_][a-zA-Z0-9_]{0,8}"
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Splitting the joined form of a path yields the original segments.
    fn check_joined_path_splits_back(segments: Vec<String>) -> Result<(), TestCaseError> {
        let path = QualifiedPath::new(segments.clone());
        let reparsed = QualifiedPath::from(path.joined().as_str());
        prop_assert_eq!(reparsed.segments(), segments.as_slice());
        prop_assert_eq!(path.is_qualified(), segments.len() > 1);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn joined_path_splits_back(segments in prop::collection::vec(segment_strategy(), 1..5)) {
            check_joined_path_splits_back(segments)?;
        }
    }
}
