//! Style tags and property maps.
//!
//! Styles are string-valued property maps. Writing a key that already exists
//! replaces its value (last write wins); the insertion order of an
//! [`IndexMap`] is kept only so dumps stay deterministic.

use indexmap::IndexMap;

use crate::path::QualifiedPath;

/// Reserved property collecting free-text description lines.
pub const DESCRIPTION_PROPERTY: &str = "description";

/// Property name to value mapping.
pub type StyleProperties = IndexMap<String, String>;

/// Style attached directly to a graph element or a variable declaration.
///
/// Tags are kept as references (resolved downstream against the flattened
/// style registry); properties are already local to the element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DagStyle {
    tags: Vec<QualifiedPath>,
    properties: StyleProperties,
}

impl DagStyle {
    /// Create a style from tag references and local properties.
    pub fn new(tags: Vec<QualifiedPath>, properties: StyleProperties) -> Self {
        Self { tags, properties }
    }

    /// Borrow the referenced style tags in declaration order.
    pub fn tags(&self) -> &[QualifiedPath] {
        &self.tags
    }

    /// Borrow the local property map.
    pub fn properties(&self) -> &StyleProperties {
        &self.properties
    }

    /// Returns `true` if the style has neither tags nor properties.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.properties.is_empty()
    }
}

/// Copy every entry of `source` into `target`, overwriting same-named keys.
pub fn merge_properties(target: &mut StyleProperties, source: &StyleProperties) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

/// Append a description line, newline-joining with any existing description.
pub fn append_description(properties: &mut StyleProperties, line: &str) {
    properties
        .entry(DESCRIPTION_PROPERTY.to_string())
        .and_modify(|existing| {
            existing.push('\n');
            existing.push_str(line);
        })
        .or_insert_with(|| line.to_string());
}
