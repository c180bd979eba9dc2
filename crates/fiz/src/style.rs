//! Style flattening.
//!
//! A named style `#name{#a #b; key: value; "text"}` is resolved into a single
//! property map when it is declared:
//!
//! 1. Every referenced tag is looked up in the current dag, in order, and its
//!    already flattened properties are copied in. Later tags overwrite earlier
//!    ones.
//! 2. The local entries are applied on top. Local properties always win.
//!
//! Description lines among the local entries are newline-joined into the
//! reserved [`DESCRIPTION_PROPERTY`](fiz_core::style::DESCRIPTION_PROPERTY).
//!
//! Styles attached to calls, namespaces, and variables keep their tags as
//! references; only their local entries are collapsed by [`element_style`].

use log::trace;

use fiz_core::{
    dag::Dag,
    path::QualifiedPath,
    style::{DagStyle, StyleProperties, append_description, merge_properties},
};
use fiz_parser::{
    Spanned,
    ast::{Style, StyleEntry},
};

/// Result of flattening a named style.
#[derive(Debug, Default)]
pub struct Flattened<'a> {
    pub properties: StyleProperties,
    /// Tag references that were not registered when the style was declared.
    pub missing: Vec<&'a Spanned<QualifiedPath>>,
}

/// Collapse the local entries of a style block into a property map.
pub fn local_properties(style: &Style) -> StyleProperties {
    let mut properties = StyleProperties::new();
    for entry in &style.entries {
        match entry {
            StyleEntry::Property { key, value } => {
                properties.insert(key.clone(), value.clone());
            }
            StyleEntry::Description(line) => append_description(&mut properties, line),
        }
    }
    properties
}

/// Flatten a named style against the styles registered in `dag`.
pub fn flatten_named<'a>(dag: &Dag, style: &'a Style) -> Flattened<'a> {
    let mut flattened = Flattened::default();
    for tag in &style.tags {
        match dag.style_properties_for(tag.inner()) {
            Some(referenced) => merge_properties(&mut flattened.properties, referenced),
            None => flattened.missing.push(tag),
        }
    }
    merge_properties(&mut flattened.properties, &local_properties(style));
    trace!(
        properties = flattened.properties.len(),
        missing = flattened.missing.len();
        "Flattened style"
    );
    flattened
}

/// Build the style of a call, namespace, or variable declaration.
pub fn element_style(style: Option<&Style>) -> DagStyle {
    style
        .map(|style| {
            let tags = style.tags.iter().map(|tag| tag.inner().clone()).collect();
            DagStyle::new(tags, local_properties(style))
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use fiz_core::{identifier::Id, style::DESCRIPTION_PROPERTY};
    use fiz_parser::Span;

    use super::*;

    fn tag(path: &str) -> Spanned<QualifiedPath> {
        Spanned::new(QualifiedPath::from(path), Span::new(0..path.len()))
    }

    fn property(key: &str, value: &str) -> StyleEntry {
        StyleEntry::Property {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn props(entries: &[(&str, &str)]) -> StyleProperties {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_local_properties_last_write_wins() {
        let style = Style {
            tags: vec![],
            entries: vec![property("k", "1"), property("j", "x"), property("k", "2")],
        };
        assert_eq!(local_properties(&style), props(&[("k", "2"), ("j", "x")]));
    }

    #[test]
    fn test_descriptions_are_newline_joined() {
        let style = Style {
            tags: vec![],
            entries: vec![
                StyleEntry::Description("first".to_string()),
                property("color", "red"),
                StyleEntry::Description("second".to_string()),
            ],
        };
        let properties = local_properties(&style);
        assert_eq!(properties[DESCRIPTION_PROPERTY], "first\nsecond");
        assert_eq!(properties["color"], "red");
    }

    #[test]
    fn test_later_tags_then_locals_win() {
        let mut dag = Dag::new(Id::fresh(), "");
        dag.set_style("a", props(&[("k", "1"), ("shape", "box")]));
        dag.set_style("b", props(&[("k", "2")]));

        let style = Style {
            tags: vec![tag("a"), tag("b")],
            entries: vec![property("shape", "oval")],
        };
        let flattened = flatten_named(&dag, &style);
        assert!(flattened.missing.is_empty());
        assert_eq!(flattened.properties, props(&[("k", "2"), ("shape", "oval")]));
    }

    #[test]
    fn test_missing_tags_are_reported_and_skipped() {
        let dag = Dag::new(Id::fresh(), "");
        let style = Style {
            tags: vec![tag("nope")],
            entries: vec![property("k", "1")],
        };
        let flattened = flatten_named(&dag, &style);
        assert_eq!(flattened.missing.len(), 1);
        assert_eq!(flattened.missing[0].inner().joined(), "nope");
        assert_eq!(flattened.properties, props(&[("k", "1")]));
    }

    #[test]
    fn test_flattening_is_idempotent() {
        let mut dag = Dag::new(Id::fresh(), "");
        dag.set_style("a", props(&[("k", "1")]));
        let style = Style {
            tags: vec![tag("a")],
            entries: vec![property("j", "2")],
        };
        let first = flatten_named(&dag, &style).properties;
        let second = flatten_named(&dag, &style).properties;
        assert_eq!(first, second);
    }

    #[test]
    fn test_element_style_keeps_tag_references() {
        let style = Style {
            tags: vec![tag("lib.hot")],
            entries: vec![property("color", "red")],
        };
        let element = element_style(Some(&style));
        assert_eq!(element.tags(), &[QualifiedPath::from("lib.hot")]);
        assert_eq!(element.properties(), &props(&[("color", "red")]));
        assert!(element_style(None).is_empty());
    }
}
