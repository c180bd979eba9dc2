//! Nodes and edges stored inside a [`Dag`](super::Dag) level.

use crate::{
    identifier::Id,
    path::QualifiedPath,
    style::{DagStyle, StyleProperties},
};

/// Common accessors shared by every element placed in a dag.
pub trait GraphElement {
    fn id(&self) -> Id;

    fn name(&self) -> &str;

    fn style(&self) -> &DagStyle;

    /// Style tags referenced by this element, in declaration order.
    fn style_tags(&self) -> &[QualifiedPath] {
        self.style().tags()
    }

    /// Local style properties of this element.
    fn style_properties(&self) -> &StyleProperties {
        self.style().properties()
    }
}

/// A step in a recipe, produced by a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: Id,
    name: String,
    style: DagStyle,
}

impl Node {
    pub fn new(id: Id, name: impl Into<String>, style: DagStyle) -> Self {
        Self {
            id,
            name: name.into(),
            style,
        }
    }

    pub(super) fn with_id(&self, id: Id) -> Self {
        Self { id, ..self.clone() }
    }
}

impl GraphElement for Node {
    fn id(&self) -> Id {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn style(&self) -> &DagStyle {
        &self.style
    }
}

/// A data dependency from a producer to a consuming call.
///
/// Either endpoint may name a node or a child dag of the level holding the
/// edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    id: Id,
    name: String,
    src_id: Id,
    dest_id: Id,
    style: DagStyle,
}

impl Edge {
    pub fn new(id: Id, name: impl Into<String>, src_id: Id, dest_id: Id, style: DagStyle) -> Self {
        Self {
            id,
            name: name.into(),
            src_id,
            dest_id,
            style,
        }
    }

    /// The producing endpoint.
    pub fn src_id(&self) -> Id {
        self.src_id
    }

    /// The consuming endpoint.
    pub fn dest_id(&self) -> Id {
        self.dest_id
    }

    pub(super) fn remapped(&self, id: Id, src_id: Id, dest_id: Id) -> Self {
        Self {
            id,
            src_id,
            dest_id,
            ..self.clone()
        }
    }
}

impl GraphElement for Edge {
    fn id(&self) -> Id {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn style(&self) -> &DagStyle {
        &self.style
    }
}
