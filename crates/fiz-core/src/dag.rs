//! The dependency graph of a single nesting level.
//!
//! A [`Dag`] owns the nodes and edges declared at its level, the child dags
//! created by namespaces and imports, and four registries:
//!
//! - **Styles**: flattened named styles, keyed by name
//! - **Style bindings**: keyword to style tag lists
//! - **Variables**: variable name to the id of the node or child dag producing it
//! - **Variable styles**: variable name to the style declared on it
//!
//! Every edge endpoint is the id of a node or of a direct child dag of the
//! level holding the edge. [`Dag::add_edge`] rejects anything else, so the
//! invariant holds for every dag built through this API.

mod dump;
mod element;

pub use element::{Edge, GraphElement, Node};

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use petgraph::{algo::toposort, graphmap::DiGraphMap};
use thiserror::Error;

use crate::{
    identifier::Id,
    path::{QualifiedPath, SEPARATOR},
    style::{DagStyle, StyleProperties},
};

/// Errors raised when a dag operation would break a structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DagError {
    #[error("edge `{edge}` starts at `{endpoint}`, which is not an element of dag `{dag}`")]
    MissingSource {
        edge: String,
        endpoint: Id,
        dag: String,
    },

    #[error("edge `{edge}` ends at `{endpoint}`, which is not an element of dag `{dag}`")]
    MissingDestination {
        edge: String,
        endpoint: Id,
        dag: String,
    },

    #[error("dag `{dag}` contains a cycle through element `{element}`")]
    Cycle { dag: String, element: Id },
}

/// One nesting level of a compiled recipe.
#[derive(Debug, Clone)]
pub struct Dag {
    id: Id,
    name: String,
    parent_id: Option<Id>,
    style: DagStyle,
    node_map: IndexMap<Id, Node>,
    edge_map: IndexMap<Id, Edge>,
    child_dag_map: IndexMap<Id, Dag>,
    style_registry: IndexMap<String, StyleProperties>,
    style_binding_registry: IndexMap<String, Vec<QualifiedPath>>,
    var_table: IndexMap<String, Id>,
    var_style_table: IndexMap<String, Option<DagStyle>>,
    used_imports: IndexSet<String>,
}

impl Dag {
    /// Creates an empty root level.
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: None,
            style: DagStyle::default(),
            node_map: IndexMap::new(),
            edge_map: IndexMap::new(),
            child_dag_map: IndexMap::new(),
            style_registry: IndexMap::new(),
            style_binding_registry: IndexMap::new(),
            var_table: IndexMap::new(),
            var_style_table: IndexMap::new(),
            used_imports: IndexSet::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: Id) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_style(mut self, style: DagStyle) -> Self {
        self.style = style;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> Option<Id> {
        self.parent_id
    }

    pub fn style(&self) -> &DagStyle {
        &self.style
    }

    /// Gives the dag a new identity and name.
    ///
    /// Direct children are re-pointed at the new id. Used when an imported
    /// dag is adopted under a name chosen by the importer.
    pub fn reidentify(mut self, id: Id, name: impl Into<String>) -> Self {
        self.id = id;
        self.name = name.into();
        for child in self.child_dag_map.values_mut() {
            child.parent_id = Some(id);
        }
        self
    }

    /// Adds a node to this level and returns its id.
    pub fn add_node(&mut self, node: Node) -> Id {
        let id = node.id();
        trace!(dag = self.name.as_str(), node = node.name(); "Adding node");
        self.node_map.insert(id, node);
        id
    }

    /// Adds an edge whose endpoints both belong to this level.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::MissingSource`] or [`DagError::MissingDestination`]
    /// when an endpoint is neither a node nor a direct child dag of this level.
    pub fn add_edge(&mut self, edge: Edge) -> Result<Id, DagError> {
        if !self.has_endpoint(edge.src_id()) {
            return Err(DagError::MissingSource {
                edge: edge.name().to_string(),
                endpoint: edge.src_id(),
                dag: self.name.clone(),
            });
        }
        if !self.has_endpoint(edge.dest_id()) {
            return Err(DagError::MissingDestination {
                edge: edge.name().to_string(),
                endpoint: edge.dest_id(),
                dag: self.name.clone(),
            });
        }
        let id = edge.id();
        trace!(dag = self.name.as_str(), edge = edge.name(); "Adding edge");
        self.edge_map.insert(id, edge);
        Ok(id)
    }

    /// Attaches `child` below this level, setting its parent, and returns its id.
    pub fn add_child_dag(&mut self, mut child: Dag) -> Id {
        child.parent_id = Some(self.id);
        let id = child.id;
        trace!(dag = self.name.as_str(), child = child.name.as_str(); "Attaching child dag");
        self.child_dag_map.insert(id, child);
        id
    }

    /// Returns `true` if `id` may be used as an edge endpoint at this level.
    pub fn has_endpoint(&self, id: Id) -> bool {
        self.node_map.contains_key(&id) || self.child_dag_map.contains_key(&id)
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.node_map.get(&id)
    }

    pub fn edge(&self, id: Id) -> Option<&Edge> {
        self.edge_map.get(&id)
    }

    pub fn child_dag(&self, id: Id) -> Option<&Dag> {
        self.child_dag_map.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_map.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edge_map.values()
    }

    pub fn child_dags(&self) -> impl Iterator<Item = &Dag> {
        self.child_dag_map.values()
    }

    /// Registers a flattened named style, replacing any previous definition.
    pub fn set_style(&mut self, name: impl Into<String>, properties: StyleProperties) {
        self.style_registry.insert(name.into(), properties);
    }

    /// Looks up a flattened style by possibly qualified name.
    ///
    /// The joined name is tried in this level's registry first. Otherwise the
    /// first segment selects a child level and the lookup continues there with
    /// the remaining segments.
    pub fn style_properties_for(&self, path: &QualifiedPath) -> Option<&StyleProperties> {
        self.lookup_style(path.segments())
    }

    fn lookup_style(&self, segments: &[String]) -> Option<&StyleProperties> {
        if segments.is_empty() {
            return None;
        }
        let key = segments.join(&SEPARATOR.to_string());
        if let Some(properties) = self.style_registry.get(&key) {
            return Some(properties);
        }
        match segments {
            [first, rest @ ..] if !rest.is_empty() => {
                self.child_for_segment(first)?.lookup_style(rest)
            }
            _ => None,
        }
    }

    /// Binds a keyword to a list of style tags.
    pub fn add_style_binding(&mut self, keyword: impl Into<String>, tags: Vec<QualifiedPath>) {
        self.style_binding_registry.insert(keyword.into(), tags);
    }

    /// Binds a variable name to the node or child dag producing it.
    pub fn set_var_node(&mut self, name: impl Into<String>, id: Id) {
        self.var_table.insert(name.into(), id);
    }

    /// Resolves a possibly qualified variable to the id of its producer,
    /// wherever in the hierarchy that producer lives.
    pub fn var_node(&self, path: &QualifiedPath) -> Option<Id> {
        self.lookup_var(path.segments())
    }

    fn lookup_var(&self, segments: &[String]) -> Option<Id> {
        match segments {
            [] => None,
            [name] => self.var_table.get(name).copied(),
            [first, rest @ ..] => self.child_for_segment(first)?.lookup_var(rest),
        }
    }

    /// Resolves a variable to an endpoint usable by an edge at this level.
    ///
    /// A plain name yields the node or child dag bound to it. A qualified name
    /// yields the direct child dag selected by its first segment, provided the
    /// full path resolves.
    pub fn visible_producer(&self, path: &QualifiedPath) -> Option<Id> {
        match path.segments() {
            [] => None,
            [name] => self.var_table.get(name).copied(),
            [first, rest @ ..] => {
                let child = self.child_for_segment(first)?;
                child.lookup_var(rest)?;
                Some(child.id)
            }
        }
    }

    /// Records the style declared on a variable; `None` when it has none.
    pub fn set_var_style(&mut self, name: impl Into<String>, style: Option<DagStyle>) {
        self.var_style_table.insert(name.into(), style);
    }

    /// Looks up the style declared on a possibly qualified variable.
    pub fn var_style(&self, path: &QualifiedPath) -> Option<&DagStyle> {
        self.lookup_var_style(path.segments())
    }

    fn lookup_var_style(&self, segments: &[String]) -> Option<&DagStyle> {
        match segments {
            [] => None,
            [name] => self.var_style_table.get(name).and_then(Option::as_ref),
            [first, rest @ ..] => self.child_for_segment(first)?.lookup_var_style(rest),
        }
    }

    /// Selects the child dag a path segment refers to.
    ///
    /// A variable bound to a child dag takes precedence; otherwise the most
    /// recently attached child with that name is used.
    fn child_for_segment(&self, segment: &str) -> Option<&Dag> {
        if let Some(child) = self
            .var_table
            .get(segment)
            .and_then(|id| self.child_dag_map.get(id))
        {
            return Some(child);
        }
        self.child_dag_map
            .values()
            .rev()
            .find(|child| child.name == segment)
    }

    /// Records that this level imported `location`.
    pub fn add_used_import(&mut self, location: impl Into<String>) {
        self.used_imports.insert(location.into());
    }

    /// Absorbs every element and registry entry of `other` into this level.
    ///
    /// Entries of `other` overwrite same-keyed entries already present.
    /// Children of `other` are re-pointed at this level.
    pub fn merge(&mut self, other: Dag) {
        debug!(
            into = self.name.as_str(),
            from = other.name.as_str(),
            nodes = other.node_map.len(),
            edges = other.edge_map.len();
            "Merging dag"
        );
        let Dag {
            node_map,
            edge_map,
            child_dag_map,
            style_registry,
            style_binding_registry,
            var_table,
            var_style_table,
            used_imports,
            ..
        } = other;

        self.node_map.extend(node_map);
        self.edge_map.extend(edge_map);
        for child in child_dag_map.into_values() {
            self.add_child_dag(child);
        }
        self.style_registry.extend(style_registry);
        self.style_binding_registry.extend(style_binding_registry);
        self.var_table.extend(var_table);
        self.var_style_table.extend(var_style_table);
        self.used_imports.extend(used_imports);
    }

    /// Deep-copies the dag, assigning a fresh id to every dag, node, and edge.
    ///
    /// Edge endpoints and variable bindings are remapped so the copy is
    /// structurally identical to the original.
    pub fn with_fresh_ids(&self) -> Dag {
        let mut remap: HashMap<Id, Id> = HashMap::new();
        let mut copy = Dag::new(Id::fresh(), self.name.clone()).with_style(self.style.clone());
        copy.parent_id = self.parent_id;

        for node in self.node_map.values() {
            let fresh = node.with_id(Id::fresh());
            remap.insert(node.id(), fresh.id());
            copy.node_map.insert(fresh.id(), fresh);
        }
        for child in self.child_dag_map.values() {
            let fresh = child.with_fresh_ids();
            remap.insert(child.id, fresh.id);
            copy.add_child_dag(fresh);
        }

        let lookup = |id: Id| remap.get(&id).copied().unwrap_or(id);
        for edge in self.edge_map.values() {
            let fresh = edge.remapped(Id::fresh(), lookup(edge.src_id()), lookup(edge.dest_id()));
            copy.edge_map.insert(fresh.id(), fresh);
        }
        copy.var_table = self
            .var_table
            .iter()
            .map(|(name, id)| (name.clone(), lookup(*id)))
            .collect();

        copy.style_registry = self.style_registry.clone();
        copy.style_binding_registry = self.style_binding_registry.clone();
        copy.var_style_table = self.var_style_table.clone();
        copy.used_imports = self.used_imports.clone();
        copy
    }

    /// Flattened named styles declared at this level.
    pub fn flattened_styles(&self) -> &IndexMap<String, StyleProperties> {
        &self.style_registry
    }

    pub fn style_bindings(&self) -> &IndexMap<String, Vec<QualifiedPath>> {
        &self.style_binding_registry
    }

    pub fn var_bindings(&self) -> &IndexMap<String, Id> {
        &self.var_table
    }

    pub fn var_styles(&self) -> &IndexMap<String, Option<DagStyle>> {
        &self.var_style_table
    }

    pub fn used_imports(&self) -> &IndexSet<String> {
        &self.used_imports
    }

    /// The name of a node or direct child dag of this level.
    pub fn element_name(&self, id: Id) -> Option<&str> {
        self.node_map
            .get(&id)
            .map(GraphElement::name)
            .or_else(|| self.child_dag_map.get(&id).map(Dag::name))
    }

    /// Node names of this level, sorted.
    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.node_map.values().map(GraphElement::name).collect();
        names.sort_unstable();
        names
    }

    /// `(source name, destination name)` for every edge of this level, sorted.
    pub fn edge_name_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .edge_map
            .values()
            .map(|edge| {
                (
                    self.element_name(edge.src_id()).unwrap_or_default(),
                    self.element_name(edge.dest_id()).unwrap_or_default(),
                )
            })
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Orders the nodes and child dags of this level so every edge points
    /// forward.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::Cycle`] if the edges of this level form a cycle.
    pub fn topological_order(&self) -> Result<Vec<Id>, DagError> {
        let mut graph: DiGraphMap<Id, ()> = DiGraphMap::new();
        for id in self.node_map.keys().chain(self.child_dag_map.keys()) {
            graph.add_node(*id);
        }
        for edge in self.edge_map.values() {
            graph.add_edge(edge.src_id(), edge.dest_id(), ());
        }
        toposort(&graph, None).map_err(|cycle| DagError::Cycle {
            dag: self.name.clone(),
            element: cycle.node_id(),
        })
    }
}
