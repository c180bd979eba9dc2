//! Queries over a compiled dag.
//!
//! These answer the questions a tutorial asks about a learner's recipe, such
//! as whether a node feeds two others or whether any node carries a style.
//! All of them look at a single level.

use indexmap::IndexMap;

use fiz_core::{
    dag::{Dag, GraphElement, Node},
    identifier::Id,
};

/// Number of edges ending at `id`.
pub fn in_degree(dag: &Dag, id: Id) -> usize {
    dag.edges().filter(|edge| edge.dest_id() == id).count()
}

/// Number of edges starting at `id`.
pub fn out_degree(dag: &Dag, id: Id) -> usize {
    dag.edges().filter(|edge| edge.src_id() == id).count()
}

/// How many variables are bound to each element, in first-binding order.
///
/// An element bound by `a, b = f()` or aliased by `c = a` counts once per name.
pub fn var_counts(dag: &Dag) -> IndexMap<Id, usize> {
    let mut counts = IndexMap::new();
    for id in dag.var_bindings().values() {
        *counts.entry(*id).or_insert(0) += 1;
    }
    counts
}

/// Nodes referencing at least one style tag that resolves to a non-empty
/// flattened style.
pub fn style_tagged_nodes(dag: &Dag) -> Vec<&Node> {
    dag.nodes()
        .filter(|node| {
            node.style_tags().iter().any(|tag| {
                dag.style_properties_for(tag)
                    .is_some_and(|properties| !properties.is_empty())
            })
        })
        .collect()
}

/// Nodes without incoming edges.
pub fn sources(dag: &Dag) -> Vec<&Node> {
    dag.nodes().filter(|node| in_degree(dag, node.id()) == 0).collect()
}

/// Nodes without outgoing edges.
pub fn sinks(dag: &Dag) -> Vec<&Node> {
    dag.nodes().filter(|node| out_degree(dag, node.id()) == 0).collect()
}

#[cfg(test)]
mod tests {
    use fiz_core::{
        dag::Edge,
        path::QualifiedPath,
        style::{DagStyle, StyleProperties},
    };

    use super::*;

    fn node(dag: &mut Dag, name: &str, tags: &[&str]) -> Id {
        let tags = tags.iter().map(|tag| QualifiedPath::from(*tag)).collect();
        dag.add_node(Node::new(Id::fresh(), name, DagStyle::new(tags, StyleProperties::new())))
    }

    fn edge(dag: &mut Dag, src: Id, dest: Id) {
        dag.add_edge(Edge::new(Id::fresh(), "", src, dest, DagStyle::default()))
            .unwrap();
    }

    #[test]
    fn test_degrees() {
        let mut dag = Dag::new(Id::fresh(), "");
        let a = node(&mut dag, "a", &[]);
        let b = node(&mut dag, "b", &[]);
        let c = node(&mut dag, "c", &[]);
        edge(&mut dag, a, b);
        edge(&mut dag, a, c);
        edge(&mut dag, b, c);

        assert_eq!(out_degree(&dag, a), 2);
        assert_eq!(in_degree(&dag, a), 0);
        assert_eq!(in_degree(&dag, c), 2);
        assert_eq!(sources(&dag).len(), 1);
        assert_eq!(sinks(&dag)[0].name(), "c");
    }

    #[test]
    fn test_var_counts() {
        let mut dag = Dag::new(Id::fresh(), "");
        let a = node(&mut dag, "a", &[]);
        let b = node(&mut dag, "b", &[]);
        dag.set_var_node("x", a);
        dag.set_var_node("y", a);
        dag.set_var_node("z", b);

        let counts = var_counts(&dag);
        assert_eq!(counts[&a], 2);
        assert_eq!(counts[&b], 1);
    }

    #[test]
    fn test_style_tagged_nodes_need_non_empty_styles() {
        let mut dag = Dag::new(Id::fresh(), "");
        dag.set_style("hot", [("color".to_string(), "red".to_string())].into_iter().collect());
        dag.set_style("empty", StyleProperties::new());
        node(&mut dag, "styled", &["hot"]);
        node(&mut dag, "blank", &["empty"]);
        node(&mut dag, "unknown", &["missing"]);
        node(&mut dag, "plain", &[]);

        let tagged: Vec<&str> = style_tagged_nodes(&dag).iter().map(|n| n.name()).collect();
        assert_eq!(tagged, ["styled"]);
    }
}
