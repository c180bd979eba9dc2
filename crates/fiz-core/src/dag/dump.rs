//! Human-readable dump of a dag hierarchy.
//!
//! The format is line oriented and meant for debugging and snapshot tests:
//!
//! ```text
//! Node: boil
//! 	StyleTags: [hot]
//! 	StyleMap: {"color": "red"}
//! Edge: water -(water)-> boil
//! Style: hot {"color": "red"}
//! Binding: default [hot]
//! Dag: kitchen
//! 	Node: oven
//! ```

use std::fmt;

use super::{Dag, GraphElement};
use crate::style::{DagStyle, StyleProperties};

struct PropertyList<'a>(&'a StyleProperties);

impl fmt::Display for PropertyList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key:?}: {value:?}")?;
        }
        write!(f, "}}")
    }
}

fn write_style(f: &mut fmt::Formatter<'_>, indent: &str, style: &DagStyle) -> fmt::Result {
    if !style.tags().is_empty() {
        let tags: Vec<String> = style.tags().iter().map(ToString::to_string).collect();
        writeln!(f, "{indent}\tStyleTags: [{}]", tags.join(", "))?;
    }
    if !style.properties().is_empty() {
        writeln!(f, "{indent}\tStyleMap: {}", PropertyList(style.properties()))?;
    }
    Ok(())
}

impl Dag {
    fn write_level(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "\t".repeat(depth);

        for node in self.nodes() {
            writeln!(f, "{indent}Node: {}", node.name())?;
            write_style(f, &indent, node.style())?;
        }
        for edge in self.edges() {
            writeln!(
                f,
                "{indent}Edge: {} -({})-> {}",
                self.element_name(edge.src_id()).unwrap_or_default(),
                edge.name(),
                self.element_name(edge.dest_id()).unwrap_or_default(),
            )?;
            write_style(f, &indent, edge.style())?;
        }
        for (name, properties) in self.flattened_styles() {
            writeln!(f, "{indent}Style: {name} {}", PropertyList(properties))?;
        }
        for (keyword, tags) in self.style_bindings() {
            let tags: Vec<String> = tags.iter().map(ToString::to_string).collect();
            writeln!(f, "{indent}Binding: {keyword} [{}]", tags.join(", "))?;
        }
        for child in self.child_dags() {
            writeln!(f, "{indent}Dag: {}", child.name())?;
            write_style(f, &indent, child.style())?;
            child.write_level(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_level(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        dag::{Dag, Edge, Node},
        identifier::Id,
        path::QualifiedPath,
        style::{DagStyle, StyleProperties},
    };

    #[test]
    fn test_dump_lists_every_element() {
        let mut properties = StyleProperties::new();
        properties.insert("color".to_string(), "red".to_string());
        let style = DagStyle::new(vec![QualifiedPath::single("hot")], properties.clone());

        let mut dag = Dag::new(Id::fresh(), "");
        let water = dag.add_node(Node::new(Id::fresh(), "water", DagStyle::default()));
        let boil = dag.add_node(Node::new(Id::fresh(), "boil", style));
        dag.add_edge(Edge::new(Id::fresh(), "water", water, boil, DagStyle::default()))
            .unwrap();
        dag.set_style("hot", properties);
        dag.add_style_binding("default", vec![QualifiedPath::single("hot")]);

        let mut child = Dag::new(Id::fresh(), "kitchen");
        child.add_node(Node::new(Id::fresh(), "oven", DagStyle::default()));
        dag.add_child_dag(child);

        let expected = "Node: water\n\
                        Node: boil\n\
                        \tStyleTags: [hot]\n\
                        \tStyleMap: {\"color\": \"red\"}\n\
                        Edge: water -(water)-> boil\n\
                        Style: hot {\"color\": \"red\"}\n\
                        Binding: default [hot]\n\
                        Dag: kitchen\n\
                        \tNode: oven\n";
        assert_eq!(dag.to_string(), expected);
    }
}
