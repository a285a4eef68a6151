//! Virtual method linker.
//!
//! Runs once on the complete graph, after the hierarchy index and before any
//! visitor: every overridable method declared on a class is linked to the
//! declarations with the same name and descriptor on its transitive
//! subclasses and implementors.

use crate::domain::graph::StructuralGraph;
use petgraph::graph::NodeIndex;
use tracing::info;

/// Returns the number of links added.
pub fn link(graph: &mut StructuralGraph) -> usize {
    let mut links: Vec<(NodeIndex, NodeIndex)> = Vec::new();

    for class in graph.classes() {
        let Some(node) = graph.class(class) else { continue };
        if !node.is_resolved() {
            continue;
        }
        let subclasses = graph.transitive_subclasses(class);
        if subclasses.is_empty() {
            continue;
        }
        for &method in &node.methods {
            let Some(declared) = graph.method(method) else { continue };
            if !declared.declared || !declared.is_virtual() {
                continue;
            }
            for &sub in &subclasses {
                if let Some(implementation) =
                    graph.declared_method(sub, &declared.name, &declared.descriptor)
                {
                    links.push((method, implementation));
                }
            }
        }
    }

    let count = links.len();
    for (method, implementation) in links {
        graph.add_override(method, implementation);
    }
    info!("Linked {count} overriding implementations");
    count
}
