//! Visitor dispatch over the finished structural graph.
//!
//! Per class, in a fixed order, every visitor sees: the class; each declared
//! method followed by that method's outgoing edges; each declared field
//! followed by its edges; the class's own edges; then `leave_class`. All
//! visitors are driven through one step before the next step starts.

use crate::config::EngineConfig;
use crate::domain::dependency::DependencyGraph;
use crate::domain::edge::EdgeView;
use crate::domain::graph::StructuralGraph;
use crate::domain::metrics::accessor::accessed_field;
use crate::domain::source_tree::{Scope, SourceTree, TreeId};
use petgraph::graph::NodeIndex;

/// Shared state handed to every visitor callback.
pub struct VisitContext<'a> {
    pub graph: &'a StructuralGraph,
    pub config: &'a EngineConfig,
    pub tree: &'a mut SourceTree,
    pub dependencies: &'a mut DependencyGraph,
}

impl<'a> VisitContext<'a> {
    pub fn new(
        graph: &'a StructuralGraph,
        config: &'a EngineConfig,
        tree: &'a mut SourceTree,
        dependencies: &'a mut DependencyGraph,
    ) -> Self {
        Self {
            graph,
            config,
            tree,
            dependencies,
        }
    }

    /// Tree node of a graph class, if the tree holds it.
    pub fn tree_class(&self, class: NodeIndex) -> Option<TreeId> {
        self.tree.find(Scope::Class, self.graph.key(class))
    }

    /// Decided from the method's own body, so callers may ask about methods
    /// of the class that have not been visited yet.
    pub fn is_accessor(&self, method: NodeIndex) -> bool {
        accessed_field(self.graph, method).is_some()
    }
}

/// Visitor capability set. Every callback defaults to a no-op.
pub trait BytecodeVisitor {
    fn visit_class(&mut self, _cx: &mut VisitContext<'_>, _class: NodeIndex) {}

    fn visit_method(&mut self, _cx: &mut VisitContext<'_>, _method: NodeIndex) {}

    fn visit_field(&mut self, _cx: &mut VisitContext<'_>, _field: NodeIndex) {}

    fn visit_edge(&mut self, _cx: &mut VisitContext<'_>, _edge: &EdgeView) {}

    fn leave_class(&mut self, _cx: &mut VisitContext<'_>, _class: NodeIndex) {}
}

/// Drive `visitors` over `classes` in the given order.
pub fn dispatch<V: BytecodeVisitor>(
    cx: &mut VisitContext<'_>,
    classes: &[NodeIndex],
    visitors: &mut [V],
) {
    let graph = cx.graph;
    for &class in classes {
        let Some(node) = graph.class(class) else { continue };

        for v in visitors.iter_mut() {
            v.visit_class(cx, class);
        }

        for &method in &node.methods {
            if !graph.method(method).is_some_and(|m| m.declared) {
                continue;
            }
            for v in visitors.iter_mut() {
                v.visit_method(cx, method);
            }
            visit_edges(cx, graph, method, visitors);
        }

        for &field in &node.fields {
            if !graph.field(field).is_some_and(|f| f.declared) {
                continue;
            }
            for v in visitors.iter_mut() {
                v.visit_field(cx, field);
            }
            visit_edges(cx, graph, field, visitors);
        }

        visit_edges(cx, graph, class, visitors);

        for v in visitors.iter_mut() {
            v.leave_class(cx, class);
        }
    }
}

fn visit_edges<V: BytecodeVisitor>(
    cx: &mut VisitContext<'_>,
    graph: &StructuralGraph,
    source: NodeIndex,
    visitors: &mut [V],
) {
    for edge in graph.edges_from(source) {
        for v in visitors.iter_mut() {
            v.visit_edge(cx, &edge);
        }
    }
}
