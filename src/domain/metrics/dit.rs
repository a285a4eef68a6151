use crate::domain::graph::StructuralGraph;
use crate::domain::metric::{MeasureValue, Metric};
use crate::domain::visitor::{BytecodeVisitor, VisitContext};
use petgraph::graph::NodeIndex;
use std::collections::HashSet;

/// Depth of inheritance tree.
#[derive(Debug, Default)]
pub struct DitVisitor;

impl BytecodeVisitor for DitVisitor {
    fn visit_class(&mut self, cx: &mut VisitContext<'_>, class: NodeIndex) {
        let dit = depth(cx.graph, class);
        if let Some(id) = cx.tree_class(class) {
            cx.tree.set_measure(id, Metric::Dit, MeasureValue::Int(dit));
        }
    }
}

/// Superclass links climbed from `class` to its last resolved ancestor.
/// An unresolved parent is not counted, and a cycle ends the climb.
pub fn depth(graph: &StructuralGraph, class: NodeIndex) -> i64 {
    let mut depth = 0;
    let mut seen = HashSet::from([class]);
    let mut current = class;
    while let Some(node) = graph.class(current)
        && node.is_resolved()
        && let Some(parent) = node.super_class
        && graph.class(parent).is_some_and(|p| p.is_resolved())
        && seen.insert(parent)
    {
        depth += 1;
        current = parent;
    }
    depth
}
