use crate::domain::edge::EdgeView;
use crate::domain::metric::{MeasureValue, Metric};
use crate::domain::resource::Resource;
use crate::domain::visitor::{BytecodeVisitor, VisitContext};
use petgraph::graph::NodeIndex;
use std::collections::HashSet;

/// Response for class: own declared methods plus the methods they call
/// directly, deduplicated.
#[derive(Debug, Default)]
pub struct RfcVisitor {
    current: Option<NodeIndex>,
    own: HashSet<NodeIndex>,
    called: HashSet<NodeIndex>,
}

impl BytecodeVisitor for RfcVisitor {
    fn visit_class(&mut self, _cx: &mut VisitContext<'_>, class: NodeIndex) {
        self.current = Some(class);
        self.own.clear();
        self.called.clear();
    }

    fn visit_method(&mut self, _cx: &mut VisitContext<'_>, method: NodeIndex) {
        self.own.insert(method);
    }

    fn visit_edge(&mut self, cx: &mut VisitContext<'_>, edge: &EdgeView) {
        let graph = cx.graph;
        let from_own_method = matches!(
            graph.resource(edge.source),
            Resource::Method(m) if Some(m.owner) == self.current
        );
        if from_own_method && graph.method(edge.target).is_some() {
            self.called.insert(edge.target);
        }
    }

    fn leave_class(&mut self, cx: &mut VisitContext<'_>, class: NodeIndex) {
        let exclude = cx.config.rfc_exclude_accessors;
        let own_accessor =
            |m: NodeIndex| cx.is_accessor(m) && cx.graph.method(m).is_some_and(|n| n.owner == class);
        let response = self
            .own
            .union(&self.called)
            .filter(|&&m| !(exclude && own_accessor(m)))
            .count();
        if let Some(id) = cx.tree_class(class) {
            cx.tree
                .set_measure(id, Metric::Rfc, MeasureValue::Int(response as i64));
        }
    }
}
