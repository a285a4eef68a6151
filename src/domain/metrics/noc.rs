use crate::domain::metric::{MeasureValue, Metric};
use crate::domain::visitor::{BytecodeVisitor, VisitContext};
use petgraph::graph::NodeIndex;

/// Number of children: direct subclasses plus direct implementors, read from
/// the hierarchy index.
#[derive(Debug, Default)]
pub struct NocVisitor;

impl BytecodeVisitor for NocVisitor {
    fn visit_class(&mut self, cx: &mut VisitContext<'_>, class: NodeIndex) {
        let noc = cx.graph.subclasses(class).len() as i64;
        if let Some(id) = cx.tree_class(class) {
            cx.tree.set_measure(id, Metric::Noc, MeasureValue::Int(noc));
        }
    }
}
