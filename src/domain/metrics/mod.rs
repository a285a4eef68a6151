//! Metric visitors.
//!
//! The registered set is closed: one variant per visitor, dispatched
//! through [`BytecodeVisitor`]. Accessor detection comes first because RFC
//! and LCOM4 read its results for the same class.

pub mod accessor;
pub mod dependencies;
pub mod dit;
pub mod lcom4;
pub mod noc;
pub mod rfc;

pub use accessor::AccessorVisitor;
pub use dependencies::DependenciesVisitor;
pub use dit::DitVisitor;
pub use lcom4::Lcom4Visitor;
pub use noc::NocVisitor;
pub use rfc::RfcVisitor;

use crate::domain::edge::EdgeView;
use crate::domain::visitor::{BytecodeVisitor, VisitContext};
use petgraph::graph::NodeIndex;

#[derive(Debug)]
pub enum MetricVisitor {
    Accessor(AccessorVisitor),
    Dit(DitVisitor),
    Rfc(RfcVisitor),
    Noc(NocVisitor),
    Lcom4(Lcom4Visitor),
    Dependencies(DependenciesVisitor),
}

impl MetricVisitor {
    /// The standard visitor list, in dispatch order.
    pub fn standard() -> Vec<MetricVisitor> {
        vec![
            MetricVisitor::Accessor(AccessorVisitor::default()),
            MetricVisitor::Dit(DitVisitor),
            MetricVisitor::Rfc(RfcVisitor::default()),
            MetricVisitor::Noc(NocVisitor),
            MetricVisitor::Lcom4(Lcom4Visitor::default()),
            MetricVisitor::Dependencies(DependenciesVisitor::default()),
        ]
    }

    fn inner(&mut self) -> &mut dyn BytecodeVisitor {
        match self {
            MetricVisitor::Accessor(v) => v,
            MetricVisitor::Dit(v) => v,
            MetricVisitor::Rfc(v) => v,
            MetricVisitor::Noc(v) => v,
            MetricVisitor::Lcom4(v) => v,
            MetricVisitor::Dependencies(v) => v,
        }
    }
}

impl BytecodeVisitor for MetricVisitor {
    fn visit_class(&mut self, cx: &mut VisitContext<'_>, class: NodeIndex) {
        self.inner().visit_class(cx, class);
    }

    fn visit_method(&mut self, cx: &mut VisitContext<'_>, method: NodeIndex) {
        self.inner().visit_method(cx, method);
    }

    fn visit_field(&mut self, cx: &mut VisitContext<'_>, field: NodeIndex) {
        self.inner().visit_field(cx, field);
    }

    fn visit_edge(&mut self, cx: &mut VisitContext<'_>, edge: &EdgeView) {
        self.inner().visit_edge(cx, edge);
    }

    fn leave_class(&mut self, cx: &mut VisitContext<'_>, class: NodeIndex) {
        self.inner().leave_class(cx, class);
    }
}
