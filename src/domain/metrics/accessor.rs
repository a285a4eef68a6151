use crate::adapters::classfile::BodyShape;
use crate::adapters::classfile::descriptor::parse_method_descriptor;
use crate::domain::graph::StructuralGraph;
use crate::domain::metric::{MeasureValue, Metric};
use crate::domain::visitor::{BytecodeVisitor, VisitContext};
use petgraph::graph::NodeIndex;

/// Flags trivial getters and setters; records the per-class count.
#[derive(Debug, Default)]
pub struct AccessorVisitor {
    count: i64,
}

impl BytecodeVisitor for AccessorVisitor {
    fn visit_class(&mut self, _cx: &mut VisitContext<'_>, _class: NodeIndex) {
        self.count = 0;
    }

    fn visit_method(&mut self, cx: &mut VisitContext<'_>, method: NodeIndex) {
        if cx.is_accessor(method) {
            self.count += 1;
        }
    }

    fn leave_class(&mut self, cx: &mut VisitContext<'_>, class: NodeIndex) {
        if let Some(id) = cx.tree_class(class) {
            cx.tree
                .set_measure(id, Metric::Accessors, MeasureValue::Int(self.count));
        }
    }
}

/// Field read or written by an accessor method, `None` for anything else.
///
/// Getter: `get*`/`is*`, no parameters, body `aload_0; getfield; xreturn`.
/// Setter: `set*`, one parameter, void, body `aload_0; xload_1; putfield; return`.
/// The field must be declared by the method's own class.
pub fn accessed_field(graph: &StructuralGraph, method: NodeIndex) -> Option<NodeIndex> {
    let m = graph.method(method)?;
    if m.is_static() || m.is_constructor() || m.is_static_initializer() {
        return None;
    }
    let descriptor = parse_method_descriptor(&m.descriptor).ok()?;
    let field = match m.shape.as_ref()? {
        BodyShape::Getter(field)
            if (m.name.starts_with("get") || m.name.starts_with("is"))
                && descriptor.parameters.is_empty() =>
        {
            field
        }
        BodyShape::Setter(field)
            if m.name.starts_with("set")
                && descriptor.parameters.len() == 1
                && descriptor.return_type.is_none() =>
        {
            field
        }
        _ => return None,
    };

    let owner = graph.class(m.owner)?;
    if field.owner != owner.key {
        return None;
    }
    owner.fields.iter().copied().find(|&f| {
        graph
            .field(f)
            .is_some_and(|node| node.declared && !node.is_static() && node.name == field.name)
    })
}
