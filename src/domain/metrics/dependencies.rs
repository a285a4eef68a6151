use crate::domain::edge::{EdgeView, Usage};
use crate::domain::source_tree::{Scope, SourceTree, TreeId};
use crate::domain::visitor::{BytecodeVisitor, VisitContext};
use petgraph::graph::NodeIndex;

/// Rolls member and class edges up into class, file and package
/// dependencies. Only edges between two classes of the tree count.
#[derive(Debug, Default)]
pub struct DependenciesVisitor {
    current: Option<(NodeIndex, Containers)>,
}

#[derive(Debug, Clone)]
struct Containers {
    class: String,
    file: Option<String>,
    package: Option<String>,
}

impl Containers {
    fn of(tree: &SourceTree, class: TreeId) -> Self {
        let key = |scope| tree.ancestor(class, scope).map(|id| tree.node(id).key.clone());
        Self {
            class: tree.node(class).key.clone(),
            file: key(Scope::File),
            package: key(Scope::Package),
        }
    }
}

impl BytecodeVisitor for DependenciesVisitor {
    fn visit_class(&mut self, cx: &mut VisitContext<'_>, class: NodeIndex) {
        self.current = cx
            .tree_class(class)
            .map(|id| (class, Containers::of(cx.tree, id)));
    }

    fn visit_edge(&mut self, cx: &mut VisitContext<'_>, edge: &EdgeView) {
        let Some((class, from)) = &self.current else { return };
        let target_class = cx.graph.owner_class(edge.target);
        if target_class == *class {
            return;
        }
        let Some(to) = cx.tree_class(target_class).map(|id| Containers::of(cx.tree, id)) else {
            return;
        };

        let deps = &mut *cx.dependencies;
        deps.add(Scope::Class, &from.class, &to.class, edge.usage, edge.weight);
        if let (Some(a), Some(b)) = (&from.file, &to.file) {
            deps.add(Scope::File, a, b, Usage::Uses, edge.weight);
        }
        if let (Some(a), Some(b)) = (&from.package, &to.package) {
            deps.add(Scope::Package, a, b, Usage::Uses, edge.weight);
        }
    }

    fn leave_class(&mut self, _cx: &mut VisitContext<'_>, _class: NodeIndex) {
        self.current = None;
    }
}
