use crate::domain::edge::EdgeView;
use crate::domain::graph::StructuralGraph;
use crate::domain::metric::{MeasureValue, Metric};
use crate::domain::metrics::accessor::accessed_field;
use crate::domain::resource::Resource;
use crate::domain::visitor::{BytecodeVisitor, VisitContext};
use petgraph::graph::NodeIndex;
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Lack of cohesion of methods, variant 4: connected components of the
/// graph linking each eligible method to the members of its own class it
/// reads, writes or calls.
#[derive(Debug, Default)]
pub struct Lcom4Visitor {
    current: Option<NodeIndex>,
    methods: Vec<NodeIndex>,
    eligible: HashSet<NodeIndex>,
    links: Vec<(NodeIndex, NodeIndex)>,
}

impl BytecodeVisitor for Lcom4Visitor {
    fn visit_class(&mut self, _cx: &mut VisitContext<'_>, class: NodeIndex) {
        self.current = Some(class);
        self.methods.clear();
        self.eligible.clear();
        self.links.clear();
    }

    fn visit_method(&mut self, cx: &mut VisitContext<'_>, method: NodeIndex) {
        let Some(m) = cx.graph.method(method) else { return };
        let excluded_accessor = cx.config.lcom4_exclude_accessors && cx.is_accessor(method);
        let eligible = !m.is_static()
            && !m.is_abstract()
            && !m.is_constructor()
            && !m.is_static_initializer()
            && m.has_body
            && !m.is_empty()
            && !excluded_accessor;
        if eligible {
            self.methods.push(method);
            self.eligible.insert(method);
        }
    }

    fn visit_edge(&mut self, cx: &mut VisitContext<'_>, edge: &EdgeView) {
        if !self.eligible.contains(&edge.source) {
            return;
        }
        let graph = cx.graph;
        let target = graph.resource(edge.target);
        let own = match target {
            Resource::Method(m) => Some(m.owner) == self.current,
            Resource::Field(f) => {
                Some(f.owner) == self.current && !cx.config.is_lcom4_excluded(&f.name)
            }
            Resource::Class(_) => false,
        };
        if !own || target.is_static_member() {
            return;
        }

        let member = if cx.config.lcom4_exclude_accessors {
            accessed_field(graph, edge.target).unwrap_or(edge.target)
        } else {
            edge.target
        };
        if let Some(field) = graph.field(member)
            && cx.config.is_lcom4_excluded(&field.name)
        {
            return;
        }
        self.links.push((edge.source, member));
    }

    fn leave_class(&mut self, cx: &mut VisitContext<'_>, class: NodeIndex) {
        let blocks = self.blocks(cx.graph, class);
        if let Some(id) = cx.tree_class(class) {
            cx.tree
                .set_measure(id, Metric::Lcom4, MeasureValue::Int(blocks.len() as i64));
            cx.tree
                .set_measure(id, Metric::Lcom4Blocks, MeasureValue::Blocks(blocks));
        }
    }
}

impl Lcom4Visitor {
    /// Partition of the current class, blocks sorted by their first key.
    ///
    /// A class with no eligible method is one block of all its instance
    /// members, so LCOM4 is never below 1.
    fn blocks(&self, graph: &StructuralGraph, class: NodeIndex) -> Vec<Vec<String>> {
        if self.methods.is_empty() {
            let Some(node) = graph.class(class) else {
                return vec![Vec::new()];
            };
            let mut block: Vec<String> = node
                .methods
                .iter()
                .chain(&node.fields)
                .map(|&m| graph.resource(m))
                .filter(|r| !r.is_static_member() && is_declared(r))
                .map(|r| r.key().to_string())
                .collect();
            block.sort();
            return vec![block];
        }

        let mut slots: HashMap<NodeIndex, usize> = HashMap::new();
        let mut members: Vec<NodeIndex> = Vec::new();
        let mut slot = |idx: NodeIndex, members: &mut Vec<NodeIndex>| {
            *slots.entry(idx).or_insert_with(|| {
                members.push(idx);
                members.len() - 1
            })
        };
        for &method in &self.methods {
            slot(method, &mut members);
        }
        let pairs: Vec<(usize, usize)> = self
            .links
            .iter()
            .map(|&(a, b)| (slot(a, &mut members), slot(b, &mut members)))
            .collect();

        let mut components = UnionFind::new(members.len());
        for (a, b) in pairs {
            components.union(a, b);
        }

        let mut grouped: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (i, &member) in members.iter().enumerate() {
            grouped
                .entry(components.find(i))
                .or_default()
                .push(graph.key(member).to_string());
        }
        let mut blocks: Vec<Vec<String>> = grouped
            .into_values()
            .map(|mut block| {
                block.sort();
                block
            })
            .collect();
        blocks.sort();
        blocks
    }
}

fn is_declared(resource: &Resource) -> bool {
    match resource {
        Resource::Method(m) => m.declared,
        Resource::Field(f) => f.declared,
        Resource::Class(_) => false,
    }
}
