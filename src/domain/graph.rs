use crate::domain::edge::{Edge, EdgeView, Usage};
use crate::domain::resource::{ClassNode, FieldNode, MethodNode, Resource};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};

/// Structural graph - classes, methods and fields as nodes, typed weighted
/// edges between them.
///
/// Resources are inserted once per key; the first insertion wins and later
/// inserts return the existing node. Hierarchy back-references (subclasses,
/// overriding implementations) live in side tables rather than in the nodes.
#[derive(Debug, Default)]
pub struct StructuralGraph {
    pub(crate) graph: DiGraph<Resource, Edge>,

    /// Resource key -> node
    key_to_node: HashMap<String, NodeIndex>,

    /// Direct subclasses and implementors, filled by `index_hierarchy`
    subclasses: HashMap<NodeIndex, Vec<NodeIndex>>,

    /// Declared method -> overriding methods, filled by the linker
    overrides: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl StructuralGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource unless its key is already present.
    pub fn add_resource(&mut self, resource: Resource) -> NodeIndex {
        if let Some(&idx) = self.key_to_node.get(resource.key()) {
            return idx;
        }
        let key = resource.key().to_string();
        let owner = match &resource {
            Resource::Method(m) => Some((m.owner, true)),
            Resource::Field(f) => Some((f.owner, false)),
            Resource::Class(_) => None,
        };
        let idx = self.graph.add_node(resource);
        self.key_to_node.insert(key, idx);

        if let Some((owner, is_method)) = owner
            && let Some(class) = self.class_mut(owner)
        {
            if is_method {
                class.methods.push(idx);
            } else {
                class.fields.push(idx);
            }
        }
        idx
    }

    /// Create or reinforce the edge `source -> target`.
    ///
    /// Returns `false` when the edge is refused: a resource never depends on
    /// itself, and a member never depends on its own class.
    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, usage: Usage) -> bool {
        if source == target || self.owner_class(source) == target {
            return false;
        }
        match self.graph.find_edge(source, target) {
            Some(e) => {
                let edge = &mut self.graph[e];
                edge.usage = edge.usage.strongest(usage);
                edge.weight += 1;
            }
            None => {
                self.graph.add_edge(source, target, Edge { usage, weight: 1 });
            }
        }
        true
    }

    pub fn get(&self, key: &str) -> Option<NodeIndex> {
        self.key_to_node.get(key).copied()
    }

    pub fn resource(&self, idx: NodeIndex) -> &Resource {
        &self.graph[idx]
    }

    pub fn key(&self, idx: NodeIndex) -> &str {
        self.graph[idx].key()
    }

    pub fn class(&self, idx: NodeIndex) -> Option<&ClassNode> {
        match &self.graph[idx] {
            Resource::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn class_mut(&mut self, idx: NodeIndex) -> Option<&mut ClassNode> {
        match &mut self.graph[idx] {
            Resource::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn method(&self, idx: NodeIndex) -> Option<&MethodNode> {
        match &self.graph[idx] {
            Resource::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn method_mut(&mut self, idx: NodeIndex) -> Option<&mut MethodNode> {
        match &mut self.graph[idx] {
            Resource::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn field(&self, idx: NodeIndex) -> Option<&FieldNode> {
        match &self.graph[idx] {
            Resource::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn field_mut(&mut self, idx: NodeIndex) -> Option<&mut FieldNode> {
        match &mut self.graph[idx] {
            Resource::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn owner_class(&self, idx: NodeIndex) -> NodeIndex {
        self.graph[idx].owner(idx)
    }

    /// All class nodes in insertion order.
    pub fn classes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(|&idx| matches!(self.graph[idx], Resource::Class(_)))
    }

    /// Outgoing edges of a resource in creation order.
    pub fn edges_from(&self, idx: NodeIndex) -> Vec<EdgeView> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| {
                (
                    e.id(),
                    EdgeView {
                        source: e.source(),
                        target: e.target(),
                        usage: e.weight().usage,
                        weight: e.weight().weight,
                    },
                )
            })
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, view)| view).collect()
    }

    pub fn edge(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeView> {
        let e = self.graph.find_edge(from, to)?;
        let edge = self.graph[e];
        Some(EdgeView {
            source: from,
            target: to,
            usage: edge.usage,
            weight: edge.weight,
        })
    }

    pub fn edge_by_keys(&self, from: &str, to: &str) -> Option<EdgeView> {
        self.edge(self.get(from)?, self.get(to)?)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.key_to_node.keys().map(String::as_str)
    }

    /// Every edge, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView> + '_ {
        self.graph.edge_references().map(|e| EdgeView {
            source: e.source(),
            target: e.target(),
            usage: e.weight().usage,
            weight: e.weight().weight,
        })
    }

    /// Rebuild the reverse multimap supertype -> direct subtypes.
    pub fn index_hierarchy(&mut self) {
        let mut subclasses: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        for idx in self.classes() {
            let Some(class) = self.class(idx) else { continue };
            let parents = class.super_class.iter().chain(class.interfaces.iter());
            for &parent in parents {
                let children = subclasses.entry(parent).or_default();
                if !children.contains(&idx) {
                    children.push(idx);
                }
            }
        }
        self.subclasses = subclasses;
    }

    pub fn subclasses(&self, class: NodeIndex) -> &[NodeIndex] {
        self.subclasses.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every class reachable downwards through the subclass index, breadth first.
    pub fn transitive_subclasses(&self, class: NodeIndex) -> Vec<NodeIndex> {
        let mut seen = HashSet::from([class]);
        let mut queue = VecDeque::from([class]);
        let mut out = Vec::new();
        while let Some(current) = queue.pop_front() {
            for &child in self.subclasses(current) {
                if seen.insert(child) {
                    out.push(child);
                    queue.push_back(child);
                }
            }
        }
        out
    }

    pub fn add_override(&mut self, method: NodeIndex, implementation: NodeIndex) {
        let links = self.overrides.entry(method).or_default();
        if !links.contains(&implementation) {
            links.push(implementation);
        }
    }

    pub fn overrides(&self, method: NodeIndex) -> &[NodeIndex] {
        self.overrides.get(&method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Method declared on `class` itself with the given signature.
    pub fn declared_method(&self, class: NodeIndex, name: &str, descriptor: &str) -> Option<NodeIndex> {
        self.class(class)?.methods.iter().copied().find(|&m| {
            self.method(m)
                .is_some_and(|m| m.declared && m.name == name && m.descriptor == descriptor)
        })
    }

    /// Resolve a method reference: the class, its superclass chain, then
    /// its interfaces.
    pub fn find_method(&self, class: NodeIndex, name: &str, descriptor: &str) -> Option<NodeIndex> {
        self.lookup_hierarchy(class, |c| self.declared_method(c, name, descriptor))
    }

    /// Resolve a field reference the same way as `find_method`.
    pub fn find_field(&self, class: NodeIndex, name: &str) -> Option<NodeIndex> {
        self.lookup_hierarchy(class, |c| {
            self.class(c)?.fields.iter().copied().find(|&f| {
                self.field(f).is_some_and(|f| f.declared && f.name == name)
            })
        })
    }

    fn lookup_hierarchy<F>(&self, class: NodeIndex, find: F) -> Option<NodeIndex>
    where
        F: Fn(NodeIndex) -> Option<NodeIndex>,
    {
        let mut seen = HashSet::new();
        let mut interfaces = VecDeque::new();

        let mut current = Some(class);
        while let Some(c) = current {
            if !seen.insert(c) {
                break;
            }
            if let Some(found) = find(c) {
                return Some(found);
            }
            let node = self.class(c)?;
            interfaces.extend(node.interfaces.iter().copied());
            current = node.super_class;
        }

        while let Some(c) = interfaces.pop_front() {
            if !seen.insert(c) {
                continue;
            }
            if let Some(found) = find(c) {
                return Some(found);
            }
            if let Some(node) = self.class(c) {
                interfaces.extend(node.interfaces.iter().copied());
            }
        }
        None
    }
}
