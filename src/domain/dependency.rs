use crate::domain::edge::{Edge, Usage};
use crate::domain::source_tree::Scope;
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

/// Container-level dependency: class, file or package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub scope: Scope,
    pub key: String,
}

/// Dependency index across the three granularities.
///
/// Each (source, target) pair has at most one edge per scope; member edges
/// rolled into it add their weight.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    pub graph: DiGraph<Dependency, Edge>,
    index: HashMap<(Scope, String), NodeIndex>,
}

/// Flattened dependency edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub usage: Usage,
    pub weight: u32,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, scope: Scope, key: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(&(scope, key.to_string())) {
            return idx;
        }
        let idx = self.graph.add_node(Dependency {
            scope,
            key: key.to_string(),
        });
        self.index.insert((scope, key.to_string()), idx);
        idx
    }

    fn lookup(&self, scope: Scope, key: &str) -> Option<NodeIndex> {
        self.index.get(&(scope, key.to_string())).copied()
    }

    /// Roll `weight` into the edge `from -> to`, upgrading its usage.
    /// Self-dependencies are never recorded.
    pub fn add(&mut self, scope: Scope, from: &str, to: &str, usage: Usage, weight: u32) {
        if from == to {
            return;
        }
        let source = self.node(scope, from);
        let target = self.node(scope, to);
        match self.graph.find_edge(source, target) {
            Some(e) => {
                let edge = &mut self.graph[e];
                edge.usage = edge.usage.strongest(usage);
                edge.weight += weight;
            }
            None => {
                self.graph.add_edge(source, target, Edge { usage, weight });
            }
        }
    }

    pub fn edge(&self, scope: Scope, from: &str, to: &str) -> Option<Edge> {
        let e = self
            .graph
            .find_edge(self.lookup(scope, from)?, self.lookup(scope, to)?)?;
        Some(self.graph[e])
    }

    /// Edges of one scope, sorted by (from, to).
    pub fn edges(&self, scope: Scope) -> Vec<DependencyEdge> {
        let mut edges: Vec<DependencyEdge> = self
            .graph
            .edge_references()
            .filter(|e| self.graph[e.source()].scope == scope)
            .map(|e| DependencyEdge {
                from: self.graph[e.source()].key.clone(),
                to: self.graph[e.target()].key.clone(),
                usage: e.weight().usage,
                weight: e.weight().weight,
            })
            .collect();
        edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        edges
    }

    /// Distinct containers depending on `key` (CA).
    pub fn afferent(&self, scope: Scope, key: &str) -> usize {
        self.lookup(scope, key)
            .map(|idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
            .unwrap_or(0)
    }

    /// Distinct containers `key` depends on (CE).
    pub fn efferent(&self, scope: Scope, key: &str) -> usize {
        self.lookup(scope, key)
            .map(|idx| self.graph.neighbors_directed(idx, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    /// Total weight of the edges of `scope` whose ends both satisfy `within`.
    pub fn internal_weight<F>(&self, scope: Scope, within: F) -> u64
    where
        F: Fn(&str) -> bool,
    {
        self.graph
            .edge_references()
            .filter(|e| {
                let (s, t) = (&self.graph[e.source()], &self.graph[e.target()]);
                s.scope == scope && within(&s.key) && within(&t.key)
            })
            .map(|e| u64::from(e.weight().weight))
            .sum()
    }

    /// Number of strongly connected components of more than one node among
    /// the `scope` nodes satisfying `within`.
    pub fn cycles<F>(&self, scope: Scope, within: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let members: HashSet<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| self.graph[idx].scope == scope && within(&self.graph[idx].key))
            .collect();
        let sub = self
            .graph
            .filter_map(
                |idx, node| members.contains(&idx).then(|| node.clone()),
                |_, edge| Some(*edge),
            );
        tarjan_scc(&sub).iter().filter(|scc| scc.len() > 1).count()
    }
}
