//! SourceCode tree: project -> package -> file -> class -> method.
//!
//! Supplied by the source scanner (as JSON) or synthesized from class names.
//! Class and method keys match the structural graph's keys so bytecode
//! measures attach directly.

use crate::domain::graph::StructuralGraph;
use crate::domain::metric::{AggregationKind, MeasureValue, Metric};
use crate::domain::resource::{file_of, package_of};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Project,
    Package,
    File,
    Class,
    Method,
}

impl Scope {
    fn child(self) -> Option<Scope> {
        match self {
            Scope::Project => Some(Scope::Package),
            Scope::Package => Some(Scope::File),
            Scope::File => Some(Scope::Class),
            Scope::Class => Some(Scope::Method),
            Scope::Method => None,
        }
    }
}

pub type TreeId = usize;

#[derive(Debug, Clone)]
pub struct SourceNode {
    pub key: String,
    pub scope: Scope,
    pub parent: Option<TreeId>,
    pub children: Vec<TreeId>,
    pub measures: BTreeMap<Metric, MeasureValue>,
}

#[derive(Debug, Clone)]
pub struct SourceTree {
    nodes: Vec<SourceNode>,
    index: HashMap<(Scope, String), TreeId>,
}

impl SourceTree {
    pub fn new(project: impl Into<String>) -> Self {
        let key = project.into();
        let root = SourceNode {
            key: key.clone(),
            scope: Scope::Project,
            parent: None,
            children: Vec::new(),
            measures: BTreeMap::new(),
        };
        Self {
            nodes: vec![root],
            index: HashMap::from([((Scope::Project, key), 0)]),
        }
    }

    /// Skeleton tree for a set of binary class names; inner classes join the
    /// file of their outermost class.
    pub fn from_class_names<I, S>(project: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new(project);
        let root = tree.root();
        for name in names {
            let name = name.as_ref();
            let package = tree.add_child(root, Scope::Package, package_of(name));
            let file = tree.add_child(package, Scope::File, &file_of(name));
            tree.add_child(file, Scope::Class, name);
        }
        tree
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let project: ProjectJson = serde_json::from_str(content).context("Invalid source tree JSON")?;
        let mut tree = Self::new(&project.key);
        let root = tree.root();
        tree.supply(root, project.measures)?;
        for package in project.packages {
            let p = tree.add_child(root, Scope::Package, &package.key);
            tree.supply(p, package.measures)?;
            for file in package.files {
                let f = tree.add_child(p, Scope::File, &file.key);
                tree.supply(f, file.measures)?;
                for class in file.classes {
                    let c = tree.add_child(f, Scope::Class, &class.key);
                    tree.supply(c, class.measures)?;
                    for method in class.methods {
                        let m = tree.add_child(c, Scope::Method, &method.key);
                        tree.supply(m, method.measures)?;
                    }
                }
            }
        }
        Ok(tree)
    }

    /// Add method nodes for every declared, non-synthetic method of the
    /// tree's classes.
    pub fn attach_methods(&mut self, graph: &StructuralGraph) {
        for class_id in self.ids(Scope::Class) {
            let Some(class) = graph.get(&self.nodes[class_id].key).and_then(|idx| graph.class(idx))
            else {
                continue;
            };
            for &m in &class.methods {
                if let Some(method) = graph.method(m)
                    && method.declared
                    && !method.access.is_synthetic()
                {
                    self.add_child(class_id, Scope::Method, &method.key);
                }
            }
        }
    }

    /// Insert once per (scope, key); an existing node is returned as is.
    pub fn add_child(&mut self, parent: TreeId, scope: Scope, key: &str) -> TreeId {
        if let Some(&id) = self.index.get(&(scope, key.to_string())) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(SourceNode {
            key: key.to_string(),
            scope,
            parent: Some(parent),
            children: Vec::new(),
            measures: BTreeMap::new(),
        });
        self.nodes[parent].children.push(id);
        self.index.insert((scope, key.to_string()), id);
        id
    }

    fn supply(&mut self, id: TreeId, measures: BTreeMap<Metric, f64>) -> Result<()> {
        for (metric, value) in measures {
            if metric.kind() != AggregationKind::Sum {
                bail!("`{metric}` on `{}` is computed by the engine", self.nodes[id].key);
            }
            let value = if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                MeasureValue::Int(value as i64)
            } else {
                MeasureValue::Double(value)
            };
            self.set_measure(id, metric, value);
        }
        Ok(())
    }

    pub fn root(&self) -> TreeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: TreeId) -> &SourceNode {
        &self.nodes[id]
    }

    pub fn find(&self, scope: Scope, key: &str) -> Option<TreeId> {
        self.index.get(&(scope, key.to_string())).copied()
    }

    /// Nodes of a scope in insertion order.
    pub fn ids(&self, scope: Scope) -> Vec<TreeId> {
        (0..self.nodes.len())
            .filter(|&id| self.nodes[id].scope == scope)
            .collect()
    }

    /// Nearest ancestor (or self) of the given scope.
    pub fn ancestor(&self, id: TreeId, scope: Scope) -> Option<TreeId> {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.nodes[c].scope == scope {
                return Some(c);
            }
            current = self.nodes[c].parent;
        }
        None
    }

    /// Children before parents.
    pub fn post_order(&self) -> Vec<TreeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root(), false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            for &child in self.nodes[id].children.iter().rev() {
                stack.push((child, false));
            }
        }
        out
    }

    pub fn measure(&self, id: TreeId, metric: Metric) -> Option<&MeasureValue> {
        self.nodes[id].measures.get(&metric)
    }

    pub fn set_measure(&mut self, id: TreeId, metric: Metric, value: MeasureValue) {
        self.nodes[id].measures.insert(metric, value);
    }

    pub fn remove_measure(&mut self, id: TreeId, metric: Metric) {
        self.nodes[id].measures.remove(&metric);
    }

    /// Check every node sits directly below a node of the enclosing scope.
    pub fn is_well_formed(&self) -> bool {
        self.nodes.iter().all(|node| match node.parent {
            None => node.scope == Scope::Project,
            Some(parent) => self.nodes[parent].scope.child() == Some(node.scope),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectJson {
    key: String,
    #[serde(default)]
    measures: BTreeMap<Metric, f64>,
    #[serde(default)]
    packages: Vec<PackageJson>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageJson {
    key: String,
    #[serde(default)]
    measures: BTreeMap<Metric, f64>,
    #[serde(default)]
    files: Vec<FileJson>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileJson {
    key: String,
    #[serde(default)]
    measures: BTreeMap<Metric, f64>,
    #[serde(default)]
    classes: Vec<ClassJson>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassJson {
    key: String,
    #[serde(default)]
    measures: BTreeMap<Metric, f64>,
    #[serde(default)]
    methods: Vec<MethodJson>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MethodJson {
    key: String,
    #[serde(default)]
    measures: BTreeMap<Metric, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_class_names() {
        let tree = SourceTree::from_class_names(
            "demo",
            ["tags/Tag", "tags/impl/Todo", "tags/impl/Todo$Item", "Main"],
        );
        assert!(tree.is_well_formed());
        assert_eq!(tree.ids(Scope::Package).len(), 3);
        assert_eq!(tree.ids(Scope::File).len(), 3);
        assert_eq!(tree.ids(Scope::Class).len(), 4);

        let inner = tree.find(Scope::Class, "tags/impl/Todo$Item").unwrap();
        let file = tree.ancestor(inner, Scope::File).unwrap();
        assert_eq!(tree.node(file).key, "tags/impl/Todo.java");
        let package = tree.ancestor(inner, Scope::Package).unwrap();
        assert_eq!(tree.node(package).key, "tags/impl");
    }

    #[test]
    fn test_from_json_with_measures() {
        let tree = SourceTree::from_json(
            r#"{
                "key": "demo",
                "packages": [{
                    "key": "tags",
                    "files": [{
                        "key": "tags/Tag.java",
                        "measures": { "lines": 12, "complexity": 1.5 },
                        "classes": [{ "key": "tags/Tag" }]
                    }]
                }]
            }"#,
        )
        .unwrap();
        let file = tree.find(Scope::File, "tags/Tag.java").unwrap();
        assert_eq!(tree.measure(file, Metric::Lines), Some(&MeasureValue::Int(12)));
        assert_eq!(
            tree.measure(file, Metric::Complexity),
            Some(&MeasureValue::Double(1.5))
        );
        assert!(tree.find(Scope::Class, "tags/Tag").is_some());
    }

    #[test]
    fn test_from_json_rejects_computed_metrics() {
        let err = SourceTree::from_json(r#"{ "key": "demo", "measures": { "rfc": 3 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("computed by the engine"));
    }

    #[test]
    fn test_post_order_visits_children_first() {
        let tree = SourceTree::from_class_names("demo", ["a/A"]);
        let order = tree.post_order();
        assert_eq!(order.last(), Some(&tree.root()));
        let class = tree.find(Scope::Class, "a/A").unwrap();
        let file = tree.find(Scope::File, "a/A.java").unwrap();
        let pos = |id| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(class) < pos(file));
    }
}
