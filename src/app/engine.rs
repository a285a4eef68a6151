use crate::adapters::classpath::ClasspathResolver;
use crate::app::dto::*;
use crate::config::EngineConfig;
use crate::domain::aggregation::aggregate;
use crate::domain::builder::GraphBuilder;
use crate::domain::dependency::DependencyGraph;
use crate::domain::edge::{Edge, EdgeView};
use crate::domain::graph::StructuralGraph;
use crate::domain::linker;
use crate::domain::metric::{MeasureValue, Metric};
use crate::domain::metrics::MetricVisitor;
use crate::domain::ports::{ChainedSource, ClassSource};
use crate::domain::source_tree::{Scope, SourceTree};
use crate::domain::visitor::{VisitContext, dispatch};
use anyhow::{Context as _, Result};
use petgraph::graph::NodeIndex;
use std::path::{Path, PathBuf};
use tracing::info;

/// What to analyze.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub project: String,
    /// Directories and archives holding the classes to measure.
    pub classes: Vec<PathBuf>,
    /// Directories and archives only used to resolve referenced classes.
    pub libraries: Vec<PathBuf>,
    /// SourceCode tree from the source scanner; synthesized from the
    /// analyzable class names when absent.
    pub tree: Option<SourceTree>,
}

impl AnalysisInput {
    pub fn new(project: impl Into<String>, classes: Vec<PathBuf>) -> Self {
        Self {
            project: project.into(),
            classes,
            libraries: Vec::new(),
            tree: None,
        }
    }

    pub fn with_libraries(mut self, libraries: Vec<PathBuf>) -> Self {
        self.libraries = libraries;
        self
    }

    pub fn with_tree(mut self, tree: SourceTree) -> Self {
        self.tree = Some(tree);
        self
    }

    pub fn with_tree_file(self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read source tree: {}", path.display()))?;
        Ok(self.with_tree(SourceTree::from_json(&content)?))
    }
}

/// Analysis entry point: one fresh graph per run.
pub struct SquidEngine {
    config: EngineConfig,
}

impl SquidEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisReport> {
        let classes = ClasspathResolver::new(&input.classes);
        let libraries = ClasspathResolver::new(&input.libraries);
        info!(
            "Classpath: {} analyzable entries, {} library entries",
            classes.entries().len(),
            libraries.entries().len()
        );
        self.analyze_sources(&input.project, &classes, &libraries, input.tree.clone())
    }

    /// Analyze with explicit class sources.
    ///
    /// Names resolvable from `classes` are analyzable (parse failures are
    /// fatal); `libraries` only back references.
    pub fn analyze_sources(
        &self,
        project: &str,
        classes: &dyn ClassSource,
        libraries: &dyn ClassSource,
        tree: Option<SourceTree>,
    ) -> Result<AnalysisReport> {
        let names: Vec<String> = match &tree {
            Some(tree) => tree
                .ids(Scope::Class)
                .into_iter()
                .map(|id| tree.node(id).key.clone())
                .collect(),
            None => classes.class_names(),
        };
        info!("Analyzing {} classes", names.len());

        let source = ChainedSource::new(vec![classes, libraries]);
        let mut graph = GraphBuilder::new(self.config.parallel)
            .build(&source, &names)
            .context("Failed to build structural graph")?;
        linker::link(&mut graph);

        let mut tree = tree.unwrap_or_else(|| SourceTree::from_class_names(project, &names));
        tree.attach_methods(&graph);

        let mut sorted = names;
        sorted.sort();
        sorted.dedup();
        let visited: Vec<NodeIndex> = sorted.iter().filter_map(|name| graph.get(name)).collect();

        let mut dependencies = DependencyGraph::new();
        {
            let mut cx = VisitContext::new(&graph, &self.config, &mut tree, &mut dependencies);
            let mut visitors = MetricVisitor::standard();
            dispatch(&mut cx, &visited, &mut visitors);
        }
        info!("Visited {} classes", visited.len());

        aggregate(&mut tree, &dependencies, &self.config);

        Ok(AnalysisReport {
            graph,
            tree,
            dependencies,
        })
    }
}

/// Finished analysis: structural graph, measured tree, dependency index.
pub struct AnalysisReport {
    graph: StructuralGraph,
    tree: SourceTree,
    dependencies: DependencyGraph,
}

impl AnalysisReport {
    pub fn graph(&self) -> &StructuralGraph {
        &self.graph
    }

    pub fn tree(&self) -> &SourceTree {
        &self.tree
    }

    pub fn dependencies(&self) -> &DependencyGraph {
        &self.dependencies
    }

    /// Dependency between two classes, files or packages.
    pub fn edge(&self, scope: Scope, from: &str, to: &str) -> Option<Edge> {
        self.dependencies.edge(scope, from, to)
    }

    /// Edge between two resources of the structural graph.
    pub fn resource_edge(&self, from: &str, to: &str) -> Option<EdgeView> {
        self.graph.edge_by_keys(from, to)
    }

    pub fn measure(&self, scope: Scope, key: &str, metric: Metric) -> Option<&MeasureValue> {
        let id = self.tree.find(scope, key)?;
        self.tree.measure(id, metric)
    }

    pub fn int_measure(&self, scope: Scope, key: &str, metric: Metric) -> Option<i64> {
        self.measure(scope, key, metric)?.as_i64()
    }

    pub fn blocks(&self, class: &str) -> Option<&[Vec<String>]> {
        match self.measure(Scope::Class, class, Metric::Lcom4Blocks)? {
            MeasureValue::Blocks(blocks) => Some(blocks.as_slice()),
            _ => None,
        }
    }

    /// Virtual-dispatch links, sorted by method key.
    pub fn overrides(&self) -> Vec<OverrideDto> {
        let mut out: Vec<OverrideDto> = self
            .graph
            .graph
            .node_indices()
            .filter(|&m| !self.graph.overrides(m).is_empty())
            .map(|m| {
                let mut implementations: Vec<String> = self
                    .graph
                    .overrides(m)
                    .iter()
                    .map(|&i| self.graph.key(i).to_string())
                    .collect();
                implementations.sort();
                OverrideDto {
                    method: self.graph.key(m).to_string(),
                    implementations,
                }
            })
            .collect();
        out.sort_by(|a, b| a.method.cmp(&b.method));
        out
    }

    pub fn to_dto(&self) -> ReportDto {
        let root = self.tree.root();
        let nodes = (0..self.tree.len())
            .map(|id| {
                let node = self.tree.node(id);
                NodeDto {
                    key: node.key.clone(),
                    scope: node.scope,
                    measures: node.measures.clone(),
                }
            })
            .collect();
        let dependencies = [Scope::Class, Scope::File, Scope::Package]
            .into_iter()
            .flat_map(|scope| {
                self.dependencies
                    .edges(scope)
                    .into_iter()
                    .map(move |e| DependencyDto {
                        scope,
                        from: e.from,
                        to: e.to,
                        usage: e.usage,
                        weight: e.weight,
                    })
            })
            .collect();
        ReportDto {
            project: self.tree.node(root).key.clone(),
            resource_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            nodes,
            dependencies,
        }
    }
}
