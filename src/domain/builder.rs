use crate::adapters::classfile::{ClassFile, ClassFormatError, CodeReference, descriptor, signature};
use crate::domain::edge::Usage;
use crate::domain::graph::StructuralGraph;
use crate::domain::ports::ClassSource;
use crate::domain::provider::{AnalysisError, ClassProvider};
use crate::domain::resource::{DetailLevel, field_key, method_key};
use petgraph::graph::NodeIndex;
use tracing::{debug, info};

/// Graph builder - Domain Service for constructing the StructuralGraph
pub struct GraphBuilder {
    parallel: bool,
}

impl GraphBuilder {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Four-pass build strategy
    ///
    /// 1. Decode every analyzable class (in parallel) without touching the graph.
    /// 2. Insert them in sorted order, pulling in supertypes at structure level.
    /// 3. Wire member and class edges for the analyzable classes.
    /// 4. Index the hierarchy (superclass -> subclasses).
    ///
    /// The graph is complete when this returns, so linking and visiting may start.
    pub fn build(
        &self,
        source: &dyn ClassSource,
        analyzable: &[String],
    ) -> Result<StructuralGraph, AnalysisError> {
        let mut names = analyzable.to_vec();
        names.sort();
        names.dedup();

        let mut provider = ClassProvider::new(source, names.iter().cloned());

        // Pass 1: Decode
        provider.prefetch(&names, DetailLevel::StructureAndCalls, self.parallel);
        info!("Decoded {} analyzable classes", names.len());

        // Pass 2: Node insertion
        let mut loaded = Vec::with_capacity(names.len());
        for name in &names {
            loaded.push(provider.get_class(name, DetailLevel::StructureAndCalls)?);
        }
        info!(
            "Loaded {} classes ({} resources)",
            provider.graph().classes().count(),
            provider.graph().node_count()
        );

        // Pass 3: Edge wiring
        for (name, idx) in names.iter().zip(loaded) {
            if let Some(file) = provider.take_file(idx) {
                wire_class(&mut provider, idx, &file).map_err(|e| match e {
                    WiringError::Analysis(e) => e,
                    WiringError::Format(source) => AnalysisError::Parse {
                        class: name.clone(),
                        source,
                    },
                })?;
            }
        }

        // Pass 4: Hierarchy index
        let mut graph = provider.into_graph();
        graph.index_hierarchy();
        info!(
            "Structural graph: {} resources, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

enum WiringError {
    Analysis(AnalysisError),
    Format(ClassFormatError),
}

impl From<AnalysisError> for WiringError {
    fn from(e: AnalysisError) -> Self {
        WiringError::Analysis(e)
    }
}

impl From<ClassFormatError> for WiringError {
    fn from(e: ClassFormatError) -> Self {
        WiringError::Format(e)
    }
}

fn wire_class(
    provider: &mut ClassProvider<'_>,
    class: NodeIndex,
    file: &ClassFile,
) -> Result<(), WiringError> {
    debug!("Wiring {}", file.name);
    let class_key = provider.graph().key(class).to_string();

    for field in &file.fields {
        let Some(from) = provider.graph().get(&field_key(&class_key, &field.name)) else {
            continue;
        };
        let mut types = descriptor::referenced_classes(&field.descriptor)?;
        if let Some(sig) = &field.signature {
            types.extend(signature::referenced_classes(sig)?);
        }
        type_edges(provider, from, distinct(types))?;
    }

    for method in &file.methods {
        let key = method_key(&class_key, &method.name, &method.descriptor);
        let Some(from) = provider.graph().get(&key) else {
            continue;
        };

        // Declaration: parameters and return type, generic signature, throws.
        let mut types = descriptor::referenced_classes(&method.descriptor)?;
        if let Some(sig) = &method.signature {
            types.extend(signature::referenced_classes(sig)?);
        }
        type_edges(provider, from, distinct(types))?;
        type_edges(provider, from, method.exceptions.iter().cloned())?;

        let Some(code) = &method.code else { continue };
        for reference in &code.references {
            code_edge(provider, from, reference)?;
        }
        type_edges(provider, from, code.catch_types.iter().cloned())?;
        type_edges(provider, from, code.local_variable_types.iter().cloned())?;
    }

    if let Some(sig) = &file.signature {
        // Supertypes named again by the generic signature are covered below.
        let types = signature::referenced_classes(sig)?.into_iter().filter(|t| {
            file.super_class.as_ref() != Some(t) && !file.interfaces.contains(t)
        });
        type_edges(provider, class, distinct(types))?;
    }

    let is_interface = file.access.is_interface();
    let (super_class, interfaces) = match provider.graph().class(class) {
        Some(node) => (node.super_class, node.interfaces.clone()),
        None => (None, Vec::new()),
    };
    let graph = provider.graph_mut();
    if let Some(parent) = super_class {
        graph.add_edge(class, parent, Usage::Extends);
    }
    for parent in interfaces {
        let usage = if is_interface { Usage::Extends } else { Usage::Implements };
        graph.add_edge(class, parent, usage);
    }
    Ok(())
}

fn code_edge(
    provider: &mut ClassProvider<'_>,
    from: NodeIndex,
    reference: &CodeReference,
) -> Result<(), AnalysisError> {
    let target = match reference {
        CodeReference::Type(name) => provider.get_class(name, DetailLevel::StructureOnly)?,
        // Methods invoked on array types (`clone`) only depend on the element class.
        CodeReference::Method { member, .. } if member.owner.starts_with('[') => {
            match descriptor::element_class(&member.owner) {
                Some(element) => provider.get_class(&element, DetailLevel::StructureOnly)?,
                None => return Ok(()),
            }
        }
        CodeReference::Method { member, is_static } => provider.resolve_method(member, *is_static)?,
        CodeReference::Field { member, is_static, .. } => provider.resolve_field(member, *is_static)?,
    };
    provider.graph_mut().add_edge(from, target, Usage::Uses);
    Ok(())
}

fn type_edges<I>(provider: &mut ClassProvider<'_>, from: NodeIndex, names: I) -> Result<(), AnalysisError>
where
    I: IntoIterator<Item = String>,
{
    for name in names {
        let target = provider.get_class(&name, DetailLevel::StructureOnly)?;
        provider.graph_mut().add_edge(from, target, Usage::Uses);
    }
    Ok(())
}

/// One site per class within a single declaration.
fn distinct<I: IntoIterator<Item = String>>(names: I) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}
