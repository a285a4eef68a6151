use crate::adapters::classfile::{AccessFlags, ClassFile, ClassFormatError, MemberRef, parse_class};
use crate::domain::graph::StructuralGraph;
use crate::domain::ports::ClassSource;
use crate::domain::resource::{
    ClassNode, DetailLevel, FieldNode, MethodNode, Resource, field_key, method_key,
};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Fatal run failures. Everything else degrades gracefully.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to parse analyzable class `{class}`")]
    Parse {
        class: String,
        #[source]
        source: ClassFormatError,
    },
    #[error("analyzable class `{class}` not found on the classpath")]
    MissingClass { class: String },
}

type Decoded = (DetailLevel, Result<ClassFile, ClassFormatError>);

/// Class provider - parses classes on demand into the structural graph.
///
/// Requests at a higher detail level than the cached one re-parse the class
/// (never downgrade). Names with no bytes, or library bytes that fail to
/// decode, become unresolved placeholders; analyzable classes that are
/// missing or undecodable abort the run.
pub struct ClassProvider<'s> {
    source: &'s dyn ClassSource,
    analyzable: HashSet<String>,
    graph: StructuralGraph,
    /// Decoded ahead of time, consumed by the first matching request
    prefetched: HashMap<String, Decoded>,
    /// Latest decoded file per loaded class, for edge wiring
    files: HashMap<NodeIndex, ClassFile>,
}

impl<'s> ClassProvider<'s> {
    pub fn new<I>(source: &'s dyn ClassSource, analyzable: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            source,
            analyzable: analyzable.into_iter().collect(),
            graph: StructuralGraph::new(),
            prefetched: HashMap::new(),
            files: HashMap::new(),
        }
    }

    /// Read and decode `names` ahead of insertion, on the rayon pool when
    /// `parallel` is set. The graph is not touched, so the caller decides
    /// insertion order.
    pub fn prefetch(&mut self, names: &[String], level: DetailLevel, parallel: bool) {
        let source = self.source;
        let load = |name: &String| {
            source
                .resolve(name)
                .map(|bytes| (name.clone(), (level, parse_class(&bytes, level))))
        };
        let decoded: Vec<(String, Decoded)> = if parallel {
            names.par_iter().filter_map(load).collect()
        } else {
            names.iter().filter_map(load).collect()
        };
        self.prefetched.extend(decoded);
    }

    pub fn graph(&self) -> &StructuralGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut StructuralGraph {
        &mut self.graph
    }

    pub fn into_graph(self) -> StructuralGraph {
        self.graph
    }

    pub fn is_analyzable(&self, name: &str) -> bool {
        self.analyzable.contains(name)
    }

    /// Hand over the decoded file of a loaded class.
    pub fn take_file(&mut self, idx: NodeIndex) -> Option<ClassFile> {
        self.files.remove(&idx)
    }

    pub fn get_class(&mut self, name: &str, level: DetailLevel) -> Result<NodeIndex, AnalysisError> {
        if let Some(idx) = self.graph.get(name) {
            let current = self.graph.class(idx).and_then(|c| c.level);
            if let Some(current) = current
                && current < level
            {
                self.escalate(idx, name, level)?;
            }
            return Ok(idx);
        }

        match self.decode(name, level)? {
            Some(file) => self.insert(name, file),
            None => Ok(self
                .graph
                .add_resource(Resource::Class(ClassNode::unresolved(name)))),
        }
    }

    /// Method resolved through the owner's hierarchy, created on the owner
    /// when no declaration is found.
    pub fn resolve_method(&mut self, member: &MemberRef, is_static: bool) -> Result<NodeIndex, AnalysisError> {
        let owner = self.get_class(&member.owner, DetailLevel::StructureOnly)?;
        if let Some(found) = self.graph.find_method(owner, &member.name, &member.descriptor) {
            return Ok(found);
        }
        Ok(self.graph.add_resource(Resource::Method(MethodNode {
            key: method_key(&member.owner, &member.name, &member.descriptor),
            owner,
            name: member.name.clone(),
            descriptor: member.descriptor.clone(),
            access: static_flags(is_static),
            declared: false,
            has_body: false,
            shape: None,
        })))
    }

    pub fn resolve_field(&mut self, member: &MemberRef, is_static: bool) -> Result<NodeIndex, AnalysisError> {
        let owner = self.get_class(&member.owner, DetailLevel::StructureOnly)?;
        if let Some(found) = self.graph.find_field(owner, &member.name) {
            return Ok(found);
        }
        Ok(self.graph.add_resource(Resource::Field(FieldNode {
            key: field_key(&member.owner, &member.name),
            owner,
            name: member.name.clone(),
            descriptor: member.descriptor.clone(),
            access: static_flags(is_static),
            declared: false,
        })))
    }

    fn decode(&mut self, name: &str, level: DetailLevel) -> Result<Option<ClassFile>, AnalysisError> {
        let decoded = match self.prefetched.remove(name) {
            Some((cached, result)) if cached >= level => Some(result),
            _ => self.source.resolve(name).map(|bytes| parse_class(&bytes, level)),
        };

        let analyzable = self.analyzable.contains(name);
        match decoded {
            None if analyzable => Err(AnalysisError::MissingClass {
                class: name.to_string(),
            }),
            None => {
                debug!("Class not on classpath, unresolved: {name}");
                Ok(None)
            }
            Some(Err(source)) if analyzable => Err(AnalysisError::Parse {
                class: name.to_string(),
                source,
            }),
            Some(Err(e)) => {
                warn!("Undecodable library class {name}, treating as unresolved: {e}");
                Ok(None)
            }
            Some(Ok(file)) => {
                if file.name != name {
                    warn!("Class file for {name} declares {}", file.name);
                }
                Ok(Some(file))
            }
        }
    }

    fn insert(&mut self, name: &str, file: ClassFile) -> Result<NodeIndex, AnalysisError> {
        let idx = self
            .graph
            .add_resource(Resource::Class(ClassNode::new(name, file.access, file.level)));
        debug!("Loaded {name} at {:?}", file.level);
        self.add_members(idx, name, &file);

        // Supertypes are loaded after the node exists so a cyclic hierarchy terminates.
        let super_class = match &file.super_class {
            Some(parent) => Some(self.get_class(parent, DetailLevel::StructureOnly)?),
            None => None,
        };
        let mut interfaces = Vec::with_capacity(file.interfaces.len());
        for interface in &file.interfaces {
            let parent = self.get_class(interface, DetailLevel::StructureOnly)?;
            if parent != idx && !interfaces.contains(&parent) {
                interfaces.push(parent);
            }
        }
        if let Some(class) = self.graph.class_mut(idx) {
            class.super_class = super_class.filter(|&parent| parent != idx);
            class.interfaces = interfaces;
        }

        self.files.insert(idx, file);
        Ok(idx)
    }

    fn escalate(&mut self, idx: NodeIndex, name: &str, level: DetailLevel) -> Result<(), AnalysisError> {
        let Some(file) = self.decode(name, level)? else {
            return Ok(());
        };
        debug!("Escalated {name} to {level:?}");
        if let Some(class) = self.graph.class_mut(idx) {
            class.level = Some(file.level);
        }
        self.add_members(idx, name, &file);
        self.files.insert(idx, file);
        Ok(())
    }

    /// Insert declared members, or refresh them when the class is re-parsed.
    fn add_members(&mut self, owner: NodeIndex, class_name: &str, file: &ClassFile) {
        for field in &file.fields {
            let key = field_key(class_name, &field.name);
            if let Some(existing) = self.graph.get(&key)
                && let Some(node) = self.graph.field_mut(existing)
            {
                node.declared = true;
                node.access = field.access;
                node.descriptor = field.descriptor.clone();
                continue;
            }
            self.graph.add_resource(Resource::Field(FieldNode {
                key,
                owner,
                name: field.name.clone(),
                descriptor: field.descriptor.clone(),
                access: field.access,
                declared: true,
            }));
        }

        for method in &file.methods {
            let key = method_key(class_name, &method.name, &method.descriptor);
            let shape = method.code.as_ref().map(|code| code.shape.clone());
            if let Some(existing) = self.graph.get(&key)
                && let Some(node) = self.graph.method_mut(existing)
            {
                node.declared = true;
                node.access = method.access;
                node.has_body = method.has_code;
                if shape.is_some() {
                    node.shape = shape;
                }
                continue;
            }
            self.graph.add_resource(Resource::Method(MethodNode {
                key,
                owner,
                name: method.name.clone(),
                descriptor: method.descriptor.clone(),
                access: method.access,
                declared: true,
                has_body: method.has_code,
                shape,
            }));
        }
    }
}

fn static_flags(is_static: bool) -> AccessFlags {
    if is_static {
        AccessFlags(AccessFlags::STATIC)
    } else {
        AccessFlags::default()
    }
}
