use crate::adapters::classfile::{AccessFlags, BodyShape};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// How fully a class's bytecode has been parsed. Escalation only goes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetailLevel {
    /// Class header, supertypes, member declarations.
    StructureOnly,
    /// Structure plus every reference made by member signatures and bodies.
    StructureAndCalls,
}

/// Class node
#[derive(Debug, Clone)]
pub struct ClassNode {
    pub key: String,
    pub access: AccessFlags,
    /// `None` for unresolved placeholders (no bytes on the classpath or
    /// undecodable library bytes).
    pub level: Option<DetailLevel>,
    pub super_class: Option<NodeIndex>,
    pub interfaces: Vec<NodeIndex>,
    pub methods: Vec<NodeIndex>,
    pub fields: Vec<NodeIndex>,
}

impl ClassNode {
    pub fn new(key: impl Into<String>, access: AccessFlags, level: DetailLevel) -> Self {
        Self {
            key: key.into(),
            access,
            level: Some(level),
            super_class: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn unresolved(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            access: AccessFlags::default(),
            level: None,
            super_class: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.level.is_some()
    }

    pub fn is_interface(&self) -> bool {
        self.access.is_interface()
    }

    pub fn is_abstract(&self) -> bool {
        self.access.is_abstract()
    }

    /// Package part of the binary name (`""` for the default package).
    pub fn package(&self) -> &str {
        package_of(&self.key)
    }
}

/// Method node
#[derive(Debug, Clone)]
pub struct MethodNode {
    pub key: String,
    pub owner: NodeIndex,
    pub name: String,
    pub descriptor: String,
    pub access: AccessFlags,
    /// `false` when the member was created on demand because a reference
    /// named it but no declaration was found.
    pub declared: bool,
    pub has_body: bool,
    /// Known once the owner is parsed at `StructureAndCalls`.
    pub shape: Option<BodyShape>,
}

impl MethodNode {
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == "<clinit>"
    }

    pub fn is_static(&self) -> bool {
        self.access.is_static()
    }

    pub fn is_abstract(&self) -> bool {
        self.access.is_abstract()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.shape, Some(BodyShape::Empty))
    }

    /// Overridable by a subclass declaration with the same name and descriptor.
    pub fn is_virtual(&self) -> bool {
        !self.is_static()
            && !self.access.is_private()
            && !self.is_constructor()
            && !self.is_static_initializer()
    }
}

/// Field node
#[derive(Debug, Clone)]
pub struct FieldNode {
    pub key: String,
    pub owner: NodeIndex,
    pub name: String,
    pub descriptor: String,
    pub access: AccessFlags,
    pub declared: bool,
}

impl FieldNode {
    pub fn is_static(&self) -> bool {
        self.access.is_static()
    }
}

/// Polymorphic resource stored in the structural graph.
#[derive(Debug, Clone)]
pub enum Resource {
    Class(ClassNode),
    Method(MethodNode),
    Field(FieldNode),
}

impl Resource {
    pub fn key(&self) -> &str {
        match self {
            Resource::Class(c) => &c.key,
            Resource::Method(m) => &m.key,
            Resource::Field(f) => &f.key,
        }
    }

    /// Class owning this resource (a class owns itself).
    pub fn owner(&self, this: NodeIndex) -> NodeIndex {
        match self {
            Resource::Class(_) => this,
            Resource::Method(m) => m.owner,
            Resource::Field(f) => f.owner,
        }
    }

    pub fn is_static_member(&self) -> bool {
        match self {
            Resource::Class(_) => false,
            Resource::Method(m) => m.is_static(),
            Resource::Field(f) => f.is_static(),
        }
    }
}

pub fn method_key(class: &str, name: &str, descriptor: &str) -> String {
    format!("{class}#{name}{descriptor}")
}

pub fn field_key(class: &str, name: &str) -> String {
    format!("{class}#{name}")
}

pub fn package_of(class_key: &str) -> &str {
    class_key.rsplit_once('/').map(|(p, _)| p).unwrap_or("")
}

/// Source file a class compiles from: inner classes share the outer file.
pub fn file_of(class_key: &str) -> String {
    let (package, simple) = match class_key.rsplit_once('/') {
        Some((p, s)) => (p, s),
        None => ("", class_key),
    };
    let outer = simple.split('$').next().unwrap_or(simple);
    if package.is_empty() {
        format!("{outer}.java")
    } else {
        format!("{package}/{outer}.java")
    }
}
