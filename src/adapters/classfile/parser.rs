use super::constant_pool::{ConstantPool, MemberRef};
use super::descriptor::{self, element_class};
use super::opcodes::{self, CodeReference, Instruction};
use super::reader::ByteReader;
use super::{ClassFormatError, signature};
use crate::domain::resource::DetailLevel;

const MAGIC: u32 = 0xCAFE_BABE;

/// Access flags shared by classes, fields and methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SYNCHRONIZED: u16 = 0x0020;
    pub const BRIDGE: u16 = 0x0040;
    pub const NATIVE: u16 = 0x0100;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const SYNTHETIC: u16 = 0x1000;
    pub const ENUM: u16 = 0x4000;

    pub fn contains(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub fn is_interface(self) -> bool {
        self.contains(Self::INTERFACE)
    }

    pub fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    pub fn is_synthetic(self) -> bool {
        self.contains(Self::SYNTHETIC)
    }
}

/// Decoded class file at a given detail level.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub name: String,
    pub access: AccessFlags,
    /// `None` only for the platform root (or malformed interfaces).
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub level: DetailLevel,
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub access: AccessFlags,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub access: AccessFlags,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    /// Classes from the `Exceptions` attribute.
    pub exceptions: Vec<String>,
    pub has_code: bool,
    /// Only decoded at [`DetailLevel::StructureAndCalls`].
    pub code: Option<CodeInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct CodeInfo {
    pub references: Vec<CodeReference>,
    pub catch_types: Vec<String>,
    /// Classes named by local variable descriptors and signatures.
    pub local_variable_types: Vec<String>,
    pub shape: BodyShape,
}

/// Coarse classification of a method body used for accessor detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BodyShape {
    /// A lone `return`.
    Empty,
    /// `aload_0; getfield f; xreturn`
    Getter(MemberRef),
    /// `aload_0; xload_1; putfield f; return`
    Setter(MemberRef),
    #[default]
    Other,
}

pub fn parse_class(bytes: &[u8], level: DetailLevel) -> Result<ClassFile, ClassFormatError> {
    let mut reader = ByteReader::new(bytes);
    let magic = reader.u4()?;
    if magic != MAGIC {
        return Err(ClassFormatError::BadMagic { magic });
    }
    let _minor = reader.u2()?;
    let _major = reader.u2()?;
    let pool = ConstantPool::parse(&mut reader)?;

    let access = AccessFlags(reader.u2()?);
    let name = pool.class_name(reader.u2()?)?.to_string();
    let super_index = reader.u2()?;
    let super_class = if super_index == 0 {
        None
    } else {
        Some(pool.class_name(super_index)?.to_string())
    };

    let interface_count = reader.u2()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(reader.u2()?)?.to_string());
    }

    let field_count = reader.u2()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(parse_field(&mut reader, &pool)?);
    }

    let method_count = reader.u2()?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        methods.push(parse_method(&mut reader, &pool, level)?);
    }

    let mut signature = None;
    for_each_attribute(&mut reader, &pool, |attr_name, body| {
        if attr_name == "Signature" {
            signature = Some(read_signature(body, &pool)?);
        }
        Ok(())
    })?;

    Ok(ClassFile {
        name,
        access,
        super_class,
        interfaces,
        signature,
        fields,
        methods,
        level,
    })
}

fn parse_field(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<FieldInfo, ClassFormatError> {
    let access = AccessFlags(reader.u2()?);
    let name = pool.utf8(reader.u2()?)?.to_string();
    let descriptor = pool.utf8(reader.u2()?)?.to_string();
    descriptor::parse_field_type(&descriptor)?;

    let mut signature = None;
    for_each_attribute(reader, pool, |attr_name, body| {
        if attr_name == "Signature" {
            signature = Some(read_signature(body, pool)?);
        }
        Ok(())
    })?;

    Ok(FieldInfo {
        access,
        name,
        descriptor,
        signature,
    })
}

fn parse_method(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    level: DetailLevel,
) -> Result<MethodInfo, ClassFormatError> {
    let access = AccessFlags(reader.u2()?);
    let name = pool.utf8(reader.u2()?)?.to_string();
    let descriptor = pool.utf8(reader.u2()?)?.to_string();
    descriptor::parse_method_descriptor(&descriptor)?;

    let mut signature = None;
    let mut exceptions = Vec::new();
    let mut has_code = false;
    let mut code = None;

    for_each_attribute(reader, pool, |attr_name, body| {
        match attr_name {
            "Signature" => signature = Some(read_signature(body, pool)?),
            "Exceptions" => {
                let mut r = ByteReader::new(body);
                let count = r.u2()?;
                for _ in 0..count {
                    exceptions.push(pool.class_name(r.u2()?)?.to_string());
                }
            }
            "Code" => {
                has_code = true;
                if level == DetailLevel::StructureAndCalls {
                    code = Some(parse_code(body, pool)?);
                }
            }
            _ => {}
        }
        Ok(())
    })?;

    Ok(MethodInfo {
        access,
        name,
        descriptor,
        signature,
        exceptions,
        has_code,
        code,
    })
}

fn parse_code(body: &[u8], pool: &ConstantPool) -> Result<CodeInfo, ClassFormatError> {
    let mut r = ByteReader::new(body);
    let _max_stack = r.u2()?;
    let _max_locals = r.u2()?;
    let code_length = r.u4()? as usize;
    let instructions = opcodes::decode(r.take(code_length)?, pool)?;

    let mut catch_types = Vec::new();
    let table_length = r.u2()?;
    for _ in 0..table_length {
        r.skip(6)?;
        let catch_type = r.u2()?;
        // 0 marks a finally handler
        if catch_type != 0
            && let Some(class) = element_class(pool.class_name(catch_type)?)
        {
            catch_types.push(class);
        }
    }

    let mut local_variable_types = Vec::new();
    for_each_attribute(&mut r, pool, |attr_name, attr| {
        let is_type_table = match attr_name {
            "LocalVariableTable" => false,
            "LocalVariableTypeTable" => true,
            _ => return Ok(()),
        };
        let mut t = ByteReader::new(attr);
        let count = t.u2()?;
        for _ in 0..count {
            t.skip(6)?;
            let type_text = pool.utf8(t.u2()?)?;
            t.skip(2)?;
            let classes = if is_type_table {
                signature::referenced_classes(type_text)?
            } else {
                descriptor::referenced_classes(type_text)?
            };
            local_variable_types.extend(classes);
        }
        Ok(())
    })?;

    let shape = body_shape(&instructions);
    Ok(CodeInfo {
        references: instructions.into_iter().filter_map(|i| i.reference).collect(),
        catch_types,
        local_variable_types,
        shape,
    })
}

fn body_shape(instructions: &[Instruction]) -> BodyShape {
    match instructions {
        [only] if only.opcode == opcodes::RETURN => BodyShape::Empty,
        [load, get, ret]
            if load.opcode == opcodes::ALOAD_0 && opcodes::is_value_return(ret.opcode) =>
        {
            match &get.reference {
                Some(CodeReference::Field {
                    member,
                    write: false,
                    is_static: false,
                }) => BodyShape::Getter(member.clone()),
                _ => BodyShape::Other,
            }
        }
        [load, value, put, ret]
            if load.opcode == opcodes::ALOAD_0
                && opcodes::is_load_1(value.opcode)
                && ret.opcode == opcodes::RETURN =>
        {
            match &put.reference {
                Some(CodeReference::Field {
                    member,
                    write: true,
                    is_static: false,
                }) => BodyShape::Setter(member.clone()),
                _ => BodyShape::Other,
            }
        }
        _ => BodyShape::Other,
    }
}

fn read_signature(body: &[u8], pool: &ConstantPool) -> Result<String, ClassFormatError> {
    let mut r = ByteReader::new(body);
    Ok(pool.utf8(r.u2()?)?.to_string())
}

fn for_each_attribute<'a, F>(
    reader: &mut ByteReader<'a>,
    pool: &ConstantPool,
    mut f: F,
) -> Result<(), ClassFormatError>
where
    F: FnMut(&str, &'a [u8]) -> Result<(), ClassFormatError>,
{
    let count = reader.u2()?;
    for _ in 0..count {
        let name = pool.utf8(reader.u2()?)?;
        let len = reader.u4()? as usize;
        let body = reader.take(len)?;
        f(name, body)?;
    }
    Ok(())
}
