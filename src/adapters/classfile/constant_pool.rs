use super::ClassFormatError;
use super::reader::{ByteReader, decode_modified_utf8};

/// A constant-pool entry. Only the entries the structural analysis needs keep
/// their payload; numeric constants are kept as tags so indices stay aligned.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Slot 0 and the second slot of long/double entries.
    Unusable,
    Utf8(String),
    Integer,
    Float,
    Long,
    Double,
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

/// Symbolic member reference resolved from a Fieldref/Methodref entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub fn parse(reader: &mut ByteReader<'_>) -> Result<Self, ClassFormatError> {
        let count = reader.u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let offset = reader.position();
            let tag = reader.u1()?;
            let entry = match tag {
                1 => {
                    let len = reader.u2()? as usize;
                    Constant::Utf8(decode_modified_utf8(reader.take(len)?)?)
                }
                3 => {
                    reader.skip(4)?;
                    Constant::Integer
                }
                4 => {
                    reader.skip(4)?;
                    Constant::Float
                }
                5 | 6 => {
                    reader.skip(8)?;
                    entries.push(if tag == 5 {
                        Constant::Long
                    } else {
                        Constant::Double
                    });
                    // 8-byte constants occupy two slots
                    Constant::Unusable
                }
                7 => Constant::Class {
                    name_index: reader.u2()?,
                },
                8 => Constant::String {
                    string_index: reader.u2()?,
                },
                9 => Constant::FieldRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                10 => Constant::MethodRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                11 => Constant::InterfaceMethodRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                12 => Constant::NameAndType {
                    name_index: reader.u2()?,
                    descriptor_index: reader.u2()?,
                },
                15 => Constant::MethodHandle {
                    reference_kind: reader.u1()?,
                    reference_index: reader.u2()?,
                },
                16 => Constant::MethodType {
                    descriptor_index: reader.u2()?,
                },
                17 => Constant::Dynamic {
                    bootstrap_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                18 => Constant::InvokeDynamic {
                    bootstrap_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                19 => Constant::Module {
                    name_index: reader.u2()?,
                },
                20 => Constant::Package {
                    name_index: reader.u2()?,
                },
                other => return Err(ClassFormatError::BadConstantTag { tag: other, offset }),
            };
            entries.push(entry);
        }

        // A trailing long/double may have pushed one slot too many.
        entries.truncate(count.max(1));
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn get(&self, index: u16) -> Result<&Constant, ClassFormatError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(ClassFormatError::BadConstantIndex { index }),
            Some(entry) => Ok(entry),
        }
    }

    pub fn utf8(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s),
            _ => Err(ClassFormatError::UnexpectedConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// Internal name of a `CONSTANT_Class` entry (may be an array descriptor).
    pub fn class_name(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassFormatError::UnexpectedConstant {
                index,
                expected: "Class",
            }),
        }
    }

    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), ClassFormatError> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => Err(ClassFormatError::UnexpectedConstant {
                index,
                expected: "NameAndType",
            }),
        }
    }

    /// Resolve a Fieldref, Methodref or InterfaceMethodref entry.
    pub fn member_ref(&self, index: u16) -> Result<MemberRef, ClassFormatError> {
        let (class_index, nat_index) = match self.get(index)? {
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            }
            | Constant::MethodRef {
                class_index,
                name_and_type_index,
            }
            | Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index),
            _ => {
                return Err(ClassFormatError::UnexpectedConstant {
                    index,
                    expected: "member reference",
                });
            }
        };
        let (name, descriptor) = self.name_and_type(nat_index)?;
        Ok(MemberRef {
            owner: self.class_name(class_index)?.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        })
    }

    /// Class named by an `ldc`/`ldc_w` operand, if the constant is a class literal.
    pub fn loadable_class(&self, index: u16) -> Result<Option<&str>, ClassFormatError> {
        match self.get(index)? {
            Constant::Class { name_index } => Ok(Some(self.utf8(*name_index)?)),
            _ => Ok(None),
        }
    }
}
