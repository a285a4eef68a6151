//! Class-file decoder.
//!
//! Reads the binary class-file format directly: constant pool, class header,
//! fields, methods and the handful of attributes that name other types
//! (`Code`, `Exceptions`, `Signature`, local variable tables). Nothing is
//! verified or executed.

pub mod constant_pool;
pub mod descriptor;
pub mod opcodes;
pub mod parser;
pub mod reader;
pub mod signature;

pub use constant_pool::MemberRef;
pub use opcodes::CodeReference;
pub use parser::{
    AccessFlags, BodyShape, ClassFile, CodeInfo, FieldInfo, MethodInfo, parse_class,
};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassFormatError {
    #[error("not a class file (magic {magic:#010x})")]
    BadMagic { magic: u32 },
    #[error("unexpected end of class file at offset {offset}")]
    Truncated { offset: usize },
    #[error("invalid constant pool tag {tag} at offset {offset}")]
    BadConstantTag { tag: u8, offset: usize },
    #[error("invalid constant pool index {index}")]
    BadConstantIndex { index: u16 },
    #[error("constant pool entry {index} is not a {expected}")]
    UnexpectedConstant { index: u16, expected: &'static str },
    #[error("invalid modified UTF-8 string")]
    BadUtf8,
    #[error("malformed descriptor `{descriptor}`")]
    BadDescriptor { descriptor: String },
    #[error("malformed generic signature `{signature}`")]
    BadSignature { signature: String },
    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    BadOpcode { opcode: u8, offset: usize },
}
