//! Instruction walker: decodes every opcode length and reports the operands
//! that name other classes or members.

use super::ClassFormatError;
use super::constant_pool::{ConstantPool, MemberRef};
use super::descriptor::element_class;
use super::reader::ByteReader;

pub const ALOAD_0: u8 = 0x2a;
pub const RETURN: u8 = 0xb1;
const GETSTATIC: u8 = 0xb2;
const PUTSTATIC: u8 = 0xb3;
const GETFIELD: u8 = 0xb4;
const PUTFIELD: u8 = 0xb5;
const INVOKEVIRTUAL: u8 = 0xb6;
const INVOKESPECIAL: u8 = 0xb7;
const INVOKESTATIC: u8 = 0xb8;
const INVOKEINTERFACE: u8 = 0xb9;
const INVOKEDYNAMIC: u8 = 0xba;
const NEW: u8 = 0xbb;
const ANEWARRAY: u8 = 0xbd;
const CHECKCAST: u8 = 0xc0;
const INSTANCEOF: u8 = 0xc1;
const WIDE: u8 = 0xc4;
const MULTIANEWARRAY: u8 = 0xc5;
const LDC: u8 = 0x12;
const LDC_W: u8 = 0x13;
const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const IINC: u8 = 0x84;

/// A symbolic reference made by one instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeReference {
    Field { member: MemberRef, write: bool, is_static: bool },
    Method { member: MemberRef, is_static: bool },
    Type(String),
}

/// One decoded instruction: opcode plus the pool-resolved reference, if any.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: u8,
    pub reference: Option<CodeReference>,
}

pub fn decode(code: &[u8], pool: &ConstantPool) -> Result<Vec<Instruction>, ClassFormatError> {
    let mut reader = ByteReader::new(code);
    let mut out = Vec::new();

    while reader.remaining() > 0 {
        let pc = reader.position();
        let opcode = reader.u1()?;
        let reference = match opcode {
            GETSTATIC | PUTSTATIC | GETFIELD | PUTFIELD => {
                let member = pool.member_ref(reader.u2()?)?;
                Some(CodeReference::Field {
                    member,
                    write: matches!(opcode, PUTFIELD | PUTSTATIC),
                    is_static: matches!(opcode, GETSTATIC | PUTSTATIC),
                })
            }
            INVOKEVIRTUAL | INVOKESPECIAL | INVOKESTATIC => Some(CodeReference::Method {
                member: pool.member_ref(reader.u2()?)?,
                is_static: opcode == INVOKESTATIC,
            }),
            INVOKEINTERFACE => {
                let member = pool.member_ref(reader.u2()?)?;
                reader.skip(2)?;
                Some(CodeReference::Method {
                    member,
                    is_static: false,
                })
            }
            INVOKEDYNAMIC => {
                reader.skip(4)?;
                None
            }
            NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => {
                element_class(pool.class_name(reader.u2()?)?).map(CodeReference::Type)
            }
            MULTIANEWARRAY => {
                let index = reader.u2()?;
                reader.skip(1)?;
                element_class(pool.class_name(index)?).map(CodeReference::Type)
            }
            LDC => class_literal(pool, reader.u1()? as u16)?,
            LDC_W => class_literal(pool, reader.u2()?)?,
            TABLESWITCH => {
                skip_padding(&mut reader, pc)?;
                reader.skip(4)?;
                let low = reader.i4()?;
                let high = reader.i4()?;
                let count = (high as i64 - low as i64 + 1).max(0) as usize;
                reader.skip(count * 4)?;
                None
            }
            LOOKUPSWITCH => {
                skip_padding(&mut reader, pc)?;
                reader.skip(4)?;
                let pairs = reader.i4()?.max(0) as usize;
                reader.skip(pairs * 8)?;
                None
            }
            WIDE => {
                let modified = reader.u1()?;
                reader.skip(if modified == IINC { 4 } else { 2 })?;
                None
            }
            other => {
                let len = operand_len(other).ok_or(ClassFormatError::BadOpcode {
                    opcode: other,
                    offset: pc,
                })?;
                reader.skip(len)?;
                None
            }
        };
        out.push(Instruction { opcode, reference });
    }

    Ok(out)
}

fn class_literal(
    pool: &ConstantPool,
    index: u16,
) -> Result<Option<CodeReference>, ClassFormatError> {
    Ok(pool
        .loadable_class(index)?
        .and_then(element_class)
        .map(CodeReference::Type))
}

fn skip_padding(reader: &mut ByteReader<'_>, pc: usize) -> Result<(), ClassFormatError> {
    let pad = (4 - (pc + 1) % 4) % 4;
    reader.skip(pad)
}

/// Operand byte count of fixed-length opcodes.
fn operand_len(opcode: u8) -> Option<usize> {
    Some(match opcode {
        0x00..=0x0f => 0,
        0x10 => 1,
        0x11 => 2,
        0x14 => 2,
        0x15..=0x19 => 1,
        0x1a..=0x35 => 0,
        0x36..=0x3a => 1,
        0x3b..=0x83 => 0,
        IINC => 2,
        0x85..=0x98 => 0,
        0x99..=0xa8 => 2,
        0xa9 => 1,
        0xac..=0xb1 => 0,
        0xbc => 1,
        0xbe | 0xbf | 0xc2 | 0xc3 => 0,
        0xc6 | 0xc7 => 2,
        0xc8 | 0xc9 => 4,
        0xca | 0xfe | 0xff => 0,
        _ => return None,
    })
}

pub fn is_load_1(opcode: u8) -> bool {
    // iload_1, lload_1, fload_1, dload_1, aload_1
    matches!(opcode, 0x1b | 0x1f | 0x23 | 0x27 | 0x2b)
}

pub fn is_value_return(opcode: u8) -> bool {
    (0xac..=0xb0).contains(&opcode)
}
