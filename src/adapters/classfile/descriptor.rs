//! Field and method descriptors (`Ljava/lang/String;`, `(I[Ltags/Tag;)V`).

use super::ClassFormatError;

/// Parsed method descriptor, reference types only kept by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    /// `None` for `void`.
    pub return_type: Option<FieldType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Primitive(char),
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    /// Class referenced by this type, looking through arrays.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            FieldType::Primitive(_) => None,
            FieldType::Object(name) => Some(name),
            FieldType::Array(inner) => inner.class_name(),
        }
    }
}

pub fn parse_field_type(descriptor: &str) -> Result<FieldType, ClassFormatError> {
    let (ty, rest) = field_type(descriptor, descriptor)?;
    if !rest.is_empty() {
        return Err(bad(descriptor));
    }
    Ok(ty)
}

pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodDescriptor, ClassFormatError> {
    let mut rest = descriptor.strip_prefix('(').ok_or_else(|| bad(descriptor))?;
    let mut parameters = Vec::new();
    while !rest.starts_with(')') {
        let (ty, tail) = field_type(rest, descriptor)?;
        parameters.push(ty);
        rest = tail;
    }
    rest = &rest[1..];
    let return_type = if rest == "V" {
        None
    } else {
        Some(parse_field_type(rest).map_err(|_| bad(descriptor))?)
    };
    Ok(MethodDescriptor {
        parameters,
        return_type,
    })
}

/// Classes named by a field or method descriptor, in order of appearance.
pub fn referenced_classes(descriptor: &str) -> Result<Vec<String>, ClassFormatError> {
    let types = if descriptor.starts_with('(') {
        let method = parse_method_descriptor(descriptor)?;
        method
            .parameters
            .into_iter()
            .chain(method.return_type)
            .collect()
    } else {
        vec![parse_field_type(descriptor)?]
    };
    Ok(types
        .iter()
        .filter_map(|t| t.class_name().map(str::to_string))
        .collect())
}

/// Normalize a `CONSTANT_Class` name: array classes (`[[Ltags/Tag;`) map to
/// their element class, primitive arrays to `None`.
pub fn element_class(internal_name: &str) -> Option<String> {
    if internal_name.starts_with('[') {
        parse_field_type(internal_name)
            .ok()
            .and_then(|t| t.class_name().map(str::to_string))
    } else {
        Some(internal_name.to_string())
    }
}

fn field_type<'a>(
    input: &'a str,
    whole: &str,
) -> Result<(FieldType, &'a str), ClassFormatError> {
    let mut chars = input.chars();
    match chars.next() {
        Some(c @ ('B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z')) => {
            Ok((FieldType::Primitive(c), &input[1..]))
        }
        Some('L') => {
            let end = input.find(';').ok_or_else(|| bad(whole))?;
            let name = &input[1..end];
            if name.is_empty() {
                return Err(bad(whole));
            }
            Ok((FieldType::Object(name.to_string()), &input[end + 1..]))
        }
        Some('[') => {
            let (inner, rest) = field_type(&input[1..], whole)?;
            Ok((FieldType::Array(Box::new(inner)), rest))
        }
        _ => Err(bad(whole)),
    }
}

fn bad(descriptor: &str) -> ClassFormatError {
    ClassFormatError::BadDescriptor {
        descriptor: descriptor.to_string(),
    }
}
