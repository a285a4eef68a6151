//! Big-endian cursor over class-file bytes.

use super::ClassFormatError;

pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn u1(&mut self) -> Result<u8, ClassFormatError> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or(ClassFormatError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    pub fn u2(&mut self) -> Result<u16, ClassFormatError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u4(&mut self) -> Result<u32, ClassFormatError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i4(&mut self) -> Result<i32, ClassFormatError> {
        Ok(self.u4()? as i32)
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], ClassFormatError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(ClassFormatError::Truncated { offset: self.pos })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), ClassFormatError> {
        self.take(len).map(|_| ())
    }
}

/// Decode the JVM's modified UTF-8 (`0xC0 0x80` for NUL, surrogate pairs
/// encoded as two 3-byte sequences).
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String, ClassFormatError> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let a = bytes[i] as u16;
        if a & 0x80 == 0 {
            units.push(a);
            i += 1;
        } else if a & 0xE0 == 0xC0 {
            let b = *bytes.get(i + 1).ok_or(ClassFormatError::BadUtf8)? as u16;
            units.push(((a & 0x1F) << 6) | (b & 0x3F));
            i += 2;
        } else if a & 0xF0 == 0xE0 {
            let b = *bytes.get(i + 1).ok_or(ClassFormatError::BadUtf8)? as u16;
            let c = *bytes.get(i + 2).ok_or(ClassFormatError::BadUtf8)? as u16;
            units.push(((a & 0x0F) << 12) | ((b & 0x3F) << 6) | (c & 0x3F));
            i += 3;
        } else {
            return Err(ClassFormatError::BadUtf8);
        }
    }
    String::from_utf16(&units).map_err(|_| ClassFormatError::BadUtf8)
}
