//! Generic `Signature` attribute scanning.
//!
//! Only the classes a signature names matter to the dependency graph, so the
//! grammar is walked without building a type tree. Nested class segments
//! (`Lpkg/Outer<TT;>.Inner;`) are reported as binary names (`pkg/Outer$Inner`).

use super::ClassFormatError;

pub fn referenced_classes(signature: &str) -> Result<Vec<String>, ClassFormatError> {
    let mut scanner = Scanner {
        input: signature.as_bytes(),
        pos: 0,
        found: Vec::new(),
        source: signature,
    };
    scanner.signature()?;
    Ok(scanner.found)
}

struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
    found: Vec<String>,
    source: &'a str,
}

impl Scanner<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Result<u8, ClassFormatError> {
        let c = self.peek().ok_or_else(|| self.error())?;
        self.pos += 1;
        Ok(c)
    }

    fn expect(&mut self, c: u8) -> Result<(), ClassFormatError> {
        if self.bump()? == c {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn error(&self) -> ClassFormatError {
        ClassFormatError::BadSignature {
            signature: self.source.to_string(),
        }
    }

    /// Class, method and field signatures share one loop: optional type
    /// parameters, then either a parameter list or a sequence of types.
    fn signature(&mut self) -> Result<(), ClassFormatError> {
        if self.peek() == Some(b'<') {
            self.type_parameters()?;
        }
        if self.peek() == Some(b'(') {
            self.pos += 1;
            while self.peek() != Some(b')') {
                self.java_type()?;
            }
            self.pos += 1;
            if self.peek() == Some(b'V') {
                self.pos += 1;
            } else {
                self.java_type()?;
            }
            while self.peek() == Some(b'^') {
                self.pos += 1;
                self.reference_type()?;
            }
        } else {
            while self.peek().is_some() {
                self.reference_type()?;
            }
        }
        if self.peek().is_some() {
            return Err(self.error());
        }
        Ok(())
    }

    fn type_parameters(&mut self) -> Result<(), ClassFormatError> {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            self.identifier(b':')?;
            self.expect(b':')?;
            // class bound may be empty
            if !matches!(self.peek(), Some(b':') | Some(b'>')) {
                self.reference_type()?;
            }
            while self.peek() == Some(b':') {
                self.pos += 1;
                self.reference_type()?;
            }
        }
        self.expect(b'>')
    }

    fn java_type(&mut self) -> Result<(), ClassFormatError> {
        match self.peek() {
            Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => {
                self.pos += 1;
                Ok(())
            }
            _ => self.reference_type(),
        }
    }

    fn reference_type(&mut self) -> Result<(), ClassFormatError> {
        match self.bump()? {
            b'L' => self.class_type(),
            b'T' => {
                self.identifier(b';')?;
                self.expect(b';')
            }
            b'[' => self.java_type(),
            _ => Err(self.error()),
        }
    }

    fn class_type(&mut self) -> Result<(), ClassFormatError> {
        let mut name = self.identifier_until(&[b'<', b'.', b';'])?;
        loop {
            if self.peek() == Some(b'<') {
                self.type_arguments()?;
            }
            match self.bump()? {
                b';' => break,
                b'.' => {
                    let inner = self.identifier_until(&[b'<', b'.', b';'])?;
                    name.push('$');
                    name.push_str(&inner);
                }
                _ => return Err(self.error()),
            }
        }
        self.found.push(name);
        Ok(())
    }

    fn type_arguments(&mut self) -> Result<(), ClassFormatError> {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            match self.peek() {
                Some(b'*') => self.pos += 1,
                Some(b'+' | b'-') => {
                    self.pos += 1;
                    self.reference_type()?;
                }
                _ => self.reference_type()?,
            }
        }
        self.expect(b'>')
    }

    fn identifier(&mut self, stop: u8) -> Result<String, ClassFormatError> {
        self.identifier_until(&[stop])
    }

    fn identifier_until(&mut self, stops: &[u8]) -> Result<String, ClassFormatError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start || self.peek().is_none() {
            return Err(self.error());
        }
        Ok(self.source[start..self.pos].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_signature_with_type_arguments() {
        let refs = referenced_classes("Ljava/util/Map<Ljava/lang/String;Ljava/util/List<Ltags/Tag;>;>;")
            .unwrap();
        assert_eq!(
            refs,
            vec!["java/lang/String", "tags/Tag", "java/util/List", "java/util/Map"]
        );
    }

    #[test]
    fn test_class_signature_with_bounds() {
        let refs = referenced_classes(
            "<T:Ljava/lang/Object;:Ljava/lang/Comparable<TT;>;>Ljava/lang/Object;Ljava/lang/Iterable<TT;>;",
        )
        .unwrap();
        assert!(refs.contains(&"java/lang/Comparable".to_string()));
        assert!(refs.contains(&"java/lang/Iterable".to_string()));
    }

    #[test]
    fn test_method_signature_with_throws_and_wildcards() {
        let refs = referenced_classes(
            "<E:Ljava/lang/Exception;>(Ljava/util/List<+Ltags/Tag;>;[TE;I)V^TE;^Ltags/TagException;",
        )
        .unwrap();
        assert!(refs.contains(&"tags/Tag".to_string()));
        assert!(refs.contains(&"tags/TagException".to_string()));
        assert!(refs.contains(&"java/util/List".to_string()));
    }

    #[test]
    fn test_inner_class_segments() {
        let refs = referenced_classes("Ltags/Outer<TT;>.Inner;").unwrap();
        assert_eq!(refs, vec!["tags/Outer$Inner"]);
    }

    #[test]
    fn test_truncated_signature_is_rejected() {
        assert!(referenced_classes("Ljava/util/List<Ltags/Tag;").is_err());
    }
}
