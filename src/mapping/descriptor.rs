// Descriptor and generic signature renaming (JVMS 4.3, 4.7.9.1)

use crate::consts::MAX_NESTING_DEPTH;
use crate::error::{Error, Result};
use crate::pool::Utf8Entry;

/// Rename every `L<class>;` segment of a field or method descriptor.
/// Primitive and array markers are copied; an unterminated segment is
/// copied verbatim.
pub fn remap_descriptor(descriptor: &Utf8Entry, remap_class: &dyn Fn(&Utf8Entry) -> Utf8Entry) -> Utf8Entry {
    let bytes = descriptor.as_bytes();
    if descriptor.find(b'L').is_none() {
        return descriptor.clone();
    }

    let mut out = Vec::with_capacity(bytes.len() + 16);
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        out.push(b);
        i += 1;
        if b != b'L' {
            continue;
        }
        match bytes[i..].iter().position(|c| *c == b';') {
            Some(len) => {
                let class = Utf8Entry::from(&bytes[i..i + len]);
                out.extend_from_slice(remap_class(&class).as_bytes());
                out.push(b';');
                i += len + 1;
            }
            None => {
                out.extend_from_slice(&bytes[i..]);
                break;
            }
        }
    }

    if out == bytes {
        descriptor.clone()
    } else {
        Utf8Entry::from(out)
    }
}

/// Rename every class type in a class, method or field signature. Inner
/// class suffixes (`Outer<..>.Inner`) are looked up as `Outer$Inner`.
pub fn remap_signature(signature: &Utf8Entry, remap_class: &dyn Fn(&Utf8Entry) -> Utf8Entry) -> Result<Utf8Entry> {
    let mut parser = SignatureRewriter {
        input: signature.as_bytes(),
        pos: 0,
        out: Vec::with_capacity(signature.len() + 16),
        depth: 0,
        remap_class,
    };
    parser.rewrite()?;
    if parser.out == signature.as_bytes() {
        Ok(signature.clone())
    } else {
        Ok(Utf8Entry::from(parser.out))
    }
}

struct SignatureRewriter<'a> {
    input: &'a [u8],
    pos: usize,
    out: Vec<u8>,
    depth: usize,
    remap_class: &'a dyn Fn(&Utf8Entry) -> Utf8Entry,
}

impl<'a> SignatureRewriter<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn more(&self) -> bool {
        self.pos < self.input.len()
    }

    fn error(&self) -> Error {
        Error::malformed_signature(self.input, self.pos)
    }

    /// Copy one expected byte through
    fn expect(&mut self, b: u8) -> Result<()> {
        if self.peek() == Some(b) {
            self.out.push(b);
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn consume(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.out.push(b);
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Take bytes up to one of `stops` without copying them
    fn take_until(&mut self, stops: &[u8]) -> Result<&'a [u8]> {
        let input = self.input;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(&input[start..self.pos])
    }

    fn copy_identifier(&mut self) -> Result<()> {
        let identifier = self.take_until(b".;[/<>:")?;
        self.out.extend_from_slice(identifier);
        Ok(())
    }

    fn rewrite(&mut self) -> Result<()> {
        if self.peek() == Some(b'<') {
            self.type_parameters()?;
        }
        if self.peek() == Some(b'(') {
            return self.method_signature();
        }
        // a field signature, or a class signature's superclass and interfaces
        if !self.more() {
            return Err(self.error());
        }
        while self.more() {
            self.type_signature()?;
        }
        Ok(())
    }

    fn type_parameters(&mut self) -> Result<()> {
        self.expect(b'<')?;
        while !self.consume(b'>') {
            self.copy_identifier()?;
            self.expect(b':')?;
            if !matches!(self.peek(), Some(b':') | Some(b'>')) {
                self.reference_type()?;
            }
            while self.consume(b':') {
                self.reference_type()?;
            }
        }
        Ok(())
    }

    fn method_signature(&mut self) -> Result<()> {
        self.expect(b'(')?;
        while !self.consume(b')') {
            self.type_signature()?;
        }
        if !self.consume(b'V') {
            self.type_signature()?;
        }
        while self.consume(b'^') {
            self.reference_type()?;
        }
        if self.more() {
            return Err(self.error());
        }
        Ok(())
    }

    fn type_signature(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => {
                self.pos += 1;
                self.out.push(self.input[self.pos - 1]);
                Ok(())
            }
            _ => self.reference_type(),
        }
    }

    fn reference_type(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'L') => self.class_type(),
            Some(b'T') => {
                self.expect(b'T')?;
                self.copy_identifier()?;
                self.expect(b';')
            }
            Some(b'[') => {
                while self.consume(b'[') {}
                self.type_signature()
            }
            _ => Err(self.error()),
        }
    }

    fn class_type(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.error());
        }
        self.expect(b'L')?;

        let mut origin = Utf8Entry::from(self.take_until(b"<.;")?);
        let mut renamed = (self.remap_class)(&origin);
        self.out.extend_from_slice(renamed.as_bytes());
        if self.peek() == Some(b'<') {
            self.type_arguments()?;
        }

        while self.consume(b'.') {
            let simple = self.take_until(b"<.;")?;
            let mut nested = origin.as_bytes().to_vec();
            nested.push(b'$');
            nested.extend_from_slice(simple);
            origin = Utf8Entry::from(nested);

            let nested_renamed = (self.remap_class)(&origin);
            self.out.extend_from_slice(inner_suffix(&renamed, &nested_renamed, simple));
            renamed = nested_renamed;
            if self.peek() == Some(b'<') {
                self.type_arguments()?;
            }
        }

        self.expect(b';')?;
        self.depth -= 1;
        Ok(())
    }

    fn type_arguments(&mut self) -> Result<()> {
        self.expect(b'<')?;
        while !self.consume(b'>') {
            if self.consume(b'*') {
                continue;
            }
            if !self.consume(b'+') {
                self.consume(b'-');
            }
            self.reference_type()?;
        }
        Ok(())
    }
}

/// The simple name to print after `.` for a renamed inner class
fn inner_suffix<'e>(outer: &Utf8Entry, inner: &'e Utf8Entry, original: &'e [u8]) -> &'e [u8] {
    let bytes = inner.as_bytes();
    if bytes.len() > outer.len() + 1 && bytes.starts_with(outer.as_bytes()) && bytes[outer.len()] == b'$' {
        return &bytes[outer.len() + 1..];
    }
    if bytes.ends_with(original) {
        return original;
    }
    match inner.rfind(b'$').or_else(|| inner.rfind(b'/')) {
        Some(split) => &bytes[split + 1..],
        None => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn renames(pairs: &[(&str, &str)]) -> impl Fn(&Utf8Entry) -> Utf8Entry {
        let map: HashMap<Utf8Entry, Utf8Entry> = pairs
            .iter()
            .map(|(from, to)| (Utf8Entry::from(*from), Utf8Entry::from(*to)))
            .collect();
        move |name: &Utf8Entry| map.get(name).cloned().unwrap_or_else(|| name.clone())
    }

    #[test]
    fn test_descriptor_renames_embedded_classes() {
        let remap = renames(&[("foo/Bar", "foo/Baz")]);
        let out = remap_descriptor(&"(Ljava/lang/String;I)Lfoo/Bar;".into(), &remap);
        assert_eq!(out.to_string(), "(Ljava/lang/String;I)Lfoo/Baz;");

        let out = remap_descriptor(&"([[Lfoo/Bar;J)V".into(), &remap);
        assert_eq!(out.to_string(), "([[Lfoo/Baz;J)V");
    }

    #[test]
    fn test_descriptor_without_classes_is_untouched() {
        let remap = renames(&[("I", "X")]);
        let descriptor = Utf8Entry::from("(IJ)[D");
        assert_eq!(remap_descriptor(&descriptor, &remap), descriptor);
    }

    #[test]
    fn test_unterminated_descriptor_is_copied() {
        let remap = renames(&[("foo/Bar", "foo/Baz")]);
        let out = remap_descriptor(&"(Lfoo/Bar".into(), &remap);
        assert_eq!(out.to_string(), "(Lfoo/Bar");
    }

    #[test]
    fn test_signature_renames_type_arguments_and_bounds() {
        let remap = renames(&[("a/Item", "b/Entry"), ("a/Box", "b/Crate")]);
        let out = remap_signature(
            &"<T:La/Item;U::Ljava/lang/Comparable<-TT;>;>La/Box<TT;>;Ljava/util/List<+La/Item;>;".into(),
            &remap,
        )
        .unwrap();
        assert_eq!(
            out.to_string(),
            "<T:Lb/Entry;U::Ljava/lang/Comparable<-TT;>;>Lb/Crate<TT;>;Ljava/util/List<+Lb/Entry;>;"
        );
    }

    #[test]
    fn test_method_signature_with_throws_and_wildcards() {
        let remap = renames(&[("a/Fail", "b/Oops")]);
        let out = remap_signature(&"<E:La/Fail;>(Ljava/util/Map<*[I>;TE;)V^TE;^La/Fail;".into(), &remap).unwrap();
        assert_eq!(out.to_string(), "<E:Lb/Oops;>(Ljava/util/Map<*[I>;TE;)V^TE;^Lb/Oops;");
    }

    #[test]
    fn test_inner_class_suffix_follows_rename() {
        let remap = renames(&[("a/Outer", "b/Shell"), ("a/Outer$Inner", "b/Shell$Core")]);
        let out = remap_signature(&"La/Outer<TT;>.Inner<La/Outer;>;".into(), &remap).unwrap();
        assert_eq!(out.to_string(), "Lb/Shell<TT;>.Core<Lb/Shell;>;");

        let out = remap_signature(&"La/Outer<TT;>.Other;".into(), &remap).unwrap();
        assert_eq!(out.to_string(), "Lb/Shell<TT;>.Other;");
    }

    #[test]
    fn test_malformed_signature_reports_position() {
        let remap = renames(&[]);
        match remap_signature(&"Ljava/util/List<TT;".into(), &remap) {
            Err(Error::MalformedSignature { position, .. }) => assert_eq!(position, 19),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(remap_signature(&"".into(), &remap).is_err());
        assert!(remap_signature(&"(I)Q".into(), &remap).is_err());
    }
}
