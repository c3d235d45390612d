//! Single-pass shape extraction
//!
//! Reads just enough of a class file to list its direct ancestors and the
//! methods it declares. No renaming happens here; this is the usual backing
//! for a [`super::ClassInfoOracle`].

use std::io::Read;

use super::ClassShapeSummary;
use crate::classfile::{ByteReader, ClassIndex, Utf8Index};
use crate::consts::ROOT_CLASS;
use crate::error::{Error, Result};
use crate::pool::{walk_pool, RawEntry, Utf8Entry, Utf8Table};

/// A class's own name alongside its shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedClass {
    pub name: Utf8Entry,
    pub summary: ClassShapeSummary,
}

pub fn extract_summary(data: &[u8]) -> Result<ClassShapeSummary> {
    extract(data).map(|class| class.summary)
}

pub fn extract_summary_from_reader<R: Read>(mut input: R) -> Result<ClassShapeSummary> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    extract_summary(&data)
}

pub fn extract(data: &[u8]) -> Result<ExtractedClass> {
    let count = crate::pool::read_header(data)?;
    let mut utf8 = Utf8Table::new(count);
    let mut classes = vec![0u16; count as usize];

    let layout = walk_pool(data, |index, _, _, entry| {
        match entry {
            RawEntry::Utf8(bytes) => utf8.insert(index.into(), Utf8Entry::from(bytes))?,
            RawEntry::Class(name) => classes[index.as_usize()] = name,
            _ => {}
        }
        Ok(())
    })?;

    let class_name = |class: ClassIndex| -> Result<Utf8Entry> {
        match classes.get(class.as_usize()).copied() {
            Some(name) if name != 0 => utf8.get(Utf8Index::from(name)).cloned(),
            _ => Err(Error::WrongEntry {
                index: class.as_u16(),
                expected: "Class",
            }),
        }
    };

    let mut reader = ByteReader::at(data, layout.end);
    let _access_flags = reader.read_u16()?;
    let name = class_name(ClassIndex::from(reader.read_u16()?))?;

    let super_class = ClassIndex::from(reader.read_u16()?);
    let mut ancestors = vec![if super_class.is_absent() {
        Utf8Entry::from(ROOT_CLASS)
    } else {
        class_name(super_class)?
    }];
    let interface_count = reader.read_u16()?;
    for _ in 0..interface_count {
        ancestors.push(class_name(ClassIndex::from(reader.read_u16()?))?);
    }

    let field_count = reader.read_u16()?;
    for _ in 0..field_count {
        reader.skip(6)?;
        reader.skip_attributes()?;
    }

    let mut summary = ClassShapeSummary::new(ancestors);
    let method_count = reader.read_u16()?;
    for _ in 0..method_count {
        let _access_flags = reader.read_u16()?;
        let method_name = utf8.get(Utf8Index::from(reader.read_u16()?))?.clone();
        let descriptor = utf8.get(Utf8Index::from(reader.read_u16()?))?.clone();
        summary.add_method(method_name, descriptor);
        reader.skip_attributes()?;
    }

    log::trace!(
        "extracted {}: {} ancestor(s), {} method(s)",
        name,
        summary.ancestors().len(),
        summary.method_count()
    );
    Ok(ExtractedClass { name, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::writer::access;
    use crate::classfile::ClassFileWriter;

    fn e(text: &str) -> Utf8Entry {
        Utf8Entry::from(text)
    }

    #[test]
    fn test_extracts_ancestors_in_file_order() {
        let mut writer = ClassFileWriter::new("a/Impl", Some("a/Base"));
        writer.add_interface("a/First");
        writer.add_interface("a/Second");
        writer.pool.add_long(42);
        writer.add_field(access::ACC_PRIVATE, "state", "I", vec![]);
        writer.add_method(access::ACC_PUBLIC, "run", "()V", vec![]);
        writer.add_method(access::ACC_PUBLIC, "run", "(I)V", vec![]);
        let code = writer.code_attribute(1, 1, &[0xB1], vec![]).unwrap();
        writer.add_method(access::ACC_PUBLIC, "<init>", "()V", vec![code]);
        let bytes = writer.to_bytes().unwrap();

        let class = extract(&bytes).unwrap();
        assert_eq!(class.name, e("a/Impl"));
        assert_eq!(class.summary.ancestors(), &[e("a/Base"), e("a/First"), e("a/Second")]);
        assert!(class.summary.declares(&e("run"), &e("()V")));
        assert!(class.summary.declares(&e("run"), &e("(I)V")));
        assert!(class.summary.declares(&e("<init>"), &e("()V")));
        assert!(!class.summary.declares(&e("state"), &e("I")));
    }

    #[test]
    fn test_root_class_gets_synthesized_super() {
        let bytes = ClassFileWriter::new("java/lang/Object", None).to_bytes().unwrap();
        let summary = extract_summary(&bytes).unwrap();
        assert_eq!(summary.ancestors(), &[e(ROOT_CLASS)]);
    }

    #[test]
    fn test_reader_input_matches_slice_input() {
        let mut writer = ClassFileWriter::new("a/X", Some("a/Y"));
        writer.add_method(access::ACC_PUBLIC, "go", "()V", vec![]);
        let bytes = writer.to_bytes().unwrap();
        let from_reader = extract_summary_from_reader(std::io::Cursor::new(bytes.clone())).unwrap();
        assert_eq!(from_reader, extract_summary(&bytes).unwrap());
    }

    #[test]
    fn test_truncated_input() {
        let bytes = ClassFileWriter::new("a/X", Some("a/Y")).to_bytes().unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(extract(cut), Err(Error::Truncated { .. })));
    }
}
