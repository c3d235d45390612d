//! Constant pool walking, classification and rewriting

pub mod rewriter;
pub mod scanner;
pub mod tracker;
pub mod utf8;

pub use scanner::{scan, ScanResult};
pub use tracker::{EntryKindTracker, LinkedMember, MemberKind, RemapKind};
pub use utf8::{Utf8Entry, Utf8Table};

use crate::classfile::{ByteReader, ConstantTag, RawPoolIndex};
use crate::consts::{MAGIC, POOL_START};
use crate::error::{Error, Result};

/// One constant pool entry as laid out on disk, borrowing from the input
#[derive(Debug, Clone, Copy)]
pub enum RawEntry<'a> {
    Utf8(&'a [u8]),
    /// Integer, float, long or double payload
    Literal,
    Class(u16),
    String(u16),
    MemberRef { tag: ConstantTag, class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType(u16),
    Dynamic { bootstrap: u16, name_and_type: u16 },
    Module(u16),
    Package(u16),
}

/// Where the pool ends and how many slots it declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLayout {
    pub count: u16,
    pub end: usize,
}

/// Check the magic and read `constant_pool_count`
pub fn read_header(data: &[u8]) -> Result<u16> {
    let mut reader = ByteReader::new(data);
    let magic = reader.read_u32()?;
    if magic != MAGIC {
        return Err(Error::BadMagic { found: magic });
    }
    reader.skip(4)?;
    reader.read_u16()
}

/// Walk every pool entry in order, handing each to `visit` with its index,
/// offset and tag. Long and double entries advance the index by two.
pub fn walk_pool<'a, F>(data: &'a [u8], mut visit: F) -> Result<PoolLayout>
where
    F: FnMut(RawPoolIndex, usize, ConstantTag, RawEntry<'a>) -> Result<()>,
{
    let count = read_header(data)?;
    let mut reader = ByteReader::at(data, POOL_START);
    let mut index: u16 = 1;
    while index < count {
        let offset = reader.position();
        let raw_tag = reader.read_u8()?;
        let tag = ConstantTag::from_u8(raw_tag).ok_or(Error::unknown_tag(index, offset, raw_tag))?;
        let entry = read_entry(&mut reader, tag)?;
        visit(RawPoolIndex::from(index), offset, tag, entry)?;
        // a trailing long at count-1 would step past the end; saturate
        index = index.saturating_add(tag.slots());
    }
    Ok(PoolLayout {
        count,
        end: reader.position(),
    })
}

fn read_entry<'a>(reader: &mut ByteReader<'a>, tag: ConstantTag) -> Result<RawEntry<'a>> {
    let entry = match tag {
        ConstantTag::Utf8 => {
            let len = reader.read_u16()? as usize;
            RawEntry::Utf8(reader.read_bytes(len)?)
        }
        ConstantTag::Integer | ConstantTag::Float | ConstantTag::Long | ConstantTag::Double => {
            reader.skip(tag.fixed_width().unwrap_or_default())?;
            RawEntry::Literal
        }
        ConstantTag::Class => RawEntry::Class(reader.read_u16()?),
        ConstantTag::String => RawEntry::String(reader.read_u16()?),
        ConstantTag::MethodType => RawEntry::MethodType(reader.read_u16()?),
        ConstantTag::Module => RawEntry::Module(reader.read_u16()?),
        ConstantTag::Package => RawEntry::Package(reader.read_u16()?),
        ConstantTag::FieldRef | ConstantTag::MethodRef | ConstantTag::InterfaceMethodRef => RawEntry::MemberRef {
            tag,
            class: reader.read_u16()?,
            name_and_type: reader.read_u16()?,
        },
        ConstantTag::NameAndType => RawEntry::NameAndType {
            name: reader.read_u16()?,
            descriptor: reader.read_u16()?,
        },
        ConstantTag::MethodHandle => RawEntry::MethodHandle {
            kind: reader.read_u8()?,
            reference: reader.read_u16()?,
        },
        ConstantTag::Dynamic | ConstantTag::InvokeDynamic => RawEntry::Dynamic {
            bootstrap: reader.read_u16()?,
            name_and_type: reader.read_u16()?,
        },
    };
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::ClassFileWriter;

    #[test]
    fn test_walk_pool_visits_entries_in_order() {
        let mut writer = ClassFileWriter::new("Foo", None);
        writer.pool.add_long(1);
        writer.pool.add_string("hi");
        let bytes = writer.to_bytes().unwrap();

        let mut seen = Vec::new();
        let layout = walk_pool(&bytes, |index, _, tag, _| {
            seen.push((index.as_u16(), tag));
            Ok(())
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                (1, ConstantTag::Utf8),
                (2, ConstantTag::Class),
                (3, ConstantTag::Long),
                (5, ConstantTag::Utf8),
                (6, ConstantTag::String),
            ]
        );
        assert_eq!(layout.count, 7);
        // access flags follow the pool
        assert_eq!(&bytes[layout.end..layout.end + 2], &[0x00, 0x21]);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let bytes = [0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 52, 0, 1];
        assert!(matches!(read_header(&bytes), Err(Error::BadMagic { found: 0xDEAD_BEEF })));
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let mut bytes = ClassFileWriter::new("Foo", None).to_bytes().unwrap();
        // first entry's tag byte
        bytes[10] = 2;
        match walk_pool(&bytes, |_, _, _, _| Ok(())) {
            Err(Error::UnknownTag { index, offset, tag }) => {
                assert_eq!((index, offset, tag), (1, 10, 2));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
