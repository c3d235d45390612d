//! Second pass: re-emit the constant pool with renamed UTF-8 entries
//!
//! The walk repeats the first pass over the same bytes and checks that every
//! entry starts where, and with the tag, the scan recorded. Non-UTF-8
//! entries are copied byte for byte, so every index stays valid and the pool
//! count never changes. Everything after the pool is copied verbatim.

use crate::classfile::{ByteReader, ClassIndex, ConstantTag, RawPoolIndex, Utf8Index};
use crate::consts::POOL_START;
use crate::error::{Error, Result};
use crate::hierarchy::{ClassContext, HierarchyResolver};
use crate::mapping::RenameTable;

use super::scanner::ScanResult;
use super::tracker::{LinkedMember, MemberKind, RemapKind};
use super::utf8::Utf8Entry;

pub struct PoolRewriter<'r> {
    scan: &'r ScanResult,
    names: &'r dyn RenameTable,
    resolver: &'r HierarchyResolver<'r>,
    class: ClassContext<'r>,
    renamed_class: &'r Utf8Entry,
}

impl<'r> PoolRewriter<'r> {
    pub fn new(
        scan: &'r ScanResult,
        names: &'r dyn RenameTable,
        resolver: &'r HierarchyResolver<'r>,
        class: ClassContext<'r>,
        renamed_class: &'r Utf8Entry,
    ) -> Self {
        Self {
            scan,
            names,
            resolver,
            class,
            renamed_class,
        }
    }

    /// Produce the rewritten class file
    pub fn rewrite(&self, data: &[u8]) -> Result<Vec<u8>> {
        let tracker = &self.scan.tracker;
        let mut out = Vec::with_capacity(data.len() + data.len() / 8);
        out.extend_from_slice(data.get(..POOL_START).ok_or(Error::truncated(0, POOL_START))?);

        let mut reader = ByteReader::at(data, POOL_START);
        let mut index: u16 = 1;
        while index < self.scan.pool_count {
            let raw = RawPoolIndex::from(index);
            let expected_tag = tracker.tag(raw)?;
            let expected_offset = tracker.offset(raw)?;
            let offset = reader.position();
            if offset != expected_offset {
                return Err(Error::desync(
                    index,
                    format!("entry at {:#x}", expected_offset),
                    format!("entry at {:#x}", offset),
                ));
            }
            let tag = reader.read_u8()?;
            if tag != expected_tag.as_u8() {
                return Err(Error::desync(
                    index,
                    format!("tag {}", expected_tag.as_u8()),
                    format!("tag {}", tag),
                ));
            }
            out.push(tag);

            match expected_tag {
                ConstantTag::Utf8 => {
                    let len = reader.read_u16()? as usize;
                    reader.skip(len)?;
                    let utf8_index = Utf8Index::from(raw);
                    let original = self.scan.utf8.get(utf8_index)?;
                    let renamed = self.resolve(utf8_index, original)?;
                    if renamed != *original {
                        log::trace!("{:?} {} -> {}", utf8_index, original, renamed);
                    }
                    write_utf8(&mut out, &renamed)?;
                }
                other => {
                    let width = other.fixed_width().unwrap_or_default();
                    out.extend_from_slice(reader.read_bytes(width)?);
                }
            }
            index = index.saturating_add(expected_tag.slots());
        }

        if reader.position() != self.scan.pool_end {
            return Err(Error::desync(
                self.scan.pool_count,
                format!("pool end at {:#x}", self.scan.pool_end),
                format!("pool end at {:#x}", reader.position()),
            ));
        }
        out.extend_from_slice(&data[self.scan.pool_end..]);
        Ok(out)
    }

    /// New content for one UTF-8 entry according to its classification
    fn resolve(&self, index: Utf8Index, original: &Utf8Entry) -> Result<Utf8Entry> {
        let tracker = &self.scan.tracker;
        let renamed = match tracker.kind(index)? {
            RemapKind::None => original.clone(),
            RemapKind::ClassReference => self.names.remap_class(original),
            RemapKind::Descriptor => self.names.remap_descriptor(original),
            RemapKind::Signature => self.names.remap_signature(original)?,
            RemapKind::ModuleName => self.names.remap_module(original),
            RemapKind::PackageName => self.names.remap_package(original),
            RemapKind::NameLinkedToOwner => self.linked_name(index, original)?,
            RemapKind::SelfFieldName => self.self_member_name(index, MemberKind::Field, original)?,
            RemapKind::SelfMethodName => self.self_member_name(index, MemberKind::Method, original)?,
            RemapKind::SourceFile => self.source_file(original),
            RemapKind::InnerSimpleName => self.inner_simple_name(index, original)?,
        };
        Ok(renamed)
    }

    /// A name shared by several owned members is renamed through its last
    /// link; the others are only checked for agreement
    fn linked_name(&self, index: Utf8Index, original: &Utf8Entry) -> Result<Utf8Entry> {
        let tracker = &self.scan.tracker;
        let current = match tracker.linked_member(index)? {
            Some(linked) => linked,
            None => return Ok(original.clone()),
        };
        let renamed = self.rename_linked(&current, original)?;
        for other in tracker.linked_members(index)? {
            if other != current {
                let alternative = self.rename_linked(&other, original)?;
                if alternative != renamed {
                    warn_shared(index, original, &renamed, &alternative);
                    break;
                }
            }
        }
        Ok(renamed)
    }

    fn rename_linked(&self, linked: &LinkedMember, original: &Utf8Entry) -> Result<Utf8Entry> {
        let owner = self.scan.class_name(linked.owner)?;
        let descriptor = self.scan.utf8.get(linked.descriptor)?;
        Ok(match linked.kind {
            MemberKind::Field => self.names.remap_field(owner, original, descriptor),
            MemberKind::Method => self.names.remap_method(owner, original, descriptor),
            MemberKind::Unknown => original.clone(),
        })
    }

    /// Overloads share one name entry; the last declaration decides
    fn self_member_name(&self, index: Utf8Index, kind: MemberKind, original: &Utf8Entry) -> Result<Utf8Entry> {
        let tracker = &self.scan.tracker;
        let descriptor = tracker.descriptor_of(index)?;
        let renamed = self.rename_self(kind, descriptor, original)?;
        for &(other_kind, other_descriptor) in tracker.self_declarations(index)? {
            if (other_kind, other_descriptor) != (kind, descriptor) {
                let alternative = self.rename_self(other_kind, other_descriptor, original)?;
                if alternative != renamed {
                    warn_shared(index, original, &renamed, &alternative);
                    break;
                }
            }
        }
        Ok(renamed)
    }

    fn rename_self(&self, kind: MemberKind, descriptor: Utf8Index, original: &Utf8Entry) -> Result<Utf8Entry> {
        let descriptor = self.scan.utf8.get(descriptor)?;
        match kind {
            MemberKind::Method => self.resolver.resolve_self_method(&self.class, original, descriptor),
            _ => Ok(self.names.remap_field(self.class.this_class, original, descriptor)),
        }
    }

    /// `Outer.java` follows the renamed outer class; the extension is kept
    fn source_file(&self, original: &Utf8Entry) -> Utf8Entry {
        if self.renamed_class == self.class.this_class {
            return original.clone();
        }
        let name = self.renamed_class.as_bytes();
        let simple = &name[self.renamed_class.rfind(b'/').map_or(0, |slash| slash + 1)..];
        let outer = match simple.iter().position(|b| *b == b'$') {
            Some(dollar) => &simple[..dollar],
            None => simple,
        };
        let extension: &[u8] = match original.rfind(b'.') {
            Some(dot) => &original.as_bytes()[dot..],
            None => b".java",
        };
        let mut file = outer.to_vec();
        file.extend_from_slice(extension);
        Utf8Entry::from(file)
    }

    /// Renamed only when every inner class sharing the entry agrees on it
    fn inner_simple_name(&self, index: Utf8Index, original: &Utf8Entry) -> Result<Utf8Entry> {
        let mut chosen: Option<Utf8Entry> = None;
        for inner in self.scan.tracker.inner_classes_of(index)? {
            let candidate = self.renamed_simple_name(inner, original)?;
            match &chosen {
                Some(simple) if *simple != candidate => {
                    log::warn!(
                        "{:?} '{}' is the simple name of inner classes renamed apart ('{}', '{}'); keeping it",
                        index,
                        original,
                        simple,
                        candidate
                    );
                    return Ok(original.clone());
                }
                Some(_) => {}
                None => chosen = Some(candidate),
            }
        }
        Ok(chosen.unwrap_or_else(|| original.clone()))
    }

    fn renamed_simple_name(&self, inner: ClassIndex, original: &Utf8Entry) -> Result<Utf8Entry> {
        let origin = self.scan.class_name(inner)?;
        let renamed = self.names.remap_class(origin);
        if renamed == *origin {
            return Ok(original.clone());
        }
        let split = renamed.rfind(b'$').or_else(|| renamed.rfind(b'/'));
        Ok(match split {
            Some(split) => Utf8Entry::from(&renamed.as_bytes()[split + 1..]),
            None => renamed,
        })
    }
}

fn warn_shared(index: Utf8Index, original: &Utf8Entry, renamed: &Utf8Entry, alternative: &Utf8Entry) {
    log::warn!(
        "{:?} '{}' is shared by members that rename differently ('{}', '{}'); using '{}'",
        index,
        original,
        renamed,
        alternative,
        renamed
    );
}

fn write_utf8(out: &mut Vec<u8>, entry: &Utf8Entry) -> Result<()> {
    let len = u16::try_from(entry.len()).map_err(|_| Error::Utf8TooLong { len: entry.len() })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(entry.as_bytes());
    Ok(())
}
