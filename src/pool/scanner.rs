//! First pass: classify every constant pool entry
//!
//! One forward walk fills the [`Utf8Table`] and the [`EntryKindTracker`].
//! After the pool the class header, field and method tables are read so the
//! class's own member names and descriptors are marked. With
//! [`AttributeMode::Rewrite`] the attributes that point straight at UTF-8
//! entries are classified too; otherwise their bodies are skipped by length.

use crate::classfile::tags::reference_kind;
use crate::classfile::{ByteReader, ClassIndex, ConstantTag, NameAndTypeIndex, RawPoolIndex, Utf8Index};
use crate::config::AttributeMode;
use crate::consts::{attribute, MAX_NESTING_DEPTH, ROOT_CLASS};
use crate::error::{Error, Result};

use super::tracker::{EntryKindTracker, MemberKind, RemapKind};
use super::utf8::{Utf8Entry, Utf8Table};
use super::{walk_pool, RawEntry};

/// Everything the rewrite pass needs from the first pass
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub utf8: Utf8Table,
    pub tracker: EntryKindTracker,
    pub pool_count: u16,
    /// Offset of the access flags, just past the last pool entry
    pub pool_end: usize,
    pub this_class: ClassIndex,
    pub super_class: ClassIndex,
    pub interfaces: Vec<ClassIndex>,
}

impl ScanResult {
    pub fn class_name(&self, class: ClassIndex) -> Result<&Utf8Entry> {
        self.tracker.expect(class)?;
        self.utf8.get(self.tracker.class_content(class)?)
    }

    pub fn this_class_name(&self) -> Result<&Utf8Entry> {
        self.class_name(self.this_class)
    }

    /// The direct superclass; the root class stands in when none is declared
    pub fn super_class_name(&self) -> Result<Utf8Entry> {
        if self.super_class.is_absent() {
            Ok(Utf8Entry::from(ROOT_CLASS))
        } else {
            self.class_name(self.super_class).cloned()
        }
    }

    pub fn interface_names(&self) -> Result<Vec<Utf8Entry>> {
        self.interfaces
            .iter()
            .map(|interface| self.class_name(*interface).cloned())
            .collect()
    }
}

/// Run the first pass over a whole class file
pub fn scan(data: &[u8], mode: AttributeMode) -> Result<ScanResult> {
    let count = super::read_header(data)?;
    let mut utf8 = Utf8Table::new(count);
    let mut tracker = EntryKindTracker::new(count);
    let mut handles = Vec::new();

    let layout = walk_pool(data, |index, offset, tag, entry| {
        tracker.record_entry(index, tag, offset)?;
        match entry {
            RawEntry::Utf8(bytes) => utf8.insert(index.into(), Utf8Entry::from(bytes))?,
            RawEntry::Class(name) => tracker.put_class(index.into(), name.into())?,
            RawEntry::MemberRef {
                tag,
                class,
                name_and_type,
            } => {
                let kind = if tag == ConstantTag::FieldRef {
                    MemberKind::Field
                } else {
                    MemberKind::Method
                };
                tracker.put_member_ref(name_and_type.into(), class.into(), kind)?;
            }
            RawEntry::Dynamic { name_and_type, .. } => tracker.put_dynamic(name_and_type.into())?,
            RawEntry::NameAndType { name, descriptor } => {
                tracker.put_name_and_type(index.into(), name.into(), descriptor.into())?
            }
            RawEntry::MethodHandle { kind, reference } => handles.push((index, kind, reference)),
            RawEntry::MethodType(descriptor) => tracker.mark(descriptor.into(), RemapKind::Descriptor)?,
            RawEntry::Module(name) => tracker.mark(name.into(), RemapKind::ModuleName)?,
            RawEntry::Package(name) => tracker.mark(name.into(), RemapKind::PackageName)?,
            RawEntry::String(_) | RawEntry::Literal => {}
        }
        Ok(())
    })?;

    // handles may point forward, so they are checked once every tag is known
    for (index, kind, reference) in handles {
        check_handle(&tracker, index, kind, RawPoolIndex::from(reference))?;
    }

    let mut reader = ByteReader::at(data, layout.end);
    let _access_flags = reader.read_u16()?;
    let this_class = ClassIndex::from(reader.read_u16()?);
    let super_class = ClassIndex::from(reader.read_u16()?);
    tracker.expect(this_class)?;
    if !super_class.is_absent() {
        tracker.expect(super_class)?;
    }
    let interface_count = reader.read_u16()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        let interface = ClassIndex::from(reader.read_u16()?);
        tracker.expect(interface)?;
        interfaces.push(interface);
    }

    let mut attributes = AttributeScanner {
        utf8: &utf8,
        tracker: &mut tracker,
        mode,
    };
    for kind in [MemberKind::Field, MemberKind::Method] {
        let member_count = reader.read_u16()?;
        for _ in 0..member_count {
            let _access_flags = reader.read_u16()?;
            let name = Utf8Index::from(reader.read_u16()?);
            let descriptor = Utf8Index::from(reader.read_u16()?);
            attributes.tracker.put_self_member(name, descriptor, kind)?;
            attributes.scan(&mut reader, 0)?;
        }
    }
    attributes.scan(&mut reader, 0)?;

    log::trace!(
        "scanned {} pool slots, {} interface(s), body ends at {:#x}",
        count,
        interfaces.len(),
        reader.position()
    );

    Ok(ScanResult {
        utf8,
        tracker,
        pool_count: count,
        pool_end: layout.end,
        this_class,
        super_class,
        interfaces,
    })
}

fn check_handle(tracker: &EntryKindTracker, index: RawPoolIndex, kind: u8, reference: RawPoolIndex) -> Result<()> {
    let target = tracker.tag(reference)?;
    let valid = if reference_kind::is_field(kind) {
        target == ConstantTag::FieldRef
    } else if reference_kind::is_method(kind) {
        matches!(target, ConstantTag::MethodRef | ConstantTag::InterfaceMethodRef)
    } else {
        false
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidHandle {
            index: index.as_u16(),
            kind,
            target_tag: target.as_u8(),
        })
    }
}

/// Classifies the UTF-8 entries attributes point at
struct AttributeScanner<'s> {
    utf8: &'s Utf8Table,
    tracker: &'s mut EntryKindTracker,
    mode: AttributeMode,
}

impl AttributeScanner<'_> {
    /// Read one attribute table, leaving `reader` just past it
    fn scan(&mut self, reader: &mut ByteReader<'_>, depth: usize) -> Result<()> {
        if self.mode == AttributeMode::Passthrough {
            return reader.skip_attributes();
        }
        let count = reader.read_u16()?;
        for _ in 0..count {
            let name = Utf8Index::from(reader.read_u16()?);
            let length = reader.read_u32()? as usize;
            let mut body = reader.split(length)?;
            let name = self.utf8.get(name)?.clone();
            self.scan_attribute(name.as_bytes(), &mut body, depth)?;
        }
        Ok(())
    }

    fn scan_attribute(&mut self, name: &[u8], body: &mut ByteReader<'_>, depth: usize) -> Result<()> {
        match name {
            attribute::SIGNATURE => self.mark(body.read_u16()?, RemapKind::Signature),
            attribute::SOURCE_FILE => self.mark(body.read_u16()?, RemapKind::SourceFile),
            attribute::INNER_CLASSES => {
                let count = body.read_u16()?;
                for _ in 0..count {
                    let inner = ClassIndex::from(body.read_u16()?);
                    let _outer = body.read_u16()?;
                    let inner_name = body.read_u16()?;
                    let _flags = body.read_u16()?;
                    if inner_name != 0 {
                        self.tracker.put_inner_name(inner_name.into(), inner)?;
                    }
                }
                Ok(())
            }
            attribute::ENCLOSING_METHOD => {
                let class = ClassIndex::from(body.read_u16()?);
                let method = body.read_u16()?;
                if method != 0 {
                    self.tracker.put_enclosing_method(NameAndTypeIndex::from(method), class)?;
                }
                Ok(())
            }
            attribute::RECORD => {
                let count = body.read_u16()?;
                for _ in 0..count {
                    let _name = body.read_u16()?;
                    self.mark(body.read_u16()?, RemapKind::Descriptor)?;
                    self.scan(body, depth + 1)?;
                }
                Ok(())
            }
            attribute::CODE => {
                body.skip(4)?;
                let code_length = body.read_u32()? as usize;
                body.skip(code_length)?;
                let exception_table_length = body.read_u16()? as usize;
                body.skip(exception_table_length * 8)?;
                self.scan(body, depth + 1)
            }
            attribute::LOCAL_VARIABLE_TABLE => self.scan_local_variables(body, RemapKind::Descriptor),
            attribute::LOCAL_VARIABLE_TYPE_TABLE => self.scan_local_variables(body, RemapKind::Signature),
            attribute::RUNTIME_VISIBLE_ANNOTATIONS | attribute::RUNTIME_INVISIBLE_ANNOTATIONS => {
                let count = body.read_u16()?;
                for _ in 0..count {
                    self.scan_annotation(body, depth)?;
                }
                Ok(())
            }
            attribute::RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS | attribute::RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS => {
                let parameters = body.read_u8()?;
                for _ in 0..parameters {
                    let count = body.read_u16()?;
                    for _ in 0..count {
                        self.scan_annotation(body, depth)?;
                    }
                }
                Ok(())
            }
            attribute::ANNOTATION_DEFAULT => self.scan_element_value(body, depth),
            attribute::RUNTIME_VISIBLE_TYPE_ANNOTATIONS | attribute::RUNTIME_INVISIBLE_TYPE_ANNOTATIONS => {
                let count = body.read_u16()?;
                for _ in 0..count {
                    self.scan_type_annotation(body, depth)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn scan_local_variables(&mut self, body: &mut ByteReader<'_>, kind: RemapKind) -> Result<()> {
        let count = body.read_u16()?;
        for _ in 0..count {
            // start_pc, length, name
            body.skip(6)?;
            self.mark(body.read_u16()?, kind)?;
            let _slot = body.read_u16()?;
        }
        Ok(())
    }

    fn scan_annotation(&mut self, body: &mut ByteReader<'_>, depth: usize) -> Result<()> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::MalformedAttribute {
                attribute: "annotation",
                offset: body.position(),
            });
        }
        self.mark(body.read_u16()?, RemapKind::Descriptor)?;
        let pairs = body.read_u16()?;
        for _ in 0..pairs {
            let _element_name = body.read_u16()?;
            self.scan_element_value(body, depth + 1)?;
        }
        Ok(())
    }

    /// `target_type`, its `target_info`, the `type_path`, then a plain annotation
    fn scan_type_annotation(&mut self, body: &mut ByteReader<'_>, depth: usize) -> Result<()> {
        let offset = body.position();
        let target_info = match body.read_u8()? {
            // empty_target
            0x13..=0x15 => 0,
            // type_parameter_target, formal_parameter_target
            0x00 | 0x01 | 0x16 => 1,
            // supertype, throws, catch and offset targets
            0x10 | 0x17 | 0x42..=0x46 => 2,
            // type_parameter_bound_target
            0x11 | 0x12 => 2,
            // type_argument_target
            0x47..=0x4B => 3,
            // localvar_target: start_pc, length, index per entry
            0x40 | 0x41 => body.read_u16()? as usize * 6,
            _ => {
                return Err(Error::MalformedAttribute {
                    attribute: "type annotation target",
                    offset,
                })
            }
        };
        body.skip(target_info)?;
        let path_length = body.read_u8()? as usize;
        body.skip(path_length * 2)?;
        self.scan_annotation(body, depth)
    }

    fn scan_element_value(&mut self, body: &mut ByteReader<'_>, depth: usize) -> Result<()> {
        let offset = body.position();
        match body.read_u8()? {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => body.skip(2),
            b'e' => {
                self.mark(body.read_u16()?, RemapKind::Descriptor)?;
                body.skip(2)
            }
            b'c' => self.mark(body.read_u16()?, RemapKind::Descriptor),
            b'@' => self.scan_annotation(body, depth + 1),
            b'[' => {
                let count = body.read_u16()?;
                for _ in 0..count {
                    self.scan_element_value(body, depth + 1)?;
                }
                Ok(())
            }
            _ => Err(Error::MalformedAttribute {
                attribute: "annotation element",
                offset,
            }),
        }
    }

    fn mark(&mut self, index: u16, kind: RemapKind) -> Result<()> {
        self.tracker.mark(Utf8Index::from(index), kind)
    }
}
