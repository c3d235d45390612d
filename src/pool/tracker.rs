//! Per-index classification and cross references for one constant pool
//!
//! Storage is a handful of flat arrays sized to the pool count. Each side
//! table is only reachable through an accessor whose signature names the
//! index kinds it relates, so a class index cannot be stored where a UTF-8
//! index belongs. A name entry can be linked more than once (overloads,
//! one simple name shared by several nested classes); the flat table keeps
//! the last link and the ones it replaced are kept on the side.

use std::collections::HashMap;

use crate::classfile::{ClassIndex, ConstantTag, NameAndTypeIndex, PoolIndex, RawPoolIndex, Utf8Index};
use crate::classfile::typed_index::PoolEntryKind;
use crate::error::{Error, Result};

/// How a UTF-8 entry's content is renamed in the second pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RemapKind {
    #[default]
    None,
    /// `SourceFile` value, rebuilt from the renamed class's simple name
    SourceFile,
    /// `InnerClasses` simple name, rebuilt from the renamed inner class
    InnerSimpleName,
    ModuleName,
    PackageName,
    Descriptor,
    /// Generic signature from a `Signature` or `LocalVariableTypeTable` attribute
    Signature,
    ClassReference,
    /// Member name whose owner and descriptor come from its name-and-type
    NameLinkedToOwner,
    SelfFieldName,
    SelfMethodName,
}

impl RemapKind {
    /// A mark only replaces one of equal or lower priority. Entries shared
    /// between roles end up with the most specific one.
    pub fn priority(self) -> u8 {
        match self {
            RemapKind::None => 0,
            RemapKind::SourceFile | RemapKind::InnerSimpleName => 1,
            RemapKind::ModuleName | RemapKind::PackageName => 2,
            RemapKind::Descriptor | RemapKind::Signature => 3,
            RemapKind::ClassReference => 4,
            RemapKind::NameLinkedToOwner => 5,
            RemapKind::SelfFieldName | RemapKind::SelfMethodName => 6,
        }
    }
}

/// What a name-and-type entry names, learned from the entries that use it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberKind {
    #[default]
    Unknown,
    Field,
    Method,
}

/// A non-self member name together with the entries needed to rename it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedMember {
    pub kind: MemberKind,
    pub owner: ClassIndex,
    pub descriptor: Utf8Index,
}

#[derive(Debug, Clone)]
pub struct EntryKindTracker {
    count: u16,
    tags: Vec<Option<ConstantTag>>,
    offsets: Vec<u32>,
    kinds: Vec<RemapKind>,
    member_kinds: Vec<MemberKind>,
    // class -> name
    class_content: Vec<u16>,
    // name-and-type -> owning class
    nt_owner: Vec<u16>,
    // name -> name-and-type
    name_nt: Vec<u16>,
    // self member name -> descriptor
    name_desc: Vec<u16>,
    // name-and-type -> descriptor
    nt_desc: Vec<u16>,
    // inner simple name -> inner class
    inner_class: Vec<u16>,
    // earlier values of name_nt and inner_class, by name slot
    shadowed_nts: HashMap<u16, Vec<u16>>,
    shadowed_inner: HashMap<u16, Vec<u16>>,
    // every declaration a self member name appears in, in class file order
    self_declarations: HashMap<u16, Vec<(MemberKind, Utf8Index)>>,
}

impl EntryKindTracker {
    pub fn new(count: u16) -> Self {
        let len = count as usize;
        Self {
            count,
            tags: vec![None; len],
            offsets: vec![0; len],
            kinds: vec![RemapKind::None; len],
            member_kinds: vec![MemberKind::Unknown; len],
            class_content: vec![0; len],
            nt_owner: vec![0; len],
            name_nt: vec![0; len],
            name_desc: vec![0; len],
            nt_desc: vec![0; len],
            inner_class: vec![0; len],
            shadowed_nts: HashMap::new(),
            shadowed_inner: HashMap::new(),
            self_declarations: HashMap::new(),
        }
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    fn slot(&self, index: RawPoolIndex) -> Result<usize> {
        if index.is_absent() {
            return Err(Error::UnusableIndex { index: 0 });
        }
        if index.as_u16() >= self.count {
            return Err(Error::IndexOutOfRange {
                index: index.as_u16(),
                count: self.count,
            });
        }
        Ok(index.as_usize())
    }

    /// Record where an entry starts and what it is
    pub fn record_entry(&mut self, index: RawPoolIndex, tag: ConstantTag, offset: usize) -> Result<()> {
        let slot = self.slot(index)?;
        self.tags[slot] = Some(tag);
        self.offsets[slot] = offset as u32;
        Ok(())
    }

    /// Tag of the entry at `index`. The dead slot after a long or double has none.
    pub fn tag(&self, index: RawPoolIndex) -> Result<ConstantTag> {
        let slot = self.slot(index)?;
        self.tags[slot].ok_or(Error::UnusableIndex { index: index.as_u16() })
    }

    pub fn offset(&self, index: RawPoolIndex) -> Result<usize> {
        let slot = self.slot(index)?;
        Ok(self.offsets[slot] as usize)
    }

    /// Check that a typed index addresses an entry of its kind
    pub fn expect<T: PoolEntryKind>(&self, index: PoolIndex<T>) -> Result<()> {
        let tag = self.tag(index.as_raw())?;
        if T::accepts(tag) {
            Ok(())
        } else {
            Err(Error::WrongEntry {
                index: index.as_u16(),
                expected: T::NAME,
            })
        }
    }

    pub fn mark(&mut self, index: Utf8Index, kind: RemapKind) -> Result<()> {
        let slot = self.slot(index.as_raw())?;
        let current = self.kinds[slot];
        if kind.priority() >= current.priority() {
            if current != kind {
                log::trace!("{:?}: {:?} -> {:?}", index, current, kind);
            }
            self.kinds[slot] = kind;
        }
        Ok(())
    }

    pub fn kind(&self, index: Utf8Index) -> Result<RemapKind> {
        let slot = self.slot(index.as_raw())?;
        Ok(self.kinds[slot])
    }

    /// A class entry and the name it points at
    pub fn put_class(&mut self, class: ClassIndex, name: Utf8Index) -> Result<()> {
        let slot = self.slot(class.as_raw())?;
        self.class_content[slot] = name.as_u16();
        self.mark(name, RemapKind::ClassReference)
    }

    pub fn class_content(&self, class: ClassIndex) -> Result<Utf8Index> {
        let slot = self.slot(class.as_raw())?;
        match self.class_content[slot] {
            0 => Err(Error::WrongEntry {
                index: class.as_u16(),
                expected: "Class",
            }),
            content => Ok(Utf8Index::from(content)),
        }
    }

    /// A field, method or interface method reference to `name_and_type` on `owner`
    pub fn put_member_ref(&mut self, name_and_type: NameAndTypeIndex, owner: ClassIndex, kind: MemberKind) -> Result<()> {
        let slot = self.slot(name_and_type.as_raw())?;
        self.slot(owner.as_raw())?;
        self.nt_owner[slot] = owner.as_u16();
        self.set_member_kind(slot, kind);
        Ok(())
    }

    /// A dynamic or invokedynamic call site; its name-and-type has no owner
    pub fn put_dynamic(&mut self, name_and_type: NameAndTypeIndex) -> Result<()> {
        let slot = self.slot(name_and_type.as_raw())?;
        self.set_member_kind(slot, MemberKind::Method);
        Ok(())
    }

    fn set_member_kind(&mut self, slot: usize, kind: MemberKind) {
        if kind != MemberKind::Unknown {
            self.member_kinds[slot] = kind;
        }
    }

    pub fn member_kind(&self, name_and_type: NameAndTypeIndex) -> Result<MemberKind> {
        let slot = self.slot(name_and_type.as_raw())?;
        Ok(self.member_kinds[slot])
    }

    pub fn put_name_and_type(&mut self, name_and_type: NameAndTypeIndex, name: Utf8Index, descriptor: Utf8Index) -> Result<()> {
        let nt_slot = self.slot(name_and_type.as_raw())?;
        let name_slot = self.slot(name.as_raw())?;
        self.slot(descriptor.as_raw())?;
        relink(&mut self.name_nt, &mut self.shadowed_nts, name_slot, name_and_type.as_u16());
        self.nt_desc[nt_slot] = descriptor.as_u16();
        self.mark(name, RemapKind::NameLinkedToOwner)?;
        self.mark(descriptor, RemapKind::Descriptor)
    }

    /// A field or method declared by the class being rewritten
    pub fn put_self_member(&mut self, name: Utf8Index, descriptor: Utf8Index, kind: MemberKind) -> Result<()> {
        let name_slot = self.slot(name.as_raw())?;
        let remap_kind = match kind {
            MemberKind::Method => RemapKind::SelfMethodName,
            _ => RemapKind::SelfFieldName,
        };
        self.mark(name, remap_kind)?;
        if self.kinds[name_slot] == remap_kind {
            self.name_desc[name_slot] = descriptor.as_u16();
        }
        self.mark(descriptor, RemapKind::Descriptor)?;
        self.self_declarations
            .entry(name.as_u16())
            .or_default()
            .push((kind, descriptor));
        Ok(())
    }

    /// Every `(kind, descriptor)` the class declares a member name with
    pub fn self_declarations(&self, name: Utf8Index) -> Result<&[(MemberKind, Utf8Index)]> {
        self.slot(name.as_raw())?;
        Ok(self
            .self_declarations
            .get(&name.as_u16())
            .map_or(&[][..], |declarations| declarations.as_slice()))
    }

    pub fn descriptor_of(&self, name: Utf8Index) -> Result<Utf8Index> {
        let slot = self.slot(name.as_raw())?;
        match self.name_desc[slot] {
            0 => Err(Error::WrongEntry {
                index: name.as_u16(),
                expected: "member name",
            }),
            descriptor => Ok(Utf8Index::from(descriptor)),
        }
    }

    /// Owner and descriptor of a linked member name. `None` when the name's
    /// name-and-type has no owning class (call sites, unused entries).
    pub fn linked_member(&self, name: Utf8Index) -> Result<Option<LinkedMember>> {
        let slot = self.slot(name.as_raw())?;
        Ok(self.member_of(self.name_nt[slot]))
    }

    /// Every owned member the name was linked to, the current link last
    pub fn linked_members(&self, name: Utf8Index) -> Result<Vec<LinkedMember>> {
        let slot = self.slot(name.as_raw())?;
        let mut members = Vec::new();
        for nt in links(&self.name_nt, &self.shadowed_nts, slot) {
            if let Some(member) = self.member_of(nt) {
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        }
        Ok(members)
    }

    fn member_of(&self, name_and_type: u16) -> Option<LinkedMember> {
        let nt_slot = name_and_type as usize;
        match name_and_type {
            0 => None,
            _ => match self.nt_owner[nt_slot] {
                0 => None,
                owner => Some(LinkedMember {
                    kind: self.member_kinds[nt_slot],
                    owner: ClassIndex::from(owner),
                    descriptor: Utf8Index::from(self.nt_desc[nt_slot]),
                }),
            },
        }
    }

    /// `EnclosingMethod`: the name-and-type is a method owned by `class`
    pub fn put_enclosing_method(&mut self, name_and_type: NameAndTypeIndex, class: ClassIndex) -> Result<()> {
        let slot = self.slot(name_and_type.as_raw())?;
        self.slot(class.as_raw())?;
        if self.nt_owner[slot] == 0 {
            self.nt_owner[slot] = class.as_u16();
        }
        self.set_member_kind(slot, MemberKind::Method);
        Ok(())
    }

    /// `InnerClasses`: `name` is the simple name of `class`
    pub fn put_inner_name(&mut self, name: Utf8Index, class: ClassIndex) -> Result<()> {
        let slot = self.slot(name.as_raw())?;
        self.slot(class.as_raw())?;
        relink(&mut self.inner_class, &mut self.shadowed_inner, slot, class.as_u16());
        self.mark(name, RemapKind::InnerSimpleName)
    }

    /// Every inner class `name` is the simple name of, in attribute order
    pub fn inner_classes_of(&self, name: Utf8Index) -> Result<Vec<ClassIndex>> {
        let slot = self.slot(name.as_raw())?;
        Ok(links(&self.inner_class, &self.shadowed_inner, slot)
            .into_iter()
            .map(ClassIndex::from)
            .collect())
    }
}

/// Point `table[slot]` at `value`, keeping a different earlier value aside
fn relink(table: &mut [u16], shadowed: &mut HashMap<u16, Vec<u16>>, slot: usize, value: u16) {
    let previous = std::mem::replace(&mut table[slot], value);
    if previous != 0 && previous != value {
        let earlier = shadowed.entry(slot as u16).or_default();
        if !earlier.contains(&previous) {
            earlier.push(previous);
        }
    }
}

/// Earlier links first, then the current one, without repeats
fn links(table: &[u16], shadowed: &HashMap<u16, Vec<u16>>, slot: usize) -> Vec<u16> {
    let mut links = shadowed.get(&(slot as u16)).cloned().unwrap_or_default();
    let current = table[slot];
    if current != 0 {
        links.retain(|link| *link != current);
        links.push(current);
    }
    links
}
