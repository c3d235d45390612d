//! Typed constant pool indices for the remapper's side tables
//!
//! The side tables store bare `u16`s, so nothing stops a class index from
//! landing in a table meant for UTF-8 indices. These wrappers keep each table's
//! accessors honest at compile time while storage stays flat.

use std::fmt;
use std::marker::PhantomData;

use super::tags::ConstantTag;

/// Raw, untyped constant pool index
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Debug, Hash, Default)]
pub struct RawPoolIndex(u16);

impl RawPoolIndex {
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Index 0 is never a valid entry; class files use it to mean "absent"
    pub fn is_absent(&self) -> bool {
        self.0 == 0
    }
}

impl From<u16> for RawPoolIndex {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for RawPoolIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index that is known to address a particular kind of entry
pub struct PoolIndex<T: PoolEntryKind>(RawPoolIndex, PhantomData<T>);

impl<T: PoolEntryKind> PoolIndex<T> {
    pub fn as_raw(&self) -> RawPoolIndex {
        self.0
    }

    pub fn as_u16(&self) -> u16 {
        self.0.as_u16()
    }

    pub fn as_usize(&self) -> usize {
        self.0.as_usize()
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_absent()
    }
}

// Manual impls: derives would demand the marker types implement these too
impl<T: PoolEntryKind> Clone for PoolIndex<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: PoolEntryKind> Copy for PoolIndex<T> {}

impl<T: PoolEntryKind> PartialEq for PoolIndex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: PoolEntryKind> Eq for PoolIndex<T> {}

impl<T: PoolEntryKind> fmt::Debug for PoolIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", T::NAME, self.0.as_u16())
    }
}

impl<T: PoolEntryKind> From<u16> for PoolIndex<T> {
    fn from(value: u16) -> Self {
        Self(RawPoolIndex::from(value), PhantomData)
    }
}

impl<T: PoolEntryKind> From<RawPoolIndex> for PoolIndex<T> {
    fn from(raw: RawPoolIndex) -> Self {
        Self(raw, PhantomData)
    }
}

impl<T: PoolEntryKind> From<PoolIndex<T>> for RawPoolIndex {
    fn from(index: PoolIndex<T>) -> Self {
        index.0
    }
}

/// Marker trait for the kind of entry an index addresses
pub trait PoolEntryKind {
    /// Human-readable name used in errors
    const NAME: &'static str;

    /// Whether an entry with `tag` may be addressed by this index kind
    fn accepts(tag: ConstantTag) -> bool;
}

pub type Utf8Index = PoolIndex<Utf8>;
pub type ClassIndex = PoolIndex<Class>;
pub type NameAndTypeIndex = PoolIndex<NameAndType>;

pub struct Utf8;
pub struct Class;
pub struct NameAndType;

impl PoolEntryKind for Utf8 {
    const NAME: &'static str = "Utf8";

    fn accepts(tag: ConstantTag) -> bool {
        tag == ConstantTag::Utf8
    }
}

impl PoolEntryKind for Class {
    const NAME: &'static str = "Class";

    fn accepts(tag: ConstantTag) -> bool {
        tag == ConstantTag::Class
    }
}

impl PoolEntryKind for NameAndType {
    const NAME: &'static str = "NameAndType";

    fn accepts(tag: ConstantTag) -> bool {
        tag == ConstantTag::NameAndType
    }
}
