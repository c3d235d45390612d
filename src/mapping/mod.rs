//! Rename tables
//!
//! The remapper consumes names through [`RenameTable`]. Implementors only
//! answer the `*_or_absent` lookups; the identity-on-miss variants and the
//! descriptor and signature walks are provided on top of them.

pub mod descriptor;
pub mod set;

pub use set::MappingSet;

use crate::consts::SPECIAL_METHOD_MARKER;
use crate::error::Result;
use crate::pool::Utf8Entry;

/// Whether field descriptors take part in a field's lookup key. Dialects
/// that record fields by name alone use [`FieldKeying::NameOnly`], which
/// drops the descriptor on both the insert and the lookup side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKeying {
    #[default]
    WithDescriptor,
    NameOnly,
}

/// `(owner, name, descriptor)` lookup key for fields and methods
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnedMember {
    pub owner: Utf8Entry,
    pub name: Utf8Entry,
    pub descriptor: Option<Utf8Entry>,
}

impl OwnedMember {
    pub fn new(owner: impl Into<Utf8Entry>, name: impl Into<Utf8Entry>, descriptor: impl Into<Utf8Entry>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: Some(descriptor.into()),
        }
    }

    /// Key without a descriptor, for fields recorded by name alone
    pub fn untyped(owner: impl Into<Utf8Entry>, name: impl Into<Utf8Entry>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: None,
        }
    }
}

/// Name translation from an origin namespace to a target namespace
pub trait RenameTable {
    fn remap_class_or_absent(&self, name: &Utf8Entry) -> Option<Utf8Entry>;

    fn remap_field_or_absent(&self, owner: &Utf8Entry, name: &Utf8Entry, descriptor: &Utf8Entry) -> Option<Utf8Entry>;

    fn remap_method_or_absent(&self, owner: &Utf8Entry, name: &Utf8Entry, descriptor: &Utf8Entry) -> Option<Utf8Entry>;

    fn remap_module_or_absent(&self, name: &Utf8Entry) -> Option<Utf8Entry>;

    fn remap_package_or_absent(&self, name: &Utf8Entry) -> Option<Utf8Entry>;

    /// Class name in the target namespace. Array classes are written as
    /// descriptors in the pool and renamed element-wise.
    fn remap_class(&self, name: &Utf8Entry) -> Utf8Entry {
        if name.first() == Some(b'[') {
            return self.remap_descriptor(name);
        }
        self.remap_class_or_absent(name).unwrap_or_else(|| name.clone())
    }

    fn remap_field(&self, owner: &Utf8Entry, name: &Utf8Entry, descriptor: &Utf8Entry) -> Utf8Entry {
        self.remap_field_or_absent(owner, name, descriptor)
            .unwrap_or_else(|| name.clone())
    }

    /// Constructors and static initializers are never looked up
    fn remap_method(&self, owner: &Utf8Entry, name: &Utf8Entry, descriptor: &Utf8Entry) -> Utf8Entry {
        if name.first() == Some(SPECIAL_METHOD_MARKER) {
            return name.clone();
        }
        self.remap_method_or_absent(owner, name, descriptor)
            .unwrap_or_else(|| name.clone())
    }

    fn remap_module(&self, name: &Utf8Entry) -> Utf8Entry {
        self.remap_module_or_absent(name).unwrap_or_else(|| name.clone())
    }

    fn remap_package(&self, name: &Utf8Entry) -> Utf8Entry {
        self.remap_package_or_absent(name).unwrap_or_else(|| name.clone())
    }

    fn remap_descriptor(&self, descriptor: &Utf8Entry) -> Utf8Entry {
        descriptor::remap_descriptor(descriptor, &|class: &Utf8Entry| self.remap_class(class))
    }

    fn remap_signature(&self, signature: &Utf8Entry) -> Result<Utf8Entry> {
        descriptor::remap_signature(signature, &|class: &Utf8Entry| self.remap_class(class))
    }
}
