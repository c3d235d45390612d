//! In-memory rename table

use std::collections::HashMap;

use super::{FieldKeying, OwnedMember, RenameTable};
use crate::pool::Utf8Entry;

/// Rename rules held in hash maps, keyed in the origin namespace
#[derive(Debug, Clone, Default)]
pub struct MappingSet {
    field_keying: FieldKeying,
    classes: HashMap<Utf8Entry, Utf8Entry>,
    fields: HashMap<OwnedMember, Utf8Entry>,
    methods: HashMap<OwnedMember, Utf8Entry>,
    modules: HashMap<Utf8Entry, Utf8Entry>,
    packages: HashMap<Utf8Entry, Utf8Entry>,
}

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_keying(mut self, field_keying: FieldKeying) -> Self {
        self.field_keying = field_keying;
        let fields = std::mem::take(&mut self.fields);
        for (member, target) in fields {
            self.put_field(member, target);
        }
        self
    }

    pub fn field_keying(&self) -> FieldKeying {
        self.field_keying
    }

    pub fn put_class(&mut self, from: impl Into<Utf8Entry>, to: impl Into<Utf8Entry>) {
        self.classes.insert(from.into(), to.into());
    }

    pub fn put_field(&mut self, member: OwnedMember, to: impl Into<Utf8Entry>) {
        let key = self.field_key(member);
        self.fields.insert(key, to.into());
    }

    pub fn put_method(&mut self, member: OwnedMember, to: impl Into<Utf8Entry>) {
        self.methods.insert(member, to.into());
    }

    pub fn put_module(&mut self, from: impl Into<Utf8Entry>, to: impl Into<Utf8Entry>) {
        self.modules.insert(from.into(), to.into());
    }

    pub fn put_package(&mut self, from: impl Into<Utf8Entry>, to: impl Into<Utf8Entry>) {
        self.packages.insert(from.into(), to.into());
    }

    pub fn len(&self) -> usize {
        self.classes.len() + self.fields.len() + self.methods.len() + self.modules.len() + self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn field_key(&self, mut member: OwnedMember) -> OwnedMember {
        if self.field_keying == FieldKeying::NameOnly {
            member.descriptor = None;
        }
        member
    }

    /// The rules that undo this set: classes, modules and packages flipped,
    /// member keys re-expressed with target-namespace owners and descriptors.
    pub fn inverted(&self) -> MappingSet {
        let mut inverse = MappingSet {
            field_keying: self.field_keying,
            ..Default::default()
        };
        for (from, to) in &self.classes {
            inverse.classes.insert(to.clone(), from.clone());
        }
        for (member, to) in &self.fields {
            inverse.fields.insert(self.rekey(member, to), member.name.clone());
        }
        for (member, to) in &self.methods {
            inverse.methods.insert(self.rekey(member, to), member.name.clone());
        }
        for (from, to) in &self.modules {
            inverse.modules.insert(to.clone(), from.clone());
        }
        for (from, to) in &self.packages {
            inverse.packages.insert(to.clone(), from.clone());
        }
        inverse
    }

    /// Join two sets that share an origin namespace. With this set going
    /// from X to Y and `other` from X to Z, the result goes from Y to Z.
    /// Rules only `other` has are carried over with their keys moved into Y.
    /// The result keys fields the way this set does; a name-only field rule
    /// borrows its descriptor from `other` when `other` keys by descriptor.
    pub fn compose(&self, other: &MappingSet) -> MappingSet {
        let mut joined = MappingSet {
            field_keying: self.field_keying,
            ..Default::default()
        };
        for (from, to) in &self.classes {
            joined.classes.insert(to.clone(), other.remap_class(from));
        }
        for (member, to) in &self.fields {
            let typed = OwnedMember {
                descriptor: member
                    .descriptor
                    .clone()
                    .or_else(|| other.field_descriptor(&member.owner, &member.name)),
                ..member.clone()
            };
            let target = match &typed.descriptor {
                Some(descriptor) => other.remap_field(&member.owner, &member.name, descriptor),
                None => other
                    .fields
                    .get(member)
                    .cloned()
                    .unwrap_or_else(|| member.name.clone()),
            };
            joined.put_field(self.rekey(&typed, to), target);
        }
        for (member, to) in &self.methods {
            let target = match &member.descriptor {
                Some(descriptor) => other.remap_method(&member.owner, &member.name, descriptor),
                None => member.name.clone(),
            };
            joined.methods.insert(self.rekey(member, to), target);
        }
        for (from, to) in &self.modules {
            joined.modules.insert(to.clone(), other.remap_module(from));
        }
        for (from, to) in &self.packages {
            joined.packages.insert(to.clone(), other.remap_package(from));
        }

        for (from, to) in &other.classes {
            joined.classes.entry(self.remap_class(from)).or_insert_with(|| to.clone());
        }
        for (member, to) in &other.fields {
            if !self.fields.contains_key(&self.field_key(member.clone())) {
                let key = joined.field_key(self.rekey(member, &member.name));
                joined.fields.entry(key).or_insert_with(|| to.clone());
            }
        }
        for (member, to) in &other.methods {
            if !self.methods.contains_key(member) {
                let key = self.rekey(member, &member.name);
                joined.methods.entry(key).or_insert_with(|| to.clone());
            }
        }
        for (from, to) in &other.modules {
            joined.modules.entry(self.remap_module(from)).or_insert_with(|| to.clone());
        }
        for (from, to) in &other.packages {
            joined.packages.entry(self.remap_package(from)).or_insert_with(|| to.clone());
        }
        joined
    }

    /// Descriptor of the field rule for `owner.name`; the smallest when several match
    fn field_descriptor(&self, owner: &Utf8Entry, name: &Utf8Entry) -> Option<Utf8Entry> {
        self.fields
            .keys()
            .filter(|member| member.owner == *owner && member.name == *name)
            .filter_map(|member| member.descriptor.clone())
            .min()
    }

    /// `member` keyed in this set's target namespace under `target_name`
    fn rekey(&self, member: &OwnedMember, target_name: &Utf8Entry) -> OwnedMember {
        OwnedMember {
            owner: self.remap_class(&member.owner),
            name: target_name.clone(),
            descriptor: member.descriptor.as_ref().map(|descriptor| self.remap_descriptor(descriptor)),
        }
    }
}

impl RenameTable for MappingSet {
    fn remap_class_or_absent(&self, name: &Utf8Entry) -> Option<Utf8Entry> {
        self.classes.get(name).cloned()
    }

    fn remap_field_or_absent(&self, owner: &Utf8Entry, name: &Utf8Entry, descriptor: &Utf8Entry) -> Option<Utf8Entry> {
        let key = match self.field_keying {
            FieldKeying::WithDescriptor => OwnedMember::new(owner, name, descriptor),
            FieldKeying::NameOnly => OwnedMember::untyped(owner, name),
        };
        self.fields.get(&key).cloned()
    }

    fn remap_method_or_absent(&self, owner: &Utf8Entry, name: &Utf8Entry, descriptor: &Utf8Entry) -> Option<Utf8Entry> {
        self.methods.get(&OwnedMember::new(owner, name, descriptor)).cloned()
    }

    fn remap_module_or_absent(&self, name: &Utf8Entry) -> Option<Utf8Entry> {
        self.modules.get(name).cloned()
    }

    fn remap_package_or_absent(&self, name: &Utf8Entry) -> Option<Utf8Entry> {
        self.packages.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(text: &str) -> Utf8Entry {
        Utf8Entry::from(text)
    }

    #[test]
    fn test_lookups_default_to_identity() {
        let mut set = MappingSet::new();
        set.put_class("a/A", "b/B");
        set.put_method(OwnedMember::new("a/A", "m", "()V"), "run");

        assert_eq!(set.remap_class(&e("a/A")), e("b/B"));
        assert_eq!(set.remap_class(&e("a/Z")), e("a/Z"));
        assert_eq!(set.remap_class_or_absent(&e("a/Z")), None);
        assert_eq!(set.remap_method(&e("a/A"), &e("m"), &e("()V")), e("run"));
        assert_eq!(set.remap_method(&e("a/A"), &e("m"), &e("(I)V")), e("m"));
        assert_eq!(set.remap_method_or_absent(&e("a/A"), &e("m"), &e("(I)V")), None);
    }

    #[test]
    fn test_identity_rule_is_not_absent() {
        let mut set = MappingSet::new();
        set.put_method(OwnedMember::new("a/A", "keep", "()V"), "keep");
        assert_eq!(set.remap_method_or_absent(&e("a/A"), &e("keep"), &e("()V")), Some(e("keep")));
    }

    #[test]
    fn test_constructors_are_never_renamed() {
        let mut set = MappingSet::new();
        set.put_method(OwnedMember::new("a/A", "<init>", "()V"), "oops");
        assert_eq!(set.remap_method(&e("a/A"), &e("<init>"), &e("()V")), e("<init>"));
    }

    #[test]
    fn test_array_class_names_rename_their_element() {
        let mut set = MappingSet::new();
        set.put_class("a/A", "b/B");
        assert_eq!(set.remap_class(&e("[[La/A;")), e("[[Lb/B;"));
        assert_eq!(set.remap_class(&e("[I")), e("[I"));
    }

    #[test]
    fn test_name_only_field_keying() {
        let mut set = MappingSet::new().with_field_keying(FieldKeying::NameOnly);
        set.put_field(OwnedMember::new("a/A", "f", "I"), "count");
        assert_eq!(set.remap_field(&e("a/A"), &e("f"), &e("J")), e("count"));

        let mut typed = MappingSet::new();
        typed.put_field(OwnedMember::new("a/A", "f", "I"), "count");
        assert_eq!(typed.remap_field(&e("a/A"), &e("f"), &e("J")), e("f"));
        assert_eq!(typed.remap_field(&e("a/A"), &e("f"), &e("I")), e("count"));
    }

    #[test]
    fn test_switching_keying_rekeys_existing_fields() {
        let mut set = MappingSet::new();
        set.put_field(OwnedMember::new("a/A", "f", "I"), "count");
        let set = set.with_field_keying(FieldKeying::NameOnly);
        assert_eq!(set.remap_field(&e("a/A"), &e("f"), &e("Z")), e("count"));
    }

    #[test]
    fn test_compose_maps_one_target_namespace_onto_the_other() {
        // both sets start from the same obfuscated names
        let mut named = MappingSet::new();
        named.put_class("a/A", "b/Widget");
        named.put_class("a/Arg", "b/Param");
        named.put_field(OwnedMember::new("a/A", "f", "La/Arg;"), "value");
        named.put_method(OwnedMember::new("a/A", "m", "(La/Arg;)V"), "accept");
        named.put_package("a", "b");

        let mut other = MappingSet::new();
        other.put_class("a/A", "c/Gadget");
        other.put_class("a/Only", "c/Only");
        other.put_field(OwnedMember::new("a/A", "f", "La/Arg;"), "content");
        other.put_method(OwnedMember::new("a/A", "m", "(La/Arg;)V"), "take");
        other.put_method(OwnedMember::new("a/A", "n", "()V"), "reset");
        other.put_package("a", "c");

        let joined = named.compose(&other);
        assert_eq!(joined.field_keying(), FieldKeying::WithDescriptor);
        assert_eq!(joined.remap_class(&e("b/Widget")), e("c/Gadget"));
        assert_eq!(joined.remap_class(&e("b/Param")), e("a/Arg"));
        assert_eq!(joined.remap_class(&e("a/Only")), e("c/Only"));
        assert_eq!(joined.remap_field(&e("b/Widget"), &e("value"), &e("Lb/Param;")), e("content"));
        assert_eq!(joined.remap_method(&e("b/Widget"), &e("accept"), &e("(Lb/Param;)V")), e("take"));
        assert_eq!(joined.remap_method(&e("b/Widget"), &e("n"), &e("()V")), e("reset"));
        assert_eq!(joined.remap_package(&e("b")), e("c"));
        assert_eq!(joined.remap_method_or_absent(&e("a/A"), &e("m"), &e("(La/Arg;)V")), None);
    }

    #[test]
    fn test_compose_name_only_fields_borrow_a_descriptor() {
        let mut named = MappingSet::new().with_field_keying(FieldKeying::NameOnly);
        named.put_class("a/A", "b/Widget");
        named.put_field(OwnedMember::untyped("a/A", "f"), "value");

        let mut other = MappingSet::new();
        other.put_field(OwnedMember::new("a/A", "f", "I"), "count");
        other.put_field(OwnedMember::new("a/A", "g", "J"), "total");

        let joined = named.compose(&other);
        assert_eq!(joined.field_keying(), FieldKeying::NameOnly);
        assert_eq!(joined.remap_field(&e("b/Widget"), &e("value"), &e("I")), e("count"));
        assert_eq!(joined.remap_field(&e("b/Widget"), &e("value"), &e("Z")), e("count"));
        assert_eq!(joined.remap_field(&e("b/Widget"), &e("g"), &e("J")), e("total"));
    }

    #[test]
    fn test_inverted_undoes_every_rule() {
        let mut set = MappingSet::new();
        set.put_class("a/A", "b/B");
        set.put_class("a/Arg", "b/Param");
        set.put_field(OwnedMember::new("a/A", "f", "La/Arg;"), "value");
        set.put_method(OwnedMember::new("a/A", "m", "(La/Arg;)V"), "accept");
        set.put_package("a", "b");
        set.put_module("a.mod", "b.mod");

        let inverse = set.inverted();
        assert_eq!(inverse.len(), set.len());
        assert_eq!(inverse.remap_class(&e("b/B")), e("a/A"));
        assert_eq!(inverse.remap_field(&e("b/B"), &e("value"), &e("Lb/Param;")), e("f"));
        assert_eq!(inverse.remap_method(&e("b/B"), &e("accept"), &e("(Lb/Param;)V")), e("m"));
        assert_eq!(inverse.remap_package(&e("b")), e("a"));
        assert_eq!(inverse.remap_module(&e("b.mod")), e("a.mod"));
    }
}
