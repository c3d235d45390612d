//! Minimal class file assembler
//!
//! Builds syntactically valid class files from constant pool entries and raw
//! attribute payloads. The remapper never needs it on its own hot path; it is
//! used to synthesize classes (test fixtures, oracle stubs) without a compiler.

use std::collections::HashMap;
use std::io::Write;

use super::tags::ConstantTag;
use crate::consts::MAGIC;
use crate::error::{Error, Result};
use crate::pool::Utf8Entry;

pub const JAVA_1_8: u16 = 52;

/// Access flags used by the writer's callers
pub mod access {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
}

#[derive(Debug, Clone)]
pub enum Constant {
    Utf8(Utf8Entry),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u16, u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
}

impl Constant {
    pub fn tag(&self) -> ConstantTag {
        match self {
            Constant::Utf8(_) => ConstantTag::Utf8,
            Constant::Integer(_) => ConstantTag::Integer,
            Constant::Float(_) => ConstantTag::Float,
            Constant::Long(_) => ConstantTag::Long,
            Constant::Double(_) => ConstantTag::Double,
            Constant::Class(_) => ConstantTag::Class,
            Constant::String(_) => ConstantTag::String,
            Constant::FieldRef(..) => ConstantTag::FieldRef,
            Constant::MethodRef(..) => ConstantTag::MethodRef,
            Constant::InterfaceMethodRef(..) => ConstantTag::InterfaceMethodRef,
            Constant::NameAndType(..) => ConstantTag::NameAndType,
            Constant::MethodHandle(..) => ConstantTag::MethodHandle,
            Constant::MethodType(_) => ConstantTag::MethodType,
            Constant::Dynamic(..) => ConstantTag::Dynamic,
            Constant::InvokeDynamic(..) => ConstantTag::InvokeDynamic,
            Constant::Module(_) => ConstantTag::Module,
            Constant::Package(_) => ConstantTag::Package,
        }
    }

    pub fn write_to<W: Write>(&self, buffer: &mut W) -> Result<()> {
        buffer.write_all(&[self.tag().as_u8()])?;
        match self {
            Constant::Utf8(value) => {
                let len = u16::try_from(value.len()).map_err(|_| Error::Utf8TooLong { len: value.len() })?;
                buffer.write_all(&len.to_be_bytes())?;
                buffer.write_all(value.as_bytes())?;
            }
            Constant::Integer(value) => buffer.write_all(&value.to_be_bytes())?,
            Constant::Float(value) => buffer.write_all(&value.to_be_bytes())?,
            Constant::Long(value) => buffer.write_all(&value.to_be_bytes())?,
            Constant::Double(value) => buffer.write_all(&value.to_be_bytes())?,
            Constant::Class(index)
            | Constant::String(index)
            | Constant::MethodType(index)
            | Constant::Module(index)
            | Constant::Package(index) => buffer.write_all(&index.to_be_bytes())?,
            Constant::FieldRef(a, b)
            | Constant::MethodRef(a, b)
            | Constant::InterfaceMethodRef(a, b)
            | Constant::NameAndType(a, b)
            | Constant::Dynamic(a, b)
            | Constant::InvokeDynamic(a, b) => {
                buffer.write_all(&a.to_be_bytes())?;
                buffer.write_all(&b.to_be_bytes())?;
            }
            Constant::MethodHandle(kind, index) => {
                buffer.write_all(&[*kind])?;
                buffer.write_all(&index.to_be_bytes())?;
            }
        }
        Ok(())
    }
}

/// Deduplicating constant pool builder. Indices start at 1; long and double
/// entries consume the following index as well.
#[derive(Debug, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
    next_index: u32,
    utf8s: HashMap<Utf8Entry, u16>,
    classes: HashMap<u16, u16>,
    name_and_types: HashMap<(u16, u16), u16>,
    refs: HashMap<(u8, u16, u16), u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self {
            next_index: 1,
            ..Default::default()
        }
    }

    /// The `constant_pool_count` this pool serializes with
    pub fn count(&self) -> u32 {
        self.next_index
    }

    /// Append an entry without deduplication and return its index
    pub fn push(&mut self, constant: Constant) -> u16 {
        let index = self.next_index as u16;
        self.next_index += constant.tag().slots() as u32;
        self.constants.push(constant);
        index
    }

    pub fn add_utf8(&mut self, value: &str) -> u16 {
        self.add_utf8_entry(Utf8Entry::from(value))
    }

    pub fn add_utf8_entry(&mut self, value: Utf8Entry) -> u16 {
        if let Some(index) = self.utf8s.get(&value) {
            return *index;
        }
        let index = self.push(Constant::Utf8(value.clone()));
        self.utf8s.insert(value, index);
        index
    }

    pub fn add_class(&mut self, name: &str) -> u16 {
        let name_index = self.add_utf8(name);
        if let Some(index) = self.classes.get(&name_index) {
            return *index;
        }
        let index = self.push(Constant::Class(name_index));
        self.classes.insert(name_index, index);
        index
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        let key = (name_index, descriptor_index);
        if let Some(index) = self.name_and_types.get(&key) {
            return *index;
        }
        let index = self.push(Constant::NameAndType(name_index, descriptor_index));
        self.name_and_types.insert(key, index);
        index
    }

    pub fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.add_member_ref(ConstantTag::FieldRef, class, name, descriptor)
    }

    pub fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.add_member_ref(ConstantTag::MethodRef, class, name, descriptor)
    }

    pub fn add_interface_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.add_member_ref(ConstantTag::InterfaceMethodRef, class, name, descriptor)
    }

    fn add_member_ref(&mut self, tag: ConstantTag, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(class);
        let name_and_type_index = self.add_name_and_type(name, descriptor);
        let key = (tag.as_u8(), class_index, name_and_type_index);
        if let Some(index) = self.refs.get(&key) {
            return *index;
        }
        let constant = match tag {
            ConstantTag::FieldRef => Constant::FieldRef(class_index, name_and_type_index),
            ConstantTag::InterfaceMethodRef => Constant::InterfaceMethodRef(class_index, name_and_type_index),
            _ => Constant::MethodRef(class_index, name_and_type_index),
        };
        let index = self.push(constant);
        self.refs.insert(key, index);
        index
    }

    pub fn add_string(&mut self, value: &str) -> u16 {
        let utf8_index = self.add_utf8(value);
        self.push(Constant::String(utf8_index))
    }

    pub fn add_integer(&mut self, value: i32) -> u16 {
        self.push(Constant::Integer(value))
    }

    pub fn add_float(&mut self, value: f32) -> u16 {
        self.push(Constant::Float(value))
    }

    pub fn add_long(&mut self, value: i64) -> u16 {
        self.push(Constant::Long(value))
    }

    pub fn add_double(&mut self, value: f64) -> u16 {
        self.push(Constant::Double(value))
    }

    pub fn add_method_handle(&mut self, reference_kind: u8, reference_index: u16) -> u16 {
        self.push(Constant::MethodHandle(reference_kind, reference_index))
    }

    pub fn add_method_type(&mut self, descriptor: &str) -> u16 {
        let descriptor_index = self.add_utf8(descriptor);
        self.push(Constant::MethodType(descriptor_index))
    }

    pub fn add_invoke_dynamic(&mut self, bootstrap_index: u16, name: &str, descriptor: &str) -> u16 {
        let name_and_type_index = self.add_name_and_type(name, descriptor);
        self.push(Constant::InvokeDynamic(bootstrap_index, name_and_type_index))
    }

    pub fn add_module(&mut self, name: &str) -> u16 {
        let name_index = self.add_utf8(name);
        self.push(Constant::Module(name_index))
    }

    pub fn add_package(&mut self, name: &str) -> u16 {
        let name_index = self.add_utf8(name);
        self.push(Constant::Package(name_index))
    }

    pub fn write_to<W: Write>(&self, buffer: &mut W) -> Result<()> {
        let count = u16::try_from(self.next_index).map_err(|_| Error::IndexOutOfRange {
            index: u16::MAX,
            count: u16::MAX,
        })?;
        buffer.write_all(&count.to_be_bytes())?;
        for constant in &self.constants {
            constant.write_to(buffer)?;
        }
        Ok(())
    }
}

/// A named attribute with an already-encoded payload
#[derive(Debug, Clone)]
pub struct AttributeWriter {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl AttributeWriter {
    fn write_to<W: Write>(&self, buffer: &mut W) -> Result<()> {
        buffer.write_all(&self.name_index.to_be_bytes())?;
        buffer.write_all(&(self.info.len() as u32).to_be_bytes())?;
        buffer.write_all(&self.info)?;
        Ok(())
    }
}

/// Field or method entry
#[derive(Debug, Clone)]
pub struct MemberWriter {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeWriter>,
}

impl MemberWriter {
    fn write_to<W: Write>(&self, buffer: &mut W) -> Result<()> {
        buffer.write_all(&self.access_flags.to_be_bytes())?;
        buffer.write_all(&self.name_index.to_be_bytes())?;
        buffer.write_all(&self.descriptor_index.to_be_bytes())?;
        write_attributes(&self.attributes, buffer)
    }
}

#[derive(Debug)]
pub struct ClassFileWriter {
    pub minor_version: u16,
    pub major_version: u16,
    pub pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberWriter>,
    pub methods: Vec<MemberWriter>,
    pub attributes: Vec<AttributeWriter>,
}

impl ClassFileWriter {
    /// Start a class. `super_class` of `None` writes index 0, which only the
    /// root class may legally do.
    pub fn new(this_class: &str, super_class: Option<&str>) -> Self {
        let mut pool = ConstantPool::new();
        let this_class = pool.add_class(this_class);
        let super_class = super_class.map(|name| pool.add_class(name)).unwrap_or(0);
        Self {
            minor_version: 0,
            major_version: JAVA_1_8,
            pool,
            access_flags: access::ACC_PUBLIC | access::ACC_SUPER,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn add_interface(&mut self, name: &str) -> u16 {
        let index = self.pool.add_class(name);
        self.interfaces.push(index);
        index
    }

    /// Intern the attribute name and wrap the payload
    pub fn attribute(&mut self, name: &str, info: Vec<u8>) -> AttributeWriter {
        AttributeWriter {
            name_index: self.pool.add_utf8(name),
            info,
        }
    }

    /// Attribute whose payload is a single constant pool index
    pub fn index_attribute(&mut self, name: &str, index: u16) -> AttributeWriter {
        self.attribute(name, index.to_be_bytes().to_vec())
    }

    /// `Code` attribute with an empty exception table
    pub fn code_attribute(
        &mut self,
        max_stack: u16,
        max_locals: u16,
        code: &[u8],
        attributes: Vec<AttributeWriter>,
    ) -> Result<AttributeWriter> {
        let mut info = Vec::new();
        info.extend_from_slice(&max_stack.to_be_bytes());
        info.extend_from_slice(&max_locals.to_be_bytes());
        info.extend_from_slice(&(code.len() as u32).to_be_bytes());
        info.extend_from_slice(code);
        info.extend_from_slice(&0u16.to_be_bytes());
        write_attributes(&attributes, &mut info)?;
        Ok(self.attribute("Code", info))
    }

    pub fn add_field(&mut self, access_flags: u16, name: &str, descriptor: &str, attributes: Vec<AttributeWriter>) {
        let member = self.member(access_flags, name, descriptor, attributes);
        self.fields.push(member);
    }

    pub fn add_method(&mut self, access_flags: u16, name: &str, descriptor: &str, attributes: Vec<AttributeWriter>) {
        let member = self.member(access_flags, name, descriptor, attributes);
        self.methods.push(member);
    }

    pub fn add_attribute(&mut self, attribute: AttributeWriter) {
        self.attributes.push(attribute);
    }

    fn member(&mut self, access_flags: u16, name: &str, descriptor: &str, attributes: Vec<AttributeWriter>) -> MemberWriter {
        MemberWriter {
            access_flags,
            name_index: self.pool.add_utf8(name),
            descriptor_index: self.pool.add_utf8(descriptor),
            attributes,
        }
    }

    pub fn write_to<W: Write>(&self, buffer: &mut W) -> Result<()> {
        buffer.write_all(&MAGIC.to_be_bytes())?;
        buffer.write_all(&self.minor_version.to_be_bytes())?;
        buffer.write_all(&self.major_version.to_be_bytes())?;
        self.pool.write_to(buffer)?;
        buffer.write_all(&self.access_flags.to_be_bytes())?;
        buffer.write_all(&self.this_class.to_be_bytes())?;
        buffer.write_all(&self.super_class.to_be_bytes())?;
        buffer.write_all(&(self.interfaces.len() as u16).to_be_bytes())?;
        for interface in &self.interfaces {
            buffer.write_all(&interface.to_be_bytes())?;
        }
        buffer.write_all(&(self.fields.len() as u16).to_be_bytes())?;
        for field in &self.fields {
            field.write_to(buffer)?;
        }
        buffer.write_all(&(self.methods.len() as u16).to_be_bytes())?;
        for method in &self.methods {
            method.write_to(buffer)?;
        }
        write_attributes(&self.attributes, buffer)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(buffer)
    }
}

fn write_attributes<W: Write>(attributes: &[AttributeWriter], buffer: &mut W) -> Result<()> {
    buffer.write_all(&(attributes.len() as u16).to_be_bytes())?;
    for attribute in attributes {
        attribute.write_to(buffer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_deduplicates_symbolic_entries() {
        let mut pool = ConstantPool::new();
        let a = pool.add_method_ref("a/B", "run", "()V");
        let b = pool.add_method_ref("a/B", "run", "()V");
        assert_eq!(a, b);
        // Utf8 a/B, Class, Utf8 run, Utf8 ()V, NameAndType, MethodRef
        assert_eq!(pool.count(), 7);
        assert_eq!(pool.add_class("a/B"), 2);
    }

    #[test]
    fn test_long_takes_two_indices() {
        let mut pool = ConstantPool::new();
        let long = pool.add_long(7);
        let next = pool.add_integer(1);
        assert_eq!(long, 1);
        assert_eq!(next, 3);
        assert_eq!(pool.count(), 4);
    }

    #[test]
    fn test_minimal_class_layout() {
        let writer = ClassFileWriter::new("Foo", Some("java/lang/Object"));
        let bytes = writer.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
        assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), JAVA_1_8);
        // Utf8 Foo, Class, Utf8 java/lang/Object, Class
        assert_eq!(u16::from_be_bytes([bytes[8], bytes[9]]), 5);
        // access, this, super, 0 interfaces, 0 fields, 0 methods, 0 attributes
        let tail = &bytes[bytes.len() - 14..];
        assert_eq!(tail, &[0x00, 0x21, 0x00, 0x02, 0x00, 0x04, 0, 0, 0, 0, 0, 0, 0, 0]);
    }
}
