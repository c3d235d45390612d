//! Constant pool tags and their on-disk widths

pub const CONSTANT_UTF8: u8 = 1;
pub const CONSTANT_INTEGER: u8 = 3;
pub const CONSTANT_FLOAT: u8 = 4;
pub const CONSTANT_LONG: u8 = 5;
pub const CONSTANT_DOUBLE: u8 = 6;
pub const CONSTANT_CLASS: u8 = 7;
pub const CONSTANT_STRING: u8 = 8;
pub const CONSTANT_FIELDREF: u8 = 9;
pub const CONSTANT_METHODREF: u8 = 10;
pub const CONSTANT_INTERFACEMETHODREF: u8 = 11;
pub const CONSTANT_NAMEANDTYPE: u8 = 12;
pub const CONSTANT_METHODHANDLE: u8 = 15;
pub const CONSTANT_METHODTYPE: u8 = 16;
pub const CONSTANT_DYNAMIC: u8 = 17;
pub const CONSTANT_INVOKEDYNAMIC: u8 = 18;
pub const CONSTANT_MODULE: u8 = 19;
pub const CONSTANT_PACKAGE: u8 = 20;

/// A recognised constant pool tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantTag {
    Utf8,
    Integer,
    Float,
    Long,
    Double,
    Class,
    String,
    FieldRef,
    MethodRef,
    InterfaceMethodRef,
    NameAndType,
    MethodHandle,
    MethodType,
    Dynamic,
    InvokeDynamic,
    Module,
    Package,
}

impl ConstantTag {
    pub fn from_u8(tag: u8) -> Option<Self> {
        let tag = match tag {
            CONSTANT_UTF8 => Self::Utf8,
            CONSTANT_INTEGER => Self::Integer,
            CONSTANT_FLOAT => Self::Float,
            CONSTANT_LONG => Self::Long,
            CONSTANT_DOUBLE => Self::Double,
            CONSTANT_CLASS => Self::Class,
            CONSTANT_STRING => Self::String,
            CONSTANT_FIELDREF => Self::FieldRef,
            CONSTANT_METHODREF => Self::MethodRef,
            CONSTANT_INTERFACEMETHODREF => Self::InterfaceMethodRef,
            CONSTANT_NAMEANDTYPE => Self::NameAndType,
            CONSTANT_METHODHANDLE => Self::MethodHandle,
            CONSTANT_METHODTYPE => Self::MethodType,
            CONSTANT_DYNAMIC => Self::Dynamic,
            CONSTANT_INVOKEDYNAMIC => Self::InvokeDynamic,
            CONSTANT_MODULE => Self::Module,
            CONSTANT_PACKAGE => Self::Package,
            _ => return None,
        };
        Some(tag)
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Utf8 => CONSTANT_UTF8,
            Self::Integer => CONSTANT_INTEGER,
            Self::Float => CONSTANT_FLOAT,
            Self::Long => CONSTANT_LONG,
            Self::Double => CONSTANT_DOUBLE,
            Self::Class => CONSTANT_CLASS,
            Self::String => CONSTANT_STRING,
            Self::FieldRef => CONSTANT_FIELDREF,
            Self::MethodRef => CONSTANT_METHODREF,
            Self::InterfaceMethodRef => CONSTANT_INTERFACEMETHODREF,
            Self::NameAndType => CONSTANT_NAMEANDTYPE,
            Self::MethodHandle => CONSTANT_METHODHANDLE,
            Self::MethodType => CONSTANT_METHODTYPE,
            Self::Dynamic => CONSTANT_DYNAMIC,
            Self::InvokeDynamic => CONSTANT_INVOKEDYNAMIC,
            Self::Module => CONSTANT_MODULE,
            Self::Package => CONSTANT_PACKAGE,
        }
    }

    /// Payload width in bytes after the tag byte. `None` for UTF-8, whose
    /// width is carried by its own 2-byte length prefix.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Utf8 => None,
            Self::Class | Self::String | Self::MethodType | Self::Module | Self::Package => Some(2),
            Self::MethodHandle => Some(3),
            Self::Integer
            | Self::Float
            | Self::FieldRef
            | Self::MethodRef
            | Self::InterfaceMethodRef
            | Self::NameAndType
            | Self::Dynamic
            | Self::InvokeDynamic => Some(4),
            Self::Long | Self::Double => Some(8),
        }
    }

    /// Number of pool indices the entry occupies
    pub fn slots(self) -> u16 {
        match self {
            Self::Long | Self::Double => 2,
            _ => 1,
        }
    }
}

/// Method-handle reference kinds (JVMS 4.4.8)
pub mod reference_kind {
    pub const GET_FIELD: u8 = 1;
    pub const PUT_STATIC: u8 = 4;
    pub const INVOKE_VIRTUAL: u8 = 5;
    pub const INVOKE_INTERFACE: u8 = 9;

    /// Kinds 1 through 4 target a field reference
    pub fn is_field(kind: u8) -> bool {
        (GET_FIELD..=PUT_STATIC).contains(&kind)
    }

    /// Kinds 5 through 9 target a method or interface method reference
    pub fn is_method(kind: u8) -> bool {
        (INVOKE_VIRTUAL..=INVOKE_INTERFACE).contains(&kind)
    }
}
