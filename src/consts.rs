// Class file layout and naming constants shared by the scanner, extractor and rewriter

/// `0xCAFEBABE`
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Magic (4) + minor (2) + major (2)
pub const HEADER_LEN: usize = 8;

/// Header plus the 2-byte constant pool count
pub const POOL_START: usize = HEADER_LEN + 2;

/// Root of every class hierarchy; synthesized when a class has no super class
pub const ROOT_CLASS: &str = "java/lang/Object";

/// Constructors and static initializers start with this byte and are never renamed
pub const SPECIAL_METHOD_MARKER: u8 = b'<';

/// Default class-name prefixes treated as the platform runtime
pub const DEFAULT_PLATFORM_PREFIXES: &[&str] = &["java/", "javax/"];

/// Environment variables consulted by `RemapConfig::from_env`
pub const ENV_PLATFORM_PREFIXES: &str = "CLASSREMAP_PLATFORM_PREFIXES";
pub const ENV_ATTRIBUTE_MODE: &str = "CLASSREMAP_ATTRIBUTES";

/// Attribute names the attribute-aware scan understands
pub mod attribute {
    pub const CODE: &[u8] = b"Code";
    pub const SIGNATURE: &[u8] = b"Signature";
    pub const SOURCE_FILE: &[u8] = b"SourceFile";
    pub const INNER_CLASSES: &[u8] = b"InnerClasses";
    pub const ENCLOSING_METHOD: &[u8] = b"EnclosingMethod";
    pub const RECORD: &[u8] = b"Record";
    pub const LOCAL_VARIABLE_TABLE: &[u8] = b"LocalVariableTable";
    pub const LOCAL_VARIABLE_TYPE_TABLE: &[u8] = b"LocalVariableTypeTable";
    pub const RUNTIME_VISIBLE_ANNOTATIONS: &[u8] = b"RuntimeVisibleAnnotations";
    pub const RUNTIME_INVISIBLE_ANNOTATIONS: &[u8] = b"RuntimeInvisibleAnnotations";
    pub const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &[u8] = b"RuntimeVisibleParameterAnnotations";
    pub const RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &[u8] = b"RuntimeInvisibleParameterAnnotations";
    pub const ANNOTATION_DEFAULT: &[u8] = b"AnnotationDefault";
    pub const RUNTIME_VISIBLE_TYPE_ANNOTATIONS: &[u8] = b"RuntimeVisibleTypeAnnotations";
    pub const RUNTIME_INVISIBLE_TYPE_ANNOTATIONS: &[u8] = b"RuntimeInvisibleTypeAnnotations";
}

// Annotations and generic signatures nest; recursion stops at this depth
pub const MAX_NESTING_DEPTH: usize = 64;
