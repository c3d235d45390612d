//! Class file primitives: tags, a bounds-checked reader, typed pool indices
//! and a small writer for synthesizing classes.

pub mod reader;
pub mod tags;
pub mod typed_index;
pub mod writer;

pub use reader::ByteReader;
pub use tags::ConstantTag;
pub use typed_index::{ClassIndex, NameAndTypeIndex, PoolIndex, RawPoolIndex, Utf8Index};
pub use writer::{ClassFileWriter, ConstantPool};
