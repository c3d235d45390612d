//! classremap
//!
//! Rewrites compiled class files from one naming namespace to another at the
//! constant pool level, without decoding or re-encoding the rest of the file.
//!
//! ## Architecture
//!
//! - **classfile**: tags, a bounds-checked reader, typed pool indices and a
//!   small writer for synthesizing classes
//! - **pool**: the first pass (scan and classify every entry) and the second
//!   pass (re-emit the pool with renamed UTF-8 entries)
//! - **mapping**: the [`RenameTable`] capability and the in-memory [`MappingSet`]
//! - **hierarchy**: class shape extraction, class info oracles and the
//!   breadth-first resolver for inherited method names
//! - **output**: sinks receiving rewritten classes under their new names
//!
//! ## Remap Flow
//!
//! ```text
//! class bytes → scan → Utf8Table + EntryKindTracker
//!                              ↓
//!               rewrite pool ← RenameTable, HierarchyResolver → ClassInfoOracle
//!                              ↓
//!                  header + new pool + untouched body → OutputSink
//! ```

pub mod classfile;
pub mod config;
pub mod consts;
pub mod error;
pub mod hierarchy;
pub mod mapping;
pub mod output;
pub mod pool;
pub mod remapper;

pub use config::{AttributeMode, RemapConfig};
pub use error::{Error, Result};
pub use hierarchy::{
    extract_summary, extract_summary_from_reader, CachingOracle, ClassBytesOracle, ClassInfoOracle, ClassShapeSummary,
    EmptyOracle,
};
pub use mapping::{FieldKeying, MappingSet, OwnedMember, RenameTable};
pub use output::{DirectorySink, MemorySink, OutputSink};
pub use pool::Utf8Entry;
pub use remapper::{ClassRemapper, RemappedClass};

/// Remap one class file with the default configuration and write it to `sink`.
///
/// `oracle` is asked about classes by their origin-namespace names and is
/// not memoized here; every lookup the hierarchy search needs is issued.
/// Returns the class's new name.
pub fn remap_class_bytes(
    data: &[u8],
    names: &dyn RenameTable,
    oracle: &dyn ClassInfoOracle,
    sink: &mut dyn OutputSink,
) -> Result<Utf8Entry> {
    ClassRemapper::new(names, oracle).remap_into(data, sink)
}
