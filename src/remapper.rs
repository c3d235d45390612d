//! Entry point tying the two passes together

use std::io::Write;

use crate::config::RemapConfig;
use crate::error::Result;
use crate::hierarchy::{ClassContext, ClassInfoOracle, HierarchyResolver};
use crate::mapping::RenameTable;
use crate::output::OutputSink;
use crate::pool::rewriter::PoolRewriter;
use crate::pool::{scan, Utf8Entry};

/// A rewritten class file and the names it was read and written under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemappedClass {
    pub original_name: Utf8Entry,
    pub name: Utf8Entry,
    pub bytes: Vec<u8>,
}

/// Rewrites class files from one namespace to another.
///
/// Each call owns its own tables; a remapper can be shared by reference
/// between threads as long as the rename table and oracle can.
pub struct ClassRemapper<'a> {
    names: &'a dyn RenameTable,
    oracle: &'a dyn ClassInfoOracle,
    config: RemapConfig,
}

impl<'a> ClassRemapper<'a> {
    pub fn new(names: &'a dyn RenameTable, oracle: &'a dyn ClassInfoOracle) -> Self {
        Self {
            names,
            oracle,
            config: RemapConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RemapConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RemapConfig {
        &self.config
    }

    pub fn remap(&self, data: &[u8]) -> Result<RemappedClass> {
        let scan = scan(data, self.config.attributes)?;
        let original_name = scan.this_class_name()?.clone();
        let super_class = scan.super_class_name()?;
        let interfaces = scan.interface_names()?;
        let name = self.names.remap_class(&original_name);
        log::debug!(
            "remap start: {} -> {} (pool count {}, {:?})",
            original_name,
            name,
            scan.pool_count,
            self.config.attributes
        );

        let resolver = HierarchyResolver::new(self.names, self.oracle, &self.config);
        let class = ClassContext {
            this_class: &original_name,
            super_class: &super_class,
            interfaces: &interfaces,
        };
        let bytes = PoolRewriter::new(&scan, self.names, &resolver, class, &name).rewrite(data)?;

        log::debug!("remap end: {} ({} -> {} bytes)", name, data.len(), bytes.len());
        Ok(RemappedClass {
            original_name,
            name,
            bytes,
        })
    }

    /// Remap and hand the result to `sink` under its new name
    pub fn remap_into(&self, data: &[u8], sink: &mut dyn OutputSink) -> Result<Utf8Entry> {
        let class = self.remap(data)?;
        let mut output = sink.create_output(&class.name)?;
        output.write_all(&class.bytes)?;
        output.flush()?;
        Ok(class.name)
    }
}
