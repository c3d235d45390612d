//! Destinations for rewritten classes
//!
//! Outputs are keyed by the class's name after renaming, since where a class
//! lives depends on the namespace it is written in.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::pool::Utf8Entry;

pub trait OutputSink {
    /// Writable destination for the class now named `class_name`
    fn create_output(&mut self, class_name: &Utf8Entry) -> Result<Box<dyn Write + '_>>;
}

/// Keeps every output in memory, ordered by class name
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    outputs: BTreeMap<Utf8Entry, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class_name: impl Into<Utf8Entry>) -> Option<&[u8]> {
        self.outputs.get(&class_name.into()).map(Vec::as_slice)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &Utf8Entry> {
        self.outputs.keys()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<Utf8Entry, Vec<u8>> {
        self.outputs
    }
}

impl OutputSink for MemorySink {
    fn create_output(&mut self, class_name: &Utf8Entry) -> Result<Box<dyn Write + '_>> {
        let buffer = self.outputs.entry(class_name.clone()).or_default();
        buffer.clear();
        Ok(Box::new(buffer))
    }
}

/// Writes `<root>/<package path>/<Name>.class`, creating directories on demand
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a class would be written to. Names that could escape the root
    /// are rejected.
    pub fn path_for(&self, class_name: &Utf8Entry) -> Result<PathBuf> {
        let name = class_name.to_string_lossy();
        let invalid = || Error::InvalidOutputName { name: name.to_string() };
        let mut path = self.root.clone();
        let mut segments = name.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(invalid());
            }
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{}.class", segment));
            }
        }
        Ok(path)
    }
}

impl OutputSink for DirectorySink {
    fn create_output(&mut self, class_name: &Utf8Entry) -> Result<Box<dyn Write + '_>> {
        let path = self.path_for(class_name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        log::trace!("writing {} to {}", class_name, path.display());
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}
