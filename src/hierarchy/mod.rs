//! Inheritance-aware method renaming
//!
//! A method declared by the class being rewritten may override one declared
//! further up, in which case its rule is keyed on the ancestor. When the
//! direct lookup misses, [`HierarchyResolver`] walks the ancestry breadth
//! first, asking a [`ClassInfoOracle`] for each candidate's shape.
//!
//! The resolver keeps no cache. Every shape it needs is requested from the
//! oracle; wrap the oracle in [`CachingOracle`] to absorb repeats.

pub mod extractor;
pub mod oracle;

pub use extractor::{extract, extract_summary, extract_summary_from_reader, ExtractedClass};
pub use oracle::{CachingOracle, ClassBytesOracle, EmptyOracle};

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::config::RemapConfig;
use crate::consts::SPECIAL_METHOD_MARKER;
use crate::error::{Error, Result};
use crate::mapping::RenameTable;
use crate::pool::Utf8Entry;

/// Minimal shape of one class: direct ancestors and declared methods
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassShapeSummary {
    /// Direct superclass first, then directly implemented interfaces in file order
    ancestors: Vec<Utf8Entry>,
    /// Methods declared on the class itself, every overload kept
    methods: HashMap<Utf8Entry, Vec<Utf8Entry>>,
}

impl ClassShapeSummary {
    pub fn new(ancestors: Vec<Utf8Entry>) -> Self {
        Self {
            ancestors,
            methods: HashMap::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder form of [`ClassShapeSummary::add_method`]
    pub fn with_method(mut self, name: impl Into<Utf8Entry>, descriptor: impl Into<Utf8Entry>) -> Self {
        self.add_method(name.into(), descriptor.into());
        self
    }

    pub fn add_method(&mut self, name: Utf8Entry, descriptor: Utf8Entry) {
        let overloads = self.methods.entry(name).or_default();
        if !overloads.contains(&descriptor) {
            overloads.push(descriptor);
        }
    }

    pub fn ancestors(&self) -> &[Utf8Entry] {
        &self.ancestors
    }

    pub fn super_class(&self) -> Option<&Utf8Entry> {
        self.ancestors.first()
    }

    /// Descriptors declared under `name`
    pub fn overloads(&self, name: &Utf8Entry) -> &[Utf8Entry] {
        self.methods.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn declares(&self, name: &Utf8Entry, descriptor: &Utf8Entry) -> bool {
        self.overloads(name).contains(descriptor)
    }

    pub fn method_count(&self) -> usize {
        self.methods.values().map(Vec::len).sum()
    }
}

/// Answers shape queries for classes named in the origin namespace
pub trait ClassInfoOracle {
    fn lookup(&self, class_name: &Utf8Entry) -> Result<Arc<ClassShapeSummary>>;
}

impl<F> ClassInfoOracle for F
where
    F: Fn(&Utf8Entry) -> Result<Arc<ClassShapeSummary>>,
{
    fn lookup(&self, class_name: &Utf8Entry) -> Result<Arc<ClassShapeSummary>> {
        self(class_name)
    }
}

/// The class a self method is resolved against
#[derive(Debug, Clone)]
pub struct ClassContext<'c> {
    pub this_class: &'c Utf8Entry,
    pub super_class: &'c Utf8Entry,
    pub interfaces: &'c [Utf8Entry],
}

pub struct HierarchyResolver<'a> {
    names: &'a dyn RenameTable,
    oracle: &'a dyn ClassInfoOracle,
    config: &'a RemapConfig,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(names: &'a dyn RenameTable, oracle: &'a dyn ClassInfoOracle, config: &'a RemapConfig) -> Self {
        Self { names, oracle, config }
    }

    /// Target name of a method declared by `class`
    pub fn resolve_self_method(&self, class: &ClassContext<'_>, name: &Utf8Entry, descriptor: &Utf8Entry) -> Result<Utf8Entry> {
        if name.first() == Some(SPECIAL_METHOD_MARKER) {
            return Ok(name.clone());
        }
        if let Some(renamed) = self.names.remap_method_or_absent(class.this_class, name, descriptor) {
            return Ok(renamed);
        }

        let super_shape = self.shape_of(class.super_class)?;
        if super_shape.declares(name, descriptor) {
            log::debug!("{}.{}{} declared by superclass {}", class.this_class, name, descriptor, class.super_class);
            return Ok(self.names.remap_method(class.super_class, name, descriptor));
        }

        let mut queue: VecDeque<Utf8Entry> = super_shape.ancestors().iter().cloned().collect();
        queue.extend(class.interfaces.iter().cloned());
        let mut visited: HashSet<Utf8Entry> = HashSet::new();
        visited.insert(class.super_class.clone());

        while let Some(candidate) = queue.pop_front() {
            if self.config.is_platform_class(&candidate) || !visited.insert(candidate.clone()) {
                continue;
            }
            let shape = self.request(&candidate)?;
            if shape.declares(name, descriptor) {
                log::debug!("{}.{}{} declared by ancestor {}", class.this_class, name, descriptor, candidate);
                return Ok(self.names.remap_method(&candidate, name, descriptor));
            }
            queue.extend(shape.ancestors().iter().cloned());
        }

        log::trace!("{}.{}{} has no declaring ancestor", class.this_class, name, descriptor);
        Ok(name.clone())
    }

    /// Platform classes are treated as declaring nothing and never requested
    fn shape_of(&self, class_name: &Utf8Entry) -> Result<Arc<ClassShapeSummary>> {
        if self.config.is_platform_class(class_name) {
            return Ok(Arc::new(ClassShapeSummary::empty()));
        }
        self.request(class_name)
    }

    fn request(&self, class_name: &Utf8Entry) -> Result<Arc<ClassShapeSummary>> {
        log::debug!("requesting class info for {}", class_name);
        self.oracle.lookup(class_name).map_err(|err| match err {
            Error::Oracle { .. } => err,
            other => Error::oracle(class_name.to_string(), other),
        })
    }
}
