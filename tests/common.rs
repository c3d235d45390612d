// Common test utilities
#![allow(dead_code)]

use std::cell::RefCell;
use std::sync::Arc;

use classremap::classfile::writer::{access, AttributeWriter};
use classremap::classfile::ClassFileWriter;
use classremap::pool::{walk_pool, RawEntry};
use classremap::{ClassInfoOracle, ClassShapeSummary, Result, Utf8Entry};

pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
}

/// Every UTF-8 entry of the pool, in index order
pub fn utf8_strings(bytes: &[u8]) -> Vec<String> {
    let mut strings = Vec::new();
    walk_pool(bytes, |_, _, _, entry| {
        if let RawEntry::Utf8(content) = entry {
            strings.push(Utf8Entry::from(content).to_string());
        }
        Ok(())
    })
    .unwrap();
    strings
}

pub fn has_utf8(bytes: &[u8], text: &str) -> bool {
    utf8_strings(bytes).iter().any(|s| s == text)
}

/// `aload_0; invokespecial #method; return`
pub fn super_call_code(writer: &mut ClassFileWriter, method_ref: u16) -> AttributeWriter {
    let [hi, lo] = method_ref.to_be_bytes();
    writer
        .code_attribute(1, 1, &[0x2A, 0xB7, hi, lo, 0xB1], vec![])
        .unwrap()
}

/// A class declaring `methods` (name, descriptor) with empty bodies
pub fn class_with_methods(name: &str, super_class: Option<&str>, interfaces: &[&str], methods: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ClassFileWriter::new(name, super_class);
    for interface in interfaces {
        writer.add_interface(interface);
    }
    for (method, descriptor) in methods {
        writer.add_method(access::ACC_PUBLIC, method, descriptor, vec![]);
    }
    writer.to_bytes().unwrap()
}

/// Oracle answering from fixed shapes and remembering what it was asked
pub struct RecordingOracle {
    shapes: Vec<(Utf8Entry, Arc<ClassShapeSummary>)>,
    pub requests: RefCell<Vec<String>>,
}

impl RecordingOracle {
    pub fn new(shapes: Vec<(&str, ClassShapeSummary)>) -> Self {
        Self {
            shapes: shapes
                .into_iter()
                .map(|(name, shape)| (Utf8Entry::from(name), Arc::new(shape)))
                .collect(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ClassInfoOracle for RecordingOracle {
    fn lookup(&self, class_name: &Utf8Entry) -> Result<Arc<ClassShapeSummary>> {
        self.requests.borrow_mut().push(class_name.to_string());
        Ok(self
            .shapes
            .iter()
            .find(|(name, _)| name == class_name)
            .map(|(_, shape)| Arc::clone(shape))
            .unwrap_or_default())
    }
}

pub fn shape(ancestors: &[&str], methods: &[(&str, &str)]) -> ClassShapeSummary {
    let mut summary = ClassShapeSummary::new(ancestors.iter().map(|a| Utf8Entry::from(*a)).collect());
    for (name, descriptor) in methods {
        summary.add_method(Utf8Entry::from(*name), Utf8Entry::from(*descriptor));
    }
    summary
}
