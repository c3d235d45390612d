mod common;

use std::sync::Arc;

use classremap::classfile::writer::{access, Constant};
use classremap::classfile::ClassFileWriter;
use classremap::{
    AttributeMode, ClassRemapper, ClassShapeSummary, EmptyOracle, Error, MappingSet, RemapConfig, Result, Utf8Entry,
};
use common::*;

/// Magic, version 52.0 and a pool count
fn header(count: u16) -> Vec<u8> {
    let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
    bytes.extend_from_slice(&count.to_be_bytes());
    bytes
}

fn remap(bytes: &[u8]) -> Result<Vec<u8>> {
    let names = MappingSet::new();
    ClassRemapper::new(&names, &EmptyOracle).remap(bytes).map(|class| class.bytes)
}

fn sample_class() -> Vec<u8> {
    let mut writer = ClassFileWriter::new("a/Sample", Some("a/Base"));
    writer.add_interface("a/Api");
    writer.pool.add_long(42);
    writer.pool.add_string("hello");
    writer.add_field(access::ACC_PRIVATE, "count", "I", vec![]);
    let code = writer.code_attribute(0, 1, &[0xB1], vec![]).unwrap();
    writer.add_method(access::ACC_PUBLIC, "run", "()V", vec![code]);
    writer.to_bytes().unwrap()
}

#[test]
fn test_bad_magic() {
    let mut bytes = sample_class();
    bytes[3] = 0xBF;
    match remap(&bytes) {
        Err(Error::BadMagic { found }) => assert_eq!(found, 0xCAFE_BABF),
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_unknown_tags() {
    init_logger();
    for tag in [0u8, 2, 13, 14, 21, 99] {
        let mut bytes = header(2);
        bytes.push(tag);
        match remap(&bytes) {
            Err(Error::UnknownTag { index, offset, tag: found }) => {
                assert_eq!(index, 1);
                assert_eq!(offset, 10);
                assert_eq!(found, tag);
            }
            other => panic!("tag {}: unexpected {:?}", tag, other.map(|_| ())),
        }
    }
}

#[test]
fn test_every_truncation_is_a_format_error() {
    let bytes = sample_class();
    assert!(remap(&bytes).is_ok());
    for len in 0..bytes.len() {
        let error = remap(&bytes[..len]).unwrap_err();
        assert!(error.is_format_error(), "prefix {}: {}", len, error);
    }
}

#[test]
fn test_truncation_in_passthrough_mode() {
    let bytes = sample_class();
    let names = MappingSet::new();
    let remapper = ClassRemapper::new(&names, &EmptyOracle)
        .with_config(RemapConfig::default().with_attribute_mode(AttributeMode::Passthrough));
    let error = remapper.remap(&bytes[..bytes.len() - 3]).unwrap_err();
    assert!(matches!(error, Error::Truncated { .. }), "{}", error);
}

/// A class whose pool holds a field, a method and an interface method reference
fn handle_targets() -> (ClassFileWriter, [u16; 4]) {
    let mut writer = ClassFileWriter::new("a/Sample", Some("java/lang/Object"));
    let field = writer.pool.add_field_ref("a/Sample", "count", "I");
    let method = writer.pool.add_method_ref("a/Sample", "run", "()V");
    let interface_method = writer.pool.add_interface_method_ref("a/Api", "call", "()V");
    let name = writer.pool.add_utf8("count");
    (writer, [field, method, interface_method, name])
}

#[test]
fn test_method_handle_targets() {
    let (mut writer, [field, method, interface_method, _]) = handle_targets();
    for kind in 1..=4 {
        writer.pool.add_method_handle(kind, field);
    }
    for kind in 5..=9 {
        writer.pool.add_method_handle(kind, method);
    }
    writer.pool.add_method_handle(9, interface_method);
    let valid = writer.to_bytes().unwrap();
    assert_eq!(remap(&valid).unwrap(), valid);

    let (_, [field, method, interface_method, name]) = handle_targets();
    for (kind, target) in [(1, method), (4, interface_method), (5, field), (7, name), (0, method), (10, method)] {
        let (mut writer, _) = handle_targets();
        let handle = writer.pool.add_method_handle(kind, target);
        match remap(&writer.to_bytes().unwrap()) {
            Err(Error::InvalidHandle { index, kind: found, .. }) => {
                assert_eq!(index, handle);
                assert_eq!(found, kind);
            }
            other => panic!("kind {}: unexpected {:?}", kind, other.map(|_| ())),
        }
    }
}

#[test]
fn test_handle_may_point_forward() {
    let mut writer = ClassFileWriter::new("a/Sample", Some("java/lang/Object"));
    writer.pool.add_name_and_type("run", "()V");
    let next = writer.pool.count() as u16 + 1;
    writer.pool.add_method_handle(5, next);
    let method = writer.pool.add_method_ref("a/Sample", "run", "()V");
    assert_eq!(method, next);
    assert!(remap(&writer.to_bytes().unwrap()).is_ok());
}

#[test]
fn test_bad_indices() {
    let mut writer = ClassFileWriter::new("a/Sample", Some("java/lang/Object"));
    writer.pool.push(Constant::Class(900));
    let error = remap(&writer.to_bytes().unwrap()).unwrap_err();
    assert!(matches!(error, Error::IndexOutOfRange { index: 900, .. }), "{}", error);

    let mut writer = ClassFileWriter::new("a/Sample", Some("java/lang/Object"));
    writer.this_class = writer.pool.add_utf8("a/Sample");
    let error = remap(&writer.to_bytes().unwrap()).unwrap_err();
    assert!(matches!(error, Error::WrongEntry { expected: "Class", .. }), "{}", error);

    let mut writer = ClassFileWriter::new("a/Sample", Some("java/lang/Object"));
    let long = writer.pool.add_long(7);
    writer.this_class = long + 1;
    let error = remap(&writer.to_bytes().unwrap()).unwrap_err();
    assert!(matches!(error, Error::UnusableIndex { .. }), "{}", error);
    assert!(error.is_format_error());
}

#[test]
fn test_oracle_failures_are_wrapped() {
    let bytes = class_with_methods("a/A", Some("a/B"), &[], &[("run", "()V")]);
    let names = MappingSet::new();
    let failing = |class_name: &Utf8Entry| -> Result<Arc<ClassShapeSummary>> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not on the class path", class_name),
        )))
    };
    let error = ClassRemapper::new(&names, &failing).remap(&bytes).unwrap_err();
    match &error {
        Error::Oracle { class, source } => {
            assert_eq!(class, "a/B");
            assert!(matches!(**source, Error::Io(_)));
        }
        other => panic!("unexpected: {}", other),
    }
    assert!(!error.is_format_error());
}

#[test]
fn test_renamed_identifier_too_long() {
    let bytes = class_with_methods("a/A", Some("java/lang/Object"), &[], &[]);
    let mut names = MappingSet::new();
    names.put_class("a/A", "b/".to_string() + &"x".repeat(70_000));
    let error = ClassRemapper::new(&names, &EmptyOracle).remap(&bytes).unwrap_err();
    assert!(matches!(error, Error::Utf8TooLong { .. }), "{}", error);
    assert!(!error.is_format_error());
}
