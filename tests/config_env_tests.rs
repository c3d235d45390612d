//! Environment overrides for the remapper configuration
//!
//! Kept to a single test so no other test in this binary races on the
//! process environment.

use std::env;

use classremap::{AttributeMode, RemapConfig, Utf8Entry};

const PREFIXES: &str = "CLASSREMAP_PLATFORM_PREFIXES";
const ATTRIBUTES: &str = "CLASSREMAP_ATTRIBUTES";

#[test]
fn test_from_env() {
    let original_prefixes = env::var(PREFIXES).ok();
    let original_attributes = env::var(ATTRIBUTES).ok();

    env::remove_var(PREFIXES);
    env::remove_var(ATTRIBUTES);
    assert_eq!(RemapConfig::from_env(), RemapConfig::default());

    env::set_var(PREFIXES, "com/vendor/, kotlin/");
    env::set_var(ATTRIBUTES, "passthrough");
    let config = RemapConfig::from_env();
    assert_eq!(config.platform_prefixes, vec!["com/vendor/", "kotlin/"]);
    assert!(config.is_platform_class(&Utf8Entry::from("kotlin/Unit")));
    assert!(!config.is_platform_class(&Utf8Entry::from("java/lang/Object")));
    assert_eq!(config.attributes, AttributeMode::Passthrough);

    // blank or unknown values fall back to the defaults
    env::set_var(PREFIXES, " , ");
    env::set_var(ATTRIBUTES, "sometimes");
    assert_eq!(RemapConfig::from_env(), RemapConfig::default());

    match original_prefixes {
        Some(value) => env::set_var(PREFIXES, value),
        None => env::remove_var(PREFIXES),
    }
    match original_attributes {
        Some(value) => env::set_var(ATTRIBUTES, value),
        None => env::remove_var(ATTRIBUTES),
    }
}
