//! Remapper configuration
//!
//! Settings are resolved the same way every time: explicit builder values win,
//! then environment variables, then the built-in defaults.
//!
//! - `CLASSREMAP_PLATFORM_PREFIXES`: comma-separated class-name prefixes that
//!   belong to the platform runtime (default `java/,javax/`)
//! - `CLASSREMAP_ATTRIBUTES`: `rewrite` (default) or `passthrough`

use std::env;

use crate::consts::{DEFAULT_PLATFORM_PREFIXES, ENV_ATTRIBUTE_MODE, ENV_PLATFORM_PREFIXES};
use crate::pool::Utf8Entry;

/// How the scan treats attribute bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeMode {
    /// Attribute bodies are skipped by length; only the pool, field and
    /// method headers drive classification.
    Passthrough,
    /// Attributes that point straight at UTF-8 entries (signatures, source
    /// file, inner class names, annotation descriptors, local variable
    /// tables) are classified so their identifiers are renamed too.
    #[default]
    Rewrite,
}

impl AttributeMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "passthrough" | "copy" => Some(Self::Passthrough),
            "rewrite" | "aware" => Some(Self::Rewrite),
            _ => None,
        }
    }
}

/// Per-invocation settings for [`crate::ClassRemapper`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapConfig {
    /// Internal-name prefixes of platform classes. The hierarchy resolver
    /// never asks the oracle about these and never expands their ancestry.
    pub platform_prefixes: Vec<String>,
    pub attributes: AttributeMode,
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            platform_prefixes: DEFAULT_PLATFORM_PREFIXES.iter().map(|p| p.to_string()).collect(),
            attributes: AttributeMode::default(),
        }
    }
}

impl RemapConfig {
    /// Build a configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(prefixes) = env::var(ENV_PLATFORM_PREFIXES) {
            let parsed = parse_prefix_list(&prefixes);
            if !parsed.is_empty() {
                log::debug!("platform prefixes from {}: {:?}", ENV_PLATFORM_PREFIXES, parsed);
                config.platform_prefixes = parsed;
            }
        }

        if let Ok(mode) = env::var(ENV_ATTRIBUTE_MODE) {
            match AttributeMode::parse(&mode) {
                Some(parsed) => config.attributes = parsed,
                None => log::warn!("ignoring unknown {} value '{}'", ENV_ATTRIBUTE_MODE, mode),
            }
        }

        config
    }

    pub fn with_platform_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platform_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attribute_mode(mut self, mode: AttributeMode) -> Self {
        self.attributes = mode;
        self
    }

    /// Whether `class_name` belongs to the platform runtime
    pub fn is_platform_class(&self, class_name: &Utf8Entry) -> bool {
        self.platform_prefixes
            .iter()
            .any(|prefix| class_name.starts_with(prefix.as_bytes()))
    }
}

/// Split a comma-separated prefix list, dropping blanks
pub fn parse_prefix_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefixes_cover_java_and_javax() {
        let config = RemapConfig::default();
        assert!(config.is_platform_class(&Utf8Entry::from("java/lang/Object")));
        assert!(config.is_platform_class(&Utf8Entry::from("javax/swing/JFrame")));
        assert!(!config.is_platform_class(&Utf8Entry::from("net/example/Thing")));
        assert!(!config.is_platform_class(&Utf8Entry::from("javafoo/Bar")));
        assert_eq!(config.attributes, AttributeMode::Rewrite);
    }

    #[test]
    fn test_builder_overrides() {
        let config = RemapConfig::default()
            .with_platform_prefixes(["kotlin/"])
            .with_attribute_mode(AttributeMode::Passthrough);
        assert!(config.is_platform_class(&Utf8Entry::from("kotlin/Unit")));
        assert!(!config.is_platform_class(&Utf8Entry::from("java/lang/Object")));
        assert_eq!(config.attributes, AttributeMode::Passthrough);
    }

    #[test]
    fn test_parse_prefix_list() {
        assert_eq!(parse_prefix_list("java/, jdk/ ,,sun/"), vec!["java/", "jdk/", "sun/"]);
        assert!(parse_prefix_list(" , ").is_empty());
    }

    #[test]
    fn test_attribute_mode_parse() {
        assert_eq!(AttributeMode::parse("Passthrough"), Some(AttributeMode::Passthrough));
        assert_eq!(AttributeMode::parse(" rewrite "), Some(AttributeMode::Rewrite));
        assert_eq!(AttributeMode::parse("sometimes"), None);
    }
}
