use thiserror::Error;

/// Result type for remapping operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the class file remapper
///
/// Every variant is fatal for the invocation that produced it. Missing
/// mappings and unresolvable inheritance are not errors: they leave the
/// original name in place.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected end of class file at offset {offset:#x}: needed {needed} more byte(s)")]
    Truncated { offset: usize, needed: usize },

    #[error("Not a class file: magic is {found:#010x}, expected 0xcafebabe")]
    BadMagic { found: u32 },

    #[error("Unknown constant pool tag {tag} for entry #{index} at offset {offset:#x}")]
    UnknownTag { index: u16, offset: usize, tag: u8 },

    #[error("Rewrite out of sync at entry #{index}: scan recorded {expected}, rewrite found {found}")]
    Desync {
        index: u16,
        expected: String,
        found: String,
    },

    #[error("Constant pool index #{index} is out of range (pool count {count})")]
    IndexOutOfRange { index: u16, count: u16 },

    #[error("Constant pool index #{index} does not address a usable entry")]
    UnusableIndex { index: u16 },

    #[error("Constant pool index #{index} is not a {expected} entry")]
    WrongEntry { index: u16, expected: &'static str },

    #[error("Method handle #{index} has reference kind {kind} but points at an entry with tag {target_tag}")]
    InvalidHandle { index: u16, kind: u8, target_tag: u8 },

    #[error("Renamed identifier is {len} bytes, exceeding the 65535-byte UTF-8 entry limit")]
    Utf8TooLong { len: usize },

    #[error("Malformed signature '{signature}' at byte {position}")]
    MalformedSignature { signature: String, position: usize },

    #[error("Malformed {attribute} attribute at offset {offset:#x}")]
    MalformedAttribute { attribute: &'static str, offset: usize },

    #[error("Class info lookup for '{class}' failed: {source}")]
    Oracle {
        class: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Class name '{name}' cannot be used as an output path")]
    InvalidOutputName { name: String },
}

impl Error {
    /// Create a truncation error at the given offset
    pub fn truncated(offset: usize, needed: usize) -> Self {
        Self::Truncated { offset, needed }
    }

    /// Create an unknown-tag error for a constant pool entry
    pub fn unknown_tag(index: u16, offset: usize, tag: u8) -> Self {
        Self::UnknownTag { index, offset, tag }
    }

    /// Create a desynchronization error between the scan and rewrite passes
    pub fn desync(index: u16, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::Desync {
            index,
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a malformed-signature error
    pub fn malformed_signature(signature: &[u8], position: usize) -> Self {
        Self::MalformedSignature {
            signature: String::from_utf8_lossy(signature).into_owned(),
            position,
        }
    }

    /// Wrap a failure raised while the oracle was answering for `class`
    pub fn oracle(class: impl Into<String>, source: Error) -> Self {
        Self::Oracle {
            class: class.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error describes a corrupt or unsupported class file
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. }
                | Self::BadMagic { .. }
                | Self::UnknownTag { .. }
                | Self::Desync { .. }
                | Self::IndexOutOfRange { .. }
                | Self::UnusableIndex { .. }
                | Self::WrongEntry { .. }
                | Self::InvalidHandle { .. }
                | Self::MalformedAttribute { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_message_names_offset_and_tag() {
        let err = Error::unknown_tag(7, 0x2a, 2);
        let msg = err.to_string();
        assert!(msg.contains("tag 2"), "unexpected: {}", msg);
        assert!(msg.contains("#7"), "unexpected: {}", msg);
        assert!(msg.contains("0x2a"), "unexpected: {}", msg);
        assert!(err.is_format_error());
    }

    #[test]
    fn test_oracle_error_keeps_source() {
        let inner = Error::truncated(10, 4);
        let err = Error::oracle("a/B", inner);
        assert!(err.to_string().contains("a/B"));
        assert!(!err.is_format_error());
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("0xa"));
    }
}
