//! Raw identifier storage
//!
//! Identifiers are kept as the modified UTF-8 bytes found in the class file.
//! Nothing on the remap path decodes them; equality and hashing work on bytes.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::classfile::Utf8Index;
use crate::error::{Error, Result};

/// Immutable modified UTF-8 byte string with a content hash fixed at construction
#[derive(Clone)]
pub struct Utf8Entry {
    bytes: Arc<[u8]>,
    hash: u32,
}

impl Utf8Entry {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let hash = content_hash(&bytes);
        Self { bytes, hash }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes.starts_with(prefix)
    }

    pub fn first(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    pub fn find(&self, byte: u8) -> Option<usize> {
        self.bytes.iter().position(|b| *b == byte)
    }

    pub fn rfind(&self, byte: u8) -> Option<usize> {
        self.bytes.iter().rposition(|b| *b == byte)
    }

    /// Decode for display. Standard UTF-8 is borrowed as is; the modified
    /// encodings of NUL and supplementary characters are decoded by hand.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        match std::str::from_utf8(&self.bytes) {
            Ok(text) => Cow::Borrowed(text),
            Err(_) => Cow::Owned(decode_modified(&self.bytes)),
        }
    }
}

impl PartialEq for Utf8Entry {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.bytes == other.bytes
    }
}

impl Eq for Utf8Entry {}

impl Hash for Utf8Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
    }
}

impl PartialOrd for Utf8Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Utf8Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl fmt::Debug for Utf8Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl fmt::Display for Utf8Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl From<&str> for Utf8Entry {
    fn from(value: &str) -> Self {
        Self::new(encode_modified(value))
    }
}

impl From<String> for Utf8Entry {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&String> for Utf8Entry {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Vec<u8>> for Utf8Entry {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<&[u8]> for Utf8Entry {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

impl From<&Utf8Entry> for Utf8Entry {
    fn from(value: &Utf8Entry) -> Self {
        value.clone()
    }
}

fn content_hash(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(1u32, |hash, byte| hash.wrapping_mul(31).wrapping_add(*byte as u32))
}

/// Encode text the way class files store it (JVMS 4.4.7)
pub fn encode_modified(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c as u32 {
            0 => out.extend_from_slice(&[0xC0, 0x80]),
            0x1..=0xFFFF => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units).iter() {
                    out.push(0xE0 | (unit >> 12) as u8);
                    out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                    out.push(0x80 | (unit & 0x3F) as u8);
                }
            }
        }
    }
    out
}

fn decode_modified(bytes: &[u8]) -> String {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let (unit, width) = if b & 0x80 == 0 {
            (b as u16, 1)
        } else if b & 0xE0 == 0xC0 && i + 1 < bytes.len() {
            ((((b & 0x1F) as u16) << 6) | (bytes[i + 1] & 0x3F) as u16, 2)
        } else if b & 0xF0 == 0xE0 && i + 2 < bytes.len() {
            (
                (((b & 0x0F) as u16) << 12) | (((bytes[i + 1] & 0x3F) as u16) << 6) | (bytes[i + 2] & 0x3F) as u16,
                3,
            )
        } else {
            (char::REPLACEMENT_CHARACTER as u16, 1)
        };
        units.push(unit);
        i += width;
    }
    String::from_utf16_lossy(&units)
}

/// UTF-8 pool entries by index, filled by the first pass
#[derive(Debug, Clone)]
pub struct Utf8Table {
    entries: Vec<Option<Utf8Entry>>,
}

impl Utf8Table {
    /// Table for a pool whose `constant_pool_count` is `count`
    pub fn new(count: u16) -> Self {
        Self {
            entries: vec![None; count as usize],
        }
    }

    pub fn insert(&mut self, index: Utf8Index, entry: Utf8Entry) -> Result<()> {
        let count = self.entries.len() as u16;
        let slot = self
            .entries
            .get_mut(index.as_usize())
            .ok_or(Error::IndexOutOfRange {
                index: index.as_u16(),
                count,
            })?;
        *slot = Some(entry);
        Ok(())
    }

    pub fn get(&self, index: Utf8Index) -> Result<&Utf8Entry> {
        match self.entries.get(index.as_usize()) {
            None => Err(Error::IndexOutOfRange {
                index: index.as_u16(),
                count: self.entries.len() as u16,
            }),
            Some(None) if index.is_absent() => Err(Error::UnusableIndex { index: 0 }),
            Some(None) => Err(Error::WrongEntry {
                index: index.as_u16(),
                expected: "Utf8",
            }),
            Some(Some(entry)) => Ok(entry),
        }
    }
}
