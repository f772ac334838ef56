//! Four-character chunk tags

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A 4-byte chunk identifier (FourCC)
///
/// Tags are ASCII by convention but any 4 bytes are accepted on decode.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag([u8; 4]);

impl Tag {
    /// Marker of the top-level form
    pub const RIFF: Tag = Tag(*b"RIFF");
    /// Marker of a nested group
    pub const LIST: Tag = Tag(*b"LIST");

    /// Create a tag from raw bytes
    pub const fn new(bytes: [u8; 4]) -> Self {
        Tag(bytes)
    }

    /// Read a tag from the first four bytes of `bytes`
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; 4] = bytes
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                Error::decode(format!("tag needs 4 bytes, have {}", bytes.len()))
            })?;
        Ok(Tag(raw))
    }

    /// Raw tag bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// True for `RIFF` and `LIST`
    pub fn is_group_marker(&self) -> bool {
        *self == Tag::RIFF || *self == Tag::LIST
    }
}

impl From<[u8; 4]> for Tag {
    fn from(bytes: [u8; 4]) -> Self {
        Tag(bytes)
    }
}

impl From<&[u8; 4]> for Tag {
    fn from(bytes: &[u8; 4]) -> Self {
        Tag(*bytes)
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 || !s.is_ascii() {
            return Err(Error::invalid_input(format!(
                "tag must be 4 ASCII characters: {:?}",
                s
            )));
        }
        Tag::from_slice(bytes)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(\"{}\")", self)
    }
}
