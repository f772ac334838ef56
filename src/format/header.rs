//! Chunk headers and framing

use super::Tag;
use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};

/// Length of a chunk header (4 byte tag + 4 byte size)
pub const HEADER_LEN: usize = 8;

/// Length of the type tag that opens every group's content
pub const TYPE_TAG_LEN: usize = 4;

/// Chunk header (4 byte tag + 4 byte little-endian size)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: Tag,
    pub size: u32,
}

impl ChunkHeader {
    /// Create a header
    pub fn new(tag: Tag, size: u32) -> Self {
        ChunkHeader { tag, size }
    }

    /// Read a chunk header from the start of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::decode(format!(
                "truncated header: need {} bytes, have {}",
                HEADER_LEN,
                bytes.len()
            )));
        }

        let tag = Tag::from_slice(&bytes[0..4])?;
        let size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        Ok(ChunkHeader { tag, size })
    }

    /// Convert chunk header to bytes
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[0..4].copy_from_slice(self.tag.as_bytes());
        bytes[4..8].copy_from_slice(&self.size.to_le_bytes());
        bytes
    }

    /// Declared content length as `usize`
    pub fn content_len(&self) -> usize {
        self.size as usize
    }
}

/// Number of pad bytes that follow `content_len` bytes of content
pub fn pad_len(content_len: usize) -> usize {
    content_len % 2
}

/// Full on-disk length of a chunk with `content_len` bytes of content
pub fn frame_len(content_len: usize) -> usize {
    HEADER_LEN + content_len + pad_len(content_len)
}

/// Frame `content` under `tag`: header, content, and a zero pad byte when odd
pub fn frame(tag: Tag, content: &[u8]) -> Result<Vec<u8>> {
    let size = u32::try_from(content.len()).map_err(|_| {
        Error::invalid_input(format!(
            "chunk `{}` content of {} bytes exceeds u32 size field",
            tag,
            content.len()
        ))
    })?;

    let mut out = BytesMut::with_capacity(frame_len(content.len()));
    out.put_slice(&ChunkHeader::new(tag, size).to_bytes());
    out.put_slice(content);
    if pad_len(content.len()) == 1 {
        out.put_u8(0);
    }

    Ok(out.to_vec())
}
