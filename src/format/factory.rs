//! The chunk factory: the read loop over a bounded byte range

use super::chunk::GROUP_PREAMBLE_LEN;
use super::header::{pad_len, ChunkHeader, HEADER_LEN};
use super::{DecodeOptions, Node, Schema, Tag};
use crate::error::{Error, Result};
use tracing::trace;

/// Reads consecutive chunks out of one container's bounded content
///
/// Every child is handed exactly the bytes its header declares, so children
/// never look past their parent's boundary.
pub struct ChunkFactory<'a> {
    schema: &'a Schema,
    options: &'a DecodeOptions,
}

impl<'a> ChunkFactory<'a> {
    pub fn new(schema: &'a Schema, options: &'a DecodeOptions) -> Self {
        ChunkFactory { schema, options }
    }

    /// Decode every chunk in `data` until it is exhausted
    pub fn read_all(&self, data: &[u8]) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            let remaining = data.len() - pos;
            if remaining < HEADER_LEN {
                return Err(Error::decode(format!(
                    "truncated header at offset {} in `{}`: {} bytes left",
                    pos,
                    self.schema.type_tag(),
                    remaining
                )));
            }

            let header = ChunkHeader::from_bytes(&data[pos..])?;
            let content_start = pos + HEADER_LEN;
            let content_end = content_start.saturating_add(header.content_len());
            if content_end > data.len() {
                return Err(Error::decode(format!(
                    "chunk `{}` at offset {} declares {} bytes but only {} remain",
                    header.tag,
                    pos,
                    header.size,
                    data.len() - content_start
                )));
            }

            if header.tag == Tag::RIFF {
                return Err(Error::decode(format!(
                    "nested `RIFF` form at offset {} in `{}`; only LIST groups nest",
                    pos,
                    self.schema.type_tag()
                )));
            }

            let node = if header.tag.is_group_marker() {
                // The marker only says "group"; the type tag that follows picks the schema entry.
                if content_end - pos < GROUP_PREAMBLE_LEN {
                    return Err(Error::decode(format!(
                        "`{}` chunk at offset {} is too short for a type tag",
                        header.tag, pos
                    )));
                }
                let type_tag = Tag::from_slice(&data[content_start..])?;
                let chunk_type = self.schema.resolve(type_tag)?;
                if !chunk_type.is_group() {
                    return Err(Error::decode(format!(
                        "`{}` is framed as `{}` but `{}` maps it to a {}",
                        type_tag,
                        header.tag,
                        self.schema.type_tag(),
                        chunk_type.kind().name()
                    )));
                }
                trace!(marker = %header.tag, tag = %type_tag, offset = pos, size = header.size, "group");
                chunk_type.decode(&data[pos..content_end], self.options)?
            } else {
                let chunk_type = self.schema.resolve(header.tag)?;
                if chunk_type.is_group() {
                    return Err(Error::decode(format!(
                        "`{}` at offset {} maps to a group but has no LIST header",
                        header.tag, pos
                    )));
                }
                trace!(tag = %header.tag, offset = pos, size = header.size, "chunk");
                chunk_type.decode(&data[content_start..content_end], self.options)?
            };
            nodes.push(node);

            // A missing pad byte after the last chunk is tolerated.
            pos = (content_end + pad_len(header.content_len())).min(data.len());
        }

        Ok(nodes)
    }
}
