//! Chunk-tree encoding and decoding
//!
//! This module provides the RIFF-family building blocks: tagged records,
//! `LIST` groups, flat record lists and the top-level `RIFF` form, together
//! with the per-container schemas that drive decoding.

pub mod chunk;
pub mod factory;
pub mod field;
pub mod form;
pub mod group;
pub mod header;
pub mod multi;
pub mod record;
pub mod schema;
pub mod tag;

pub use chunk::{Chunk, Node};
pub use factory::ChunkFactory;
pub use field::{FieldDef, FieldReader, FieldType, FieldWriter, Value};
pub use form::Form;
pub use group::{Children, Group};
pub use header::ChunkHeader;
pub use multi::MultiRecordList;
pub use record::{FieldCodec, Fields, Layout, Record, RecordShape};
pub use schema::{ChunkKind, ChunkType, Schema, SchemaBuilder};
pub use tag::Tag;

/// How a group's declared size is checked against the bytes it was given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizePolicy {
    /// Log a warning and decode the bytes that are present
    #[default]
    Lenient,
    /// Reject any mismatch
    Strict,
}

/// Decoding options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Group size checking
    pub size_policy: SizePolicy,
}

impl DecodeOptions {
    /// Options that reject size mismatches
    pub fn strict() -> Self {
        DecodeOptions {
            size_policy: SizePolicy::Strict,
        }
    }

    pub fn with_size_policy(mut self, size_policy: SizePolicy) -> Self {
        self.size_policy = size_policy;
        self
    }
}
