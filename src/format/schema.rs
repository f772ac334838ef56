//! Schema-driven dispatch from chunk tags to concrete chunk types
//!
//! A [`Schema`] describes one container type: its own type tag, which child
//! tags map to which record shapes or nested group schemas, optional slot
//! names for name-based access, and an optional fallback kind used for tags
//! the schema does not list.
//!
//! Fallback types are synthesized lazily, once per tag, and cached for the
//! lifetime of the schema.

use super::group::Group;
use super::multi::MultiRecordList;
use super::record::{Record, RecordShape};
use super::{DecodeOptions, Node, Tag};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// What a tag decodes into
#[derive(Debug, Clone)]
pub enum ChunkKind {
    /// Leaf record with the given shape
    Record(Arc<RecordShape>),
    /// Nested `LIST` group described by the given schema
    Group(Arc<Schema>),
    /// Flat run of fixed-size records without per-record framing
    Records(Arc<RecordShape>),
}

impl ChunkKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChunkKind::Record(_) => "record",
            ChunkKind::Group(_) => "group",
            ChunkKind::Records(_) => "record list",
        }
    }

    /// True when `node` is the kind of node this decodes into
    pub fn matches(&self, node: &Node) -> bool {
        matches!(
            (self, node),
            (ChunkKind::Record(_), Node::Record(_))
                | (ChunkKind::Group(_), Node::Group(_))
                | (ChunkKind::Records(_), Node::Records(_))
        )
    }
}

/// A resolved dispatch target: the tag the decoded chunk reports, and its kind
#[derive(Debug)]
pub struct ChunkType {
    tag: Tag,
    kind: ChunkKind,
    synthesized: bool,
}

impl ChunkType {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn kind(&self) -> &ChunkKind {
        &self.kind
    }

    /// True when this type was built from the fallback kind
    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ChunkKind::Group(_))
    }

    /// Decode one chunk from its bounded slice
    ///
    /// Groups receive the slice starting at their `LIST` header; every other
    /// kind receives its content only.
    pub(crate) fn decode(&self, data: &[u8], options: &DecodeOptions) -> Result<Node> {
        let node = match &self.kind {
            ChunkKind::Record(shape) => Node::Record(Record::decode(self.tag, shape.clone(), data)?),
            ChunkKind::Records(shape) => {
                Node::Records(MultiRecordList::decode(self.tag, shape.clone(), data)?)
            }
            ChunkKind::Group(schema) => Node::Group(Group::decode_framed(
                Tag::LIST,
                self.tag,
                schema.clone(),
                data,
                options,
            )?),
        };
        Ok(node)
    }
}

/// Per-container dispatch table
#[derive(Debug)]
pub struct Schema {
    type_tag: Tag,
    entries: HashMap<Tag, Arc<ChunkType>>,
    slots: Vec<(String, Tag)>,
    fallback: Option<ChunkKind>,
    synthesized: Mutex<HashMap<Tag, Arc<ChunkType>>>,
}

impl Schema {
    /// Start describing a container whose type tag is `type_tag`
    pub fn builder<T: Into<Tag>>(type_tag: T) -> SchemaBuilder {
        SchemaBuilder {
            type_tag: type_tag.into(),
            entries: Vec::new(),
            slots: Vec::new(),
            fallback: None,
        }
    }

    /// Type tag of the container this schema describes
    pub fn type_tag(&self) -> Tag {
        self.type_tag
    }

    /// Resolve a child tag to its chunk type
    ///
    /// Exact entries win. Unlisted tags use the fallback kind when one is
    /// configured, otherwise fail with [`Error::Schema`].
    pub fn resolve(&self, tag: Tag) -> Result<Arc<ChunkType>> {
        if let Some(chunk_type) = self.entries.get(&tag) {
            return Ok(chunk_type.clone());
        }

        let base = self.fallback.as_ref().ok_or_else(|| {
            Error::schema(format!("unmapped tag `{}` in `{}`", tag, self.type_tag))
        })?;

        let mut cache = self.synthesized.lock();
        let chunk_type = cache.entry(tag).or_insert_with(|| {
            debug!(
                tag = %tag,
                container = %self.type_tag,
                kind = base.name(),
                "synthesized fallback chunk type"
            );
            Arc::new(ChunkType {
                tag,
                kind: base.clone(),
                synthesized: true,
            })
        });

        Ok(chunk_type.clone())
    }

    /// Explicitly registered kind for `tag`
    pub fn kind(&self, tag: Tag) -> Option<&ChunkKind> {
        self.entries.get(&tag).map(|t| &t.kind)
    }

    /// Record shape `tag` decodes with, including the fallback
    pub fn record_shape<T: Into<Tag>>(&self, tag: T) -> Option<Arc<RecordShape>> {
        match self.resolve(tag.into()).ok()?.kind() {
            ChunkKind::Record(shape) | ChunkKind::Records(shape) => Some(shape.clone()),
            ChunkKind::Group(_) => None,
        }
    }

    /// Nested group schema registered for `tag`
    pub fn group_schema<T: Into<Tag>>(&self, tag: T) -> Option<Arc<Schema>> {
        match self.resolve(tag.into()).ok()?.kind() {
            ChunkKind::Group(schema) => Some(schema.clone()),
            _ => None,
        }
    }

    pub fn fallback(&self) -> Option<&ChunkKind> {
        self.fallback.as_ref()
    }

    /// Tag bound to a slot name
    pub fn slot_tag(&self, name: &str) -> Option<Tag> {
        self.slots
            .iter()
            .find(|(slot, _)| slot == name)
            .map(|(_, tag)| *tag)
    }

    /// Declared slots in declaration order
    pub fn slots(&self) -> impl Iterator<Item = (&str, Tag)> {
        self.slots.iter().map(|(name, tag)| (name.as_str(), *tag))
    }
}

/// Builder for [`Schema`]
#[derive(Debug)]
pub struct SchemaBuilder {
    type_tag: Tag,
    entries: Vec<(Tag, ChunkKind)>,
    slots: Vec<(String, Tag)>,
    fallback: Option<ChunkKind>,
}

impl SchemaBuilder {
    /// Map `tag` to a leaf record
    pub fn record<T, S>(mut self, tag: T, shape: S) -> Self
    where
        T: Into<Tag>,
        S: Into<Arc<RecordShape>>,
    {
        self.entries
            .push((tag.into(), ChunkKind::Record(shape.into())));
        self
    }

    /// Map a nested group; its tag is the nested schema's type tag
    pub fn group(mut self, schema: Arc<Schema>) -> Self {
        self.entries
            .push((schema.type_tag(), ChunkKind::Group(schema)));
        self
    }

    /// Map `tag` to a flat run of fixed-size records
    pub fn records<T, S>(mut self, tag: T, shape: S) -> Self
    where
        T: Into<Tag>,
        S: Into<Arc<RecordShape>>,
    {
        self.entries
            .push((tag.into(), ChunkKind::Records(shape.into())));
        self
    }

    /// Bind a slot name to a child tag expected at most once
    pub fn slot<S, T>(mut self, name: S, tag: T) -> Self
    where
        S: Into<String>,
        T: Into<Tag>,
    {
        self.slots.push((name.into(), tag.into()));
        self
    }

    /// Kind used for tags without an entry
    pub fn fallback(mut self, kind: ChunkKind) -> Self {
        self.fallback = Some(kind);
        self
    }

    /// Shorthand for a record fallback
    pub fn fallback_record<S: Into<Arc<RecordShape>>>(self, shape: S) -> Self {
        self.fallback(ChunkKind::Record(shape.into()))
    }

    pub fn build(self) -> Result<Arc<Schema>> {
        let container = self.type_tag;
        let mut entries = HashMap::with_capacity(self.entries.len());

        for (tag, kind) in self.entries {
            check_kind(container, tag, &kind)?;
            let chunk_type = Arc::new(ChunkType {
                tag,
                kind,
                synthesized: false,
            });
            if entries.insert(tag, chunk_type).is_some() {
                return Err(Error::schema(format!(
                    "tag `{}` mapped twice in `{}`",
                    tag, container
                )));
            }
        }

        if let Some(ChunkKind::Records(shape)) = &self.fallback {
            check_fixed(container, shape)?;
        }

        for (i, (name, tag)) in self.slots.iter().enumerate() {
            if self.slots[..i].iter().any(|(n, _)| n == name) {
                return Err(Error::schema(format!(
                    "slot `{}` declared twice in `{}`",
                    name, container
                )));
            }
            if self.slots[..i].iter().any(|(_, t)| t == tag) {
                return Err(Error::schema(format!(
                    "tag `{}` bound to more than one slot in `{}`",
                    tag, container
                )));
            }
            if !entries.contains_key(tag) && self.fallback.is_none() {
                return Err(Error::schema(format!(
                    "slot `{}` refers to unmapped tag `{}` in `{}`",
                    name, tag, container
                )));
            }
        }

        Ok(Arc::new(Schema {
            type_tag: container,
            entries,
            slots: self.slots,
            fallback: self.fallback,
            synthesized: Mutex::new(HashMap::new()),
        }))
    }
}

fn check_kind(container: Tag, tag: Tag, kind: &ChunkKind) -> Result<()> {
    match kind {
        ChunkKind::Record(_) | ChunkKind::Records(_) if tag.is_group_marker() => {
            Err(Error::schema(format!(
                "{} tag `{}` in `{}` is reserved for groups",
                kind.name(),
                tag,
                container
            )))
        }
        ChunkKind::Records(shape) => check_fixed(container, shape),
        _ => Ok(()),
    }
}

fn check_fixed(container: Tag, shape: &RecordShape) -> Result<()> {
    match shape.fixed_size() {
        Some(size) if size > 0 => Ok(()),
        _ => Err(Error::schema(format!(
            "record list shape `{}` in `{}` needs a fixed, non-zero size",
            shape.name(),
            container
        ))),
    }
}
