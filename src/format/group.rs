//! Groups (`LIST` chunks) and their ordered child sequence

use super::chunk::GROUP_PREAMBLE_LEN;
use super::factory::ChunkFactory;
use super::header::{ChunkHeader, HEADER_LEN};
use super::schema::ChunkKind;
use super::{Chunk, DecodeOptions, Node, Schema, SizePolicy, Tag};
use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::ops::Index;
use std::sync::Arc;
use tracing::warn;

/// Ordered sequence of child nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Children(Vec<Node>);

impl Children {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.0.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.0
    }

    /// Index of the first child tagged `tag`
    pub fn position(&self, tag: Tag) -> Option<usize> {
        self.0.iter().position(|n| n.tag() == tag)
    }

    /// Number of children tagged `tag`
    pub fn count(&self, tag: Tag) -> usize {
        self.0.iter().filter(|n| n.tag() == tag).count()
    }

    fn push(&mut self, node: Node) {
        self.0.push(node);
    }

    fn insert(&mut self, index: usize, node: Node) {
        self.0.insert(index, node);
    }

    fn remove(&mut self, index: usize) -> Option<Node> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }
}

impl From<Vec<Node>> for Children {
    fn from(nodes: Vec<Node>) -> Self {
        Children(nodes)
    }
}

impl Index<usize> for Children {
    type Output = Node;

    fn index(&self, index: usize) -> &Node {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Children {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A framed container of child chunks
///
/// The header carries the group marker (`LIST`, or `RIFF` for a form); the
/// group's identity is the type tag that opens its content.
#[derive(Clone)]
pub struct Group {
    marker: Tag,
    type_tag: Tag,
    schema: Arc<Schema>,
    children: Children,
}

impl Group {
    /// Empty `LIST` group described by `schema`
    pub fn new(schema: Arc<Schema>) -> Self {
        Group::with_marker(Tag::LIST, schema)
    }

    /// `LIST` group built from explicit children
    pub fn with_children<I>(schema: Arc<Schema>, children: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let mut group = Group::new(schema);
        for child in children {
            group.append(child)?;
        }
        Ok(group)
    }

    /// Empty `LIST` group whose type tag differs from the schema's own
    ///
    /// Used for children a parent resolves through a group fallback.
    pub fn with_type_tag<T: Into<Tag>>(type_tag: T, schema: Arc<Schema>) -> Self {
        Group {
            marker: Tag::LIST,
            type_tag: type_tag.into(),
            schema,
            children: Children::new(),
        }
    }

    pub(crate) fn with_marker(marker: Tag, schema: Arc<Schema>) -> Self {
        Group {
            marker,
            type_tag: schema.type_tag(),
            schema,
            children: Children::new(),
        }
    }

    /// Decode a `LIST` group from its full frame
    pub fn decode(schema: Arc<Schema>, data: &[u8]) -> Result<Self> {
        Group::decode_with(schema, data, &DecodeOptions::default())
    }

    pub fn decode_with(schema: Arc<Schema>, data: &[u8], options: &DecodeOptions) -> Result<Self> {
        let type_tag = schema.type_tag();
        Group::decode_framed(Tag::LIST, type_tag, schema, data, options)
    }

    /// Decode a group whose frame starts at `data[0]`
    ///
    /// `data` is the bounded slice handed down by the parent; children are
    /// read from everything after the type tag.
    pub(crate) fn decode_framed(
        marker: Tag,
        type_tag: Tag,
        schema: Arc<Schema>,
        data: &[u8],
        options: &DecodeOptions,
    ) -> Result<Self> {
        let header = ChunkHeader::from_bytes(data)?;
        if header.tag != marker {
            return Err(Error::decode(format!(
                "tag mismatch: expected `{}` header, found `{}`",
                marker, header.tag
            )));
        }
        if data.len() < GROUP_PREAMBLE_LEN {
            return Err(Error::decode(format!(
                "truncated `{}` group: no type tag",
                marker
            )));
        }

        let found = Tag::from_slice(&data[HEADER_LEN..])?;
        if found != type_tag {
            return Err(Error::decode(format!(
                "tag mismatch: expected `{}` {}, found `{}`",
                type_tag, marker, found
            )));
        }

        let available = data.len() - HEADER_LEN;
        if header.content_len() != available {
            match options.size_policy {
                SizePolicy::Strict => {
                    return Err(Error::decode(format!(
                        "`{}` {} declares {} bytes but {} are present",
                        type_tag, marker, header.size, available
                    )));
                }
                SizePolicy::Lenient => {
                    warn!(
                        tag = %type_tag,
                        marker = %marker,
                        declared = header.size,
                        available,
                        "group size does not match its bytes; decoding what is present"
                    );
                }
            }
        }

        // Never read past the declared size; a short buffer decodes what is present.
        let end = HEADER_LEN + header.content_len().min(available);
        if end < GROUP_PREAMBLE_LEN {
            return Err(Error::decode(format!(
                "`{}` {} declares {} bytes, too few for its type tag",
                type_tag, marker, header.size
            )));
        }
        let nodes = ChunkFactory::new(&schema, options).read_all(&data[GROUP_PREAMBLE_LEN..end])?;

        Ok(Group {
            marker,
            type_tag,
            schema,
            children: Children::from(nodes),
        })
    }

    /// Header marker (`LIST` or `RIFF`)
    pub fn marker(&self) -> Tag {
        self.marker
    }

    /// Content type tag
    pub fn type_tag(&self) -> Tag {
        self.type_tag
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.children.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// Mutable child access
    ///
    /// A replaced child is checked against the schema when the group is encoded.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.children.get_mut(index)
    }

    /// Append a child after checking it against the schema
    pub fn append<N: Into<Node>>(&mut self, child: N) -> Result<()> {
        let node = child.into();
        self.admit(&node)?;
        self.children.push(node);
        Ok(())
    }

    /// Insert a child at `index` after checking it against the schema
    pub fn insert<N: Into<Node>>(&mut self, index: usize, child: N) -> Result<()> {
        if index > self.children.len() {
            return Err(Error::invalid_input(format!(
                "insert position {} beyond {} children",
                index,
                self.children.len()
            )));
        }
        let node = child.into();
        self.admit(&node)?;
        self.children.insert(index, node);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Node> {
        self.children.remove(index)
    }

    fn admit(&self, node: &Node) -> Result<()> {
        node.ensure_framable()?;

        let tag = node.tag();
        let chunk_type = self.schema.resolve(tag)?;
        let kind = chunk_type.kind();
        if !kind.matches(node) {
            return Err(Error::validation(
                tag.to_string(),
                kind.name(),
                node.kind_name(),
            ));
        }

        let shapes = match (kind, node) {
            (ChunkKind::Record(shape), Node::Record(record)) => Some((shape, record.shape())),
            (ChunkKind::Records(shape), Node::Records(list)) => Some((shape, list.shape())),
            _ => None,
        };
        if let Some((expected, actual)) = shapes {
            if !Arc::ptr_eq(expected, actual) && expected.fields() != actual.fields() {
                return Err(Error::validation(
                    tag.to_string(),
                    format!("shape `{}`", expected.name()),
                    format!("shape `{}`", actual.name()),
                ));
            }
        }

        Ok(())
    }

    /// Index of the child bound to slot `name`
    pub fn slot_index(&self, name: &str) -> Result<usize> {
        let tag = self.schema.slot_tag(name).ok_or_else(|| {
            Error::not_found(format!("slot `{}` in `{}`", name, self.type_tag))
        })?;

        let index = self.children.position(tag).ok_or_else(|| {
            Error::not_found(format!(
                "no `{}` child for slot `{}` in `{}`",
                tag, name, self.type_tag
            ))
        })?;

        let count = self.children.count(tag);
        if count > 1 {
            return Err(Error::schema(format!(
                "slot `{}` is ambiguous: `{}` occurs {} times in `{}`",
                name, tag, count, self.type_tag
            )));
        }

        Ok(index)
    }

    /// Child bound to slot `name`
    pub fn slot(&self, name: &str) -> Result<&Node> {
        let index = self.slot_index(name)?;
        Ok(&self.children[index])
    }

    pub fn slot_mut(&mut self, name: &str) -> Result<&mut Node> {
        let index = self.slot_index(name)?;
        self.children
            .get_mut(index)
            .ok_or_else(|| Error::not_found(format!("slot `{}`", name)))
    }

    /// The `size` field this group encodes with
    pub fn declared_size(&self) -> Result<u32> {
        let len = self.encode_content()?.len();
        u32::try_from(len)
            .map_err(|_| Error::invalid_input(format!("group `{}` exceeds u32 size", self.type_tag)))
    }
}

impl Chunk for Group {
    fn tag(&self) -> Tag {
        self.type_tag
    }

    fn header_tag(&self) -> Tag {
        self.marker
    }

    /// Children are re-checked here since `get_mut`/`slot_mut` can replace them
    fn encode_content(&self) -> Result<Vec<u8>> {
        let mut out = BytesMut::new();
        out.put_slice(self.type_tag.as_bytes());
        for child in &self.children {
            self.admit(child)?;
            out.put_slice(&child.encode()?);
        }
        Ok(out.to_vec())
    }
}

impl Index<usize> for Group {
    type Output = Node;

    fn index(&self, index: usize) -> &Node {
        &self.children[index]
    }
}

impl<'a> IntoIterator for &'a Group {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.marker == other.marker
            && self.type_tag == other.type_tag
            && Arc::ptr_eq(&self.schema, &other.schema)
            && self.children == other.children
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("marker", &self.marker)
            .field("type_tag", &self.type_tag)
            .field("children", &self.children)
            .finish()
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.marker)?;
        writeln!(f, "\t{}", self.type_tag)?;
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FieldDef, FieldType, MultiRecordList, Record, RecordShape, Value};

    fn herb_shape() -> Arc<RecordShape> {
        Arc::new(
            RecordShape::fixed(
                "herb",
                vec![
                    FieldDef::new("chervil", FieldType::U32),
                    FieldDef::new("sage", FieldType::U32),
                ],
            )
            .unwrap(),
        )
    }

    fn tlst_schema(herb: Arc<RecordShape>) -> Arc<Schema> {
        Schema::builder(b"tlst")
            .record(b"herb", herb)
            .slot("herb", b"herb")
            .build()
            .unwrap()
    }

    fn herb(shape: &Arc<RecordShape>, chervil: u32, sage: u32) -> Record {
        Record::new(b"herb", shape.clone(), vec![Value::U32(chervil), Value::U32(sage)]).unwrap()
    }

    #[test]
    fn test_encode_prefixes_marker_and_type() {
        let shape = herb_shape();
        let group = Group::with_children(tlst_schema(shape.clone()), [herb(&shape, 4, 42)]).unwrap();
        let bytes = group.encode().unwrap();

        assert_eq!(&bytes[0..4], b"LIST");
        assert_eq!(&bytes[4..8], &20u32.to_le_bytes());
        assert_eq!(&bytes[8..12], b"tlst");
        assert_eq!(&bytes[12..16], b"herb");
        assert_eq!(group.declared_size().unwrap(), 20);
        assert_eq!(group.frame_len().unwrap(), 28);
    }

    #[test]
    fn test_decode_type_tag_mismatch() {
        let shape = herb_shape();
        let mut bytes = b"LIST".to_vec();
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(b"nope");

        let err = Group::decode(tlst_schema(shape), &bytes).unwrap_err();
        assert!(err.to_string().contains("tag mismatch"));
    }

    #[test]
    fn test_decode_marker_mismatch() {
        let shape = herb_shape();
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(b"tlst");

        let err = Group::decode(tlst_schema(shape), &bytes).unwrap_err();
        assert!(err.to_string().contains("tag mismatch"));
    }

    #[test]
    fn test_append_unmapped_tag_fails() {
        let shape = herb_shape();
        let mut group = Group::new(tlst_schema(shape.clone()));
        let stray = Record::new(b"weed", shape, vec![Value::U32(0), Value::U32(0)]).unwrap();
        assert!(matches!(group.append(stray), Err(Error::Schema(_))));
        assert!(group.is_empty());
    }

    #[test]
    fn test_append_marker_tagged_record_fails() {
        let shape = herb_shape();
        let schema = Schema::builder(b"tlst")
            .fallback_record(shape.clone())
            .build()
            .unwrap();
        let mut group = Group::new(schema);
        let bogus = Record::new(b"LIST", shape, vec![Value::U32(0), Value::U32(0)]).unwrap();
        assert!(matches!(group.append(bogus), Err(Error::Capability(_))));
    }

    #[test]
    fn test_append_wrong_kind_fails() {
        let shape = herb_shape();
        let schema = Schema::builder(b"tlst")
            .records(b"herb", shape.clone())
            .build()
            .unwrap();
        let mut group = Group::new(schema);
        let err = group.append(herb(&shape, 1, 2)).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_append_wrong_shape_fails() {
        let shape = herb_shape();
        let other = Arc::new(
            RecordShape::fixed("weed", vec![FieldDef::new("x", FieldType::U8)]).unwrap(),
        );
        let mut group = Group::new(tlst_schema(shape));
        let stray = Record::new(b"herb", other, vec![Value::U8(1)]).unwrap();
        assert!(matches!(group.append(stray), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_slot_access() {
        let shape = herb_shape();
        let mut group = Group::new(tlst_schema(shape.clone()));
        assert!(matches!(group.slot("herb"), Err(Error::NotFound(_))));
        assert!(matches!(group.slot("spice"), Err(Error::NotFound(_))));

        group.append(herb(&shape, 4, 42)).unwrap();
        assert_eq!(group.slot("herb").unwrap(), &group[0]);

        group.append(herb(&shape, 5, 43)).unwrap();
        assert!(matches!(group.slot("herb"), Err(Error::Schema(_))));
    }

    #[test]
    fn test_trailing_bytes_beyond_declared_size() {
        let shape = herb_shape();
        let group = Group::with_children(tlst_schema(shape.clone()), [herb(&shape, 4, 42)]).unwrap();
        let mut bytes = group.encode().unwrap();
        bytes.extend_from_slice(b"junk");

        let decoded = Group::decode(tlst_schema(shape.clone()), &bytes).unwrap();
        assert_eq!(decoded.len(), 1);

        let strict = Group::decode_with(tlst_schema(shape), &bytes, &DecodeOptions::strict());
        assert!(matches!(strict, Err(Error::Decode(_))));
    }

    #[test]
    fn test_replaced_child_checked_on_encode() {
        let shape = herb_shape();
        let mut group = Group::with_children(tlst_schema(shape.clone()), [herb(&shape, 4, 42)]).unwrap();

        let marker = Record::new(b"LIST", shape.clone(), vec![Value::U32(1), Value::U32(2)]).unwrap();
        *group.get_mut(0).unwrap() = Node::Record(marker);
        assert!(matches!(group.encode(), Err(Error::Capability(_))));

        *group.get_mut(0).unwrap() = Node::Group(Group::new(tlst_schema(shape.clone())));
        assert!(matches!(group.encode(), Err(Error::Schema(_) | Error::Validation { .. })));

        *group.get_mut(0).unwrap() = Node::Record(herb(&shape, 5, 6));
        assert!(group.encode().is_ok());
    }

    #[test]
    fn test_insert_and_remove() {
        let shape = herb_shape();
        let mut group = Group::new(tlst_schema(shape.clone()));
        group.append(herb(&shape, 1, 1)).unwrap();
        group.insert(0, herb(&shape, 0, 0)).unwrap();
        assert!(group.insert(5, herb(&shape, 9, 9)).is_err());
        assert_eq!(group[0].field("chervil"), Some(&Value::U32(0)));

        let removed = group.remove(0).unwrap();
        assert_eq!(removed.field("chervil"), Some(&Value::U32(0)));
        assert!(group.remove(3).is_none());
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_records_child() {
        let shape = herb_shape();
        let schema = Schema::builder(b"tlst").records(b"hrbs", shape.clone()).build().unwrap();
        let mut list = MultiRecordList::new(b"hrbs", shape.clone());
        list.push_values(vec![Value::U32(1), Value::U32(2)]).unwrap();
        let group = Group::with_children(schema.clone(), [list]).unwrap();

        let decoded = Group::decode(schema, &group.encode().unwrap()).unwrap();
        assert_eq!(decoded, group);
    }

    #[test]
    fn test_display() {
        let shape = herb_shape();
        let group = Group::with_children(tlst_schema(shape.clone()), [herb(&shape, 4, 42)]).unwrap();
        assert_eq!(
            group.to_string(),
            "LIST\n\ttlst\nherb\n\tchervil=4\n\tsage=42\n"
        );
    }
}
