//! The framable-entity interface and the child node type

use super::header::{self, HEADER_LEN};
use super::{Group, MultiRecordList, Record, Tag, Value};
use crate::error::{Error, Result};
use std::fmt;

/// Anything that can be framed as a chunk: an identity tag plus an encoding
pub trait Chunk {
    /// Identity tag (a group's type tag, not its marker)
    fn tag(&self) -> Tag;

    /// Content bytes that follow the header, without padding
    fn encode_content(&self) -> Result<Vec<u8>>;

    /// Tag written into the header
    fn header_tag(&self) -> Tag {
        self.tag()
    }

    /// Full frame: header, content and pad byte
    fn encode(&self) -> Result<Vec<u8>> {
        header::frame(self.header_tag(), &self.encode_content()?)
    }

    /// Length of the full frame
    fn frame_len(&self) -> Result<usize> {
        Ok(header::frame_len(self.encode_content()?.len()))
    }
}

/// A child of a group
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Record(Record),
    Group(Group),
    Records(MultiRecordList),
}

impl Node {
    /// Short name of the node kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Record(_) => "record",
            Node::Group(_) => "group",
            Node::Records(_) => "record list",
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Node::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Node::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Node::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&MultiRecordList> {
        match self {
            Node::Records(r) => Some(r),
            _ => None,
        }
    }

    /// Field of a record node
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_record().and_then(|r| r.get(name))
    }

    /// Fail unless this node can be framed inside a group
    ///
    /// A leaf tagged `RIFF` or `LIST` would be read back as a group.
    pub(crate) fn ensure_framable(&self) -> Result<()> {
        match self {
            Node::Group(group) if group.header_tag() != Tag::LIST => Err(Error::capability(
                format!("group `{}` is framed as `{}`, expected LIST", group.tag(), group.header_tag()),
            )),
            Node::Record(_) | Node::Records(_) if self.tag().is_group_marker() => {
                Err(Error::capability(format!(
                    "{} tagged `{}` collides with a group marker",
                    self.kind_name(),
                    self.tag()
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Chunk for Node {
    fn tag(&self) -> Tag {
        match self {
            Node::Record(r) => r.tag(),
            Node::Group(g) => g.tag(),
            Node::Records(r) => r.tag(),
        }
    }

    fn encode_content(&self) -> Result<Vec<u8>> {
        match self {
            Node::Record(r) => r.encode_content(),
            Node::Group(g) => g.encode_content(),
            Node::Records(r) => r.encode_content(),
        }
    }

    fn header_tag(&self) -> Tag {
        match self {
            Node::Record(r) => r.header_tag(),
            Node::Group(g) => g.header_tag(),
            Node::Records(r) => r.header_tag(),
        }
    }
}

impl From<Record> for Node {
    fn from(record: Record) -> Self {
        Node::Record(record)
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

impl From<MultiRecordList> for Node {
    fn from(records: MultiRecordList) -> Self {
        Node::Records(records)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Record(r) => fmt::Display::fmt(r, f),
            Node::Group(g) => fmt::Display::fmt(g, f),
            Node::Records(r) => fmt::Display::fmt(r, f),
        }
    }
}

/// Length of a header plus the group type tag
pub(crate) const GROUP_PREAMBLE_LEN: usize = HEADER_LEN + header::TYPE_TAG_LEN;
