//! The top-level `RIFF` form and its byte source and sink

use super::{Chunk, DecodeOptions, Group, Node, Schema, Tag};
use crate::error::Result;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A whole RIFF file: a group framed with the `RIFF` marker
///
/// Derefs to [`Group`] for child access and mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    group: Group,
}

impl Form {
    /// Empty form whose type tag is the schema's
    pub fn new(schema: Arc<Schema>) -> Self {
        Form {
            group: Group::with_marker(Tag::RIFF, schema),
        }
    }

    pub fn with_children<I>(schema: Arc<Schema>, children: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let mut form = Form::new(schema);
        for child in children {
            form.group.append(child)?;
        }
        Ok(form)
    }

    /// Decode a complete RIFF image
    pub fn from_bytes(schema: Arc<Schema>, data: &[u8]) -> Result<Self> {
        Form::from_bytes_with(schema, data, &DecodeOptions::default())
    }

    pub fn from_bytes_with(
        schema: Arc<Schema>,
        data: &[u8],
        options: &DecodeOptions,
    ) -> Result<Self> {
        let type_tag = schema.type_tag();
        let group = Group::decode_framed(Tag::RIFF, type_tag, schema, data, options)?;
        debug!(
            tag = %type_tag,
            bytes = data.len(),
            children = group.len(),
            "decoded form"
        );
        Ok(Form { group })
    }

    /// Read `reader` to the end and decode it
    pub fn read_from<R: Read>(schema: Arc<Schema>, reader: R) -> Result<Self> {
        Form::read_from_with(schema, reader, &DecodeOptions::default())
    }

    pub fn read_from_with<R: Read>(
        schema: Arc<Schema>,
        mut reader: R,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Form::from_bytes_with(schema, &data, options)
    }

    /// Decode the file at `path`
    pub fn open<P: AsRef<Path>>(schema: Arc<Schema>, path: P) -> Result<Self> {
        Form::open_with(schema, path, &DecodeOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(
        schema: Arc<Schema>,
        path: P,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening form");
        let file = File::open(path)?;
        Form::read_from_with(schema, BufReader::new(file), options)
    }

    /// Encode the whole form
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.group.encode()
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Encode and write to `path`, replacing any existing file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))?;
        debug!(path = %path.display(), tag = %self.group.type_tag(), "saved form");
        Ok(())
    }

    pub fn into_group(self) -> Group {
        self.group
    }
}

impl Deref for Form {
    type Target = Group;

    fn deref(&self) -> &Group {
        &self.group
    }
}

impl DerefMut for Form {
    fn deref_mut(&mut self) -> &mut Group {
        &mut self.group
    }
}

impl Chunk for Form {
    fn tag(&self) -> Tag {
        self.group.tag()
    }

    fn header_tag(&self) -> Tag {
        self.group.header_tag()
    }

    fn encode_content(&self) -> Result<Vec<u8>> {
        self.group.encode_content()
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.group, f)
    }
}
