//! Leaf records: record shapes, field values and tagged records

use super::chunk::Chunk;
use super::field::{FieldDef, FieldReader, FieldType, FieldWriter, Value};
use super::Tag;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Custom decode/encode hook for records whose layout is not fixed
///
/// `decode` must consume the whole reader; leftover bytes are a decode error.
/// The returned values are validated against the shape's field list.
pub trait FieldCodec: Send + Sync {
    fn decode(&self, fields: &[FieldDef], reader: &mut FieldReader<'_>) -> Result<Vec<Value>>;

    fn encode(&self, fields: &[FieldDef], values: &[Value], writer: &mut FieldWriter) -> Result<()>;
}

/// How a shape's fields are laid out on disk
#[derive(Clone)]
pub enum Layout {
    /// Every field has a fixed width; holds the total size
    Fixed(usize),
    /// Parsing is owned by a codec hook
    Custom(Arc<dyn FieldCodec>),
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Fixed(size) => f.debug_tuple("Fixed").field(size).finish(),
            Layout::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Declared field list and layout of a record type
#[derive(Debug)]
pub struct RecordShape {
    name: String,
    fields: Vec<FieldDef>,
    layout: Layout,
}

impl RecordShape {
    /// Shape with a fixed byte layout; every field needs a fixed width
    pub fn fixed<S: Into<String>>(name: S, fields: Vec<FieldDef>) -> Result<Self> {
        let name = name.into();
        check_fields(&name, &fields)?;

        let mut size = 0;
        for field in &fields {
            size += field.ty.width().ok_or_else(|| {
                Error::schema(format!(
                    "field `{}` of fixed shape `{}` has variable width ({})",
                    field.name,
                    name,
                    field.ty.name()
                ))
            })?;
        }

        Ok(RecordShape {
            name,
            fields,
            layout: Layout::Fixed(size),
        })
    }

    /// Shape decoded and encoded by `codec`
    pub fn custom<S, C>(name: S, fields: Vec<FieldDef>, codec: C) -> Result<Self>
    where
        S: Into<String>,
        C: FieldCodec + 'static,
    {
        let name = name.into();
        check_fields(&name, &fields)?;

        Ok(RecordShape {
            name,
            fields,
            layout: Layout::Custom(Arc::new(codec)),
        })
    }

    /// Shape holding the whole content as one opaque `data` field
    pub fn raw<S: Into<String>>(name: S) -> Self {
        RecordShape {
            name: name.into(),
            fields: vec![FieldDef::new("data", FieldType::VarBytes)],
            layout: Layout::Custom(Arc::new(RawCodec)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Content size of a fixed layout
    pub fn fixed_size(&self) -> Option<usize> {
        match self.layout {
            Layout::Fixed(size) => Some(size),
            Layout::Custom(_) => None,
        }
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Check a full value list against the declared fields
    pub fn validate(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.fields.len() {
            return Err(Error::validation(
                self.name.as_str(),
                format!("{} fields", self.fields.len()),
                format!("{} values", values.len()),
            ));
        }

        for (field, value) in self.fields.iter().zip(values) {
            field.ty.check(&field.name, value)?;
        }

        Ok(())
    }

    /// Decode content bytes into field values
    pub fn decode(&self, data: &[u8]) -> Result<Vec<Value>> {
        let mut reader = FieldReader::new(data);

        let values = match &self.layout {
            Layout::Fixed(size) => {
                if data.len() != *size {
                    return Err(Error::decode(format!(
                        "record `{}` expects {} bytes, got {}",
                        self.name,
                        size,
                        data.len()
                    )));
                }
                self.fields
                    .iter()
                    .map(|field| reader.read_value(field.ty))
                    .collect::<Result<Vec<_>>>()?
            }
            Layout::Custom(codec) => {
                let values = codec.decode(&self.fields, &mut reader)?;
                if reader.remaining() != 0 {
                    return Err(Error::decode(format!(
                        "record `{}` left {} of {} bytes unread",
                        self.name,
                        reader.remaining(),
                        data.len()
                    )));
                }
                self.validate(&values)?;
                values
            }
        };

        Ok(values)
    }

    /// Encode field values into content bytes
    pub fn encode(&self, values: &[Value]) -> Result<Vec<u8>> {
        self.validate(values)?;

        match &self.layout {
            Layout::Fixed(size) => {
                let mut writer = FieldWriter::with_capacity(*size);
                for (field, value) in self.fields.iter().zip(values) {
                    writer.write_value(field, value)?;
                }
                Ok(writer.into_vec())
            }
            Layout::Custom(codec) => {
                let mut writer = FieldWriter::new();
                codec.encode(&self.fields, values, &mut writer)?;
                Ok(writer.into_vec())
            }
        }
    }
}

struct RawCodec;

impl FieldCodec for RawCodec {
    fn decode(&self, _fields: &[FieldDef], reader: &mut FieldReader<'_>) -> Result<Vec<Value>> {
        Ok(vec![Value::Bytes(reader.read_rest().to_vec())])
    }

    fn encode(&self, fields: &[FieldDef], values: &[Value], writer: &mut FieldWriter) -> Result<()> {
        for (field, value) in fields.iter().zip(values) {
            let bytes = value.as_bytes().ok_or_else(|| {
                Error::validation(field.name.as_str(), field.ty.name(), value.type_name())
            })?;
            writer.write_bytes(bytes);
        }
        Ok(())
    }
}

fn check_fields(shape: &str, fields: &[FieldDef]) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(Error::schema(format!(
                "shape `{}` declares field `{}` twice",
                shape, field.name
            )));
        }
        if let Some(default) = &field.default {
            field.ty.check(&field.name, default)?;
        }
    }
    Ok(())
}

/// Field values bound to their shape
#[derive(Debug, Clone)]
pub struct Fields {
    shape: Arc<RecordShape>,
    values: Vec<Value>,
}

impl Fields {
    /// Build from values in declaration order
    pub fn new(shape: Arc<RecordShape>, values: Vec<Value>) -> Result<Self> {
        shape.validate(&values)?;
        Ok(Fields { shape, values })
    }

    /// Build from `(name, value)` pairs; missing fields take their default
    pub fn from_named<I, S, V>(shape: Arc<RecordShape>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<Value>,
    {
        let mut slots: Vec<Option<Value>> = vec![None; shape.fields().len()];
        for (name, value) in pairs {
            let name = name.as_ref();
            let index = shape.field_index(name).ok_or_else(|| {
                Error::not_found(format!("field `{}` in shape `{}`", name, shape.name()))
            })?;
            slots[index] = Some(value.into());
        }

        let values = shape
            .fields()
            .iter()
            .zip(slots)
            .map(|(field, value)| {
                value
                    .or_else(|| field.default.clone())
                    .ok_or_else(|| Error::validation(field.name.as_str(), field.ty.name(), "missing"))
            })
            .collect::<Result<Vec<_>>>()?;

        Fields::new(shape, values)
    }

    /// Decode content bytes with `shape`
    pub fn decode(shape: Arc<RecordShape>, data: &[u8]) -> Result<Self> {
        let values = shape.decode(data)?;
        Ok(Fields { shape, values })
    }

    /// Content bytes, without header or padding
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.shape.encode(&self.values)
    }

    pub fn shape(&self) -> &Arc<RecordShape> {
        &self.shape
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.shape.field_index(name).map(|i| &self.values[i])
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Replace a field value after checking its type
    pub fn set<V: Into<Value>>(&mut self, name: &str, value: V) -> Result<()> {
        let index = self.shape.field_index(name).ok_or_else(|| {
            Error::not_found(format!("field `{}` in shape `{}`", name, self.shape.name()))
        })?;
        let value = value.into();
        self.shape.fields()[index].ty.check(name, &value)?;
        self.values[index] = value;
        Ok(())
    }
}

impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shape, &other.shape) && self.values == other.values
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (field, value) in self.shape.fields().iter().zip(&self.values) {
            writeln!(f, "\t{}={}", field.name, value)?;
        }
        Ok(())
    }
}

/// A tagged leaf chunk
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    tag: Tag,
    fields: Fields,
}

impl Record {
    /// Build from values in declaration order
    pub fn new<T: Into<Tag>>(tag: T, shape: Arc<RecordShape>, values: Vec<Value>) -> Result<Self> {
        Ok(Record {
            tag: tag.into(),
            fields: Fields::new(shape, values)?,
        })
    }

    /// Build from `(name, value)` pairs; missing fields take their default
    pub fn from_named<T, I, S, V>(tag: T, shape: Arc<RecordShape>, pairs: I) -> Result<Self>
    where
        T: Into<Tag>,
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<Value>,
    {
        Ok(Record {
            tag: tag.into(),
            fields: Fields::from_named(shape, pairs)?,
        })
    }

    /// Decode a record from its content bytes (header already stripped)
    pub fn decode(tag: Tag, shape: Arc<RecordShape>, content: &[u8]) -> Result<Self> {
        Ok(Record {
            tag,
            fields: Fields::decode(shape, content)?,
        })
    }

    pub fn shape(&self) -> &Arc<RecordShape> {
        self.fields.shape()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn values(&self) -> &[Value] {
        self.fields.values()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set<V: Into<Value>>(&mut self, name: &str, value: V) -> Result<()> {
        self.fields.set(name, value)
    }
}

impl Chunk for Record {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn encode_content(&self) -> Result<Vec<u8>> {
        self.fields.encode()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.tag)?;
        write!(f, "{}", self.fields)
    }
}
