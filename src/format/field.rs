//! Field types, values and the little-endian field reader/writer

use super::Tag;
use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::io::Cursor;

/// Declared type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    /// Four-character code
    Tag,
    /// Fixed-width string, zero padded on disk
    ///
    /// Content that is not UTF-8 decodes as [`Value::Bytes`] so it survives
    /// a round trip unchanged.
    Str(usize),
    /// Fixed-width raw bytes
    Bytes(usize),
    /// Variable-length string (custom codecs only)
    VarStr,
    /// Variable-length bytes (custom codecs only)
    VarBytes,
}

impl FieldType {
    /// Encoded width in bytes, `None` for variable-length types
    pub fn width(&self) -> Option<usize> {
        match self {
            FieldType::U8 | FieldType::I8 => Some(1),
            FieldType::U16 | FieldType::I16 => Some(2),
            FieldType::U32 | FieldType::I32 | FieldType::F32 | FieldType::Tag => Some(4),
            FieldType::U64 | FieldType::I64 | FieldType::F64 => Some(8),
            FieldType::Str(width) | FieldType::Bytes(width) => Some(*width),
            FieldType::VarStr | FieldType::VarBytes => None,
        }
    }

    /// Human-readable type name used in validation errors
    pub fn name(&self) -> String {
        match self {
            FieldType::U8 => "u8".to_string(),
            FieldType::I8 => "i8".to_string(),
            FieldType::U16 => "u16".to_string(),
            FieldType::I16 => "i16".to_string(),
            FieldType::U32 => "u32".to_string(),
            FieldType::I32 => "i32".to_string(),
            FieldType::U64 => "u64".to_string(),
            FieldType::I64 => "i64".to_string(),
            FieldType::F32 => "f32".to_string(),
            FieldType::F64 => "f64".to_string(),
            FieldType::Tag => "tag".to_string(),
            FieldType::Str(width) => format!("str[{}]", width),
            FieldType::Bytes(width) => format!("bytes[{}]", width),
            FieldType::VarStr => "str".to_string(),
            FieldType::VarBytes => "bytes".to_string(),
        }
    }

    /// Check that `value` fits this type
    pub fn check(&self, field: &str, value: &Value) -> Result<()> {
        let fits = match (self, value) {
            (FieldType::U8, Value::U8(_))
            | (FieldType::I8, Value::I8(_))
            | (FieldType::U16, Value::U16(_))
            | (FieldType::I16, Value::I16(_))
            | (FieldType::U32, Value::U32(_))
            | (FieldType::I32, Value::I32(_))
            | (FieldType::U64, Value::U64(_))
            | (FieldType::I64, Value::I64(_))
            | (FieldType::F32, Value::F32(_))
            | (FieldType::F64, Value::F64(_))
            | (FieldType::Tag, Value::Tag(_))
            | (FieldType::VarStr, Value::Str(_))
            | (FieldType::VarBytes, Value::Bytes(_)) => true,
            (FieldType::Str(width), Value::Str(s)) => {
                if s.len() > *width {
                    return Err(Error::validation(
                        field,
                        self.name(),
                        format!("str[{}]", s.len()),
                    ));
                }
                true
            }
            (FieldType::Str(width), Value::Bytes(b)) => {
                if b.len() > *width {
                    return Err(Error::validation(
                        field,
                        self.name(),
                        format!("bytes[{}]", b.len()),
                    ));
                }
                true
            }
            (FieldType::Bytes(width), Value::Bytes(b)) => {
                if b.len() != *width {
                    return Err(Error::validation(
                        field,
                        self.name(),
                        format!("bytes[{}]", b.len()),
                    ));
                }
                true
            }
            _ => false,
        };

        if fits {
            Ok(())
        } else {
            Err(Error::validation(field, self.name(), value.type_name()))
        }
    }
}

/// A decoded field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Tag(Tag),
    Str(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Type name of the value itself
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::U8(_) => "u8",
            Value::I8(_) => "i8",
            Value::U16(_) => "u16",
            Value::I16(_) => "i16",
            Value::U32(_) => "u32",
            Value::I32(_) => "i32",
            Value::U64(_) => "u64",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Tag(_) => "tag",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Unsigned integer value, widened to u64
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U8(v) => Some(u64::from(*v)),
            Value::U16(v) => Some(u64::from(*v)),
            Value::U32(v) => Some(u64::from(*v)),
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// Signed integer value, widened to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(v) => Some(i64::from(*v)),
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Tag(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "{}", v.escape_ascii()),
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_value_from! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Tag => Tag,
    String => Str,
    Vec<u8> => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

/// A named, typed field of a record shape
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    pub default: Option<Value>,
}

impl FieldDef {
    pub fn new<S: Into<String>>(name: S, ty: FieldType) -> Self {
        FieldDef {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// Value used when a record is built without this field
    pub fn with_default<V: Into<Value>>(mut self, value: V) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Little-endian cursor over a record's content bytes
pub struct FieldReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        FieldReader {
            cursor: Cursor::new(data),
        }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    fn truncated(&self, what: &str) -> Error {
        Error::decode(format!(
            "truncated field: {} at offset {} with {} bytes left",
            what,
            self.position(),
            self.remaining()
        ))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| self.truncated("u8"))
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.cursor.read_i8().map_err(|_| self.truncated("i8"))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| self.truncated("u16"))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.cursor
            .read_i16::<LittleEndian>()
            .map_err(|_| self.truncated("i16"))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| self.truncated("u32"))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| self.truncated("i32"))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.cursor
            .read_u64::<LittleEndian>()
            .map_err(|_| self.truncated("u64"))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.cursor
            .read_i64::<LittleEndian>()
            .map_err(|_| self.truncated("i64"))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.cursor
            .read_f32::<LittleEndian>()
            .map_err(|_| self.truncated("f32"))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.cursor
            .read_f64::<LittleEndian>()
            .map_err(|_| self.truncated("f64"))
    }

    /// Borrow the next `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(self.truncated(&format!("{} bytes", len)));
        }
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.position();
        self.cursor.set_position((start + len) as u64);
        Ok(&data[start..start + len])
    }

    /// Borrow everything that is left
    pub fn read_rest(&mut self) -> &'a [u8] {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.position().min(data.len());
        self.cursor.set_position(data.len() as u64);
        &data[start..]
    }

    /// Read a string whose length is given by a leading byte
    pub fn read_prefixed_str(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        let raw = self.read_bytes(len)?;
        utf8(raw.to_vec())
    }

    /// Read bytes whose length is given by a leading byte
    pub fn read_prefixed_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u8()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Read one value of the given type
    ///
    /// Variable-length types take the rest of the buffer.
    pub fn read_value(&mut self, ty: FieldType) -> Result<Value> {
        let value = match ty {
            FieldType::U8 => Value::U8(self.read_u8()?),
            FieldType::I8 => Value::I8(self.read_i8()?),
            FieldType::U16 => Value::U16(self.read_u16()?),
            FieldType::I16 => Value::I16(self.read_i16()?),
            FieldType::U32 => Value::U32(self.read_u32()?),
            FieldType::I32 => Value::I32(self.read_i32()?),
            FieldType::U64 => Value::U64(self.read_u64()?),
            FieldType::I64 => Value::I64(self.read_i64()?),
            FieldType::F32 => Value::F32(self.read_f32()?),
            FieldType::F64 => Value::F64(self.read_f64()?),
            FieldType::Tag => Value::Tag(Tag::from_slice(self.read_bytes(4)?)?),
            FieldType::Str(width) => {
                let raw = self.read_bytes(width)?;
                let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                match String::from_utf8(raw[..end].to_vec()) {
                    Ok(s) => Value::Str(s),
                    Err(e) => Value::Bytes(e.into_bytes()),
                }
            }
            FieldType::Bytes(width) => Value::Bytes(self.read_bytes(width)?.to_vec()),
            FieldType::VarStr => Value::Str(utf8(self.read_rest().to_vec())?),
            FieldType::VarBytes => Value::Bytes(self.read_rest().to_vec()),
        };
        Ok(value)
    }
}

fn utf8(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw).map_err(|e| Error::decode(format!("string field is not UTF-8: {}", e)))
}

/// Little-endian writer producing a record's content bytes
#[derive(Debug, Default)]
pub struct FieldWriter {
    buf: BytesMut,
}

impl FieldWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        FieldWriter {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.put_u16_le(v);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.put_u32_le(v);
    }

    pub fn write_bytes(&mut self, v: &[u8]) {
        self.buf.put_slice(v);
    }

    /// Write a string preceded by its length as one byte
    pub fn write_prefixed_str(&mut self, field: &str, s: &str) -> Result<()> {
        self.write_prefixed_bytes(field, s.as_bytes())
    }

    /// Write bytes preceded by their length as one byte
    pub fn write_prefixed_bytes(&mut self, field: &str, v: &[u8]) -> Result<()> {
        let len = u8::try_from(v.len()).map_err(|_| {
            Error::validation(field, "at most 255 bytes", format!("{} bytes", v.len()))
        })?;
        self.buf.put_u8(len);
        self.buf.put_slice(v);
        Ok(())
    }

    /// Write `value` as declared by `field`, re-padding fixed-width strings
    pub fn write_value(&mut self, field: &FieldDef, value: &Value) -> Result<()> {
        field.ty.check(&field.name, value)?;

        match value {
            Value::U8(v) => self.buf.put_u8(*v),
            Value::I8(v) => self.buf.put_i8(*v),
            Value::U16(v) => self.buf.put_u16_le(*v),
            Value::I16(v) => self.buf.put_i16_le(*v),
            Value::U32(v) => self.buf.put_u32_le(*v),
            Value::I32(v) => self.buf.put_i32_le(*v),
            Value::U64(v) => self.buf.put_u64_le(*v),
            Value::I64(v) => self.buf.put_i64_le(*v),
            Value::F32(v) => self.buf.put_f32_le(*v),
            Value::F64(v) => self.buf.put_f64_le(*v),
            Value::Tag(v) => self.buf.put_slice(v.as_bytes()),
            Value::Str(s) => self.put_padded(field.ty, s.as_bytes()),
            Value::Bytes(b) => self.put_padded(field.ty, b),
        }

        Ok(())
    }

    fn put_padded(&mut self, ty: FieldType, v: &[u8]) {
        self.buf.put_slice(v);
        if let FieldType::Str(width) = ty {
            self.buf.put_bytes(0, width - v.len());
        }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(FieldType::U16.width(), Some(2));
        assert_eq!(FieldType::Str(6).width(), Some(6));
        assert_eq!(FieldType::VarStr.width(), None);
    }

    #[test]
    fn test_check_type_mismatch_names_types() {
        let err = FieldType::U32.check("frob", &Value::from("x")).unwrap_err();
        match err {
            Error::Validation {
                field,
                expected,
                actual,
            } => {
                assert_eq!(field, "frob");
                assert_eq!(expected, "u32");
                assert_eq!(actual, "str");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_string_too_wide() {
        assert!(FieldType::Str(4).check("s", &Value::from("abcd")).is_ok());
        assert!(FieldType::Str(4).check("s", &Value::from("abcde")).is_err());
    }

    #[test]
    fn test_zero_padded_string_trim_and_repad() {
        let field = FieldDef::new("city", FieldType::Str(12));
        let mut reader = FieldReader::new(b"Dwarfton\0\0\0\0");
        let value = reader.read_value(field.ty).unwrap();
        assert_eq!(value, Value::from("Dwarfton"));
        assert_eq!(reader.remaining(), 0);

        let mut writer = FieldWriter::new();
        writer.write_value(&field, &value).unwrap();
        assert_eq!(writer.into_vec(), b"Dwarfton\0\0\0\0".to_vec());
    }

    #[test]
    fn test_non_utf8_string_kept_as_bytes() {
        let field = FieldDef::new("name", FieldType::Str(6));
        let mut reader = FieldReader::new(b"caf\xe9\0\0");
        let value = reader.read_value(field.ty).unwrap();
        assert_eq!(value, Value::Bytes(b"caf\xe9".to_vec()));

        let mut writer = FieldWriter::new();
        writer.write_value(&field, &value).unwrap();
        assert_eq!(writer.into_vec(), b"caf\xe9\0\0".to_vec());

        assert!(FieldType::Str(2).check("name", &value).is_err());
    }

    #[test]
    fn test_prefixed_strings() {
        let mut writer = FieldWriter::new();
        writer.write_prefixed_str("colour", "red").unwrap();
        writer.write_prefixed_str("food", "cake").unwrap();
        let bytes = writer.into_vec();
        assert_eq!(bytes, b"\x03red\x04cake".to_vec());

        let mut reader = FieldReader::new(&bytes);
        assert_eq!(reader.read_prefixed_str().unwrap(), "red");
        assert_eq!(reader.read_prefixed_str().unwrap(), "cake");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_prefixed_string_too_long() {
        let mut writer = FieldWriter::new();
        let long = "x".repeat(256);
        assert!(writer.write_prefixed_str("food", &long).is_err());
    }

    #[test]
    fn test_truncated_read() {
        let mut reader = FieldReader::new(&[1, 2]);
        assert!(matches!(reader.read_u32(), Err(Error::Decode(_))));
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::U16(65535).as_u64(), Some(65535));
        assert_eq!(Value::I8(-3).as_i64(), Some(-3));
        assert_eq!(Value::from("nitz").as_str(), Some("nitz"));
        assert_eq!(Value::U8(1).as_str(), None);
    }
}
