//! Record lists: fixed-size records packed back to back in one chunk

use super::record::{Fields, RecordShape};
use super::{Chunk, Tag, Value};
use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

/// A chunk whose content is a run of same-shaped records with no framing of their own
#[derive(Debug, Clone)]
pub struct MultiRecordList {
    tag: Tag,
    shape: Arc<RecordShape>,
    records: Vec<Fields>,
}

impl MultiRecordList {
    /// Empty list; `shape` should be fixed-size for the list to decode again
    pub fn new<T: Into<Tag>>(tag: T, shape: Arc<RecordShape>) -> Self {
        MultiRecordList {
            tag: tag.into(),
            shape,
            records: Vec::new(),
        }
    }

    /// Split `content` into consecutive records of the shape's size
    pub fn decode(tag: Tag, shape: Arc<RecordShape>, content: &[u8]) -> Result<Self> {
        let size = match shape.fixed_size() {
            Some(size) if size > 0 => size,
            _ => {
                return Err(Error::decode(format!(
                    "record list `{}` needs a fixed-size shape, `{}` is not",
                    tag,
                    shape.name()
                )))
            }
        };

        if content.len() % size != 0 {
            return Err(Error::decode(format!(
                "record list `{}`: {} bytes is not a multiple of the {}-byte `{}` record",
                tag,
                content.len(),
                size,
                shape.name()
            )));
        }

        let records = content
            .chunks_exact(size)
            .map(|chunk| Fields::decode(shape.clone(), chunk))
            .collect::<Result<Vec<_>>>()?;

        Ok(MultiRecordList {
            tag,
            shape,
            records,
        })
    }

    pub fn shape(&self) -> &Arc<RecordShape> {
        &self.shape
    }

    pub fn records(&self) -> &[Fields] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Fields> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Fields> {
        self.records.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fields> {
        self.records.iter()
    }

    /// Append a record; it must share this list's shape
    pub fn push(&mut self, record: Fields) -> Result<()> {
        if !Arc::ptr_eq(record.shape(), &self.shape) {
            return Err(Error::validation(
                self.tag.to_string(),
                format!("shape `{}`", self.shape.name()),
                format!("shape `{}`", record.shape().name()),
            ));
        }
        self.records.push(record);
        Ok(())
    }

    /// Append a record built from values in declaration order
    pub fn push_values(&mut self, values: Vec<Value>) -> Result<()> {
        let record = Fields::new(self.shape.clone(), values)?;
        self.records.push(record);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Fields> {
        (index < self.records.len()).then(|| self.records.remove(index))
    }
}

impl Chunk for MultiRecordList {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn encode_content(&self) -> Result<Vec<u8>> {
        let capacity = self.shape.fixed_size().unwrap_or(0) * self.records.len();
        let mut out = BytesMut::with_capacity(capacity);
        for record in &self.records {
            out.put_slice(&record.encode()?);
        }
        Ok(out.to_vec())
    }
}

impl PartialEq for MultiRecordList {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && Arc::ptr_eq(&self.shape, &other.shape)
            && self.records == other.records
    }
}

impl Index<usize> for MultiRecordList {
    type Output = Fields;

    fn index(&self, index: usize) -> &Fields {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a MultiRecordList {
    type Item = &'a Fields;
    type IntoIter = std::slice::Iter<'a, Fields>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl fmt::Display for MultiRecordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.tag)?;
        for (i, record) in self.records.iter().enumerate() {
            writeln!(f, "\t[{}]", i)?;
            for line in record.to_string().lines() {
                writeln!(f, "\t{}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FieldDef, FieldType};

    fn point() -> Arc<RecordShape> {
        Arc::new(
            RecordShape::fixed(
                "point",
                vec![
                    FieldDef::new("x", FieldType::U16),
                    FieldDef::new("y", FieldType::U16),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_decode_splits_records() {
        let content = [1, 0, 2, 0, 3, 0, 4, 0];
        let list = MultiRecordList::decode(Tag::new(*b"pnts"), point(), &content).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].get("x"), Some(&Value::U16(3)));
        assert_eq!(list.encode_content().unwrap(), content);
    }

    #[test]
    fn test_decode_empty_content() {
        let list = MultiRecordList::decode(Tag::new(*b"pnts"), point(), &[]).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.encode().unwrap(), b"pnts\0\0\0\0");
    }

    #[test]
    fn test_decode_rejects_partial_record() {
        let err = MultiRecordList::decode(Tag::new(*b"pnts"), point(), &[1, 0, 2]).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_push_requires_same_shape() {
        let shape = point();
        let mut list = MultiRecordList::new(b"pnts", shape.clone());
        list.push(Fields::new(shape, vec![Value::U16(1), Value::U16(2)]).unwrap())
            .unwrap();

        let other = Fields::new(point(), vec![Value::U16(1), Value::U16(2)]).unwrap();
        assert!(matches!(list.push(other), Err(Error::Validation { .. })));
        assert!(list.push_values(vec![Value::U8(1)]).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_display() {
        let shape = point();
        let mut list = MultiRecordList::new(b"pnts", shape);
        list.push_values(vec![Value::U16(1), Value::U16(2)]).unwrap();
        assert_eq!(list.to_string(), "pnts\n\t[0]\n\t\tx=1\n\t\ty=2\n");
    }
}
