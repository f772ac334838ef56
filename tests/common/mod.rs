//! Common test utilities for rifftree integration tests
//!
//! Schemas for the sample containers plus hand-rolled byte builders, so
//! expected images never come from the encoder under test.

#![allow(dead_code)]

use std::sync::Arc;

use rifftree::error::{Error, Result};
use rifftree::format::{
    FieldCodec, FieldDef, FieldReader, FieldType, FieldWriter, RecordShape, Schema, Value,
};

// ============================================================================
// Byte Builders
// ============================================================================

/// Frame `content` under `tag`, with a zero pad byte after odd content
pub fn chunk(tag: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 9);
    out.extend_from_slice(tag);
    out.extend_from_slice(&(content.len() as u32).to_le_bytes());
    out.extend_from_slice(content);
    if content.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// Frame already-framed `children` as a group under `marker`
pub fn group(marker: &[u8; 4], type_tag: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let mut content = type_tag.to_vec();
    for child in children {
        content.extend_from_slice(child);
    }
    chunk(marker, &content)
}

pub fn u32_le(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}

/// Size field of the frame starting at `offset`
pub fn size_at(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset + 4],
        data[offset + 5],
        data[offset + 6],
        data[offset + 7],
    ])
}

// ============================================================================
// "test" form: two fixed records
// ============================================================================

pub fn foo_shape() -> Arc<RecordShape> {
    Arc::new(
        RecordShape::fixed(
            "foo",
            vec![
                FieldDef::new("frob", FieldType::U32),
                FieldDef::new("nitz", FieldType::Str(6)),
            ],
        )
        .expect("foo shape"),
    )
}

pub fn bar_shape() -> Arc<RecordShape> {
    Arc::new(
        RecordShape::fixed(
            "bar",
            vec![
                FieldDef::new("goober", FieldType::U8),
                FieldDef::new("rutabaga", FieldType::U8),
            ],
        )
        .expect("bar shape"),
    )
}

pub fn test_schema() -> Arc<Schema> {
    Schema::builder(b"test")
        .record(b"foo ", foo_shape())
        .record(b"bar ", bar_shape())
        .slot("foo", b"foo ")
        .slot("bar", b"bar ")
        .build()
        .expect("test schema")
}

pub fn test_form_bytes() -> Vec<u8> {
    let mut foo = u32_le(42).to_vec();
    foo.extend_from_slice(b"3.1415");
    group(
        b"RIFF",
        b"test",
        &[chunk(b"foo ", &foo), chunk(b"bar ", &[255, 128])],
    )
}

// ============================================================================
// "Tlst" form: a nested "tlst" group
// ============================================================================

pub fn herb_shape() -> Arc<RecordShape> {
    Arc::new(
        RecordShape::fixed(
            "herb",
            vec![
                FieldDef::new("chervil", FieldType::U32),
                FieldDef::new("sage", FieldType::U32),
            ],
        )
        .expect("herb shape"),
    )
}

pub fn spce_shape() -> Arc<RecordShape> {
    Arc::new(
        RecordShape::fixed(
            "spce",
            vec![
                FieldDef::new("nutmeg", FieldType::U32),
                FieldDef::new("paprika", FieldType::U16),
            ],
        )
        .expect("spce shape"),
    )
}

pub fn tlst_schema() -> Arc<Schema> {
    Schema::builder(b"tlst")
        .record(b"herb", herb_shape())
        .record(b"spce", spce_shape())
        .slot("herb", b"herb")
        .slot("spce", b"spce")
        .build()
        .expect("tlst schema")
}

pub fn nested_schema() -> Arc<Schema> {
    Schema::builder(b"Tlst")
        .group(tlst_schema())
        .slot("tlst", b"tlst")
        .build()
        .expect("Tlst schema")
}

pub fn tlst_list_bytes() -> Vec<u8> {
    let mut herb = u32_le(4).to_vec();
    herb.extend_from_slice(&u32_le(42));
    let mut spce = u32_le(2).to_vec();
    spce.extend_from_slice(&65535u16.to_le_bytes());
    group(
        b"LIST",
        b"tlst",
        &[chunk(b"herb", &herb), chunk(b"spce", &spce)],
    )
}

pub fn nested_form_bytes() -> Vec<u8> {
    group(b"RIFF", b"Tlst", &[tlst_list_bytes()])
}

// ============================================================================
// "modo" form: fallback records under "dwrf"
// ============================================================================

/// Two strings, each prefixed by a one-byte length
pub struct DwarfCodec;

impl FieldCodec for DwarfCodec {
    fn decode(&self, _fields: &[FieldDef], reader: &mut FieldReader<'_>) -> Result<Vec<Value>> {
        let colour = reader.read_prefixed_str()?;
        let food = reader.read_prefixed_str()?;
        Ok(vec![Value::Str(colour), Value::Str(food)])
    }

    fn encode(&self, fields: &[FieldDef], values: &[Value], writer: &mut FieldWriter) -> Result<()> {
        for (field, value) in fields.iter().zip(values) {
            let s = value
                .as_str()
                .ok_or_else(|| Error::validation(field.name.as_str(), "str", value.type_name()))?;
            writer.write_prefixed_str(&field.name, s)?;
        }
        Ok(())
    }
}

pub fn dwarf_shape() -> Arc<RecordShape> {
    Arc::new(
        RecordShape::custom(
            "dwarf",
            vec![
                FieldDef::new("colour", FieldType::VarStr),
                FieldDef::new("food", FieldType::VarStr),
            ],
            DwarfCodec,
        )
        .expect("dwarf shape"),
    )
}

pub fn addr_shape() -> Arc<RecordShape> {
    Arc::new(
        RecordShape::fixed(
            "addr",
            vec![
                FieldDef::new("street", FieldType::Str(20)),
                FieldDef::new("city", FieldType::Str(12)),
            ],
        )
        .expect("addr shape"),
    )
}

pub fn dwrf_schema() -> Arc<Schema> {
    Schema::builder(b"dwrf")
        .fallback_record(dwarf_shape())
        .slot("doc", b"doc_")
        .slot("dopy", b"dopy")
        .slot("snzy", b"snzy")
        .build()
        .expect("dwrf schema")
}

pub fn modo_schema() -> Arc<Schema> {
    Schema::builder(b"modo")
        .group(dwrf_schema())
        .record(b"addr", addr_shape())
        .slot("dwrf", b"dwrf")
        .slot("addr", b"addr")
        .build()
        .expect("modo schema")
}

pub fn dwarf_content(colour: &str, food: &str) -> Vec<u8> {
    let mut out = vec![colour.len() as u8];
    out.extend_from_slice(colour.as_bytes());
    out.push(food.len() as u8);
    out.extend_from_slice(food.as_bytes());
    out
}

pub fn dwarves_bytes() -> Vec<u8> {
    let dwrf = group(
        b"LIST",
        b"dwrf",
        &[
            chunk(b"doc_", &dwarf_content("red", "cake")),
            chunk(b"dopy", &dwarf_content("yellow", "apples")),
            chunk(b"snzy", &dwarf_content("black", "haggis")),
        ],
    );

    let mut addr = b"1, Fairy Tale Lane\0\0".to_vec();
    addr.extend_from_slice(b"Dwarfton\0\0\0\0");

    group(b"RIFF", b"modo", &[dwrf, chunk(b"addr", &addr)])
}
