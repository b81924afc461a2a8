//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module containing tests for the block import/export drivers, so we don't break them.
//!
//! Most of these follow the same pattern as the file tests of the formats built on this
//! lib: decode a known byte image, poke at it, reencode, compare bytes.

use std::sync::Arc;

use crate::checks::SumCheck;
use crate::error::{ErrorKind, Result};
use crate::fields::{FieldDescriptor, IntWidth};
use crate::fields::block::BlockField;
use crate::fields::bytes::BytesField;
use crate::fields::chunk::{ChunkField, ChunkIdKind};
use crate::fields::numeric::{Endianness, NumericField, NumericKind};
use crate::fields::stream::StreamField;
use crate::fields::string::{StringField, TextEncoding};
use crate::refs::Ref;
use crate::schema::{Schema, SchemaBuilder};
use crate::transforms::{Transform, TransformCtx, XorTransform};
use crate::value::{ChunkId, Value};

use super::{Block, BlockState};

/// A transform with no reverse direction, to get a read-only block.
#[derive(Debug)]
struct OneWay;

impl Transform for OneWay {
    fn name(&self) -> &str {
        "OneWay"
    }

    fn forward(&self, data: &[u8], _ctx: &TransformCtx) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn is_invertible(&self) -> bool {
        false
    }
}

fn u8_field() -> NumericField {
    NumericField::new(NumericKind::U8, Endianness::Little)
}

/// One-byte record, used as the element of sequences and streams.
fn item_schema() -> Arc<Schema> {
    SchemaBuilder::new("Item")
        .field("value", u8_field())
        .build()
        .unwrap()
}

/// A single big-endian u16 must decode and reencode byte-identical.
#[test]
fn test_round_trip_u16_be() {
    let schema = SchemaBuilder::new("Single")
        .field("value", NumericField::new(NumericKind::U16, Endianness::Big))
        .build()
        .unwrap();

    let mut block = Block::from_bytes(&schema, &[0x01, 0x02]).unwrap();
    assert_eq!(block.value("value").unwrap(), &Value::Unsigned(258));
    assert_eq!(block.state(), BlockState::Bound);
    assert_eq!(block.export_data().unwrap(), vec![0x01, 0x02]);
}

/// A value outside its declared range rejects the import, with the field annotated.
#[test]
fn test_range_check() {
    let schema = SchemaBuilder::new("Ranged")
        .field("value", NumericField::new(NumericKind::U16, Endianness::Big).with_range(0, 250))
        .build()
        .unwrap();

    let error = Block::from_bytes(&schema, &[0x00, 0xFB]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ConstraintViolation);
    assert_eq!(error.path().as_deref(), Some("value"));
    assert_eq!(error.offset(), Some(0));

    assert!(Block::from_bytes(&schema, &[0x00, 0xFA]).is_ok());
}

/// A sequence count driven by a sibling field: the reference describes the serialized
/// form, the in-memory sequence dictates it.
#[test]
fn test_ref_driven_count() {
    let schema = SchemaBuilder::new("Counted")
        .field("len", NumericField::new(NumericKind::U32, Endianness::Little))
        .field("items", BlockField::sequence_ref(&item_schema(), Ref::path("len")))
        .build()
        .unwrap();

    let data = vec![0x02, 0x00, 0x00, 0x00, 0xAA, 0xBB];
    let mut block = Block::from_bytes(&schema, &data).unwrap();

    assert_eq!(block.value("len").unwrap(), &Value::Unsigned(2));
    assert_eq!(block.value("items").unwrap().as_list().unwrap().len(), 2);
    assert_eq!(block.value_at_path("items.0.value").unwrap(), &Value::Unsigned(0xAA));
    assert_eq!(block.value_at_path("items.1.value").unwrap(), &Value::Unsigned(0xBB));
    assert_eq!(block.get_size().unwrap(), 6);
    assert_eq!(block.export_data().unwrap(), data);

    // Bumping the counter without touching the sequence doesn't change the serialized
    // count: it's rederived from the in-memory elements.
    block.set_value("len", Value::Unsigned(3)).unwrap();
    assert_eq!(block.export_data().unwrap(), data);
    assert_eq!(block.value("len").unwrap(), &Value::Unsigned(2));

    // Mutating the sequence keeps the counter in sync.
    block.set_value("items", Value::List(vec![])).unwrap();
    assert_eq!(block.value("len").unwrap(), &Value::Unsigned(0));
    assert_eq!(block.export_data().unwrap(), vec![0x00, 0x00, 0x00, 0x00]);
}

/// A checksum check must verify on import and recompute on export.
#[test]
fn test_checksum_fixup() {
    let schema = SchemaBuilder::new("Checksummed")
        .field("payload", BytesField::new(4))
        .field("sum", u8_field())
        .check(Arc::new(SumCheck::new("payload", "sum")))
        .build()
        .unwrap();

    let mut block = Block::from_bytes(&schema, &[1, 2, 3, 4, 0x0A]).unwrap();

    block.set_value("payload", Value::Bytes(vec![1, 2, 3, 5])).unwrap();
    assert_eq!(block.export_data().unwrap(), vec![1, 2, 3, 5, 0x0B]);

    // A wrong checksum rejects the import.
    let error = Block::from_bytes(&schema, &[1, 2, 3, 4, 0x09]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CheckFailed);
}

/// A nested block that fails to parse becomes an Unknown slot holding the raw bytes,
/// and those bytes survive the round-trip verbatim.
#[test]
fn test_unknown_fallback() {
    let inner = SchemaBuilder::new("Inner")
        .field("a", NumericField::new(NumericKind::U64, Endianness::Little))
        .build()
        .unwrap();

    let outer = SchemaBuilder::new("Outer")
        .field("items", BlockField::sequence(&inner, 1))
        .build()
        .unwrap();

    let data = vec![0xDE, 0xAD, 0xBE, 0xEF];
    let mut block = Block::from_bytes(&outer, &data).unwrap();

    let items = block.value("items").unwrap().as_list().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_block().unwrap().raw(), Some(&data[..]));

    assert_eq!(block.export_data().unwrap(), data);
}

/// A transformed field decodes to plaintext, and mutations reencode through the
/// transform, leaving the other raw bytes alone.
#[test]
fn test_transform_round_trip() {
    let schema = SchemaBuilder::new("Obfuscated")
        .field("data", FieldDescriptor::new(BytesField::new(10)).with_transform(Arc::new(XorTransform::new(&[0x5A]))))
        .build()
        .unwrap();

    let plain = (1u8..=10).collect::<Vec<_>>();
    let raw = plain.iter().map(|byte| byte ^ 0x5A).collect::<Vec<_>>();

    let mut block = Block::from_bytes(&schema, &raw).unwrap();
    assert_eq!(block.value("data").unwrap(), &Value::Bytes(plain.clone()));

    let mut mutated = plain;
    mutated[3] = 0x7F;
    block.set_value("data", Value::Bytes(mutated)).unwrap();

    let exported = block.export_data().unwrap();
    assert_eq!(exported.len(), raw.len());
    for (index, byte) in exported.iter().enumerate() {
        let expected = if index == 3 { 0x7F ^ 0x5A } else { raw[index] };
        assert_eq!(*byte, expected);
    }
}

/// Bytes between fields (explicit offsets can leave holes) survive the round-trip
/// verbatim, and are zero on fresh blocks.
#[test]
fn test_gap_preservation() {
    let schema = SchemaBuilder::new("Gappy")
        .field("a", u8_field())
        .field("b", FieldDescriptor::new(u8_field()).with_offset(3))
        .build()
        .unwrap();

    let data = vec![1, 0xAA, 0xBB, 2];
    let mut block = Block::from_bytes(&schema, &data).unwrap();
    assert_eq!(block.export_data().unwrap(), data);

    block.set_value("a", Value::Unsigned(9)).unwrap();
    assert_eq!(block.export_data().unwrap(), vec![9, 0xAA, 0xBB, 2]);

    let mut fresh = Block::new(&schema);
    assert_eq!(fresh.export_data().unwrap(), vec![0, 0, 0, 0]);
}

/// A default-constructed block must export successfully, with counters synced.
#[test]
fn test_default_construction() {
    let schema = SchemaBuilder::new("Fresh")
        .field("version", NumericField::new(NumericKind::U8, Endianness::Little).with_default(Value::Unsigned(2)))
        .field("name", StringField::fixed(TextEncoding::Utf8, 4))
        .field("len", u8_field())
        .field("items", BlockField::sequence_ref(&item_schema(), Ref::path("len")))
        .build()
        .unwrap();

    let mut block = Block::new(&schema);
    assert_eq!(block.state(), BlockState::Empty);
    assert_eq!(block.export_data().unwrap(), vec![2, 0, 0, 0, 0, 0]);
    assert_eq!(block.state(), BlockState::Bound);

    block.set_value("name", Value::String("Waha".to_owned())).unwrap();
    assert_eq!(block.state(), BlockState::Dirty);
    assert_eq!(block.export_data().unwrap(), vec![2, 87, 97, 104, 97, 0]);
    assert_eq!(block.state(), BlockState::Bound);
}

/// Exporting, reimporting and exporting again must produce the same bytes.
#[test]
fn test_idempotent_export() {
    let schema = SchemaBuilder::new("Checksummed")
        .field("payload", BytesField::new(4))
        .field("sum", u8_field())
        .check(Arc::new(SumCheck::new("payload", "sum")))
        .build()
        .unwrap();

    let mut block = Block::from_bytes(&schema, &[1, 2, 3, 4, 0x0A]).unwrap();
    block.set_value("payload", Value::Bytes(vec![9, 9, 9, 9])).unwrap();

    let first = block.export_data().unwrap();
    let mut reimported = Block::from_bytes(&schema, &first).unwrap();
    assert_eq!(reimported.export_data().unwrap(), first);
}

/// Mutating one field must only move the bytes of that field.
#[test]
fn test_mutation_locality() {
    let schema = SchemaBuilder::new("Pair")
        .field("a", u8_field())
        .field("b", u8_field())
        .build()
        .unwrap();

    let mut block = Block::from_bytes(&schema, &[1, 2]).unwrap();
    block.set_value("a", Value::Unsigned(9)).unwrap();
    assert_eq!(block.export_data().unwrap(), vec![9, 2]);
}

/// Tagged chunks dispatch on their identifier, keep unknown payloads raw, allow empty
/// payloads, and round-trip byte-identical.
#[test]
fn test_chunk_round_trip() {
    let payload_schema = SchemaBuilder::new("Data")
        .field("value", NumericField::new(NumericKind::U16, Endianness::Little))
        .build()
        .unwrap();

    let schema = SchemaBuilder::new("Chunked")
        .field("chunks", ChunkField::new(ChunkIdKind::FourCC, IntWidth::U32, Endianness::Little)
            .with_schema(ChunkId::FourCC(*b"DATA"), &payload_schema))
        .build()
        .unwrap();

    let mut data = vec![];
    data.extend_from_slice(b"DATA");
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&[0x34, 0x12]);
    data.extend_from_slice(b"JUNK");
    data.extend_from_slice(&3u32.to_le_bytes());
    data.extend_from_slice(&[1, 2, 3]);
    data.extend_from_slice(b"NULL");
    data.extend_from_slice(&0u32.to_le_bytes());

    let mut block = Block::from_bytes(&schema, &data).unwrap();

    let chunks = block.value("chunks").unwrap().as_list().unwrap().clone();
    assert_eq!(chunks.len(), 3);

    // The registered chunk decoded into its schema.
    assert_eq!(block.value_at_path("chunks.0.value").unwrap(), &Value::Unsigned(0x1234));

    // The unregistered one kept its payload raw, and the empty one has no payload.
    match (&chunks[1], &chunks[2]) {
        (Value::Chunk(junk), Value::Chunk(null)) => {
            assert_eq!(junk.id(), &ChunkId::FourCC(*b"JUNK"));
            assert_eq!(junk.payload().as_ref().and_then(|slot| slot.raw()), Some(&[1u8, 2, 3][..]));
            assert_eq!(null.payload(), &None);
        },
        _ => panic!("expected chunks"),
    }

    assert_eq!(block.export_data().unwrap(), data);
}

/// A stream parses elements until the data runs out, and an empty region is an empty
/// sequence, not an error.
#[test]
fn test_stream_round_trip() {
    let schema = SchemaBuilder::new("Run")
        .field("entries", StreamField::new(&item_schema()))
        .build()
        .unwrap();

    let data = vec![1, 2, 3];
    let mut block = Block::from_bytes(&schema, &data).unwrap();
    assert_eq!(block.value("entries").unwrap().as_list().unwrap().len(), 3);
    assert_eq!(block.export_data().unwrap(), data);

    let mut empty = Block::from_bytes(&schema, &[]).unwrap();
    assert_eq!(empty.value("entries").unwrap().as_list().unwrap().len(), 0);
    assert_eq!(empty.export_data().unwrap(), vec![]);
}

/// A whole-block transform wraps the full image on both directions.
#[test]
fn test_block_transform() {
    let schema = SchemaBuilder::new("Wrapped")
        .field("value", NumericField::new(NumericKind::U16, Endianness::Little))
        .transform(Arc::new(XorTransform::new(&[0x42])))
        .build()
        .unwrap();

    let raw = vec![0x34 ^ 0x42, 0x12 ^ 0x42];
    let mut block = Block::from_bytes(&schema, &raw).unwrap();
    assert_eq!(block.value("value").unwrap(), &Value::Unsigned(0x1234));
    assert_eq!(block.export_data().unwrap(), raw);
}

/// A block behind a one-way transform imports fine but refuses to export.
#[test]
fn test_read_only_block() {
    let schema = SchemaBuilder::new("ReadOnly")
        .field("value", u8_field())
        .transform(Arc::new(OneWay))
        .build()
        .unwrap();

    let mut block = Block::from_bytes(&schema, &[7]).unwrap();
    assert_eq!(block.value("value").unwrap(), &Value::Unsigned(7));

    let error = block.export_data().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::TransformNotInvertible);
}

/// Field spans report where each field came from, and EndOffset references read them.
#[test]
fn test_spans() {
    let schema = SchemaBuilder::new("Spanned")
        .field("len", u8_field())
        .field("data", BytesField::with_length_ref(Ref::path("len")))
        .build()
        .unwrap();

    let block = Block::from_bytes(&schema, &[3, 0xAA, 0xBB, 0xCC]).unwrap();

    let span = block.span("data").unwrap();
    assert_eq!(span.offset(), 1);
    assert_eq!(span.size(), 3);
    assert_eq!(span.end(), 4);

    assert_eq!(block.evaluate(&Ref::end_offset("data")).unwrap(), Value::Unsigned(4));
}
