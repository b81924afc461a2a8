//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module containing tests for the field descriptors, so we don't break them.

use std::sync::Arc;

use crate::blocks::{Block, ParseState, Scope};
use crate::error::ErrorKind;
use crate::schema::SchemaBuilder;
use crate::transforms::XorTransform;
use crate::value::Value;

use super::*;
use super::bits::BitsField;
use super::bytes::BytesField;
use super::numeric::{Endianness, NumericField, NumericKind};
use super::string::{StringField, TextEncoding};

/// Most field kinds don't care about their block: this gives them an empty one to sit on.
fn dummy_block() -> Block {
    Block::new(&SchemaBuilder::new("Dummy").build().unwrap())
}

/// Test for the numeric field kind: values decode and reencode identical in both endiannesses.
#[test]
fn test_field_numeric_round_trip() {
    let cases: Vec<(NumericField, Vec<u8>, Value)> = vec![
        (NumericField::new(NumericKind::Bool, Endianness::Little), vec![1], Value::Bool(true)),
        (NumericField::new(NumericKind::U8, Endianness::Little), vec![0xAB], Value::Unsigned(0xAB)),
        (NumericField::new(NumericKind::U16, Endianness::Big), vec![0x01, 0x02], Value::Unsigned(258)),
        (NumericField::new(NumericKind::U24, Endianness::Little), vec![152, 150, 129], Value::Unsigned(8_492_696)),
        (NumericField::new(NumericKind::U32, Endianness::Little), vec![10, 0, 0, 0], Value::Unsigned(10)),
        (NumericField::new(NumericKind::U64, Endianness::Big), vec![0, 0, 0, 0, 0, 0, 1, 2], Value::Unsigned(258)),
        (NumericField::new(NumericKind::I16, Endianness::Little), vec![254, 254], Value::Signed(-258)),
        (NumericField::new(NumericKind::I32, Endianness::Big), vec![255, 255, 254, 254], Value::Signed(-258)),
        (NumericField::new(NumericKind::F32, Endianness::Little), vec![0, 0, 32, 65], Value::Float(10.0)),
        (NumericField::new(NumericKind::F64, Endianness::Big), vec![64, 36, 0, 0, 0, 0, 0, 0], Value::Float(10.0)),
        (NumericField::new(NumericKind::Uleb128, Endianness::Little), vec![0x85, 0x01], Value::Unsigned(133)),
    ];

    for (field, data, expected) in cases {
        let (value, consumed) = field.decode(&data, 0).unwrap();
        assert_eq!(value, expected);
        assert_eq!(consumed, data.len() as u64);
        assert_eq!(field.encode(&value).unwrap(), data);
    }
}

/// Test for the numeric field kind: out-of-range imports are constraint violations.
#[test]
fn test_field_numeric_range() {
    let field = NumericField::new(NumericKind::U16, Endianness::Big).with_range(0, 250);

    let error = field.decode(&[0x00, 0xFB], 0).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ConstraintViolation);

    assert!(field.decode(&[0x00, 0xFA], 0).is_ok());

    // The allowed-set flavour.
    let field = NumericField::new(NumericKind::U8, Endianness::Little).with_allowed(&[1, 2, 4]);
    assert!(field.decode(&[2], 0).is_ok());
    assert_eq!(field.decode(&[3], 0).unwrap_err().kind(), ErrorKind::ConstraintViolation);
}

/// Test for the numeric field kind: values that don't fit the width are encode errors.
#[test]
fn test_field_numeric_overflow() {
    let field = NumericField::new(NumericKind::U8, Endianness::Little);
    let error = field.encode(&Value::Unsigned(300)).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::EncodeError);

    let field = NumericField::new(NumericKind::I16, Endianness::Little);
    assert_eq!(field.encode(&Value::Signed(40_000)).unwrap_err().kind(), ErrorKind::EncodeError);

    // The wrong value shape is an encode error too.
    let field = NumericField::new(NumericKind::U8, Endianness::Little);
    assert_eq!(field.encode(&Value::String("nope".to_owned())).unwrap_err().kind(), ErrorKind::EncodeError);
}

/// Test for the bytes field kind: fixed, streaming and aligned runs.
#[test]
fn test_field_bytes() {
    let block = dummy_block();
    let scope = Scope::root(&block);

    // Fixed run.
    let field = BytesField::new(4);
    let data = vec![1, 2, 3, 4, 5];
    let (value, consumed) = field.decode(&data, 0, &scope).unwrap();
    assert_eq!(value, Value::Bytes(vec![1, 2, 3, 4]));
    assert_eq!(consumed, 4);

    // A fixed run refuses values of the wrong size.
    assert_eq!(field.encode(&Value::Bytes(vec![1, 2])).unwrap_err().kind(), ErrorKind::EncodeError);

    // Streaming run: whatever is left.
    let field = BytesField::streaming();
    let (value, consumed) = field.decode(&data, 2, &scope).unwrap();
    assert_eq!(value, Value::Bytes(vec![3, 4, 5]));
    assert_eq!(consumed, 3);

    // Aligned run: consumes and writes up to the next multiple.
    let field = BytesField::new(5).with_alignment(4).with_fill(0xFF);
    let data = vec![1, 2, 3, 4, 5, 0xFF, 0xFF, 0xFF];
    let (value, consumed) = field.decode(&data, 0, &scope).unwrap();
    assert_eq!(value, Value::Bytes(vec![1, 2, 3, 4, 5]));
    assert_eq!(consumed, 8);
    assert_eq!(field.encode(&value).unwrap(), data);

    // Not enough bytes is a short-buffer error.
    let field = BytesField::new(16);
    assert_eq!(field.decode(&data, 0, &scope).unwrap_err().kind(), ErrorKind::ShortBuffer);
}

/// Test for the string field kind, in its three layouts.
#[test]
fn test_field_string() {
    let block = dummy_block();
    let scope = Scope::root(&block);

    // Fixed 00-padded region.
    let field = StringField::fixed(TextEncoding::Utf8, 8);
    let data = b"Waha\0\0\0\0".to_vec();
    let (value, consumed) = field.decode(&data, 0, &scope).unwrap();
    assert_eq!(value, Value::String("Waha".to_owned()));
    assert_eq!(consumed, 8);
    assert_eq!(field.encode(&value, &scope).unwrap(), data);

    // A value too long for the region is an encode error.
    let oversize = Value::String("Wahahahaha".to_owned());
    assert_eq!(field.encode(&oversize, &scope).unwrap_err().kind(), ErrorKind::EncodeError);

    // Terminated, with a max length.
    let field = StringField::terminated(TextEncoding::Utf8).with_max_length(8);
    let data = b"Waha\0rest".to_vec();
    let (value, consumed) = field.decode(&data, 0, &scope).unwrap();
    assert_eq!(value, Value::String("Waha".to_owned()));
    assert_eq!(consumed, 5);

    // No terminator within the bound is a decode error.
    let unterminated = b"Wahahahahaha".to_vec();
    assert_eq!(field.decode(&unterminated, 0, &scope).unwrap_err().kind(), ErrorKind::DecodeError);

    // Size-prefixed, UTF-16, where the prefix counts characters.
    let field = StringField::size_prefixed(TextEncoding::Utf16Le, IntWidth::U16, Endianness::Little);
    let data = vec![4, 0, 87, 0, 97, 0, 104, 0, 97, 0];
    let (value, consumed) = field.decode(&data, 0, &scope).unwrap();
    assert_eq!(value, Value::String("Waha".to_owned()));
    assert_eq!(consumed, 10);
    assert_eq!(field.encode(&value, &scope).unwrap(), data);

    // ISO-8859-15 survives bytes plain UTF-8 would reject.
    let field = StringField::fixed(TextEncoding::Iso8859_15, 4);
    let data = vec![87, 97, 255, 0];
    let (value, _) = field.decode(&data, 0, &scope).unwrap();
    assert_eq!(value, Value::String("Waÿ".to_owned()));
    assert_eq!(field.encode(&value, &scope).unwrap(), data);
}

/// Test for the bits field kind: masks, flags, enums and the residue entry.
#[test]
fn test_field_bits() {
    let field = BitsField::new(1, Endianness::Little)
        .with_flag("compressed", 0x01)
        .with_field("level", 0x06)
        .with_enum("mode", 0x18, &[0, 1, 2]);

    // 0b1010_1011: compressed=1, level=0b01, mode=0b01, residue=0b1010_0000.
    let data = vec![0xAB];
    let (value, consumed) = field.decode(&data, 0).unwrap();
    assert_eq!(consumed, 1);

    let entries = match &value {
        Value::Group(entries) => entries,
        _ => panic!("expected a group"),
    };

    assert_eq!(entries[0], ("compressed".to_owned(), Value::Bool(true)));
    assert_eq!(entries[1], ("level".to_owned(), Value::Unsigned(1)));
    assert_eq!(entries[2], ("mode".to_owned(), Value::Unsigned(1)));
    assert_eq!(entries[3], (super::bits::RESIDUE.to_owned(), Value::Unsigned(0xA0)));

    // The whole storage unit round-trips, undeclared bits included.
    assert_eq!(field.encode(&value).unwrap(), data);

    // An enum value outside the allowed set fails the import.
    let bad = vec![0x18];
    assert_eq!(field.decode(&bad, 0).unwrap_err().kind(), ErrorKind::ConstraintViolation);

    // A value too wide for its mask is an encode error.
    let value = Value::Group(vec![
        ("compressed".to_owned(), Value::Bool(false)),
        ("level".to_owned(), Value::Unsigned(9)),
        ("mode".to_owned(), Value::Unsigned(0)),
    ]);
    assert_eq!(field.encode(&value).unwrap_err().kind(), ErrorKind::EncodeError);
}

/// Test for a per-field transform: the raw window decodes through it and reencodes back.
#[test]
fn test_field_transform() {
    let block = dummy_block();
    let scope = Scope::root(&block);
    let mut state = ParseState::default();

    let descriptor = FieldDescriptor::new(BytesField::new(4))
        .with_transform(Arc::new(XorTransform::new(&[0x5A])));

    let plain = [0x10u8, 0x20, 0x30, 0x40];
    let raw = plain.iter().map(|byte| byte ^ 0x5A).collect::<Vec<_>>();

    let (value, consumed) = descriptor.decode(&raw, 0, &scope, &mut state).unwrap();
    assert_eq!(value, Value::Bytes(plain.to_vec()));
    assert_eq!(consumed, 4);

    assert_eq!(descriptor.encode(&value, &scope).unwrap(), raw);
}
