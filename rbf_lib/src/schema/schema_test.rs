//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module containing tests for the schema builder validation, so we don't break it.

use std::sync::Arc;

use crate::blocks::Block;
use crate::error::ErrorKind;
use crate::fields::FieldDescriptor;
use crate::fields::bits::BitsField;
use crate::fields::block::BlockField;
use crate::fields::bytes::BytesField;
use crate::fields::numeric::{Endianness, NumericField, NumericKind};
use crate::refs::Ref;
use crate::transforms::XorTransform;

use super::*;

fn u8_field() -> NumericField {
    NumericField::new(NumericKind::U8, Endianness::Little)
}

/// A schema cannot declare the same field twice.
#[test]
fn test_schema_duplicate_field() {
    let error = SchemaBuilder::new("Dup")
        .field("a", u8_field())
        .field("a", u8_field())
        .build()
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::SchemaError);
}

/// A reference to a sibling nobody declared is caught at build time.
#[test]
fn test_schema_unknown_ref() {
    let error = SchemaBuilder::new("Unknown")
        .field("data", BytesField::with_length_ref(Ref::path("nope")))
        .build()
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::SchemaError);
}

/// Self and forward references in offsets/counts are the cyclic case: they cannot
/// resolve while parsing, so they're load-time errors.
#[test]
fn test_schema_cyclic_ref() {
    let error = SchemaBuilder::new("SelfRef")
        .field("data", BytesField::with_length_ref(Ref::path("data")))
        .build()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CyclicRef);

    let error = SchemaBuilder::new("ForwardRef")
        .field("data", BytesField::with_length_ref(Ref::path("len")))
        .field("len", u8_field())
        .build()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CyclicRef);
}

/// A field that consumes until the end of the buffer can only close the schema.
#[test]
fn test_schema_stream_not_last() {
    let error = SchemaBuilder::new("Greedy")
        .field("rest", BytesField::streaming())
        .field("tail", u8_field())
        .build()
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::SchemaError);
}

/// Bit groups with overlapping or out-of-storage masks are illegal.
#[test]
fn test_schema_bits_masks() {
    let error = SchemaBuilder::new("Overlap")
        .field("flags", BitsField::new(1, Endianness::Little).with_field("a", 0x03).with_field("b", 0x02))
        .build()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::SchemaError);

    let error = SchemaBuilder::new("OutOfStorage")
        .field("flags", BitsField::new(1, Endianness::Little).with_field("a", 0x100))
        .build()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::SchemaError);

    // A flag must be a single bit.
    let error = SchemaBuilder::new("WideFlag")
        .field("flags", BitsField::new(1, Endianness::Little).with_flag("a", 0x03))
        .build()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::SchemaError);
}

/// A transformed field with no way to size its raw window is illegal.
#[test]
fn test_schema_transform_needs_region() {
    let error = SchemaBuilder::new("NoRegion")
        .field("value", FieldDescriptor::new(u8_field()).with_transform(Arc::new(XorTransform::new(&[0x5A]))))
        .build()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::SchemaError);

    // With an explicit region it's fine.
    assert!(SchemaBuilder::new("Region")
        .field("value", FieldDescriptor::new(u8_field()).with_region(1).with_transform(Arc::new(XorTransform::new(&[0x5A]))))
        .build()
        .is_ok());
}

/// A schema using `_parent` refuses to parse as a root, but works nested.
#[test]
fn test_schema_parent_at_root() {
    let child = SchemaBuilder::new("Child")
        .field("data", BytesField::with_length_ref(Ref::path("_parent.len")))
        .build()
        .unwrap();

    let error = Block::from_bytes(&child, &[1, 2, 3]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::SchemaError);

    let parent = SchemaBuilder::new("Parent")
        .field("len", u8_field())
        .field("child", BlockField::single(&child))
        .build()
        .unwrap();

    let block = Block::from_bytes(&parent, &[3, 0xAA, 0xBB, 0xCC]).unwrap();
    assert_eq!(block.value_at_path("child.data").unwrap(), &crate::value::Value::Bytes(vec![0xAA, 0xBB, 0xCC]));
}
