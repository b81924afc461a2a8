//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module containing tests for the checks, so we don't break them.

use std::sync::Arc;

use crate::blocks::{Block, Scope};
use crate::error::ErrorKind;
use crate::fields::bytes::BytesField;
use crate::fields::numeric::{Endianness, NumericField, NumericKind};
use crate::schema::{Schema, SchemaBuilder};

use super::*;

/// This builds the little payload-plus-counter schema most of these tests run on.
fn checksum_schema(counter: NumericKind) -> Arc<Schema> {
    SchemaBuilder::new("Checksummed")
        .field("payload", BytesField::new(4))
        .field("counter", NumericField::new(counter, Endianness::Little))
        .build()
        .unwrap()
}

/// Test for MagicCheck: verify both ways, then restamp.
#[test]
fn test_check_magic() {
    let schema = checksum_schema(NumericKind::U8);
    let data = vec![b'V', b'R', b'N', b'T', 0];
    let block = Block::from_bytes(&schema, &data).unwrap();
    let scope = Scope::root(&block);

    let check = MagicCheck::new(0, b"VRNT");
    assert!(check.verify(&scope, &data).is_ok());

    let check_bad = MagicCheck::new(0, b"PACK");
    let error = check_bad.verify(&scope, &data).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CheckFailed);

    // Fixup must stamp the magic back in.
    let mut mangled = vec![0, 0, 0, 0, 0];
    check.fixup(&scope, &mut mangled).unwrap();
    assert_eq!(&mangled[..4], b"VRNT");
}

/// Test for SumCheck: a modular sum of the payload, stored in a one-byte counter.
#[test]
fn test_check_sum() {
    let schema = checksum_schema(NumericKind::U8);
    let check = SumCheck::new("payload", "counter");

    let data = vec![1, 2, 3, 4, 10];
    let block = Block::from_bytes(&schema, &data).unwrap();
    assert!(check.verify(&Scope::root(&block), &data).is_ok());

    let bad = vec![1, 2, 3, 4, 9];
    let block_bad = Block::from_bytes(&schema, &bad).unwrap();
    let error = check.verify(&Scope::root(&block_bad), &bad).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CheckFailed);

    // Fixup must recompute the sum from the current payload bytes.
    let mut mutated = vec![1, 2, 3, 5, 10];
    let block_mutated = Block::from_bytes(&schema, &[1, 2, 3, 5, 11]).unwrap();
    check.fixup(&Scope::root(&block_mutated), &mut mutated).unwrap();
    assert_eq!(mutated, vec![1, 2, 3, 5, 11]);

    // The sum must wrap, not overflow.
    let wrapped = vec![200, 200, 0, 0, 144];
    let block_wrapped = Block::from_bytes(&schema, &wrapped).unwrap();
    assert!(check.verify(&Scope::root(&block_wrapped), &wrapped).is_ok());
}

/// Test for Crc32Check: CRC-32 of the payload, stored in an u32 counter.
#[test]
fn test_check_crc32() {
    let schema = checksum_schema(NumericKind::U32);
    let check = Crc32Check::new("payload", "counter", Endianness::Little);

    let payload = [0xAA, 0xBB, 0xCC, 0xDD];
    let crc = crc_fast::checksum(crc_fast::CrcAlgorithm::Crc32IsoHdlc, &payload) as u32;

    let mut data = payload.to_vec();
    data.extend_from_slice(&crc.to_le_bytes());

    let block = Block::from_bytes(&schema, &data).unwrap();
    assert!(check.verify(&Scope::root(&block), &data).is_ok());

    // A stale checksum fails the verify and gets rewritten by the fixup.
    let mut stale = payload.to_vec();
    stale.extend_from_slice(&[0, 0, 0, 0]);

    let block_stale = Block::from_bytes(&schema, &stale).unwrap();
    assert_eq!(check.verify(&Scope::root(&block_stale), &stale).unwrap_err().kind(), ErrorKind::CheckFailed);

    check.fixup(&Scope::root(&block_stale), &mut stale).unwrap();
    assert_eq!(stale, data);
}

/// Test for FillCheck: a region that must repeat its pattern.
#[test]
fn test_check_fill() {
    let schema = checksum_schema(NumericKind::U8);
    let data = vec![0xCD, 0xCD, 0xCD, 0xCD, 0];
    let block = Block::from_bytes(&schema, &data).unwrap();
    let scope = Scope::root(&block);

    let check = FillCheck::new(0, 4, &[0xCD]);
    assert!(check.verify(&scope, &data).is_ok());

    let dirty = vec![0xCD, 0xCD, 0x00, 0xCD, 0];
    assert_eq!(check.verify(&scope, &dirty).unwrap_err().kind(), ErrorKind::CheckFailed);

    let mut restored = dirty;
    check.fixup(&scope, &mut restored).unwrap();
    assert_eq!(restored, data);
}
