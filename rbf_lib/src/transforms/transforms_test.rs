//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module containing tests for the transforms, so we don't break them.

use crate::error::{ErrorKind, Result};

use super::*;

/// A transform with no reverse direction, for the read-only path.
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

/// XOR must be its own inverse, and only touch the bytes it covers.
#[test]
fn test_transform_xor() {
    let transform = XorTransform::new(&[0x5A, 0xA5]);
    let ctx = TransformCtx::new();

    let plain = b"The quick brown fox".to_vec();
    let raw = transform.reverse(&plain, &ctx).unwrap();
    assert_ne!(raw, plain);
    assert_eq!(transform.forward(&raw, &ctx).unwrap(), plain);

    // Applying the same direction twice is the identity.
    assert_eq!(transform.forward(&transform.forward(&plain, &ctx).unwrap(), &ctx).unwrap(), plain);
}

/// LZ4 must round-trip through both the size-prepended and the headerless paths.
#[test]
fn test_transform_lz4() {
    let transform = Lz4Transform;
    let plain = vec![7u8; 512];

    // Size-prepended path.
    let ctx = TransformCtx::new();
    let raw = transform.reverse(&plain, &ctx).unwrap();
    assert_eq!(transform.forward(&raw, &ctx).unwrap(), plain);

    // Headerless path, with the decoded length declared by the schema.
    let ctx = TransformCtx::with_output_len(plain.len());
    let raw = transform.reverse(&plain, &ctx).unwrap();
    assert_eq!(transform.forward(&raw, &ctx).unwrap(), plain);
}

/// Zstd must round-trip.
#[test]
fn test_transform_zstd() {
    let transform = ZstdTransform::default();
    let ctx = TransformCtx::new();

    let plain = b"wahahahawahahahawahahaha".repeat(32);
    let raw = transform.reverse(&plain, &ctx).unwrap();
    assert_eq!(transform.forward(&raw, &ctx).unwrap(), plain);
}

/// LZMA1 must round-trip.
#[test]
fn test_transform_lzma() {
    let transform = LzmaTransform;
    let ctx = TransformCtx::new();

    let plain = b"wahahahawahahahawahahaha".repeat(32);
    let raw = transform.reverse(&plain, &ctx).unwrap();
    assert_eq!(transform.forward(&raw, &ctx).unwrap(), plain);
}

/// Garbage input must fail to decode, not panic.
#[test]
fn test_transform_garbage_input() {
    let ctx = TransformCtx::new();
    assert!(Lz4Transform.forward(&[0x04, 0x00, 0x00, 0x00, 0xFF], &ctx).is_err());
    assert!(ZstdTransform::default().forward(&[0xFF; 4], &ctx).is_err());
}

/// A transform without a reverse direction must refuse to encode.
#[test]
fn test_transform_one_way() {
    let transform = OneWay;
    assert!(!transform.is_invertible());

    let error = transform.reverse(&[1, 2, 3], &TransformCtx::new()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::TransformNotInvertible);
}
