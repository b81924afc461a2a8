//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the code to apply reversible byte-level transforms to block regions.
//!
//! A [`Transform`] bridges the bytes as stored in the file ("raw") and the bytes the schema
//! actually describes ("decoded"): compression layers, XOR obfuscation, and similar wrappers
//! proprietary formats like to pile on top of their real data.
//!
//! `forward` runs on import (raw -> decoded) and `reverse` runs on export (decoded -> raw).
//! A transform without a reverse direction makes any block using it read-only: importing
//! works fine, but exporting fails with a [`TransformNotInvertible`](crate::error::ErrorKind::TransformNotInvertible)
//! error.
//!
//! The compression transforms here cover the formats we've found on real games so far:
//! LZ4, Zstd and plain LZMA1 streams.

use getset::CopyGetters;

use std::fmt::Debug;

use crate::error::{RLibError, Result};

#[cfg(test)] mod transforms_test;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This struct contains the extra data a transform may need to do its job.
#[derive(Clone, Copy, Debug, Default, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct TransformCtx {

    /// Declared length of the decoded data, if the schema knows it.
    ///
    /// Compression transforms use it to decode headerless streams.
    output_len: Option<usize>,
}

/// This transform XORs every byte with a repeating key. Its own inverse.
#[derive(Clone, Debug)]
pub struct XorTransform {
    key: Vec<u8>,
}

/// This transform decompresses/compresses LZ4 block data.
///
/// If the schema declares the decoded length, the data is treated as a headerless LZ4
/// block. Otherwise we expect the lz4_flex convention of the uncompressed size prepended
/// as an u32 before the compressed data.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lz4Transform;

/// This transform decompresses/compresses Zstd data.
#[derive(Clone, Copy, Debug)]
pub struct ZstdTransform {
    level: i32,
}

/// This transform decompresses/compresses LZMA1 (LZMA Alone) streams.
#[derive(Clone, Copy, Debug, Default)]
pub struct LzmaTransform;

//---------------------------------------------------------------------------//
//                           Trait Definitions
//---------------------------------------------------------------------------//

/// A reversible codec over a byte region.
///
/// Implementors must be pure: same input, same output, no state.
pub trait Transform: Debug + Send + Sync {

    /// Name of the transform, for diagnostics.
    fn name(&self) -> &str;

    /// Import direction: bytes as stored in the file to the bytes the schema describes.
    fn forward(&self, data: &[u8], ctx: &TransformCtx) -> Result<Vec<u8>>;

    /// Export direction: bytes the schema describes back to their stored form.
    ///
    /// The default marks the transform as one-way.
    fn reverse(&self, data: &[u8], ctx: &TransformCtx) -> Result<Vec<u8>> {
        let _ = (data, ctx);
        Err(RLibError::TransformNotInvertibleError(self.name().to_owned()))
    }

    /// Whether the transform has a reverse direction.
    ///
    /// One-way transforms must override this to return false, so exports can fail
    /// before any data is written.
    fn is_invertible(&self) -> bool {
        true
    }
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `TransformCtx`.
impl TransformCtx {

    /// This function builds an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// This function builds a context with a declared decoded length.
    pub fn with_output_len(output_len: usize) -> Self {
        Self { output_len: Some(output_len) }
    }
}

/// Implementation of `XorTransform`.
impl XorTransform {

    /// This function builds a XOR transform from a repeating key.
    ///
    /// An empty key is treated as a single 00 byte, which makes the transform a no-op.
    pub fn new(key: &[u8]) -> Self {
        let key = if key.is_empty() { vec![0] } else { key.to_vec() };
        Self { key }
    }

    fn apply(&self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .enumerate()
            .map(|(index, byte)| byte ^ self.key[index % self.key.len()])
            .collect()
    }
}

impl Transform for XorTransform {
    fn name(&self) -> &str {
        "XOR"
    }

    fn forward(&self, data: &[u8], _ctx: &TransformCtx) -> Result<Vec<u8>> {
        Ok(self.apply(data))
    }

    fn reverse(&self, data: &[u8], _ctx: &TransformCtx) -> Result<Vec<u8>> {
        Ok(self.apply(data))
    }
}

impl Transform for Lz4Transform {
    fn name(&self) -> &str {
        "LZ4"
    }

    fn forward(&self, data: &[u8], ctx: &TransformCtx) -> Result<Vec<u8>> {
        match ctx.output_len() {
            Some(output_len) => lz4_flex::block::decompress(data, output_len)
                .map_err(|error| RLibError::TransformDecodeError(self.name().to_owned(), error.to_string())),
            None => lz4_flex::block::decompress_size_prepended(data)
                .map_err(|error| RLibError::TransformDecodeError(self.name().to_owned(), error.to_string())),
        }
    }

    fn reverse(&self, data: &[u8], ctx: &TransformCtx) -> Result<Vec<u8>> {
        match ctx.output_len() {
            Some(_) => Ok(lz4_flex::block::compress(data)),
            None => Ok(lz4_flex::block::compress_prepend_size(data)),
        }
    }
}

/// Implementation of `ZstdTransform`.
impl ZstdTransform {

    /// This function builds a Zstd transform with the provided compression level.
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdTransform {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl Transform for ZstdTransform {
    fn name(&self) -> &str {
        "Zstd"
    }

    fn forward(&self, data: &[u8], _ctx: &TransformCtx) -> Result<Vec<u8>> {
        zstd::stream::decode_all(data)
            .map_err(|error| RLibError::TransformDecodeError(self.name().to_owned(), error.to_string()))
    }

    fn reverse(&self, data: &[u8], _ctx: &TransformCtx) -> Result<Vec<u8>> {
        zstd::stream::encode_all(data, self.level)
            .map_err(|error| RLibError::TransformEncodeError(self.name().to_owned(), error.to_string()))
    }
}

impl Transform for LzmaTransform {
    fn name(&self) -> &str {
        "LZMA1"
    }

    fn forward(&self, data: &[u8], _ctx: &TransformCtx) -> Result<Vec<u8>> {
        let mut input = data;
        let mut output = vec![];
        lzma_rs::lzma_decompress(&mut input, &mut output)
            .map_err(|error| RLibError::TransformDecodeError(self.name().to_owned(), format!("{error:?}")))?;

        Ok(output)
    }

    fn reverse(&self, data: &[u8], _ctx: &TransformCtx) -> Result<Vec<u8>> {
        let mut input = data;
        let mut output = vec![];
        lzma_rs::lzma_compress(&mut input, &mut output)
            .map_err(|error| RLibError::TransformEncodeError(self.name().to_owned(), format!("{error:?}")))?;

        Ok(output)
    }
}
