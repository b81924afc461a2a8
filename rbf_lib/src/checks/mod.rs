//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the code to validate and rewrite block regions on import/export.
//!
//! A [`Check`] has two hooks: `verify` runs after a block is parsed and fails the import
//! if the data breaks the invariant (a wrong magic number, a bad checksum, a dirty fill
//! region). `fixup` runs while a block is exported and rewrites the region so the
//! invariant holds again (a checksum recomputed from the mutated payload, the magic
//! stamped back in). A check without a fixup just re-verifies on export.
//!
//! Check failures on import are never recovered silently: they surface to the caller
//! with the offset they happened at.

use std::fmt::Debug;

use crate::blocks::Scope;
use crate::error::{RLibError, Result};
use crate::fields::numeric::Endianness;

#[cfg(test)] mod checks_test;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This check asserts a fixed byte pattern at a fixed offset, usually a magic number.
///
/// On export, the pattern is stamped back in.
#[derive(Clone, Debug)]
pub struct MagicCheck {
    offset: u64,
    magic: Vec<u8>,
}

/// This check asserts that a one-byte counter field holds the modular sum of a payload field.
///
/// On export, the sum is recomputed from the current payload bytes.
#[derive(Clone, Debug)]
pub struct SumCheck {
    payload: String,
    counter: String,
}

/// This check asserts that an u32 counter field holds the CRC-32 (ISO-HDLC) of a payload field.
///
/// On export, the checksum is recomputed from the current payload bytes.
#[derive(Clone, Debug)]
pub struct Crc32Check {
    payload: String,
    counter: String,
    endian: Endianness,
}

/// This check asserts that a region repeats a fill pattern.
///
/// On export, the pattern is restored over the whole region.
#[derive(Clone, Debug)]
pub struct FillCheck {
    offset: u64,
    length: u64,
    pattern: Vec<u8>,
}

//---------------------------------------------------------------------------//
//                           Trait Definitions
//---------------------------------------------------------------------------//

/// A verify-on-import / rewrite-on-export invariant attached to a block.
pub trait Check: Debug + Send + Sync {

    /// Name of the check, for diagnostics.
    fn name(&self) -> &str;

    /// This hook runs after a block is parsed, over the block's source bytes.
    fn verify(&self, scope: &Scope, data: &[u8]) -> Result<()>;

    /// This hook runs while a block is exported, and may rewrite the buffer.
    ///
    /// The default just re-verifies, so a check without a rewrite asserts its
    /// invariant still holds on export.
    fn fixup(&self, scope: &Scope, data: &mut Vec<u8>) -> Result<()> {
        self.verify(scope, data)
    }
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// This function returns the bytes of a region, or a short-buffer error.
fn region(data: &[u8], offset: u64, size: u64) -> Result<&[u8]> {
    let start = offset as usize;
    let end = start + size as usize;
    if end > data.len() {
        return Err(RLibError::NotEnoughBytesError(end as u64, data.len() as u64));
    }

    Ok(&data[start..end])
}

/// This function makes sure a buffer is big enough to hold a region, growing it zero-filled if not.
fn reserve(data: &mut Vec<u8>, offset: u64, size: u64) {
    let end = offset as usize + size as usize;
    if data.len() < end {
        data.resize(end, 0);
    }
}

/// Implementation of `MagicCheck`.
impl MagicCheck {

    /// This function builds a magic check from the offset and the expected bytes.
    pub fn new(offset: u64, magic: &[u8]) -> Self {
        Self { offset, magic: magic.to_vec() }
    }
}

impl Check for MagicCheck {
    fn name(&self) -> &str {
        "Magic"
    }

    fn verify(&self, _scope: &Scope, data: &[u8]) -> Result<()> {
        let found = region(data, self.offset, self.magic.len() as u64)?;
        if found != self.magic {
            return Err(RLibError::CheckFailedError(self.name().to_owned(), self.offset));
        }

        Ok(())
    }

    fn fixup(&self, _scope: &Scope, data: &mut Vec<u8>) -> Result<()> {
        reserve(data, self.offset, self.magic.len() as u64);

        let start = self.offset as usize;
        data[start..start + self.magic.len()].copy_from_slice(&self.magic);
        Ok(())
    }
}

/// Implementation of `SumCheck`.
impl SumCheck {

    /// This function builds a sum check from the payload field and the counter field.
    pub fn new(payload: &str, counter: &str) -> Self {
        Self { payload: payload.to_owned(), counter: counter.to_owned() }
    }

    fn compute(&self, scope: &Scope, data: &[u8]) -> Result<(u8, u64)> {
        let payload_span = scope.span(&self.payload)?;
        let counter_span = scope.span(&self.counter)?;

        let payload = region(data, payload_span.offset(), payload_span.size())?;
        let sum = payload.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte));
        Ok((sum, counter_span.offset()))
    }
}

impl Check for SumCheck {
    fn name(&self) -> &str {
        "Sum"
    }

    fn verify(&self, scope: &Scope, data: &[u8]) -> Result<()> {
        let (sum, counter_offset) = self.compute(scope, data)?;
        let found = region(data, counter_offset, 1)?[0];
        if found != sum {
            return Err(RLibError::CheckFailedError(self.name().to_owned(), counter_offset));
        }

        Ok(())
    }

    fn fixup(&self, scope: &Scope, data: &mut Vec<u8>) -> Result<()> {
        let (sum, counter_offset) = self.compute(scope, data)?;
        reserve(data, counter_offset, 1);
        data[counter_offset as usize] = sum;
        Ok(())
    }
}

/// Implementation of `Crc32Check`.
impl Crc32Check {

    /// This function builds a CRC-32 check from the payload field and the counter field.
    pub fn new(payload: &str, counter: &str, endian: Endianness) -> Self {
        Self { payload: payload.to_owned(), counter: counter.to_owned(), endian }
    }

    fn compute(&self, scope: &Scope, data: &[u8]) -> Result<([u8; 4], u64)> {
        let payload_span = scope.span(&self.payload)?;
        let counter_span = scope.span(&self.counter)?;

        let payload = region(data, payload_span.offset(), payload_span.size())?;
        let crc = crc_fast::checksum(crc_fast::CrcAlgorithm::Crc32IsoHdlc, payload) as u32;
        let bytes = match self.endian {
            Endianness::Little => crc.to_le_bytes(),
            Endianness::Big => crc.to_be_bytes(),
        };

        Ok((bytes, counter_span.offset()))
    }
}

impl Check for Crc32Check {
    fn name(&self) -> &str {
        "CRC-32"
    }

    fn verify(&self, scope: &Scope, data: &[u8]) -> Result<()> {
        let (crc, counter_offset) = self.compute(scope, data)?;
        let found = region(data, counter_offset, 4)?;
        if found != crc {
            return Err(RLibError::CheckFailedError(self.name().to_owned(), counter_offset));
        }

        Ok(())
    }

    fn fixup(&self, scope: &Scope, data: &mut Vec<u8>) -> Result<()> {
        let (crc, counter_offset) = self.compute(scope, data)?;
        reserve(data, counter_offset, 4);

        let start = counter_offset as usize;
        data[start..start + 4].copy_from_slice(&crc);
        Ok(())
    }
}

/// Implementation of `FillCheck`.
impl FillCheck {

    /// This function builds a fill check over a region and its expected pattern.
    pub fn new(offset: u64, length: u64, pattern: &[u8]) -> Self {
        let pattern = if pattern.is_empty() { vec![0] } else { pattern.to_vec() };
        Self { offset, length, pattern }
    }
}

impl Check for FillCheck {
    fn name(&self) -> &str {
        "Fill"
    }

    fn verify(&self, _scope: &Scope, data: &[u8]) -> Result<()> {
        let found = region(data, self.offset, self.length)?;
        let dirty = found.iter()
            .enumerate()
            .any(|(index, byte)| *byte != self.pattern[index % self.pattern.len()]);

        if dirty {
            return Err(RLibError::CheckFailedError(self.name().to_owned(), self.offset));
        }

        Ok(())
    }

    fn fixup(&self, _scope: &Scope, data: &mut Vec<u8>) -> Result<()> {
        reserve(data, self.offset, self.length);

        let start = self.offset as usize;
        for index in 0..self.length as usize {
            data[start + index] = self.pattern[index % self.pattern.len()];
        }

        Ok(())
    }
}
