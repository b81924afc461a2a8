//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the bit-packed group field kind.
//!
//! A bits group reads a small storage unit (1 to 8 bytes, explicit endianness) and
//! splits it into named sub-fields, each defined by a bit mask and a value domain:
//! plain unsigned, boolean, or an enum of allowed values.
//!
//! Bits not covered by any declared mask are kept in a reserved `_residue` entry, so
//! a group over a partially-reversed byte still round-trips exactly.

use getset::Getters;

use crate::error::{RLibError, Result};
use crate::fields::window;
use crate::fields::numeric::Endianness;
use crate::value::Value;

/// Name of the reserved entry holding the bits no declared mask covers.
pub const RESIDUE: &str = "_residue";

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This enum represents the value domain of one bit-masked sub-field.
#[derive(Clone, Debug, PartialEq)]
pub enum BitKind {

    /// Plain unsigned integer.
    Unsigned,

    /// Single-bit flag.
    Boolean,

    /// Unsigned integer restricted to a set of allowed values.
    Enum(Vec<u64>),
}

/// This struct describes one sub-field of a bits group.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct BitField {

    /// Name of the sub-field within the group.
    name: String,

    /// Mask selecting the sub-field's bits within the storage unit.
    mask: u64,

    /// Value domain of the sub-field.
    kind: BitKind,
}

/// This struct describes one bit-packed group field.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct BitsField {

    /// Size of the storage unit, in bytes (1-8).
    storage: u8,

    /// Byte order of the storage unit.
    endian: Endianness,

    /// Declared sub-fields, in declaration order.
    fields: Vec<BitField>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `BitsField`.
impl BitsField {

    /// This function builds an empty bits group over a storage unit of `storage` bytes.
    pub fn new(storage: u8, endian: Endianness) -> Self {
        Self {
            storage: storage.clamp(1, 8),
            endian,
            fields: vec![],
        }
    }

    /// This function declares a plain unsigned sub-field under the provided mask.
    pub fn with_field(mut self, name: &str, mask: u64) -> Self {
        self.fields.push(BitField { name: name.to_owned(), mask, kind: BitKind::Unsigned });
        self
    }

    /// This function declares a single-bit flag under the provided mask.
    pub fn with_flag(mut self, name: &str, mask: u64) -> Self {
        self.fields.push(BitField { name: name.to_owned(), mask, kind: BitKind::Boolean });
        self
    }

    /// This function declares an enum sub-field under the provided mask.
    pub fn with_enum(mut self, name: &str, mask: u64, allowed: &[u64]) -> Self {
        self.fields.push(BitField { name: name.to_owned(), mask, kind: BitKind::Enum(allowed.to_vec()) });
        self
    }

    /// This function checks the group's masks are legal. Used when building schemas.
    pub(crate) fn validate(&self, field_name: &str) -> Result<()> {
        let storage_mask = if self.storage == 8 { u64::MAX } else { (1u64 << (self.storage as u32 * 8)) - 1 };
        let mut seen = 0u64;

        for field in &self.fields {
            let bad_mask = field.mask == 0
                || field.mask & !storage_mask != 0
                || field.mask & seen != 0
                || (field.kind == BitKind::Boolean && field.mask.count_ones() != 1);

            if bad_mask {
                return Err(RLibError::SchemaBitsInvalidMaskError(field_name.to_owned(), field.name.to_owned()));
            }

            seen |= field.mask;
        }

        Ok(())
    }

    /// This function decodes the group from `data` at `offset`.
    pub(crate) fn decode(&self, data: &[u8], offset: u64) -> Result<(Value, u64)> {
        let region = window(data, offset, self.storage as u64)?;

        let mut raw_bytes = [0u8; 8];
        let raw = match self.endian {
            Endianness::Little => {
                raw_bytes[..self.storage as usize].copy_from_slice(region);
                u64::from_le_bytes(raw_bytes)
            },
            Endianness::Big => {
                raw_bytes[8 - self.storage as usize..].copy_from_slice(region);
                u64::from_be_bytes(raw_bytes)
            },
        };

        let mut entries = vec![];
        let mut covered = 0u64;

        for field in &self.fields {
            let bits = (raw & field.mask) >> field.mask.trailing_zeros();
            covered |= field.mask;

            let value = match &field.kind {
                BitKind::Unsigned => Value::Unsigned(bits),
                BitKind::Boolean => Value::Bool(bits != 0),
                BitKind::Enum(allowed) => {
                    if !allowed.contains(&bits) {
                        return Err(RLibError::ValueNotAllowedError(bits.to_string(), format!("{allowed:?}")));
                    }
                    Value::Unsigned(bits)
                },
            };

            entries.push((field.name.clone(), value));
        }

        // Undeclared bits are kept apart, so the storage unit round-trips whole.
        let residue = raw & !covered;
        if residue != 0 {
            entries.push((RESIDUE.to_owned(), Value::Unsigned(residue)));
        }

        Ok((Value::Group(entries), self.storage as u64))
    }

    /// This function encodes the group back to bytes.
    pub(crate) fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let entries = match value {
            Value::Group(entries) => entries,
            _ => return Err(RLibError::MismatchedValueTypeError("Group".to_owned(), value.type_name().to_owned())),
        };

        let mut raw = 0u64;
        for field in &self.fields {
            let entry = entries.iter()
                .find(|(name, _)| name == &field.name)
                .map(|(_, value)| value)
                .ok_or_else(|| RLibError::RefPathNotFoundError(field.name.to_owned()))?;

            let bits = match (&field.kind, entry) {
                (BitKind::Boolean, value) => value.as_bool()? as u64,
                (BitKind::Enum(allowed), value) => {
                    let bits = value.as_unsigned()?;
                    if !allowed.contains(&bits) {
                        return Err(RLibError::ValueNotAllowedError(bits.to_string(), format!("{allowed:?}")));
                    }
                    bits
                },
                (BitKind::Unsigned, value) => value.as_unsigned()?,
            };

            let shifted = bits << field.mask.trailing_zeros();
            if shifted & !field.mask != 0 {
                return Err(RLibError::EncodingIntegerOverflowError(bits.to_string(), format!("mask {:#x}", field.mask)));
            }

            raw |= shifted;
        }

        if let Some((_, residue)) = entries.iter().find(|(name, _)| name == RESIDUE) {
            raw |= residue.as_unsigned()?;
        }

        let bytes = match self.endian {
            Endianness::Little => raw.to_le_bytes()[..self.storage as usize].to_vec(),
            Endianness::Big => raw.to_be_bytes()[8 - self.storage as usize..].to_vec(),
        };

        Ok(bytes)
    }

    /// This function returns the value the group takes on a freshly built block.
    pub(crate) fn default_value(&self) -> Value {
        let entries = self.fields.iter()
            .map(|field| {
                let value = match &field.kind {
                    BitKind::Boolean => Value::Bool(false),
                    BitKind::Enum(allowed) => Value::Unsigned(allowed.first().copied().unwrap_or(0)),
                    BitKind::Unsigned => Value::Unsigned(0),
                };
                (field.name.clone(), value)
            })
            .collect();

        Value::Group(entries)
    }
}
