//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the raw bytes field kind.
//!
//! This is the catch-all for regions we either don't understand yet or genuinely are
//! opaque blobs. The decoded value owns a copy of the bytes, so the region round-trips
//! verbatim no matter what the rest of the block does.

use getset::Getters;

use crate::blocks::Scope;
use crate::error::{RLibError, Result};
use crate::fields::{window, Sizing};
use crate::value::Value;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This struct describes one raw byte run.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct BytesField {

    /// Length of the run: constant, driven by a reference, or until the end of the buffer.
    length: Sizing,

    /// Serialized length is padded up to a multiple of this.
    alignment: Option<u64>,

    /// Byte used for alignment padding and default values.
    fill: u8,

    /// Value used when building a fresh block. Defaults to `fill` repeated to the
    /// declared length, when the length is constant.
    default: Option<Vec<u8>>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `BytesField`.
impl BytesField {

    /// This function builds a byte run of a constant length.
    pub fn new(length: u64) -> Self {
        Self {
            length: Sizing::Fixed(length),
            alignment: None,
            fill: 0,
            default: None,
        }
    }

    /// This function builds a byte run whose length is driven by a reference.
    pub fn with_length_ref(length: crate::refs::Ref) -> Self {
        Self {
            length: Sizing::Ref(length),
            alignment: None,
            fill: 0,
            default: None,
        }
    }

    /// This function builds a byte run that consumes until the end of the buffer.
    pub fn streaming() -> Self {
        Self {
            length: Sizing::Stream,
            alignment: None,
            fill: 0,
            default: None,
        }
    }

    /// This function pads the serialized length up to a multiple of `alignment`.
    pub fn with_alignment(mut self, alignment: u64) -> Self {
        self.alignment = Some(alignment.max(1));
        self
    }

    /// This function sets the byte used for padding and defaults.
    pub fn with_fill(mut self, fill: u8) -> Self {
        self.fill = fill;
        self
    }

    /// This function sets the value the field takes on a freshly built block.
    pub fn with_default(mut self, default: &[u8]) -> Self {
        self.default = Some(default.to_vec());
        self
    }

    /// This function decodes the field's value from `data` at `offset`.
    pub(crate) fn decode(&self, data: &[u8], offset: u64, scope: &Scope) -> Result<(Value, u64)> {
        let remaining = (data.len() as u64).saturating_sub(offset);
        let length = self.length.resolve(scope, remaining)?;
        let aligned = self.align(length);

        let region = window(data, offset, aligned)?;
        let value = region[..length as usize].to_vec();

        Ok((Value::Bytes(value), aligned))
    }

    /// This function encodes the field's value back to bytes, padding included.
    pub(crate) fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let bytes = value.as_bytes()?;
        if let Sizing::Fixed(length) = self.length {
            if bytes.len() as u64 != length {
                return Err(RLibError::EncodingFixedBytesLengthError(bytes.len(), length as usize));
            }
        }

        let mut data = bytes.to_vec();
        let aligned = self.align(data.len() as u64);
        data.resize(aligned as usize, self.fill);

        Ok(data)
    }

    /// This function returns the value the field takes on a freshly built block.
    pub(crate) fn default_value(&self) -> Value {
        if let Some(default) = &self.default {
            return Value::Bytes(default.clone());
        }

        match self.length {
            Sizing::Fixed(length) => Value::Bytes(vec![self.fill; length as usize]),
            _ => Value::Bytes(vec![]),
        }
    }

    /// This function pads a length up to the declared alignment.
    fn align(&self, length: u64) -> u64 {
        match self.alignment {
            Some(alignment) => length.div_ceil(alignment) * alignment,
            None => length,
        }
    }
}
