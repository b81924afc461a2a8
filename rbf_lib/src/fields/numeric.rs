//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the numeric field kind: integers, floats and ULEB128 varints.
//!
//! All integer arithmetic is two's complement within the declared width, endianness
//! is always explicit, and serialization never widens implicitly: a value that does
//! not fit its declared width is an encode error, not a truncation.

use getset::Getters;

use std::io::Cursor;

use crate::binary::{ReadBytes, WriteBytes};
use crate::error::{RLibError, Result};
use crate::fields::tail;
use crate::value::Value;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This enum represents the endianness of a multibyte value.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Endianness {
    #[default] Little,
    Big,
}

/// This enum represents the concrete layout of a numeric field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NumericKind {

    /// One byte, strictly 0 or 1.
    Bool,
    U8,
    U16,
    U24,
    U32,
    U64,
    I8,
    I16,
    I24,
    I32,
    I64,
    F32,
    F64,

    /// Variable-length unsigned integer, 1-10 bytes.
    Uleb128,
}

/// This enum represents the allowed value domain of a numeric field.
#[derive(Clone, Debug, PartialEq)]
pub enum RangeConstraint {

    /// Inclusive unsigned range.
    Unsigned(u64, u64),

    /// Inclusive signed range.
    Signed(i64, i64),

    /// Explicit set of allowed unsigned values.
    AllowedUnsigned(Vec<u64>),
}

/// This struct describes one numeric field.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct NumericField {

    /// Concrete layout of the value.
    kind: NumericKind,

    /// Byte order of the value. Ignored by single-byte and varint layouts.
    endian: Endianness,

    /// Allowed value domain. Violations reject the import.
    range: Option<RangeConstraint>,

    /// Value used when building a fresh block.
    default: Option<Value>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `NumericKind`.
impl NumericKind {

    /// This function returns the serialized width of the layout, if it's constant.
    pub fn width(self) -> Option<u64> {
        match self {
            Self::Bool | Self::U8 | Self::I8 => Some(1),
            Self::U16 | Self::I16 => Some(2),
            Self::U24 | Self::I24 => Some(3),
            Self::U32 | Self::I32 | Self::F32 => Some(4),
            Self::U64 | Self::I64 | Self::F64 => Some(8),
            Self::Uleb128 => None,
        }
    }

    /// This function returns whether the layout holds signed values.
    pub fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I24 | Self::I32 | Self::I64)
    }
}

/// Implementation of `NumericField`.
impl NumericField {

    /// This function builds a numeric field of the provided layout and endianness.
    pub fn new(kind: NumericKind, endian: Endianness) -> Self {
        Self {
            kind,
            endian,
            range: None,
            default: None,
        }
    }

    /// This function restricts the field to an inclusive unsigned range.
    pub fn with_range(mut self, min: u64, max: u64) -> Self {
        self.range = Some(RangeConstraint::Unsigned(min, max));
        self
    }

    /// This function restricts the field to an inclusive signed range.
    pub fn with_signed_range(mut self, min: i64, max: i64) -> Self {
        self.range = Some(RangeConstraint::Signed(min, max));
        self
    }

    /// This function restricts the field to an explicit set of allowed values.
    pub fn with_allowed(mut self, allowed: &[u64]) -> Self {
        self.range = Some(RangeConstraint::AllowedUnsigned(allowed.to_vec()));
        self
    }

    /// This function sets the value the field takes on a freshly built block.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// This function decodes the field's value from `data` at `offset`.
    pub(crate) fn decode(&self, data: &[u8], offset: u64) -> Result<(Value, u64)> {
        let mut cursor = Cursor::new(tail(data, offset)?);
        let value = match (self.kind, self.endian) {
            (NumericKind::Bool, _) => Value::Bool(cursor.read_bool()?),
            (NumericKind::U8, _) => Value::Unsigned(cursor.read_u8()? as u64),
            (NumericKind::U16, Endianness::Little) => Value::Unsigned(cursor.read_u16()? as u64),
            (NumericKind::U16, Endianness::Big) => Value::Unsigned(cursor.read_u16_be()? as u64),
            (NumericKind::U24, Endianness::Little) => Value::Unsigned(cursor.read_u24()? as u64),
            (NumericKind::U24, Endianness::Big) => Value::Unsigned(cursor.read_u24_be()? as u64),
            (NumericKind::U32, Endianness::Little) => Value::Unsigned(cursor.read_u32()? as u64),
            (NumericKind::U32, Endianness::Big) => Value::Unsigned(cursor.read_u32_be()? as u64),
            (NumericKind::U64, Endianness::Little) => Value::Unsigned(cursor.read_u64()?),
            (NumericKind::U64, Endianness::Big) => Value::Unsigned(cursor.read_u64_be()?),
            (NumericKind::I8, _) => Value::Signed(cursor.read_i8()? as i64),
            (NumericKind::I16, Endianness::Little) => Value::Signed(cursor.read_i16()? as i64),
            (NumericKind::I16, Endianness::Big) => Value::Signed(cursor.read_i16_be()? as i64),
            (NumericKind::I24, Endianness::Little) => Value::Signed(cursor.read_i24()? as i64),
            (NumericKind::I24, Endianness::Big) => Value::Signed(cursor.read_i24_be()? as i64),
            (NumericKind::I32, Endianness::Little) => Value::Signed(cursor.read_i32()? as i64),
            (NumericKind::I32, Endianness::Big) => Value::Signed(cursor.read_i32_be()? as i64),
            (NumericKind::I64, Endianness::Little) => Value::Signed(cursor.read_i64()?),
            (NumericKind::I64, Endianness::Big) => Value::Signed(cursor.read_i64_be()?),
            (NumericKind::F32, Endianness::Little) => Value::Float(cursor.read_f32()? as f64),
            (NumericKind::F32, Endianness::Big) => Value::Float(cursor.read_f32_be()? as f64),
            (NumericKind::F64, Endianness::Little) => Value::Float(cursor.read_f64()?),
            (NumericKind::F64, Endianness::Big) => Value::Float(cursor.read_f64_be()?),
            (NumericKind::Uleb128, _) => Value::Unsigned(cursor.read_uleb128()?),
        };

        self.check_range(&value)?;

        Ok((value, cursor.position()))
    }

    /// This function encodes the field's value back to bytes.
    pub(crate) fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        self.check_range(value)?;

        let mut data = vec![];
        match (self.kind, self.endian) {
            (NumericKind::Bool, _) => data.write_bool(value.as_bool()?)?,
            (NumericKind::U8, _) => data.write_u8(self.unsigned_in_width(value)? as u8)?,
            (NumericKind::U16, Endianness::Little) => data.write_u16(self.unsigned_in_width(value)? as u16)?,
            (NumericKind::U16, Endianness::Big) => data.write_u16_be(self.unsigned_in_width(value)? as u16)?,
            (NumericKind::U24, Endianness::Little) => data.write_u24(self.unsigned_in_width(value)? as u32)?,
            (NumericKind::U24, Endianness::Big) => data.write_u24_be(self.unsigned_in_width(value)? as u32)?,
            (NumericKind::U32, Endianness::Little) => data.write_u32(self.unsigned_in_width(value)? as u32)?,
            (NumericKind::U32, Endianness::Big) => data.write_u32_be(self.unsigned_in_width(value)? as u32)?,
            (NumericKind::U64, Endianness::Little) => data.write_u64(value.as_unsigned()?)?,
            (NumericKind::U64, Endianness::Big) => data.write_u64_be(value.as_unsigned()?)?,
            (NumericKind::I8, _) => data.write_i8(self.signed_in_width(value)? as i8)?,
            (NumericKind::I16, Endianness::Little) => data.write_i16(self.signed_in_width(value)? as i16)?,
            (NumericKind::I16, Endianness::Big) => data.write_i16_be(self.signed_in_width(value)? as i16)?,
            (NumericKind::I24, Endianness::Little) => data.write_i24(self.signed_in_width(value)? as i32)?,
            (NumericKind::I24, Endianness::Big) => data.write_i24_be(self.signed_in_width(value)? as i32)?,
            (NumericKind::I32, Endianness::Little) => data.write_i32(self.signed_in_width(value)? as i32)?,
            (NumericKind::I32, Endianness::Big) => data.write_i32_be(self.signed_in_width(value)? as i32)?,
            (NumericKind::I64, Endianness::Little) => data.write_i64(value.as_signed()?)?,
            (NumericKind::I64, Endianness::Big) => data.write_i64_be(value.as_signed()?)?,
            (NumericKind::F32, Endianness::Little) => data.write_f32(value.as_float()? as f32)?,
            (NumericKind::F32, Endianness::Big) => data.write_f32_be(value.as_float()? as f32)?,
            (NumericKind::F64, Endianness::Little) => data.write_f64(value.as_float()?)?,
            (NumericKind::F64, Endianness::Big) => data.write_f64_be(value.as_float()?)?,
            (NumericKind::Uleb128, _) => data.write_uleb128(value.as_unsigned()?)?,
        }

        Ok(data)
    }

    /// This function returns the value the field takes on a freshly built block.
    pub(crate) fn default_value(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }

        match self.kind {
            NumericKind::Bool => Value::Bool(false),
            NumericKind::F32 | NumericKind::F64 => Value::Float(0.0),
            kind if kind.is_signed() => Value::Signed(0),
            _ => Value::Unsigned(0),
        }
    }

    /// This function checks a value is assignable to this field: right shape, within range.
    pub(crate) fn accepts(&self, value: &Value) -> Result<()> {
        match self.kind {
            NumericKind::Bool => { value.as_bool()?; },
            NumericKind::F32 | NumericKind::F64 => { value.as_float()?; },
            kind if kind.is_signed() => { value.as_signed()?; },
            _ => { value.as_unsigned()?; },
        }

        self.check_range(value)
    }

    /// This function checks the value against the field's declared domain.
    pub(crate) fn check_range(&self, value: &Value) -> Result<()> {
        let constraint = match &self.range {
            Some(constraint) => constraint,
            None => return Ok(()),
        };

        match constraint {
            RangeConstraint::Unsigned(min, max) => {
                let value = value.as_unsigned()?;
                if value < *min || value > *max {
                    return Err(RLibError::ValueOutsideRangeError(value.to_string(), format!("{min}..={max}")));
                }
            },
            RangeConstraint::Signed(min, max) => {
                let value = value.as_signed()?;
                if value < *min || value > *max {
                    return Err(RLibError::ValueOutsideRangeError(value.to_string(), format!("{min}..={max}")));
                }
            },
            RangeConstraint::AllowedUnsigned(allowed) => {
                let value = value.as_unsigned()?;
                if !allowed.contains(&value) {
                    return Err(RLibError::ValueNotAllowedError(value.to_string(), format!("{allowed:?}")));
                }
            },
        }

        Ok(())
    }

    /// This function coerces the value to an unsigned integer, checking it fits the declared width.
    fn unsigned_in_width(&self, value: &Value) -> Result<u64> {
        let value = value.as_unsigned()?;
        let max = match self.kind {
            NumericKind::U8 => u8::MAX as u64,
            NumericKind::U16 => u16::MAX as u64,
            NumericKind::U24 => 0xFF_FFFF,
            NumericKind::U32 => u32::MAX as u64,
            _ => u64::MAX,
        };

        if value > max {
            return Err(RLibError::EncodingIntegerOverflowError(value.to_string(), format!("{:?}", self.kind)));
        }

        Ok(value)
    }

    /// This function coerces the value to a signed integer, checking it fits the declared width.
    fn signed_in_width(&self, value: &Value) -> Result<i64> {
        let value = value.as_signed()?;
        let (min, max) = match self.kind {
            NumericKind::I8 => (i8::MIN as i64, i8::MAX as i64),
            NumericKind::I16 => (i16::MIN as i64, i16::MAX as i64),
            NumericKind::I24 => (-0x80_0000, 0x7F_FFFF),
            NumericKind::I32 => (i32::MIN as i64, i32::MAX as i64),
            _ => (i64::MIN, i64::MAX),
        };

        if value < min || value > max {
            return Err(RLibError::EncodingIntegerOverflowError(value.to_string(), format!("{:?}", self.kind)));
        }

        Ok(value)
    }
}
