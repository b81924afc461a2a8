//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the definition of [`FieldDescriptor`], the rule interpreting one
//! contiguous byte region of a block as a typed value.
//!
//! # Known field kinds
//!
//! | Kind        | Decodes to | Explanation |
//! | ----------- | ---------- | ----------- |
//! | [`Numeric`] | Bool/Unsigned/Signed/Float | Integers of 8/16/24/32/64 bits, floats, ULEB128, both endiannesses. |
//! | [`Bytes`]   | Bytes      | Raw byte run of fixed, referenced or streaming length. |
//! | [`Str`]     | String     | Text in UTF-8, ISO-8859-15 or UTF-16, padded/terminated/length-prefixed. |
//! | [`Bits`]    | Group      | Named bit-masked sub-fields over a small storage unit. |
//! | [`Block`]   | Block/List | One nested block of a known schema, or a sequence of them. |
//! | [`Chunks`]  | List       | Tagged-union sequence dispatched on a chunk identifier. |
//! | [`Stream`]  | List       | Nested blocks parsed back to back until the data runs out. |
//!
//! Descriptors are plain immutable data: one instance is shared by every block of its
//! declaring schema, and all per-parse context is passed into the three contract methods
//! (`decode`, `encode`, `measure`). Nested parse failures of block-typed fields never
//! abort the import: the region is preserved as an `Unknown` slot and reencoded verbatim.
//!
//! [`Numeric`]: crate::fields::numeric::NumericField
//! [`Bytes`]: crate::fields::bytes::BytesField
//! [`Str`]: crate::fields::string::StringField
//! [`Bits`]: crate::fields::bits::BitsField
//! [`Block`]: crate::fields::block::BlockField
//! [`Chunks`]: crate::fields::chunk::ChunkField
//! [`Stream`]: crate::fields::stream::StreamField

use getset::Getters;

use std::sync::Arc;

use crate::blocks::{ParseState, Scope};
use crate::error::{RLibError, Result};
use crate::refs::Ref;
use crate::transforms::{Transform, TransformCtx};
use crate::value::Value;

use self::bits::BitsField;
use self::block::BlockField;
use self::bytes::BytesField;
use self::chunk::ChunkField;
use self::numeric::NumericField;
use self::stream::StreamField;
use self::string::StringField;

pub mod bits;
pub mod block;
pub mod bytes;
pub mod chunk;
pub mod numeric;
pub mod stream;
pub mod string;

#[cfg(test)] mod fields_test;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This enum represents a size, offset or count: constant, driven by a reference,
/// or "whatever is left of the buffer".
#[derive(Clone, Debug)]
pub enum Sizing {

    /// A constant, known at schema declaration.
    Fixed(u64),

    /// Driven by a reference evaluated at parse/export time.
    Ref(Ref),

    /// Consume until the end of the available data. Terminal fields only.
    Stream,
}

/// This enum represents the width of a small unsigned integer used as a prefix
/// (string sizes, chunk sizes).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IntWidth {
    U8,
    U16,
    U32,
}

/// This enum contains the supported field kinds. See the module docs for the list.
#[derive(Clone, Debug)]
pub enum FieldKind {
    Numeric(NumericField),
    Bytes(BytesField),
    Str(StringField),
    Bits(BitsField),
    Block(BlockField),
    Chunks(ChunkField),
    Stream(StreamField),
}

/// This struct represents the full parse/serialize/size rule for one field of a schema.
///
/// A descriptor is immutable and shared by every block instance of its declaring schema:
/// it holds no per-instance state.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct FieldDescriptor {

    /// How the region decodes.
    kind: FieldKind,

    /// Block-relative start. If absent, the field chains after the previous field's end.
    offset: Option<Sizing>,

    /// Raw window the transform consumes on import. Required for transformed fields
    /// whose kind cannot size its own raw region.
    region: Option<Sizing>,

    /// Transform applied to the field's bytes before decode / after encode.
    transform: Option<Arc<dyn Transform>>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// This function returns the data from `offset` onwards, or a short-buffer error.
pub(crate) fn tail(data: &[u8], offset: u64) -> Result<&[u8]> {
    if offset as usize > data.len() {
        return Err(RLibError::NotEnoughBytesError(offset, data.len() as u64));
    }

    Ok(&data[offset as usize..])
}

/// This function returns `size` bytes from `offset` onwards, or a short-buffer error.
pub(crate) fn window(data: &[u8], offset: u64, size: u64) -> Result<&[u8]> {
    let rest = tail(data, offset)?;
    if size as usize > rest.len() {
        return Err(RLibError::NotEnoughBytesError(size, rest.len() as u64));
    }

    Ok(&rest[..size as usize])
}

/// Implementation of `Sizing`.
impl Sizing {

    /// This function resolves the sizing against the current scope.
    ///
    /// `remaining` is the amount of bytes left on the buffer, used by streaming sizings.
    pub(crate) fn resolve(&self, scope: &Scope, remaining: u64) -> Result<u64> {
        match self {
            Self::Fixed(value) => Ok(*value),
            Self::Ref(reference) => reference.evaluate_unsigned(scope),
            Self::Stream => Ok(remaining),
        }
    }

    /// This function returns the reference driving this sizing, if any.
    pub(crate) fn as_ref_expr(&self) -> Option<&Ref> {
        match self {
            Self::Ref(reference) => Some(reference),
            _ => None,
        }
    }

    /// This function returns whether the sizing consumes until the end of the buffer.
    pub(crate) fn is_stream(&self) -> bool {
        matches!(self, Self::Stream)
    }
}

/// Implementation of `IntWidth`.
impl IntWidth {

    /// Width of the prefix, in bytes.
    pub fn size(self) -> u64 {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Biggest value the prefix can hold.
    pub fn max_value(self) -> u64 {
        match self {
            Self::U8 => u8::MAX as u64,
            Self::U16 => u16::MAX as u64,
            Self::U32 => u32::MAX as u64,
        }
    }
}

/// Implementation of `FieldDescriptor`.
impl FieldDescriptor {

    /// This function builds a descriptor from a field kind, with default options.
    pub fn new(kind: impl Into<FieldKind>) -> Self {
        Self {
            kind: kind.into(),
            offset: None,
            region: None,
            transform: None,
        }
    }

    /// This function sets an explicit block-relative offset for the field.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(Sizing::Fixed(offset));
        self
    }

    /// This function sets a reference-driven block-relative offset for the field.
    pub fn with_offset_ref(mut self, offset: Ref) -> Self {
        self.offset = Some(Sizing::Ref(offset));
        self
    }

    /// This function sets the raw window consumed by the field's transform on import.
    pub fn with_region(mut self, size: u64) -> Self {
        self.region = Some(Sizing::Fixed(size));
        self
    }

    /// This function sets a reference-driven raw window for the field's transform.
    pub fn with_region_ref(mut self, size: Ref) -> Self {
        self.region = Some(Sizing::Ref(size));
        self
    }

    /// This function sets a transform to apply to the field's bytes before decode / after encode.
    pub fn with_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// This function decodes the field's value from `data` at `offset`.
    ///
    /// On success it returns the decoded value and the amount of bytes consumed
    /// from `data`, padding included.
    pub(crate) fn decode(&self, data: &[u8], offset: u64, scope: &Scope, state: &mut ParseState) -> Result<(Value, u64)> {
        match &self.transform {
            None => self.kind.decode(data, offset, scope, state),
            Some(transform) => {
                let remaining = tail(data, offset)?.len() as u64;
                let raw_len = self.raw_window(scope, remaining)?;
                let raw = window(data, offset, raw_len)?;

                let decoded = transform.forward(raw, &self.transform_ctx(scope, remaining)?)?;
                let (value, _) = self.kind.decode(&decoded, 0, scope, state)?;

                Ok((value, raw_len))
            },
        }
    }

    /// This function encodes the field's value back to bytes, padding and transform included.
    pub(crate) fn encode(&self, value: &Value, scope: &Scope) -> Result<Vec<u8>> {
        let bytes = self.kind.encode(value, scope)?;
        match &self.transform {
            None => Ok(bytes),
            Some(transform) => {
                if !transform.is_invertible() {
                    return Err(RLibError::TransformNotInvertibleError(transform.name().to_owned()));
                }

                transform.reverse(&bytes, &self.transform_ctx(scope, bytes.len() as u64)?)
            },
        }
    }

    /// This function returns the serialized size of the field's value, in bytes.
    pub(crate) fn measure(&self, value: &Value, scope: &Scope) -> Result<u64> {
        self.encode(value, scope).map(|bytes| bytes.len() as u64)
    }

    /// This function returns the value the field takes on a freshly built block.
    pub(crate) fn default_value(&self) -> Value {
        self.kind.default_value()
    }

    /// This function returns the size of the raw window the transform consumes.
    fn raw_window(&self, scope: &Scope, remaining: u64) -> Result<u64> {
        match &self.region {
            Some(region) => region.resolve(scope, remaining),
            None => match &self.kind {
                FieldKind::Bytes(field) => field.length().resolve(scope, remaining),
                _ => Ok(remaining),
            },
        }
    }

    /// This function builds the context passed to the field's transform.
    fn transform_ctx(&self, scope: &Scope, remaining: u64) -> Result<TransformCtx> {
        if self.region.is_some() {
            if let FieldKind::Bytes(field) = &self.kind {
                if let Sizing::Fixed(length) = field.length() {
                    return Ok(TransformCtx::with_output_len(*length as usize));
                }
                if let Sizing::Ref(length) = field.length() {
                    let length = length.evaluate_unsigned(scope)?;
                    return Ok(TransformCtx::with_output_len(length as usize));
                }
            }
        }

        let _ = remaining;
        Ok(TransformCtx::new())
    }

    /// This function collects every reference the descriptor evaluates, for schema validation.
    pub(crate) fn refs<'a>(&'a self, refs: &mut Vec<&'a Ref>) {
        if let Some(Sizing::Ref(reference)) = &self.offset {
            refs.push(reference);
        }

        if let Some(Sizing::Ref(reference)) = &self.region {
            refs.push(reference);
        }

        self.kind.refs(refs);
    }

    /// This function returns the sibling field bound as the length/count counter of this
    /// field, if any. Counters get resynced from the in-memory value before exports.
    pub(crate) fn counter_binding(&self) -> Option<&str> {
        self.kind.counter_binding()
    }

    /// This function returns whether the field consumes until the end of the buffer.
    pub(crate) fn is_stream_sized(&self) -> bool {
        if let Some(region) = &self.region {
            return region.is_stream();
        }

        self.kind.is_stream_sized()
    }

    /// This function checks a value is assignable to this field: right shape, within range.
    ///
    /// Deeper problems (overflows, oversize strings) surface when the value is encoded.
    pub(crate) fn accepts(&self, value: &Value) -> Result<()> {
        self.kind.accepts(value)
    }
}

/// Implementation of `FieldKind`.
impl FieldKind {

    /// This function decodes a value of this kind from `data` at `offset`.
    pub(crate) fn decode(&self, data: &[u8], offset: u64, scope: &Scope, state: &mut ParseState) -> Result<(Value, u64)> {
        match self {
            Self::Numeric(field) => field.decode(data, offset),
            Self::Bytes(field) => field.decode(data, offset, scope),
            Self::Str(field) => field.decode(data, offset, scope),
            Self::Bits(field) => field.decode(data, offset),
            Self::Block(field) => field.decode(data, offset, scope, state),
            Self::Chunks(field) => field.decode(data, offset, scope, state),
            Self::Stream(field) => field.decode(data, offset, scope, state),
        }
    }

    /// This function encodes a value of this kind back to bytes.
    pub(crate) fn encode(&self, value: &Value, scope: &Scope) -> Result<Vec<u8>> {
        match self {
            Self::Numeric(field) => field.encode(value),
            Self::Bytes(field) => field.encode(value),
            Self::Str(field) => field.encode(value, scope),
            Self::Bits(field) => field.encode(value),
            Self::Block(field) => field.encode(value, scope),
            Self::Chunks(field) => field.encode(value, scope),
            Self::Stream(field) => field.encode(value, scope),
        }
    }

    /// This function returns the value of this kind on a freshly built block.
    pub(crate) fn default_value(&self) -> Value {
        match self {
            Self::Numeric(field) => field.default_value(),
            Self::Bytes(field) => field.default_value(),
            Self::Str(field) => field.default_value(),
            Self::Bits(field) => field.default_value(),
            Self::Block(field) => field.default_value(),
            Self::Chunks(_) => Value::List(vec![]),
            Self::Stream(_) => Value::List(vec![]),
        }
    }

    /// This function collects the references evaluated by this kind.
    pub(crate) fn refs<'a>(&'a self, refs: &mut Vec<&'a Ref>) {
        match self {
            Self::Numeric(_) | Self::Bits(_) | Self::Stream(_) => {},
            Self::Bytes(field) => if let Some(reference) = field.length().as_ref_expr() { refs.push(reference) },
            Self::Str(field) => if let Some(reference) = field.length_ref() { refs.push(reference) },
            Self::Block(field) => if let Some(reference) = field.count_ref() { refs.push(reference) },
            Self::Chunks(field) => if let Some(reference) = field.count_ref() { refs.push(reference) },
        }
    }

    /// This function returns the sibling field bound as this kind's length/count counter.
    pub(crate) fn counter_binding(&self) -> Option<&str> {
        match self {
            Self::Bytes(field) => field.length().as_ref_expr().and_then(|reference| reference.count_target()),
            Self::Block(field) => field.count_ref().and_then(|reference| reference.count_target()),
            Self::Chunks(field) => field.count_ref().and_then(|reference| reference.count_target()),
            _ => None,
        }
    }

    /// This function returns whether this kind consumes until the end of the buffer.
    pub(crate) fn is_stream_sized(&self) -> bool {
        match self {
            Self::Numeric(_) | Self::Bits(_) => false,
            Self::Bytes(field) => field.length().is_stream(),
            Self::Str(_) => false,
            Self::Block(field) => field.is_stream_sized(),
            Self::Chunks(field) => field.is_stream_sized(),
            Self::Stream(_) => true,
        }
    }

    /// This function checks a value is assignable to this kind of field.
    pub(crate) fn accepts(&self, value: &Value) -> Result<()> {
        match self {
            Self::Numeric(field) => field.accepts(value),
            Self::Bytes(_) => value.as_bytes().map(|_| ()),
            Self::Str(_) => value.as_str().map(|_| ()),
            Self::Bits(_) => match value {
                Value::Group(_) => Ok(()),
                _ => Err(RLibError::MismatchedValueTypeError("Group".to_owned(), value.type_name().to_owned())),
            },
            Self::Block(field) => match field.count() {
                None => value.as_block().map(|_| ()),
                Some(_) => value.as_list().map(|_| ()),
            },
            Self::Chunks(_) | Self::Stream(_) => value.as_list().map(|_| ()),
        }
    }
}

impl From<NumericField> for FieldDescriptor {
    fn from(field: NumericField) -> Self {
        Self::new(FieldKind::Numeric(field))
    }
}

impl From<BytesField> for FieldDescriptor {
    fn from(field: BytesField) -> Self {
        Self::new(FieldKind::Bytes(field))
    }
}

impl From<StringField> for FieldDescriptor {
    fn from(field: StringField) -> Self {
        Self::new(FieldKind::Str(field))
    }
}

impl From<BitsField> for FieldDescriptor {
    fn from(field: BitsField) -> Self {
        Self::new(FieldKind::Bits(field))
    }
}

impl From<BlockField> for FieldDescriptor {
    fn from(field: BlockField) -> Self {
        Self::new(FieldKind::Block(field))
    }
}

impl From<ChunkField> for FieldDescriptor {
    fn from(field: ChunkField) -> Self {
        Self::new(FieldKind::Chunks(field))
    }
}

impl From<StreamField> for FieldDescriptor {
    fn from(field: StreamField) -> Self {
        Self::new(FieldKind::Stream(field))
    }
}

impl From<NumericField> for FieldKind {
    fn from(field: NumericField) -> Self {
        Self::Numeric(field)
    }
}

impl From<BytesField> for FieldKind {
    fn from(field: BytesField) -> Self {
        Self::Bytes(field)
    }
}

impl From<StringField> for FieldKind {
    fn from(field: StringField) -> Self {
        Self::Str(field)
    }
}

impl From<BitsField> for FieldKind {
    fn from(field: BitsField) -> Self {
        Self::Bits(field)
    }
}

impl From<BlockField> for FieldKind {
    fn from(field: BlockField) -> Self {
        Self::Block(field)
    }
}

impl From<ChunkField> for FieldKind {
    fn from(field: ChunkField) -> Self {
        Self::Chunks(field)
    }
}

impl From<StreamField> for FieldKind {
    fn from(field: StreamField) -> Self {
        Self::Stream(field)
    }
}
