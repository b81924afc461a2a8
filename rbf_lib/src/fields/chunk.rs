//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the tagged-union chunk field kind.
//!
//! A chunk sequence is the classic RIFF-style layout: each element leads with an
//! identifier (a FourCC or a small integer) and a payload size, and the payload is
//! dispatched to a schema registered for that identifier. Identifiers we don't know
//! keep their payload as raw bytes, zero-size chunks have no payload at all, and
//! both reencode byte-identical.

use getset::Getters;
use log::warn;

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use crate::binary::{ReadBytes, WriteBytes};
use crate::blocks::{parse_nested, export_nested, ParseState, Scope};
use crate::error::{RLibError, Result};
use crate::fields::{tail, window, IntWidth, Sizing};
use crate::fields::numeric::Endianness;
use crate::refs::Ref;
use crate::schema::Schema;
use crate::value::{BlockSlot, ChunkId, ChunkValue, Value};

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This enum represents the layout of a chunk identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChunkIdKind {

    /// Four raw bytes.
    FourCC,

    /// Small unsigned integer of the provided width.
    Number(IntWidth),
}

/// This struct describes a tagged-union chunk sequence field.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct ChunkField {

    /// Layout of the chunk identifiers.
    id_kind: ChunkIdKind,

    /// Width of the payload size prefix.
    size_width: IntWidth,

    /// Byte order of numeric identifiers and size prefixes.
    endian: Endianness,

    /// Schema to dispatch each known identifier to.
    registry: HashMap<ChunkId, Arc<Schema>>,

    /// Element count. Defaults to "until the data runs out".
    count: Sizing,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `ChunkField`.
impl ChunkField {

    /// This function builds a chunk sequence field with an empty registry.
    pub fn new(id_kind: ChunkIdKind, size_width: IntWidth, endian: Endianness) -> Self {
        Self {
            id_kind,
            size_width,
            endian,
            registry: HashMap::new(),
            count: Sizing::Stream,
        }
    }

    /// This function registers the schema to dispatch an identifier to.
    pub fn with_schema(mut self, id: ChunkId, schema: &Arc<Schema>) -> Self {
        self.registry.insert(id, schema.clone());
        self
    }

    /// This function sets a constant element count.
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Sizing::Fixed(count);
        self
    }

    /// This function sets a reference-driven element count.
    pub fn with_count_ref(mut self, count: Ref) -> Self {
        self.count = Sizing::Ref(count);
        self
    }

    /// This function returns the reference driving the field's count, if any.
    pub(crate) fn count_ref(&self) -> Option<&Ref> {
        self.count.as_ref_expr()
    }

    /// This function returns whether the field consumes until the end of the buffer.
    pub(crate) fn is_stream_sized(&self) -> bool {
        self.count.is_stream()
    }

    /// This function decodes the field's value from `data` at `offset`.
    pub(crate) fn decode(&self, data: &[u8], offset: u64, scope: &Scope, state: &mut ParseState) -> Result<(Value, u64)> {
        let mut values = vec![];
        let mut pos = offset;

        if self.count.is_stream() {
            while pos < data.len() as u64 {
                pos += self.decode_chunk(data, pos, scope, state, &mut values)?;
            }
        } else {
            let count = self.count.resolve(scope, (data.len() as u64).saturating_sub(offset))?;
            for _ in 0..count {
                pos += self.decode_chunk(data, pos, scope, state, &mut values)?;
            }
        }

        Ok((Value::List(values), pos - offset))
    }

    /// This function encodes the field's value back to bytes.
    pub(crate) fn encode(&self, value: &Value, scope: &Scope) -> Result<Vec<u8>> {
        let values = value.as_list()?;
        let mut data = vec![];

        for value in values {
            let chunk = match value {
                Value::Chunk(chunk) => chunk,
                _ => return Err(RLibError::MismatchedValueTypeError("Chunk".to_owned(), value.type_name().to_owned())),
            };

            let payload = match chunk.payload() {
                None => vec![],
                Some(BlockSlot::Known(block)) => export_nested(block, Some(scope))?,
                Some(BlockSlot::Unknown(raw)) => raw.clone(),
            };

            match (self.id_kind, chunk.id()) {
                (ChunkIdKind::FourCC, ChunkId::FourCC(id)) => data.extend_from_slice(id),
                (ChunkIdKind::Number(width), ChunkId::Number(id)) => self.write_uint(&mut data, width, *id)?,
                (_, id) => return Err(RLibError::MismatchedValueTypeError("ChunkId".to_owned(), id.to_string())),
            }

            self.write_uint(&mut data, self.size_width, payload.len() as u64)?;
            data.extend_from_slice(&payload);
        }

        Ok(data)
    }

    /// This function decodes one chunk into `values`, returning the bytes it consumed.
    fn decode_chunk(&self, data: &[u8], pos: u64, scope: &Scope, state: &mut ParseState, values: &mut Vec<Value>) -> Result<u64> {
        let mut cursor = Cursor::new(tail(data, pos)?);

        let id = match self.id_kind {
            ChunkIdKind::FourCC => {
                let bytes = cursor.read_slice(4, false)?;
                ChunkId::FourCC([bytes[0], bytes[1], bytes[2], bytes[3]])
            },
            ChunkIdKind::Number(width) => ChunkId::Number(self.read_uint(&mut cursor, width)?),
        };

        let size = self.read_uint(&mut cursor, self.size_width)?;
        let header = cursor.position();
        let payload_region = window(data, pos + header, size)?;

        let payload = if size == 0 {
            None
        } else if let Some(schema) = self.registry.get(&id) {
            match parse_nested(schema, payload_region, scope, state) {
                Ok((block, _)) => Some(BlockSlot::Known(block)),
                Err(error) => {
                    warn!("Chunk \"{id}\" failed to parse as \"{}\", keeping {size} raw bytes: {error}", schema.name());
                    Some(BlockSlot::Unknown(payload_region.to_vec()))
                },
            }
        } else {
            Some(BlockSlot::Unknown(payload_region.to_vec()))
        };

        values.push(Value::Chunk(Box::new(ChunkValue::new(id, payload))));

        Ok(header + size)
    }

    /// This function reads one unsigned integer of the provided width.
    fn read_uint<R: ReadBytes>(&self, data: &mut R, width: IntWidth) -> Result<u64> {
        let value = match (width, self.endian) {
            (IntWidth::U8, _) => data.read_u8()? as u64,
            (IntWidth::U16, Endianness::Little) => data.read_u16()? as u64,
            (IntWidth::U16, Endianness::Big) => data.read_u16_be()? as u64,
            (IntWidth::U32, Endianness::Little) => data.read_u32()? as u64,
            (IntWidth::U32, Endianness::Big) => data.read_u32_be()? as u64,
        };

        Ok(value)
    }

    /// This function writes one unsigned integer of the provided width.
    fn write_uint<W: WriteBytes>(&self, data: &mut W, width: IntWidth, value: u64) -> Result<()> {
        if value > width.max_value() {
            return Err(RLibError::EncodingIntegerOverflowError(value.to_string(), format!("{width:?}")));
        }

        match (width, self.endian) {
            (IntWidth::U8, _) => data.write_u8(value as u8),
            (IntWidth::U16, Endianness::Little) => data.write_u16(value as u16),
            (IntWidth::U16, Endianness::Big) => data.write_u16_be(value as u16),
            (IntWidth::U32, Endianness::Little) => data.write_u32(value as u32),
            (IntWidth::U32, Endianness::Big) => data.write_u32_be(value as u32),
        }
    }
}
