//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the definition of [`Value`], the dynamic domain of decoded fields.
//!
//! Every field of a [`Block`](crate::blocks::Block) decodes into one of these. Nested blocks
//! are stored through [`BlockSlot`], which keeps the raw bytes around when a nested parse
//! failed, so the data can still be reencoded byte-identical.

use getset::{Getters, MutGetters};

use std::fmt;

use crate::blocks::Block;
use crate::error::{RLibError, Result};

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This enum represents any value a field can decode to.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {

    /// Sentinel for a field slot that has not been populated yet.
    None,
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),

    /// Sequence of repeated values, all of the same field kind.
    List(Vec<Value>),

    /// Named sub-values of a bit-packed group.
    Group(Vec<(String, Value)>),

    /// One nested block, or its raw bytes if it failed to parse.
    Block(Box<BlockSlot>),

    /// One element of a tagged-union chunk sequence.
    Chunk(Box<ChunkValue>),
}

/// This enum represents a nested block slot: either a parsed block, or the raw
/// bytes of a region we failed to parse and keep verbatim for reencoding.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockSlot {
    Known(Block),
    Unknown(Vec<u8>),
}

/// This struct represents one decoded chunk of a tagged-union sequence.
#[derive(Clone, Debug, PartialEq, Getters, MutGetters)]
#[getset(get = "pub", get_mut = "pub")]
pub struct ChunkValue {

    /// Identifier the chunk was dispatched on.
    id: ChunkId,

    /// Decoded payload. `None` for zero-size chunks.
    payload: Option<BlockSlot>,
}

/// This enum represents the identifier of a chunk.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChunkId {

    /// Four raw bytes, usually printable ASCII ("RIFF", "DATA",...).
    FourCC([u8; 4]),

    /// Numeric identifier of a declared width.
    Number(u64),
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `Value`.
impl Value {

    /// This function returns the name of the value's type, for error reporting.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool(_) => "Bool",
            Self::Unsigned(_) => "Unsigned",
            Self::Signed(_) => "Signed",
            Self::Float(_) => "Float",
            Self::Bytes(_) => "Bytes",
            Self::String(_) => "String",
            Self::List(_) => "List",
            Self::Group(_) => "Group",
            Self::Block(_) => "Block",
            Self::Chunk(_) => "Chunk",
        }
    }

    /// This function tries to return the value as a bool.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(value) => Ok(*value),
            _ => Err(RLibError::MismatchedValueTypeError("Bool".to_owned(), self.type_name().to_owned())),
        }
    }

    /// This function tries to return the value as an unsigned integer.
    ///
    /// Non-negative signed values are accepted too, so counts can be driven by signed fields.
    pub fn as_unsigned(&self) -> Result<u64> {
        match self {
            Self::Unsigned(value) => Ok(*value),
            Self::Signed(value) if *value >= 0 => Ok(*value as u64),
            _ => Err(RLibError::MismatchedValueTypeError("Unsigned".to_owned(), self.type_name().to_owned())),
        }
    }

    /// This function tries to return the value as an usize, for offsets and counts.
    pub fn as_usize(&self) -> Result<usize> {
        self.as_unsigned().map(|value| value as usize)
    }

    /// This function tries to return the value as a signed integer.
    pub fn as_signed(&self) -> Result<i64> {
        match self {
            Self::Signed(value) => Ok(*value),
            Self::Unsigned(value) if *value <= i64::MAX as u64 => Ok(*value as i64),
            _ => Err(RLibError::MismatchedValueTypeError("Signed".to_owned(), self.type_name().to_owned())),
        }
    }

    /// This function tries to return the value as a float.
    pub fn as_float(&self) -> Result<f64> {
        match self {
            Self::Float(value) => Ok(*value),
            _ => Err(RLibError::MismatchedValueTypeError("Float".to_owned(), self.type_name().to_owned())),
        }
    }

    /// This function tries to return the value as a byte slice.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Self::Bytes(value) => Ok(value),
            _ => Err(RLibError::MismatchedValueTypeError("Bytes".to_owned(), self.type_name().to_owned())),
        }
    }

    /// This function tries to return the value as a string slice.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::String(value) => Ok(value),
            _ => Err(RLibError::MismatchedValueTypeError("String".to_owned(), self.type_name().to_owned())),
        }
    }

    /// This function tries to return the value as a list of values.
    pub fn as_list(&self) -> Result<&Vec<Value>> {
        match self {
            Self::List(value) => Ok(value),
            _ => Err(RLibError::MismatchedValueTypeError("List".to_owned(), self.type_name().to_owned())),
        }
    }

    /// This function tries to return the value as a mutable list of values.
    pub fn as_list_mut(&mut self) -> Result<&mut Vec<Value>> {
        match self {
            Self::List(value) => Ok(value),
            _ => Err(RLibError::MismatchedValueTypeError("List".to_owned(), self.type_name().to_owned())),
        }
    }

    /// This function tries to return the value as a nested block slot.
    pub fn as_block(&self) -> Result<&BlockSlot> {
        match self {
            Self::Block(value) => Ok(value),
            _ => Err(RLibError::MismatchedValueTypeError("Block".to_owned(), self.type_name().to_owned())),
        }
    }

    /// This function returns the length of the value as a sequence, if it is one.
    pub fn sequence_len(&self) -> Option<usize> {
        match self {
            Self::List(values) => Some(values.len()),
            Self::Bytes(bytes) => Some(bytes.len()),
            _ => None,
        }
    }

    /// This function returns the named child of the value, if the value is a container.
    ///
    /// Containers are bit groups, nested blocks and chunk payloads.
    pub fn child(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Group(entries) => entries.iter().find(|(entry_name, _)| entry_name == name).map(|(_, value)| value),
            Self::Block(slot) => match &**slot {
                BlockSlot::Known(block) => block.value(name).ok(),
                BlockSlot::Unknown(_) => None,
            },
            Self::Chunk(chunk) => match chunk.payload() {
                Some(BlockSlot::Known(block)) => block.value(name).ok(),
                _ => None,
            },
            _ => None,
        }
    }

    /// This function returns the nth element of the value, if the value is a list.
    pub fn element(&self, index: usize) -> Option<&Value> {
        match self {
            Self::List(values) => values.get(index),
            _ => None,
        }
    }

    /// This function returns the named child of the value as mutable, if the value is a container.
    ///
    /// Mutating through a nested block marks that block as dirty.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Value> {
        match self {
            Self::Group(entries) => entries.iter_mut().find(|(entry_name, _)| entry_name == name).map(|(_, value)| value),
            Self::Block(slot) => match &mut **slot {
                BlockSlot::Known(block) => block.value_mut(name),
                BlockSlot::Unknown(_) => None,
            },
            Self::Chunk(chunk) => match chunk.payload_mut() {
                Some(BlockSlot::Known(block)) => block.value_mut(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// This function returns the nth element of the value as mutable, if the value is a list.
    pub fn element_mut(&mut self, index: usize) -> Option<&mut Value> {
        match self {
            Self::List(values) => values.get_mut(index),
            _ => None,
        }
    }
}

/// Implementation of `BlockSlot`.
impl BlockSlot {

    /// This function returns the parsed block of the slot, if any.
    pub fn block(&self) -> Option<&Block> {
        match self {
            Self::Known(block) => Some(block),
            Self::Unknown(_) => None,
        }
    }

    /// This function returns the parsed block of the slot as mutable, if any.
    pub fn block_mut(&mut self) -> Option<&mut Block> {
        match self {
            Self::Known(block) => Some(block),
            Self::Unknown(_) => None,
        }
    }

    /// This function returns the preserved raw bytes of the slot, if the nested parse failed.
    pub fn raw(&self) -> Option<&[u8]> {
        match self {
            Self::Known(_) => None,
            Self::Unknown(raw) => Some(raw),
        }
    }
}

/// Implementation of `ChunkValue`.
impl ChunkValue {

    /// This function builds a new chunk value from its identifier and payload.
    pub fn new(id: ChunkId, payload: Option<BlockSlot>) -> Self {
        Self { id, payload }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FourCC(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Self::Number(id) => write!(f, "{id}"),
        }
    }
}
