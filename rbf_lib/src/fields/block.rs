//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the nested block field kind: one block of a known schema, or a sequence of them.
//!
//! Nested parses never abort the outer import: a region that fails to parse becomes an
//! `Unknown` slot holding the raw bytes, and reencodes verbatim. That's the difference
//! between "we can't open this file" and "we can't open this corner of this file yet",
//! and the second one is the only acceptable behaviour when reversing formats.

use getset::Getters;
use log::warn;

use std::sync::Arc;

use crate::blocks::{parse_nested, export_nested, ParseState, Scope};
use crate::error::Result;
use crate::fields::{tail, Sizing};
use crate::refs::Ref;
use crate::schema::Schema;
use crate::value::{BlockSlot, Value};

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This struct describes a nested block field.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct BlockField {

    /// Schema of the nested block(s).
    schema: Arc<Schema>,

    /// Element count: absent for a single nested block, constant, driven by a
    /// reference, or "until the data runs out".
    count: Option<Sizing>,

    /// Byte pattern used to materialize missing trailing elements of a fixed-count
    /// sequence on export.
    fill: Option<Vec<u8>>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `BlockField`.
impl BlockField {

    /// This function builds a field holding a single nested block.
    pub fn single(schema: &Arc<Schema>) -> Self {
        Self {
            schema: schema.clone(),
            count: None,
            fill: None,
        }
    }

    /// This function builds a field holding a sequence of nested blocks of a constant count.
    pub fn sequence(schema: &Arc<Schema>, count: u64) -> Self {
        Self {
            schema: schema.clone(),
            count: Some(Sizing::Fixed(count)),
            fill: None,
        }
    }

    /// This function builds a field holding a sequence of nested blocks whose count is
    /// driven by a reference.
    pub fn sequence_ref(schema: &Arc<Schema>, count: Ref) -> Self {
        Self {
            schema: schema.clone(),
            count: Some(Sizing::Ref(count)),
            fill: None,
        }
    }

    /// This function builds a field holding nested blocks until the data runs out.
    pub fn streaming(schema: &Arc<Schema>) -> Self {
        Self {
            schema: schema.clone(),
            count: Some(Sizing::Stream),
            fill: None,
        }
    }

    /// This function sets the pattern used to materialize missing trailing elements of a
    /// fixed-count sequence on export.
    pub fn with_fill(mut self, fill: &[u8]) -> Self {
        self.fill = Some(fill.to_vec());
        self
    }

    /// This function returns the reference driving the field's count, if any.
    pub(crate) fn count_ref(&self) -> Option<&Ref> {
        self.count.as_ref().and_then(|count| count.as_ref_expr())
    }

    /// This function returns whether the field consumes until the end of the buffer.
    pub(crate) fn is_stream_sized(&self) -> bool {
        match &self.count {
            Some(count) => count.is_stream(),
            None => self.schema.greedy(),
        }
    }

    /// This function decodes the field's value from `data` at `offset`.
    pub(crate) fn decode(&self, data: &[u8], offset: u64, scope: &Scope, state: &mut ParseState) -> Result<(Value, u64)> {
        match &self.count {

            // Single nested block.
            None => {
                let rest = tail(data, offset)?;
                let (slot, consumed) = self.parse_slot(rest, scope, state);
                Ok((Value::Block(Box::new(slot)), consumed))
            },

            // Sequence of nested blocks.
            Some(count) => {
                let mut values = vec![];
                let mut pos = offset;

                if count.is_stream() {
                    while pos < data.len() as u64 {
                        let rest = tail(data, pos)?;
                        let (slot, consumed) = self.parse_slot(rest, scope, state);
                        let failed = matches!(slot, BlockSlot::Unknown(_));
                        values.push(Value::Block(Box::new(slot)));
                        pos += consumed;

                        // A zero-size element would loop forever.
                        if failed || consumed == 0 {
                            break;
                        }
                    }
                } else {
                    let count = count.resolve(scope, (data.len() as u64).saturating_sub(offset))?;
                    for _ in 0..count {
                        let rest = tail(data, pos)?;
                        let (slot, consumed) = self.parse_slot(rest, scope, state);
                        let failed = matches!(slot, BlockSlot::Unknown(_));
                        values.push(Value::Block(Box::new(slot)));
                        pos += consumed;

                        if failed {
                            break;
                        }
                    }
                }

                Ok((Value::List(values), pos - offset))
            },
        }
    }

    /// This function encodes the field's value back to bytes.
    pub(crate) fn encode(&self, value: &Value, scope: &Scope) -> Result<Vec<u8>> {
        match &self.count {
            None => Self::encode_slot(value.as_block()?, scope),
            Some(count) => {
                let values = value.as_list()?;
                let mut data = vec![];
                for value in values {
                    data.extend_from_slice(&Self::encode_slot(value.as_block()?, scope)?);
                }

                // Missing trailing elements of a fixed-count sequence get materialized
                // from the declared fill pattern.
                if let (Sizing::Fixed(count), Some(fill)) = (count, &self.fill) {
                    for _ in values.len() as u64..*count {
                        data.extend_from_slice(fill);
                    }
                }

                Ok(data)
            },
        }
    }

    /// This function returns the value the field takes on a freshly built block.
    pub(crate) fn default_value(&self) -> Value {
        match &self.count {
            None => Value::Block(Box::new(BlockSlot::Known(crate::blocks::Block::new(&self.schema)))),
            Some(Sizing::Fixed(count)) => {
                let values = (0..*count)
                    .map(|_| Value::Block(Box::new(BlockSlot::Known(crate::blocks::Block::new(&self.schema)))))
                    .collect();
                Value::List(values)
            },
            Some(_) => Value::List(vec![]),
        }
    }

    /// This function parses one nested block, falling back to a raw slot on failure.
    fn parse_slot(&self, data: &[u8], parent: &Scope, state: &mut ParseState) -> (BlockSlot, u64) {
        match parse_nested(&self.schema, data, parent, state) {
            Ok((block, consumed)) => (BlockSlot::Known(block), consumed),
            Err(error) => {
                warn!("Nested parse of \"{}\" failed, keeping {} raw bytes: {error}", self.schema.name(), data.len());
                (BlockSlot::Unknown(data.to_vec()), data.len() as u64)
            },
        }
    }

    /// This function encodes one nested slot back to bytes.
    fn encode_slot(slot: &BlockSlot, scope: &Scope) -> Result<Vec<u8>> {
        match slot {
            BlockSlot::Known(block) => export_nested(block, Some(scope)),
            BlockSlot::Unknown(raw) => Ok(raw.clone()),
        }
    }
}
