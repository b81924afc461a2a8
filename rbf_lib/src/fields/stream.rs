//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the stream field kind: nested blocks parsed back to back until the data runs out.
//!
//! Unlike a counted sequence, a stream has no idea how many elements it holds until it
//! has parsed them. An empty region is an empty sequence, not an error. A per-parse
//! guard refuses to recurse into a schema already being parsed at the same position,
//! so a self-referential schema terminates instead of recursing forever.

use getset::Getters;
use log::warn;

use std::sync::Arc;

use crate::blocks::{parse_nested, export_nested, ParseState, Scope};
use crate::error::{RLibError, Result};
use crate::fields::tail;
use crate::schema::Schema;
use crate::value::{BlockSlot, Value};

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This struct describes a stream of nested blocks.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct StreamField {

    /// Schema of the stream's elements.
    schema: Arc<Schema>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `StreamField`.
impl StreamField {

    /// This function builds a stream field over the provided element schema.
    pub fn new(schema: &Arc<Schema>) -> Self {
        Self { schema: schema.clone() }
    }

    /// This function decodes the field's value from `data` at `offset`.
    pub(crate) fn decode(&self, data: &[u8], offset: u64, scope: &Scope, state: &mut ParseState) -> Result<(Value, u64)> {
        let mut values = vec![];
        let mut pos = offset;

        while pos < data.len() as u64 {
            let rest = tail(data, pos)?;

            // Refuse to recurse into ourselves at the same position.
            let key = (Arc::as_ptr(&self.schema) as *const () as usize, rest.as_ptr() as usize);
            state.enter_stream(key, self.schema.name(), pos)?;
            let result = parse_nested(&self.schema, rest, scope, state);
            state.exit_stream(key);

            match result {
                Ok((block, consumed)) => {
                    if consumed == 0 {
                        return Err(RLibError::DecodingZeroSizeStreamElementError(self.schema.name().to_owned()));
                    }

                    values.push(Value::Block(Box::new(BlockSlot::Known(block))));
                    pos += consumed;
                },
                Err(error) => {
                    warn!("Stream element of \"{}\" failed to parse, keeping {} raw bytes: {error}", self.schema.name(), rest.len());
                    values.push(Value::Block(Box::new(BlockSlot::Unknown(rest.to_vec()))));
                    pos = data.len() as u64;
                },
            }
        }

        Ok((Value::List(values), pos - offset))
    }

    /// This function encodes the field's value back to bytes.
    pub(crate) fn encode(&self, value: &Value, scope: &Scope) -> Result<Vec<u8>> {
        let values = value.as_list()?;
        let mut data = vec![];

        for value in values {
            match value.as_block()? {
                BlockSlot::Known(block) => data.extend_from_slice(&export_nested(block, Some(scope))?),
                BlockSlot::Unknown(raw) => data.extend_from_slice(raw),
            }
        }

        Ok(data)
    }
}
