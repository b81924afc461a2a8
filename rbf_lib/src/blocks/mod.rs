//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the definition of [`Block`], the composite record binding a
//! [`Schema`] to concrete decoded values.
//!
//! # Import
//!
//! [`Block::from_bytes`] walks the schema's fields in declaration order. For each field
//! it resolves the offset (explicit value, reference, or chained after the previous
//! field), decodes the value, remembers the byte range it came from, and moves the
//! cursor to the furthest end seen so far. Once every field is in, the schema's checks
//! run in verify mode. Bytes between fields (explicit offsets can leave holes) are kept
//! in a shadow copy of the source image, so they survive a round-trip verbatim.
//!
//! # Export
//!
//! [`Block::export_data`] is the reverse walk: counters bound to sequences are resynced
//! from the in-memory lengths (references describe the serialized form, they don't
//! dictate it), each field is reencoded at its resolved offset over the shadow image,
//! checks run in rewrite mode, and the whole-block transform (if any) runs in reverse.
//!
//! # Parents
//!
//! A block never owns a pointer to its parent. During parse, export and reference
//! evaluation the engine threads a [`Scope`] chain instead: a borrow of each ancestor
//! block, alive only while the operation runs. `_parent` references resolve against
//! that chain, and a schema using them refuses to parse as a root.

use getset::CopyGetters;
use log::error;

use std::sync::Arc;

use crate::error::{Result, RLibError};
use crate::refs::Ref;
use crate::schema::Schema;
use crate::transforms::TransformCtx;
use crate::value::{BlockSlot, Value};

#[cfg(test)] mod blocks_test;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This enum represents the observable lifecycle of a block.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BlockState {

    /// Default-constructed, never bound to bytes.
    #[default] Empty,

    /// Populated from bytes, or fully serialized since the last mutation.
    Bound,

    /// Mutated since the last import/export.
    Dirty,
}

/// This struct represents the byte range a field resolved to, block-relative.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Span {

    /// Start of the range.
    offset: u64,

    /// Size of the range, in bytes.
    size: u64,
}

/// This struct represents the evaluation scope of a block: the block itself, the layout
/// being resolved (during exports), and the chain of ancestors.
///
/// Scopes are built by the engine and live only as long as the parse/export/evaluation
/// that needs them: they are how `_parent` works without ownership cycles.
#[derive(Clone, Copy, Debug)]
pub struct Scope<'a> {
    block: &'a Block,
    spans: Option<&'a [Option<Span>]>,
    parent: Option<&'a Scope<'a>>,
}

/// This struct carries the bookkeeping of one parse: the stack of stream parses in
/// flight, used to refuse infinite recursion on self-referential schemas.
#[derive(Debug, Default)]
pub struct ParseState {
    active_streams: Vec<(usize, usize)>,
}

/// This struct represents an instance of a block class: a schema handle plus one value
/// slot per field.
///
/// Blocks come from [`Block::from_bytes`] (import) or [`Block::new`] (defaults), get
/// mutated through [`Block::set_value`], and serialize back through
/// [`Block::export_data`].
#[derive(Clone, Debug)]
pub struct Block {
    schema: Arc<Schema>,
    values: Vec<Value>,
    spans: Vec<Option<Span>>,
    shadow: Option<Vec<u8>>,
    state: BlockState,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `Span`.
impl Span {

    /// This function returns the end of the range.
    pub fn end(self) -> u64 {
        self.offset + self.size
    }
}

/// Implementation of `Scope`.
impl<'a> Scope<'a> {

    /// This function builds the scope of a root block.
    pub(crate) fn root(block: &'a Block) -> Self {
        Self {
            block,
            spans: None,
            parent: None,
        }
    }

    /// This function returns the block the scope evaluates on.
    pub fn block(&self) -> &'a Block {
        self.block
    }

    /// This function returns the scope of the containing block, if any.
    pub fn parent(&self) -> Option<&'a Scope<'a>> {
        self.parent
    }

    /// This function returns the resolved byte range of the provided field.
    ///
    /// During exports this reads the layout being built, not the one the block was
    /// imported with.
    pub fn span(&self, field: &str) -> Result<Span> {
        let index = self.block.schema().index_of(field)
            .ok_or_else(|| RLibError::RefPathNotFoundError(field.to_owned()))?;

        let spans = match self.spans {
            Some(spans) => spans,
            None => &self.block.spans,
        };

        spans.get(index).copied().flatten()
            .ok_or_else(|| RLibError::RefPathNotFoundError(field.to_owned()))
    }
}

/// Implementation of `ParseState`.
impl ParseState {

    /// This function registers a stream parse in flight, refusing reentry at the same position.
    pub(crate) fn enter_stream(&mut self, key: (usize, usize), schema_name: &str, offset: u64) -> Result<()> {
        if self.active_streams.contains(&key) {
            return Err(RLibError::DecodingRecursiveStreamError(schema_name.to_owned(), offset));
        }

        self.active_streams.push(key);
        Ok(())
    }

    /// This function unregisters a stream parse.
    pub(crate) fn exit_stream(&mut self, key: (usize, usize)) {
        if let Some(index) = self.active_streams.iter().position(|entry| *entry == key) {
            self.active_streams.remove(index);
        }
    }
}

/// Implementation of `Block`.
impl Block {

    /// This function builds a fresh block with every field set to its default value.
    pub fn new(schema: &Arc<Schema>) -> Self {
        let values = schema.fields().iter()
            .map(|field| field.descriptor().default_value())
            .collect::<Vec<_>>();
        let spans = vec![None; values.len()];

        Self {
            schema: schema.clone(),
            values,
            spans,
            shadow: None,
            state: BlockState::Empty,
        }
    }

    /// This function parses a block of the provided schema from raw bytes.
    ///
    /// A schema whose references escape to `_parent` cannot be parsed standalone.
    pub fn from_bytes(schema: &Arc<Schema>, data: &[u8]) -> Result<Self> {
        if schema.uses_parent() {
            return Err(RLibError::SchemaParentRefAtRootError(schema.name().to_owned()));
        }

        let mut state = ParseState::default();
        let (block, _) = parse_block(schema, data, None, &mut state)?;
        Ok(block)
    }

    /// This function rebuilds the byte image of the block.
    ///
    /// Counters bound to sequences are resynced from the in-memory lengths first, so
    /// the serialized counts always agree with the serialized elements.
    pub fn export_data(&mut self) -> Result<Vec<u8>> {
        self.sync_counters();
        let data = export_block(self, None)?;
        self.state = BlockState::Bound;
        Ok(data)
    }

    /// This function returns the serialized size of the block at its current state,
    /// without allocating the full image more than once.
    pub fn get_size(&self) -> Result<u64> {
        let mut spans: Vec<Option<Span>> = vec![None; self.values.len()];
        let mut cursor = 0u64;

        for (index, field) in self.schema.fields().iter().enumerate() {
            let scope = Scope { block: self, spans: Some(&spans), parent: None };
            let offset = match field.descriptor().offset() {
                Some(sizing) => sizing.resolve(&scope, 0)?,
                None => cursor,
            };

            let size = field.descriptor().measure(&self.values[index], &scope)
                .map_err(|error| error.annotate(self.schema.name(), field.name(), offset))?;

            spans[index] = Some(Span { offset, size });
            cursor = cursor.max(offset + size);
        }

        Ok(cursor)
    }

    /// This function returns the schema of the block.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// This function returns the lifecycle state of the block.
    pub fn state(&self) -> BlockState {
        self.state
    }

    /// This function returns the value of a top-level field.
    pub fn value(&self, field: &str) -> Result<&Value> {
        let index = self.schema.index_of(field)
            .ok_or_else(|| RLibError::SchemaFieldNotFoundError(field.to_owned(), self.schema.name().to_owned()))?;

        Ok(&self.values[index])
    }

    /// This function returns the value at a dotted path, navigating nested containers.
    pub fn value_at_path(&self, path: &str) -> Result<&Value> {
        let (first, rest) = match path.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (path, None),
        };

        let mut value = self.value(first)?;
        if let Some(rest) = rest {
            for segment in rest.split('.') {
                value = match segment.parse::<usize>() {
                    Ok(index) => value.element(index),
                    Err(_) => value.child(segment),
                }.ok_or_else(|| RLibError::RefPathNotFoundError(path.to_owned()))?;
            }
        }

        Ok(value)
    }

    /// This function sets the value at a dotted path.
    ///
    /// Top-level assignments are checked against the field's declared type and range.
    /// Assigning a sequence keeps its bound counter field consistent.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<()> {
        let (first, rest) = match path.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (path, None),
        };

        let index = self.schema.index_of(first)
            .ok_or_else(|| RLibError::SchemaFieldNotFoundError(first.to_owned(), self.schema.name().to_owned()))?;

        match rest {
            None => {
                self.schema.fields()[index].descriptor().accepts(&value)?;
                self.values[index] = value;

                let bindings = self.schema.counter_bindings().to_vec();
                for (sequence, counter) in bindings {
                    if sequence == index {
                        if let Some(len) = self.values[sequence].sequence_len() {
                            self.values[counter] = Value::Unsigned(len as u64);
                        }
                    }
                }
            },
            Some(rest) => {
                let mut slot = &mut self.values[index];
                for segment in rest.split('.') {
                    slot = match segment.parse::<usize>() {
                        Ok(element) => slot.element_mut(element),
                        Err(_) => slot.child_mut(segment),
                    }.ok_or_else(|| RLibError::RefPathNotFoundError(path.to_owned()))?;
                }

                *slot = value;
            },
        }

        self.state = BlockState::Dirty;
        Ok(())
    }

    /// This function returns the source byte range a field resolved to on import, if any.
    pub fn span(&self, field: &str) -> Option<Span> {
        let index = self.schema.index_of(field)?;
        self.spans[index]
    }

    /// This function evaluates a reference against the block, as a root.
    pub fn evaluate(&self, reference: &Ref) -> Result<Value> {
        reference.evaluate(&Scope::root(self))
    }

    /// This function returns the value of a top-level field as mutable, marking the block dirty.
    pub(crate) fn value_mut(&mut self, field: &str) -> Option<&mut Value> {
        let index = self.schema.index_of(field)?;
        self.state = BlockState::Dirty;
        Some(&mut self.values[index])
    }

    /// This function resyncs every counter bound to a sequence from the sequence's
    /// current in-memory length, recursively.
    fn sync_counters(&mut self) {
        let bindings = self.schema.counter_bindings().to_vec();
        for (sequence, counter) in bindings {
            if let Some(len) = self.values[sequence].sequence_len() {
                self.values[counter] = Value::Unsigned(len as u64);
            }
        }

        for value in &mut self.values {
            sync_nested(value);
        }
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.values == other.values
    }
}

//---------------------------------------------------------------------------//
//                          Parse/Export drivers
//---------------------------------------------------------------------------//

/// This function parses a nested block, returning it together with the bytes it consumed.
pub(crate) fn parse_nested(schema: &Arc<Schema>, data: &[u8], parent: &Scope, state: &mut ParseState) -> Result<(Block, u64)> {
    parse_block(schema, data, Some(parent), state)
}

/// This function exports a nested block to bytes, with its ancestors in scope.
pub(crate) fn export_nested(block: &Block, parent: Option<&Scope>) -> Result<Vec<u8>> {
    export_block(block, parent)
}

/// This function drives the ordered parse of one block.
fn parse_block(schema: &Arc<Schema>, data: &[u8], parent: Option<&Scope>, state: &mut ParseState) -> Result<(Block, u64)> {

    // Whole-block transform first: the schema describes the decoded bytes.
    let transformed;
    let data = match schema.transform() {
        Some(transform) => {
            transformed = transform.forward(data, &TransformCtx::new())?;
            &transformed[..]
        },
        None => data,
    };

    let field_count = schema.fields().len();
    let mut block = Block {
        schema: schema.clone(),
        values: vec![Value::None; field_count],
        spans: vec![None; field_count],
        shadow: None,
        state: BlockState::Bound,
    };

    let mut cursor = 0u64;
    for (index, field) in schema.fields().iter().enumerate() {
        let (offset, value, consumed) = {
            let scope = Scope { block: &block, spans: None, parent };
            let offset = match field.descriptor().offset() {
                Some(sizing) => sizing.resolve(&scope, 0)
                    .map_err(|error| error.annotate(schema.name(), field.name(), cursor))?,
                None => cursor,
            };

            let (value, consumed) = field.descriptor().decode(data, offset, &scope, state)
                .map_err(|error| error.annotate(schema.name(), field.name(), offset))?;

            (offset, value, consumed)
        };

        block.values[index] = value;
        block.spans[index] = Some(Span { offset, size: consumed });
        cursor = cursor.max(offset + consumed);
    }

    // Checks, verify mode. Failures are never silently recovered.
    {
        let scope = Scope { block: &block, spans: None, parent };
        for check in schema.checks() {
            if let Err(error) = check.verify(&scope, &data[..cursor as usize]) {
                error!("Check \"{}\" failed while importing a \"{}\" block: {error}", check.name(), schema.name());
                return Err(error);
            }
        }
    }

    // If the layout left holes between fields, keep the source image so the hole
    // bytes survive a round-trip.
    if has_gaps(&block.spans) {
        block.shadow = Some(data[..cursor as usize].to_vec());
    }

    Ok((block, cursor))
}

/// This function drives the ordered export of one block.
fn export_block(block: &Block, parent: Option<&Scope>) -> Result<Vec<u8>> {
    let schema = block.schema();

    // Fail before writing anything if the block is read-only.
    if let Some(transform) = schema.transform() {
        if !transform.is_invertible() {
            return Err(RLibError::TransformNotInvertibleError(transform.name().to_owned()));
        }
    }

    // Holes between fields start from the imported bytes, or zero-filled on fresh blocks.
    let mut data = block.shadow.clone().unwrap_or_default();
    let mut spans: Vec<Option<Span>> = vec![None; block.values.len()];
    let mut cursor = 0u64;

    for (index, field) in schema.fields().iter().enumerate() {
        let (offset, bytes) = {
            let scope = Scope { block, spans: Some(&spans), parent };
            let offset = match field.descriptor().offset() {
                Some(sizing) => sizing.resolve(&scope, 0)
                    .map_err(|error| error.annotate(schema.name(), field.name(), cursor))?,
                None => cursor,
            };

            let bytes = field.descriptor().encode(&block.values[index], &scope)
                .map_err(|error| error.annotate(schema.name(), field.name(), offset))?;

            (offset, bytes)
        };

        write_at(&mut data, offset, &bytes);
        spans[index] = Some(Span { offset, size: bytes.len() as u64 });
        cursor = cursor.max(offset + bytes.len() as u64);
    }

    data.resize(cursor as usize, 0);

    // Checks, rewrite mode.
    {
        let scope = Scope { block, spans: Some(&spans), parent };
        for check in schema.checks() {
            check.fixup(&scope, &mut data)?;
        }
    }

    match schema.transform() {
        Some(transform) => transform.reverse(&data, &TransformCtx::new()),
        None => Ok(data),
    }
}

/// This function writes bytes at an offset, growing the buffer zero-filled if needed.
fn write_at(data: &mut Vec<u8>, offset: u64, bytes: &[u8]) {
    let start = offset as usize;
    let end = start + bytes.len();
    if data.len() < end {
        data.resize(end, 0);
    }

    data[start..end].copy_from_slice(bytes);
}

/// This function returns whether the resolved layout leaves bytes uncovered.
fn has_gaps(spans: &[Option<Span>]) -> bool {
    let mut ranges = spans.iter()
        .flatten()
        .map(|span| (span.offset(), span.end()))
        .collect::<Vec<_>>();
    ranges.sort_unstable();

    let mut cursor = 0u64;
    for (start, end) in ranges {
        if start > cursor {
            return true;
        }
        cursor = cursor.max(end);
    }

    false
}

/// This function recursively resyncs the counters of nested blocks.
fn sync_nested(value: &mut Value) {
    match value {
        Value::Block(slot) => {
            if let BlockSlot::Known(block) = &mut **slot {
                block.sync_counters();
            }
        },
        Value::List(values) => values.iter_mut().for_each(sync_nested),
        Value::Chunk(chunk) => {
            if let Some(BlockSlot::Known(block)) = chunk.payload_mut() {
                block.sync_counters();
            }
        },
        _ => {},
    }
}
