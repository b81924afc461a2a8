//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the code to declare [`Schema`]s, the layout descriptions blocks
//! are parsed and exported through.
//!
//! A schema is an ordered list of `(name, field descriptor)` pairs, plus optional checks
//! and an optional whole-block transform. Declaration order is the wire order: a field
//! with no explicit offset starts where the previous one ended.
//!
//! Schemas are built once through [`SchemaBuilder`], validated, then frozen behind an
//! [`Arc`] and shared by every block instance. All the illegal-schema situations we can
//! catch without data are caught here, at build time: duplicate field names, references
//! to unknown siblings, forward/self references in offsets and counts (the cyclic-Ref
//! case), non-terminal greedy fields, and invalid bit masks.

use getset::Getters;

use std::collections::HashMap;
use std::sync::Arc;

use crate::checks::Check;
use crate::error::{Result, RLibError};
use crate::fields::{FieldDescriptor, FieldKind};
use crate::fields::numeric::NumericKind;
use crate::transforms::Transform;

#[cfg(test)] mod schema_test;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This struct represents one named field of a schema.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct SchemaField {

    /// Name the field binds to on block instances.
    name: String,

    /// Rule interpreting the field's bytes.
    descriptor: FieldDescriptor,
}

/// This struct represents the frozen layout description of a block class.
#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct Schema {

    /// Name of the block class, used on diagnostics.
    name: String,

    /// Ordered fields. Declaration order is the wire order.
    fields: Vec<SchemaField>,

    /// Checks to verify on import and fix up on export.
    checks: Vec<Arc<dyn Check>>,

    /// Transform applied to the whole block region before parse / after export.
    transform: Option<Arc<dyn Transform>>,

    /// Field name -> index lookup, so runtime access never scans.
    #[getset(skip)]
    lookup: HashMap<String, usize>,

    /// Pairs of (sequence field, counter field) kept consistent on mutation/export.
    #[getset(skip)]
    counter_bindings: Vec<(usize, usize)>,

    /// Whether any reference of this schema escapes to a parent block.
    #[getset(skip)]
    uses_parent: bool,

    /// Whether the last field consumes until the end of the buffer.
    #[getset(skip)]
    greedy: bool,
}

/// This struct builds and validates a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<SchemaField>,
    checks: Vec<Arc<dyn Check>>,
    transform: Option<Arc<dyn Transform>>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `Schema`.
impl Schema {

    /// This function returns the index of the provided field, if it exists.
    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.lookup.get(field).copied()
    }

    /// This function returns the descriptor of the provided field, if it exists.
    pub fn field(&self, field: &str) -> Option<&SchemaField> {
        self.index_of(field).map(|index| &self.fields[index])
    }

    /// This function returns whether any reference of this schema escapes to a parent block.
    pub fn uses_parent(&self) -> bool {
        self.uses_parent
    }

    /// This function returns whether the last field consumes until the end of the buffer.
    pub fn greedy(&self) -> bool {
        self.greedy
    }

    /// This function returns the (sequence, counter) field pairs kept consistent on export.
    pub(crate) fn counter_bindings(&self) -> &[(usize, usize)] {
        &self.counter_bindings
    }
}

/// Implementation of `SchemaBuilder`.
impl SchemaBuilder {

    /// This function starts a new schema with the provided block class name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    /// This function appends a field to the schema. Declaration order is the wire order.
    pub fn field(mut self, name: &str, descriptor: impl Into<FieldDescriptor>) -> Self {
        self.fields.push(SchemaField {
            name: name.to_owned(),
            descriptor: descriptor.into(),
        });
        self
    }

    /// This function attaches a check to the schema.
    pub fn check(mut self, check: Arc<dyn Check>) -> Self {
        self.checks.push(check);
        self
    }

    /// This function sets the transform applied to the whole block region.
    pub fn transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// This function validates the schema and freezes it for sharing.
    pub fn build(self) -> Result<Arc<Schema>> {
        let mut lookup: HashMap<String, usize> = HashMap::with_capacity(self.fields.len());
        let mut uses_parent = false;

        // Pass 1: names must be unique.
        for (index, field) in self.fields.iter().enumerate() {
            if lookup.insert(field.name().to_owned(), index).is_some() {
                return Err(RLibError::SchemaDuplicateFieldError(self.name.to_owned(), field.name().to_owned()));
            }
        }

        // Pass 2: per-field rules.
        for (index, field) in self.fields.iter().enumerate() {
            let descriptor = field.descriptor();

            // References must be well-formed, and may only look at already-populated
            // siblings: self/forward references cannot resolve while parsing.
            let mut refs = vec![];
            descriptor.refs(&mut refs);
            for reference in &refs {
                reference.validate()?;
                uses_parent |= reference.uses_parent();

                let mut deps = vec![];
                reference.sibling_deps(&mut deps);
                for dep in deps {
                    match lookup.get(dep) {
                        None => return Err(RLibError::SchemaUnknownFieldRefError(self.name.to_owned(), dep.to_owned())),
                        Some(&dep_index) if dep_index >= index => {
                            return Err(RLibError::SchemaCyclicRefError(self.name.to_owned(), field.name().to_owned(), dep.to_owned()));
                        },
                        Some(_) => {},
                    }
                }
            }

            // Greedy fields can only close the schema.
            if descriptor.is_stream_sized() && index != self.fields.len() - 1 {
                return Err(RLibError::SchemaStreamFieldNotLastError(self.name.to_owned(), field.name().to_owned()));
            }

            match descriptor.kind() {
                FieldKind::Bits(bits) => bits.validate(field.name())?,

                // A transformed field needs a known raw window, unless its kind can
                // size its own.
                _ => if descriptor.transform().is_some() && descriptor.region().is_none() && !matches!(descriptor.kind(), FieldKind::Bytes(_)) {
                    return Err(RLibError::SchemaTransformNeedsRegionError(self.name.to_owned(), field.name().to_owned()));
                },
            }
        }

        // Pass 3: bind sequences to the integer counters that drive them, so exports
        // can resync them from the in-memory sequence lengths.
        let mut counter_bindings = vec![];
        for (index, field) in self.fields.iter().enumerate() {
            if let Some(target) = field.descriptor().counter_binding() {
                if let Some(&counter_index) = lookup.get(target) {
                    if Self::is_integer_counter(self.fields[counter_index].descriptor()) {
                        counter_bindings.push((index, counter_index));
                    }
                }
            }
        }

        let greedy = self.fields.last().is_some_and(|field| field.descriptor().is_stream_sized());

        Ok(Arc::new(Schema {
            name: self.name,
            fields: self.fields,
            checks: self.checks,
            transform: self.transform,
            lookup,
            counter_bindings,
            uses_parent,
            greedy,
        }))
    }

    /// This function returns whether a descriptor can hold a resynced sequence count.
    fn is_integer_counter(descriptor: &FieldDescriptor) -> bool {
        match descriptor.kind() {
            FieldKind::Numeric(numeric) => !matches!(numeric.kind(), NumericKind::Bool | NumericKind::F32 | NumericKind::F64),
            _ => false,
        }
    }
}
