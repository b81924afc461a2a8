//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This crate contains the core functionality to describe, decode and reencode
//! proprietary binary file formats.
//!
//! The workflow is always the same: declare the layout of a format as a
//! [`Schema`](crate::schema::Schema) (an ordered list of named
//! [field descriptors](crate::fields::FieldDescriptor), plus optional
//! [checks](crate::checks::Check) and [transforms](crate::transforms::Transform)),
//! parse raw bytes into a [`Block`](crate::blocks::Block), poke at its values, and
//! export it back to bytes. As long as nothing was mutated, the exported bytes are
//! identical to the imported ones, unknown corners of the format included.
//!
//! ```rust
//! use rbf_lib::blocks::Block;
//! use rbf_lib::fields::numeric::{Endianness, NumericField, NumericKind};
//! use rbf_lib::schema::SchemaBuilder;
//! use rbf_lib::value::Value;
//!
//! let schema = SchemaBuilder::new("Header")
//!     .field("version", NumericField::new(NumericKind::U16, Endianness::Big))
//!     .build()
//!     .unwrap();
//!
//! let mut block = Block::from_bytes(&schema, &[0x01, 0x02]).unwrap();
//! assert_eq!(block.value("version").unwrap(), &Value::Unsigned(258));
//!
//! block.set_value("version", Value::Unsigned(3)).unwrap();
//! assert_eq!(block.export_data().unwrap(), vec![0x00, 0x03]);
//! ```
//!
//! This crate only moves bytes in memory: loading files from disk, dispatching them to
//! schemas and anything UI-shaped lives in the tools built on top of it.

pub mod binary;
pub mod blocks;
pub mod checks;
pub mod error;
pub mod fields;
pub mod refs;
pub mod schema;
pub mod transforms;
pub mod value;
