//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the definition of [`Ref`], the expression language used to drive
//! offsets, lengths and counts from the values of other fields.
//!
//! A [`Ref`] is a small immutable expression tree, parsed once when a schema is built and
//! evaluated lazily against a [`Scope`] during parse and export. Evaluation never caches:
//! the same Ref on the same block state always resolves to the same value.
//!
//! The supported forms are:
//! - `Ref::path("a.b.c")`: dotted attribute path, with `_parent` escapes and numeric
//!   list indices (`_parent.entries.0.size`).
//! - `Ref::end_offset("field")`: resolved end position of a sibling field.
//! - `Ref::size_of("field")`: resolved size of a sibling field.
//! - `Ref::literal(n)`: a constant.
//! - Arithmetic combinations of the above, through [`Ref::plus`], [`Ref::minus`] and
//!   [`Ref::times`].
//!
//! Anything more complex (indexing on computed values, conditionals) is out of the Ref
//! language on purpose: expose a computed field on the block instead.

use std::fmt;

use crate::blocks::Scope;
use crate::error::{RLibError, Result};
use crate::value::Value;


//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This enum represents one segment of a dotted reference path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSeg {

    /// Named attribute of the current container.
    Attr(String),

    /// Escape to the containing block.
    Parent,

    /// Literal index into a sequence.
    Index(usize),
}

/// This enum represents a reference expression, evaluated lazily against a block.
#[derive(Clone, Debug, PartialEq)]
pub enum Ref {

    /// A constant value.
    Const(u64),

    /// A dotted attribute path.
    Path(Vec<PathSeg>),

    /// The resolved end offset of a sibling field.
    EndOffset(String),

    /// The resolved size of a sibling field.
    SizeOf(String),

    /// An arithmetic combination of two references.
    Arith(Box<Ref>, ArithOp, Box<Ref>),
}

/// This enum represents the arithmetic operators usable between references.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `Ref`.
impl Ref {

    /// This function builds a reference from a dotted path string.
    ///
    /// Each segment is either an attribute name, the `_parent` escape, or a literal
    /// index into a sequence. Malformed paths are reported when the schema is built.
    pub fn path(path: &str) -> Self {
        let segments = path.split('.')
            .map(|segment| {
                if segment == "_parent" {
                    PathSeg::Parent
                } else if let Ok(index) = segment.parse::<usize>() {
                    PathSeg::Index(index)
                } else {
                    PathSeg::Attr(segment.to_owned())
                }
            })
            .collect();

        Self::Path(segments)
    }

    /// This function builds a constant reference.
    pub fn literal(value: u64) -> Self {
        Self::Const(value)
    }

    /// This function builds a reference to the resolved end offset of a sibling field.
    pub fn end_offset(field: &str) -> Self {
        Self::EndOffset(field.to_owned())
    }

    /// This function builds a reference to the resolved size of a sibling field.
    pub fn size_of(field: &str) -> Self {
        Self::SizeOf(field.to_owned())
    }

    /// This function combines two references with an addition.
    pub fn plus(self, other: Self) -> Self {
        Self::Arith(Box::new(self), ArithOp::Add, Box::new(other))
    }

    /// This function combines two references with a subtraction.
    pub fn minus(self, other: Self) -> Self {
        Self::Arith(Box::new(self), ArithOp::Sub, Box::new(other))
    }

    /// This function combines two references with a multiplication.
    pub fn times(self, other: Self) -> Self {
        Self::Arith(Box::new(self), ArithOp::Mul, Box::new(other))
    }

    /// This function evaluates the reference against the provided scope.
    ///
    /// Missing attributes and unpopulated fields are errors, never silent zeros.
    pub fn evaluate(&self, scope: &Scope) -> Result<Value> {
        match self {
            Self::Const(value) => Ok(Value::Unsigned(*value)),

            Self::Path(segments) => {
                let mut current = scope;
                let mut iter = segments.iter().peekable();

                // Leading escapes move us up the parent chain.
                while let Some(PathSeg::Parent) = iter.peek() {
                    iter.next();
                    current = current.parent().ok_or(RLibError::RefParentOfRootError)?;
                }

                // The first real segment resolves against the block's fields.
                let mut value = match iter.next() {
                    Some(PathSeg::Attr(name)) => current.block().value(name)
                        .map_err(|_| RLibError::RefPathNotFoundError(self.to_string()))?,
                    _ => return Err(RLibError::RefPathNotFoundError(self.to_string())),
                };

                // The rest navigate into containers.
                for segment in iter {
                    value = match segment {
                        PathSeg::Attr(name) => value.child(name),
                        PathSeg::Index(index) => value.element(*index),
                        PathSeg::Parent => None,
                    }.ok_or_else(|| RLibError::RefPathNotFoundError(self.to_string()))?;
                }

                if matches!(value, Value::None) {
                    return Err(RLibError::RefPathNotFoundError(self.to_string()));
                }

                Ok(value.clone())
            },

            Self::EndOffset(field) => {
                let span = scope.span(field)?;
                Ok(Value::Unsigned(span.end()))
            },

            Self::SizeOf(field) => {
                let span = scope.span(field)?;
                Ok(Value::Unsigned(span.size()))
            },

            Self::Arith(lhs, op, rhs) => {
                let lhs = lhs.evaluate(scope)?.as_unsigned()
                    .map_err(|_| RLibError::RefTypeMismatchError(self.to_string(), "an integer".to_owned()))?;
                let rhs = rhs.evaluate(scope)?.as_unsigned()
                    .map_err(|_| RLibError::RefTypeMismatchError(self.to_string(), "an integer".to_owned()))?;

                let result = match op {
                    ArithOp::Add => lhs.checked_add(rhs),
                    ArithOp::Sub => lhs.checked_sub(rhs),
                    ArithOp::Mul => lhs.checked_mul(rhs),
                };

                match result {
                    Some(value) => Ok(Value::Unsigned(value)),
                    None => Err(RLibError::RefEvaluationError(self.to_string(), "arithmetic overflow".to_owned())),
                }
            },
        }
    }

    /// This function evaluates the reference and coerces the result to an offset/count.
    pub fn evaluate_unsigned(&self, scope: &Scope) -> Result<u64> {
        self.evaluate(scope)?.as_unsigned()
            .map_err(|_| RLibError::RefTypeMismatchError(self.to_string(), "an offset or count".to_owned()))
    }

    /// This function returns whether the reference walks up to a parent block.
    pub(crate) fn uses_parent(&self) -> bool {
        match self {
            Self::Const(_) | Self::EndOffset(_) | Self::SizeOf(_) => false,
            Self::Path(segments) => segments.iter().any(|segment| *segment == PathSeg::Parent),
            Self::Arith(lhs, _, rhs) => lhs.uses_parent() || rhs.uses_parent(),
        }
    }

    /// This function collects the sibling fields this reference depends on.
    ///
    /// Parent-escaping paths depend on no sibling: they're resolved on another block.
    pub(crate) fn sibling_deps<'a>(&'a self, deps: &mut Vec<&'a str>) {
        match self {
            Self::Const(_) => {},
            Self::Path(segments) => {
                if let Some(PathSeg::Attr(name)) = segments.first() {
                    deps.push(name);
                }
            },
            Self::EndOffset(field) | Self::SizeOf(field) => deps.push(field),
            Self::Arith(lhs, _, rhs) => {
                lhs.sibling_deps(deps);
                rhs.sibling_deps(deps);
            },
        }
    }

    /// This function returns the sibling field this reference binds as a plain counter, if any.
    ///
    /// Only a bare single-segment path counts: anything else describes a value we cannot
    /// write back to on export.
    pub(crate) fn count_target(&self) -> Option<&str> {
        match self {
            Self::Path(segments) => match segments.as_slice() {
                [PathSeg::Attr(name)] => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// This function checks the reference is well-formed. Used when building schemas.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Const(_) => Ok(()),
            Self::Path(segments) => {
                if segments.is_empty() {
                    return Err(RLibError::RefEvaluationError(self.to_string(), "empty path".to_owned()));
                }

                // Parent escapes are only legal as a prefix.
                let mut seen_attr = false;
                for segment in segments {
                    match segment {
                        PathSeg::Parent if seen_attr => return Err(RLibError::RefEvaluationError(self.to_string(), "\"_parent\" after an attribute".to_owned())),
                        PathSeg::Attr(name) if name.is_empty() => return Err(RLibError::RefEvaluationError(self.to_string(), "empty path segment".to_owned())),
                        PathSeg::Attr(_) | PathSeg::Index(_) => seen_attr = true,
                        PathSeg::Parent => {},
                    }
                }

                Ok(())
            },
            Self::EndOffset(field) | Self::SizeOf(field) => {
                if field.is_empty() {
                    return Err(RLibError::RefEvaluationError(self.to_string(), "empty field name".to_owned()));
                }
                Ok(())
            },
            Self::Arith(lhs, _, rhs) => {
                lhs.validate()?;
                rhs.validate()
            },
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "{value}"),
            Self::Path(segments) => {
                let path = segments.iter()
                    .map(|segment| match segment {
                        PathSeg::Attr(name) => name.to_owned(),
                        PathSeg::Parent => "_parent".to_owned(),
                        PathSeg::Index(index) => index.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                write!(f, "{path}")
            },
            Self::EndOffset(field) => write!(f, "end_offset({field})"),
            Self::SizeOf(field) => write!(f, "size_of({field})"),
            Self::Arith(lhs, op, rhs) => {
                let op = match op {
                    ArithOp::Add => "+",
                    ArithOp::Sub => "-",
                    ArithOp::Mul => "*",
                };
                write!(f, "({lhs} {op} {rhs})")
            },
        }
    }
}
