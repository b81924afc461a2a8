//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains all kind of errors used inside this crate.
//!
//! Apart of the error enum itself, there's an [`ErrorKind`] tag so callers can
//! match on the category of a failure without caring about the specific variant.

use thiserror::Error;

/// Custom `Result` type, to always return our custom error.
pub type Result<T, E = RLibError> = core::result::Result<T, E>;

/// Broad categories for [`RLibError`] variants, for machine inspection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {

    /// Not enough bytes to satisfy a field's resolved size.
    ShortBuffer,

    /// Value outside its declared range/allowed set.
    ConstraintViolation,

    /// Malformed content found while decoding.
    DecodeError,

    /// Caller-supplied value cannot be represented in the declared layout.
    EncodeError,

    /// A check's verify hook failed on import.
    CheckFailed,

    /// A reference expression did not resolve, or resolved to the wrong type.
    RefError,

    /// The reference graph of a schema has a cycle or a forward reference.
    CyclicRef,

    /// Export attempted through a transform with no reverse direction.
    TransformNotInvertible,

    /// Illegal schema declaration.
    SchemaError,

    /// Any other I/O failure.
    Io,
}

/// Custom error type for the lib.
#[derive(Error, Debug)]
pub enum RLibError {

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Error trying to decode \"{0}\" as boolean: invalid value.")]
    DecodingBoolError(u8),

    #[error(transparent)]
    DecodeUTF8Error(#[from] std::string::FromUtf8Error),

    #[error("Error trying to decode an UTF-16 String: the input has an uneven ({0}) amount of bytes.")]
    DecodeUTF16UnevenInputError(usize),

    #[error("Error trying to decode an {0} String: undecodable bytes found.")]
    DecodingStringUndecodableError(String),

    #[error("Error trying to read a terminated String: no terminator byte found.")]
    DecodingStringTerminatorNotFound,

    #[error("Error trying to decode an ULEB128 value: the value does not fit in 64 bits.")]
    DecodingUleb128TooLongError,

    #[error("Not enough bytes to decode: required {0}, available {1}.")]
    NotEnoughBytesError(u64, u64),

    #[error("Value {0} is outside the allowed range {1}.")]
    ValueOutsideRangeError(String, String),

    #[error("Value {0} is not part of the allowed set {1}.")]
    ValueNotAllowedError(String, String),

    #[error("Error trying to encode the value {0} as {1}: the value does not fit in the declared width.")]
    EncodingIntegerOverflowError(String, String),

    #[error("Error trying to encode an {0}: \"{1}\" has a length of {2} bytes, but his length should be less or equal than {3}.")]
    EncodingPaddedStringError(String, String, usize, usize),

    #[error("Error trying to encode a String: \"{0}\" has a length of {1} bytes, but the maximum allowed is {2}.")]
    EncodingStringTooLongError(String, usize, usize),

    #[error("Error trying to encode a fixed-length byte run: the value has {0} bytes but the declared length is {1}.")]
    EncodingFixedBytesLengthError(usize, usize),

    #[error("Error trying to encode the String \"{0}\": it contains characters unrepresentable in the target encoding.")]
    EncodingUnrepresentableCharError(String),

    #[error("Expected a {0} value, found a {1} value.")]
    MismatchedValueTypeError(String, String),

    #[error("The check \"{0}\" failed at offset {1}.")]
    CheckFailedError(String, u64),

    #[error("The reference path \"{0}\" does not resolve on this block.")]
    RefPathNotFoundError(String),

    #[error("The reference \"{0}\" resolved to a value that is not usable as {1}.")]
    RefTypeMismatchError(String, String),

    #[error("A \"_parent\" reference was evaluated on a block with no parent.")]
    RefParentOfRootError,

    #[error("The reference expression \"{0}\" failed to evaluate: {1}.")]
    RefEvaluationError(String, String),

    #[error("The schema \"{0}\" declares the field \"{1}\" twice.")]
    SchemaDuplicateFieldError(String, String),

    #[error("The schema \"{0}\" references the unknown sibling field \"{1}\".")]
    SchemaUnknownFieldRefError(String, String),

    #[error("The schema \"{0}\" has a cyclic or forward reference: \"{1}\" depends on \"{2}\".")]
    SchemaCyclicRefError(String, String, String),

    #[error("The schema \"{0}\" declares the stream-sized field \"{1}\" in a non-terminal position.")]
    SchemaStreamFieldNotLastError(String, String),

    #[error("The bits field \"{0}\" declares an invalid mask for the sub-field \"{1}\".")]
    SchemaBitsInvalidMaskError(String, String),

    #[error("The schema \"{0}\" uses \"_parent\" references and cannot be parsed as a root block.")]
    SchemaParentRefAtRootError(String),

    #[error("The field \"{0}\" is not declared on the schema \"{1}\".")]
    SchemaFieldNotFoundError(String, String),

    #[error("The schema \"{0}\" declares a transform on the field \"{1}\" without a raw window to apply it to.")]
    SchemaTransformNeedsRegionError(String, String),

    #[error("The stream field refused to recurse into the schema \"{0}\" at offset {1}.")]
    DecodingRecursiveStreamError(String, u64),

    #[error("The stream field parsed a zero-size element of the schema \"{0}\" and refused to loop.")]
    DecodingZeroSizeStreamElementError(String),

    #[error("The transform \"{0}\" has no reverse direction, so this data cannot be exported.")]
    TransformNotInvertibleError(String),

    #[error("The transform \"{0}\" failed to decode the data: {1}.")]
    TransformDecodeError(String, String),

    #[error("The transform \"{0}\" failed to encode the data: {1}.")]
    TransformEncodeError(String, String),

    #[error("Error processing the field \"{field}\" of the block \"{block}\" at offset {offset}: {source}")]
    FieldError {
        block: String,
        field: String,
        offset: u64,
        source: Box<RLibError>,
    },
}

/// Implementation of `RLibError`.
impl RLibError {

    /// This function returns the category of the error, for machine inspection.
    ///
    /// Field annotations are transparent: the kind reported is the kind of the underlying error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IoError(error) => if error.kind() == std::io::ErrorKind::UnexpectedEof { ErrorKind::ShortBuffer } else { ErrorKind::Io },
            Self::NotEnoughBytesError(..) => ErrorKind::ShortBuffer,

            Self::DecodingBoolError(_) |
            Self::DecodeUTF8Error(_) |
            Self::DecodeUTF16UnevenInputError(_) |
            Self::DecodingStringUndecodableError(_) |
            Self::DecodingStringTerminatorNotFound |
            Self::DecodingUleb128TooLongError |
            Self::DecodingRecursiveStreamError(..) |
            Self::DecodingZeroSizeStreamElementError(_) |
            Self::TransformDecodeError(..) => ErrorKind::DecodeError,

            Self::ValueOutsideRangeError(..) |
            Self::ValueNotAllowedError(..) => ErrorKind::ConstraintViolation,

            Self::EncodingIntegerOverflowError(..) |
            Self::EncodingPaddedStringError(..) |
            Self::EncodingStringTooLongError(..) |
            Self::EncodingFixedBytesLengthError(..) |
            Self::EncodingUnrepresentableCharError(_) |
            Self::MismatchedValueTypeError(..) |
            Self::TransformEncodeError(..) => ErrorKind::EncodeError,

            Self::CheckFailedError(..) => ErrorKind::CheckFailed,

            Self::RefPathNotFoundError(_) |
            Self::RefTypeMismatchError(..) |
            Self::RefParentOfRootError |
            Self::RefEvaluationError(..) => ErrorKind::RefError,

            Self::SchemaCyclicRefError(..) => ErrorKind::CyclicRef,

            Self::SchemaDuplicateFieldError(..) |
            Self::SchemaUnknownFieldRefError(..) |
            Self::SchemaStreamFieldNotLastError(..) |
            Self::SchemaBitsInvalidMaskError(..) |
            Self::SchemaParentRefAtRootError(_) |
            Self::SchemaFieldNotFoundError(..) |
            Self::SchemaTransformNeedsRegionError(..) => ErrorKind::SchemaError,

            Self::TransformNotInvertibleError(_) => ErrorKind::TransformNotInvertible,

            Self::FieldError { source, .. } => source.kind(),
        }
    }

    /// This function wraps an error with the block/field/offset it happened at.
    pub(crate) fn annotate(self, block: &str, field: &str, offset: u64) -> Self {
        Self::FieldError {
            block: block.to_owned(),
            field: field.to_owned(),
            offset,
            source: Box::new(self),
        }
    }

    /// This function returns the dotted field path an annotated error happened at, if any.
    ///
    /// Nested annotations are joined innermost-last, so a failure three blocks deep
    /// reads `root_field.child_field.grandchild_field`.
    pub fn path(&self) -> Option<String> {
        match self {
            Self::FieldError { field, source, .. } => {
                match source.path() {
                    Some(inner) => Some(format!("{field}.{inner}")),
                    None => Some(field.to_owned()),
                }
            },
            _ => None,
        }
    }

    /// This function returns the byte offset of the innermost annotated error, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::FieldError { offset, source, .. } => Some(source.offset().unwrap_or(*offset)),
            _ => None,
        }
    }
}
