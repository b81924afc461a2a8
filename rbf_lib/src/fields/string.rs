//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the string field kind.
//!
//! Strings come in three layouts:
//! - **Fixed**: a region of a known size, 00-padded after the content.
//! - **Terminated**: content up to a NUL character, with an optional max length.
//! - **Size-prefixed**: a small integer with the content size, then the content.
//!
//! The prefix counts bytes for the single-byte encodings and characters for UTF-16,
//! because that's what every format we've reversed so far does.
//!
//! Decode failures (invalid UTF-8, unpaired surrogates) are errors: we'd rather fail an
//! import than round-trip mangled text.

use encoding_rs::{ISO_8859_15, UTF_16BE, UTF_16LE};
use getset::Getters;

use std::io::Cursor;

use crate::binary::{ReadBytes, WriteBytes};
use crate::blocks::Scope;
use crate::error::{RLibError, Result};
use crate::fields::{tail, window, IntWidth, Sizing};
use crate::fields::numeric::Endianness;
use crate::refs::Ref;
use crate::value::Value;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This enum represents the text encodings we can decode strings from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextEncoding {
    Utf8,
    Iso8859_15,
    Utf16Le,
    Utf16Be,
}

/// This enum represents the byte layout of a string field.
#[derive(Clone, Debug)]
pub enum StringLayout {

    /// A region of a known size, 00-padded after the content.
    FixedPadded(Sizing),

    /// Content up to a NUL character, with an optional max content length in bytes.
    Terminated(Option<u64>),

    /// A size prefix, then the content.
    SizePrefixed(IntWidth),
}

/// This struct describes one string field.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct StringField {

    /// Text encoding of the content.
    encoding: TextEncoding,

    /// Byte layout of the field.
    layout: StringLayout,

    /// Byte order of the size prefix, if the layout has one.
    endian: Endianness,

    /// Value used when building a fresh block.
    default: Option<String>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

/// Implementation of `StringField`.
impl StringField {

    /// This function builds a 00-padded string field over a region of a constant size.
    pub fn fixed(encoding: TextEncoding, length: u64) -> Self {
        Self {
            encoding,
            layout: StringLayout::FixedPadded(Sizing::Fixed(length)),
            endian: Endianness::Little,
            default: None,
        }
    }

    /// This function builds a 00-padded string field whose region size is driven by a reference.
    pub fn fixed_ref(encoding: TextEncoding, length: Ref) -> Self {
        Self {
            encoding,
            layout: StringLayout::FixedPadded(Sizing::Ref(length)),
            endian: Endianness::Little,
            default: None,
        }
    }

    /// This function builds a NUL-terminated string field.
    pub fn terminated(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            layout: StringLayout::Terminated(None),
            endian: Endianness::Little,
            default: None,
        }
    }

    /// This function builds a size-prefixed string field.
    ///
    /// The prefix counts bytes for UTF-8/ISO-8859-15 and characters for UTF-16.
    pub fn size_prefixed(encoding: TextEncoding, prefix: IntWidth, endian: Endianness) -> Self {
        Self {
            encoding,
            layout: StringLayout::SizePrefixed(prefix),
            endian,
            default: None,
        }
    }

    /// This function bounds the content of a terminated string, in bytes.
    pub fn with_max_length(mut self, max_length: u64) -> Self {
        if let StringLayout::Terminated(ref mut max) = self.layout {
            *max = Some(max_length);
        }
        self
    }

    /// This function sets the value the field takes on a freshly built block.
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_owned());
        self
    }

    /// This function returns the reference driving the field's region size, if any.
    pub(crate) fn length_ref(&self) -> Option<&Ref> {
        match &self.layout {
            StringLayout::FixedPadded(sizing) => sizing.as_ref_expr(),
            _ => None,
        }
    }

    /// This function decodes the field's value from `data` at `offset`.
    pub(crate) fn decode(&self, data: &[u8], offset: u64, scope: &Scope) -> Result<(Value, u64)> {
        match &self.layout {
            StringLayout::FixedPadded(sizing) => {
                let remaining = (data.len() as u64).saturating_sub(offset);
                let length = sizing.resolve(scope, remaining)?;
                let region = window(data, offset, length)?;

                let text = match self.encoding {
                    TextEncoding::Utf8 => Cursor::new(region).read_string_u8_0padded(length as usize)?,
                    TextEncoding::Iso8859_15 => {
                        let content = region.iter().position(|byte| *byte == 0).map_or(region, |cut| &region[..cut]);
                        ISO_8859_15.decode(content).0.to_string()
                    },
                    TextEncoding::Utf16Le => Cursor::new(region).read_string_u16_0padded(length as usize)?,
                    TextEncoding::Utf16Be => {
                        if length % 2 == 1 {
                            return Err(RLibError::DecodeUTF16UnevenInputError(length as usize));
                        }
                        let chars = (length / 2) as usize;
                        let cut = (0..chars).position(|x| region[x * 2] == 0 && region[x * 2 + 1] == 0).map_or(chars, |x| x);
                        Self::decode_utf16(&region[..cut * 2], self.encoding)?
                    },
                };

                Ok((Value::String(text), length))
            },

            StringLayout::Terminated(max_length) => {
                let rest = tail(data, offset)?;
                match self.encoding {
                    TextEncoding::Utf8 | TextEncoding::Iso8859_15 => {
                        let limit = match max_length {
                            Some(max) => ((*max + 1) as usize).min(rest.len()),
                            None => rest.len(),
                        };

                        let end = memchr::memchr(0, &rest[..limit]).ok_or(RLibError::DecodingStringTerminatorNotFound)?;
                        let text = match self.encoding {
                            TextEncoding::Utf8 => String::from_utf8(rest[..end].to_vec())?,
                            _ => ISO_8859_15.decode(&rest[..end]).0.to_string(),
                        };

                        Ok((Value::String(text), end as u64 + 1))
                    },
                    TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
                        let limit = match max_length {
                            Some(max) => ((*max + 2) as usize).min(rest.len()),
                            None => rest.len(),
                        };

                        let end = (0..limit / 2).position(|x| rest[x * 2] == 0 && rest[x * 2 + 1] == 0)
                            .ok_or(RLibError::DecodingStringTerminatorNotFound)?;
                        let text = Self::decode_utf16(&rest[..end * 2], self.encoding)?;

                        Ok((Value::String(text), end as u64 * 2 + 2))
                    },
                }
            },

            StringLayout::SizePrefixed(prefix) => {
                let mut cursor = Cursor::new(tail(data, offset)?);
                let size = match (prefix, self.endian) {
                    (IntWidth::U8, _) => cursor.read_u8()? as u64,
                    (IntWidth::U16, Endianness::Little) => cursor.read_u16()? as u64,
                    (IntWidth::U16, Endianness::Big) => cursor.read_u16_be()? as u64,
                    (IntWidth::U32, Endianness::Little) => cursor.read_u32()? as u64,
                    (IntWidth::U32, Endianness::Big) => cursor.read_u32_be()? as u64,
                };

                let text = match self.encoding {
                    TextEncoding::Utf8 => cursor.read_string_u8(size as usize)?,
                    TextEncoding::Iso8859_15 => cursor.read_string_u8_iso_8859_15(size as usize)?,
                    TextEncoding::Utf16Le => cursor.read_string_u16(size as usize * 2)?,
                    TextEncoding::Utf16Be => cursor.read_string_u16_be(size as usize * 2)?,
                };

                Ok((Value::String(text), cursor.position()))
            },
        }
    }

    /// This function encodes the field's value back to bytes.
    pub(crate) fn encode(&self, value: &Value, scope: &Scope) -> Result<Vec<u8>> {
        let string = value.as_str()?;
        let mut data = vec![];

        match &self.layout {
            StringLayout::FixedPadded(sizing) => {
                let length = sizing.resolve(scope, 0)?;
                match self.encoding {
                    TextEncoding::Utf8 => data.write_string_u8_0padded(string, length as usize)?,
                    TextEncoding::Iso8859_15 => {
                        let encoded = Self::encode_iso_8859_15(string)?;
                        if encoded.len() as u64 > length {
                            return Err(RLibError::EncodingPaddedStringError("ISO-8859-15 0-Padded String".to_owned(), string.to_owned(), encoded.len(), length as usize));
                        }

                        data.extend_from_slice(&encoded);
                        data.resize(length as usize, 0);
                    },
                    TextEncoding::Utf16Le => data.write_string_u16_0padded(string, length as usize)?,
                    TextEncoding::Utf16Be => {
                        let byte_len = string.encode_utf16().count() * 2;
                        if byte_len as u64 > length {
                            return Err(RLibError::EncodingPaddedStringError("UTF-16 0-Padded String".to_owned(), string.to_owned(), byte_len, length as usize));
                        }

                        data.write_string_u16_be(string)?;
                        data.resize(length as usize, 0);
                    },
                }
            },

            StringLayout::Terminated(max_length) => {
                let encoded = self.encode_content(string)?;
                if let Some(max) = max_length {
                    if encoded.len() as u64 > *max {
                        return Err(RLibError::EncodingStringTooLongError(string.to_owned(), encoded.len(), *max as usize));
                    }
                }

                data.extend_from_slice(&encoded);
                match self.encoding {
                    TextEncoding::Utf16Le | TextEncoding::Utf16Be => data.extend_from_slice(&[0, 0]),
                    _ => data.push(0),
                }
            },

            StringLayout::SizePrefixed(prefix) => {
                let encoded = self.encode_content(string)?;
                let size = match self.encoding {
                    TextEncoding::Utf16Le | TextEncoding::Utf16Be => string.encode_utf16().count() as u64,
                    _ => encoded.len() as u64,
                };

                if size > prefix.max_value() {
                    return Err(RLibError::EncodingIntegerOverflowError(size.to_string(), format!("{prefix:?}")));
                }

                match (prefix, self.endian) {
                    (IntWidth::U8, _) => data.write_u8(size as u8)?,
                    (IntWidth::U16, Endianness::Little) => data.write_u16(size as u16)?,
                    (IntWidth::U16, Endianness::Big) => data.write_u16_be(size as u16)?,
                    (IntWidth::U32, Endianness::Little) => data.write_u32(size as u32)?,
                    (IntWidth::U32, Endianness::Big) => data.write_u32_be(size as u32)?,
                }

                data.extend_from_slice(&encoded);
            },
        }

        Ok(data)
    }

    /// This function returns the value the field takes on a freshly built block.
    pub(crate) fn default_value(&self) -> Value {
        Value::String(self.default.clone().unwrap_or_default())
    }

    /// This function encodes the content bytes of the string, without layout framing.
    fn encode_content(&self, string: &str) -> Result<Vec<u8>> {
        match self.encoding {
            TextEncoding::Utf8 => Ok(string.as_bytes().to_vec()),
            TextEncoding::Iso8859_15 => Self::encode_iso_8859_15(string),
            TextEncoding::Utf16Le => Ok(string.encode_utf16().flat_map(|character| character.to_le_bytes()).collect()),
            TextEncoding::Utf16Be => Ok(string.encode_utf16().flat_map(|character| character.to_be_bytes()).collect()),
        }
    }

    /// This function strictly decodes UTF-16 content of either endianness.
    fn decode_utf16(data: &[u8], encoding: TextEncoding) -> Result<String> {
        let decoder = if encoding == TextEncoding::Utf16Be { UTF_16BE } else { UTF_16LE };
        match decoder.decode_without_bom_handling_and_without_replacement(data) {
            Some(string) => Ok(string.to_string()),
            None => Err(RLibError::DecodingStringUndecodableError("UTF-16 String".to_owned())),
        }
    }

    /// This function strictly encodes a string as ISO-8859-15.
    fn encode_iso_8859_15(string: &str) -> Result<Vec<u8>> {
        let (encoded, _, had_errors) = ISO_8859_15.encode(string);
        if had_errors {
            return Err(RLibError::EncodingUnrepresentableCharError(string.to_owned()));
        }

        Ok(encoded.into_owned())
    }
}
