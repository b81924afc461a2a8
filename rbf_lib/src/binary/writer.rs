//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the [`WriteBytes`] trait, to write bytes from known types to a [`Writer`].
//!
//! [`Writer`]: std::io::Write

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use encoding_rs::ISO_8859_15;

use std::io::Write;

use crate::error::{RLibError, Result};

//---------------------------------------------------------------------------//
//                            Trait Definition
//---------------------------------------------------------------------------//

/// This trait allow us to easily write all kind of data types to something that implements [`Write`].
pub trait WriteBytes: Write {

    /// This function tries to write a bool value to `self`.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_bool(true).is_ok());
    /// assert_eq!(data, vec![1]);
    /// ```
    fn write_bool(&mut self, boolean: bool) -> Result<()> {
        self.write_u8(u8::from(boolean))
    }

    /// This function tries to write a byte value to `self`.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_u8(10).is_ok());
    /// assert_eq!(data, vec![10]);
    /// ```
    fn write_u8(&mut self, value: u8) -> Result<()> {
        WriteBytesExt::write_u8(self, value).map_err(From::from)
    }

    /// This function tries to write an u16 value to `self`, in LittleEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_u16(258).is_ok());
    /// assert_eq!(data, vec![2, 1]);
    /// ```
    fn write_u16(&mut self, integer: u16) -> Result<()> {
        WriteBytesExt::write_u16::<LittleEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an u16 value to `self`, in BigEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_u16_be(258).is_ok());
    /// assert_eq!(data, vec![1, 2]);
    /// ```
    fn write_u16_be(&mut self, integer: u16) -> Result<()> {
        WriteBytesExt::write_u16::<BigEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an u24 value to `self`, in LittleEndian.
    ///
    /// It may fail if the value does not fit in 24 bits.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_u24(8492696).is_ok());
    /// assert_eq!(data, vec![152, 150, 129]);
    /// ```
    fn write_u24(&mut self, integer: u32) -> Result<()> {
        if integer > 0xFF_FFFF {
            return Err(RLibError::EncodingIntegerOverflowError(integer.to_string(), "u24".to_owned()));
        }
        WriteBytesExt::write_u24::<LittleEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an u24 value to `self`, in BigEndian.
    ///
    /// It may fail if the value does not fit in 24 bits.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_u24_be(8492696).is_ok());
    /// assert_eq!(data, vec![129, 150, 152]);
    /// ```
    fn write_u24_be(&mut self, integer: u32) -> Result<()> {
        if integer > 0xFF_FFFF {
            return Err(RLibError::EncodingIntegerOverflowError(integer.to_string(), "u24".to_owned()));
        }
        WriteBytesExt::write_u24::<BigEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an u32 value to `self`, in LittleEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_u32(258).is_ok());
    /// assert_eq!(data, vec![2, 1, 0, 0]);
    /// ```
    fn write_u32(&mut self, integer: u32) -> Result<()> {
        WriteBytesExt::write_u32::<LittleEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an u32 value to `self`, in BigEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_u32_be(258).is_ok());
    /// assert_eq!(data, vec![0, 0, 1, 2]);
    /// ```
    fn write_u32_be(&mut self, integer: u32) -> Result<()> {
        WriteBytesExt::write_u32::<BigEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an u64 value to `self`, in LittleEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_u64(258).is_ok());
    /// assert_eq!(data, vec![2, 1, 0, 0, 0, 0, 0, 0]);
    /// ```
    fn write_u64(&mut self, integer: u64) -> Result<()> {
        WriteBytesExt::write_u64::<LittleEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an u64 value to `self`, in BigEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_u64_be(258).is_ok());
    /// assert_eq!(data, vec![0, 0, 0, 0, 0, 0, 1, 2]);
    /// ```
    fn write_u64_be(&mut self, integer: u64) -> Result<()> {
        WriteBytesExt::write_u64::<BigEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an u64 value to `self` as an ULEB128 value.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_uleb128(133).is_ok());
    /// assert_eq!(data, vec![0x85, 0x01]);
    /// ```
    fn write_uleb128(&mut self, mut integer: u64) -> Result<()> {
        loop {
            let byte = (integer & 0x7f) as u8;
            integer >>= 7;

            if integer == 0 {
                return self.write_u8(byte);
            }

            self.write_u8(byte | 0x80)?;
        }
    }

    /// This function tries to write an i8 value to `self`.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_i8(-2).is_ok());
    /// assert_eq!(data, vec![254]);
    /// ```
    fn write_i8(&mut self, integer: i8) -> Result<()> {
        WriteBytesExt::write_i8(self, integer).map_err(From::from)
    }

    /// This function tries to write an i16 value to `self`, in LittleEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_i16(-258).is_ok());
    /// assert_eq!(data, vec![254, 254]);
    /// ```
    fn write_i16(&mut self, integer: i16) -> Result<()> {
        WriteBytesExt::write_i16::<LittleEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an i16 value to `self`, in BigEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_i16_be(-258).is_ok());
    /// assert_eq!(data, vec![254, 254]);
    /// ```
    fn write_i16_be(&mut self, integer: i16) -> Result<()> {
        WriteBytesExt::write_i16::<BigEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an i24 value to `self`, in LittleEndian.
    ///
    /// It may fail if the value does not fit in 24 bits.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_i24(-8284520).is_ok());
    /// assert_eq!(data, vec![152, 150, 129]);
    /// ```
    fn write_i24(&mut self, integer: i32) -> Result<()> {
        if !(-0x80_0000..0x80_0000).contains(&integer) {
            return Err(RLibError::EncodingIntegerOverflowError(integer.to_string(), "i24".to_owned()));
        }
        WriteBytesExt::write_i24::<LittleEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an i24 value to `self`, in BigEndian.
    ///
    /// It may fail if the value does not fit in 24 bits.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_i24_be(-8284520).is_ok());
    /// assert_eq!(data, vec![129, 150, 152]);
    /// ```
    fn write_i24_be(&mut self, integer: i32) -> Result<()> {
        if !(-0x80_0000..0x80_0000).contains(&integer) {
            return Err(RLibError::EncodingIntegerOverflowError(integer.to_string(), "i24".to_owned()));
        }
        WriteBytesExt::write_i24::<BigEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an i32 value to `self`, in LittleEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_i32(-258).is_ok());
    /// assert_eq!(data, vec![254, 254, 255, 255]);
    /// ```
    fn write_i32(&mut self, integer: i32) -> Result<()> {
        WriteBytesExt::write_i32::<LittleEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an i32 value to `self`, in BigEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_i32_be(-258).is_ok());
    /// assert_eq!(data, vec![255, 255, 254, 254]);
    /// ```
    fn write_i32_be(&mut self, integer: i32) -> Result<()> {
        WriteBytesExt::write_i32::<BigEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an i64 value to `self`, in LittleEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_i64(-258).is_ok());
    /// assert_eq!(data, vec![254, 254, 255, 255, 255, 255, 255, 255]);
    /// ```
    fn write_i64(&mut self, integer: i64) -> Result<()> {
        WriteBytesExt::write_i64::<LittleEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write an i64 value to `self`, in BigEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_i64_be(-258).is_ok());
    /// assert_eq!(data, vec![255, 255, 255, 255, 255, 255, 254, 254]);
    /// ```
    fn write_i64_be(&mut self, integer: i64) -> Result<()> {
        WriteBytesExt::write_i64::<BigEndian>(self, integer).map_err(From::from)
    }

    /// This function tries to write a f32 value to `self`, in LittleEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_f32(-10.2).is_ok());
    /// assert_eq!(data, vec![51, 51, 35, 193]);
    /// ```
    fn write_f32(&mut self, float: f32) -> Result<()> {
        WriteBytesExt::write_f32::<LittleEndian>(self, float).map_err(From::from)
    }

    /// This function tries to write a f32 value to `self`, in BigEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_f32_be(-10.2).is_ok());
    /// assert_eq!(data, vec![193, 35, 51, 51]);
    /// ```
    fn write_f32_be(&mut self, float: f32) -> Result<()> {
        WriteBytesExt::write_f32::<BigEndian>(self, float).map_err(From::from)
    }

    /// This function tries to write a f64 value to `self`, in LittleEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_f64(-10.2).is_ok());
    /// assert_eq!(data, vec![102, 102, 102, 102, 102, 102, 36, 192]);
    /// ```
    fn write_f64(&mut self, float: f64) -> Result<()> {
        WriteBytesExt::write_f64::<LittleEndian>(self, float).map_err(From::from)
    }

    /// This function tries to write a f64 value to `self`, in BigEndian.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_f64_be(-10.2).is_ok());
    /// assert_eq!(data, vec![192, 36, 102, 102, 102, 102, 102, 102]);
    /// ```
    fn write_f64_be(&mut self, float: f64) -> Result<()> {
        WriteBytesExt::write_f64::<BigEndian>(self, float).map_err(From::from)
    }

    /// This function tries to write an UTF-8 String to `self`.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_string_u8("Wahahahaha").is_ok());
    /// assert_eq!(data, vec![87, 97, 104, 97, 104, 97, 104, 97, 104, 97]);
    /// ```
    fn write_string_u8(&mut self, string: &str) -> Result<()> {
        self.write_all(string.as_bytes()).map_err(From::from)
    }

    /// This function tries to write an UTF-8 String as an ISO-8859-15 String to `self`.
    ///
    /// It may fail if the String contains characters unrepresentable in ISO-8859-15.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_string_u8_iso_8859_15("Wahaÿhahaha").is_ok());
    /// assert_eq!(data, vec![87, 97, 104, 97, 255, 104, 97, 104, 97, 104, 97]);
    /// ```
    fn write_string_u8_iso_8859_15(&mut self, string: &str) -> Result<()> {
        let (encoded, _, had_errors) = ISO_8859_15.encode(string);
        if had_errors {
            return Err(RLibError::EncodingUnrepresentableCharError(string.to_owned()));
        }

        self.write_all(&encoded).map_err(From::from)
    }

    /// This function tries to write an UTF-8 String to `self` as a 00-Padded UTF-8 String with a max size of `size`.
    ///
    /// It may fail if the String is longer than the size we have.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_string_u8_0padded("Waha", 8).is_ok());
    /// assert_eq!(data, vec![87, 97, 104, 97, 0, 0, 0, 0]);
    /// ```
    fn write_string_u8_0padded(&mut self, string: &str, size: usize) -> Result<()> {
        if string.len() > size {
            return Err(RLibError::EncodingPaddedStringError("UTF-8 0-Padded String".to_owned(), string.to_owned(), string.len(), size));
        }

        self.write_string_u8(string)?;
        self.write_all(&vec![0; size - string.len()]).map_err(From::from)
    }

    /// This function tries to write an UTF-8 String to `self` as a 00-Terminated (or NULL-Terminated) UTF-8 String.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_string_u8_0terminated("Wahahaha").is_ok());
    /// assert_eq!(data, vec![87, 97, 104, 97, 104, 97, 104, 97, 0]);
    /// ```
    fn write_string_u8_0terminated(&mut self, string: &str) -> Result<()> {
        self.write_string_u8(string)?;
        Self::write_u8(self, 0)
    }

    /// This function tries to write an UTF-8 String to `self` as an UTF-16 LittleEndian String.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_string_u16("Wahaha").is_ok());
    /// assert_eq!(data, vec![87, 0, 97, 0, 104, 0, 97, 0, 104, 0, 97, 0]);
    /// ```
    fn write_string_u16(&mut self, string: &str) -> Result<()> {
        string.encode_utf16().try_for_each(|character| self.write_u16(character))
    }

    /// This function tries to write an UTF-8 String to `self` as an UTF-16 BigEndian String.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_string_u16_be("Waha").is_ok());
    /// assert_eq!(data, vec![0, 87, 0, 97, 0, 104, 0, 97]);
    /// ```
    fn write_string_u16_be(&mut self, string: &str) -> Result<()> {
        string.encode_utf16().try_for_each(|character| self.write_u16_be(character))
    }

    /// This function tries to write an UTF-8 String to `self` as a 00-Padded UTF-16 LittleEndian String with a max size of `size` (in bytes).
    ///
    /// It may fail if the String is longer than the size we have.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_string_u16_0padded("Waha", 16).is_ok());
    /// assert_eq!(data, vec![87, 0, 97, 0, 104, 0, 97, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    /// ```
    fn write_string_u16_0padded(&mut self, string: &str, size: usize) -> Result<()> {
        let byte_len = string.encode_utf16().count() * 2;
        if byte_len > size {
            return Err(RLibError::EncodingPaddedStringError("UTF-16 0-Padded String".to_owned(), string.to_owned(), byte_len, size));
        }

        self.write_string_u16(string)?;
        self.write_all(&vec![0; size - byte_len]).map_err(From::from)
    }

    /// This function tries to write an UTF-8 String to `self` as a 00-Terminated UTF-16 LittleEndian String.
    ///
    /// ```rust
    /// use rbf_lib::binary::WriteBytes;
    ///
    /// let mut data = vec![];
    /// assert!(data.write_string_u16_0terminated("Waha").is_ok());
    /// assert_eq!(data, vec![87, 0, 97, 0, 104, 0, 97, 0, 0, 0]);
    /// ```
    fn write_string_u16_0terminated(&mut self, string: &str) -> Result<()> {
        self.write_string_u16(string)?;
        Self::write_u16(self, 0)
    }
}

// Automatic implementation for everything that implements `Write`.
impl<W: Write> WriteBytes for W {}
