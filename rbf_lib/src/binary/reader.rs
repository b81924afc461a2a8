//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the [`ReadBytes`] trait, to read bytes to known types.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use encoding_rs::{ISO_8859_15, UTF_16BE, UTF_16LE};
use itertools::Itertools;

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Result, RLibError};

//---------------------------------------------------------------------------//
//                            Trait Definition
//---------------------------------------------------------------------------//

/// This trait allow us to easily read all kind of data from a source that implements [`Read`] + [`Seek`].
pub trait ReadBytes: Read + Seek {

    /// This function returns the lenght of the data we're reading.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![1, 2, 3, 4];
    /// let mut cursor = Cursor::new(data);
    /// let len = cursor.len().unwrap();
    /// assert_eq!(len, 4);
    /// ```
    fn len(&mut self) -> Result<u64> {
        let old_pos = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;
        // Avoid seeking a third time when we were already at the end of the
        // stream. The branch is usually way cheaper than a seek operation.
        if old_pos != len {
            self.seek(SeekFrom::Start(old_pos))?;
        }
        Ok(len)
    }

    /// This function returns if the data is empty.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![];
    /// let mut cursor = Cursor::new(data);
    /// assert!(ReadBytes::is_empty(&mut cursor).unwrap());
    /// ```
    fn is_empty(&mut self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// This function returns the amount of bytes specified in the `size` argument as a [`Vec<u8>`].
    ///
    /// If `rewind` is true, the cursor will be reset to its original position once the data is returned.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![1, 2, 3, 4];
    /// let mut cursor = Cursor::new(data.to_vec());
    /// let data_read = cursor.read_slice(4, false).unwrap();
    /// assert_eq!(data, data_read);
    /// ```
    fn read_slice(&mut self, size: usize, rewind: bool) -> Result<Vec<u8>> {
        let mut data = vec![0; size];

        // If len is 0, just return.
        if size == 0 {
            return Ok(data)
        }

        self.read_exact(&mut data)?;

        if rewind {
            self.seek(SeekFrom::Current(-(size as i64)))?;
        }

        Ok(data)
    }

    /// This function tries to read a bool value from `self`.
    ///
    /// This is simple: 0 is false, 1 is true. Anything else is an error.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![0, 1, 2];
    /// let mut cursor = Cursor::new(data);
    ///
    /// assert_eq!(cursor.read_bool().unwrap(), false);
    /// assert_eq!(cursor.read_bool().unwrap(), true);
    /// assert!(cursor.read_bool().is_err());
    /// ```
    fn read_bool(&mut self) -> Result<bool> {
        let value = self.read_u8()?;
        match value {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(RLibError::DecodingBoolError(value)),
        }
    }

    /// This function tries to read an unsigned byte value from `self`.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![10];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_u8().unwrap();
    ///
    /// assert_eq!(data, 10);
    /// assert_eq!(cursor.read_u8().is_err(), true);
    /// ```
    fn read_u8(&mut self) -> Result<u8> {
        ReadBytesExt::read_u8(self).map_err(From::from)
    }

    /// This function tries to read an u16 value from `self`, in LittleEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![10, 0, 10];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_u16().unwrap();
    ///
    /// assert_eq!(data, 10);
    /// assert_eq!(cursor.read_u16().is_err(), true);
    /// ```
    fn read_u16(&mut self) -> Result<u16> {
        ReadBytesExt::read_u16::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an u16 value from `self`, in BigEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![0, 10];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_u16_be().unwrap();
    ///
    /// assert_eq!(data, 10);
    /// ```
    fn read_u16_be(&mut self) -> Result<u16> {
        ReadBytesExt::read_u16::<BigEndian>(self).map_err(From::from)
    }

    /// This function tries to read an u24 value from `self`, in LittleEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![152, 150, 129, 152, 150];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_u24().unwrap();
    ///
    /// assert_eq!(data, 8_492_696);
    /// assert_eq!(cursor.read_u24().is_err(), true);
    /// ```
    fn read_u24(&mut self) -> Result<u32> {
        ReadBytesExt::read_u24::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an u24 value from `self`, in BigEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![129, 150, 152];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_u24_be().unwrap();
    ///
    /// assert_eq!(data, 8_492_696);
    /// ```
    fn read_u24_be(&mut self) -> Result<u32> {
        ReadBytesExt::read_u24::<BigEndian>(self).map_err(From::from)
    }

    /// This function tries to read an u32 value from `self`, in LittleEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![10, 0, 0, 0, 10, 0, 0];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_u32().unwrap();
    ///
    /// assert_eq!(data, 10);
    /// assert_eq!(cursor.read_u32().is_err(), true);
    /// ```
    fn read_u32(&mut self) -> Result<u32> {
        ReadBytesExt::read_u32::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an u32 value from `self`, in BigEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![0, 0, 0, 10];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_u32_be().unwrap();
    ///
    /// assert_eq!(data, 10);
    /// ```
    fn read_u32_be(&mut self) -> Result<u32> {
        ReadBytesExt::read_u32::<BigEndian>(self).map_err(From::from)
    }

    /// This function tries to read an u64 value from `self`, in LittleEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![10, 0, 0, 0, 0, 0, 0, 0, 10, 0];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_u64().unwrap();
    ///
    /// assert_eq!(data, 10);
    /// assert_eq!(cursor.read_u64().is_err(), true);
    /// ```
    fn read_u64(&mut self) -> Result<u64> {
        ReadBytesExt::read_u64::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an u64 value from `self`, in BigEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![0, 0, 0, 0, 0, 0, 0, 10];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_u64_be().unwrap();
    ///
    /// assert_eq!(data, 10);
    /// ```
    fn read_u64_be(&mut self) -> Result<u64> {
        ReadBytesExt::read_u64::<BigEndian>(self).map_err(From::from)
    }

    /// This function tries to read an ULEB128 value from `self`.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![0x85, 0x01];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_uleb128().unwrap();
    ///
    /// assert_eq!(data, 133);
    /// assert_eq!(cursor.read_uleb128().is_err(), true);
    /// ```
    fn read_uleb128(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        let mut shift: u32 = 0;

        loop {
            let byte = self.read_u8()?;
            if shift >= 64 || (shift == 63 && (byte & 0x7f) > 1) {
                return Err(RLibError::DecodingUleb128TooLongError);
            }

            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value)
            }

            shift += 7;
        }
    }

    /// This function tries to read a signed byte value from `self`.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![254];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_i8().unwrap();
    ///
    /// assert_eq!(data, -2);
    /// assert_eq!(cursor.read_i8().is_err(), true);
    /// ```
    fn read_i8(&mut self) -> Result<i8> {
        ReadBytesExt::read_i8(self).map_err(From::from)
    }

    /// This function tries to read an i16 value from `self`, in LittleEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![254, 254, 10];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_i16().unwrap();
    ///
    /// assert_eq!(data, -258);
    /// assert_eq!(cursor.read_i16().is_err(), true);
    /// ```
    fn read_i16(&mut self) -> Result<i16> {
        ReadBytesExt::read_i16::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an i16 value from `self`, in BigEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![254, 254];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_i16_be().unwrap();
    ///
    /// assert_eq!(data, -258);
    /// ```
    fn read_i16_be(&mut self) -> Result<i16> {
        ReadBytesExt::read_i16::<BigEndian>(self).map_err(From::from)
    }

    /// This function tries to read an i24 value from `self`, in LittleEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![152, 150, 129, 152, 150];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_i24().unwrap();
    ///
    /// assert_eq!(data, -8_284_520);
    /// assert_eq!(cursor.read_i24().is_err(), true);
    /// ```
    fn read_i24(&mut self) -> Result<i32> {
        ReadBytesExt::read_i24::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an i24 value from `self`, in BigEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![129, 150, 152];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_i24_be().unwrap();
    ///
    /// assert_eq!(data, -8_284_520);
    /// ```
    fn read_i24_be(&mut self) -> Result<i32> {
        ReadBytesExt::read_i24::<BigEndian>(self).map_err(From::from)
    }

    /// This function tries to read an i32 value from `self`, in LittleEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![10, 0, 0, 0, 10, 0, 0];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_i32().unwrap();
    ///
    /// assert_eq!(data, 10);
    /// assert_eq!(cursor.read_i32().is_err(), true);
    /// ```
    fn read_i32(&mut self) -> Result<i32> {
        ReadBytesExt::read_i32::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an i32 value from `self`, in BigEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![0, 0, 0, 10];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_i32_be().unwrap();
    ///
    /// assert_eq!(data, 10);
    /// ```
    fn read_i32_be(&mut self) -> Result<i32> {
        ReadBytesExt::read_i32::<BigEndian>(self).map_err(From::from)
    }

    /// This function tries to read an i64 value from `self`, in LittleEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![10, 0, 0, 0, 0, 0, 0, 0, 10, 0];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_i64().unwrap();
    ///
    /// assert_eq!(data, 10);
    /// assert_eq!(cursor.read_i64().is_err(), true);
    /// ```
    fn read_i64(&mut self) -> Result<i64> {
        ReadBytesExt::read_i64::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an i64 value from `self`, in BigEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![0, 0, 0, 0, 0, 0, 0, 10];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_i64_be().unwrap();
    ///
    /// assert_eq!(data, 10);
    /// ```
    fn read_i64_be(&mut self) -> Result<i64> {
        ReadBytesExt::read_i64::<BigEndian>(self).map_err(From::from)
    }

    /// This function tries to read an f32 value from `self`, in LittleEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![0, 0, 32, 65];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_f32().unwrap();
    ///
    /// assert_eq!(data, 10.0);
    /// assert_eq!(cursor.read_f32().is_err(), true);
    /// ```
    fn read_f32(&mut self) -> Result<f32> {
        ReadBytesExt::read_f32::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an f32 value from `self`, in BigEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![65, 32, 0, 0];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_f32_be().unwrap();
    ///
    /// assert_eq!(data, 10.0);
    /// ```
    fn read_f32_be(&mut self) -> Result<f32> {
        ReadBytesExt::read_f32::<BigEndian>(self).map_err(From::from)
    }

    /// This function tries to read an f64 value from `self`, in LittleEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![0, 0, 0, 0, 0, 0, 36, 64];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_f64().unwrap();
    ///
    /// assert_eq!(data, 10.0);
    /// assert_eq!(cursor.read_f64().is_err(), true);
    /// ```
    fn read_f64(&mut self) -> Result<f64> {
        ReadBytesExt::read_f64::<LittleEndian>(self).map_err(From::from)
    }

    /// This function tries to read an f64 value from `self`, in BigEndian.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![64, 36, 0, 0, 0, 0, 0, 0];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_f64_be().unwrap();
    ///
    /// assert_eq!(data, 10.0);
    /// ```
    fn read_f64_be(&mut self) -> Result<f64> {
        ReadBytesExt::read_f64::<BigEndian>(self).map_err(From::from)
    }

    /// This function tries to read an UTF-8 String value of the provided `size` from `self`.
    ///
    /// It may fail if there are not enough bytes to read the value, or the value contains invalid
    /// characters for an UTF-8 String.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![87, 97, 104, 97, 104, 97, 104, 97, 104, 97];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_string_u8(10).unwrap();
    ///
    /// assert_eq!(data, "Wahahahaha");
    /// assert_eq!(cursor.read_string_u8(10).is_err(), true);
    /// ```
    fn read_string_u8(&mut self, size: usize) -> Result<String> {
        let mut data = vec![0; size];
        self.read_exact(&mut data)?;
        String::from_utf8(data).map_err(From::from)
    }

    /// This function tries to read an ISO-8859-15 String value of the provided `size` from `self`.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![87, 97, 104, 97, 255, 104, 97, 104, 97, 104, 97];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_string_u8_iso_8859_15(11).unwrap();
    ///
    /// assert_eq!(data, "Wahaÿhahaha");
    /// assert_eq!(cursor.read_string_u8_iso_8859_15(10).is_err(), true);
    /// ```
    fn read_string_u8_iso_8859_15(&mut self, size: usize) -> Result<String> {
        let mut data = vec![0; size];
        self.read_exact(&mut data)?;

        Ok(ISO_8859_15.decode(&data).0.to_string())
    }

    /// This function tries to read a 00-Padded UTF-8 String value of the provided `size` from `self`.
    ///
    /// Note that `size` here is the full lenght of the String, including the 00 bytes that act as padding.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![87, 97, 104, 97, 104, 97, 0, 0, 0, 0];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_string_u8_0padded(10).unwrap();
    ///
    /// assert_eq!(data, "Wahaha");
    /// assert_eq!(cursor.read_string_u8_0padded(10).is_err(), true);
    /// ```
    fn read_string_u8_0padded(&mut self, size: usize) -> Result<String> {
        let mut data = vec![0; size];
        self.read_exact(&mut data)?;

        let size_no_zeros = data.iter().position(|x| *x == 0).map_or(size, |x| x);
        String::from_utf8(data[..size_no_zeros].to_vec()).map_err(From::from)
    }

    /// This function tries to read a 00-Terminated (or NULL-Terminated) UTF-8 String value from `self`.
    ///
    /// It may fail if no terminator is found before the end of the data, or the value contains
    /// invalid characters for an UTF-8 String.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![87, 97, 104, 97, 104, 97, 104, 97, 0];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_string_u8_0terminated().unwrap();
    ///
    /// assert_eq!(data, "Wahahaha");
    /// assert_eq!(cursor.read_string_u8_0terminated().is_err(), true);
    /// ```
    fn read_string_u8_0terminated(&mut self) -> Result<String> {

        // Reads are expensive, so instead of reading byte by byte, we read a bunch of them
        // and start searching with memchr. If we can't find anything, read another bunch and try again.
        let mut buf = [0; 512];
        let mut data = vec![];
        let mut overread = 0i64;
        let mut found = false;

        loop {
            let read_bytes = self.read(&mut buf)?;
            if read_bytes == 0 {
                break;
            }

            if let Some(pos) = memchr::memchr(0, &buf[..read_bytes]) {
                data.extend_from_slice(&buf[..pos]);
                overread = (read_bytes - pos - 1) as i64;
                found = true;
                break;
            } else {
                data.extend_from_slice(&buf[..read_bytes]);
            }
        }

        // If we exited without finding the 00 byte, return an error.
        if !found {
            return Err(RLibError::DecodingStringTerminatorNotFound);
        }

        // Move the cursor to the byte after the terminator, so we can continue reading.
        self.seek(SeekFrom::Current(-overread))?;

        String::from_utf8(data).map_err(From::from)
    }

    /// This function tries to read an UTF-16 LittleEndian String value of the provided `size` (in bytes) from `self`.
    ///
    /// It may fail if there are not enough bytes to read the value, the size is uneven, or the
    /// value contains invalid characters for an UTF-16 String.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![87, 0, 97, 0, 104, 0, 97, 0, 104, 0, 97, 0];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_string_u16(12).unwrap();
    ///
    /// assert_eq!(data, "Wahaha");
    /// assert_eq!(cursor.read_string_u16(12).is_err(), true);
    /// ```
    fn read_string_u16(&mut self, size: usize) -> Result<String> {
        if size % 2 == 1 {
            return Err(RLibError::DecodeUTF16UnevenInputError(size));
        }
        let mut data = vec![0; size];
        self.read_exact(&mut data)?;

        match UTF_16LE.decode_without_bom_handling_and_without_replacement(&data) {
            Some(string) => Ok(string.to_string()),
            None => Err(RLibError::DecodingStringUndecodableError("UTF-16 String".to_owned())),
        }
    }

    /// This function tries to read an UTF-16 BigEndian String value of the provided `size` (in bytes) from `self`.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![0, 87, 0, 97, 0, 104, 0, 97];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_string_u16_be(8).unwrap();
    ///
    /// assert_eq!(data, "Waha");
    /// ```
    fn read_string_u16_be(&mut self, size: usize) -> Result<String> {
        if size % 2 == 1 {
            return Err(RLibError::DecodeUTF16UnevenInputError(size));
        }
        let mut data = vec![0; size];
        self.read_exact(&mut data)?;

        match UTF_16BE.decode_without_bom_handling_and_without_replacement(&data) {
            Some(string) => Ok(string.to_string()),
            None => Err(RLibError::DecodingStringUndecodableError("UTF-16 String".to_owned())),
        }
    }

    /// This function tries to read a 00-Padded UTF-16 LittleEndian String value of the provided `size` from `self`.
    ///
    /// Note that `size` here is the full lenght of the String in bytes, including the 00 bytes that act as padding.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![87, 0, 97, 0, 104, 0, 97, 0, 104, 0, 97, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_string_u16_0padded(20).unwrap();
    ///
    /// assert_eq!(data, "Wahaha");
    /// assert_eq!(cursor.read_string_u16_0padded(20).is_err(), true);
    /// ```
    fn read_string_u16_0padded(&mut self, size: usize) -> Result<String> {
        if size % 2 == 1 {
            return Err(RLibError::DecodeUTF16UnevenInputError(size));
        }
        let mut data = vec![0; size];
        self.read_exact(&mut data)?;

        let chars = size.wrapping_div(2);
        let size_no_zeros = (0..chars).position(|x| data[x * 2] == 0 && data[x * 2 + 1] == 0).map_or(chars, |x| x);
        match UTF_16LE.decode_without_bom_handling_and_without_replacement(&data[..size_no_zeros * 2]) {
            Some(string) => Ok(string.to_string()),
            None => Err(RLibError::DecodingStringUndecodableError("UTF-16 String".to_owned())),
        }
    }

    /// This function tries to read a 00-Terminated (or NULL-Terminated) UTF-16 LittleEndian String value from `self`.
    ///
    /// It may fail if no 00 00 character is found before the end of the data, or the value
    /// contains invalid characters for an UTF-16 String.
    ///
    /// ```rust
    /// use std::io::Cursor;
    ///
    /// use rbf_lib::binary::ReadBytes;
    ///
    /// let data = vec![87, 00, 97, 00, 104, 00, 97, 00, 104, 00, 97, 00, 104, 00, 97, 00, 00, 00];
    /// let mut cursor = Cursor::new(data);
    /// let data = cursor.read_string_u16_0terminated().unwrap();
    ///
    /// assert_eq!(data, "Wahahaha");
    /// assert_eq!(cursor.read_string_u16_0terminated().is_err(), true);
    /// ```
    fn read_string_u16_0terminated(&mut self) -> Result<String> {

        // Same deal as the UTF-8 version, but we search with a chunk iterator because the
        // terminator is a full 2-byte character, not a single byte.
        let mut buf = [0; 512];
        let mut data = vec![];
        let mut overread = 0i64;
        let mut found = false;

        loop {
            let read_bytes = self.read(&mut buf)?;
            if read_bytes == 0 {
                break;
            }

            let usable = read_bytes - (read_bytes % 2);
            if let Some(pos) = buf[..usable].iter().chunks(2).into_iter().position(|chunk| {
                let chunk = chunk.collect::<Vec<_>>();
                chunk.len() == 2 && *chunk[0] == 0 && *chunk[1] == 0
            }) {
                data.extend_from_slice(&buf[..pos * 2]);
                overread = (read_bytes - pos * 2 - 2) as i64;
                found = true;
                break;
            } else {
                data.extend_from_slice(&buf[..usable]);

                // If we read an uneven amount of bytes, keep the stray byte for the next pass.
                if usable != read_bytes {
                    self.seek(SeekFrom::Current(-1))?;
                }
            }
        }

        // If we exited without finding the 00 00 character, return an error.
        if !found {
            return Err(RLibError::DecodingStringTerminatorNotFound);
        }

        // Move the cursor to the byte after the terminator, so we can continue reading.
        self.seek(SeekFrom::Current(-overread))?;

        match UTF_16LE.decode_without_bom_handling_and_without_replacement(&data) {
            Some(string) => Ok(string.to_string()),
            None => Err(RLibError::DecodingStringUndecodableError("UTF-16 String".to_owned())),
        }
    }
}

// Automatic implementation for everything that implements `Read + Seek`.
impl<R: Read + Seek> ReadBytes for R {}
