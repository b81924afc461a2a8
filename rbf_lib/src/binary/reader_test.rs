//---------------------------------------------------------------------------//
// Copyright (c) 2017-2024 Ismael Gutiérrez González. All rights reserved.
//
// This file is part of the Rusted Binary Forge (RBF) project,
// which can be found here: https://github.com/Frodo45127/rbf.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/Frodo45127/rbf/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Tests for the [`ReadBytes`] trait.
//!
//! [`ReadBytes`]: crate::binary::ReadBytes

use float_eq::assert_float_eq;

use std::io::Cursor;

use super::ReadBytes;

//---------------------------------------------------------------------------//
//                          Normal Decoders
//---------------------------------------------------------------------------//

/// Test for ReadBytes::read_bool().
#[test]
fn read_bool() {
    let data = vec![0, 1, 2];
    let mut cursor = Cursor::new(data);

    assert!(!cursor.read_bool().unwrap());
    assert!(cursor.read_bool().unwrap());
    assert!(cursor.read_bool().is_err());
}

/// Test for ReadBytes::read_u8().
#[test]
fn read_u8() {
    let mut cursor = Cursor::new(vec![10]);
    assert_eq!(cursor.read_u8().unwrap(), 10);
    assert!(cursor.read_u8().is_err());
}

/// Test for ReadBytes::read_u16() in both endiannesses.
#[test]
fn read_u16() {
    let mut cursor = Cursor::new(vec![2, 1]);
    assert_eq!(cursor.read_u16().unwrap(), 258);

    let mut cursor = Cursor::new(vec![1, 2]);
    assert_eq!(cursor.read_u16_be().unwrap(), 258);

    let mut cursor = Cursor::new(vec![1]);
    assert!(cursor.read_u16().is_err());
}

/// Test for ReadBytes::read_u24() in both endiannesses.
#[test]
fn read_u24() {
    let mut cursor = Cursor::new(vec![152, 150, 129]);
    assert_eq!(cursor.read_u24().unwrap(), 8_492_696);

    let mut cursor = Cursor::new(vec![129, 150, 152]);
    assert_eq!(cursor.read_u24_be().unwrap(), 8_492_696);
}

/// Test for ReadBytes::read_u32() in both endiannesses.
#[test]
fn read_u32() {
    let mut cursor = Cursor::new(vec![10, 0, 0, 0]);
    assert_eq!(cursor.read_u32().unwrap(), 10);

    let mut cursor = Cursor::new(vec![0, 0, 0, 10]);
    assert_eq!(cursor.read_u32_be().unwrap(), 10);
}

/// Test for ReadBytes::read_u64() in both endiannesses.
#[test]
fn read_u64() {
    let mut cursor = Cursor::new(vec![10, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(cursor.read_u64().unwrap(), 10);

    let mut cursor = Cursor::new(vec![0, 0, 0, 0, 0, 0, 0, 10]);
    assert_eq!(cursor.read_u64_be().unwrap(), 10);
}

/// Test for ReadBytes::read_uleb128().
#[test]
fn read_uleb128() {
    let mut cursor = Cursor::new(vec![0x85, 0x01]);
    assert_eq!(cursor.read_uleb128().unwrap(), 133);

    let mut cursor = Cursor::new(vec![10]);
    assert_eq!(cursor.read_uleb128().unwrap(), 10);

    // A continuation bit on the last byte of the data is an error.
    let mut cursor = Cursor::new(vec![0x80]);
    assert!(cursor.read_uleb128().is_err());

    // A value that does not fit in 64 bits is an error.
    let mut cursor = Cursor::new(vec![0xFF; 11]);
    assert!(cursor.read_uleb128().is_err());
}

/// Test for ReadBytes::read_i8().
#[test]
fn read_i8() {
    let mut cursor = Cursor::new(vec![254]);
    assert_eq!(cursor.read_i8().unwrap(), -2);
}

/// Test for ReadBytes::read_i16() in both endiannesses.
#[test]
fn read_i16() {
    let mut cursor = Cursor::new(vec![254, 254]);
    assert_eq!(cursor.read_i16().unwrap(), -258);

    let mut cursor = Cursor::new(vec![254, 254]);
    assert_eq!(cursor.read_i16_be().unwrap(), -258);
}

/// Test for ReadBytes::read_i24() in both endiannesses.
#[test]
fn read_i24() {
    let mut cursor = Cursor::new(vec![152, 150, 129]);
    assert_eq!(cursor.read_i24().unwrap(), -8_284_520);

    let mut cursor = Cursor::new(vec![129, 150, 152]);
    assert_eq!(cursor.read_i24_be().unwrap(), -8_284_520);
}

/// Test for ReadBytes::read_i32() in both endiannesses.
#[test]
fn read_i32() {
    let mut cursor = Cursor::new(vec![254, 254, 255, 255]);
    assert_eq!(cursor.read_i32().unwrap(), -258);

    let mut cursor = Cursor::new(vec![255, 255, 254, 254]);
    assert_eq!(cursor.read_i32_be().unwrap(), -258);
}

/// Test for ReadBytes::read_i64() in both endiannesses.
#[test]
fn read_i64() {
    let mut cursor = Cursor::new(vec![254, 254, 255, 255, 255, 255, 255, 255]);
    assert_eq!(cursor.read_i64().unwrap(), -258);

    let mut cursor = Cursor::new(vec![255, 255, 255, 255, 255, 255, 254, 254]);
    assert_eq!(cursor.read_i64_be().unwrap(), -258);
}

/// Test for ReadBytes::read_f32() in both endiannesses.
#[test]
fn read_f32() {
    let mut cursor = Cursor::new(vec![0, 0, 32, 65]);
    assert_float_eq!(cursor.read_f32().unwrap(), 10.0, abs <= 0.0001);

    let mut cursor = Cursor::new(vec![65, 32, 0, 0]);
    assert_float_eq!(cursor.read_f32_be().unwrap(), 10.0, abs <= 0.0001);
}

/// Test for ReadBytes::read_f64() in both endiannesses.
#[test]
fn read_f64() {
    let mut cursor = Cursor::new(vec![0, 0, 0, 0, 0, 0, 36, 64]);
    assert_float_eq!(cursor.read_f64().unwrap(), 10.0, abs <= 0.0001);

    let mut cursor = Cursor::new(vec![64, 36, 0, 0, 0, 0, 0, 0]);
    assert_float_eq!(cursor.read_f64_be().unwrap(), 10.0, abs <= 0.0001);
}

/// Test for ReadBytes::read_slice().
#[test]
fn read_slice() {
    let mut cursor = Cursor::new(vec![1, 2, 3, 4]);
    assert_eq!(cursor.read_slice(2, true).unwrap(), vec![1, 2]);

    // The rewind flag must leave the cursor where it was.
    assert_eq!(cursor.read_slice(4, false).unwrap(), vec![1, 2, 3, 4]);
    assert!(cursor.read_slice(1, false).is_err());
}

//---------------------------------------------------------------------------//
//                          String Decoders
//---------------------------------------------------------------------------//

/// Test for ReadBytes::read_string_u8().
#[test]
fn read_string_u8() {
    let mut cursor = Cursor::new(vec![87, 97, 104, 97, 104, 97]);
    assert_eq!(cursor.read_string_u8(6).unwrap(), "Wahaha");

    // Invalid UTF-8 is an error, not mojibake.
    let mut cursor = Cursor::new(vec![0xFF, 0xFF]);
    assert!(cursor.read_string_u8(2).is_err());
}

/// Test for ReadBytes::read_string_u8_iso_8859_15().
#[test]
fn read_string_u8_iso_8859_15() {
    let mut cursor = Cursor::new(vec![87, 97, 104, 97, 255]);
    assert_eq!(cursor.read_string_u8_iso_8859_15(5).unwrap(), "Wahaÿ");
}

/// Test for ReadBytes::read_string_u8_0padded().
#[test]
fn read_string_u8_0padded() {
    let mut cursor = Cursor::new(vec![87, 97, 104, 97, 104, 97, 0, 0, 0, 0]);
    assert_eq!(cursor.read_string_u8_0padded(10).unwrap(), "Wahaha");
}

/// Test for ReadBytes::read_string_u8_0terminated().
#[test]
fn read_string_u8_0terminated() {
    let mut cursor = Cursor::new(vec![87, 97, 104, 97, 0, 77]);
    assert_eq!(cursor.read_string_u8_0terminated().unwrap(), "Waha");

    // The cursor must end just after the terminator.
    assert_eq!(cursor.read_u8().unwrap(), 77);

    // No terminator in the data is an error.
    let mut cursor = Cursor::new(vec![87, 97]);
    assert!(cursor.read_string_u8_0terminated().is_err());
}

/// Test for ReadBytes::read_string_u16() in both endiannesses.
#[test]
fn read_string_u16() {
    let mut cursor = Cursor::new(vec![87, 0, 97, 0, 104, 0, 97, 0]);
    assert_eq!(cursor.read_string_u16(8).unwrap(), "Waha");

    let mut cursor = Cursor::new(vec![0, 87, 0, 97, 0, 104, 0, 97]);
    assert_eq!(cursor.read_string_u16_be(8).unwrap(), "Waha");

    // An uneven size is an error.
    let mut cursor = Cursor::new(vec![87, 0, 97]);
    assert!(cursor.read_string_u16(3).is_err());
}

/// Test for ReadBytes::read_string_u16_0padded().
#[test]
fn read_string_u16_0padded() {
    let mut cursor = Cursor::new(vec![87, 0, 97, 0, 104, 0, 97, 0, 0, 0, 0, 0]);
    assert_eq!(cursor.read_string_u16_0padded(12).unwrap(), "Waha");
}

/// Test for ReadBytes::read_string_u16_0terminated().
#[test]
fn read_string_u16_0terminated() {
    let mut cursor = Cursor::new(vec![87, 0, 97, 0, 104, 0, 97, 0, 0, 0, 77, 0]);
    assert_eq!(cursor.read_string_u16_0terminated().unwrap(), "Waha");

    // The cursor must end just after the terminator.
    assert_eq!(cursor.read_u16().unwrap(), 77);

    let mut cursor = Cursor::new(vec![87, 0, 97, 0]);
    assert!(cursor.read_string_u16_0terminated().is_err());
}
