// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Fixed-width typed reads and writes.
//!
//! Every accessor comes in two forms: one at the cursor, which advances it
//! by exactly the width of the type, and an `_at` form taking an offset
//! from the start of the record, which leaves the cursor alone. Byte order
//! is the cursor's `B` parameter.

use super::Excerpt;
use crate::error::Result;
use byteorder::ByteOrder;

macro_rules! ordered_primitive {
    ($ty:ty, $width:expr, $read:ident, $read_at:ident, $write:ident, $write_at:ident, $bo_read:ident, $bo_write:ident) => {
        pub fn $read(&mut self) -> Result<$ty> {
            Ok(B::$bo_read(self.take($width)?))
        }

        pub fn $read_at(&self, offset: usize) -> Result<$ty> {
            Ok(B::$bo_read(self.window(offset, $width)?))
        }

        pub fn $write(&mut self, v: $ty) -> Result<()> {
            B::$bo_write(self.take_mut($width)?, v);
            Ok(())
        }

        pub fn $write_at(&mut self, offset: usize, v: $ty) -> Result<()> {
            B::$bo_write(self.window_mut(offset, $width)?, v);
            Ok(())
        }
    };
}

impl<B: ByteOrder> Excerpt<'_, B> {
    pub fn read_byte(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_byte_at(&self, offset: usize) -> Result<i8> {
        Ok(self.window(offset, 1)?[0] as i8)
    }

    pub fn read_unsigned_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_unsigned_byte_at(&self, offset: usize) -> Result<u8> {
        Ok(self.window(offset, 1)?[0])
    }

    pub fn write_byte(&mut self, v: i8) -> Result<()> {
        self.take_mut(1)?[0] = v as u8;
        Ok(())
    }

    pub fn write_byte_at(&mut self, offset: usize, v: i8) -> Result<()> {
        self.window_mut(offset, 1)?[0] = v as u8;
        Ok(())
    }

    pub fn write_unsigned_byte(&mut self, v: u8) -> Result<()> {
        self.take_mut(1)?[0] = v;
        Ok(())
    }

    pub fn write_unsigned_byte_at(&mut self, offset: usize, v: u8) -> Result<()> {
        self.window_mut(offset, 1)?[0] = v;
        Ok(())
    }

    /// One byte, non-zero is `true`.
    pub fn read_boolean(&mut self) -> Result<bool> {
        Ok(self.read_unsigned_byte()? != 0)
    }

    pub fn read_boolean_at(&self, offset: usize) -> Result<bool> {
        Ok(self.read_unsigned_byte_at(offset)? != 0)
    }

    /// `true` is stored as 1 and `false` as 0.
    pub fn write_boolean(&mut self, v: bool) -> Result<()> {
        self.write_unsigned_byte(v as u8)
    }

    pub fn write_boolean_at(&mut self, offset: usize, v: bool) -> Result<()> {
        self.write_unsigned_byte_at(offset, v as u8)
    }

    ordered_primitive!(i16, 2, read_short, read_short_at, write_short, write_short_at, read_i16, write_i16);
    ordered_primitive!(u16, 2, read_unsigned_short, read_unsigned_short_at, write_unsigned_short, write_unsigned_short_at, read_u16, write_u16);
    ordered_primitive!(u16, 2, read_char, read_char_at, write_char, write_char_at, read_u16, write_u16);
    ordered_primitive!(i32, 4, read_int, read_int_at, write_int, write_int_at, read_i32, write_i32);
    ordered_primitive!(u32, 4, read_unsigned_int, read_unsigned_int_at, write_unsigned_int, write_unsigned_int_at, read_u32, write_u32);
    ordered_primitive!(f32, 4, read_float, read_float_at, write_float, write_float_at, read_f32, write_f32);
    ordered_primitive!(i64, 8, read_long, read_long_at, write_long, write_long_at, read_i64, write_i64);
    ordered_primitive!(f64, 8, read_double, read_double_at, write_double, write_double_at, read_f64, write_f64);

    /// Fill `buf` from the cursor.
    pub fn read_fully(&mut self, buf: &mut [u8]) -> Result<()> {
        buf.copy_from_slice(self.take(buf.len())?);
        Ok(())
    }

    /// Raw bytes at the cursor, no length prefix.
    pub fn write_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.take_mut(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    pub fn write_slice_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        self.window_mut(offset, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }
}
