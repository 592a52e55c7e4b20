// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Compact variable-width encodings.
//!
//! Each encoding writes a narrow first unit. A few values of that unit are
//! sentinels: the narrow minimum stands for the wide minimum, minimum + 2
//! for the wide maximum, and minimum + 1 means the full-width value follows.
//!
//! | encoding | first unit | body when extended |
//! |---|---|---|
//! | `compact_short` | `i8` | `i16` |
//! | `compact_unsigned_short` | `u8`, `0xFF` extends | `u16` |
//! | `compact_int` | `i16` | `i32` |
//! | `compact_unsigned_int` | `u16`, `0xFFFF` extends | `u32` |
//! | `compact_long` | `i32` | `i64` |
//! | `compact_double` | `f32`, NaN extends | `f64` |

use super::Excerpt;
use crate::error::Result;
use byteorder::ByteOrder;

const BYTE_MIN_VALUE: i8 = i8::MIN;
const BYTE_EXTENDED: i8 = i8::MIN + 1;
const BYTE_MAX_VALUE: i8 = i8::MIN + 2;

const UBYTE_EXTENDED: u8 = 0xFF;

const SHORT_MIN_VALUE: i16 = i16::MIN;
const SHORT_EXTENDED: i16 = i16::MIN + 1;
const SHORT_MAX_VALUE: i16 = i16::MIN + 2;

const USHORT_EXTENDED: u16 = 0xFFFF;

const INT_MIN_VALUE: i32 = i32::MIN;
const INT_EXTENDED: i32 = i32::MIN + 1;
const INT_MAX_VALUE: i32 = i32::MIN + 2;

impl<B: ByteOrder> Excerpt<'_, B> {
    pub fn read_compact_short(&mut self) -> Result<i16> {
        Ok(match self.read_byte()? {
            BYTE_MIN_VALUE => i16::MIN,
            BYTE_MAX_VALUE => i16::MAX,
            BYTE_EXTENDED => self.read_short()?,
            b => b as i16,
        })
    }

    /// One byte for `-125..=127`, `i16::MIN` and `i16::MAX`; three otherwise.
    pub fn write_compact_short(&mut self, v: i16) -> Result<()> {
        if v > BYTE_MAX_VALUE as i16 && v <= i8::MAX as i16 {
            return self.write_byte(v as i8);
        }
        match v {
            i16::MIN => self.write_byte(BYTE_MIN_VALUE),
            i16::MAX => self.write_byte(BYTE_MAX_VALUE),
            _ => {
                self.write_byte(BYTE_EXTENDED)?;
                self.write_short(v)
            }
        }
    }

    pub fn read_compact_unsigned_short(&mut self) -> Result<u16> {
        match self.read_unsigned_byte()? {
            UBYTE_EXTENDED => self.read_unsigned_short(),
            b => Ok(b as u16),
        }
    }

    pub fn write_compact_unsigned_short(&mut self, v: u16) -> Result<()> {
        if v < UBYTE_EXTENDED as u16 {
            self.write_unsigned_byte(v as u8)
        } else {
            self.write_unsigned_byte(UBYTE_EXTENDED)?;
            self.write_unsigned_short(v)
        }
    }

    pub fn read_compact_int(&mut self) -> Result<i32> {
        Ok(match self.read_short()? {
            SHORT_MIN_VALUE => i32::MIN,
            SHORT_MAX_VALUE => i32::MAX,
            SHORT_EXTENDED => self.read_int()?,
            s => s as i32,
        })
    }

    pub fn write_compact_int(&mut self, v: i32) -> Result<()> {
        if v > SHORT_MAX_VALUE as i32 && v <= i16::MAX as i32 {
            return self.write_short(v as i16);
        }
        match v {
            i32::MIN => self.write_short(SHORT_MIN_VALUE),
            i32::MAX => self.write_short(SHORT_MAX_VALUE),
            _ => {
                self.write_short(SHORT_EXTENDED)?;
                self.write_int(v)
            }
        }
    }

    pub fn read_compact_unsigned_int(&mut self) -> Result<u32> {
        match self.read_unsigned_short()? {
            USHORT_EXTENDED => self.read_unsigned_int(),
            s => Ok(s as u32),
        }
    }

    pub fn write_compact_unsigned_int(&mut self, v: u32) -> Result<()> {
        if v < USHORT_EXTENDED as u32 {
            self.write_unsigned_short(v as u16)
        } else {
            self.write_unsigned_short(USHORT_EXTENDED)?;
            self.write_unsigned_int(v)
        }
    }

    pub fn read_compact_long(&mut self) -> Result<i64> {
        Ok(match self.read_int()? {
            INT_MIN_VALUE => i64::MIN,
            INT_MAX_VALUE => i64::MAX,
            INT_EXTENDED => self.read_long()?,
            i => i as i64,
        })
    }

    pub fn write_compact_long(&mut self, v: i64) -> Result<()> {
        if v > INT_MAX_VALUE as i64 && v <= i32::MAX as i64 {
            return self.write_int(v as i32);
        }
        match v {
            i64::MIN => self.write_int(INT_MIN_VALUE),
            i64::MAX => self.write_int(INT_MAX_VALUE),
            _ => {
                self.write_int(INT_EXTENDED)?;
                self.write_long(v)
            }
        }
    }

    pub fn read_compact_double(&mut self) -> Result<f64> {
        let f = self.read_float()?;
        if f.is_nan() {
            self.read_double()
        } else {
            Ok(f as f64)
        }
    }

    /// Four bytes when `v` survives a round trip through `f32`, twelve
    /// otherwise. NaN always takes the wide form.
    pub fn write_compact_double(&mut self, v: f64) -> Result<()> {
        let f = v as f32;
        if f as f64 == v {
            self.write_float(f)
        } else {
            self.write_float(f32::NAN)?;
            self.write_double(v)
        }
    }
}
