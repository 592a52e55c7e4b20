// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Length-prefixed strings and line reading.
//!
//! - byte string: `u8` length, then one Latin-1 byte per char (max 255)
//! - char string: `u16` length, then UTF-16 code units (max 65535)
//! - UTF string: `u16` byte length, then modified UTF-8 (see [`mutf8`])

use super::{mutf8, Excerpt};
use crate::error::{ChronicleError, Result};
use byteorder::ByteOrder;

const MAX_BYTE_STRING: usize = u8::MAX as usize;
const MAX_CHAR_STRING: usize = u16::MAX as usize;

/// Latin-1 length of `s`, or an error for oversized or non-Latin-1 text.
fn byte_string_len(s: &str) -> Result<usize> {
    let mut len = 0;
    for c in s.chars() {
        if c as u32 > 0xFF {
            return Err(ChronicleError::Encoding(format!(
                "{c:?} is not representable in a byte string"
            )));
        }
        len += 1;
    }
    if len > MAX_BYTE_STRING {
        return Err(ChronicleError::StringTooLong {
            len,
            max: MAX_BYTE_STRING,
        });
    }
    Ok(len)
}

fn fill_latin1(out: &mut [u8], s: &str) {
    out[0] = (out.len() - 1) as u8;
    for (dst, c) in out[1..].iter_mut().zip(s.chars()) {
        *dst = c as u8;
    }
}

fn char_string_len(len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| ChronicleError::StringTooLong {
        len,
        max: MAX_CHAR_STRING,
    })
}

fn utf16_string(units: &[u16]) -> Result<String> {
    String::from_utf16(units).map_err(|e| ChronicleError::Encoding(e.to_string()))
}

impl<B: ByteOrder> Excerpt<'_, B> {
    pub fn write_byte_string(&mut self, s: &str) -> Result<()> {
        let len = byte_string_len(s)?;
        fill_latin1(self.take_mut(len + 1)?, s);
        Ok(())
    }

    pub fn write_byte_string_at(&mut self, offset: usize, s: &str) -> Result<()> {
        let len = byte_string_len(s)?;
        fill_latin1(self.window_mut(offset, len + 1)?, s);
        Ok(())
    }

    pub fn read_byte_string(&mut self) -> Result<String> {
        let mut s = String::new();
        self.read_byte_string_into(&mut s)?;
        Ok(s)
    }

    /// Replace the contents of `s` with the next byte string.
    pub fn read_byte_string_into(&mut self, s: &mut String) -> Result<()> {
        s.clear();
        let len = self.read_unsigned_byte()? as usize;
        s.extend(self.take(len)?.iter().map(|&b| b as char));
        Ok(())
    }

    /// Byte string at `offset` and the offset just past it.
    pub fn read_byte_string_at(&self, offset: usize) -> Result<(String, usize)> {
        let len = self.read_unsigned_byte_at(offset)? as usize;
        let s = self
            .window(offset + 1, len)?
            .iter()
            .map(|&b| b as char)
            .collect();
        Ok((s, offset + 1 + len))
    }

    pub fn write_chars(&mut self, s: &str) -> Result<()> {
        let len = char_string_len(s.encode_utf16().count())?;
        self.write_char(len)?;
        for unit in s.encode_utf16() {
            self.write_char(unit)?;
        }
        Ok(())
    }

    /// Length at `offset`, code units from `offset + 2`.
    pub fn write_chars_at(&mut self, offset: usize, s: &str) -> Result<()> {
        let len = char_string_len(s.encode_utf16().count())?;
        self.write_char_at(offset, len)?;
        for (i, unit) in s.encode_utf16().enumerate() {
            self.write_char_at(offset + 2 + 2 * i, unit)?;
        }
        Ok(())
    }

    pub fn write_char_units(&mut self, units: &[u16]) -> Result<()> {
        self.write_char(char_string_len(units.len())?)?;
        for &unit in units {
            self.write_char(unit)?;
        }
        Ok(())
    }

    pub fn read_char_units(&mut self) -> Result<Vec<u16>> {
        let len = self.read_char()? as usize;
        (0..len).map(|_| self.read_char()).collect()
    }

    pub fn read_chars(&mut self) -> Result<String> {
        utf16_string(&self.read_char_units()?)
    }

    /// Replace the contents of `s` with the next char string.
    pub fn read_chars_into(&mut self, s: &mut String) -> Result<()> {
        s.clear();
        let len = self.read_char()? as usize;
        let mut units = Vec::with_capacity(len);
        for _ in 0..len {
            units.push(self.read_char()?);
        }
        for c in char::decode_utf16(units) {
            s.push(c.map_err(|e| ChronicleError::Encoding(e.to_string()))?);
        }
        Ok(())
    }

    pub fn write_utf(&mut self, s: &str) -> Result<()> {
        self.write_mutf8(|| s.encode_utf16())
    }

    /// Like [`write_utf`](Self::write_utf) for raw UTF-16, which may hold
    /// lone surrogates.
    pub fn write_utf16(&mut self, units: &[u16]) -> Result<()> {
        self.write_mutf8(|| units.iter().copied())
    }

    fn write_mutf8<I, F>(&mut self, units: F) -> Result<()>
    where
        I: Iterator<Item = u16>,
        F: Fn() -> I,
    {
        let len = mutf8::encoded_len(units());
        if len > mutf8::MAX_ENCODED_LEN {
            return Err(ChronicleError::StringTooLong {
                len,
                max: mutf8::MAX_ENCODED_LEN,
            });
        }
        let out = self.take_mut(len + 2)?;
        B::write_u16(&mut out[..2], len as u16);
        mutf8::encode_into(units(), &mut out[2..]);
        Ok(())
    }

    pub fn read_utf(&mut self) -> Result<String> {
        let len = self.read_unsigned_short()? as usize;
        mutf8::decode_string(self.take(len)?)
    }

    pub fn read_utf16(&mut self) -> Result<Vec<u16>> {
        let len = self.read_unsigned_short()? as usize;
        mutf8::decode(self.take(len)?)
    }

    /// UTF string at `offset`; the cursor does not move.
    pub fn read_utf_at(&self, offset: usize) -> Result<String> {
        let len = self.read_unsigned_short_at(offset)? as usize;
        mutf8::decode_string(self.window(offset + 2, len)?)
    }

    /// Bytes up to LF, CR or CRLF, one char per byte. The terminator is
    /// consumed but not returned.
    pub fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        while self.position() < self.capacity() {
            match self.read_unsigned_byte()? {
                b'\n' => break,
                b'\r' => {
                    let cur = self.position();
                    if cur < self.capacity() && self.read_unsigned_byte_at(cur)? == b'\n' {
                        self.skip_bytes(1);
                    }
                    break;
                }
                b => line.push(b as char),
            }
        }
        Ok(line)
    }
}
