// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Modified UTF-8, the `writeUTF`/`readUTF` body format.
//!
//! Works on UTF-16 code units. `U+0000` takes two bytes (`C0 80`),
//! `U+0001..=U+007F` one, `U+0080..=U+07FF` two and every other unit three.
//! Supplementary characters are therefore two 3-byte surrogate sequences,
//! and lone surrogates pass through unchanged.

use crate::error::{ChronicleError, Result};

/// Largest body the 2-byte length prefix can describe.
pub const MAX_ENCODED_LEN: usize = u16::MAX as usize;

#[inline]
fn unit_len(unit: u16) -> usize {
    match unit {
        0x0001..=0x007F => 1,
        0x0000 | 0x0080..=0x07FF => 2,
        _ => 3,
    }
}

pub fn encoded_len<I: IntoIterator<Item = u16>>(units: I) -> usize {
    units.into_iter().map(unit_len).sum()
}

/// Encode `units` into `out`, which must be exactly `encoded_len` bytes.
pub fn encode_into<I: IntoIterator<Item = u16>>(units: I, out: &mut [u8]) {
    let mut i = 0;
    for unit in units {
        match unit_len(unit) {
            1 => {
                out[i] = unit as u8;
                i += 1;
            }
            2 => {
                out[i] = 0xC0 | ((unit >> 6) & 0x1F) as u8;
                out[i + 1] = 0x80 | (unit & 0x3F) as u8;
                i += 2;
            }
            _ => {
                out[i] = 0xE0 | ((unit >> 12) & 0x0F) as u8;
                out[i + 1] = 0x80 | ((unit >> 6) & 0x3F) as u8;
                out[i + 2] = 0x80 | (unit & 0x3F) as u8;
                i += 3;
            }
        }
    }
}

/// Decode a complete body into UTF-16 code units.
pub fn decode(bytes: &[u8]) -> Result<Vec<u16>> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let a = bytes[i] as u16;
        match a >> 4 {
            0..=7 => {
                units.push(a);
                i += 1;
            }
            12 | 13 => {
                let b = continuation(bytes, i, 1)?;
                units.push(((a & 0x1F) << 6) | b);
                i += 2;
            }
            14 => {
                let b = continuation(bytes, i, 1)?;
                let c = continuation(bytes, i, 2)?;
                units.push(((a & 0x0F) << 12) | (b << 6) | c);
                i += 3;
            }
            _ => {
                return Err(ChronicleError::Encoding(format!(
                    "malformed input around byte {i}"
                )))
            }
        }
    }
    Ok(units)
}

fn continuation(bytes: &[u8], lead: usize, n: usize) -> Result<u16> {
    match bytes.get(lead + n) {
        Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
        Some(_) => Err(ChronicleError::Encoding(format!(
            "malformed input around byte {}",
            lead + n
        ))),
        None => Err(ChronicleError::Encoding(
            "malformed input: partial character at end".to_string(),
        )),
    }
}

/// Decode into a `String`; lone surrogates are an encoding error.
pub fn decode_string(bytes: &[u8]) -> Result<String> {
    if bytes.iter().all(|&b| b != 0 && b < 0x80) {
        // Pure ASCII bodies are already valid UTF-8.
        return Ok(bytes.iter().map(|&b| b as char).collect());
    }
    let units = decode(bytes)?;
    String::from_utf16(&units).map_err(|e| ChronicleError::Encoding(e.to_string()))
}
