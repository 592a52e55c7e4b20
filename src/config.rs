// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants.

use serde::{Deserialize, Serialize};
use std::io;

/// Default data chunk size in bits (16 MiB chunks).
pub const DEFAULT_DATA_BIT_SIZE_HINT: u8 = 24;

/// Default index chunk size in bits (8 MiB, i.e. 1 Mi end-offset slots).
pub const DEFAULT_INDEX_BIT_SIZE: u8 = 23;

/// Smallest chunk accepted for either file: one 4 KiB page.
pub const MIN_CHUNK_BITS: u8 = 12;

/// Largest chunk accepted for either file (1 TiB).
pub const MAX_CHUNK_BITS: u8 = 40;

/// Width in bytes of one index slot.
pub const SLOT_SIZE: u64 = 8;

/// Suffix of the end-offset file.
pub const INDEX_SUFFIX: &str = ".index";

/// Suffix of the payload file.
pub const DATA_SUFFIX: &str = ".data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChronicleConfig {
    /// log2 of the data chunk size. A record can never exceed one chunk.
    pub data_bit_size_hint: u8,
    /// log2 of the index chunk size.
    pub index_bit_size: u8,
    /// Flush every mapped chunk to disk on `close`.
    pub sync_on_close: bool,
}

impl Default for ChronicleConfig {
    fn default() -> Self {
        Self {
            data_bit_size_hint: DEFAULT_DATA_BIT_SIZE_HINT,
            index_bit_size: DEFAULT_INDEX_BIT_SIZE,
            sync_on_close: true,
        }
    }
}

impl ChronicleConfig {
    pub fn with_data_bits(data_bit_size_hint: u8) -> Self {
        Self {
            data_bit_size_hint,
            ..Self::default()
        }
    }

    pub fn data_chunk_size(&self) -> u64 {
        1 << self.data_bit_size_hint
    }

    pub fn index_chunk_size(&self) -> u64 {
        1 << self.index_bit_size
    }

    pub fn validate(&self) -> io::Result<()> {
        for (name, bits) in [
            ("data_bit_size_hint", self.data_bit_size_hint),
            ("index_bit_size", self.index_bit_size),
        ] {
            if !(MIN_CHUNK_BITS..=MAX_CHUNK_BITS).contains(&bits) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{name} must be within {MIN_CHUNK_BITS}..={MAX_CHUNK_BITS}, got {bits}"),
                ));
            }
        }
        Ok(())
    }
}
