// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! chronicle: a persistent, memory-mapped, append-only record log.
//!
//! A [`Chronicle`] owns a pair of files, `<base>.index` and `<base>.data`.
//! Records ("excerpts") are opaque byte payloads addressed by a dense 64-bit
//! index. One writer appends through an [`Excerpt`] bound with
//! [`Excerpt::start_excerpt`]; any number of readers bind with
//! [`Excerpt::index`] and only ever observe fully published records.

pub mod chronicle;
pub mod config;
pub mod error;
pub mod excerpt;
pub mod storage;

pub use byteorder::{BigEndian, LittleEndian, NativeEndian};
pub use chronicle::Chronicle;
pub use config::ChronicleConfig;
pub use error::{ChronicleError, Result};
pub use excerpt::Excerpt;

#[cfg(test)]
mod tests;
