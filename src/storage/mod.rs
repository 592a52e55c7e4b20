// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Chunked memory-mapped file storage.

pub mod chunk;
pub mod mapped;

pub use chunk::{Chunk, ChunkGeometry};
pub use mapped::MappedFile;
