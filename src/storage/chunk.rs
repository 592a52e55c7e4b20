// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Chunk geometry and mapped chunk handles.

use std::ptr::NonNull;

/// Power-of-two chunk layout of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkGeometry {
    bits: u8,
}

impl ChunkGeometry {
    pub fn new(bits: u8) -> Self {
        Self { bits }
    }

    pub fn chunk_size(&self) -> u64 {
        1 << self.bits
    }

    /// Chunk covering absolute file offset `offset`.
    pub fn chunk_index(&self, offset: u64) -> u64 {
        offset >> self.bits
    }

    /// `offset mod chunk_size`.
    pub fn position_in_chunk(&self, offset: u64) -> usize {
        (offset & (self.chunk_size() - 1)) as usize
    }

    pub fn chunk_start(&self, chunk_index: u64) -> u64 {
        chunk_index << self.bits
    }

    /// File length needed for `chunk_index` to be fully backed.
    pub fn chunk_end(&self, chunk_index: u64) -> u64 {
        (chunk_index + 1) << self.bits
    }

    /// Start offset for a `len` byte range that wants to begin at `offset`:
    /// `offset` itself when the range fits in its chunk, otherwise the start
    /// of the following chunk. `len` must be at most one chunk.
    pub fn place(&self, offset: u64, len: u64) -> u64 {
        if len == 0 || self.chunk_index(offset) == self.chunk_index(offset + len - 1) {
            offset
        } else {
            self.chunk_start(self.chunk_index(offset) + 1)
        }
    }
}

/// A mapped chunk. The base pointer stays valid until the owning
/// [`MappedFile`](super::MappedFile) is cleared or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub(crate) base: NonNull<u8>,
    pub(crate) index: u64,
    pub(crate) len: usize,
}

impl Chunk {
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn base(&self) -> *mut u8 {
        self.base.as_ptr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_offsets() {
        let g = ChunkGeometry::new(16);
        assert_eq!(g.chunk_size(), 65536);
        assert_eq!(g.chunk_index(65535), 0);
        assert_eq!(g.chunk_index(65536), 1);
        assert_eq!(g.position_in_chunk(65536 + 17), 17);
        assert_eq!(g.chunk_end(2), 3 * 65536);
    }

    #[test]
    fn test_place_pads_across_boundary() {
        let g = ChunkGeometry::new(16);
        let kib40 = 40 * 1024;
        assert_eq!(g.place(0, kib40), 0);
        // 40..80 KiB would straddle the 64 KiB boundary.
        assert_eq!(g.place(kib40, kib40), 65536);
        // Ending exactly on the boundary is fine.
        assert_eq!(g.place(65536 - 16, 16), 65536 - 16);
        assert_eq!(g.place(65536 - 16, 17), 65536);
    }
}
