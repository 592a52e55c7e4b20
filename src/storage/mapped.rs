// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Mapped region cache.
//!
//! A [`MappedFile`] maps one file in fixed-size power-of-two chunks on
//! demand. A chunk, once mapped, is retained until the file is cleared or
//! dropped, so base pointers handed out by [`MappedFile::acquire`] stay valid
//! for as long as the owner is borrowed.

use crate::storage::chunk::{Chunk, ChunkGeometry};
use memmap2::{MmapOptions, MmapRaw};
use rustc_hash::FxHashMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::{PoisonError, RwLock};

pub struct MappedFile {
    path: PathBuf,
    file: File,
    geometry: ChunkGeometry,
    chunks: RwLock<FxHashMap<u64, MmapRaw>>,
}

impl MappedFile {
    /// Open or create the file at `path`; nothing is mapped yet.
    pub fn open<P: AsRef<Path>>(path: P, chunk_bits: u8) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        Ok(Self {
            path,
            file,
            geometry: ChunkGeometry::new(chunk_bits),
            chunks: RwLock::new(FxHashMap::default()),
        })
    }

    pub fn geometry(&self) -> ChunkGeometry {
        self.geometry
    }

    /// Current on-disk length. May grow underneath us when another process
    /// shares the file.
    pub fn file_len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn mapped_chunks(&self) -> usize {
        self.chunks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Chunk covering absolute offset `offset`, extending the file and
    /// mapping on a miss.
    pub fn acquire(&self, offset: u64) -> io::Result<Chunk> {
        let index = self.geometry.chunk_index(offset);
        if let Some(chunk) = self.lookup(index) {
            return Ok(chunk);
        }
        self.map_chunk(index)
    }

    /// Like [`acquire`](Self::acquire), but never extends the file: returns
    /// `None` when the chunk lies beyond the current file extent.
    pub fn acquire_existing(&self, offset: u64) -> io::Result<Option<Chunk>> {
        let index = self.geometry.chunk_index(offset);
        if let Some(chunk) = self.lookup(index) {
            return Ok(Some(chunk));
        }
        if self.file_len()? < self.geometry.chunk_end(index) {
            return Ok(None);
        }
        self.map_chunk(index).map(Some)
    }

    fn lookup(&self, index: u64) -> Option<Chunk> {
        let chunks = self.chunks.read().unwrap_or_else(PoisonError::into_inner);
        chunks.get(&index).and_then(|map| to_chunk(index, map))
    }

    fn map_chunk(&self, index: u64) -> io::Result<Chunk> {
        let mut chunks = self.chunks.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(chunk) = chunks.get(&index).and_then(|map| to_chunk(index, map)) {
            return Ok(chunk);
        }

        let end = self.geometry.chunk_end(index);
        if self.file.metadata()?.len() < end {
            self.file.set_len(end)?;
        }

        let map = MmapOptions::new()
            .offset(self.geometry.chunk_start(index))
            .len(self.geometry.chunk_size() as usize)
            .map_raw(&self.file)?;
        let chunk = to_chunk(index, &map)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned a null base"))?;
        chunks.insert(index, map);

        tracing::debug!(file = ?self.path, chunk = index, "mapped chunk");
        Ok(chunk)
    }

    /// Flush every mapped chunk to disk.
    pub fn flush(&self) -> io::Result<()> {
        let chunks = self.chunks.read().unwrap_or_else(PoisonError::into_inner);
        for map in chunks.values() {
            map.flush()?;
        }
        self.file.sync_data()
    }

    /// Unmap every chunk and truncate the file to zero. Callers must hold no
    /// [`Chunk`] from this file.
    pub fn truncate(&mut self) -> io::Result<()> {
        self.chunks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.file.set_len(0)?;
        self.file.sync_all()
    }
}

fn to_chunk(index: u64, map: &MmapRaw) -> Option<Chunk> {
    NonNull::new(map.as_mut_ptr()).map(|base| Chunk {
        base,
        index,
        len: map.len(),
    })
}
