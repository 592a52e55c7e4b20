// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The log head.
//!
//! A `Chronicle` owns `<base>.index`, a dense array of little-endian 64-bit
//! end offsets, and `<base>.data`, the concatenated record payloads. Slot `k`
//! of the index holds the end offset of record `k`, so record `k` occupies
//! `[slot[k], slot[k + 1])` in the data file (modulo chunk padding, see
//! [`Excerpt::index`](crate::Excerpt::index)). Slot 0 is always 0 and a
//! record is visible exactly when its `slot[k + 1]` is non-zero.
//!
//! Publication is lock-free: the single writer release-stores `slot[k + 1]`
//! after its payload, and readers acquire-load it before touching payload.

use crate::config::{ChronicleConfig, DATA_SUFFIX, INDEX_SUFFIX, SLOT_SIZE};
use crate::error::{ChronicleError, Result};
use crate::excerpt::Excerpt;
use crate::storage::{Chunk, ChunkGeometry, MappedFile};
use byteorder::{ByteOrder, NativeEndian};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

pub struct Chronicle {
    base_path: PathBuf,
    config: ChronicleConfig,
    index: MappedFile,
    data: MappedFile,
    /// Committed record count.
    size: AtomicU64,
    /// Next free byte in the data file. Only the writer advances it.
    next_data_offset: AtomicU64,
    poison: OnceLock<String>,
}

impl Chronicle {
    /// Open or create `<base>.index` and `<base>.data` with data chunks of
    /// `1 << data_bit_size_hint` bytes.
    pub fn open<P: AsRef<Path>>(base_path: P, data_bit_size_hint: u8) -> Result<Self> {
        Self::open_with(base_path, ChronicleConfig::with_data_bits(data_bit_size_hint))
    }

    pub fn open_with<P: AsRef<Path>>(base_path: P, config: ChronicleConfig) -> Result<Self> {
        config.validate()?;
        let base_path = base_path.as_ref().to_path_buf();
        let index = MappedFile::open(with_suffix(&base_path, INDEX_SUFFIX), config.index_bit_size)?;
        let data = MappedFile::open(with_suffix(&base_path, DATA_SUFFIX), config.data_bit_size_hint)?;

        let chronicle = Self {
            base_path,
            config,
            index,
            data,
            size: AtomicU64::new(0),
            next_data_offset: AtomicU64::new(0),
            poison: OnceLock::new(),
        };
        chronicle.recover()?;

        tracing::debug!(
            base = ?chronicle.base_path,
            size = chronicle.size(),
            next_data_offset = chronicle.next_data_offset(),
            "opened chronicle"
        );
        Ok(chronicle)
    }

    /// Recover `size` as the largest `k` with `slot[k] != 0`. Published
    /// slots form a non-zero prefix after slot 0, so a binary search suffices.
    fn recover(&self) -> Result<()> {
        let slots = self.index.file_len()? / SLOT_SIZE;
        let (mut lo, mut hi) = (0u64, slots.max(1));
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.get_index_data(mid)? != 0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let next = if lo == 0 { 0 } else { self.get_index_data(lo)? };
        self.size.store(lo, Ordering::Release);
        self.next_data_offset.store(next, Ordering::Relaxed);
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn config(&self) -> &ChronicleConfig {
        &self.config
    }

    /// Number of published records.
    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    pub fn next_data_offset(&self) -> u64 {
        self.next_data_offset.load(Ordering::Relaxed)
    }

    /// A host byte order cursor.
    pub fn create_excerpt(&self) -> Excerpt<'_, NativeEndian> {
        Excerpt::new(self)
    }

    /// A cursor with an explicit primitive byte order. Readers must use the
    /// order the writer used; it is not recorded in the files.
    pub fn create_excerpt_with<B: ByteOrder>(&self) -> Excerpt<'_, B> {
        Excerpt::new(self)
    }

    /// Truncate both files and reset to an empty log.
    pub fn clear(&mut self) -> Result<()> {
        self.check()?;
        if let Err(e) = self.index.truncate().and_then(|_| self.data.truncate()) {
            return Err(self.poisoned(e));
        }
        self.size.store(0, Ordering::Release);
        self.next_data_offset.store(0, Ordering::Relaxed);
        tracing::debug!(base = ?self.base_path, "cleared chronicle");
        Ok(())
    }

    /// Flush (when configured) and unmap both files.
    pub fn close(self) -> Result<()> {
        if self.config.sync_on_close {
            self.index.flush()?;
            self.data.flush()?;
        }
        tracing::debug!(base = ?self.base_path, size = self.size(), "closed chronicle");
        Ok(())
    }

    pub(crate) fn data_geometry(&self) -> ChunkGeometry {
        self.data.geometry()
    }

    /// End offset stored in slot `k`, acquire-loaded. Unwritten slots and
    /// slots past the index file extent read as 0.
    pub(crate) fn get_index_data(&self, k: u64) -> Result<u64> {
        self.check()?;
        let Some(offset) = k.checked_mul(SLOT_SIZE) else {
            return Ok(0);
        };
        let chunk = match self.index.acquire_existing(offset) {
            Ok(Some(chunk)) => chunk,
            Ok(None) => return Ok(0),
            Err(e) => return Err(self.poisoned(e)),
        };
        let slot = self.slot(&chunk, offset);
        Ok(u64::from_le(slot.load(Ordering::Acquire)))
    }

    /// Release-store `value` into slot `k`, extending the index file if needed.
    pub(crate) fn set_index_data(&self, k: u64, value: u64) -> Result<()> {
        self.check()?;
        let offset = k.checked_mul(SLOT_SIZE).ok_or(ChronicleError::IndexOutOfBounds {
            index: k as i64,
            bound: u64::MAX / SLOT_SIZE,
        })?;
        let chunk = self.index.acquire(offset).map_err(|e| self.poisoned(e))?;
        self.slot(&chunk, offset).store(value.to_le(), Ordering::Release);
        Ok(())
    }

    fn slot<'c>(&self, chunk: &'c Chunk, offset: u64) -> &'c AtomicU64 {
        let pos = self.index.geometry().position_in_chunk(offset);
        // SAFETY: `pos` is a multiple of 8 inside a page-aligned mapping of
        // `chunk.len()` bytes, and the mapping outlives `chunk`'s borrow of
        // `self`. All slot accesses go through atomics.
        unsafe { &*(chunk.base().add(pos) as *const AtomicU64) }
    }

    /// Reserve `capacity` bytes of the data file for the record being built
    /// and return their start offset. A range that would straddle a data
    /// chunk boundary starts at the next chunk instead; the skipped bytes
    /// are padding.
    pub(crate) fn start_excerpt(&self, capacity: usize) -> Result<u64> {
        self.check()?;
        let geometry = self.data.geometry();
        if capacity == 0 {
            return Err(ChronicleError::EmptyExcerpt);
        }
        if capacity as u64 > geometry.chunk_size() {
            return Err(ChronicleError::CapacityExceeded {
                capacity: geometry.chunk_size() as usize,
                used: capacity,
            });
        }

        let next = self.next_data_offset.load(Ordering::Relaxed);
        let start = geometry.place(next, capacity as u64);
        if start != next {
            tracing::trace!(skipped = start - next, chunk = geometry.chunk_index(start), "padded to next chunk");
        }
        self.next_data_offset
            .store(start + capacity as u64, Ordering::Relaxed);
        Ok(start)
    }

    /// Give back an unfinished reservation: the next `start_excerpt` begins
    /// at the last published end offset again.
    pub(crate) fn release_reservation(&self) {
        let size = self.size.load(Ordering::Relaxed);
        if let Ok(tail) = self.get_index_data(size) {
            self.next_data_offset.store(tail, Ordering::Relaxed);
        }
    }

    /// Publish record `k` ending at `end`: store `slot[k + 1]`, then bump
    /// `size`. Payload ordering is the caller's fence.
    pub(crate) fn publish(&self, k: u64, end: u64) -> Result<()> {
        self.set_index_data(k + 1, end)?;
        self.next_data_offset.store(end, Ordering::Relaxed);
        self.incr_size();
        tracing::trace!(index = k, end, "published excerpt");
        Ok(())
    }

    pub(crate) fn incr_size(&self) {
        self.size.fetch_add(1, Ordering::Release);
    }

    /// Mapped data chunk covering `offset`.
    pub(crate) fn acquire_data_buffer(&self, offset: u64) -> Result<Chunk> {
        self.check()?;
        self.data.acquire(offset).map_err(|e| self.poisoned(e))
    }

    pub(crate) fn position_in_buffer(&self, offset: u64) -> usize {
        self.data.geometry().position_in_chunk(offset)
    }

    fn check(&self) -> Result<()> {
        match self.poison.get() {
            Some(reason) => Err(ChronicleError::Poisoned(reason.clone())),
            None => Ok(()),
        }
    }

    fn poisoned(&self, err: io::Error) -> ChronicleError {
        if self.poison.set(err.to_string()).is_ok() {
            tracing::warn!(base = ?self.base_path, error = %err, "chronicle poisoned");
        }
        ChronicleError::Io(err)
    }

    #[cfg(test)]
    pub(crate) fn poison_for_test(&self, reason: &str) {
        let _ = self.poison.set(reason.to_string());
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_suffix() {
        let p = with_suffix(Path::new("/tmp/deleteme.request"), INDEX_SUFFIX);
        assert_eq!(p, PathBuf::from("/tmp/deleteme.request.index"));
    }
}
