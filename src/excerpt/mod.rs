// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Excerpt cursor.
//!
//! An [`Excerpt`] is a positioned window over one record inside a single
//! mapped data chunk. It is bound either for reading, with
//! [`Excerpt::index`], or for writing, with [`Excerpt::start_excerpt`], and
//! released with [`Excerpt::finish`], which is also the publish point for
//! writers. Typed accessors live in the submodules:
//!
//! - `primitive`: fixed-width integers, floats, chars and booleans
//! - `compact`: variable-width encodings with first-unit sentinels
//! - `text`: length-prefixed byte, char and UTF strings and `read_line`
//!
//! Cursors are cheap and single-threaded; create one per thread.

mod compact;
pub mod mutf8;
mod primitive;
mod text;

use crate::chronicle::Chronicle;
use crate::error::{ChronicleError, Result};
use crate::storage::Chunk;
use byteorder::{ByteOrder, NativeEndian};
use std::marker::PhantomData;
use std::slice;
use std::sync::atomic::{fence, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcerptState {
    Unbound,
    BoundRead,
    BoundWrite,
}

pub struct Excerpt<'a, B: ByteOrder = NativeEndian> {
    chronicle: &'a Chronicle,
    /// Record index, -1 until first bound.
    index: i64,
    chunk: Option<Chunk>,
    /// Window start, current position and limit, as offsets into `chunk`.
    start: usize,
    position: usize,
    limit: usize,
    /// Absolute data file offset of `start`.
    start_offset: u64,
    state: ExcerptState,
    _order: PhantomData<B>,
}

impl<'a, B: ByteOrder> Excerpt<'a, B> {
    pub(crate) fn new(chronicle: &'a Chronicle) -> Self {
        Self {
            chronicle,
            index: -1,
            chunk: None,
            start: 0,
            position: 0,
            limit: 0,
            start_offset: 0,
            state: ExcerptState::Unbound,
            _order: PhantomData,
        }
    }

    pub fn chronicle(&self) -> &'a Chronicle {
        self.chronicle
    }

    pub fn state(&self) -> ExcerptState {
        self.state
    }

    /// Index of the record last bound, or -1.
    pub fn current_index(&self) -> i64 {
        self.index
    }

    /// Bind for reading record `index`. Returns `Ok(false)` when the record
    /// has not been published yet; callers poll.
    ///
    /// A record whose `[slot[k], slot[k + 1])` spans two data chunks was
    /// moved to the start of the later chunk by the writer, so the window
    /// starts there.
    pub fn index(&mut self, index: i64) -> Result<bool> {
        if index < 0 {
            return Err(ChronicleError::IndexOutOfBounds {
                index,
                bound: self.chronicle.size(),
            });
        }
        self.release_write();

        let k = index as u64;
        let end = self.chronicle.get_index_data(k + 1)?;
        if end == 0 {
            self.unbind();
            return Ok(false);
        }
        let mut start = self.chronicle.get_index_data(k)?;
        if end <= start {
            self.unbind();
            return Err(ChronicleError::Encoding(format!(
                "index slot {} ends at {end}, before its start {start}",
                k + 1
            )));
        }

        let geometry = self.chronicle.data_geometry();
        let last_chunk = geometry.chunk_index(end - 1);
        if geometry.chunk_index(start) != last_chunk {
            start = geometry.chunk_start(last_chunk);
        }

        self.bind(index, start, end)?;
        self.state = ExcerptState::BoundRead;
        Ok(true)
    }

    /// Reserve `capacity` bytes and bind for writing the next record.
    pub fn start_excerpt(&mut self, capacity: usize) -> Result<()> {
        self.release_write();
        let start = match self.chronicle.start_excerpt(capacity) {
            Ok(start) => start,
            Err(e) => {
                self.unbind();
                return Err(e);
            }
        };
        let index = self.chronicle.size() as i64;
        if let Err(e) = self.bind(index, start, start + capacity as u64) {
            self.chronicle.release_reservation();
            return Err(e);
        }
        self.state = ExcerptState::BoundWrite;
        Ok(())
    }

    fn bind(&mut self, index: i64, start: u64, end: u64) -> Result<()> {
        let chunk = match self.chronicle.acquire_data_buffer(start) {
            Ok(chunk) => chunk,
            Err(e) => {
                self.unbind();
                return Err(e);
            }
        };
        self.index = index;
        self.start_offset = start;
        self.start = self.chronicle.position_in_buffer(start);
        self.limit = self.chronicle.position_in_buffer(end - 1) + 1;
        self.position = self.start;
        self.chunk = Some(chunk);
        debug_assert!(self.limit > self.start);
        Ok(())
    }

    fn unbind(&mut self) {
        self.chunk = None;
        self.start = 0;
        self.position = 0;
        self.limit = 0;
        self.state = ExcerptState::Unbound;
    }

    /// A write binding dropped without `finish` gives its reservation back.
    fn release_write(&mut self) {
        if self.state == ExcerptState::BoundWrite {
            self.chronicle.release_reservation();
            self.unbind();
        }
    }

    /// Release the window. For a write binding this publishes the record:
    /// the payload is fenced, `slot[k + 1]` is release-stored with the true
    /// end offset and the chronicle size is incremented.
    pub fn finish(&mut self) -> Result<()> {
        if self.position > self.limit {
            return Err(ChronicleError::CapacityExceeded {
                capacity: self.capacity(),
                used: self.position - self.start,
            });
        }

        match self.state {
            ExcerptState::Unbound => Ok(()),
            ExcerptState::BoundRead => {
                self.unbind();
                Ok(())
            }
            ExcerptState::BoundWrite => {
                let used = self.position - self.start;
                if used == 0 {
                    return Err(ChronicleError::EmptyExcerpt);
                }
                let end = self.start_offset + used as u64;

                fence(Ordering::Release);
                self.chronicle.publish(self.index as u64, end)?;
                fence(Ordering::Release);

                self.unbind();
                Ok(())
            }
        }
    }

    /// Offset of the cursor within the current record.
    pub fn position(&self) -> usize {
        self.position - self.start
    }

    pub fn set_position(&mut self, position: usize) -> Result<&mut Self> {
        if position >= self.capacity() {
            return Err(ChronicleError::IndexOutOfBounds {
                index: position as i64,
                bound: self.capacity() as u64,
            });
        }
        self.position = self.start + position;
        Ok(self)
    }

    /// Window width in bytes.
    pub fn capacity(&self) -> usize {
        self.limit - self.start
    }

    /// Bytes left before the window limit.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.position)
    }

    /// Advance by `min(n, remaining)` bytes and return the distance moved.
    pub fn skip_bytes(&mut self, n: usize) -> usize {
        let n = n.min(self.remaining());
        self.position += n;
        n
    }

    /// Next `width` bytes at the cursor, advancing it. A writer may overrun
    /// the window limit (caught by `finish`) but never the mapped chunk; a
    /// reader is held to the record.
    #[inline]
    fn take(&mut self, width: usize) -> Result<&[u8]> {
        let ptr = self.advance(width)?;
        // SAFETY: `advance` checked `[ptr, ptr + width)` lies in the chunk.
        Ok(unsafe { slice::from_raw_parts(ptr, width) })
    }

    #[inline]
    fn take_mut(&mut self, width: usize) -> Result<&mut [u8]> {
        if self.state == ExcerptState::BoundRead {
            return Err(ChronicleError::ReadOnly);
        }
        let ptr = self.advance(width)?;
        // SAFETY: as in `take`; the single writer owns its reserved range.
        Ok(unsafe { slice::from_raw_parts_mut(ptr, width) })
    }

    #[inline]
    fn advance(&mut self, width: usize) -> Result<*mut u8> {
        let base = self.base()?;
        let bound = self.bound()?;
        let end = self.position + width;
        if end > bound {
            return Err(ChronicleError::CapacityExceeded {
                capacity: self.capacity(),
                used: end - self.start,
            });
        }
        let pos = self.position;
        self.position = end;
        // SAFETY: `pos < end <= bound <= chunk.len()`.
        Ok(unsafe { base.add(pos) })
    }

    /// `width` bytes at record offset `offset`; the cursor does not move.
    #[inline]
    fn window(&self, offset: usize, width: usize) -> Result<&[u8]> {
        let ptr = self.locate(offset, width)?;
        // SAFETY: `locate` checked bounds against the binding.
        Ok(unsafe { slice::from_raw_parts(ptr, width) })
    }

    #[inline]
    fn window_mut(&mut self, offset: usize, width: usize) -> Result<&mut [u8]> {
        if self.state == ExcerptState::BoundRead {
            return Err(ChronicleError::ReadOnly);
        }
        let ptr = self.locate(offset, width)?;
        // SAFETY: as in `window`.
        Ok(unsafe { slice::from_raw_parts_mut(ptr, width) })
    }

    #[inline]
    fn locate(&self, offset: usize, width: usize) -> Result<*mut u8> {
        let bound = self.bound()?;
        let begin = self.start + offset;
        if begin + width > bound {
            return Err(ChronicleError::IndexOutOfBounds {
                index: offset as i64,
                bound: (bound - self.start) as u64,
            });
        }
        // SAFETY: `begin + width <= bound <= chunk.len()`.
        Ok(unsafe { self.base()?.add(begin) })
    }

    /// Last chunk position accessors may touch. Bytes past a read binding's
    /// limit may belong to a record that is still being written.
    #[inline]
    fn bound(&self) -> Result<usize> {
        let chunk = self.chunk.ok_or(ChronicleError::Unbound)?;
        Ok(match self.state {
            ExcerptState::BoundRead => self.limit,
            _ => chunk.len(),
        })
    }

    #[inline]
    fn base(&self) -> Result<*mut u8> {
        Ok(self.chunk.ok_or(ChronicleError::Unbound)?.base())
    }
}

impl<B: ByteOrder> Drop for Excerpt<'_, B> {
    fn drop(&mut self) {
        self.release_write();
    }
}
