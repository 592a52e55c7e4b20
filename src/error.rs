// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChronicleError {
    /// A file could not be opened, extended or mapped.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A previous I/O failure poisoned the chronicle.
    #[error("chronicle poisoned by earlier IO failure: {0}")]
    Poisoned(String),
    #[error("index {index} out of bounds (bound {bound})")]
    IndexOutOfBounds { index: i64, bound: u64 },
    /// The cursor read or wrote past its window.
    #[error("capacity exceeded: capacity {capacity}, used {used}")]
    CapacityExceeded { capacity: usize, used: usize },
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("string of length {len} exceeds maximum {max}")]
    StringTooLong { len: usize, max: usize },
    /// Published records must hold at least one byte.
    #[error("cannot publish an empty excerpt")]
    EmptyExcerpt,
    #[error("excerpt is not bound to a record")]
    Unbound,
    #[error("excerpt is bound for reading; published records are immutable")]
    ReadOnly,
}

pub type Result<T> = std::result::Result<T, ChronicleError>;
