pub mod compact_tests;

use crate::chronicle::Chronicle;
use crate::config::ChronicleConfig;
use std::path::PathBuf;
use tempfile::TempDir;

/// 64 KiB data chunks, 4 KiB index chunks (512 slots).
pub fn small_config() -> ChronicleConfig {
    ChronicleConfig {
        data_bit_size_hint: 16,
        index_bit_size: 12,
        sync_on_close: false,
    }
}

pub fn open_small(dir: &TempDir, name: &str) -> (Chronicle, PathBuf) {
    let base = dir.path().join(name);
    let chronicle = Chronicle::open_with(&base, small_config()).unwrap();
    (chronicle, base)
}
