// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Single producer / single consumer request-response over two chronicles.
//!
//! The producer appends `{'T', i, "Hello", 0L, 0.0}` requests while draining
//! responses; the consumer spins on each request and answers `{'R', i}`.

use chronicle::{Chronicle, ChronicleError, Result};
use std::hint;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;
use tracing_subscriber::EnvFilter;

const DATA_BIT_SIZE_HINT: u8 = 24;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Raised when either side fails, so the other stops waiting on it.
struct StopOnFailure<'a>(&'a AtomicBool);

impl Drop for StopOnFailure<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

fn guarded(stop: &AtomicBool, side: impl FnOnce() -> Result<()>) -> Result<()> {
    let guard = StopOnFailure(stop);
    let result = side();
    if result.is_ok() {
        std::mem::forget(guard);
    }
    result
}

fn wait_for(excerpt: &mut chronicle::Excerpt<'_>, index: i64, stop: &AtomicBool) -> Result<()> {
    while !excerpt.index(index)? {
        if stop.load(Ordering::Acquire) {
            return Err(ChronicleError::Io(io::Error::new(
                io::ErrorKind::Interrupted,
                format!("peer stopped before record {index}"),
            )));
        }
        hint::spin_loop();
        thread::yield_now();
    }
    Ok(())
}

fn produce(requests: &Chronicle, responses: &Chronicle, runs: i64, stop: &AtomicBool) -> Result<()> {
    let mut excerpt = requests.create_excerpt();
    let mut excerpt2 = responses.create_excerpt();
    let mut i2 = 0i64;
    for i in 0..runs {
        excerpt.start_excerpt(34)?;
        excerpt.write_char('T' as u16)?;
        excerpt.write_int(i as i32)?;
        excerpt.write_chars("Hello")?;
        excerpt.write_long(0)?;
        excerpt.write_double(0.0)?;
        excerpt.finish()?;

        while excerpt2.index(i2)? {
            assert_eq!(excerpt2.read_char()?, 'R' as u16);
            assert_eq!(excerpt2.read_int()? as i64, i2);
            excerpt2.finish()?;
            i2 += 1;
        }
    }
    while i2 < runs {
        wait_for(&mut excerpt2, i2, stop)?;
        assert_eq!(excerpt2.read_char()?, 'R' as u16);
        assert_eq!(excerpt2.read_int()? as i64, i2);
        excerpt2.finish()?;
        i2 += 1;
    }
    Ok(())
}

fn consume(requests: &Chronicle, responses: &Chronicle, runs: i64, stop: &AtomicBool) -> Result<()> {
    let mut excerpt = requests.create_excerpt();
    let mut excerpt2 = responses.create_excerpt();
    let mut sb = String::new();
    for i in 0..runs {
        wait_for(&mut excerpt, i, stop)?;
        assert_eq!(excerpt.read_char()?, 'T' as u16);
        let n = excerpt.read_int()?;
        assert_eq!(n as i64, i);
        excerpt.read_chars_into(&mut sb)?;
        assert_eq!(sb, "Hello");
        assert_eq!(excerpt.read_long()?, 0);
        assert_eq!(excerpt.read_double()?, 0.0);
        excerpt.finish()?;

        excerpt2.start_excerpt(6)?;
        excerpt2.write_char('R' as u16)?;
        excerpt2.write_int(n)?;
        excerpt2.finish()?;
    }
    Ok(())
}

fn run_shared(dir: &Path, runs: i64) {
    let requests = Chronicle::open(dir.join("request"), DATA_BIT_SIZE_HINT).unwrap();
    let responses = Chronicle::open(dir.join("response"), DATA_BIT_SIZE_HINT).unwrap();

    let stop = AtomicBool::new(false);
    thread::scope(|s| {
        let consumer = s.spawn(|| guarded(&stop, || consume(&requests, &responses, runs, &stop)));
        let produced = guarded(&stop, || produce(&requests, &responses, runs, &stop));
        let consumed = consumer.join().unwrap();
        produced.unwrap();
        consumed.unwrap();
    });

    assert_eq!(requests.size(), runs as u64);
    assert_eq!(responses.size(), runs as u64);
    requests.close().unwrap();
    responses.close().unwrap();
}

#[test]
fn test_request_response_shared_handles() {
    init_logging();
    let dir = tempdir().unwrap();
    run_shared(dir.path(), 100_000);
}

#[test]
fn test_request_response_separate_handles() {
    init_logging();
    let dir = tempdir().unwrap();
    let req_path = dir.path().join("request");
    let resp_path = dir.path().join("response");
    let runs = 20_000;

    // Each side maps the files through its own handles, as separate
    // processes would.
    let requests = Chronicle::open(&req_path, DATA_BIT_SIZE_HINT).unwrap();
    let responses = Chronicle::open(&resp_path, DATA_BIT_SIZE_HINT).unwrap();
    let stop = Arc::new(AtomicBool::new(false));
    let consumer = thread::spawn({
        let (req_path, resp_path) = (req_path.clone(), resp_path.clone());
        let stop = Arc::clone(&stop);
        move || {
            guarded(&stop, || {
                let requests = Chronicle::open(&req_path, DATA_BIT_SIZE_HINT)?;
                let responses = Chronicle::open(&resp_path, DATA_BIT_SIZE_HINT)?;
                consume(&requests, &responses, runs, &stop)
            })
        }
    });
    let produced = guarded(&stop, || produce(&requests, &responses, runs, &stop));
    let consumed = consumer.join().unwrap();
    produced.unwrap();
    consumed.unwrap();

    assert_eq!(requests.size(), runs as u64);
    drop(requests);
    drop(responses);

    let reopened = Chronicle::open(&resp_path, DATA_BIT_SIZE_HINT).unwrap();
    assert_eq!(reopened.size(), runs as u64);
}

#[test]
#[ignore = "30M round trips; run explicitly for throughput checks"]
fn test_request_response_thirty_million() {
    init_logging();
    let dir = tempdir().unwrap();
    run_shared(dir.path(), 30_000_000);
}

#[test]
fn test_failed_side_releases_peer() {
    init_logging();
    let dir = tempdir().unwrap();
    let requests = Chronicle::open(dir.path().join("request"), 16).unwrap();
    let responses = Chronicle::open(dir.path().join("response"), 16).unwrap();
    let stop = AtomicBool::new(false);

    thread::scope(|s| {
        // The consumer waits for a request that never arrives.
        let consumer = s.spawn(|| guarded(&stop, || consume(&requests, &responses, 10, &stop)));
        let failed = guarded(&stop, || {
            let mut excerpt = requests.create_excerpt();
            excerpt.start_excerpt(0)
        });
        assert!(matches!(failed, Err(ChronicleError::EmptyExcerpt)));
        let consumed = consumer.join().unwrap();
        assert!(matches!(consumed, Err(ChronicleError::Io(ref e)) if e.kind() == io::ErrorKind::Interrupted));
    });
    assert_eq!(requests.size(), 0);
}
