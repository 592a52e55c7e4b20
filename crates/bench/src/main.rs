// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Request/response throughput driver.
//!
//! The main thread appends `{'T', i, "Hello", 0L, 0.0}` requests (34 bytes)
//! to one chronicle and drains `{'R', i}` responses from a second one; a
//! consumer thread spins on each request and writes the response.

use anyhow::{bail, ensure, Context, Result};
use chronicle::{Chronicle, ChronicleConfig, Excerpt};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chronicle-throughput")]
#[command(about = "Single-producer/single-consumer request-response benchmark", long_about = None)]
struct Args {
    /// Number of request/response pairs.
    #[arg(long, short, default_value_t = 30_000_000)]
    runs: i64,

    /// log2 of the data chunk size.
    #[arg(long, default_value_t = chronicle::config::DEFAULT_DATA_BIT_SIZE_HINT)]
    data_bits: u8,

    /// Directory for the chronicle files (defaults to the system temp dir).
    #[arg(long, short)]
    dir: Option<PathBuf>,

    /// Keep the files instead of deleting them afterwards.
    #[arg(long)]
    keep: bool,
}

#[derive(Serialize)]
struct Report {
    config: ChronicleConfig,
    runs: i64,
    entries: i64,
    seconds: f64,
    million_entries_per_sec: f64,
}

fn spin_index(excerpt: &mut Excerpt<'_>, index: i64, stop: &AtomicBool) -> Result<()> {
    while !excerpt.index(index)? {
        if stop.load(Ordering::Acquire) {
            bail!("peer stopped before record {index}");
        }
        std::hint::spin_loop();
    }
    Ok(())
}

/// Run one side, raising `stop` if it fails so the other side gives up.
fn guarded(stop: &AtomicBool, side: impl FnOnce() -> Result<()>) -> Result<()> {
    let result = side();
    if result.is_err() {
        stop.store(true, Ordering::Release);
    }
    result
}

fn read_response(excerpt: &mut Excerpt<'_>, expected: i64) -> Result<()> {
    let kind = excerpt.read_char()?;
    ensure!(kind == 'R' as u16, "response {expected}: bad type {kind:#x}");
    let n = excerpt.read_int()?;
    ensure!(n as i64 == expected, "response {expected}: got id {n}");
    excerpt.finish()?;
    Ok(())
}

fn consume(requests: &Chronicle, responses: &Chronicle, runs: i64, stop: &AtomicBool) -> Result<()> {
    let mut excerpt = requests.create_excerpt();
    let mut excerpt2 = responses.create_excerpt();
    let mut sb = String::new();
    for i in 0..runs {
        spin_index(&mut excerpt, i, stop)?;
        let kind = excerpt.read_char()?;
        ensure!(kind == 'T' as u16, "request {i}: bad type {kind:#x}");
        let n = excerpt.read_int()?;
        ensure!(n as i64 == i, "request {i}: got id {n}");
        excerpt.read_chars_into(&mut sb)?;
        excerpt.read_long()?;
        excerpt.read_double()?;
        excerpt.finish()?;

        excerpt2.start_excerpt(6)?;
        excerpt2.write_char('R' as u16)?;
        excerpt2.write_int(n)?;
        excerpt2.finish()?;
    }
    Ok(())
}

fn produce(requests: &Chronicle, responses: &Chronicle, runs: i64, stop: &AtomicBool) -> Result<()> {
    let mut excerpt = requests.create_excerpt();
    let mut excerpt2 = responses.create_excerpt();
    let mut i2 = 0;
    for i in 0..runs {
        excerpt.start_excerpt(34)?;
        excerpt.write_char('T' as u16)?;
        excerpt.write_int(i as i32)?;
        excerpt.write_chars("Hello")?;
        excerpt.write_long(0)?;
        excerpt.write_double(0.0)?;
        excerpt.finish()?;

        while excerpt2.index(i2)? {
            read_response(&mut excerpt2, i2)?;
            i2 += 1;
        }
    }
    for i2 in i2..runs {
        spin_index(&mut excerpt2, i2, stop)?;
        read_response(&mut excerpt2, i2)?;
    }
    Ok(())
}

fn remove_pair(base: &Path) {
    for suffix in [chronicle::config::INDEX_SUFFIX, chronicle::config::DATA_SUFFIX] {
        let mut name = base.as_os_str().to_owned();
        name.push(suffix);
        let _ = std::fs::remove_file(PathBuf::from(name));
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chronicle=info")),
        )
        .init();

    let args = Args::parse();
    let dir = args.dir.unwrap_or_else(std::env::temp_dir);
    let request_base = dir.join("deleteme.ictm.request");
    let response_base = dir.join("deleteme.ictm.response");
    remove_pair(&request_base);
    remove_pair(&response_base);

    let config = ChronicleConfig::with_data_bits(args.data_bits);
    let requests = Chronicle::open_with(&request_base, config)
        .with_context(|| format!("opening {}", request_base.display()))?;
    let responses = Chronicle::open_with(&response_base, config)
        .with_context(|| format!("opening {}", response_base.display()))?;

    tracing::info!(runs = args.runs, data_bits = args.data_bits, dir = ?dir, "starting");
    let start = Instant::now();
    let stop = AtomicBool::new(false);
    thread::scope(|s| -> Result<()> {
        let consumer =
            s.spawn(|| guarded(&stop, || consume(&requests, &responses, args.runs, &stop)));
        let produced = guarded(&stop, || produce(&requests, &responses, args.runs, &stop));
        let consumed = consumer
            .join()
            .map_err(|_| anyhow::anyhow!("consumer thread panicked"))?;
        produced.context("producer")?;
        consumed.context("consumer")
    })?;
    let elapsed = start.elapsed().as_secs_f64();

    requests.close()?;
    responses.close()?;
    if !args.keep {
        remove_pair(&request_base);
        remove_pair(&response_base);
    }

    let entries = 2 * args.runs;
    let report = Report {
        config,
        runs: args.runs,
        entries,
        seconds: elapsed,
        million_entries_per_sec: entries as f64 / elapsed / 1e6,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
