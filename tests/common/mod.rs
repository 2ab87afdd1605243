// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use seedsplit::core::sample_rate_to_interval;
use seedsplit::io::formats::mseed::RecordBuilder;

/// One second in microseconds.
pub const SECOND: i64 = 1_000_000;

// ============================================================================
// Temporary Files
// ============================================================================

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Get a fresh temporary directory for test files.
pub fn temp_dir(prefix: &str) -> (PathBuf, CleanupGuard) {
    let random = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    let dir = std::env::temp_dir().join(format!(
        "seedsplit_{}_{}_{}_{}",
        prefix,
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed),
        random
    ));
    fs::create_dir_all(&dir).unwrap();
    let guard = CleanupGuard(dir.clone());
    (dir, guard)
}

/// Cleanup guard for test temporary files
#[derive(Debug)]
pub struct CleanupGuard(PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Write bytes to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

// ============================================================================
// Record Streams
// ============================================================================

/// Encode `count` samples starting at `start` as consecutive records.
///
/// Sample `i` has the value `first_value + i`. Sequence numbers start at
/// `first_sequence`.
pub fn channel_records(
    builder: &RecordBuilder,
    start: i64,
    count: usize,
    first_value: i32,
    first_sequence: u32,
) -> Vec<Vec<u8>> {
    let per_record = builder.max_samples();
    let interval = sample_rate_to_interval(sample_rate_of(builder)).unwrap();
    let mut records = Vec::new();
    let mut offset = 0;
    let mut sequence = first_sequence;
    while offset < count {
        let n = per_record.min(count - offset);
        let samples: Vec<i32> = (0..n).map(|i| first_value + (offset + i) as i32).collect();
        let record = builder
            .clone()
            .with_sequence(sequence)
            .with_start_time(start + offset as i64 * interval)
            .build(&samples)
            .unwrap();
        records.push(record);
        offset += n;
        sequence += 1;
    }
    records
}

/// Same as [`channel_records`], concatenated.
pub fn channel_stream(builder: &RecordBuilder, start: i64, count: usize) -> Vec<u8> {
    channel_records(builder, start, count, 0, 1).concat()
}

/// Interleave record lists one record at a time.
pub fn interleave(lists: Vec<Vec<Vec<u8>>>) -> Vec<u8> {
    let mut iters: Vec<_> = lists.into_iter().map(|l| l.into_iter()).collect();
    let mut out = Vec::new();
    loop {
        let mut any = false;
        for iter in iters.iter_mut() {
            if let Some(record) = iter.next() {
                out.extend_from_slice(&record);
                any = true;
            }
        }
        if !any {
            break;
        }
    }
    out
}

/// A 256-byte heartbeat chunk.
pub fn heartbeat() -> Vec<u8> {
    let mut chunk = vec![b' '; 256];
    chunk[..6].copy_from_slice(b"000000");
    chunk
}

fn sample_rate_of(builder: &RecordBuilder) -> f64 {
    let record = builder.build(&[]).unwrap();
    seedsplit::RecordHeader::parse(&record).unwrap().sample_rate
}
