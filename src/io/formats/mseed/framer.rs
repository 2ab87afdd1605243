// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record framing over a byte stream.
//!
//! The framer reads a source in 256-byte chunks. The first chunk of every
//! record is screened (heartbeat signature, quality indicator, header
//! sanity) and its blockette 1000 gives the full record length; the rest of
//! the record is then read and emitted as a [`RawRecord`].
//!
//! A chunk that fails screening is dropped on its own, so framing
//! resynchronizes at the next 256-byte boundary.
//!
//! Two ways to drive a framer:
//! - pull: [`RecordFramer::next_record`] or the `Iterator` impl
//! - push: [`RecordFramer::run`] sends records and sentinels into a queue

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::constants::{FRAME_SIZE, MAX_RECORD_SIZE, QUALITY_OFFSET};
use super::header::{crack_record_length, is_heartbeat};
use crate::io::filter::QualityFilter;
use crate::io::metadata::{Framed, RawRecord};

/// Cooperative cancellation flag shared between a splitter and its workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Workers stop at their next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters kept by one framer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FramerStats {
    /// Bytes consumed from the source
    pub bytes_read: u64,
    /// Complete records emitted
    pub records: u64,
    /// Chunks dropped because the header could not be framed
    pub chunks_discarded: u64,
    /// Chunks dropped by the quality allow-list
    pub quality_rejected: u64,
    /// Heartbeat records dropped
    pub heartbeats: u64,
    /// Partial chunk or record left at end of input
    pub truncated: u64,
    /// Read failures that ended the source
    pub io_errors: u64,
}

impl FramerStats {
    /// Accumulate another framer's counters.
    pub fn merge(&mut self, other: &FramerStats) {
        self.bytes_read += other.bytes_read;
        self.records += other.records;
        self.chunks_discarded += other.chunks_discarded;
        self.quality_rejected += other.quality_rejected;
        self.heartbeats += other.heartbeats;
        self.truncated += other.truncated;
        self.io_errors += other.io_errors;
    }
}

/// Splits a byte stream into complete records.
pub struct RecordFramer<R: Read> {
    reader: R,
    source: usize,
    name: String,
    quality: QualityFilter,
    cancel: CancelToken,
    is_final: bool,
    buffer: Box<[u8]>,
    filled: usize,
    stats: FramerStats,
    done: bool,
}

impl<R: Read> RecordFramer<R> {
    /// Create a framer for the source with the given index.
    pub fn new(reader: R, source: usize) -> Self {
        Self {
            reader,
            source,
            name: format!("source-{source}"),
            quality: QualityFilter::default(),
            cancel: CancelToken::new(),
            is_final: false,
            buffer: vec![0u8; MAX_RECORD_SIZE].into_boxed_slice(),
            filled: 0,
            stats: FramerStats::default(),
            done: false,
        }
    }

    /// Name used in log output (usually the file path).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_quality_filter(mut self, filter: QualityFilter) -> Self {
        self.quality = filter;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Mark this framer as the last source; it will also emit `EndOfStream`.
    pub fn as_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn stats(&self) -> &FramerStats {
        &self.stats
    }

    /// Read until `target` bytes are buffered.
    ///
    /// Returns `Ok(false)` if the source ends first.
    fn fill_to(&mut self, target: usize) -> std::io::Result<bool> {
        while self.filled < target {
            match self.reader.read(&mut self.buffer[self.filled..target]) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.filled += n;
                    self.stats.bytes_read += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    /// Fill the buffer, ending the source on EOF or I/O failure.
    fn fill_or_finish(&mut self, target: usize) -> bool {
        match self.fill_to(target) {
            Ok(true) => true,
            Ok(false) => {
                if self.filled > 0 {
                    self.stats.truncated += 1;
                    warn!(
                        context = "RecordFramer",
                        source = %self.name,
                        bytes = self.filled,
                        expected = target,
                        "Truncated record at end of input"
                    );
                }
                self.done = true;
                false
            }
            Err(e) => {
                self.stats.io_errors += 1;
                error!(
                    context = "RecordFramer",
                    source = %self.name,
                    error = %e,
                    "Read failed, closing source"
                );
                self.done = true;
                false
            }
        }
    }

    /// Pull the next complete record, or `None` once the source is exhausted.
    pub fn next_record(&mut self) -> Option<RawRecord> {
        loop {
            if self.done {
                return None;
            }
            if self.cancel.is_cancelled() {
                debug!(context = "RecordFramer", source = %self.name, "Cancelled");
                self.done = true;
                return None;
            }

            self.filled = 0;
            if !self.fill_or_finish(FRAME_SIZE) {
                return None;
            }

            if is_heartbeat(&self.buffer[..FRAME_SIZE]) {
                self.stats.heartbeats += 1;
                if let Ok(length) = crack_record_length(&self.buffer[..FRAME_SIZE]) {
                    if length > FRAME_SIZE && !self.fill_or_finish(length) {
                        return None;
                    }
                }
                continue;
            }

            let quality = self.buffer[QUALITY_OFFSET];
            if !self.quality.accepts(quality) {
                self.stats.quality_rejected += 1;
                debug!(
                    context = "RecordFramer",
                    source = %self.name,
                    "Skipping chunk with quality indicator 0x{quality:02x}"
                );
                continue;
            }

            let length = match crack_record_length(&self.buffer[..FRAME_SIZE]) {
                Ok(length) => length,
                Err(e) => {
                    self.stats.chunks_discarded += 1;
                    warn!(
                        context = "RecordFramer",
                        source = %self.name,
                        error = %e,
                        "Invalid record header, skipping chunk"
                    );
                    continue;
                }
            };

            if length > FRAME_SIZE && !self.fill_or_finish(length) {
                return None;
            }

            self.stats.records += 1;
            return Some(RawRecord::new(self.source, self.buffer[..length].to_vec()));
        }
    }

    /// Push every record into `sender`, followed by the sentinels.
    ///
    /// Blocks while the queue is full. If the receiver hangs up the source
    /// is abandoned.
    pub fn run(mut self, sender: &Sender<Framed>) -> FramerStats {
        while let Some(record) = self.next_record() {
            if sender.send(Framed::Record(record)).is_err() {
                warn!(
                    context = "RecordFramer",
                    source = %self.name,
                    "Record queue closed, abandoning source"
                );
                return self.stats;
            }
        }

        debug!(
            context = "RecordFramer",
            source = %self.name,
            records = self.stats.records,
            bytes = self.stats.bytes_read,
            "Source exhausted"
        );

        let mut sentinels = vec![Framed::EndOfSource(self.source)];
        if self.is_final {
            sentinels.push(Framed::EndOfStream);
        }
        for sentinel in sentinels {
            if sender.send(sentinel).is_err() {
                break;
            }
        }
        self.stats
    }
}

impl<R: Read> Iterator for RecordFramer<R> {
    type Item = RawRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}
