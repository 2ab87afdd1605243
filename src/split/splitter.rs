// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Run orchestration.
//!
//! One framer thread per source feeds a bounded queue; a single processor
//! thread drains it, then assembles every channel. The queue is the only
//! shared state between threads.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, info};

use super::config::SplitterConfig;
use super::output::{SplitOutput, SplitStats};
use super::processor::StreamProcessor;
use crate::io::formats::mseed::{
    CancelToken, FramerStats, RawIntegerDecoder, RecordFramer, SampleDecoder,
};
use crate::{Result, SplitError};

/// A named input stream.
pub type Source = (String, Box<dyn Read + Send>);

/// Splits record streams into per-channel segments.
///
/// # Example
///
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use seedsplit::{SeedSplitter, SplitterConfig};
///
/// let splitter = SeedSplitter::new(SplitterConfig::default())?;
/// let output = splitter.split_files(&["day1.mseed", "day2.mseed"])?;
/// for (key, data) in &output.channels {
///     println!("{key}: {} segments", data.segments.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct SeedSplitter<D: SampleDecoder + 'static = RawIntegerDecoder> {
    config: SplitterConfig,
    decoder: D,
    cancel: CancelToken,
}

impl SeedSplitter<RawIntegerDecoder> {
    /// Create a splitter using the built-in integer decoder.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate.
    pub fn new(config: SplitterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            decoder: RawIntegerDecoder,
            cancel: CancelToken::new(),
        })
    }
}

impl<D: SampleDecoder + 'static> SeedSplitter<D> {
    /// Replace the sample decoder.
    pub fn with_decoder<E: SampleDecoder + 'static>(self, decoder: E) -> SeedSplitter<E> {
        SeedSplitter {
            config: self.config,
            decoder,
            cancel: self.cancel,
        }
    }

    /// Share a cancellation token with the framers.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split the given files.
    ///
    /// # Errors
    ///
    /// Fails with [`SplitError::Io`] if any file cannot be opened; no
    /// thread is started in that case.
    pub fn split_files<P: AsRef<Path>>(self, paths: &[P]) -> Result<SplitOutput> {
        let mut sources: Vec<Source> = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let file = File::open(path)
                .map_err(|e| SplitError::io(path.display().to_string(), e.to_string()))?;
            sources.push((path.display().to_string(), Box::new(BufReader::new(file))));
        }
        self.split_readers(sources)
    }

    /// Split arbitrary readers.
    pub fn split_readers(self, sources: Vec<Source>) -> Result<SplitOutput> {
        let started = Instant::now();
        let source_count = sources.len();
        if source_count == 0 {
            return Ok(SplitOutput::default());
        }

        let quality = self.config.quality_filter()?;
        let mut processor = StreamProcessor::from_config(self.decoder, &self.config)?;
        let (sender, receiver) = crossbeam_channel::bounded(self.config.queue_capacity);

        let processor_handle = thread::Builder::new()
            .name("seed-processor".to_string())
            .spawn(move || {
                processor.run(&receiver, source_count);
                processor.finish()
            })
            .map_err(|e| SplitError::Other(format!("failed to spawn processor thread: {e}")))?;

        let mut framer_handles: Vec<JoinHandle<FramerStats>> = Vec::with_capacity(source_count);
        let mut spawn_error = None;
        for (index, (name, reader)) in sources.into_iter().enumerate() {
            debug!(context = "SeedSplitter", source = index, name = %name, "Starting framer");
            let framer = RecordFramer::new(reader, index)
                .with_name(name)
                .with_quality_filter(quality.clone())
                .with_cancel_token(self.cancel.clone())
                .as_final(index + 1 == source_count);
            let sender = sender.clone();
            let spawned = thread::Builder::new()
                .name(format!("seed-framer-{index}"))
                .spawn(move || framer.run(&sender));
            match spawned {
                Ok(handle) => framer_handles.push(handle),
                Err(e) => {
                    spawn_error = Some(SplitError::Other(format!(
                        "failed to spawn framer thread {index}: {e}"
                    )));
                    self.cancel.cancel();
                    break;
                }
            }
        }
        // the processor stops on disconnect once every framer is gone
        drop(sender);

        let mut framing = FramerStats::default();
        let mut panicked = false;
        for handle in framer_handles {
            match handle.join() {
                Ok(stats) => framing.merge(&stats),
                Err(_) => {
                    error!(context = "SeedSplitter", "Framer thread panicked");
                    panicked = true;
                }
            }
        }

        let (channels, processing, assembly) = processor_handle
            .join()
            .map_err(|_| SplitError::Other("processor thread panicked".to_string()))?;

        if let Some(e) = spawn_error {
            return Err(e);
        }
        if panicked {
            return Err(SplitError::Other("framer thread panicked".to_string()));
        }

        let stats = SplitStats {
            sources: source_count,
            framing,
            processing,
            assembly,
            channels: channels.len(),
            segments: channels.values().map(|c| c.segments.len()).sum(),
            elapsed_sec: started.elapsed().as_secs_f64(),
        };
        info!(
            context = "SeedSplitter",
            sources = stats.sources,
            records = stats.processing.records_decoded,
            channels = stats.channels,
            segments = stats.segments,
            "Split complete in {:.3}s",
            stats.elapsed_sec
        );
        Ok(SplitOutput { channels, stats })
    }
}
