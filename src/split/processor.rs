// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Single consumer of the record queue.
//!
//! The processor decodes each record, resolves its channel identity and
//! either extends the channel's open segment or closes it and opens a new
//! one. Records are never fatal: every failure is logged, counted and the
//! record skipped.
//!
//! A gap (next record starts later than the open segment's end by more
//! than the jitter tolerance) or an overlap (it starts earlier by more than
//! the tolerance) rolls over to a fresh segment. Overlaps are additionally
//! logged as errors and checked for sequence-number regressions.

use std::collections::{BTreeMap, HashMap, HashSet};

use crossbeam_channel::Receiver;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::assembler::{assemble, AssemblyStats};
use super::config::{ConfigError, SplitterConfig};
use super::output::ChannelData;
use crate::core::time::{format_timestamp, sample_rate_to_interval};
use crate::core::{ChannelKey, LocationAliases};
use crate::io::filter::ChannelFilter;
use crate::io::formats::mseed::{
    is_heartbeat, CalibrationMarker, RawIntegerDecoder, RecordHeader, SampleDecoder,
};
use crate::io::metadata::{Framed, RawRecord};
use crate::types::{Segment, DEFAULT_BLOCK_SIZE, DEFAULT_JITTER_DIVISOR};

/// Counters kept by the processor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorStats {
    /// Records taken off the queue
    pub records_received: u64,
    /// Records whose samples were appended
    pub records_decoded: u64,
    /// Heartbeat records dropped
    pub heartbeats: u64,
    /// Records dropped for an undecodable header or payload
    pub decode_errors: u64,
    /// Records dropped for an unsupported sample rate
    pub rate_discarded: u64,
    /// Records dropped by the channel filter
    pub filtered: u64,
    /// Records overlapping the open segment
    pub overlaps: u64,
    /// Overlapping records whose sequence number did not advance
    pub out_of_sequence: u64,
    /// Segments opened
    pub segments_opened: u64,
    /// End-of-source sentinels received
    pub sources_finished: u64,
}

#[derive(Default)]
struct ChannelState {
    open: Option<Segment>,
    closed: Vec<Segment>,
    last_sequence: Option<u32>,
    timing_quality: Vec<u8>,
    calibrations: Vec<CalibrationMarker>,
    records: u64,
}

impl ChannelState {
    fn close(&mut self) {
        if let Some(segment) = self.open.take() {
            self.closed.push(segment);
        }
    }
}

/// Turns raw records into per-channel segments.
pub struct StreamProcessor<D: SampleDecoder = RawIntegerDecoder> {
    decoder: D,
    aliases: LocationAliases,
    filter: ChannelFilter,
    block_size: usize,
    jitter_divisor: i64,
    channels: HashMap<ChannelKey, ChannelState>,
    stats: ProcessorStats,
}

impl<D: SampleDecoder> StreamProcessor<D> {
    /// Create a processor with default aliases and no channel filter.
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            aliases: LocationAliases::default(),
            filter: ChannelFilter::All,
            block_size: DEFAULT_BLOCK_SIZE,
            jitter_divisor: DEFAULT_JITTER_DIVISOR,
            channels: HashMap::new(),
            stats: ProcessorStats::default(),
        }
    }

    /// Create a processor with the tables and sizes from `config`.
    pub fn from_config(decoder: D, config: &SplitterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(decoder)
            .with_location_aliases(config.location_aliases.clone())
            .with_channel_filter(config.channel_filter()?)
            .with_block_size(config.block_size)
            .with_jitter_divisor(config.jitter_divisor))
    }

    pub fn with_location_aliases(mut self, aliases: LocationAliases) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_channel_filter(mut self, filter: ChannelFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_jitter_divisor(mut self, divisor: i64) -> Self {
        self.jitter_divisor = divisor.max(1);
        self
    }

    pub fn stats(&self) -> &ProcessorStats {
        &self.stats
    }

    /// Number of channels seen so far.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Consume one record.
    pub fn process_record(&mut self, record: &RawRecord) {
        const CONTEXT: &str = "StreamProcessor";
        self.stats.records_received += 1;

        if is_heartbeat(&record.data) {
            self.stats.heartbeats += 1;
            return;
        }

        let header = match RecordHeader::parse(&record.data) {
            Ok(header) => header,
            Err(e) => {
                self.stats.decode_errors += 1;
                warn!(
                    context = CONTEXT,
                    source = record.source,
                    error = %e,
                    "Skipping undecodable record"
                );
                return;
            }
        };
        if header.is_heartbeat() {
            self.stats.heartbeats += 1;
            return;
        }

        let location = self.aliases.normalize(&header.location);
        let key = ChannelKey::new(
            header.network.as_str(),
            header.station.as_str(),
            location,
            header.channel.as_str(),
            header.sample_rate,
        );

        if let Err(e) = sample_rate_to_interval(header.sample_rate) {
            self.stats.rate_discarded += 1;
            error!(context = CONTEXT, channel = %key, error = %e, "Discarding record");
            return;
        }

        if !self.filter.should_include(&key.name()) {
            self.stats.filtered += 1;
            return;
        }

        let block_size = self.block_size;
        let jitter_divisor = self.jitter_divisor;
        let stats = &mut self.stats;
        let state = self.channels.entry(key.clone()).or_default();

        let roll_over = match &state.open {
            None => true,
            Some(open) => {
                let delta = header.start_time - open.end_time();
                let tolerance = open.tolerance();
                if delta > tolerance {
                    debug!(
                        context = CONTEXT,
                        channel = %key,
                        "Gap of {delta} us at {}",
                        format_timestamp(header.start_time)
                    );
                    true
                } else if delta < -tolerance {
                    stats.overlaps += 1;
                    error!(
                        context = CONTEXT,
                        channel = %key,
                        overlap_us = -delta,
                        "Overlapping record at {}",
                        format_timestamp(header.start_time)
                    );
                    if let Some(last) = state.last_sequence {
                        if header.sequence <= last {
                            stats.out_of_sequence += 1;
                            warn!(
                                context = CONTEXT,
                                channel = %key,
                                sequence = header.sequence,
                                last,
                                "Record out of sequence"
                            );
                        }
                    }
                    true
                } else {
                    false
                }
            }
        };

        if roll_over {
            let segment = match Segment::with_block_size(
                header.start_time,
                header.sample_rate,
                block_size,
            ) {
                Ok(segment) => segment.with_jitter_divisor(jitter_divisor),
                Err(e) => {
                    stats.rate_discarded += 1;
                    error!(context = CONTEXT, channel = %key, error = %e, "Cannot open segment");
                    return;
                }
            };
            state.close();
            state.open = Some(segment);
            stats.segments_opened += 1;
        }

        let samples = match header
            .payload(&record.data)
            .and_then(|payload| self.decoder.decode(&header, payload))
        {
            Ok(samples) => samples,
            Err(e) => {
                stats.decode_errors += 1;
                warn!(
                    context = CONTEXT,
                    channel = %key,
                    error = %e,
                    "Skipping record with undecodable samples"
                );
                return;
            }
        };

        if let Some(open) = state.open.as_mut() {
            open.append(&samples);
        }
        state.last_sequence = Some(header.sequence);
        state.records += 1;
        stats.records_decoded += 1;

        if let Some(quality) = header.timing_quality {
            state.timing_quality.push(quality);
        }
        if let Some(marker) = header.calibration {
            debug!(
                context = CONTEXT,
                channel = %key,
                "Calibration at {}",
                format_timestamp(marker.start_time)
            );
            state.calibrations.push(marker);
        }
    }

    /// Drain `receiver` until every source is finished.
    ///
    /// Stops once `EndOfStream` has been seen together with an
    /// `EndOfSource` for each of `expected_sources`, or when every sender
    /// has been dropped.
    pub fn run(&mut self, receiver: &Receiver<Framed>, expected_sources: usize) {
        let mut finished = HashSet::new();
        let mut end_of_stream = false;

        loop {
            match receiver.recv() {
                Ok(Framed::Record(record)) => self.process_record(&record),
                Ok(Framed::EndOfSource(source)) => {
                    if finished.insert(source) {
                        self.stats.sources_finished += 1;
                    }
                    debug!(context = "StreamProcessor", source, "Source finished");
                }
                Ok(Framed::EndOfStream) => end_of_stream = true,
                Err(_) => {
                    debug!(context = "StreamProcessor", "All senders disconnected");
                    break;
                }
            }
            if end_of_stream && finished.len() >= expected_sources {
                break;
            }
        }
    }

    /// Close every open segment and assemble each channel.
    ///
    /// Channels are assembled in parallel. Channels left without samples
    /// are dropped.
    pub fn finish(self) -> (BTreeMap<ChannelKey, ChannelData>, ProcessorStats, AssemblyStats) {
        let states: Vec<(ChannelKey, ChannelState)> = self.channels.into_iter().collect();

        let assembled: Vec<(ChannelKey, ChannelData, AssemblyStats)> = states
            .into_par_iter()
            .map(|(key, mut state)| {
                state.close();
                let (segments, stats) = assemble(&key, state.closed);
                let data = ChannelData {
                    segments,
                    timing_quality: state.timing_quality,
                    calibrations: state.calibrations,
                    record_count: state.records,
                };
                (key, data, stats)
            })
            .collect();

        let mut channels = BTreeMap::new();
        let mut totals = AssemblyStats::default();
        for (key, data, stats) in assembled {
            totals.merge(&stats);
            if data.segments.is_empty() {
                debug!(context = "StreamProcessor", channel = %key, "No samples, dropping");
                continue;
            }
            channels.insert(key, data);
        }
        (channels, self.stats, totals)
    }
}
