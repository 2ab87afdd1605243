// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Split command - reassemble files into per-channel segments.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::common::{format_duration, format_time, output_json_or, Result, SplitOptions, Spinner};
use seedsplit::io::formats::mseed::CalibrationMarker;
use seedsplit::types::SegmentSummary;
use seedsplit::{ChannelKey, SeedSplitter, SplitOutput, SplitStats};

/// Split files into segments.
#[derive(Args, Clone, Debug)]
pub struct SplitCmd {
    /// Input files (records from all files are combined)
    #[arg(value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    options: SplitOptions,

    /// Show timing quality and calibration details
    #[arg(long)]
    details: bool,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,
}

impl SplitCmd {
    pub fn run(self) -> Result<()> {
        let config = self.options.load()?;
        let spinner = Spinner::new(format!("Splitting {} file(s)", self.inputs.len()));
        let output = SeedSplitter::new(config)?.split_files(&self.inputs);
        spinner.finish();
        let output = output?;

        let report = SplitReport::from_output(&output);
        output_json_or(self.json, &report, || {
            print_report(&report, self.details);
            Ok(())
        })
    }
}

// Output types

#[derive(Serialize)]
struct SplitReport<'a> {
    channels: Vec<ChannelReport<'a>>,
    stats: &'a SplitStats,
}

#[derive(Serialize)]
struct ChannelReport<'a> {
    name: String,
    key: &'a ChannelKey,
    records: u64,
    segments: Vec<SegmentSummary>,
    timing_quality: &'a [u8],
    calibrations: &'a [CalibrationMarker],
}

impl<'a> SplitReport<'a> {
    fn from_output(output: &'a SplitOutput) -> Self {
        let channels = output
            .channels
            .iter()
            .map(|(key, data)| ChannelReport {
                name: key.name(),
                key,
                records: data.record_count,
                segments: data.segments.iter().map(|s| s.summary()).collect(),
                timing_quality: &data.timing_quality,
                calibrations: &data.calibrations,
            })
            .collect();
        Self {
            channels,
            stats: &output.stats,
        }
    }
}

fn print_report(report: &SplitReport<'_>, details: bool) {
    let stats = report.stats;
    println!("=== Split: {} source(s) ===", stats.sources);
    println!(
        "Channels: {} | Segments: {} | Records: {} | Elapsed: {:.3}s",
        stats.channels, stats.segments, stats.processing.records_decoded, stats.elapsed_sec
    );

    for channel in &report.channels {
        println!();
        println!("{} | {} ({} records)", channel.name, channel.key, channel.records);
        for segment in &channel.segments {
            println!(
                "  {} - {} | {} samples | {} | crc32 {:08x}",
                format_time(segment.start_time),
                format_time(segment.end_time),
                segment.samples,
                format_duration(segment.end_time - segment.start_time),
                segment.digest
            );
        }
        if details {
            if !channel.timing_quality.is_empty() {
                let sum: u64 = channel.timing_quality.iter().map(|&q| u64::from(q)).sum();
                println!(
                    "  Timing quality: {} values, mean {:.1}",
                    channel.timing_quality.len(),
                    sum as f64 / channel.timing_quality.len() as f64
                );
            }
            for marker in channel.calibrations {
                println!(
                    "  Calibration: {} for {} on {} ({}, {})",
                    format_time(marker.start_time),
                    format_duration(marker.duration),
                    marker.input_channel,
                    marker.coupling,
                    marker.noise_type
                );
            }
        }
    }

    println!();
    println!("Framing:");
    println!("  Bytes read: {}", stats.framing.bytes_read);
    println!("  Records: {}", stats.framing.records);
    println!("  Quality rejected: {}", stats.framing.quality_rejected);
    println!("  Discarded chunks: {}", stats.framing.chunks_discarded);
    println!("  Heartbeats: {}", stats.framing.heartbeats);
    println!("  Truncated: {}", stats.framing.truncated);
    println!("Processing:");
    println!("  Decode errors: {}", stats.processing.decode_errors);
    println!("  Bad sample rate: {}", stats.processing.rate_discarded);
    println!("  Filtered: {}", stats.processing.filtered);
    println!("  Overlaps: {}", stats.processing.overlaps);
    println!("  Out of sequence: {}", stats.processing.out_of_sequence);
    println!("  Merges: {}", stats.assembly.merges);
}
