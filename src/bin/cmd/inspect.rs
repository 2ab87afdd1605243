// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Inspect command - list record headers and framing statistics.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Subcommand;
use serde::Serialize;

use crate::common::{format_time, output_json_or, Result};
use seedsplit::io::formats::mseed::FramerStats;
use seedsplit::{QualityFilter, RecordFramer, RecordHeader};

/// Inspect records.
#[derive(Subcommand, Clone, Debug)]
pub enum InspectCmd {
    /// List record headers in file order
    Records {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Accepted quality indicators
        #[arg(long, default_value = "All")]
        quality: String,

        /// Stop after this many records
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show framing statistics and record counts per channel
    Stats {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Accepted quality indicators
        #[arg(long, default_value = "All")]
        quality: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

impl InspectCmd {
    pub fn run(self) -> Result<()> {
        match self {
            InspectCmd::Records {
                input,
                quality,
                limit,
                json,
            } => cmd_records(&input, &quality, limit, json),
            InspectCmd::Stats {
                input,
                quality,
                json,
            } => cmd_stats(&input, &quality, json),
        }
    }
}

fn open_framer(input: &Path, quality: &str) -> Result<RecordFramer<BufReader<File>>> {
    let filter: QualityFilter = quality.parse()?;
    let file = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    Ok(RecordFramer::new(BufReader::new(file), 0)
        .with_name(input.display().to_string())
        .with_quality_filter(filter))
}

/// Cmd: List record headers
fn cmd_records(input: &Path, quality: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let framer = open_framer(input, quality)?;
    let limit = limit.unwrap_or(usize::MAX);

    let mut headers = Vec::new();
    let mut undecodable = 0u64;
    for record in framer.take(limit) {
        match RecordHeader::parse(&record.data) {
            Ok(header) => headers.push(header),
            Err(e) => {
                undecodable += 1;
                tracing::warn!(context = "inspect", error = %e, "Undecodable record");
            }
        }
    }

    output_json_or(json, &headers, || {
        println!("=== Records in {} ===", input.display());
        for h in &headers {
            println!(
                "{:06} {} {}_{}_{}_{} {} {:>5} samples @ {} Hz | enc {} | {} bytes",
                h.sequence,
                h.quality as char,
                h.network,
                h.station,
                h.location,
                h.channel,
                format_time(h.start_time),
                h.num_samples,
                h.sample_rate,
                h.encoding,
                h.record_length
            );
        }
        if undecodable > 0 {
            println!("({undecodable} undecodable records skipped)");
        }
        Ok(())
    })
}

#[derive(Serialize)]
struct StatsReport {
    framing: FramerStats,
    channels: BTreeMap<String, u64>,
    undecodable: u64,
}

/// Cmd: Show framing statistics
fn cmd_stats(input: &Path, quality: &str, json: bool) -> Result<()> {
    let mut framer = open_framer(input, quality)?;

    let mut channels: BTreeMap<String, u64> = BTreeMap::new();
    let mut undecodable = 0u64;
    while let Some(record) = framer.next_record() {
        match RecordHeader::parse(&record.data) {
            Ok(h) => {
                let name = format!("{}_{}_{}_{}", h.network, h.station, h.location, h.channel);
                *channels.entry(name).or_default() += 1;
            }
            Err(_) => undecodable += 1,
        }
    }

    let report = StatsReport {
        framing: framer.stats().clone(),
        channels,
        undecodable,
    };
    output_json_or(json, &report, || {
        let f = &report.framing;
        println!("=== {} ===", input.display());
        println!("Bytes read: {}", f.bytes_read);
        println!("Records: {}", f.records);
        println!("Quality rejected: {}", f.quality_rejected);
        println!("Discarded chunks: {}", f.chunks_discarded);
        println!("Heartbeats: {}", f.heartbeats);
        println!("Truncated: {}", f.truncated);
        println!("Undecodable: {}", report.undecodable);
        println!();
        println!("Channels:");
        for (name, count) in &report.channels {
            println!("  {name}: {count} records");
        }
        Ok(())
    })
}
