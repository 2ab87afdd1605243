// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Coverage command - windows where every named channel has data.

use std::path::PathBuf;

use clap::Args;

use crate::common::{format_duration, format_time, output_json_or, Result, SplitOptions, Spinner};
use seedsplit::SeedSplitter;

/// Find common coverage.
#[derive(Args, Clone, Debug)]
pub struct CoverageCmd {
    /// Input files
    #[arg(value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// Channels to intersect, as NET_STA_LOC_CHA names
    #[arg(long, value_delimiter = ',', required = true)]
    channels: Vec<String>,

    #[command(flatten)]
    options: SplitOptions,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,
}

impl CoverageCmd {
    pub fn run(self) -> Result<()> {
        let config = self.options.load()?;
        let spinner = Spinner::new(format!("Splitting {} file(s)", self.inputs.len()));
        let output = SeedSplitter::new(config)?.split_files(&self.inputs);
        spinner.finish();
        let output = output?;

        let names: Vec<&str> = self.channels.iter().map(String::as_str).collect();
        let blocks = output.coverage(&names)?;

        output_json_or(self.json, &blocks, || {
            println!("=== Coverage of {} ===", names.join(", "));
            let total: i64 = blocks.iter().map(|b| b.duration()).sum();
            for block in &blocks {
                println!(
                    "  {} - {} | {} samples | {}",
                    format_time(block.start_time()),
                    format_time(block.end_time()),
                    block.sample_count(),
                    format_duration(block.duration())
                );
            }
            println!("Windows: {} | Total: {}", blocks.len(), format_duration(total));
            Ok(())
        })
    }
}
