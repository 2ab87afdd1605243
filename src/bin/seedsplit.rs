// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Seedsplit CLI
//!
//! Command-line front end for splitting miniSEED streams.
//!
//! ## Usage
//!
//! ```sh
//! # Split files into per-channel segments
//! seedsplit split day1.mseed day2.mseed
//!
//! # Machine-readable output
//! seedsplit split --json --quality D,Q day1.mseed
//!
//! # List record headers
//! seedsplit inspect records day1.mseed --limit 20
//!
//! # Windows covered by two channels
//! seedsplit coverage day1.mseed --channels IU_ANMO_00_LHZ,IU_ANMO_10_LHZ
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{CoverageCmd, InspectCmd, SplitCmd};
use common::Result;
use tracing::Level;

/// Seedsplit - miniSEED stream splitter
///
/// Frames raw miniSEED records and reassembles them into gap-free
/// per-channel segments.
#[derive(Parser, Clone)]
#[command(name = "seedsplit")]
#[command(about = "Split miniSEED streams into per-channel segments", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Split files into segments and report statistics
    Split(SplitCmd),

    /// Inspect records (headers, framing statistics)
    #[command(subcommand)]
    Inspect(InspectCmd),

    /// Find windows where all named channels have data
    Coverage(CoverageCmd),
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to install logger: {e}");
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Split(cmd) => cmd.run(),
        Commands::Inspect(cmd) => cmd.run(),
        Commands::Coverage(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
