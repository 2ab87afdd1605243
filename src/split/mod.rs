// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Splitting record streams into per-channel segments.
//!
//! - [`config`] - Run settings and lookup tables
//! - [`processor`] - Queue consumer building segments record by record
//! - [`assembler`] - Final sort-and-fold of each channel's segments
//! - [`splitter`] - Thread orchestration
//! - [`output`] - Result types

pub mod assembler;
pub mod config;
pub mod output;
pub mod processor;
pub mod splitter;

pub use assembler::{assemble, AssemblyStats};
pub use config::{ConfigError, SplitterConfig, DEFAULT_QUEUE_CAPACITY};
pub use output::{ChannelData, SplitOutput, SplitStats};
pub use processor::{ProcessorStats, StreamProcessor};
pub use splitter::{SeedSplitter, Source};
