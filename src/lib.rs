// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Seedsplit
//!
//! MiniSEED record framing and per-channel time-series reassembly.
//!
//! Raw streams of concatenated miniSEED records are split into gap-free
//! [`Segment`](crate::types::Segment)s, one list per channel, ready for
//! data-quality metrics:
//! - **Framing** of records from byte streams in [`io::formats::mseed`]
//! - **Segments** backed by pooled sample blocks in [`types`]
//! - **Splitting** with a bounded producer/consumer pipeline in [`split`]
//! - **Coverage** windows shared by several channels in [`coverage`]
//!
//! ## Architecture
//!
//! - `io/formats/mseed/` - Header parsing, record framing, sample decoding
//! - `types/` - Block pool and segment storage
//! - `split/` - Processor, assembler and thread orchestration
//! - `coverage/` - Cross-channel coverage intersection
//!
//! ## Example: Splitting files
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use seedsplit::{SeedSplitter, SplitterConfig};
//!
//! let config = SplitterConfig::default().with_quality_flags("D,Q");
//! let output = SeedSplitter::new(config)?.split_files(&["IU.ANMO.mseed"])?;
//! for (key, data) in &output.channels {
//!     for segment in &data.segments {
//!         println!("{key}: {segment}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Common coverage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use seedsplit::{SeedSplitter, SplitterConfig};
//!
//! let output = SeedSplitter::new(SplitterConfig::default())?.split_files(&["IU.ANMO.mseed"])?;
//! for block in output.coverage(&["IU_ANMO_00_LHZ", "IU_ANMO_10_LHZ"])? {
//!     println!("{block}");
//! }
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{ChannelKey, LocationAliases, Result, SplitError};

// Sample storage (block pool, segments)
pub mod types;

// I/O types (framing, headers, decoding, filters)
pub mod io;

// Re-export key I/O types
pub use io::formats::mseed::{
    CancelToken, RawIntegerDecoder, RecordFramer, RecordHeader, SampleDecoder,
};
pub use io::{ChannelFilter, Framed, QualityFilter, RawRecord};

pub use types::{BlockPool, Segment};

// Splitting pipeline
pub mod split;
pub use split::{ChannelData, SeedSplitter, SplitOutput, SplitStats, SplitterConfig};

// Cross-channel coverage
pub mod coverage;
pub use coverage::{ChannelCoverage, ContiguousBlock, CoverageLocator};
