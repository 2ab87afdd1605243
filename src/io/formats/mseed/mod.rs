// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! miniSEED v2 record support.
//!
//! - [`framer`]: chunked record framing over any `Read`
//! - [`header`]: fixed header and blockette decoding
//! - [`codec`]: payload decoding seam and uncompressed integer decoder
//! - [`builder`]: record writer for synthetic data

pub mod builder;
pub mod codec;
pub mod constants;
pub mod framer;
pub mod header;

pub use builder::RecordBuilder;
pub use codec::{RawIntegerDecoder, SampleDecoder};
pub use constants::{FRAME_SIZE, MAX_RECORD_SIZE, MIN_RECORD_SIZE, QUALITY_OFFSET};
pub use framer::{CancelToken, FramerStats, RecordFramer};
pub use header::{crack_record_length, is_heartbeat, CalibrationMarker, RecordHeader, WordOrder};
