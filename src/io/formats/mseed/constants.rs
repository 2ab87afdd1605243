// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! miniSEED v2 layout constants.
//!
//! Offsets are relative to the start of a record. Multi-byte fields use the
//! byte order detected from the header's start-time year and day.

/// Framing granularity: records are read in chunks of this size.
pub const FRAME_SIZE: usize = 256;
/// Smallest record length accepted.
pub const MIN_RECORD_SIZE: usize = 256;
/// Largest record length accepted.
pub const MAX_RECORD_SIZE: usize = 16384;

/// Length of the fixed data header.
pub const FIXED_HEADER_SIZE: usize = 48;

// Fixed header field offsets

/// Six ASCII digits.
pub const SEQUENCE_OFFSET: usize = 0;
pub const SEQUENCE_LEN: usize = 6;
/// Data quality indicator (`D`, `R`, `Q` or `M`).
pub const QUALITY_OFFSET: usize = 6;
pub const STATION_OFFSET: usize = 8;
pub const STATION_LEN: usize = 5;
pub const LOCATION_OFFSET: usize = 13;
pub const LOCATION_LEN: usize = 2;
pub const CHANNEL_OFFSET: usize = 15;
pub const CHANNEL_LEN: usize = 3;
pub const NETWORK_OFFSET: usize = 18;
pub const NETWORK_LEN: usize = 2;
/// End of the identification block (sequence through network).
pub const IDENT_END: usize = 20;
pub const START_TIME_OFFSET: usize = 20;
pub const NUM_SAMPLES_OFFSET: usize = 30;
pub const RATE_FACTOR_OFFSET: usize = 32;
pub const RATE_MULTIPLIER_OFFSET: usize = 34;
pub const ACTIVITY_FLAGS_OFFSET: usize = 36;
pub const IO_FLAGS_OFFSET: usize = 37;
pub const QUALITY_FLAGS_OFFSET: usize = 38;
pub const BLOCKETTE_COUNT_OFFSET: usize = 39;
pub const TIME_CORRECTION_OFFSET: usize = 40;
pub const DATA_OFFSET_OFFSET: usize = 44;
pub const FIRST_BLOCKETTE_OFFSET: usize = 46;

// Blockette types

/// Sample rate.
/// Generic calibration.
pub const BLOCKETTE_320: u16 = 320;
/// Data only SEED: encoding, word order and record length.
pub const BLOCKETTE_1000: u16 = 1000;
/// Data extension: timing quality.
pub const BLOCKETTE_1001: u16 = 1001;

pub const BLOCKETTE_320_LEN: usize = 64;
pub const BLOCKETTE_1000_LEN: usize = 8;
pub const BLOCKETTE_1001_LEN: usize = 8;

// Data encodings (blockette 1000)

pub const ENCODING_INT16: u8 = 1;
pub const ENCODING_INT32: u8 = 3;
pub const ENCODING_STEIM2: u8 = 11;

/// Quality codes defined by the format.
pub const QUALITY_CODES: [u8; 4] = [b'D', b'R', b'Q', b'M'];
