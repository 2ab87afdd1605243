// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout seedsplit.
//!
//! This module provides the foundational types for the library:
//! - [`SplitError`] - Error taxonomy for framing, decoding and assembly
//! - [`ChannelKey`] - Identity of one logical time series
//! - [`LocationAliases`] - Location-code normalization table
//! - [`time`] - Sample intervals and record timestamps

pub mod channel;
pub mod error;
pub mod time;

pub use channel::{ChannelKey, LocationAliases, DEFAULT_LOCATION};
pub use error::{Result, SplitError};
pub use time::{format_timestamp, sample_rate_to_interval, BTime};
