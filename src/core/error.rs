// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for seedsplit.
//!
//! Errors fall into four families:
//! - Framing: corrupt chunk headers, unsupported record lengths
//! - Decoding: unsupported sample rates, payload decoding failures
//! - Reconciliation: interval mismatches and non-adjacent merges
//! - Pool invariants: blocks returned with the wrong size
//!
//! Per-chunk and per-record errors are contained by the framer and the
//! processor; only I/O and configuration errors reach the caller of a run.

use std::fmt;

/// Errors that can occur while framing, decoding or assembling records.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitError {
    /// Framing chunk could not be interpreted as the start of a record
    Framing {
        /// What was being framed
        context: String,
        /// Error message
        message: String,
    },

    /// Record header or payload could not be decoded
    Decode {
        /// What was being decoded
        context: String,
        /// Error message
        message: String,
    },

    /// Sample rate outside the supported range
    SampleRate {
        /// Offending rate in Hz
        rate: f64,
        /// Why it was rejected
        reason: String,
    },

    /// Payload encoding the decoder does not handle
    UnsupportedEncoding {
        /// Encoding code from blockette 1000
        encoding: u8,
    },

    /// Two series with different sample intervals were combined
    IntervalMismatch {
        /// Interval of the first series (microseconds)
        expected: i64,
        /// Interval of the second series (microseconds)
        actual: i64,
    },

    /// Two segments are neither adjacent nor overlapping
    MergeRange {
        /// Signed distance between the segments (microseconds)
        distance: i64,
        /// Error message
        message: String,
    },

    /// Requested window is not contained in the segment
    Range {
        /// Requested window start
        requested_start: i64,
        /// Requested window end
        requested_end: i64,
        /// Segment start
        start: i64,
        /// Segment end (exclusive)
        end: i64,
    },

    /// Block returned to a pool with the wrong length
    BlockSizeMismatch {
        /// Pool block size
        expected: usize,
        /// Length of the returned block
        actual: usize,
    },

    /// I/O failure on an input source
    Io {
        /// Source description (usually a path)
        source: String,
        /// Error message
        message: String,
    },

    /// Invalid configuration
    Config(String),

    /// Other error
    Other(String),
}

impl SplitError {
    /// Create a framing error.
    pub fn framing(context: impl Into<String>, message: impl Into<String>) -> Self {
        SplitError::Framing {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(context: impl Into<String>, message: impl Into<String>) -> Self {
        SplitError::Decode {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a sample rate error.
    pub fn sample_rate(rate: f64, reason: impl Into<String>) -> Self {
        SplitError::SampleRate {
            rate,
            reason: reason.into(),
        }
    }

    /// Create an unsupported encoding error.
    pub fn unsupported_encoding(encoding: u8) -> Self {
        SplitError::UnsupportedEncoding { encoding }
    }

    /// Create an interval mismatch error.
    pub fn interval_mismatch(expected: i64, actual: i64) -> Self {
        SplitError::IntervalMismatch { expected, actual }
    }

    /// Create a merge range error.
    pub fn merge_range(distance: i64, message: impl Into<String>) -> Self {
        SplitError::MergeRange {
            distance,
            message: message.into(),
        }
    }

    /// Create a range error.
    pub fn range(requested_start: i64, requested_end: i64, start: i64, end: i64) -> Self {
        SplitError::Range {
            requested_start,
            requested_end,
            start,
            end,
        }
    }

    /// Create a block size mismatch error.
    pub fn block_size_mismatch(expected: usize, actual: usize) -> Self {
        SplitError::BlockSizeMismatch { expected, actual }
    }

    /// Create an I/O error for a named source.
    pub fn io(source: impl Into<String>, message: impl Into<String>) -> Self {
        SplitError::Io {
            source: source.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        SplitError::Config(message.into())
    }

    /// Whether the error only affects a single chunk or record.
    ///
    /// Recoverable errors are counted and logged; the run continues.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SplitError::Io { .. } | SplitError::Config(_) | SplitError::BlockSizeMismatch { .. }
        )
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            SplitError::Framing { context, message } | SplitError::Decode { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            SplitError::SampleRate { rate, reason } => {
                vec![("rate", rate.to_string()), ("reason", reason.clone())]
            }
            SplitError::UnsupportedEncoding { encoding } => {
                vec![("encoding", encoding.to_string())]
            }
            SplitError::IntervalMismatch { expected, actual } => vec![
                ("expected", expected.to_string()),
                ("actual", actual.to_string()),
            ],
            SplitError::MergeRange { distance, message } => {
                vec![("distance", distance.to_string()), ("message", message.clone())]
            }
            SplitError::Range {
                requested_start,
                requested_end,
                start,
                end,
            } => vec![
                ("requested_start", requested_start.to_string()),
                ("requested_end", requested_end.to_string()),
                ("start", start.to_string()),
                ("end", end.to_string()),
            ],
            SplitError::BlockSizeMismatch { expected, actual } => vec![
                ("expected", expected.to_string()),
                ("actual", actual.to_string()),
            ],
            SplitError::Io { source, message } => {
                vec![("source", source.clone()), ("message", message.clone())]
            }
            SplitError::Config(msg) | SplitError::Other(msg) => vec![("message", msg.clone())],
        }
    }
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitError::Framing { context, message } => {
                write!(f, "Framing error in {context}: {message}")
            }
            SplitError::Decode { context, message } => {
                write!(f, "Decode error in {context}: {message}")
            }
            SplitError::SampleRate { rate, reason } => {
                write!(f, "Illegal sample rate {rate} Hz: {reason}")
            }
            SplitError::UnsupportedEncoding { encoding } => {
                write!(f, "Unsupported data encoding: {encoding}")
            }
            SplitError::IntervalMismatch { expected, actual } => write!(
                f,
                "Interval mismatch: expected {expected} us, found {actual} us"
            ),
            SplitError::MergeRange { distance, message } => {
                write!(f, "Merge range error ({distance} us apart): {message}")
            }
            SplitError::Range {
                requested_start,
                requested_end,
                start,
                end,
            } => write!(
                f,
                "Range [{requested_start}, {requested_end}] is not within [{start}, {end}]"
            ),
            SplitError::BlockSizeMismatch { expected, actual } => write!(
                f,
                "Block size mismatch: pool holds {expected}-sample blocks, got {actual}"
            ),
            SplitError::Io { source, message } => write!(f, "I/O error on '{source}': {message}"),
            SplitError::Config(msg) => write!(f, "Configuration error: {msg}"),
            SplitError::Other(msg) => write!(f, "Other error: {msg}"),
        }
    }
}

impl std::error::Error for SplitError {}

impl From<std::io::Error> for SplitError {
    fn from(err: std::io::Error) -> Self {
        SplitError::Io {
            source: "stream".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for seedsplit operations.
pub type Result<T> = std::result::Result<T, SplitError>;
