// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sample storage.
//!
//! This module contains the data structures that hold decoded samples:
//! [`BlockPool`] and [`Segment`].

pub mod buffer_pool;
pub mod segment;

pub use buffer_pool::{BlockHandle, BlockPool, PoolStats, DEFAULT_BLOCK_SIZE};
pub use segment::{MergeRejection, Segment, SegmentSummary, DEFAULT_JITTER_DIVISOR};
