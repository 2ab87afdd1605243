// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer for miniSEED record streams.
//!
//! This module provides record framing and decoding along with the items
//! passed between framers and the processor.

pub mod formats;
pub mod metadata;

// Re-exports
pub use metadata::{Framed, RawRecord};

// Quality and channel selection
pub mod filter;
pub use filter::{ChannelFilter, QualityFilter};
