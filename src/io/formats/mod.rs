// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record format implementations.
//!
//! - [`mseed`]: miniSEED v2 framing, header decoding and record building

pub mod mseed;
