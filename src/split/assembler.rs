// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Final per-channel segment assembly.
//!
//! Segments closed by the processor may overlap or abut once records from
//! several sources have been interleaved. Sorting them by span and folding
//! each into its predecessor leaves one segment per uninterrupted run.

use serde::Serialize;
use tracing::{debug, error};

use crate::core::ChannelKey;
use crate::types::Segment;
use crate::SplitError;

/// Counters collected while assembling segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    /// Segments folded into a neighbour
    pub merges: u64,
    /// Merges refused because of a gap
    pub gaps: u64,
    /// Merges refused because the intervals differ
    pub interval_mismatches: u64,
    /// Segments dropped for holding no samples
    pub empty_discarded: u64,
}

impl AssemblyStats {
    pub fn merge(&mut self, other: &AssemblyStats) {
        self.merges += other.merges;
        self.gaps += other.gaps;
        self.interval_mismatches += other.interval_mismatches;
        self.empty_discarded += other.empty_discarded;
    }
}

/// Sort and fold one channel's segments.
///
/// Returns the segments ordered by start time with every mergeable pair
/// combined.
pub fn assemble(key: &ChannelKey, segments: Vec<Segment>) -> (Vec<Segment>, AssemblyStats) {
    let mut stats = AssemblyStats::default();
    let mut segments: Vec<Segment> = segments
        .into_iter()
        .filter(|segment| {
            let keep = !segment.is_empty();
            if !keep {
                stats.empty_discarded += 1;
            }
            keep
        })
        .collect();
    segments.sort_by(|a, b| a.cmp_span(b));

    let mut assembled: Vec<Segment> = Vec::with_capacity(segments.len());
    let mut iter = segments.into_iter();
    let Some(mut current) = iter.next() else {
        return (assembled, stats);
    };

    for segment in iter {
        match segment.merge_into(&mut current) {
            Ok(()) => stats.merges += 1,
            Err(rejection) => {
                match &rejection.error {
                    SplitError::IntervalMismatch { expected, actual } => {
                        stats.interval_mismatches += 1;
                        error!(
                            context = "assemble",
                            channel = %key,
                            expected,
                            actual,
                            "Segments with different intervals on one channel"
                        );
                    }
                    e => {
                        stats.gaps += 1;
                        debug!(context = "assemble", channel = %key, error = %e, "Gap");
                    }
                }
                let mut done = std::mem::replace(&mut current, rejection.segment);
                done.shrink_to_fit();
                assembled.push(done);
            }
        }
    }
    current.shrink_to_fit();
    assembled.push(current);

    debug!(
        context = "assemble",
        channel = %key,
        segments = assembled.len(),
        merges = stats.merges,
        "Assembled channel"
    );
    (assembled, stats)
}
