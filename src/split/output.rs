// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Results of a split run.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::assembler::AssemblyStats;
use super::processor::ProcessorStats;
use crate::core::ChannelKey;
use crate::coverage::{ChannelCoverage, ContiguousBlock, CoverageLocator};
use crate::io::formats::mseed::{CalibrationMarker, FramerStats};
use crate::types::Segment;
use crate::{Result, SplitError};

/// Everything collected for one channel.
#[derive(Debug, Default)]
pub struct ChannelData {
    /// Gap-free segments ordered by start time
    pub segments: Vec<Segment>,
    /// Timing quality codes in arrival order
    pub timing_quality: Vec<u8>,
    /// Calibration markers in arrival order
    pub calibrations: Vec<CalibrationMarker>,
    /// Records that contributed samples
    pub record_count: u64,
}

impl ChannelData {
    /// Total samples across all segments.
    pub fn sample_count(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }
}

/// Run statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitStats {
    /// Input sources read
    pub sources: usize,
    /// Framer counters summed over all sources
    pub framing: FramerStats,
    pub processing: ProcessorStats,
    pub assembly: AssemblyStats,
    /// Channels with at least one segment
    pub channels: usize,
    /// Final segment count
    pub segments: usize,
    /// Wall-clock time of the run in seconds
    pub elapsed_sec: f64,
}

/// Per-channel data and statistics of a finished run.
#[derive(Debug, Default)]
pub struct SplitOutput {
    pub channels: BTreeMap<ChannelKey, ChannelData>,
    pub stats: SplitStats,
}

impl SplitOutput {
    /// Look up a channel by `NET_STA_LOC_CHA` name.
    ///
    /// The same name at different sample rates yields separate keys; the
    /// lowest-ordered one is returned.
    pub fn channel(&self, name: &str) -> Option<(&ChannelKey, &ChannelData)> {
        let mut matches = self.channels.iter().filter(|(key, _)| key.name() == name);
        let first = matches.next()?;
        if matches.next().is_some() {
            warn!(
                context = "SplitOutput::channel",
                channel = name,
                "Several sample rates recorded, using {}",
                first.0
            );
        }
        Some(first)
    }

    /// Windows where every named channel has data.
    ///
    /// # Errors
    ///
    /// Fails if a name is unknown or has no segments, or if the channels do
    /// not share one sample interval.
    pub fn coverage(&self, names: &[&str]) -> Result<Vec<ContiguousBlock>> {
        let coverages = names
            .iter()
            .map(|name| {
                let (_, data) = self
                    .channel(name)
                    .ok_or_else(|| SplitError::Other(format!("unknown channel '{name}'")))?;
                ChannelCoverage::from_segments(&data.segments)
            })
            .collect::<Result<Vec<_>>>()?;
        CoverageLocator::intersect(&coverages)
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
