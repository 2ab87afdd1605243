// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common coverage across channels.
//!
//! Cross-channel metrics (e.g. comparing two sensors at one station) need
//! time windows where every channel involved has data. Starting from the
//! first channel's contiguous blocks, each further channel clips the
//! windows to its own span and cuts them at its gaps.

use serde::Serialize;

use crate::core::time::format_timestamp;
use crate::types::Segment;
use crate::{Result, SplitError};

/// A read-only window of uninterrupted data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContiguousBlock {
    start_time: i64,
    end_time: i64,
    interval: i64,
}

impl ContiguousBlock {
    /// Create a block spanning `[start_time, end_time)`.
    pub fn new(start_time: i64, end_time: i64, interval: i64) -> Self {
        Self {
            start_time,
            end_time,
            interval,
        }
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Exclusive end time.
    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    /// Span in microseconds.
    pub fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }

    /// Number of sample slots in the window.
    pub fn sample_count(&self) -> i64 {
        if self.interval == 0 {
            0
        } else {
            self.duration() / self.interval
        }
    }
}

impl std::fmt::Display for ContiguousBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            format_timestamp(self.start_time),
            format_timestamp(self.end_time)
        )
    }
}

/// Coverage of one channel: its data windows, overall span and gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCoverage {
    interval: i64,
    blocks: Vec<ContiguousBlock>,
    /// `(end of data, start of next data)` pairs
    gaps: Vec<(i64, i64)>,
}

impl ChannelCoverage {
    /// Build from data windows sharing one interval.
    pub fn from_blocks(interval: i64, mut blocks: Vec<ContiguousBlock>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(SplitError::Other("channel has no data".to_string()));
        }
        if let Some(bad) = blocks.iter().find(|b| b.interval != interval) {
            return Err(SplitError::interval_mismatch(interval, bad.interval));
        }
        blocks.sort_by_key(|b| (b.start_time, b.end_time));

        let mut gaps = Vec::new();
        let mut reach = blocks[0].end_time;
        for block in &blocks[1..] {
            if block.start_time > reach {
                gaps.push((reach, block.start_time));
            }
            reach = reach.max(block.end_time);
        }
        Ok(Self {
            interval,
            blocks,
            gaps,
        })
    }

    /// Build from a channel's final segment list.
    pub fn from_segments(segments: &[Segment]) -> Result<Self> {
        let first = segments
            .first()
            .ok_or_else(|| SplitError::Other("channel has no segments".to_string()))?;
        let blocks = segments
            .iter()
            .map(|s| ContiguousBlock::new(s.start_time(), s.end_time(), s.interval()))
            .collect();
        Self::from_blocks(first.interval(), blocks)
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn blocks(&self) -> &[ContiguousBlock] {
        &self.blocks
    }

    pub fn gaps(&self) -> &[(i64, i64)] {
        &self.gaps
    }

    /// Earliest data time.
    pub fn start_time(&self) -> i64 {
        self.blocks[0].start_time
    }

    /// Latest data end (exclusive).
    pub fn end_time(&self) -> i64 {
        self.blocks
            .iter()
            .map(|b| b.end_time)
            .max()
            .unwrap_or(self.blocks[0].end_time)
    }
}

/// Computes windows covered by every channel at once.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoverageLocator;

impl CoverageLocator {
    /// Intersect channel coverages.
    ///
    /// # Errors
    ///
    /// Fails with [`SplitError::IntervalMismatch`] unless all channels share
    /// one interval.
    pub fn intersect(channels: &[ChannelCoverage]) -> Result<Vec<ContiguousBlock>> {
        let Some(first) = channels.first() else {
            return Ok(Vec::new());
        };
        let interval = first.interval;
        if let Some(bad) = channels.iter().find(|c| c.interval != interval) {
            return Err(SplitError::interval_mismatch(interval, bad.interval));
        }

        let mut windows = first.blocks.clone();
        for channel in &channels[1..] {
            windows = Self::restrict(&windows, channel);
        }
        windows.sort_by_key(|b| (b.start_time, b.end_time));
        Ok(windows)
    }

    /// Clip windows to a channel's span and cut them at its gaps.
    fn restrict(windows: &[ContiguousBlock], channel: &ChannelCoverage) -> Vec<ContiguousBlock> {
        let span_start = channel.start_time();
        let span_end = channel.end_time();
        let mut result = Vec::new();

        for window in windows {
            let start = window.start_time.max(span_start);
            let end = window.end_time.min(span_end);
            if start >= end {
                continue;
            }

            let mut cursor = start;
            for &(gap_start, gap_end) in &channel.gaps {
                if gap_end <= cursor {
                    continue;
                }
                if gap_start >= end {
                    break;
                }
                if gap_start > cursor {
                    result.push(ContiguousBlock::new(cursor, gap_start, window.interval));
                }
                cursor = gap_end;
            }
            if cursor < end {
                result.push(ContiguousBlock::new(cursor, end, window.interval));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: i64 = 1_000_000;

    fn coverage(spans: &[(i64, i64)]) -> ChannelCoverage {
        let blocks = spans
            .iter()
            .map(|&(s, e)| ContiguousBlock::new(s * S, e * S, S))
            .collect();
        ChannelCoverage::from_blocks(S, blocks).unwrap()
    }

    fn spans(blocks: &[ContiguousBlock]) -> Vec<(i64, i64)> {
        blocks
            .iter()
            .map(|b| (b.start_time() / S, b.end_time() / S))
            .collect()
    }

    #[test]
    fn test_single_channel() {
        let a = coverage(&[(10, 20), (0, 5)]);
        let result = CoverageLocator::intersect(&[a]).unwrap();
        assert_eq!(spans(&result), vec![(0, 5), (10, 20)]);
    }

    #[test]
    fn test_gaps_recorded() {
        let a = coverage(&[(0, 5), (10, 20), (20, 30)]);
        assert_eq!(a.gaps(), &[(5 * S, 10 * S)]);
        assert_eq!(a.start_time(), 0);
        assert_eq!(a.end_time(), 30 * S);
    }

    #[test]
    fn test_clip_to_span() {
        let a = coverage(&[(0, 100)]);
        let b = coverage(&[(10, 50)]);
        let result = CoverageLocator::intersect(&[a, b]).unwrap();
        assert_eq!(spans(&result), vec![(10, 50)]);
    }

    #[test]
    fn test_split_at_gaps() {
        let a = coverage(&[(0, 100)]);
        let b = coverage(&[(0, 20), (30, 40), (60, 100)]);
        let result = CoverageLocator::intersect(&[a, b]).unwrap();
        assert_eq!(spans(&result), vec![(0, 20), (30, 40), (60, 100)]);
    }

    #[test]
    fn test_window_inside_gap_dropped() {
        let a = coverage(&[(0, 10), (22, 28), (40, 50)]);
        let b = coverage(&[(0, 20), (30, 50)]);
        let result = CoverageLocator::intersect(&[a, b]).unwrap();
        assert_eq!(spans(&result), vec![(0, 10), (40, 50)]);
    }

    #[test]
    fn test_three_channels() {
        let a = coverage(&[(0, 100)]);
        let b = coverage(&[(0, 40), (50, 100)]);
        let c = coverage(&[(20, 90)]);
        let result = CoverageLocator::intersect(&[a, b, c]).unwrap();
        assert_eq!(spans(&result), vec![(20, 40), (50, 90)]);
    }

    #[test]
    fn test_disjoint_channels() {
        let a = coverage(&[(0, 10)]);
        let b = coverage(&[(20, 30)]);
        assert!(CoverageLocator::intersect(&[a, b]).unwrap().is_empty());
    }

    #[test]
    fn test_interval_mismatch() {
        let a = coverage(&[(0, 10)]);
        let b = ChannelCoverage::from_blocks(
            S / 20,
            vec![ContiguousBlock::new(0, 10 * S, S / 20)],
        )
        .unwrap();
        assert!(matches!(
            CoverageLocator::intersect(&[a, b]),
            Err(SplitError::IntervalMismatch { .. })
        ));
    }

    #[test]
    fn test_from_segments() {
        let segments = vec![
            Segment::from_samples(0, 1.0, &[0; 5]).unwrap(),
            Segment::from_samples(10 * S, 1.0, &[0; 5]).unwrap(),
        ];
        let coverage = ChannelCoverage::from_segments(&segments).unwrap();
        assert_eq!(coverage.gaps(), &[(5 * S, 10 * S)]);
        assert_eq!(coverage.blocks()[1].sample_count(), 5);
        assert!(ChannelCoverage::from_segments(&[]).is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(CoverageLocator::intersect(&[]).unwrap().is_empty());
    }
}
