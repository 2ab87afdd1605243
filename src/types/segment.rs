// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Contiguous fixed-interval sample runs.
//!
//! A [`Segment`] holds samples with no internal gaps: sample `i` is at
//! `start_time + i * interval`. Storage is a list of blocks from the
//! segment's own [`BlockPool`]; every block but the last is full.
//!
//! Segments are merged when they touch or overlap within a jitter
//! tolerance of `interval / 10`. Overlapping samples are not reconciled:
//! the segment that starts first keeps its samples and the overlapping head
//! of the other one is dropped.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::buffer_pool::{BlockHandle, BlockPool, DEFAULT_BLOCK_SIZE};
use crate::core::time::{format_timestamp, sample_rate_to_interval};
use crate::{Result, SplitError};

/// Default divisor applied to the interval to get the jitter tolerance.
pub const DEFAULT_JITTER_DIVISOR: i64 = 10;

/// Gap-free run of samples at a fixed interval.
pub struct Segment {
    start_time: i64,
    interval: i64,
    sample_rate: f64,
    jitter_divisor: i64,
    length: usize,
    blocks: Vec<BlockHandle>,
    pool: BlockPool,
}

/// A merge that was refused; the segment is handed back unchanged.
#[derive(Debug)]
pub struct MergeRejection {
    pub error: SplitError,
    pub segment: Segment,
}

impl fmt::Display for MergeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for MergeRejection {}

impl From<MergeRejection> for SplitError {
    fn from(rejection: MergeRejection) -> Self {
        rejection.error
    }
}

/// Serializable description of a segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub start_time: i64,
    pub end_time: i64,
    pub interval: i64,
    pub sample_rate: f64,
    pub samples: usize,
    pub digest: u32,
}

impl Segment {
    /// Create an empty segment starting at `start_time` (microseconds).
    ///
    /// # Errors
    ///
    /// Fails if the sample rate is outside the supported range.
    pub fn new(start_time: i64, sample_rate: f64) -> Result<Self> {
        Self::with_block_size(start_time, sample_rate, DEFAULT_BLOCK_SIZE)
    }

    /// Create an empty segment backed by blocks of `block_size` samples.
    pub fn with_block_size(start_time: i64, sample_rate: f64, block_size: usize) -> Result<Self> {
        let interval = sample_rate_to_interval(sample_rate)?;
        Ok(Self {
            start_time,
            interval,
            sample_rate,
            jitter_divisor: DEFAULT_JITTER_DIVISOR,
            length: 0,
            blocks: Vec::new(),
            pool: BlockPool::new(block_size)?,
        })
    }

    /// Create a segment holding `samples`.
    pub fn from_samples(start_time: i64, sample_rate: f64, samples: &[i32]) -> Result<Self> {
        let mut segment = Self::new(start_time, sample_rate)?;
        segment.append(samples);
        Ok(segment)
    }

    /// Override the jitter divisor (tolerance is `interval / divisor`).
    pub fn with_jitter_divisor(mut self, divisor: i64) -> Self {
        self.jitter_divisor = divisor.max(1);
        self
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Time just past the last sample (exclusive).
    pub fn end_time(&self) -> i64 {
        self.start_time + self.interval * self.length as i64
    }

    /// Time of the last sample, or the start time when empty.
    pub fn last_sample_time(&self) -> i64 {
        if self.length == 0 {
            self.start_time
        } else {
            self.end_time() - self.interval
        }
    }

    /// Sample spacing in microseconds.
    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Timing slack allowed when deciding contiguity.
    pub fn tolerance(&self) -> i64 {
        self.interval / self.jitter_divisor
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn block_size(&self) -> usize {
        self.pool.block_size()
    }

    pub fn pool(&self) -> &BlockPool {
        &self.pool
    }

    /// Drop pool blocks that hold no samples.
    ///
    /// Blocks adopted from merged segments stay on the free list until this
    /// is called.
    pub fn shrink_to_fit(&mut self) {
        let dropped = self.pool.compact(&mut self.blocks);
        if dropped > 0 {
            debug!(
                context = "Segment::shrink_to_fit",
                dropped,
                kept = self.blocks.len(),
                "Released unused blocks"
            );
        }
    }

    /// Append samples to the end of the segment.
    pub fn append(&mut self, samples: &[i32]) {
        let block_size = self.pool.block_size();
        let mut rest = samples;
        while !rest.is_empty() {
            if self.length == self.blocks.len() * block_size {
                let handle = self.pool.acquire();
                self.blocks.push(handle);
            }
            let offset = self.length % block_size;
            let count = (block_size - offset).min(rest.len());
            let Some(&handle) = self.blocks.last() else {
                return;
            };
            self.pool.get_mut(handle)[offset..offset + count].copy_from_slice(&rest[..count]);
            self.length += count;
            rest = &rest[count..];
        }
    }

    /// Sample at `index`, if within the segment.
    pub fn get(&self, index: usize) -> Option<i32> {
        if index >= self.length {
            return None;
        }
        let block_size = self.pool.block_size();
        let handle = self.blocks[index / block_size];
        Some(self.pool.get(handle)[index % block_size])
    }

    /// Iterate over all samples in order.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.blocks
            .iter()
            .flat_map(move |&handle| self.pool.get(handle).iter().copied())
            .take(self.length)
    }

    /// Copy of all samples.
    pub fn samples(&self) -> Vec<i32> {
        self.iter().collect()
    }

    /// Whether `[start, end]` lies within the segment's span.
    pub fn contains_range(&self, start: i64, end: i64) -> bool {
        start <= end && start >= self.start_time && end <= self.end_time()
    }

    /// Copy the samples whose nominal time lies in the closed range
    /// `[start, end]`.
    ///
    /// # Errors
    ///
    /// Fails with [`SplitError::Range`] unless
    /// `start_time() <= start <= end <= end_time()`.
    pub fn extract_range(&self, start: i64, end: i64) -> Result<Vec<i32>> {
        if !self.contains_range(start, end) {
            return Err(SplitError::range(start, end, self.start_time, self.end_time()));
        }
        if self.length == 0 {
            return Ok(Vec::new());
        }
        let first = (start - self.start_time + self.interval - 1) / self.interval;
        let last = ((end - self.start_time) / self.interval).min(self.length as i64 - 1);
        if first > last {
            return Ok(Vec::new());
        }
        Ok(self
            .iter()
            .skip(first as usize)
            .take((last - first + 1) as usize)
            .collect())
    }

    /// Order by start time, then by end time (shorter first).
    ///
    /// This is a sorting order only; it says nothing about sample equality.
    pub fn cmp_span(&self, other: &Segment) -> Ordering {
        self.start_time
            .cmp(&other.start_time)
            .then_with(|| self.end_time().cmp(&other.end_time()))
    }

    /// CRC-32 over start time, interval and samples.
    pub fn digest(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.start_time.to_be_bytes());
        hasher.update(&self.interval.to_be_bytes());
        for sample in self.iter() {
            hasher.update(&sample.to_be_bytes());
        }
        hasher.finalize()
    }

    pub fn summary(&self) -> SegmentSummary {
        SegmentSummary {
            start_time: self.start_time,
            end_time: self.end_time(),
            interval: self.interval,
            sample_rate: self.sample_rate,
            samples: self.length,
            digest: self.digest(),
        }
    }

    /// Merge this segment into `target`.
    ///
    /// On success `target` covers the union of both spans. Samples of the
    /// earlier-starting segment win where the two overlap.
    ///
    /// # Errors
    ///
    /// Refused merges return the segment untouched inside
    /// [`MergeRejection`]:
    /// - [`SplitError::IntervalMismatch`] if the intervals differ
    /// - [`SplitError::MergeRange`] if a gap wider than the tolerance
    ///   separates the two segments
    pub fn merge_into(mut self, target: &mut Segment) -> std::result::Result<(), MergeRejection> {
        if self.interval != target.interval {
            let error = SplitError::interval_mismatch(target.interval, self.interval);
            return Err(MergeRejection {
                error,
                segment: self,
            });
        }

        let tolerance = target.tolerance();
        let after = self.start_time - target.end_time();
        let before = target.start_time - self.end_time();
        if after > tolerance || before > tolerance {
            let (distance, message) = if after > tolerance {
                (after, "segment starts after the end of the target")
            } else {
                (before, "target starts after the end of the segment")
            };
            return Err(MergeRejection {
                error: SplitError::merge_range(distance, message),
                segment: self,
            });
        }

        if self.start_time >= target.start_time && self.end_time() <= target.end_time() {
            debug!(
                context = "Segment::merge_into",
                "Discarding {} samples already covered by target",
                self.length
            );
            return Ok(());
        }

        if self.start_time < target.start_time {
            std::mem::swap(&mut self, target);
            return self.merge_into(target);
        }

        let overlap = target.end_time() - self.start_time;
        let skip = ((overlap + self.interval / 2).div_euclid(self.interval)).max(0) as usize;
        let skip = skip.min(self.length);
        if skip > 0 {
            debug!(
                context = "Segment::merge_into",
                "Dropping {skip} overlapping samples at {}",
                format_timestamp(self.start_time)
            );
        }

        let block_size = self.pool.block_size();
        let mut index = skip;
        while index < self.length {
            let block = self.pool.get(self.blocks[index / block_size]);
            let offset = index % block_size;
            let count = (block_size - offset).min(self.length - index);
            target.append(&block[offset..offset + count]);
            index += count;
        }

        if self.pool.block_size() == target.pool.block_size() {
            if let Err(e) = target.pool.absorb(self.pool) {
                debug!(context = "Segment::merge_into", error = %e, "Blocks not reused");
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time())
            .field("interval", &self.interval)
            .field("sample_rate", &self.sample_rate)
            .field("length", &self.length)
            .finish()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {} ({} samples)",
            format_timestamp(self.start_time),
            format_timestamp(self.end_time()),
            self.length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: i64 = 1_000_000;

    fn ramp(start: i32, count: usize) -> Vec<i32> {
        (start..start + count as i32).collect()
    }

    #[test]
    fn test_append_across_blocks() {
        let mut segment = Segment::with_block_size(0, 1.0, 4).unwrap();
        segment.append(&ramp(0, 3));
        segment.append(&ramp(3, 7));
        assert_eq!(segment.len(), 10);
        assert_eq!(segment.samples(), ramp(0, 10));
        assert_eq!(segment.pool().stats().total_blocks, 3);
        assert_eq!(segment.get(9), Some(9));
        assert_eq!(segment.get(10), None);
    }

    #[test]
    fn test_times() {
        let segment = Segment::from_samples(10 * SECOND, 1.0, &[1, 2, 3]).unwrap();
        assert_eq!(segment.interval(), SECOND);
        assert_eq!(segment.tolerance(), SECOND / 10);
        assert_eq!(segment.end_time(), 13 * SECOND);
        assert_eq!(segment.last_sample_time(), 12 * SECOND);
    }

    #[test]
    fn test_extract_range() {
        let segment = Segment::from_samples(0, 1.0, &ramp(0, 10)).unwrap();
        assert_eq!(segment.extract_range(2 * SECOND, 4 * SECOND).unwrap(), vec![2, 3, 4]);
        assert_eq!(
            segment.extract_range(SECOND / 2, 2 * SECOND + 1).unwrap(),
            vec![1, 2]
        );
        assert_eq!(segment.extract_range(0, 10 * SECOND).unwrap(), ramp(0, 10));
        assert!(segment.extract_range(SECOND / 2, SECOND / 2 + 1).unwrap().is_empty());
    }

    #[test]
    fn test_extract_range_out_of_bounds() {
        let segment = Segment::from_samples(SECOND, 1.0, &ramp(0, 5)).unwrap();
        assert!(matches!(
            segment.extract_range(0, 2 * SECOND),
            Err(SplitError::Range { .. })
        ));
        assert!(segment.extract_range(2 * SECOND, 7 * SECOND).is_err());
        assert!(segment.extract_range(3 * SECOND, 2 * SECOND).is_err());
    }

    #[test]
    fn test_merge_adjacent() {
        let first = Segment::from_samples(0, 1.0, &ramp(0, 5)).unwrap();
        let mut target = first;
        let next = Segment::from_samples(5 * SECOND, 1.0, &ramp(5, 5)).unwrap();
        next.merge_into(&mut target).unwrap();
        assert_eq!(target.samples(), ramp(0, 10));
        assert_eq!(target.start_time(), 0);
    }

    #[test]
    fn test_merge_earlier_segment_swaps() {
        let mut target = Segment::from_samples(5 * SECOND, 1.0, &ramp(5, 5)).unwrap();
        let earlier = Segment::from_samples(0, 1.0, &ramp(0, 5)).unwrap();
        earlier.merge_into(&mut target).unwrap();
        assert_eq!(target.start_time(), 0);
        assert_eq!(target.samples(), ramp(0, 10));
    }

    #[test]
    fn test_merge_overlap_keeps_earliest() {
        let mut target = Segment::from_samples(0, 1.0, &[0, 1, 2, 3, 4]).unwrap();
        let later = Segment::from_samples(3 * SECOND, 1.0, &[-3, -4, 5, 6]).unwrap();
        later.merge_into(&mut target).unwrap();
        assert_eq!(target.samples(), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_merge_within_jitter() {
        let mut target = Segment::from_samples(0, 1.0, &ramp(0, 3)).unwrap();
        let jittered = Segment::from_samples(3 * SECOND + 50_000, 1.0, &ramp(3, 2)).unwrap();
        jittered.merge_into(&mut target).unwrap();
        assert_eq!(target.samples(), ramp(0, 5));
        assert_eq!(target.start_time(), 0);
    }

    #[test]
    fn test_merge_sub_range_discarded() {
        let mut target = Segment::from_samples(0, 1.0, &ramp(0, 10)).unwrap();
        let inner = Segment::from_samples(2 * SECOND, 1.0, &[99, 99]).unwrap();
        inner.merge_into(&mut target).unwrap();
        assert_eq!(target.samples(), ramp(0, 10));
    }

    #[test]
    fn test_merge_gap_rejected() {
        let mut target = Segment::from_samples(0, 1.0, &ramp(0, 5)).unwrap();
        let distant = Segment::from_samples(10 * SECOND, 1.0, &ramp(10, 5)).unwrap();
        let rejection = distant.merge_into(&mut target).unwrap_err();
        assert!(matches!(
            rejection.error,
            SplitError::MergeRange { distance, .. } if distance == 5 * SECOND
        ));
        assert_eq!(rejection.segment.samples(), ramp(10, 5));
        assert_eq!(target.samples(), ramp(0, 5));

        // the gap is rejected from the other side as well
        let mut later = rejection.segment;
        let early = Segment::from_samples(0, 1.0, &ramp(0, 5)).unwrap();
        assert!(early.merge_into(&mut later).is_err());
        assert_eq!(later.start_time(), 10 * SECOND);
    }

    #[test]
    fn test_merge_interval_mismatch() {
        let mut target = Segment::from_samples(0, 1.0, &ramp(0, 5)).unwrap();
        let other = Segment::from_samples(5 * SECOND, 20.0, &ramp(0, 5)).unwrap();
        let rejection = other.merge_into(&mut target).unwrap_err();
        assert_eq!(
            rejection.error,
            SplitError::interval_mismatch(SECOND, 50_000)
        );
        assert_eq!(rejection.segment.len(), 5);
    }

    #[test]
    fn test_merge_donates_blocks() {
        let mut target = Segment::with_block_size(0, 1.0, 4).unwrap();
        target.append(&ramp(0, 4));
        let mut next = Segment::with_block_size(4 * SECOND, 1.0, 4).unwrap();
        next.append(&ramp(4, 8));
        next.merge_into(&mut target).unwrap();

        let stats = target.pool().stats();
        assert_eq!(target.samples(), ramp(0, 12));
        assert_eq!(stats.total_blocks, 5);
        assert_eq!(stats.free_blocks, 2);

        target.shrink_to_fit();
        let stats = target.pool().stats();
        assert_eq!(stats.total_blocks, 3);
        assert_eq!(stats.free_blocks, 0);
        assert_eq!(target.samples(), ramp(0, 12));

        target.append(&ramp(12, 2));
        assert_eq!(target.samples(), ramp(0, 14));
    }

    #[test]
    fn test_merge_overlap_across_block_boundary() {
        let mut target = Segment::with_block_size(0, 1.0, 3).unwrap();
        target.append(&ramp(0, 7));
        let mut next = Segment::with_block_size(5 * SECOND, 1.0, 3).unwrap();
        next.append(&ramp(5, 9));
        next.merge_into(&mut target).unwrap();
        assert_eq!(target.samples(), ramp(0, 14));
        assert_eq!(target.end_time(), 14 * SECOND);
    }

    #[test]
    fn test_cmp_span() {
        let a = Segment::from_samples(0, 1.0, &ramp(0, 5)).unwrap();
        let b = Segment::from_samples(0, 1.0, &ramp(0, 8)).unwrap();
        let c = Segment::from_samples(SECOND, 1.0, &ramp(0, 1)).unwrap();
        assert_eq!(a.cmp_span(&b), Ordering::Less);
        assert_eq!(b.cmp_span(&c), Ordering::Less);
        assert_eq!(c.cmp_span(&a), Ordering::Greater);
        assert_eq!(a.cmp_span(&a), Ordering::Equal);
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = Segment::from_samples(0, 1.0, &[1, 2, 3]).unwrap();
        let b = Segment::from_samples(0, 1.0, &[1, 2, 3]).unwrap();
        let c = Segment::from_samples(0, 1.0, &[1, 2, 4]).unwrap();
        let d = Segment::from_samples(SECOND, 1.0, &[1, 2, 3]).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_ne!(a.digest(), d.digest());
        assert_eq!(a.summary().samples, 3);
    }

    #[test]
    fn test_invalid_rate() {
        assert!(Segment::new(0, 0.0).is_err());
        assert!(Segment::with_block_size(0, 1.0, 0).is_err());
    }
}
