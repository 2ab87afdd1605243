// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Segment storage and merge properties.

mod common;

use common::SECOND;
use seedsplit::core::sample_rate_to_interval;
use seedsplit::split::assemble;
use seedsplit::types::Segment;
use seedsplit::{ChannelKey, SplitError};

fn piece(start: i64, values: std::ops::Range<i32>, block_size: usize) -> Segment {
    let mut segment = Segment::with_block_size(start * SECOND, 1.0, block_size).unwrap();
    segment.append(&values.collect::<Vec<_>>());
    segment
}

/// Pieces of `0..40` that pairwise touch or overlap, one a sub-range.
fn pieces(block_size: usize) -> Vec<Segment> {
    vec![
        piece(0, 0..20, block_size),
        piece(10, 10..25, block_size),
        piece(14, 14..18, block_size),
        piece(18, 18..40, block_size),
    ]
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut result = Vec::new();
    for perm in permutations(n - 1) {
        for pos in 0..=perm.len() {
            let mut p = perm.clone();
            p.insert(pos, n - 1);
            result.push(p);
        }
    }
    result
}

// ============================================================================
// Merging
// ============================================================================

#[test]
fn test_merge_order_independent() {
    let expected: Vec<i32> = (0..40).collect();
    let key = ChannelKey::new("IU", "ANMO", "00", "LHZ", 1.0);

    for order in permutations(4) {
        let mut all: Vec<Option<Segment>> = pieces(8).into_iter().map(Some).collect();
        let mut iter = order.iter().map(|&i| all[i].take().unwrap());
        let mut target = iter.next().unwrap();
        for segment in iter {
            segment.merge_into(&mut target).unwrap();
        }
        assert_eq!(target.samples(), expected, "order {order:?}");
        assert_eq!(target.start_time(), 0);
        assert_eq!(target.end_time(), 40 * SECOND);

        let shuffled: Vec<Segment> = {
            let mut all: Vec<Option<Segment>> = pieces(8).into_iter().map(Some).collect();
            order.iter().map(|&i| all[i].take().unwrap()).collect()
        };
        let (assembled, _) = assemble(&key, shuffled);
        assert_eq!(assembled.len(), 1);
        assert_eq!(assembled[0].digest(), target.digest());
    }
}

#[test]
fn test_gaps_never_merge() {
    let a = piece(0, 0..10, 4);
    let b = piece(12, 12..20, 4);
    let mut target = a;
    let rejection = b.merge_into(&mut target).unwrap_err();
    assert!(matches!(rejection.error, SplitError::MergeRange { .. }));
    assert_eq!(rejection.segment.samples(), (12..20).collect::<Vec<_>>());
    assert_eq!(target.len(), 10);

    // the reverse direction fails as well
    let mut target = rejection.segment;
    let rejection = piece(0, 0..10, 4).merge_into(&mut target).unwrap_err();
    assert!(matches!(rejection.error, SplitError::MergeRange { .. }));
}

#[test]
fn test_merge_reuses_blocks() {
    let mut target = piece(0, 0..8, 4);
    piece(8, 8..16, 4).merge_into(&mut target).unwrap();
    let stats = target.pool().stats();
    assert_eq!(stats.free_blocks, 2);

    target.append(&[16, 17, 18, 19, 20, 21, 22, 23]);
    assert_eq!(target.pool().stats().free_blocks, 0);
    assert_eq!(target.samples(), (0..24).collect::<Vec<_>>());
}

// ============================================================================
// Storage
// ============================================================================

#[test]
fn test_append_extract_round_trip() {
    for block_size in [1, 3, 7, 4096] {
        let mut segment = Segment::with_block_size(1_000 * SECOND, 20.0, block_size).unwrap();
        let samples: Vec<i32> = (0..1000).map(|i| i * 3 - 500).collect();
        for chunk in samples.chunks(37) {
            segment.append(chunk);
        }
        assert_eq!(segment.samples(), samples);
        assert_eq!(segment.end_time(), 1_050 * SECOND);

        let all = segment
            .extract_range(segment.start_time(), segment.last_sample_time())
            .unwrap();
        assert_eq!(all, samples);

        // samples 20..=39 lie within one second starting one second in
        let part = segment
            .extract_range(1_001 * SECOND, 1_001 * SECOND + 950_000)
            .unwrap();
        assert_eq!(part, samples[20..40].to_vec());
    }
}

#[test]
fn test_interval_monotonic() {
    let rates = [
        1.0e-7, 1.0e-5, 1.0e-3, 0.01, 0.1, 0.5, 1.0, 2.5, 20.0, 100.0, 1000.0, 1.0e5, 1.0e6,
    ];
    let intervals: Vec<i64> = rates
        .iter()
        .map(|&r| sample_rate_to_interval(r).unwrap())
        .collect();
    for pair in intervals.windows(2) {
        assert!(pair[0] > pair[1], "{intervals:?}");
    }
    assert_eq!(sample_rate_to_interval(1.0).unwrap(), SECOND);
    assert_eq!(sample_rate_to_interval(1.0e6).unwrap(), 1);
    assert!(sample_rate_to_interval(1.0e6 + 1.0).is_err());
    assert!(sample_rate_to_interval(3.0e-8).is_err());
}
