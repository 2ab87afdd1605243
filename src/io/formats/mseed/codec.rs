// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sample payload decoding.
//!
//! Compressed encodings (Steim 1/2 and friends) are out of scope for the
//! built-in decoder; callers plug their own implementation in through
//! [`SampleDecoder`].

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::constants::{ENCODING_INT16, ENCODING_INT32};
use super::header::{RecordHeader, WordOrder};
use crate::{Result, SplitError};

/// Turns a record payload into integer samples.
pub trait SampleDecoder: Send {
    /// Decode `header.num_samples` samples from `payload`.
    fn decode(&self, header: &RecordHeader, payload: &[u8]) -> Result<Vec<i32>>;
}

impl<F> SampleDecoder for F
where
    F: Fn(&RecordHeader, &[u8]) -> Result<Vec<i32>> + Send,
{
    fn decode(&self, header: &RecordHeader, payload: &[u8]) -> Result<Vec<i32>> {
        self(header, payload)
    }
}

/// Decoder for uncompressed 16- and 32-bit integer payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawIntegerDecoder;

impl SampleDecoder for RawIntegerDecoder {
    fn decode(&self, header: &RecordHeader, payload: &[u8]) -> Result<Vec<i32>> {
        let count = usize::from(header.num_samples);
        let width = match header.encoding {
            ENCODING_INT16 => 2,
            ENCODING_INT32 => 4,
            other => return Err(SplitError::unsupported_encoding(other)),
        };

        let needed = count * width;
        if payload.len() < needed {
            return Err(SplitError::decode(
                "RawIntegerDecoder",
                format!(
                    "{count} samples need {needed} bytes, payload has {}",
                    payload.len()
                ),
            ));
        }

        let mut samples = vec![0i32; count];
        let bytes = &payload[..needed];
        match (width, header.word_order) {
            (2, WordOrder::Big) => {
                for (dst, src) in samples.iter_mut().zip(bytes.chunks_exact(2)) {
                    *dst = i32::from(BigEndian::read_i16(src));
                }
            }
            (2, WordOrder::Little) => {
                for (dst, src) in samples.iter_mut().zip(bytes.chunks_exact(2)) {
                    *dst = i32::from(LittleEndian::read_i16(src));
                }
            }
            (_, WordOrder::Big) => BigEndian::read_i32_into(bytes, &mut samples),
            (_, WordOrder::Little) => LittleEndian::read_i32_into(bytes, &mut samples),
        }
        Ok(samples)
    }
}
