// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Writer for well-formed uncompressed records.
//!
//! Produces big-endian INT32 records carrying blockette 1000 and, when
//! configured, blockettes 1001 and 320. Used to synthesize input for
//! tooling and tests.

use byteorder::{BigEndian, ByteOrder};

use super::constants::*;
use super::header::CalibrationMarker;
use crate::core::time::BTime;
use crate::{Result, SplitError};

/// Builder for a single record.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    network: String,
    station: String,
    location: String,
    channel: String,
    quality: u8,
    sequence: u32,
    start_time: i64,
    sample_rate: f64,
    record_length: usize,
    timing_quality: Option<u8>,
    calibration: Option<CalibrationMarker>,
}

impl RecordBuilder {
    /// Start a record for the given channel identifiers.
    ///
    /// Defaults: quality `D`, sequence 1, start at the epoch, 1 Hz,
    /// 512-byte records.
    pub fn new(network: &str, station: &str, location: &str, channel: &str) -> Self {
        Self {
            network: network.to_string(),
            station: station.to_string(),
            location: location.to_string(),
            channel: channel.to_string(),
            quality: b'D',
            sequence: 1,
            start_time: 0,
            sample_rate: 1.0,
            record_length: 512,
            timing_quality: None,
            calibration: None,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Start time in microseconds since the epoch (100 us resolution).
    pub fn with_start_time(mut self, start_time: i64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_record_length(mut self, record_length: usize) -> Self {
        self.record_length = record_length;
        self
    }

    pub fn with_timing_quality(mut self, quality: u8) -> Self {
        self.timing_quality = Some(quality);
        self
    }

    pub fn with_calibration(mut self, marker: CalibrationMarker) -> Self {
        self.calibration = Some(marker);
        self
    }

    fn data_offset(&self) -> usize {
        if self.calibration.is_some() {
            128
        } else {
            64
        }
    }

    /// Number of INT32 samples that fit in one record.
    pub fn max_samples(&self) -> usize {
        self.record_length.saturating_sub(self.data_offset()) / 4
    }

    /// Encode one record holding `samples`.
    pub fn build(&self, samples: &[i32]) -> Result<Vec<u8>> {
        const CONTEXT: &str = "RecordBuilder::build";

        if !self.record_length.is_power_of_two()
            || !(MIN_RECORD_SIZE..=MAX_RECORD_SIZE).contains(&self.record_length)
        {
            return Err(SplitError::config(format!(
                "record length {} is not a power of two in {MIN_RECORD_SIZE}..={MAX_RECORD_SIZE}",
                self.record_length
            )));
        }
        if samples.len() > self.max_samples() {
            return Err(SplitError::decode(
                CONTEXT,
                format!(
                    "{} samples exceed record capacity of {}",
                    samples.len(),
                    self.max_samples()
                ),
            ));
        }

        let (factor, multiplier) = rate_to_factors(self.sample_rate)?;
        let start = BTime::from_micros(self.start_time)?;
        let data_offset = self.data_offset();
        let mut buf = vec![0u8; self.record_length];

        let sequence = format!("{:06}", self.sequence % 1_000_000);
        buf[SEQUENCE_OFFSET..SEQUENCE_OFFSET + SEQUENCE_LEN].copy_from_slice(sequence.as_bytes());
        buf[QUALITY_OFFSET] = self.quality;
        buf[QUALITY_OFFSET + 1] = b' ';
        put_text(&mut buf, STATION_OFFSET, STATION_LEN, &self.station);
        put_text(&mut buf, LOCATION_OFFSET, LOCATION_LEN, &self.location);
        put_text(&mut buf, CHANNEL_OFFSET, CHANNEL_LEN, &self.channel);
        put_text(&mut buf, NETWORK_OFFSET, NETWORK_LEN, &self.network);
        put_btime(&mut buf, START_TIME_OFFSET, &start);
        BigEndian::write_u16(&mut buf[NUM_SAMPLES_OFFSET..], samples.len() as u16);
        BigEndian::write_i16(&mut buf[RATE_FACTOR_OFFSET..], factor);
        BigEndian::write_i16(&mut buf[RATE_MULTIPLIER_OFFSET..], multiplier);

        let blockettes = 1 + u8::from(self.timing_quality.is_some())
            + u8::from(self.calibration.is_some());
        buf[BLOCKETTE_COUNT_OFFSET] = blockettes;
        BigEndian::write_u16(&mut buf[DATA_OFFSET_OFFSET..], data_offset as u16);
        BigEndian::write_u16(&mut buf[FIRST_BLOCKETTE_OFFSET..], FIXED_HEADER_SIZE as u16);

        // blockette 1000
        let mut offset = FIXED_HEADER_SIZE;
        let mut next = offset + BLOCKETTE_1000_LEN;
        let has_more = self.timing_quality.is_some() || self.calibration.is_some();
        BigEndian::write_u16(&mut buf[offset..], BLOCKETTE_1000);
        BigEndian::write_u16(&mut buf[offset + 2..], if has_more { next as u16 } else { 0 });
        buf[offset + 4] = ENCODING_INT32;
        buf[offset + 5] = 1;
        buf[offset + 6] = self.record_length.trailing_zeros() as u8;
        offset = next;

        if let Some(quality) = self.timing_quality {
            next = offset + BLOCKETTE_1001_LEN;
            let link = if self.calibration.is_some() { next as u16 } else { 0 };
            BigEndian::write_u16(&mut buf[offset..], BLOCKETTE_1001);
            BigEndian::write_u16(&mut buf[offset + 2..], link);
            buf[offset + 4] = quality;
            offset = next;
        }

        if let Some(marker) = &self.calibration {
            BigEndian::write_u16(&mut buf[offset..], BLOCKETTE_320);
            BigEndian::write_u16(&mut buf[offset + 2..], 0);
            put_btime(&mut buf, offset + 4, &BTime::from_micros(marker.start_time)?);
            buf[offset + 15] = marker.flags;
            let ticks = u32::try_from(marker.duration / 100).map_err(|_| {
                SplitError::decode(
                    CONTEXT,
                    format!("calibration duration {} out of range", marker.duration),
                )
            })?;
            BigEndian::write_u32(&mut buf[offset + 16..], ticks);
            BigEndian::write_f32(&mut buf[offset + 20..], marker.peak_to_peak);
            put_text(&mut buf, offset + 24, 3, &marker.input_channel);
            BigEndian::write_u32(&mut buf[offset + 28..], marker.reference_amplitude);
            put_text(&mut buf, offset + 32, 12, &marker.coupling);
            put_text(&mut buf, offset + 44, 12, &marker.rolloff);
            put_text(&mut buf, offset + 56, 8, &marker.noise_type);
        }

        let end = data_offset + samples.len() * 4;
        BigEndian::write_i32_into(samples, &mut buf[data_offset..end]);
        Ok(buf)
    }
}

/// Space-padded, truncated ASCII field.
fn put_text(buf: &mut [u8], offset: usize, len: usize, value: &str) {
    let field = &mut buf[offset..offset + len];
    field.fill(b' ');
    for (dst, src) in field.iter_mut().zip(value.bytes()) {
        *dst = src;
    }
}

fn put_btime(buf: &mut [u8], offset: usize, time: &BTime) {
    BigEndian::write_u16(&mut buf[offset..], time.year);
    BigEndian::write_u16(&mut buf[offset + 2..], time.day_of_year);
    buf[offset + 4] = time.hour;
    buf[offset + 5] = time.minute;
    buf[offset + 6] = time.second;
    buf[offset + 7] = 0;
    BigEndian::write_u16(&mut buf[offset + 8..], time.fraction);
}

/// Express a sample rate as a header factor and multiplier.
pub fn rate_to_factors(rate: f64) -> Result<(i16, i16)> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(SplitError::sample_rate(rate, "rate must be positive"));
    }
    let max = f64::from(i16::MAX);

    if rate.fract() == 0.0 && rate <= max {
        return Ok((rate as i16, 1));
    }
    let period = 1.0 / rate;
    if rate < 1.0 && (period - period.round()).abs() < 1e-9 && period.round() <= max {
        return Ok((-(period.round() as i16), 1));
    }
    // factor / multiplier with the largest multiplier that keeps factor in range
    let mut multiplier = 10_000.0;
    while multiplier >= 1.0 {
        let factor = (rate * multiplier).round();
        if factor >= 1.0 && factor <= max {
            return Ok((factor as i16, -(multiplier as i16)));
        }
        multiplier /= 10.0;
    }
    Err(SplitError::sample_rate(
        rate,
        "rate cannot be expressed as a header factor and multiplier",
    ))
}
