// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! miniSEED v2 fixed header and blockette decoding.
//!
//! # Record Structure
//!
//! ```text
//! 0   sequence number (6 ASCII digits)
//! 6   quality indicator
//! 8   station (5), location (2), channel (3), network (2)
//! 20  start time (BTIME, 10 bytes)
//! 30  number of samples (u16)
//! 32  sample rate factor (i16), multiplier (i16)
//! 36  activity, I/O and data quality flags
//! 39  number of blockettes
//! 40  time correction (i32, 0.0001 s)
//! 44  offset of data (u16)
//! 46  offset of first blockette (u16)
//! ```
//!
//! Blockettes form a singly linked chain starting at the first blockette
//! offset; each one begins with its type and the offset of the next one.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::Serialize;

use super::constants::*;
use crate::core::time::BTime;
use crate::{Result, SplitError};

/// Byte order of multi-byte header or payload fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WordOrder {
    Big,
    Little,
}

impl WordOrder {
    /// Word order code used in blockette 1000 (0 little, 1 big).
    pub fn from_code(code: u8) -> Self {
        if code == 0 {
            WordOrder::Little
        } else {
            WordOrder::Big
        }
    }

    pub fn code(self) -> u8 {
        match self {
            WordOrder::Big => 1,
            WordOrder::Little => 0,
        }
    }
}

/// Typed field access over a header buffer with a fixed byte order.
#[derive(Clone, Copy)]
struct Fields<'a> {
    buf: &'a [u8],
    order: WordOrder,
}

impl Fields<'_> {
    fn u16(&self, offset: usize) -> u16 {
        match self.order {
            WordOrder::Big => BigEndian::read_u16(&self.buf[offset..]),
            WordOrder::Little => LittleEndian::read_u16(&self.buf[offset..]),
        }
    }

    fn i16(&self, offset: usize) -> i16 {
        self.u16(offset) as i16
    }

    fn u32(&self, offset: usize) -> u32 {
        match self.order {
            WordOrder::Big => BigEndian::read_u32(&self.buf[offset..]),
            WordOrder::Little => LittleEndian::read_u32(&self.buf[offset..]),
        }
    }

    fn i32(&self, offset: usize) -> i32 {
        self.u32(offset) as i32
    }

    fn f32(&self, offset: usize) -> f32 {
        f32::from_bits(self.u32(offset))
    }

    fn btime(&self, offset: usize) -> BTime {
        BTime {
            year: self.u16(offset),
            day_of_year: self.u16(offset + 2),
            hour: self.buf[offset + 4],
            minute: self.buf[offset + 5],
            second: self.buf[offset + 6],
            fraction: self.u16(offset + 8),
        }
    }

    fn text(&self, offset: usize, len: usize) -> String {
        String::from_utf8_lossy(&self.buf[offset..offset + len])
            .trim()
            .to_string()
    }
}

/// Calibration marker carried by blockette 320 (pseudo-random calibration).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationMarker {
    /// Calibration start (microseconds since epoch)
    pub start_time: i64,
    /// Calibration flags
    pub flags: u8,
    /// Calibration duration in microseconds
    pub duration: i64,
    /// Peak-to-peak amplitude of steps
    pub peak_to_peak: f32,
    /// Channel carrying the calibration input signal
    pub input_channel: String,
    /// Reference amplitude
    pub reference_amplitude: u32,
    /// Coupling (e.g. `resistive`)
    pub coupling: String,
    /// Rolloff (e.g. `3dB@10Hz`)
    pub rolloff: String,
    /// Noise type (e.g. `Gaussian`)
    pub noise_type: String,
}

/// Decoded record header with the blockettes the splitter consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordHeader {
    pub sequence: u32,
    pub quality: u8,
    pub network: String,
    pub station: String,
    /// Location code as recorded (trimmed, not aliased)
    pub location: String,
    pub channel: String,
    pub start: BTime,
    /// Start time in microseconds since epoch
    pub start_time: i64,
    pub num_samples: u16,
    pub rate_factor: i16,
    pub rate_multiplier: i16,
    /// Nominal sample rate in Hz (0.0 when factor or multiplier is zero)
    pub sample_rate: f64,
    pub activity_flags: u8,
    pub io_flags: u8,
    pub data_quality_flags: u8,
    pub blockette_count: u8,
    pub time_correction: i32,
    pub data_offset: u16,
    pub first_blockette: u16,
    pub byte_order: WordOrder,
    /// Payload encoding from blockette 1000
    pub encoding: u8,
    /// Payload word order from blockette 1000
    pub word_order: WordOrder,
    /// Record length in bytes from blockette 1000
    pub record_length: usize,
    /// Timing quality (0-100) from blockette 1001
    pub timing_quality: Option<u8>,
    /// Calibration marker from blockette 320
    pub calibration: Option<CalibrationMarker>,
}

/// Whether a chunk is a heartbeat record.
///
/// Heartbeats carry `000000` as the sequence number and blanks through the
/// rest of the identification block.
pub fn is_heartbeat(buf: &[u8]) -> bool {
    buf.len() >= IDENT_END
        && &buf[SEQUENCE_OFFSET..SEQUENCE_OFFSET + SEQUENCE_LEN] == b"000000"
        && buf[QUALITY_OFFSET..IDENT_END].iter().all(|&b| b == b' ')
}

/// Compute the nominal sample rate from the header factor and multiplier.
pub fn sample_rate_from_factors(factor: i16, multiplier: i16) -> f64 {
    let f = f64::from(factor);
    let m = f64::from(multiplier);
    if factor == 0 || multiplier == 0 {
        0.0
    } else if factor > 0 && multiplier > 0 {
        f * m
    } else if factor > 0 {
        -f / m
    } else if multiplier > 0 {
        -m / f
    } else {
        1.0 / (f * m)
    }
}

/// Determine the record length from the first framing chunk.
///
/// Validates the identification block, detects the header byte order and
/// walks the blockette chain to blockette 1000.
pub fn crack_record_length(buf: &[u8]) -> Result<usize> {
    const CONTEXT: &str = "crack_record_length";

    if buf.len() < FIXED_HEADER_SIZE {
        return Err(SplitError::framing(
            CONTEXT,
            format!("chunk of {} bytes is shorter than the fixed header", buf.len()),
        ));
    }
    validate_identifiers(buf).map_err(|m| SplitError::framing(CONTEXT, m))?;
    let order = detect_word_order(buf).map_err(|m| SplitError::framing(CONTEXT, m))?;
    let fields = Fields { buf, order };

    let mut found = None;
    walk_blockettes(fields, |kind, offset| {
        if kind == BLOCKETTE_1000 && offset + BLOCKETTE_1000_LEN <= buf.len() {
            found = Some(buf[offset + 6]);
        }
    })
    .map_err(|m| SplitError::framing(CONTEXT, m))?;

    let exponent =
        found.ok_or_else(|| SplitError::framing(CONTEXT, "missing blockette 1000"))?;
    record_length_from_exponent(exponent).map_err(|m| SplitError::framing(CONTEXT, m))
}

impl RecordHeader {
    /// Decode the header of a complete record.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        const CONTEXT: &str = "RecordHeader::parse";

        if buf.len() < FIXED_HEADER_SIZE {
            return Err(SplitError::decode(
                CONTEXT,
                format!("record of {} bytes is shorter than the fixed header", buf.len()),
            ));
        }
        validate_identifiers(buf).map_err(|m| SplitError::decode(CONTEXT, m))?;
        let order = detect_word_order(buf).map_err(|m| SplitError::decode(CONTEXT, m))?;
        let fields = Fields { buf, order };

        let sequence = parse_sequence(buf).map_err(|m| SplitError::decode(CONTEXT, m))?;
        let start = fields.btime(START_TIME_OFFSET);
        let start_time = start.to_micros()?;
        let rate_factor = fields.i16(RATE_FACTOR_OFFSET);
        let rate_multiplier = fields.i16(RATE_MULTIPLIER_OFFSET);

        let mut b1000 = None;
        let mut timing_quality = None;
        let mut calibration_offset = None;
        walk_blockettes(fields, |kind, offset| match kind {
            BLOCKETTE_1000 if offset + BLOCKETTE_1000_LEN <= buf.len() => {
                b1000 = Some((buf[offset + 4], buf[offset + 5], buf[offset + 6]));
            }
            BLOCKETTE_1001 if offset + BLOCKETTE_1001_LEN <= buf.len() => {
                timing_quality = Some(buf[offset + 4]);
            }
            BLOCKETTE_320 if offset + BLOCKETTE_320_LEN <= buf.len() => {
                calibration_offset = Some(offset);
            }
            _ => {}
        })
        .map_err(|m| SplitError::decode(CONTEXT, m))?;

        let (encoding, word_order, exponent) =
            b1000.ok_or_else(|| SplitError::decode(CONTEXT, "missing blockette 1000"))?;
        let record_length =
            record_length_from_exponent(exponent).map_err(|m| SplitError::decode(CONTEXT, m))?;
        if buf.len() < record_length {
            return Err(SplitError::decode(
                CONTEXT,
                format!(
                    "record truncated: {} of {record_length} bytes",
                    buf.len()
                ),
            ));
        }

        let data_offset = fields.u16(DATA_OFFSET_OFFSET);
        if data_offset != 0
            && (usize::from(data_offset) < FIXED_HEADER_SIZE
                || usize::from(data_offset) > record_length)
        {
            return Err(SplitError::decode(
                CONTEXT,
                format!("data offset {data_offset} outside record of {record_length} bytes"),
            ));
        }

        let calibration = match calibration_offset {
            Some(offset) => Some(parse_calibration(fields, offset)?),
            None => None,
        };

        Ok(Self {
            sequence,
            quality: buf[QUALITY_OFFSET],
            network: fields.text(NETWORK_OFFSET, NETWORK_LEN),
            station: fields.text(STATION_OFFSET, STATION_LEN),
            location: fields.text(LOCATION_OFFSET, LOCATION_LEN),
            channel: fields.text(CHANNEL_OFFSET, CHANNEL_LEN),
            start,
            start_time,
            num_samples: fields.u16(NUM_SAMPLES_OFFSET),
            rate_factor,
            rate_multiplier,
            sample_rate: sample_rate_from_factors(rate_factor, rate_multiplier),
            activity_flags: buf[ACTIVITY_FLAGS_OFFSET],
            io_flags: buf[IO_FLAGS_OFFSET],
            data_quality_flags: buf[QUALITY_FLAGS_OFFSET],
            blockette_count: buf[BLOCKETTE_COUNT_OFFSET],
            time_correction: fields.i32(TIME_CORRECTION_OFFSET),
            data_offset,
            first_blockette: fields.u16(FIRST_BLOCKETTE_OFFSET),
            byte_order: order,
            encoding,
            word_order: WordOrder::from_code(word_order),
            record_length,
            timing_quality,
            calibration,
        })
    }

    /// Payload bytes of a record this header was parsed from.
    pub fn payload<'a>(&self, record: &'a [u8]) -> Result<&'a [u8]> {
        let start = usize::from(self.data_offset);
        let end = self.record_length.min(record.len());
        if self.num_samples == 0 || start == 0 {
            return Ok(&[]);
        }
        if start > end {
            return Err(SplitError::decode(
                "RecordHeader::payload",
                format!("data offset {start} beyond record end {end}"),
            ));
        }
        Ok(&record[start..end])
    }

    pub fn is_heartbeat(&self) -> bool {
        self.sequence == 0
            && self.quality == b' '
            && self.station.is_empty()
            && self.location.is_empty()
            && self.channel.is_empty()
            && self.network.is_empty()
    }
}

fn parse_sequence(buf: &[u8]) -> std::result::Result<u32, String> {
    let digits = &buf[SEQUENCE_OFFSET..SEQUENCE_OFFSET + SEQUENCE_LEN];
    let mut value = 0u32;
    for &b in digits {
        match b {
            b'0'..=b'9' => value = value * 10 + u32::from(b - b'0'),
            // some writers leave the field blank
            b' ' => {}
            _ => {
                return Err(format!(
                    "invalid sequence number '{}'",
                    String::from_utf8_lossy(digits)
                ))
            }
        }
    }
    Ok(value)
}

fn validate_identifiers(buf: &[u8]) -> std::result::Result<(), String> {
    parse_sequence(buf)?;
    let ident = &buf[STATION_OFFSET..IDENT_END];
    if let Some(&bad) = ident
        .iter()
        .find(|&&b| !(b.is_ascii_alphanumeric() || b == b' ' || b == b'-'))
    {
        return Err(format!(
            "illegal character 0x{bad:02x} in identifiers '{}'",
            String::from_utf8_lossy(ident)
        ));
    }
    Ok(())
}

fn plausible_start(fields: Fields<'_>) -> bool {
    let year = fields.u16(START_TIME_OFFSET);
    let day = fields.u16(START_TIME_OFFSET + 2);
    (1900..=2100).contains(&year) && (1..=366).contains(&day)
}

/// Detect header byte order from the start-time year and day of year.
fn detect_word_order(buf: &[u8]) -> std::result::Result<WordOrder, String> {
    for order in [WordOrder::Big, WordOrder::Little] {
        if plausible_start(Fields { buf, order }) {
            return Ok(order);
        }
    }
    Err(format!(
        "implausible start time bytes {:02x?}",
        &buf[START_TIME_OFFSET..START_TIME_OFFSET + 4]
    ))
}

/// Visit each blockette in the chain as `(type, offset)`.
fn walk_blockettes<F>(fields: Fields<'_>, mut visit: F) -> std::result::Result<(), String>
where
    F: FnMut(u16, usize),
{
    let mut offset = usize::from(fields.u16(FIRST_BLOCKETTE_OFFSET));
    let mut previous = 0usize;
    while offset != 0 {
        if offset < FIXED_HEADER_SIZE || offset <= previous {
            return Err(format!("blockette chain loops or overlaps at offset {offset}"));
        }
        if offset + 4 > fields.buf.len() {
            // chain continues beyond the visible buffer
            break;
        }
        let kind = fields.u16(offset);
        let next = usize::from(fields.u16(offset + 2));
        visit(kind, offset);
        previous = offset;
        offset = next;
    }
    Ok(())
}

fn record_length_from_exponent(exponent: u8) -> std::result::Result<usize, String> {
    let length = 1usize.checked_shl(u32::from(exponent)).unwrap_or(0);
    if !(MIN_RECORD_SIZE..=MAX_RECORD_SIZE).contains(&length) {
        return Err(format!(
            "record length 2^{exponent} outside {MIN_RECORD_SIZE}..={MAX_RECORD_SIZE}"
        ));
    }
    Ok(length)
}

fn parse_calibration(fields: Fields<'_>, offset: usize) -> Result<CalibrationMarker> {
    Ok(CalibrationMarker {
        start_time: fields.btime(offset + 4).to_micros()?,
        flags: fields.buf[offset + 15],
        duration: i64::from(fields.u32(offset + 16)) * 100,
        peak_to_peak: fields.f32(offset + 20),
        input_channel: fields.text(offset + 24, 3),
        reference_amplitude: fields.u32(offset + 28),
        coupling: fields.text(offset + 32, 12),
        rolloff: fields.text(offset + 44, 12),
        noise_type: fields.text(offset + 56, 8),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::formats::mseed::builder::RecordBuilder;

    fn builder() -> RecordBuilder {
        RecordBuilder::new("IU", "ANMO", "00", "LHZ")
            .with_sample_rate(1.0)
            .with_start_time(1_700_000_000_000_000)
            .with_sequence(42)
    }

    #[test]
    fn test_sample_rate_from_factors() {
        assert_eq!(sample_rate_from_factors(20, 1), 20.0);
        assert_eq!(sample_rate_from_factors(1, -10), 0.1);
        assert_eq!(sample_rate_from_factors(-10, 1), 0.1);
        assert_eq!(sample_rate_from_factors(-10, -10), 0.01);
        assert_eq!(sample_rate_from_factors(0, 1), 0.0);
    }

    #[test]
    fn test_parse_built_record() {
        let record = builder().build(&[1, 2, 3]).unwrap();
        let header = RecordHeader::parse(&record).unwrap();

        assert_eq!(header.sequence, 42);
        assert_eq!(header.quality, b'D');
        assert_eq!(header.network, "IU");
        assert_eq!(header.station, "ANMO");
        assert_eq!(header.location, "00");
        assert_eq!(header.channel, "LHZ");
        assert_eq!(header.start_time, 1_700_000_000_000_000);
        assert_eq!(header.num_samples, 3);
        assert_eq!(header.sample_rate, 1.0);
        assert_eq!(header.byte_order, WordOrder::Big);
        assert_eq!(header.encoding, ENCODING_INT32);
        assert_eq!(header.record_length, 512);
        assert_eq!(header.timing_quality, None);
        assert!(header.calibration.is_none());
        assert_eq!(header.payload(&record).unwrap().len(), 512 - 64);
    }

    #[test]
    fn test_crack_record_length() {
        let record = builder().with_record_length(4096).build(&[0; 10]).unwrap();
        assert_eq!(crack_record_length(&record[..FRAME_SIZE]).unwrap(), 4096);
    }

    #[test]
    fn test_crack_rejects_bad_identifiers() {
        let mut record = builder().build(&[0]).unwrap();
        record[8] = 0x07;
        assert!(matches!(
            crack_record_length(&record[..FRAME_SIZE]),
            Err(SplitError::Framing { .. })
        ));
    }

    #[test]
    fn test_crack_rejects_missing_blockette_1000() {
        let mut record = builder().build(&[0]).unwrap();
        record[FIRST_BLOCKETTE_OFFSET] = 0;
        record[FIRST_BLOCKETTE_OFFSET + 1] = 0;
        let err = crack_record_length(&record[..FRAME_SIZE]).unwrap_err();
        assert!(err.to_string().contains("missing blockette 1000"));
    }

    #[test]
    fn test_crack_rejects_bad_length() {
        let mut record = builder().build(&[0]).unwrap();
        // blockette 1000 sits at offset 48; exponent at +6
        record[48 + 6] = 7;
        assert!(crack_record_length(&record[..FRAME_SIZE]).is_err());
        record[48 + 6] = 15;
        assert!(crack_record_length(&record[..FRAME_SIZE]).is_err());
    }

    #[test]
    fn test_blockette_loop_rejected() {
        let mut record = builder().build(&[0]).unwrap();
        // point blockette 1000's next link back at itself
        record[48 + 2] = 0;
        record[48 + 3] = 48;
        assert!(RecordHeader::parse(&record).is_err());
    }

    #[test]
    fn test_little_endian_header() {
        let mut record = builder().build(&[0]).unwrap();
        // swap every multi-byte header field to little-endian
        let fields = [
            (20, 2),
            (22, 2),
            (28, 2),
            (30, 2),
            (32, 2),
            (34, 2),
            (40, 4),
            (44, 2),
            (46, 2),
            (48, 2),
            (50, 2),
        ];
        for (offset, len) in fields {
            record[offset..offset + len].reverse();
        }
        let header = RecordHeader::parse(&record).unwrap();
        assert_eq!(header.byte_order, WordOrder::Little);
        assert_eq!(header.start_time, 1_700_000_000_000_000);
        assert_eq!(header.sample_rate, 1.0);
        assert_eq!(header.record_length, 512);
    }

    #[test]
    fn test_timing_quality_and_calibration() {
        let marker = CalibrationMarker {
            start_time: 1_700_000_000_000_000,
            flags: 0x10,
            duration: 600_000_000,
            peak_to_peak: 2.5,
            input_channel: "BC0".to_string(),
            reference_amplitude: 7,
            coupling: "resistive".to_string(),
            rolloff: "3dB@10Hz".to_string(),
            noise_type: "Gaussian".to_string(),
        };
        let record = builder()
            .with_timing_quality(85)
            .with_calibration(marker.clone())
            .build(&[5, 6])
            .unwrap();
        let header = RecordHeader::parse(&record).unwrap();
        assert_eq!(header.timing_quality, Some(85));
        assert_eq!(header.calibration, Some(marker));
        assert_eq!(header.data_offset, 128);
    }

    #[test]
    fn test_heartbeat_signature() {
        let mut chunk = vec![b' '; FRAME_SIZE];
        chunk[..6].copy_from_slice(b"000000");
        assert!(is_heartbeat(&chunk));

        chunk[6] = b'D';
        assert!(!is_heartbeat(&chunk));
        assert!(!is_heartbeat(b"000000"));
    }
}
