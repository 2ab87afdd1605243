// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Time handling: record start times, sample intervals and display.
//!
//! All times are microseconds since the Unix epoch (UTC). Sample spacing is
//! an integer number of microseconds derived from the nominal sample rate.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::Serialize;

use crate::{Result, SplitError};

/// Fastest supported rate: one sample per microsecond.
pub const MAX_SAMPLE_RATE: f64 = 1_000_000.0;

/// Slowest supported rate: roughly one sample per year.
pub const MIN_SAMPLE_RATE: f64 = 3.17096999999e-8;

const MICROS_PER_SECOND: i64 = 1_000_000;

/// Convert a nominal sample rate (Hz) into a sample interval in microseconds.
///
/// Rates of at least 1 Hz truncate `1e6 / rate`. Slower rates round the
/// truncated interval half-up to a precision that scales with the rate's
/// order of magnitude, so that e.g. one sample per year maps onto exactly
/// 365 days instead of an arbitrary float artifact.
///
/// # Errors
///
/// Returns [`SplitError::SampleRate`] for rates faster than one sample per
/// microsecond, slower than one sample per year, or not finite.
pub fn sample_rate_to_interval(rate: f64) -> Result<i64> {
    if !rate.is_finite() || rate > MAX_SAMPLE_RATE {
        return Err(SplitError::sample_rate(
            rate,
            "sample rate has exceeded 1 sample per microsecond",
        ));
    }
    if rate < MIN_SAMPLE_RATE {
        return Err(SplitError::sample_rate(
            rate,
            "sample rate must be greater than 1 sample per year",
        ));
    }

    let interval = (MICROS_PER_SECOND as f64 / rate) as i64;
    if rate >= 1.0 {
        return Ok(interval);
    }

    // log10 truncates toward zero, matching the decimal scale of the rate
    let scale = rate.log10() as i32 - 2;
    let step = 10i64.pow(scale.unsigned_abs());
    Ok((interval + step / 2) / step * step)
}

/// Binary start time as carried in record headers and blockette 320.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BTime {
    pub year: u16,
    pub day_of_year: u16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Ten-thousandths of a second (0..=9999)
    pub fraction: u16,
}

impl BTime {
    /// Convert to microseconds since the epoch.
    ///
    /// A leap second (`second == 60`) is folded into the following second.
    pub fn to_micros(&self) -> Result<i64> {
        let date = NaiveDate::from_yo_opt(i32::from(self.year), u32::from(self.day_of_year))
            .ok_or_else(|| {
                SplitError::decode(
                    "BTime",
                    format!("invalid date {}-{:03}", self.year, self.day_of_year),
                )
            })?;
        if self.second > 60 || self.fraction > 9999 {
            return Err(SplitError::decode(
                "BTime",
                format!(
                    "invalid time {:02}:{:02}:{:02}.{:04}",
                    self.hour, self.minute, self.second, self.fraction
                ),
            ));
        }
        let leap = i64::from(self.second == 60);
        let datetime = date
            .and_hms_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second.min(59)),
            )
            .ok_or_else(|| {
                SplitError::decode(
                    "BTime",
                    format!("invalid time {:02}:{:02}", self.hour, self.minute),
                )
            })?;

        Ok(datetime.and_utc().timestamp() * MICROS_PER_SECOND
            + leap * MICROS_PER_SECOND
            + i64::from(self.fraction) * 100)
    }

    /// Build a BTime from microseconds since the epoch.
    ///
    /// Sub-100us precision is truncated.
    pub fn from_micros(micros: i64) -> Result<Self> {
        let secs = micros.div_euclid(MICROS_PER_SECOND);
        let sub = micros.rem_euclid(MICROS_PER_SECOND);
        let datetime = DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
            SplitError::decode("BTime", format!("timestamp {micros} out of range"))
        })?;
        let year = u16::try_from(datetime.year()).map_err(|_| {
            SplitError::decode("BTime", format!("year {} out of range", datetime.year()))
        })?;

        Ok(Self {
            year,
            day_of_year: datetime.ordinal() as u16,
            hour: datetime.hour() as u8,
            minute: datetime.minute() as u8,
            second: datetime.second() as u8,
            fraction: (sub / 100) as u16,
        })
    }
}

/// Format a microsecond timestamp as `YYYY/MM/DD HH:MM:SS.ffffff`.
pub fn format_timestamp(micros: i64) -> String {
    let secs = micros.div_euclid(MICROS_PER_SECOND);
    let nanos = (micros.rem_euclid(MICROS_PER_SECOND) * 1000) as u32;
    match DateTime::<Utc>::from_timestamp(secs, nanos) {
        Some(dt) => dt.format("%Y/%m/%d %H:%M:%S%.6f").to_string(),
        None => format!("{micros} us"),
    }
}
