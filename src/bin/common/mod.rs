// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::io::IsTerminal as _;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use seedsplit::SplitterConfig;
use serde::Serialize;

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Format a duration in microseconds to human-readable string.
pub fn format_duration(micros: i64) -> String {
    let secs = micros / 1_000_000;
    let millis = (micros % 1_000_000) / 1_000;

    if secs >= 86_400 {
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3600;
        format!("{}d {}h", days, hours)
    } else if secs >= 3600 {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        format!("{}h {}m", hours, minutes)
    } else if secs >= 60 {
        let minutes = secs / 60;
        let remaining_secs = secs % 60;
        format!("{}m {}s", minutes, remaining_secs)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

/// Format a timestamp in microseconds since the epoch.
pub fn format_time(micros: i64) -> String {
    let datetime = chrono::DateTime::<chrono::Utc>::from_timestamp_micros(micros);

    match datetime {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
        None => format!("{} us", micros),
    }
}

/// Print `value` as JSON, or run `human_fn` for plain output.
pub fn output_json_or<T>(
    json: bool,
    value: &T,
    human_fn: impl FnOnce() -> std::io::Result<()>,
) -> Result<()>
where
    T: Serialize,
{
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human_fn()?;
    }
    Ok(())
}

/// Options shared by commands that run a split.
#[derive(Args, Clone, Debug)]
pub struct SplitOptions {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Accepted quality indicators, e.g. "D,Q" or "All" (case-sensitive)
    #[arg(long, value_name = "FLAGS")]
    pub quality: Option<String>,

    /// Keep only channels whose NET_STA_LOC_CHA name matches this regex
    #[arg(long, value_name = "REGEX")]
    pub include: Option<String>,

    /// Drop channels whose NET_STA_LOC_CHA name matches this regex
    #[arg(long, value_name = "REGEX")]
    pub exclude: Option<String>,
}

impl SplitOptions {
    /// Load the config file (if any) and apply command-line overrides.
    pub fn load(&self) -> Result<SplitterConfig> {
        let mut config = match &self.config {
            Some(path) => SplitterConfig::load(path)?,
            None => SplitterConfig::default(),
        };
        if let Some(quality) = &self.quality {
            config = config.with_quality_flags(quality.clone());
        }
        if let Some(include) = &self.include {
            config = config.with_include_channels(include.clone());
        }
        if let Some(exclude) = &self.exclude {
            config = config.with_exclude_channels(exclude.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

/// Spinner shown on terminals while a long step runs.
pub struct Spinner {
    inner: Option<indicatif::ProgressBar>,
}

impl Spinner {
    /// Start a spinner with a message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let inner = if std::io::stderr().is_terminal() {
            let pb = indicatif::ProgressBar::new_spinner();
            let style = indicatif::ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}");
            if let Ok(style) = style {
                pb.set_style(style);
            }
            pb.set_message(message);
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        } else {
            None
        };

        Self { inner }
    }

    /// Stop the spinner and clear it.
    pub fn finish(&self) {
        if let Some(pb) = &self.inner {
            pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(500_000), "500ms");
        assert_eq!(format_duration(1_500_000), "1.500s");
        assert_eq!(format_duration(90_000_000), "1m 30s");
        assert_eq!(format_duration(3_600_000_000), "1h 0m");
        assert_eq!(format_duration(90_000_000_000), "1d 1h");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "1970-01-01T00:00:00.000000Z");
        assert_eq!(format_time(1_500_000), "1970-01-01T00:00:01.500000Z");
    }

    #[test]
    fn test_split_options_override() {
        let options = SplitOptions {
            config: None,
            quality: Some("D".to_string()),
            include: Some("_LHZ$".to_string()),
            exclude: None,
        };
        let config = options.load().unwrap();
        assert_eq!(config.quality_flags, "D");
        assert_eq!(config.include_channels.as_deref(), Some("_LHZ$"));

        let bad = SplitOptions {
            quality: Some("??".to_string()),
            ..options
        };
        assert!(bad.load().is_err());
    }
}
