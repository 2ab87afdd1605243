// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Splitter configuration.
//!
//! All lookup tables the splitter consults (quality allow-list, location
//! aliases, channel selection) are carried here and passed into the
//! components that need them. Configuration can be built in code or loaded
//! from TOML:
//!
//! ```toml
//! quality_flags = "D,Q"
//! queue_capacity = 256
//! include_channels = "^IU_ANMO_"
//!
//! [location_aliases]
//! "" = "00"
//! "--" = "00"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::LocationAliases;
use crate::io::filter::{ChannelFilter, QualityFilter, DEFAULT_QUALITY_FLAGS};
use crate::types::{DEFAULT_BLOCK_SIZE, DEFAULT_JITTER_DIVISOR};
use crate::SplitError;

/// Default bound of the record queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Errors raised while loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid channel pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for SplitError {
    fn from(err: ConfigError) -> Self {
        SplitError::config(err.to_string())
    }
}

/// Settings for a split run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Comma-separated quality indicators to accept, or `All`
    pub quality_flags: String,
    /// Bound of the record queue between framers and the processor
    pub queue_capacity: usize,
    /// Samples per storage block
    pub block_size: usize,
    /// Keep only channels whose `NET_STA_LOC_CHA` name matches
    pub include_channels: Option<String>,
    /// Drop channels whose `NET_STA_LOC_CHA` name matches
    pub exclude_channels: Option<String>,
    /// Jitter tolerance is `interval / jitter_divisor`
    pub jitter_divisor: i64,
    /// Location code aliases applied to every record
    pub location_aliases: LocationAliases,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            quality_flags: DEFAULT_QUALITY_FLAGS.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            block_size: DEFAULT_BLOCK_SIZE,
            include_channels: None,
            exclude_channels: None,
            jitter_divisor: DEFAULT_JITTER_DIVISOR,
            location_aliases: LocationAliases::default(),
        }
    }
}

impl SplitterConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SplitterConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn with_quality_flags(mut self, flags: impl Into<String>) -> Self {
        self.quality_flags = flags.into();
        self
    }

    pub fn with_location_aliases(mut self, aliases: LocationAliases) -> Self {
        self.location_aliases = aliases;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_include_channels(mut self, pattern: impl Into<String>) -> Self {
        self.include_channels = Some(pattern.into());
        self
    }

    pub fn with_exclude_channels(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_channels = Some(pattern.into());
        self
    }

    pub fn with_jitter_divisor(mut self, divisor: i64) -> Self {
        self.jitter_divisor = divisor;
        self
    }

    /// Check every setting, compiling filters along the way.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.block_size == 0 {
            return Err(ConfigError::Invalid(
                "block_size must be greater than zero".to_string(),
            ));
        }
        if self.jitter_divisor <= 0 {
            return Err(ConfigError::Invalid(
                "jitter_divisor must be positive".to_string(),
            ));
        }
        self.quality_filter()?;
        self.channel_filter()?;
        Ok(())
    }

    /// Compile the quality allow-list.
    pub fn quality_filter(&self) -> Result<QualityFilter, ConfigError> {
        self.quality_flags
            .parse()
            .map_err(|e: SplitError| ConfigError::Invalid(e.to_string()))
    }

    /// Compile the channel selection.
    pub fn channel_filter(&self) -> Result<ChannelFilter, ConfigError> {
        match (&self.include_channels, &self.exclude_channels) {
            (None, None) => Ok(ChannelFilter::All),
            (Some(include), None) => Ok(ChannelFilter::regex_include(include)?),
            (None, Some(exclude)) => Ok(ChannelFilter::regex_exclude(exclude)?),
            (Some(include), Some(exclude)) => {
                let include = regex::Regex::new(include)?;
                let exclude = regex::Regex::new(exclude)?;
                Ok(ChannelFilter::custom(move |name| {
                    include.is_match(name) && !exclude.is_match(name)
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SplitterConfig::default();
        assert_eq!(config.quality_flags, "D,R,Q,M");
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.block_size, 4096);
        assert_eq!(config.jitter_divisor, 10);
        assert!(config.validate().is_ok());
        assert!(config.channel_filter().unwrap().is_all());
    }

    #[test]
    fn test_from_toml() {
        let text = r#"
            quality_flags = "D,Q"
            queue_capacity = 16
            include_channels = "_LHZ$"

            [location_aliases]
            "" = "00"
            "XX" = "99"
        "#;
        let config = SplitterConfig::from_toml_str(text).unwrap();
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.block_size, 4096);
        assert_eq!(config.location_aliases.normalize("XX"), "99");
        assert_eq!(config.location_aliases.normalize("--"), "--");

        let quality = config.quality_filter().unwrap();
        assert!(quality.accepts(b'Q'));
        assert!(!quality.accepts(b'M'));

        let channels = config.channel_filter().unwrap();
        assert!(channels.should_include("IU_ANMO_00_LHZ"));
        assert!(!channels.should_include("IU_ANMO_00_BHZ"));
    }

    #[test]
    fn test_include_and_exclude() {
        let config = SplitterConfig::default()
            .with_include_channels("^IU_")
            .with_exclude_channels("_BH.$");
        let filter = config.channel_filter().unwrap();
        assert!(filter.should_include("IU_ANMO_00_LHZ"));
        assert!(!filter.should_include("IU_ANMO_00_BHZ"));
        assert!(!filter.should_include("CU_ANWB_00_LHZ"));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            SplitterConfig::from_toml_str("queue_capacity = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SplitterConfig::from_toml_str("include_channels = \"(\""),
            Err(ConfigError::Pattern(_))
        ));
        assert!(matches!(
            SplitterConfig::from_toml_str("quality_flags = \"DQ\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SplitterConfig::from_toml_str("queue_capacity = \"many\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(SplitterConfig::default().with_jitter_divisor(0).validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = SplitterConfig::load("/nonexistent/seedsplit.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        let split: SplitError = err.into();
        assert!(matches!(split, SplitError::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SplitterConfig::default().with_quality_flags("All");
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(SplitterConfig::from_toml_str(&text).unwrap(), config);
    }
}
