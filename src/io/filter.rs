// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record filtering by quality indicator and by channel.
//!
//! [`QualityFilter`] is applied by the framer to the quality byte of every
//! chunk before a record is assembled. [`ChannelFilter`] is applied by the
//! processor to the `NET_STA_LOC_CHA` name of every decoded record.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::SplitError;
use crate::io::formats::mseed::constants::QUALITY_CODES;

/// Quality indicators accepted when no allow-list is configured.
pub const DEFAULT_QUALITY_FLAGS: &str = "D,R,Q,M";

/// Allow-list of record quality indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityFilter {
    /// Accept every quality indicator
    All,
    /// Accept only the listed indicators
    Include(Vec<u8>),
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self::Include(QUALITY_CODES.to_vec())
    }
}

impl QualityFilter {
    /// Check whether a quality byte passes the filter.
    pub fn accepts(&self, quality: u8) -> bool {
        match self {
            QualityFilter::All => true,
            QualityFilter::Include(flags) => flags.contains(&quality),
        }
    }
}

impl FromStr for QualityFilter {
    type Err = SplitError;

    /// Parse a comma-separated list such as `D,Q`, or the literal `All`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "All" {
            return Ok(QualityFilter::All);
        }

        let mut flags = Vec::new();
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let bytes = token.as_bytes();
            if bytes.len() != 1 || !bytes[0].is_ascii_alphabetic() {
                return Err(SplitError::config(format!(
                    "invalid quality flag '{token}' in '{s}'"
                )));
            }
            let flag = bytes[0];
            if !flags.contains(&flag) {
                flags.push(flag);
            }
        }

        if flags.is_empty() {
            return Err(SplitError::config("quality flag list is empty"));
        }
        Ok(QualityFilter::Include(flags))
    }
}

impl fmt::Display for QualityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityFilter::All => write!(f, "All"),
            QualityFilter::Include(flags) => {
                let parts: Vec<String> = flags.iter().map(|&b| (b as char).to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

/// Filter for selecting channels by their `NET_STA_LOC_CHA` name.
#[derive(Clone, Default)]
pub enum ChannelFilter {
    /// Keep every channel
    #[default]
    All,
    /// Keep only the named channels
    Include(Vec<String>),
    /// Drop the named channels
    Exclude(Vec<String>),
    /// Keep channels matching a regex
    RegexInclude(Arc<regex::Regex>),
    /// Drop channels matching a regex
    RegexExclude(Arc<regex::Regex>),
    /// Custom predicate
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl fmt::Debug for ChannelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.debug_tuple("All").finish(),
            Self::Include(v) => f.debug_tuple("Include").field(v).finish(),
            Self::Exclude(v) => f.debug_tuple("Exclude").field(v).finish(),
            Self::RegexInclude(re) => f.debug_tuple("RegexInclude").field(&re.as_str()).finish(),
            Self::RegexExclude(re) => f.debug_tuple("RegexExclude").field(&re.as_str()).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<fn>").finish(),
        }
    }
}

impl ChannelFilter {
    /// Check whether a channel name should be kept.
    pub fn should_include(&self, name: &str) -> bool {
        match self {
            ChannelFilter::All => true,
            ChannelFilter::Include(names) => names.iter().any(|n| n == name),
            ChannelFilter::Exclude(names) => !names.iter().any(|n| n == name),
            ChannelFilter::RegexInclude(re) => re.is_match(name),
            ChannelFilter::RegexExclude(re) => !re.is_match(name),
            ChannelFilter::Custom(f) => f(name),
        }
    }

    pub fn include(names: Vec<String>) -> Self {
        Self::Include(names)
    }

    pub fn exclude(names: Vec<String>) -> Self {
        Self::Exclude(names)
    }

    /// Create a regex include filter.
    pub fn regex_include(pattern: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(pattern).map(|re| Self::RegexInclude(Arc::new(re)))
    }

    /// Create a regex exclude filter.
    pub fn regex_exclude(pattern: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(pattern).map(|re| Self::RegexExclude(Arc::new(re)))
    }

    /// Create a custom filter from a predicate.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ChannelFilter::All)
    }
}
