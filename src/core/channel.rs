// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Channel identity and identifier normalization.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Location code assigned to records with a blank or placeholder location.
pub const DEFAULT_LOCATION: &str = "00";

/// Identity of one logical time series.
///
/// Two keys are equal only when all five fields match, so a channel that
/// changes sample rate mid-stream produces two distinct series. The sample
/// rate participates in hashing and ordering through its bit pattern and
/// `f64::total_cmp` respectively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelKey {
    network: String,
    station: String,
    location: String,
    channel: String,
    sample_rate: f64,
}

impl ChannelKey {
    /// Create a new channel key.
    pub fn new(
        network: impl Into<String>,
        station: impl Into<String>,
        location: impl Into<String>,
        channel: impl Into<String>,
        sample_rate: f64,
    ) -> Self {
        Self {
            network: network.into(),
            station: station.into(),
            location: location.into(),
            channel: channel.into(),
            sample_rate,
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Nominal sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Stable grouping key, e.g. `IU_ANMO_00_LHZ`.
    pub fn name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.network, self.station, self.location, self.channel
        )
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{} {}-{} ({:.1} Hz)",
            self.network, self.station, self.location, self.channel, self.sample_rate
        )
    }
}

impl PartialEq for ChannelKey {
    fn eq(&self, other: &Self) -> bool {
        self.network == other.network
            && self.station == other.station
            && self.location == other.location
            && self.channel == other.channel
            && self.sample_rate.to_bits() == other.sample_rate.to_bits()
    }
}

impl Eq for ChannelKey {}

impl Hash for ChannelKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.network.hash(state);
        self.station.hash(state);
        self.location.hash(state);
        self.channel.hash(state);
        self.sample_rate.to_bits().hash(state);
    }
}

impl Ord for ChannelKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.network
            .cmp(&other.network)
            .then_with(|| self.station.cmp(&other.station))
            .then_with(|| self.location.cmp(&other.location))
            .then_with(|| self.channel.cmp(&other.channel))
            .then_with(|| self.sample_rate.total_cmp(&other.sample_rate))
    }
}

impl PartialOrd for ChannelKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Location-code aliasing applied to every decoded record.
///
/// The default table maps blank and `--` locations to [`DEFAULT_LOCATION`]
/// and the historical `HR` code to `10`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationAliases {
    aliases: BTreeMap<String, String>,
}

impl Default for LocationAliases {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert(String::new(), DEFAULT_LOCATION.to_string());
        aliases.insert("--".to_string(), DEFAULT_LOCATION.to_string());
        aliases.insert("HR".to_string(), "10".to_string());
        Self { aliases }
    }
}

impl LocationAliases {
    /// An empty table (locations pass through unchanged apart from trimming).
    pub fn none() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    /// Add or replace one alias.
    pub fn with_alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.aliases.insert(from.into(), to.into());
        self
    }

    /// Trim a raw location code and apply the alias table.
    pub fn normalize(&self, location: &str) -> String {
        let trimmed = location.trim();
        match self.aliases.get(trimmed) {
            Some(alias) => alias.clone(),
            None => trimmed.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_channel_key_name_and_display() {
        let key = ChannelKey::new("IU", "ANMO", "00", "LHZ", 1.0);
        assert_eq!(key.name(), "IU_ANMO_00_LHZ");
        assert_eq!(key.to_string(), "IU_ANMO 00-LHZ (1.0 Hz)");
    }

    #[test]
    fn test_channel_key_equality_includes_rate() {
        let a = ChannelKey::new("IU", "ANMO", "00", "BHZ", 20.0);
        let b = ChannelKey::new("IU", "ANMO", "00", "BHZ", 40.0);
        assert_ne!(a, b);
        assert_eq!(a.name(), b.name());

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(b);
        set.insert(a);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_channel_key_ordering() {
        let mut keys = vec![
            ChannelKey::new("IU", "ANMO", "10", "LHZ", 1.0),
            ChannelKey::new("IU", "ANMO", "00", "LHZ", 1.0),
            ChannelKey::new("CU", "ANWB", "00", "LHZ", 1.0),
        ];
        keys.sort();
        assert_eq!(keys[0].network(), "CU");
        assert_eq!(keys[1].location(), "00");
        assert_eq!(keys[2].location(), "10");
    }

    #[test]
    fn test_default_location_aliases() {
        let aliases = LocationAliases::default();
        assert_eq!(aliases.normalize("  "), "00");
        assert_eq!(aliases.normalize("--"), "00");
        assert_eq!(aliases.normalize("HR"), "10");
        assert_eq!(aliases.normalize("20"), "20");
    }

    #[test]
    fn test_custom_location_aliases() {
        let aliases = LocationAliases::none().with_alias("XX", "99");
        assert_eq!(aliases.normalize("XX"), "99");
        assert_eq!(aliases.normalize(""), "");
        assert_eq!(aliases.len(), 1);
    }
}
