//! Link statistics records.

use std::fmt;

use serde::{Serialize, Serializer};

/// Size of the bounded string buffers at the C boundary (including the NUL).
pub const MAX_STR_LEN: usize = 512;

/// Vendor text used when the hardware identity cannot be determined.
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Unit tag for [`LinkStats::quality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QualityUnit {
    /// Percentage in `[0, 100]`.
    #[default]
    Percent,
    /// Signal strength in dBm, not normalized.
    Dbm,
}

impl QualityUnit {
    /// Short tag as rendered next to the value ("%" or "dBm").
    pub const fn as_str(self) -> &'static str {
        match self {
            QualityUnit::Percent => "%",
            QualityUnit::Dbm => "dBm",
        }
    }
}

impl fmt::Display for QualityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for QualityUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Statistics for an associated wireless interface.
///
/// Only produced by a successful query; every field is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Current SSID (empty if the driver reports none).
    pub network_name: String,

    /// Signal quality, scaled per `quality_unit`.
    pub quality: i32,

    /// How to interpret `quality`.
    pub quality_unit: QualityUnit,

    /// Current link rate in Mb/s.
    pub rate: i32,

    /// Best-effort hardware descriptor.
    pub vendor: String,
}

impl LinkStats {
    /// Build a stats record, bounding the string fields.
    pub fn new(
        network_name: &str,
        quality: i32,
        quality_unit: QualityUnit,
        rate: i32,
        vendor: &str,
    ) -> Self {
        Self {
            network_name: truncate_bounded(network_name, MAX_STR_LEN - 1),
            quality,
            quality_unit,
            rate,
            vendor: truncate_bounded(vendor, MAX_STR_LEN - 1),
        }
    }
}

/// Data known before the carrier check.
///
/// Carried on `WavelanError::NoCarrier` so callers can still show the vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialStats {
    /// Hardware descriptor, "Unknown" if not determined.
    pub vendor: String,

    /// Unit the backend would have used for `quality`.
    pub quality_unit: QualityUnit,
}

impl PartialStats {
    /// Baseline with an unknown vendor.
    pub fn new(quality_unit: QualityUnit) -> Self {
        Self {
            vendor: UNKNOWN_VENDOR.to_string(),
            quality_unit,
        }
    }
}

/// Truncate `s` to at most `max_bytes`, never splitting a UTF-8 sequence.
pub fn truncate_bounded(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_unit_tags() {
        assert_eq!(QualityUnit::Percent.as_str(), "%");
        assert_eq!(QualityUnit::Dbm.as_str(), "dBm");
        assert_eq!(QualityUnit::Dbm.to_string(), "dBm");
    }

    #[test]
    fn test_truncate_bounded_ascii() {
        assert_eq!(truncate_bounded("wlan0", 15), "wlan0");
        assert_eq!(truncate_bounded("averyveryverylongname", 15), "averyveryverylo");
        assert_eq!(truncate_bounded("", 4), "");
    }

    #[test]
    fn test_truncate_bounded_respects_char_boundaries() {
        // "é" is two bytes; cutting at 2 would split it.
        assert_eq!(truncate_bounded("aé", 2), "a");
        assert_eq!(truncate_bounded("aé", 3), "aé");
    }

    #[test]
    fn test_link_stats_bounds_strings() {
        let long = "x".repeat(MAX_STR_LEN * 2);
        let stats = LinkStats::new(&long, 50, QualityUnit::Percent, 54, &long);
        assert_eq!(stats.network_name.len(), MAX_STR_LEN - 1);
        assert_eq!(stats.vendor.len(), MAX_STR_LEN - 1);
    }

    #[test]
    fn test_partial_stats_defaults_to_unknown_vendor() {
        let partial = PartialStats::new(QualityUnit::Dbm);
        assert_eq!(partial.vendor, UNKNOWN_VENDOR);
        assert_eq!(partial.quality_unit, QualityUnit::Dbm);
    }
}
