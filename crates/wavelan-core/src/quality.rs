//! Signal quality normalization.
//!
//! Drivers report signal quality in three shapes:
//!
//! | Shape | Platforms | Conversion |
//! |-------|-----------|------------|
//! | dBm | Darwin, OpenBSD fallback | [`dbm_to_percent`] (linear over -100..-50 dBm) |
//! | raw link scalar with a maximum | Linux WEXT, legacy wi API | [`log_quality`] |
//! | value plus driver maximum | OpenBSD node RSSI | [`ratio_to_percent`] |
//!
//! FreeBSD scan results stay in dBm ([`scan_quality`]) and are tagged as such.

/// Link maximum used when the driver cannot report one.
pub const DEFAULT_MAX_QUALITY: f64 = 92.0;

/// dBm at or below which quality is 0%.
pub const DBM_FLOOR: i32 = -100;

/// dBm at or above which quality is 100%.
pub const DBM_CEILING: i32 = -50;

/// Convert signal strength in dBm to a percentage.
///
/// `0` at or below -100 dBm, `100` at or above -50 dBm, `2 * (100 + dbm)`
/// in between.
pub const fn dbm_to_percent(dbm: i32) -> i32 {
    if dbm <= DBM_FLOOR {
        0
    } else if dbm >= DBM_CEILING {
        100
    } else {
        2 * (100 + dbm)
    }
}

/// Pick the link maximum for [`log_quality`].
///
/// A reported maximum overrides the default only when the logarithm stays
/// well defined (`> 1`, finite).
pub fn resolve_max_quality(reported: Option<f64>) -> f64 {
    match reported {
        Some(max) if max.is_finite() && max > 1.0 => max,
        _ => DEFAULT_MAX_QUALITY,
    }
}

/// Convert a raw link scalar to a percentage on a logarithmic scale.
///
/// `round(100 * ln(link) / ln(max_quality))`, clamped to `[0, 100]`.
/// Non-positive (or NaN) links are `0` without evaluating the logarithm.
pub fn log_quality(link: f64, max_quality: f64) -> i32 {
    if link.is_nan() || link <= 0.0 {
        return 0;
    }
    let max_quality = resolve_max_quality(Some(max_quality));
    let percent = (100.0 * link.ln() / max_quality.ln()).round();
    percent.clamp(0.0, 100.0) as i32
}

/// Scale `value` against a driver-reported maximum.
///
/// Returns `None` if the driver reports no maximum.
pub fn ratio_to_percent(value: i32, max: i32) -> Option<i32> {
    if max <= 0 {
        return None;
    }
    Some((value.saturating_mul(100) / max).clamp(0, 100))
}

/// Quality derived from a FreeBSD scan result entry, in dBm.
pub fn scan_quality(rssi: i8, noise: i8) -> i32 {
    i32::from(rssi) * 2 + i32::from(noise)
}
