//! wavelan-probe: Per-platform wireless link queries
//!
//! This crate binds one interface name to a kernel channel and reads the
//! current association state, SSID, signal quality, link rate and (where
//! the platform can tell) the hardware vendor.
//!
//! ## Platform Support
//!
//! | Platform | Channel | Carrier | Quality |
//! |----------|---------|---------|---------|
//! | Linux | `/proc/net/wireless` + WEXT ioctls | proc row + `SIOCGIWAP` | proc link column, log scale (%) |
//! | FreeBSD | net80211 `SIOCG80211` | `SIOCGIFMEDIA` | scan result `rssi * 2 + noise` (dBm) |
//! | NetBSD | legacy wi `SIOCGWAVELAN` | `SIOCGIFMEDIA` | comms quality word, log scale (%) |
//! | OpenBSD | net80211 node requests | `SIOCGIFMEDIA` | node RSSI ratio (%) |
//! | macOS | apple80211 `SIOCGA80211` | `SIOCGIFMEDIA` | aggregate RSSI (%) |
//!
//! Other targets compile, but `open` always fails.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wavelan_probe::{open, query, close};
//!
//! let mut device = open("wlan0").unwrap();
//! match query(&mut device) {
//!     Ok(stats) => println!("{} {}{}", stats.network_name, stats.quality, stats.quality_unit),
//!     Err(e) => eprintln!("{e}"),
//! }
//! close(device);
//! ```

use serde::Serialize;
use wavelan_core::schema::LINK_SNAPSHOT_V1;
use wavelan_core::{get_platform, ErrorCode, LinkStats, WavelanResult};

mod backend;
// Each backend uses a different subset.
#[allow(dead_code)]
mod decode;

#[cfg(unix)]
mod sys;

#[cfg(any(
    test,
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "macos"
))]
mod ioccom;

#[cfg(any(
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "macos"
))]
mod media;

// Platform-specific implementations
#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "freebsd")]
mod freebsd;
#[cfg(target_os = "netbsd")]
mod netbsd;
#[cfg(target_os = "openbsd")]
mod openbsd;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(not(any(
    target_os = "linux",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "macos"
)))]
mod unsupported;

#[cfg(target_os = "linux")]
use linux as platform;
#[cfg(target_os = "freebsd")]
use freebsd as platform;
#[cfg(target_os = "netbsd")]
use netbsd as platform;
#[cfg(target_os = "openbsd")]
use openbsd as platform;
#[cfg(target_os = "macos")]
use macos as platform;
#[cfg(not(any(
    target_os = "linux",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "macos"
)))]
use unsupported as platform;

pub use backend::{InterfaceName, StepError, StepResult, WirelessBackend, MAX_INTERFACE_LEN};

/// Wireless device handle for the current platform.
pub use platform::Device;

// ============================================================================
// Device lifecycle
// ============================================================================

/// Open a device handle for `interface`.
///
/// Only the kernel channel is established; a missing interface surfaces on
/// the first [`query`].
///
/// # Errors
///
/// - `InvalidParameter` if `interface` is empty
/// - `Open` if the channel cannot be established
pub fn open(interface: &str) -> WavelanResult<Device> {
    Device::open(interface)
}

/// Query current link statistics.
///
/// See [`WirelessBackend::query`] for the step order.
pub fn query(device: &mut Device) -> WavelanResult<LinkStats> {
    device.query()
}

/// Release a device handle.
pub fn close(device: Device) {
    device.close()
}

// ============================================================================
// JSON envelope
// ============================================================================

/// One query result wrapped for machine consumption.
#[derive(Debug, Clone, Serialize)]
pub struct LinkSnapshot {
    /// Schema identifier for version detection.
    pub schema_id: &'static str,

    /// Timestamp of the query (RFC 3339).
    pub timestamp: String,

    /// Current platform (e.g., "linux", "freebsd").
    pub platform: &'static str,

    /// Interface the query ran against.
    pub interface: String,

    /// Result code.
    pub status: ErrorCode,

    /// Human-readable result.
    pub message: String,

    /// Full statistics, present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<LinkStats>,

    /// Vendor known before the carrier check failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

impl LinkSnapshot {
    /// Wrap a query result.
    pub fn from_result(interface: &str, result: &WavelanResult<LinkStats>) -> Self {
        let (status, message, stats, vendor) = match result {
            Ok(stats) => (
                ErrorCode::Ok,
                ErrorCode::Ok.as_str().to_string(),
                Some(stats.clone()),
                None,
            ),
            Err(e) => (
                e.error_code(),
                e.to_string(),
                None,
                e.partial().map(|p| p.vendor.clone()),
            ),
        };

        Self {
            schema_id: LINK_SNAPSHOT_V1,
            timestamp: current_timestamp(),
            platform: get_platform(),
            interface: interface.to_string(),
            status,
            message,
            stats,
            vendor,
        }
    }
}

/// Open, query once, and close.
///
/// Open failures are folded into the snapshot like query failures.
pub fn snapshot(interface: &str) -> LinkSnapshot {
    let result = open(interface).and_then(|mut device| {
        let result = query(&mut device);
        close(device);
        result
    });
    LinkSnapshot::from_result(interface, &result)
}

fn current_timestamp() -> String {
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
