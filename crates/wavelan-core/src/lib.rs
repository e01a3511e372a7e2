//! wavelan-core: Core types, errors, and quality normalization
//!
//! This crate provides the foundational types shared by every wavelan backend:
//! - The error taxonomy ([`ErrorCode`], [`WavelanError`])
//! - The link statistics record ([`LinkStats`]) and its partial form
//! - Quality normalizers that map driver units onto a percentage scale
//! - Schema ID constants for JSON output contracts
//! - Platform detection utilities
//!
//! ## Error Handling
//!
//! Queries return `Result<LinkStats, WavelanError>`. Every error maps onto
//! one of the four stable [`ErrorCode`] values exposed at the C boundary.
//!
//! ## Quality Units
//!
//! Backends disagree about the scale of `quality`. Some report a percentage,
//! some report dBm. [`LinkStats::quality_unit`] is authoritative; callers
//! must consult it before rendering.

use std::env::consts::OS;

pub mod error;
pub mod quality;
pub mod schema;
pub mod stats;

pub use error::{error_to_string, ErrorCode, WavelanError, WavelanResult};
pub use quality::{
    dbm_to_percent, log_quality, ratio_to_percent, resolve_max_quality, scan_quality,
    DEFAULT_MAX_QUALITY,
};
pub use stats::{
    truncate_bounded, LinkStats, PartialStats, QualityUnit, MAX_STR_LEN, UNKNOWN_VENDOR,
};

// Exit code constants for ecosystem alignment
pub use rsfulmen::foundry::exit_codes;

// ============================================================================
// Platform Detection
// ============================================================================

/// Get the current platform identifier.
///
/// Returns one of: "linux", "macos", "freebsd", "netbsd", "openbsd", etc.
#[inline]
pub fn get_platform() -> &'static str {
    OS
}

/// Check if a wireless backend is compiled in for the current target.
#[inline]
pub const fn has_wireless_backend() -> bool {
    cfg!(any(
        target_os = "linux",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "macos"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_platform() {
        let platform = get_platform();
        assert!(!platform.is_empty());
        assert_eq!(platform, std::env::consts::OS);
    }

    #[test]
    fn test_backend_available_on_supported_targets() {
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        assert!(has_wireless_backend());

        #[cfg(windows)]
        assert!(!has_wireless_backend());
    }

    #[test]
    fn test_rsfulmen_reexports() {
        assert_eq!(exit_codes::EXIT_SUCCESS, 0);
    }
}
