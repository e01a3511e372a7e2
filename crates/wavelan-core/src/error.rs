//! Error types for wavelan queries.
//!
//! Two layers:
//! - [`ErrorCode`] - the closed, ABI-stable status enumeration
//! - [`WavelanError`] - the Rust error type carried by `Result`s
//!
//! ## Design Principles
//!
//! - **Closed**: every error maps to exactly one [`ErrorCode`]
//! - **FFI-friendly**: codes keep the historical negative values so C callers
//!   can compare against them directly
//! - **Explicit partial data**: a missing carrier still carries the vendor and
//!   quality unit that were determined before the carrier check

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::stats::PartialStats;

// ============================================================================
// Status Codes
// ============================================================================

/// Status of a wireless query.
///
/// ## C Value Mapping
///
/// | Variant | Value |
/// |---------|-------|
/// | `Ok` | 0 |
/// | `NoCarrier` | -1 |
/// | `NoSuchDevice` | -2 |
/// | `InvalidParameter` | -3 |
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Everything ok, all statistics are valid.
    Ok = 0,
    /// Interface exists but is not associated. Only vendor and quality unit
    /// may be valid.
    NoCarrier = -1,
    /// Interface is absent, or the platform call is unsupported or denied.
    NoSuchDevice = -2,
    /// Caller contract violation (null handle, null output, empty name).
    InvalidParameter = -3,
}

impl ErrorCode {
    /// All codes, in declaration order.
    pub const ALL: [ErrorCode; 4] = [
        ErrorCode::Ok,
        ErrorCode::NoCarrier,
        ErrorCode::NoSuchDevice,
        ErrorCode::InvalidParameter,
    ];

    /// Raw C value of this code.
    #[inline]
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    /// Convert a raw value back into a code.
    ///
    /// Returns `None` for values outside the enumeration.
    pub const fn from_raw(raw: i32) -> Option<ErrorCode> {
        match raw {
            0 => Some(ErrorCode::Ok),
            -1 => Some(ErrorCode::NoCarrier),
            -2 => Some(ErrorCode::NoSuchDevice),
            -3 => Some(ErrorCode::InvalidParameter),
            _ => None,
        }
    }

    /// Human-readable description of this code.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Ok => "OK",
            ErrorCode::NoCarrier => "No carrier signal",
            ErrorCode::NoSuchDevice => "No such WaveLAN device",
            ErrorCode::InvalidParameter => "Invalid parameter",
        }
    }
}

/// Fallback text for values outside [`ErrorCode`].
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Map a raw status value to human-readable text.
///
/// Total over `i32`: unrecognized values return [`UNKNOWN_ERROR`].
pub fn error_to_string(code: i32) -> &'static str {
    match ErrorCode::from_raw(code) {
        Some(code) => code.as_str(),
        None => UNKNOWN_ERROR,
    }
}

// ============================================================================
// Canonical Error Type
// ============================================================================

/// Error type for all wavelan operations.
#[derive(Debug, Error)]
pub enum WavelanError {
    /// The interface exists but has no active association.
    #[error("No carrier signal on '{interface}'")]
    NoCarrier {
        /// Interface that was queried.
        interface: String,
        /// Data determined before the carrier check.
        partial: PartialStats,
    },

    /// The interface is absent or does not support the wireless queries.
    #[error("No such WaveLAN device '{interface}'")]
    NoSuchDevice {
        /// Interface that was queried.
        interface: String,
    },

    /// Invalid argument provided by the caller.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of what was invalid.
        message: String,
    },

    /// The kernel communication channel could not be established.
    #[error("Failed to open '{interface}': {source}")]
    Open {
        /// Interface the channel was opened for.
        interface: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl WavelanError {
    /// Get the status code for this error.
    ///
    /// `Open` failures report `NoSuchDevice`; at the C boundary they are
    /// surfaced as a null handle instead.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            WavelanError::NoCarrier { .. } => ErrorCode::NoCarrier,
            WavelanError::NoSuchDevice { .. } => ErrorCode::NoSuchDevice,
            WavelanError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            WavelanError::Open { .. } => ErrorCode::NoSuchDevice,
        }
    }

    /// Partial statistics carried by a `NoCarrier` error.
    pub fn partial(&self) -> Option<&PartialStats> {
        match self {
            WavelanError::NoCarrier { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl WavelanError {
    /// Create a `NoCarrier` error.
    pub fn no_carrier(interface: impl Into<String>, partial: PartialStats) -> Self {
        WavelanError::NoCarrier {
            interface: interface.into(),
            partial,
        }
    }

    /// Create a `NoSuchDevice` error.
    pub fn no_such_device(interface: impl Into<String>) -> Self {
        WavelanError::NoSuchDevice {
            interface: interface.into(),
        }
    }

    /// Create an `InvalidParameter` error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        WavelanError::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create an `Open` error from an IO error.
    pub fn open(interface: impl Into<String>, source: io::Error) -> Self {
        WavelanError::Open {
            interface: interface.into(),
            source,
        }
    }
}

/// Result type alias for wavelan operations.
pub type WavelanResult<T> = Result<T, WavelanError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::QualityUnit;
    use std::collections::HashSet;

    #[test]
    fn test_error_to_string_known_codes() {
        assert_eq!(error_to_string(0), "OK");
        assert_eq!(error_to_string(-1), "No carrier signal");
        assert_eq!(error_to_string(-2), "No such WaveLAN device");
        assert_eq!(error_to_string(-3), "Invalid parameter");
    }

    #[test]
    fn test_error_strings_are_distinct_and_non_empty() {
        let strings: HashSet<&str> = ErrorCode::ALL
            .iter()
            .map(|code| error_to_string(code.as_raw()))
            .collect();
        assert_eq!(strings.len(), ErrorCode::ALL.len());
        assert!(strings.iter().all(|s| !s.is_empty()));
        assert!(!strings.contains(UNKNOWN_ERROR));
    }

    #[test]
    fn test_error_to_string_fallback_is_stable() {
        for raw in [1, -4, 42, i32::MIN, i32::MAX] {
            assert_eq!(error_to_string(raw), "Unknown error");
        }
    }

    #[test]
    fn test_raw_round_trip() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_raw(code.as_raw()), Some(code));
        }
        assert_eq!(ErrorCode::from_raw(7), None);
    }

    #[test]
    fn test_error_display() {
        let err = WavelanError::no_such_device("wlan9");
        assert_eq!(err.to_string(), "No such WaveLAN device 'wlan9'");

        let err = WavelanError::invalid_parameter("interface name cannot be empty");
        assert_eq!(
            err.to_string(),
            "Invalid parameter: interface name cannot be empty"
        );

        let err = WavelanError::open("wlan0", io::Error::other("boom"));
        assert_eq!(err.to_string(), "Failed to open 'wlan0': boom");
    }

    #[test]
    fn test_error_codes() {
        let partial = PartialStats::new(QualityUnit::Percent);
        assert_eq!(
            WavelanError::no_carrier("wlan0", partial).error_code(),
            ErrorCode::NoCarrier
        );
        assert_eq!(
            WavelanError::no_such_device("wlan0").error_code(),
            ErrorCode::NoSuchDevice
        );
        assert_eq!(
            WavelanError::invalid_parameter("").error_code(),
            ErrorCode::InvalidParameter
        );
        assert_eq!(
            WavelanError::open("wlan0", io::Error::other("x")).error_code(),
            ErrorCode::NoSuchDevice
        );
    }

    #[test]
    fn test_no_carrier_keeps_partial_vendor() {
        let mut partial = PartialStats::new(QualityUnit::Dbm);
        partial.vendor = "Lucent (ID 1, version 6.16)".to_string();
        let err = WavelanError::no_carrier("wi0", partial);

        let partial = err.partial().expect("no carrier carries partial stats");
        assert_eq!(partial.vendor, "Lucent (ID 1, version 6.16)");
        assert_eq!(partial.quality_unit, QualityUnit::Dbm);
        assert!(WavelanError::no_such_device("wi0").partial().is_none());
    }
}
