//! wavelan-ffi: C-ABI exports for wavelan
//!
//! This crate provides a stable C-ABI interface for wireless link telemetry:
//!
//! ```c
//! WavelanDevice* dev = wavelan_open("wlan0");
//! WavelanStats stats;
//! int rc = wavelan_query(dev, &stats);
//! if (rc != WAVELAN_OK)
//!     fprintf(stderr, "%s\n", wavelan_strerror(rc));
//! wavelan_close(dev);
//! ```
//!
//! # Memory Management
//!
//! Device handles are released with `wavelan_close()`. Owned strings
//! (`wavelan_last_error()`, `wavelan_get_platform()`,
//! `wavelan_snapshot_json()`) must be freed with `wavelan_free_string()`.
//! `wavelan_version()` and `wavelan_strerror()` return static strings.
//!
//! # Error Handling
//!
//! Functions return `WavelanErrorCode` (or NULL for `wavelan_open()`). On
//! error, detailed information is available via:
//! - `wavelan_last_error_code()` - Get status code
//! - `wavelan_last_error()` - Get error message
//! - `wavelan_clear_error()` - Clear error state
//!
//! Error state is thread-local. A handle may be used from any thread, but
//! not from two threads at once.
//!
//! # ABI Version
//!
//! Check `wavelan_abi_version()` for ABI compatibility. The ABI version
//! increments when breaking changes are made to the FFI interface.

use std::ffi::CString;
use std::os::raw::c_char;

use wavelan_core::get_platform;

// Modules
mod device;
mod error;

// Re-export error types at crate root
pub use error::WavelanErrorCode;

// Re-export FFI functions from submodules
pub use device::{
    wavelan_close, wavelan_open, wavelan_query, wavelan_snapshot_json, wavelan_strerror,
    WavelanDevice, WavelanStats, WAVELAN_QUNIT_LEN,
};
pub use error::{wavelan_clear_error, wavelan_last_error, wavelan_last_error_code};

// ============================================================================
// Version Constants
// ============================================================================

/// Library version string (e.g., "0.1.0").
///
/// This matches the version in Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ABI version number.
///
/// Incremented when function signatures, `WavelanStats` layout, or status
/// code values change. New functions do not increment it.
const ABI_VERSION: u32 = 1;

// ============================================================================
// Version Functions
// ============================================================================

/// Get the library version string.
///
/// Returns a static string like "0.1.0". The pointer is valid for the
/// lifetime of the library and should NOT be freed.
#[no_mangle]
pub extern "C" fn wavelan_version() -> *const c_char {
    static VERSION_CSTR: std::sync::OnceLock<CString> = std::sync::OnceLock::new();
    VERSION_CSTR
        .get_or_init(|| CString::new(VERSION).unwrap_or_default())
        .as_ptr()
}

/// Get the ABI version number.
#[no_mangle]
pub extern "C" fn wavelan_abi_version() -> u32 {
    ABI_VERSION
}

// ============================================================================
// Platform Detection
// ============================================================================

/// Returns the current platform name as a C string.
///
/// # Safety
///
/// The returned pointer must be freed with `wavelan_free_string()`.
#[no_mangle]
pub extern "C" fn wavelan_get_platform() -> *mut c_char {
    CString::new(get_platform())
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Frees a string allocated by wavelan functions.
///
/// # Safety
///
/// The pointer must have been returned by a wavelan function that allocates
/// strings. Passing null is safe and will be a no-op.
///
/// Do NOT pass pointers returned by `wavelan_version()` or
/// `wavelan_strerror()`.
#[no_mangle]
pub unsafe extern "C" fn wavelan_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    // SAFETY: Caller guarantees `s` came from `CString::into_raw` in this
    // library.
    let _ = CString::from_raw(s);
}

// ============================================================================
// Tests
// ============================================================================
