//! Thread-local error handling for FFI.
//!
//! FFI functions return status codes and store detailed error information
//! in thread-local storage. Callers retrieve error details via:
//! - `wavelan_last_error_code()` - Get status code
//! - `wavelan_last_error()` - Get error message (must free with `wavelan_free_string`)
//! - `wavelan_clear_error()` - Clear error state

use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use wavelan_core::{ErrorCode, WavelanError};

/// FFI status codes.
///
/// Values are stable and shared with `wavelan_core::ErrorCode`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavelanErrorCode {
    /// Everything ok, all statistics are valid.
    Ok = 0,
    /// Interface not associated. Only vendor and quality unit are valid.
    NoCarrier = -1,
    /// Interface missing, or the platform call is unsupported or denied.
    NoSuchDevice = -2,
    /// NULL handle, NULL output, or invalid interface name.
    InvalidParameter = -3,
}

// ----------------------------------------------------------------------------
// C-friendly constants
// ----------------------------------------------------------------------------
//
// cbindgen's enum variant naming is not guaranteed to match the `WAVELAN_*`
// names used in the docs. These constants give the generated `wavelan.h`
// stable C names.

/// Everything ok, all statistics are valid.
#[allow(dead_code)] // exported for cbindgen-generated C header
pub const WAVELAN_OK: WavelanErrorCode = WavelanErrorCode::Ok;
/// Interface not associated.
#[allow(dead_code)] // exported for cbindgen-generated C header
pub const WAVELAN_ERR_NOCARRIER: WavelanErrorCode = WavelanErrorCode::NoCarrier;
/// Interface missing or not wireless.
#[allow(dead_code)] // exported for cbindgen-generated C header
pub const WAVELAN_ERR_NOSUCHDEV: WavelanErrorCode = WavelanErrorCode::NoSuchDevice;
/// Caller contract violation.
#[allow(dead_code)] // exported for cbindgen-generated C header
pub const WAVELAN_ERR_INVAL: WavelanErrorCode = WavelanErrorCode::InvalidParameter;

impl From<ErrorCode> for WavelanErrorCode {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Ok => WavelanErrorCode::Ok,
            ErrorCode::NoCarrier => WavelanErrorCode::NoCarrier,
            ErrorCode::NoSuchDevice => WavelanErrorCode::NoSuchDevice,
            ErrorCode::InvalidParameter => WavelanErrorCode::InvalidParameter,
        }
    }
}

impl From<&WavelanError> for WavelanErrorCode {
    fn from(err: &WavelanError) -> Self {
        WavelanErrorCode::from(err.error_code())
    }
}

/// Thread-local error state.
struct ErrorState {
    code: WavelanErrorCode,
    message: Option<String>,
}

impl Default for ErrorState {
    fn default() -> Self {
        Self {
            code: WavelanErrorCode::Ok,
            message: None,
        }
    }
}

thread_local! {
    static LAST_ERROR: RefCell<ErrorState> = RefCell::new(ErrorState::default());
}

/// Record `err` as this thread's last error and return its code.
pub(crate) fn set_error(err: &WavelanError) -> WavelanErrorCode {
    let code = WavelanErrorCode::from(err);
    LAST_ERROR.with(|state| {
        let mut state = state.borrow_mut();
        state.code = code;
        state.message = Some(err.to_string());
    });
    code
}

/// Clear the thread-local error state.
pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        let mut state = state.borrow_mut();
        state.code = WavelanErrorCode::Ok;
        state.message = None;
    });
}

// ============================================================================
// FFI Exports
// ============================================================================

/// Get the status code of the last failed operation.
///
/// Returns `WAVELAN_OK` (0) if the last operation succeeded.
///
/// # Thread Safety
///
/// Error state is thread-local. Each thread has its own error state.
#[no_mangle]
pub extern "C" fn wavelan_last_error_code() -> WavelanErrorCode {
    LAST_ERROR.with(|state| state.borrow().code)
}

/// Get the error message of the last failed operation.
///
/// Returns an owned string (must be freed with `wavelan_free_string()`).
/// After a successful operation, or after `wavelan_clear_error()`, this is
/// an empty string.
///
/// # Safety
///
/// The returned pointer must be freed with `wavelan_free_string()`.
#[no_mangle]
pub extern "C" fn wavelan_last_error() -> *mut c_char {
    LAST_ERROR.with(|state| {
        let state = state.borrow();
        let msg = state.message.as_deref().unwrap_or("");

        match CString::new(msg) {
            Ok(c_str) => c_str.into_raw(),
            Err(_) => {
                let sanitized = msg.replace('\0', "?");
                CString::new(sanitized)
                    .map(|s| s.into_raw())
                    .unwrap_or(std::ptr::null_mut())
            }
        }
    })
}

/// Clear the error state for the current thread.
#[no_mangle]
pub extern "C" fn wavelan_clear_error() {
    clear_error_state();
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use wavelan_core::{PartialStats, QualityUnit};

    fn last_message() -> String {
        let msg_ptr = wavelan_last_error();
        assert!(!msg_ptr.is_null());
        // SAFETY: just returned by wavelan_last_error
        let msg = unsafe { CStr::from_ptr(msg_ptr).to_str().unwrap().to_string() };
        unsafe { crate::wavelan_free_string(msg_ptr) };
        msg
    }

    #[test]
    fn test_initial_state_is_ok() {
        clear_error_state();
        assert_eq!(wavelan_last_error_code(), WavelanErrorCode::Ok);
        assert!(last_message().is_empty());
    }

    #[test]
    fn test_set_and_get_error() {
        let err = WavelanError::invalid_parameter("interface cannot be null");
        assert_eq!(set_error(&err), WavelanErrorCode::InvalidParameter);

        assert_eq!(
            wavelan_last_error_code(),
            WavelanErrorCode::InvalidParameter
        );
        assert!(last_message().contains("interface cannot be null"));
    }

    #[test]
    fn test_clear_error() {
        set_error(&WavelanError::no_such_device("wlan9"));
        assert_eq!(wavelan_last_error_code(), WavelanErrorCode::NoSuchDevice);

        wavelan_clear_error();
        assert_eq!(wavelan_last_error_code(), WavelanErrorCode::Ok);
        assert!(last_message().is_empty());
    }

    #[test]
    fn test_error_code_mapping() {
        let cases = [
            (
                WavelanError::no_carrier("wi0", PartialStats::new(QualityUnit::Dbm)),
                WavelanErrorCode::NoCarrier,
            ),
            (
                WavelanError::no_such_device("wi0"),
                WavelanErrorCode::NoSuchDevice,
            ),
            (
                WavelanError::invalid_parameter(""),
                WavelanErrorCode::InvalidParameter,
            ),
            (
                WavelanError::open("wi0", std::io::Error::from(std::io::ErrorKind::NotFound)),
                WavelanErrorCode::NoSuchDevice,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(WavelanErrorCode::from(&err), expected, "{err:?}");
        }
    }

    #[test]
    fn test_codes_match_core_values() {
        for code in ErrorCode::ALL {
            assert_eq!(WavelanErrorCode::from(code) as i32, code.as_raw());
        }
    }
}
