//! Device lifecycle and query FFI functions.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;

use wavelan_core::{
    ErrorCode, LinkStats, QualityUnit, WavelanError, WavelanResult, MAX_STR_LEN,
};
use wavelan_probe::{Device, WirelessBackend};

use crate::error::{clear_error_state, set_error, WavelanErrorCode};

/// Capacity of the quality unit tag, NUL included ("dBm").
pub const WAVELAN_QUNIT_LEN: usize = 4;

/// Opaque device handle returned by `wavelan_open()`.
pub struct WavelanDevice {
    inner: Device,
}

/// Link statistics written by `wavelan_query()`.
///
/// All strings are NUL-terminated and truncated to fit.
#[repr(C)]
pub struct WavelanStats {
    /// Current SSID.
    pub netname: [c_char; MAX_STR_LEN],
    /// Signal quality, scaled per `qunit`.
    pub quality: i32,
    /// "%" or "dBm".
    pub qunit: [c_char; WAVELAN_QUNIT_LEN],
    /// Link rate in Mb/s.
    pub rate: i32,
    /// Best-effort hardware descriptor.
    pub vendor: [c_char; MAX_STR_LEN],
}

/// Copy `src` into a fixed C buffer, truncating and NUL-terminating.
fn write_cstr(dst: &mut [c_char], src: &str) {
    let Some(room) = dst.len().checked_sub(1) else {
        return;
    };
    let bytes = src.as_bytes();
    let n = bytes.iter().take(room).take_while(|&&b| b != 0).count();
    for (d, &b) in dst.iter_mut().zip(&bytes[..n]) {
        *d = b as c_char;
    }
    dst[n..].fill(0);
}

impl WavelanStats {
    fn clear(&mut self) {
        self.netname.fill(0);
        self.quality = 0;
        self.qunit.fill(0);
        self.rate = 0;
        self.vendor.fill(0);
    }

    fn fill(&mut self, stats: &LinkStats) {
        write_cstr(&mut self.netname, &stats.network_name);
        self.quality = stats.quality;
        write_cstr(&mut self.qunit, stats.quality_unit.as_str());
        self.rate = stats.rate;
        write_cstr(&mut self.vendor, &stats.vendor);
    }
}

/// Borrow a C interface name as UTF-8.
///
/// # Safety
///
/// `interface` must be null or a valid NUL-terminated string.
unsafe fn interface_arg<'a>(interface: *const c_char) -> Result<&'a str, WavelanError> {
    if interface.is_null() {
        return Err(WavelanError::invalid_parameter("interface cannot be null"));
    }
    CStr::from_ptr(interface)
        .to_str()
        .map_err(|_| WavelanError::invalid_parameter("interface is not valid UTF-8"))
}

// ============================================================================
// FFI Exports
// ============================================================================

/// Open a device handle for a wireless interface.
///
/// Returns NULL on failure; check `wavelan_last_error_code()`:
/// `WAVELAN_ERR_INVAL` for a NULL, empty or non-UTF-8 name and
/// `WAVELAN_ERR_NOSUCHDEV` if the kernel channel cannot be opened.
/// A missing interface is only reported by the first `wavelan_query()`.
///
/// # Safety
///
/// `interface` must be null or a valid NUL-terminated string.
/// A non-null result must be released with `wavelan_close()`.
#[no_mangle]
pub unsafe extern "C" fn wavelan_open(interface: *const c_char) -> *mut WavelanDevice {
    clear_error_state();

    let opened = interface_arg(interface).and_then(wavelan_probe::open);
    match opened {
        Ok(inner) => Box::into_raw(Box::new(WavelanDevice { inner })),
        Err(e) => {
            set_error(&e);
            ptr::null_mut()
        }
    }
}

/// Release a device handle. NULL is a no-op.
///
/// # Safety
///
/// `device` must be null or a handle from `wavelan_open()` that has not
/// been closed yet.
#[no_mangle]
pub unsafe extern "C" fn wavelan_close(device: *mut WavelanDevice) {
    if device.is_null() {
        return;
    }
    let device = Box::from_raw(device);
    device.inner.close();
}

/// Query link statistics into `out`.
///
/// On `WAVELAN_OK` every field is valid. On `WAVELAN_ERR_NOCARRIER` only
/// `qunit` and `vendor` are; other fields are zero. On other errors `qunit`
/// is set and everything else is zero. With a NULL `device` or `out`,
/// `out` is left untouched and `WAVELAN_ERR_INVAL` is returned.
///
/// # Safety
///
/// `device` must be null or a live handle from `wavelan_open()`.
/// `out` must be null or point to a writable `WavelanStats`.
#[no_mangle]
pub unsafe extern "C" fn wavelan_query(
    device: *mut WavelanDevice,
    out: *mut WavelanStats,
) -> WavelanErrorCode {
    clear_error_state();

    if device.is_null() {
        return set_error(&WavelanError::invalid_parameter("device cannot be null"));
    }
    if out.is_null() {
        return set_error(&WavelanError::invalid_parameter("out cannot be null"));
    }

    let device = &mut (*device).inner;
    let result = device.query();
    write_result(&mut *out, device.quality_unit(), &result)
}

/// Store a query result in `out` and record the error state.
fn write_result(
    out: &mut WavelanStats,
    unit: QualityUnit,
    result: &WavelanResult<LinkStats>,
) -> WavelanErrorCode {
    out.clear();
    write_cstr(&mut out.qunit, unit.as_str());

    match result {
        Ok(stats) => {
            out.fill(stats);
            WavelanErrorCode::Ok
        }
        Err(e) => {
            if let Some(partial) = e.partial() {
                write_cstr(&mut out.qunit, partial.quality_unit.as_str());
                write_cstr(&mut out.vendor, &partial.vendor);
            }
            set_error(e)
        }
    }
}

/// Query an interface once and return a JSON link snapshot.
///
/// Opens, queries and closes `interface`. The snapshot carries the status
/// code, which is also returned. The JSON string is written to
/// `result_json_out` for every status except a NULL argument.
///
/// # Safety
///
/// `interface` must be null or a valid NUL-terminated string.
/// `result_json_out` must be a valid pointer; the string written there must
/// be freed with `wavelan_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn wavelan_snapshot_json(
    interface: *const c_char,
    result_json_out: *mut *mut c_char,
) -> WavelanErrorCode {
    clear_error_state();

    if result_json_out.is_null() {
        return set_error(&WavelanError::invalid_parameter(
            "result_json_out cannot be null",
        ));
    }

    let name = match interface_arg(interface) {
        Ok(name) => name,
        Err(e) => return set_error(&e),
    };

    let result = wavelan_probe::open(name).and_then(|mut device| {
        let stats = device.query();
        device.close();
        stats
    });
    let snapshot = wavelan_probe::LinkSnapshot::from_result(name, &result);

    let json = match serde_json::to_string(&snapshot) {
        Ok(j) => j,
        Err(e) => {
            return set_error(&WavelanError::invalid_parameter(format!(
                "failed to serialize snapshot: {e}"
            )))
        }
    };
    let c_json = match CString::new(json) {
        Ok(c) => c,
        Err(e) => {
            return set_error(&WavelanError::invalid_parameter(format!(
                "snapshot contains NUL byte: {e}"
            )))
        }
    };

    *result_json_out = c_json.into_raw();

    match result {
        Ok(_) => WavelanErrorCode::Ok,
        Err(e) => set_error(&e),
    }
}

/// Describe a status code.
///
/// Returns a static string ("Unknown error" for unrecognized codes).
/// The pointer is valid for the lifetime of the library and should NOT be
/// freed.
#[no_mangle]
pub extern "C" fn wavelan_strerror(code: c_int) -> *const c_char {
    strerror_cstr(code).as_ptr()
}

fn strerror_cstr(code: c_int) -> &'static CStr {
    match ErrorCode::from_raw(code) {
        Some(ErrorCode::Ok) => c"OK",
        Some(ErrorCode::NoCarrier) => c"No carrier signal",
        Some(ErrorCode::NoSuchDevice) => c"No such WaveLAN device",
        Some(ErrorCode::InvalidParameter) => c"Invalid parameter",
        None => c"Unknown error",
    }
}

// ============================================================================
// Tests
// ============================================================================
