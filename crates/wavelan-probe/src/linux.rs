//! Linux implementation using Wireless Extensions
//!
//! Uses the following sources:
//! - `/proc/net/wireless` - presence row with link/level/noise
//! - `SIOCGIWAP` - associated access point (carrier)
//! - `SIOCGIWESSID` - current SSID
//! - `SIOCGIWRANGE` - driver maximum for the link scalar
//! - `SIOCGIWRATE` - current bitrate
//! - `/sys/class/net/<if>/device/driver` - driver name, reported as vendor

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::mem;
use std::os::fd::{AsFd, OwnedFd};
use std::ptr;

use libc::{c_char, c_ulong, c_void, sockaddr, ENODEV, IFNAMSIZ};
use tracing::debug;
use wavelan_core::{log_quality, resolve_max_quality, QualityUnit, UNKNOWN_VENDOR};

use crate::backend::{InterfaceName, StepError, StepResult, WirelessBackend};
use crate::decode::{parse_wireless_row, ssid_from_bytes, wext_carrier, ApLookup, WirelessRow};
use crate::sys::{copy_ifname, datagram_socket, errno_of, ioctl};

const PROC_NET_WIRELESS: &str = "/proc/net/wireless";

// ============================================================================
// Wireless Extensions FFI Bindings
// ============================================================================

// Request numbers from <linux/wireless.h>
const SIOCGIWRANGE: c_ulong = 0x8B0B;
const SIOCGIWAP: c_ulong = 0x8B15;
const SIOCGIWESSID: c_ulong = 0x8B1B;
const SIOCGIWRATE: c_ulong = 0x8B21;

const IW_ESSID_MAX_SIZE: usize = 32;

/// Buffer handed to `SIOCGIWRANGE`; `struct iw_range` is well under this.
const IW_RANGE_BUF_LEN: usize = 4096;

/// `struct iw_point`
#[allow(dead_code)] // kernel layout
#[repr(C)]
#[derive(Clone, Copy)]
struct IwPoint {
    pointer: *mut c_void,
    length: u16,
    flags: u16,
}

/// `struct iw_param`
#[allow(dead_code)] // kernel layout
#[repr(C)]
#[derive(Clone, Copy)]
struct IwParam {
    value: i32,
    fixed: u8,
    disabled: u8,
    flags: u16,
}

/// `union iwreq_data`, restricted to the members read here.
#[allow(dead_code)] // kernel layout
#[repr(C)]
#[derive(Clone, Copy)]
union IwreqData {
    name: [c_char; IFNAMSIZ],
    essid: IwPoint,
    bitrate: IwParam,
    ap_addr: sockaddr,
    data: IwPoint,
}

/// `struct iwreq`
#[repr(C)]
struct Iwreq {
    ifr_name: [c_char; IFNAMSIZ],
    u: IwreqData,
}

/// `struct iw_quality`
#[allow(dead_code)] // kernel layout
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct IwQuality {
    qual: u8,
    level: u8,
    noise: u8,
    updated: u8,
}

/// Leading fields of `struct iw_range`, up to `max_qual`.
#[allow(dead_code)] // kernel layout
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct IwRangeHead {
    throughput: u32,
    min_nwid: u32,
    max_nwid: u32,
    old_num_channels: u16,
    old_num_frequency: u8,
    scan_capa: u8,
    event_capa: [u32; 6],
    sensitivity: i32,
    max_qual: IwQuality,
}

#[repr(C, align(8))]
struct RangeBuf([u8; IW_RANGE_BUF_LEN]);

// ============================================================================
// Device
// ============================================================================

/// Linux wireless device handle.
pub struct Device {
    interface: String,
    socket: OwnedFd,
    wireless: File,
    /// Row read by the last carrier check.
    row: Option<WirelessRow>,
    /// Resolved link maximum, queried once per handle.
    max_quality: Option<f64>,
}

impl Device {
    fn request(&self) -> Iwreq {
        // SAFETY: Iwreq is plain data; all-zero is valid for every member.
        let mut req: Iwreq = unsafe { mem::zeroed() };
        copy_ifname(&mut req.ifr_name, &self.interface);
        req
    }

    fn wext(&self, request: c_ulong, req: &mut Iwreq) -> io::Result<()> {
        // SAFETY: every WEXT get request takes a struct iwreq; callers set
        // any embedded iw_point to a buffer of the declared length.
        unsafe { ioctl(self.socket.as_fd(), request, req) }
    }

    fn wext_failed(&self, request: &'static str, err: &io::Error) -> StepError {
        debug!(
            interface = %self.interface,
            request,
            errno = errno_of(err),
            "wireless extension request failed"
        );
        StepError::NoSuchDevice
    }

    fn read_row(&mut self) -> StepResult<WirelessRow> {
        let mut content = String::new();
        let read = self
            .wireless
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.wireless.read_to_string(&mut content));
        if let Err(e) = read {
            debug!(interface = %self.interface, error = %e, "failed to read {PROC_NET_WIRELESS}");
            return Err(StepError::NoSuchDevice);
        }

        parse_wireless_row(&content, &self.interface).ok_or_else(|| {
            debug!(interface = %self.interface, "no row in {PROC_NET_WIRELESS}");
            StepError::NoSuchDevice
        })
    }

    fn link_max(&mut self) -> f64 {
        if let Some(max) = self.max_quality {
            return max;
        }

        let mut buf = Box::new(RangeBuf([0; IW_RANGE_BUF_LEN]));
        let mut req = self.request();
        req.u.data = IwPoint {
            pointer: buf.0.as_mut_ptr().cast(),
            length: IW_RANGE_BUF_LEN as u16,
            flags: 0,
        };

        let reported = match self.wext(SIOCGIWRANGE, &mut req) {
            Ok(()) => {
                // SAFETY: buf is larger than IwRangeHead and fully initialized.
                let head: IwRangeHead = unsafe { ptr::read_unaligned(buf.0.as_ptr().cast()) };
                Some(f64::from(head.max_qual.qual))
            }
            Err(e) => {
                debug!(interface = %self.interface, errno = errno_of(&e), "SIOCGIWRANGE failed");
                None
            }
        };

        let max = resolve_max_quality(reported);
        self.max_quality = Some(max);
        max
    }

    fn driver_name(&self) -> Option<String> {
        let link = fs::read_link(format!("/sys/class/net/{}/device/driver", self.interface)).ok()?;
        link.file_name()?.to_str().map(str::to_string)
    }
}

impl WirelessBackend for Device {
    fn open_channel(interface: &InterfaceName) -> io::Result<Self> {
        let wireless = File::open(PROC_NET_WIRELESS)?;
        let socket = datagram_socket()?;

        Ok(Self {
            interface: interface.to_string(),
            socket,
            wireless,
            row: None,
            max_quality: None,
        })
    }

    fn interface(&self) -> &str {
        &self.interface
    }

    fn quality_unit(&self) -> QualityUnit {
        QualityUnit::Percent
    }

    fn vendor(&mut self) -> Option<StepResult<String>> {
        Some(Ok(self
            .driver_name()
            .unwrap_or_else(|| UNKNOWN_VENDOR.to_string())))
    }

    fn carrier(&mut self) -> StepResult<()> {
        let row = self.read_row()?;
        self.row = Some(row);

        let mut req = self.request();
        let ap = match self.wext(SIOCGIWAP, &mut req) {
            Ok(()) => {
                // SAFETY: SIOCGIWAP fills ap_addr.
                let sa_data = unsafe { req.u.ap_addr.sa_data };
                let mut bssid = [0u8; 6];
                for (dst, &src) in bssid.iter_mut().zip(sa_data.iter()) {
                    *dst = src as u8;
                }
                ApLookup::Address(bssid)
            }
            Err(e) if errno_of(&e) == ENODEV => {
                self.wext_failed("SIOCGIWAP", &e);
                ApLookup::NoDevice
            }
            Err(e) => {
                debug!(interface = %self.interface, errno = errno_of(&e), "SIOCGIWAP unavailable");
                ApLookup::Unavailable
            }
        };
        wext_carrier(ap, row.link)
    }

    fn netname(&mut self) -> StepResult<String> {
        let mut buf = [0u8; IW_ESSID_MAX_SIZE + 1];
        let mut req = self.request();
        req.u.essid = IwPoint {
            pointer: buf.as_mut_ptr().cast(),
            length: buf.len() as u16,
            flags: 0,
        };

        self.wext(SIOCGIWESSID, &mut req)
            .map_err(|e| self.wext_failed("SIOCGIWESSID", &e))?;

        // SAFETY: SIOCGIWESSID writes back the SSID length in essid.
        let len = unsafe { req.u.essid.length };
        Ok(ssid_from_bytes(&buf, usize::from(len)))
    }

    fn quality(&mut self) -> StepResult<i32> {
        let row = match self.row.take() {
            Some(row) => row,
            None => self.read_row()?,
        };
        let max = self.link_max();
        Ok(log_quality(row.link, max))
    }

    fn rate(&mut self) -> StepResult<i32> {
        let mut req = self.request();
        self.wext(SIOCGIWRATE, &mut req)
            .map_err(|e| self.wext_failed("SIOCGIWRATE", &e))?;

        // SAFETY: SIOCGIWRATE fills bitrate (b/s).
        let bps = unsafe { req.u.bitrate.value };
        Ok(bps / 1_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_iwreq_layout() {
        assert_eq!(mem::size_of::<IwreqData>(), 16);
        assert_eq!(mem::size_of::<Iwreq>(), 32);
        assert_eq!(mem::offset_of!(IwPoint, length), 8);
    }

    #[test]
    fn test_iw_range_max_qual_offset() {
        assert_eq!(mem::offset_of!(IwRangeHead, max_qual), 44);
        assert!(mem::size_of::<IwRangeHead>() <= IW_RANGE_BUF_LEN);
    }

    #[test]
    fn test_open_and_close() {
        let device = match Device::open("wavelan-test0") {
            Ok(device) => device,
            Err(e) => {
                eprintln!("SKIP: {PROC_NET_WIRELESS} unavailable: {e}");
                return;
            }
        };
        assert_eq!(device.interface(), "wavelan-test0");
        device.close();
    }

    #[test]
    fn test_query_missing_interface_is_no_such_device() {
        let mut device = match Device::open("wavelan-test0") {
            Ok(device) => device,
            Err(e) => {
                eprintln!("SKIP: {PROC_NET_WIRELESS} unavailable: {e}");
                return;
            }
        };
        let err = device.query().unwrap_err();
        assert_eq!(err.error_code(), wavelan_core::ErrorCode::NoSuchDevice);
    }
}
