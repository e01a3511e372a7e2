//! FreeBSD implementation using net80211 ioctls
//!
//! Uses the following APIs:
//! - `sysctl net.wlan.N.%parent` / `dev.<driver>.<unit>.%desc` - vendor
//! - `SIOCGIFMEDIA` - carrier
//! - `SIOCG80211` with `IEEE80211_IOC_SSID` - current SSID
//! - `SIOCG80211` with `IEEE80211_IOC_BSSID` + `IEEE80211_IOC_SCAN_RESULTS` -
//!   RSSI, noise floor and rates of the associated BSS
//!
//! Quality is left in dBm (`rssi * 2 + noise`).

use std::io;
use std::mem;
use std::os::fd::{AsFd, OwnedFd};

use libc::{c_char, c_ulong, c_void, IFNAMSIZ};
use tracing::debug;
use wavelan_core::{scan_quality, QualityUnit, UNKNOWN_VENDOR};

use crate::backend::{InterfaceName, StepError, StepResult, WirelessBackend};
use crate::decode::{
    parse_scan_results, select_scan_entry, split_driver_unit, ssid_from_bytes, ScanEntry,
    SSID_MAX_LEN,
};
use crate::ioccom::iowr;
use crate::media;
use crate::sys::{copy_ifname, datagram_socket, errno_of, ioctl, sysctl_string};

// ============================================================================
// net80211 FFI Bindings
// ============================================================================

// Request types from <net80211/ieee80211_ioctl.h>
const IEEE80211_IOC_SSID: u16 = 1;
const IEEE80211_IOC_BSSID: u16 = 12;
const IEEE80211_IOC_SCAN_RESULTS: u16 = 98;

const IEEE80211_ADDR_LEN: usize = 6;

/// Scan result buffer size, as ifconfig(8) uses.
const SCAN_BUF_LEN: usize = 24 * 1024;

/// `struct ieee80211req`
#[allow(dead_code)] // kernel layout
#[repr(C)]
struct Ieee80211Req {
    i_name: [c_char; IFNAMSIZ],
    i_type: u16,
    i_val: i16,
    i_len: u16,
    i_data: *mut c_void,
}

const SIOCG80211: c_ulong = iowr(b'i', 235, mem::size_of::<Ieee80211Req>());

// ============================================================================
// Device
// ============================================================================

/// FreeBSD wireless device handle.
pub struct Device {
    interface: String,
    socket: OwnedFd,
    /// Scan entry found by the quality step, consumed by the rate step.
    bss: Option<ScanEntry>,
}

impl Device {
    /// Issue `SIOCG80211` for `i_type` into `buf`; returns the filled length.
    fn get(&self, i_type: u16, buf: &mut [u8]) -> StepResult<usize> {
        let mut req = Ieee80211Req {
            i_name: [0; IFNAMSIZ],
            i_type,
            i_val: 0,
            i_len: u16::try_from(buf.len()).unwrap_or(u16::MAX),
            i_data: buf.as_mut_ptr().cast(),
        };
        copy_ifname(&mut req.i_name, &self.interface);

        // SAFETY: SIOCG80211 takes a struct ieee80211req whose i_data points
        // to i_len writable bytes.
        match unsafe { ioctl(self.socket.as_fd(), SIOCG80211, &mut req) } {
            Ok(()) => Ok(usize::from(req.i_len).min(buf.len())),
            Err(e) => {
                debug!(
                    interface = %self.interface,
                    i_type,
                    errno = errno_of(&e),
                    "SIOCG80211 failed"
                );
                Err(StepError::NoSuchDevice)
            }
        }
    }

    fn bssid(&self) -> StepResult<[u8; IEEE80211_ADDR_LEN]> {
        let mut bssid = [0u8; IEEE80211_ADDR_LEN];
        self.get(IEEE80211_IOC_BSSID, &mut bssid)?;
        Ok(bssid)
    }

    fn associated_bss(&mut self) -> StepResult<ScanEntry> {
        if let Some(entry) = self.bss.take() {
            return Ok(entry);
        }

        let bssid = self.bssid()?;
        let ssid = self.netname()?;
        let mut buf = vec![0u8; SCAN_BUF_LEN];
        let len = self.get(IEEE80211_IOC_SCAN_RESULTS, &mut buf)?;
        let entries = parse_scan_results(&buf[..len]);

        match select_scan_entry(&entries, &bssid, &ssid) {
            Some(entry) => Ok(entry.clone()),
            None => {
                debug!(
                    interface = %self.interface,
                    entries = entries.len(),
                    "associated BSS not in scan results"
                );
                Err(StepError::NoSuchDevice)
            }
        }
    }
}

impl WirelessBackend for Device {
    fn open_channel(interface: &InterfaceName) -> io::Result<Self> {
        Ok(Self {
            interface: interface.to_string(),
            socket: datagram_socket()?,
            bss: None,
        })
    }

    fn interface(&self) -> &str {
        &self.interface
    }

    fn quality_unit(&self) -> QualityUnit {
        QualityUnit::Dbm
    }

    /// Description of the parent device of a `wlanN` clone.
    ///
    /// A `wlanN` interface without a parent does not exist. Other names are
    /// not clones and report "Unknown".
    fn vendor(&mut self) -> Option<StepResult<String>> {
        let Some(("wlan", unit)) = split_driver_unit(&self.interface) else {
            return Some(Ok(UNKNOWN_VENDOR.to_string()));
        };

        let parent = match sysctl_string(&format!("net.wlan.{unit}.%parent")) {
            Ok(parent) if !parent.is_empty() => parent,
            Ok(_) => return Some(Err(StepError::NoSuchDevice)),
            Err(e) => {
                debug!(interface = %self.interface, error = %e, "no parent for wlan clone");
                return Some(Err(StepError::NoSuchDevice));
            }
        };

        let desc = split_driver_unit(&parent)
            .and_then(|(driver, unit)| sysctl_string(&format!("dev.{driver}.{unit}.%desc")).ok())
            .filter(|desc| !desc.is_empty());

        Some(Ok(desc.unwrap_or(parent)))
    }

    fn carrier(&mut self) -> StepResult<()> {
        self.bss = None;
        media::carrier(self.socket.as_fd(), &self.interface)
    }

    fn netname(&mut self) -> StepResult<String> {
        let mut buf = [0u8; SSID_MAX_LEN];
        let len = self.get(IEEE80211_IOC_SSID, &mut buf)?;
        Ok(ssid_from_bytes(&buf, len))
    }

    fn quality(&mut self) -> StepResult<i32> {
        let entry = self.associated_bss()?;
        let quality = scan_quality(entry.rssi, entry.noise);
        self.bss = Some(entry);
        Ok(quality)
    }

    fn rate(&mut self) -> StepResult<i32> {
        Ok(self.associated_bss()?.max_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_request_layout() {
        assert_eq!(mem::size_of::<Ieee80211Req>(), 32);
        assert_eq!(SIOCG80211, 0xc020_69eb);
    }

    #[test]
    fn test_request_types() {
        assert_eq!(IEEE80211_IOC_SSID, 1);
        assert_eq!(IEEE80211_IOC_BSSID, 12);
        // 97 and 99 are the scan request and cancel.
        assert_eq!(IEEE80211_IOC_SCAN_RESULTS, 98);
    }

    #[test]
    fn test_query_missing_interface_is_no_such_device() {
        let mut device = Device::open("wlan99").expect("socket channel");
        let err = device.query().unwrap_err();
        assert_eq!(err.error_code(), wavelan_core::ErrorCode::NoSuchDevice);
    }

    #[test]
    fn test_non_clone_vendor_is_unknown() {
        let mut device = Device::open("em0").expect("socket channel");
        assert_eq!(device.vendor(), Some(Ok(UNKNOWN_VENDOR.to_string())));
    }
}
