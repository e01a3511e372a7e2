//! macOS implementation using the apple80211 ioctl family
//!
//! Uses the following APIs:
//! - `SIOCGIFMEDIA` - carrier
//! - `SIOCGA80211` with `APPLE80211_IOC_SSID` - current SSID
//! - `SIOCGA80211` with `APPLE80211_IOC_RSSI` - aggregate RSSI (dBm)
//! - `SIOCGA80211` with `APPLE80211_IOC_RATE` - link rate (Mb/s)
//!
//! The hardware vendor is not exposed; it stays "Unknown". Outside macOS
//! proper the apple80211 requests need the `com.apple.wlan.authentication`
//! entitlement and fail with `NoSuchDevice` otherwise.

use std::io;
use std::mem;
use std::os::fd::{AsFd, OwnedFd};
use std::ptr;

use libc::{c_char, c_ulong, c_void, IFNAMSIZ};
use tracing::debug;
use wavelan_core::{dbm_to_percent, QualityUnit};

use crate::backend::{InterfaceName, StepError, StepResult, WirelessBackend};
use crate::decode::c_bytes_to_string;
use crate::ioccom::iowr;
use crate::media;
use crate::sys::{copy_ifname, datagram_socket, errno_of, ioctl};

// ============================================================================
// apple80211 FFI Bindings
// ============================================================================

const APPLE80211_IOC_SSID: u32 = 1;
const APPLE80211_IOC_RATE: u32 = 8;
const APPLE80211_IOC_RSSI: u32 = 16;

const APPLE80211_MAX_RADIO: usize = 4;
const APPLE80211_MAX_SSID_LEN: usize = 32;

/// `struct apple80211req`
#[allow(dead_code)] // kernel layout
#[repr(C)]
struct Apple80211Req {
    if_name: [c_char; IFNAMSIZ],
    req_type: u32,
    result: u32,
    len: u64,
    data: *mut c_void,
}

/// `struct apple80211_rssi_data`
#[allow(dead_code)] // kernel layout
#[repr(C)]
#[derive(Default)]
struct Apple80211RssiData {
    version: u32,
    num_radios: u32,
    rssi_unit: u32,
    rssi: [i32; APPLE80211_MAX_RADIO],
    aggregate_rssi: i32,
    rssi_ext: [i32; APPLE80211_MAX_RADIO],
    aggregate_rssi_ext: i32,
}

const SIOCGA80211: c_ulong = iowr(b'i', 201, mem::size_of::<Apple80211Req>());

// ============================================================================
// Device
// ============================================================================

/// macOS wireless device handle.
pub struct Device {
    interface: String,
    socket: OwnedFd,
}

impl Device {
    fn get(&self, req_type: u32, len: usize, data: *mut c_void) -> StepResult<Apple80211Req> {
        let mut req = Apple80211Req {
            if_name: [0; IFNAMSIZ],
            req_type,
            result: 0,
            len: len as u64,
            data,
        };
        copy_ifname(&mut req.if_name, &self.interface);

        // SAFETY: SIOCGA80211 takes a struct apple80211req; data points to
        // a caller-owned buffer of at least len bytes, or is null with len 0.
        match unsafe { ioctl(self.socket.as_fd(), SIOCGA80211, &mut req) } {
            Ok(()) => Ok(req),
            Err(e) => {
                debug!(
                    interface = %self.interface,
                    req_type,
                    errno = errno_of(&e),
                    "SIOCGA80211 failed"
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
        })
    }

    fn interface(&self) -> &str {
        &self.interface
    }

    fn quality_unit(&self) -> QualityUnit {
        QualityUnit::Percent
    }

    fn carrier(&mut self) -> StepResult<()> {
        media::carrier(self.socket.as_fd(), &self.interface)
    }

    fn netname(&mut self) -> StepResult<String> {
        let mut buf = [0u8; APPLE80211_MAX_SSID_LEN + 1];
        self.get(
            APPLE80211_IOC_SSID,
            APPLE80211_MAX_SSID_LEN,
            buf.as_mut_ptr().cast(),
        )?;
        Ok(c_bytes_to_string(&buf))
    }

    fn quality(&mut self) -> StepResult<i32> {
        let mut rssi = Apple80211RssiData::default();
        self.get(
            APPLE80211_IOC_RSSI,
            mem::size_of::<Apple80211RssiData>(),
            ptr::addr_of_mut!(rssi).cast(),
        )?;
        // Aggregate across radios, in dBm.
        Ok(dbm_to_percent(rssi.aggregate_rssi))
    }

    fn rate(&mut self) -> StepResult<i32> {
        let req = self.get(APPLE80211_IOC_RATE, 0, ptr::null_mut())?;
        Ok(i32::try_from(req.result).unwrap_or(i32::MAX))
    }
}
