//! NetBSD implementation using the legacy WaveLAN (wi) record API
//!
//! Every statistic is one `SIOCGWAVELAN` record read:
//! - `WI_RID_STA_IDENTITY` - vendor
//! - `WI_RID_CURRENT_SSID` - SSID
//! - `WI_RID_COMMS_QUALITY` - quality word (signal word on Atheros), log scale
//! - `WI_RID_CUR_TX_RATE` - rate
//!
//! Carrier comes from `SIOCGIFMEDIA`.

use std::io;
use std::mem;
use std::os::fd::{AsFd, OwnedFd};

use libc::{c_char, c_ulong, c_void, IFNAMSIZ};
use tracing::debug;
use wavelan_core::{log_quality, QualityUnit, DEFAULT_MAX_QUALITY, UNKNOWN_VENDOR};

use crate::backend::{InterfaceName, StepError, StepResult, WirelessBackend};
use crate::decode::{is_atheros, wi_identity_vendor, wi_ssid};
use crate::ioccom::iowr;
use crate::media;
use crate::sys::{copy_ifname, datagram_socket, errno_of, ioctl};

// ============================================================================
// wi FFI Bindings
// ============================================================================

// Record ids from <dev/ic/wi_ieee.h>
const WI_RID_STA_IDENTITY: u16 = 0xFD20;
const WI_RID_CURRENT_SSID: u16 = 0xFC02;
const WI_RID_COMMS_QUALITY: u16 = 0xFD43;
const WI_RID_CUR_TX_RATE: u16 = 0xFD44;

/// Record payload capacity, in 16-bit words.
const WI_MAX_DATALEN: usize = 512;

/// `struct wi_req`
#[allow(dead_code)] // kernel layout
#[repr(C)]
struct WiReq {
    wi_len: u16,
    wi_type: u16,
    wi_val: [u16; WI_MAX_DATALEN],
}

impl WiReq {
    fn new(rid: u16) -> Self {
        Self {
            wi_len: WI_MAX_DATALEN as u16,
            wi_type: rid,
            wi_val: [0; WI_MAX_DATALEN],
        }
    }

    /// Payload words the driver filled in.
    fn words(&self) -> &[u16] {
        &self.wi_val[..usize::from(self.wi_len).min(WI_MAX_DATALEN)]
    }
}

/// `union ifreq.ifr_ifru`, sized by its `sockaddr_storage` member.
#[allow(dead_code)] // kernel layout
#[repr(C)]
union IfrIfru {
    ifru_data: *mut c_void,
    ifru_space: [u64; 16],
}

/// `struct ifreq`
#[repr(C)]
struct IfReq {
    ifr_name: [c_char; IFNAMSIZ],
    ifr_ifru: IfrIfru,
}

const SIOCGWAVELAN: c_ulong = iowr(b'i', 250, mem::size_of::<IfReq>());

// ============================================================================
// Device
// ============================================================================

/// NetBSD wireless device handle.
pub struct Device {
    interface: String,
    socket: OwnedFd,
}

impl Device {
    fn getval(&self, rid: u16) -> StepResult<WiReq> {
        let mut wr = WiReq::new(rid);
        let mut ifr = IfReq {
            ifr_name: [0; IFNAMSIZ],
            ifr_ifru: IfrIfru {
                ifru_data: (&mut wr as *mut WiReq).cast(),
            },
        };
        copy_ifname(&mut ifr.ifr_name, &self.interface);

        // SAFETY: SIOCGWAVELAN takes a struct ifreq whose ifr_data points to
        // a struct wi_req; wr outlives the call.
        match unsafe { ioctl(self.socket.as_fd(), SIOCGWAVELAN, &mut ifr) } {
            Ok(()) => Ok(wr),
            Err(e) => {
                debug!(
                    interface = %self.interface,
                    rid = format_args!("{rid:#06x}"),
                    errno = errno_of(&e),
                    "SIOCGWAVELAN failed"
                );
                Err(StepError::NoSuchDevice)
            }
        }
    }

    fn first_word(&self, rid: u16, index: usize) -> StepResult<i32> {
        let wr = self.getval(rid)?;
        Ok(i32::from(u16::from_le(wr.wi_val[index])))
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

    fn vendor(&mut self) -> Option<StepResult<String>> {
        let result = match self.getval(WI_RID_STA_IDENTITY) {
            // Atheros wi emulation has no identity record.
            Err(_) if is_atheros(&self.interface) => Ok(UNKNOWN_VENDOR.to_string()),
            Err(e) => Err(e),
            Ok(wr) => wi_identity_vendor(wr.words()).ok_or(StepError::NoSuchDevice),
        };
        Some(result)
    }

    fn carrier(&mut self) -> StepResult<()> {
        media::carrier(self.socket.as_fd(), &self.interface)
    }

    fn netname(&mut self) -> StepResult<String> {
        let wr = self.getval(WI_RID_CURRENT_SSID)?;
        Ok(wi_ssid(&wr.wi_val))
    }

    fn quality(&mut self) -> StepResult<i32> {
        let index = if is_atheros(&self.interface) { 1 } else { 0 };
        let link = self.first_word(WI_RID_COMMS_QUALITY, index)?;
        Ok(log_quality(f64::from(link), DEFAULT_MAX_QUALITY))
    }

    fn rate(&mut self) -> StepResult<i32> {
        self.first_word(WI_RID_CUR_TX_RATE, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_request_layout() {
        assert_eq!(mem::size_of::<IfReq>(), 144);
        assert_eq!(mem::size_of::<WiReq>(), 4 + 2 * WI_MAX_DATALEN);
    }

    #[test]
    fn test_words_bounded_by_capacity() {
        let mut wr = WiReq::new(WI_RID_STA_IDENTITY);
        assert_eq!(wr.words().len(), WI_MAX_DATALEN);
        wr.wi_len = 4;
        assert_eq!(wr.words().len(), 4);
    }

    #[test]
    fn test_query_missing_interface_is_no_such_device() {
        let mut device = Device::open("wi99").expect("socket channel");
        let err = device.query().unwrap_err();
        assert_eq!(err.error_code(), wavelan_core::ErrorCode::NoSuchDevice);
    }
}
