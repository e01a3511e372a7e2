//! OpenBSD implementation using net80211 node requests
//!
//! Uses the following APIs:
//! - `SIOCGIFMEDIA` - carrier (64-bit media words)
//! - `SIOCG80211NWID` - current SSID
//! - `SIOCG80211BSSID` + `SIOCG80211NODE` - RSSI and rate set of the
//!   associated access point
//!
//! The hardware vendor is not exposed; it stays "Unknown".

use std::io;
use std::mem;
use std::os::fd::{AsFd, OwnedFd};

use libc::{c_char, c_uint, c_ulong, c_void, IFNAMSIZ};
use tracing::debug;
use wavelan_core::QualityUnit;

use crate::backend::{InterfaceName, StepError, StepResult, WirelessBackend};
use crate::decode::{node_quality, node_rate, ssid_from_bytes, SSID_MAX_LEN};
use crate::ioccom::iowr;
use crate::media;
use crate::sys::{copy_ifname, datagram_socket, errno_of, ioctl};

// ============================================================================
// net80211 FFI Bindings
// ============================================================================

const IEEE80211_ADDR_LEN: usize = 6;
const IEEE80211_RATE_MAXSIZE: usize = 15;

/// `struct ieee80211_nwid`
#[repr(C)]
struct Ieee80211Nwid {
    i_len: u8,
    i_nwid: [u8; SSID_MAX_LEN],
}

/// `struct ifreq`, only the `ifr_data` member of the union is used.
#[allow(dead_code)] // kernel layout
#[repr(C)]
struct IfReq {
    ifr_name: [c_char; IFNAMSIZ],
    ifr_data: *mut c_void,
    _pad: [u8; 16 - mem::size_of::<*mut c_void>()],
}

/// `struct ieee80211_bssid`
#[repr(C)]
struct Ieee80211Bssid {
    i_name: [c_char; IFNAMSIZ],
    i_bssid: [u8; IEEE80211_ADDR_LEN],
}

/// `struct ieee80211_nodereq`
///
/// The request number encodes `sizeof`, so every member is declared.
#[allow(dead_code)] // kernel layout
#[repr(C)]
#[derive(Clone, Copy)]
struct Ieee80211NodeReq {
    nr_ifname: [c_char; IFNAMSIZ],
    nr_macaddr: [u8; IEEE80211_ADDR_LEN],
    nr_bssid: [u8; IEEE80211_ADDR_LEN],
    nr_nwid_len: u8,
    nr_nwid: [u8; SSID_MAX_LEN],
    nr_channel: u16,
    nr_chan_flags: u16,
    nr_nrates: u8,
    nr_rates: [u8; IEEE80211_RATE_MAXSIZE],
    nr_rssi: i8,
    nr_max_rssi: i8,
    nr_tstamp: [u8; 8],
    nr_intval: u16,
    nr_capinfo: u16,
    nr_erp: u8,
    nr_pwrsave: u8,
    nr_associd: u16,
    nr_txseq: u16,
    nr_rxseq: u16,
    nr_fails: u32,
    nr_inact: u32,
    nr_txrate: u8,
    nr_state: u16,
    nr_rsnprotos: c_uint,
    nr_rsnciphers: c_uint,
    nr_rsnakms: c_uint,
    nr_flags: u8,
    nr_htcaps: u16,
    nr_rxmcs: [u8; 10],
    nr_max_rxrate: u16,
    nr_tx_mcs_set: u8,
    nr_txmcs: u8,
    nr_vht_ss: u8,
}

const SIOCG80211NWID: c_ulong = iowr(b'i', 231, mem::size_of::<IfReq>());
const SIOCG80211BSSID: c_ulong = iowr(b'i', 243, mem::size_of::<Ieee80211Bssid>());
const SIOCG80211NODE: c_ulong = iowr(b'i', 211, mem::size_of::<Ieee80211NodeReq>());

// ============================================================================
// Device
// ============================================================================

/// OpenBSD wireless device handle.
pub struct Device {
    interface: String,
    socket: OwnedFd,
    /// Node read by the quality step, consumed by the rate step.
    node: Option<Ieee80211NodeReq>,
}

impl Device {
    fn failed(&self, request: &'static str, err: &io::Error) -> StepError {
        debug!(
            interface = %self.interface,
            request,
            errno = errno_of(err),
            "net80211 request failed"
        );
        StepError::NoSuchDevice
    }

    fn bssid(&self) -> StepResult<[u8; IEEE80211_ADDR_LEN]> {
        let mut req = Ieee80211Bssid {
            i_name: [0; IFNAMSIZ],
            i_bssid: [0; IEEE80211_ADDR_LEN],
        };
        copy_ifname(&mut req.i_name, &self.interface);

        // SAFETY: SIOCG80211BSSID takes a struct ieee80211_bssid.
        unsafe { ioctl(self.socket.as_fd(), SIOCG80211BSSID, &mut req) }
            .map_err(|e| self.failed("SIOCG80211BSSID", &e))?;
        Ok(req.i_bssid)
    }

    fn node(&mut self) -> StepResult<Ieee80211NodeReq> {
        if let Some(node) = self.node.take() {
            return Ok(node);
        }

        let bssid = self.bssid()?;
        // SAFETY: all-zero is a valid nodereq.
        let mut req: Ieee80211NodeReq = unsafe { mem::zeroed() };
        copy_ifname(&mut req.nr_ifname, &self.interface);
        req.nr_macaddr = bssid;

        // SAFETY: SIOCG80211NODE takes a struct ieee80211_nodereq.
        unsafe { ioctl(self.socket.as_fd(), SIOCG80211NODE, &mut req) }
            .map_err(|e| self.failed("SIOCG80211NODE", &e))?;
        Ok(req)
    }
}

impl WirelessBackend for Device {
    fn open_channel(interface: &InterfaceName) -> io::Result<Self> {
        Ok(Self {
            interface: interface.to_string(),
            socket: datagram_socket()?,
            node: None,
        })
    }

    fn interface(&self) -> &str {
        &self.interface
    }

    fn quality_unit(&self) -> QualityUnit {
        QualityUnit::Percent
    }

    fn carrier(&mut self) -> StepResult<()> {
        self.node = None;
        media::carrier(self.socket.as_fd(), &self.interface)
    }

    fn netname(&mut self) -> StepResult<String> {
        let mut nwid = Ieee80211Nwid {
            i_len: 0,
            i_nwid: [0; SSID_MAX_LEN],
        };
        let mut ifr = IfReq {
            ifr_name: [0; IFNAMSIZ],
            ifr_data: (&mut nwid as *mut Ieee80211Nwid).cast(),
            _pad: [0; 16 - mem::size_of::<*mut c_void>()],
        };
        copy_ifname(&mut ifr.ifr_name, &self.interface);

        // SAFETY: SIOCG80211NWID takes a struct ifreq whose ifr_data points
        // to a struct ieee80211_nwid; nwid outlives the call.
        unsafe { ioctl(self.socket.as_fd(), SIOCG80211NWID, &mut ifr) }
            .map_err(|e| self.failed("SIOCG80211NWID", &e))?;
        Ok(ssid_from_bytes(&nwid.i_nwid, usize::from(nwid.i_len)))
    }

    fn quality(&mut self) -> StepResult<i32> {
        let node = self.node()?;
        self.node = Some(node);
        Ok(node_quality(node.nr_rssi, node.nr_max_rssi))
    }

    fn rate(&mut self) -> StepResult<i32> {
        let node = self.node()?;
        Ok(node_rate(&node.nr_rates, node.nr_nrates, node.nr_txrate))
    }
}
