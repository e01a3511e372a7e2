//! Pure decoders for kernel responses.
//!
//! Everything here operates on plain bytes and numbers so it can be tested
//! on any host, independent of which backend is compiled in.

use std::mem;
use std::ptr;

use wavelan_core::{dbm_to_percent, ratio_to_percent};

use crate::backend::{StepError, StepResult};

/// Mask selecting the rate value (in 500 kb/s units) from an 802.11 rate byte.
pub const RATE_VALUE_MASK: u8 = 0x7f;

/// Maximum SSID length in bytes.
pub const SSID_MAX_LEN: usize = 32;

/// Decode a C string buffer: stop at the first NUL, replace invalid UTF-8.
pub fn c_bytes_to_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Decode an SSID of `len` bytes, clamped to the buffer and to 32 bytes.
pub fn ssid_from_bytes(buf: &[u8], len: usize) -> String {
    let len = len.min(buf.len()).min(SSID_MAX_LEN);
    c_bytes_to_string(&buf[..len])
}

/// Convert an 802.11 rate byte to Mb/s.
pub fn rate_byte_to_mbps(rate: u8) -> i32 {
    i32::from(rate & RATE_VALUE_MASK) / 2
}

// ============================================================================
// Linux: /proc/net/wireless
// ============================================================================

/// One interface row of `/proc/net/wireless`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WirelessRow {
    /// Status word (hex).
    pub status: u32,
    /// Link quality, driver units.
    pub link: f64,
    /// Signal level (dBm on modern drivers).
    pub level: f64,
    /// Noise level.
    pub noise: f64,
}

/// Find the row for `interface` in the contents of `/proc/net/wireless`.
///
/// Format (two header lines, then one row per interface):
///
/// ```text
/// Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
///  face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
///  wlan0: 0000   70.  -40.  -256        0      0      0      0      0        0
/// ```
pub fn parse_wireless_row(content: &str, interface: &str) -> Option<WirelessRow> {
    content.lines().find_map(|line| {
        let (name, rest) = line.split_once(':')?;
        if name.trim() != interface {
            return None;
        }

        let mut fields = rest.split_whitespace();
        let status = u32::from_str_radix(fields.next()?, 16).unwrap_or(0);
        let link = parse_proc_number(fields.next()?)?;
        let level = parse_proc_number(fields.next()?)?;
        let noise = fields.next().and_then(parse_proc_number).unwrap_or(0.0);

        Some(WirelessRow {
            status,
            link,
            level,
            noise,
        })
    })
}

/// Parse a `/proc/net/wireless` number; values carry a trailing `.` when the
/// driver updated them since the last read.
fn parse_proc_number(field: &str) -> Option<f64> {
    field.trim_end_matches('.').parse().ok()
}

/// True if a `SIOCGIWAP` address means "not associated".
///
/// Drivers report all zeros, all ones, or the `44:44:44:44:44:44` marker.
pub fn is_unassociated_bssid(addr: &[u8; 6]) -> bool {
    addr.iter().all(|&b| b == 0x00)
        || addr.iter().all(|&b| b == 0xff)
        || addr.iter().all(|&b| b == 0x44)
}

/// Result of a `SIOCGIWAP` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApLookup {
    /// The driver answered with this access point address.
    Address([u8; 6]),
    /// The request failed with `ENODEV`.
    NoDevice,
    /// The driver does not implement the request.
    Unavailable,
}

/// Decide WEXT carrier state.
///
/// The access point address wins when the driver reports one; otherwise the
/// `/proc/net/wireless` link column decides, with `link <= 0` meaning no
/// carrier.
pub fn wext_carrier(ap: ApLookup, link: f64) -> StepResult<()> {
    match ap {
        ApLookup::Address(bssid) if is_unassociated_bssid(&bssid) => Err(StepError::NoCarrier),
        ApLookup::Address(_) => Ok(()),
        ApLookup::NoDevice => Err(StepError::NoSuchDevice),
        ApLookup::Unavailable if link <= 0.0 => Err(StepError::NoCarrier),
        ApLookup::Unavailable => Ok(()),
    }
}

// ============================================================================
// Legacy wi API (SIOCGWAVELAN)
// ============================================================================

/// Decode a `WI_RID_STA_IDENTITY` response.
///
/// Words are `[id, vendor, major, minor]`. Fewer than four words is a
/// malformed response.
pub fn wi_identity_vendor(words: &[u16]) -> Option<String> {
    if words.len() < 4 {
        return None;
    }
    let vendor = match words[1] {
        1 => "Lucent",
        2 => "generic PRISM II",
        3 => "Samsung",
        6 => "D-Link",
        _ => "Unknown",
    };
    Some(format!(
        "{} (ID {}, version {}.{})",
        vendor, words[0], words[2], words[3]
    ))
}

/// Decode a `WI_RID_CURRENT_SSID` response: a little-endian length word
/// followed by the SSID bytes packed into words.
pub fn wi_ssid(words: &[u16]) -> String {
    let Some((&len, data)) = words.split_first() else {
        return String::new();
    };
    let bytes: Vec<u8> = data.iter().flat_map(|w| w.to_ne_bytes()).collect();
    ssid_from_bytes(&bytes, usize::from(u16::from_le(len)))
}

/// True for Atheros interfaces, whose wi emulation lacks the identity record
/// and reports quality in the signal word.
pub fn is_atheros(interface: &str) -> bool {
    interface.starts_with("ath")
}

/// Split a BSD device name into driver and unit ("iwn0" -> ("iwn", "0")).
pub fn split_driver_unit(name: &str) -> Option<(&str, &str)> {
    let driver = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if driver.is_empty() || driver.len() == name.len() {
        return None;
    }
    Some((driver, &name[driver.len()..]))
}

// ============================================================================
// FreeBSD: IEEE80211_IOC_SCAN_RESULTS
// ============================================================================

/// Fixed header of one `ieee80211req_scan_result` entry.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanResultHeader {
    pub isr_len: u16,
    pub isr_ie_off: u16,
    pub isr_ie_len: u16,
    pub isr_freq: u16,
    pub isr_flags: u16,
    pub isr_noise: i8,
    pub isr_rssi: i8,
    pub isr_intval: u16,
    pub isr_capinfo: u16,
    pub isr_erp: u8,
    pub isr_bssid: [u8; 6],
    pub isr_nrates: u8,
    pub isr_rates: [u8; 15],
    pub isr_ssid_len: u8,
    pub isr_meshid_len: u8,
}

/// One decoded scan result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub bssid: [u8; 6],
    pub ssid: String,
    pub rssi: i8,
    pub noise: i8,
    pub rates: Vec<u8>,
}

impl ScanEntry {
    /// Highest advertised rate in Mb/s.
    pub fn max_rate(&self) -> i32 {
        self.rates
            .iter()
            .map(|&r| rate_byte_to_mbps(r))
            .max()
            .unwrap_or(0)
    }
}

/// Walk a scan results buffer of `len` valid bytes.
///
/// Stops at the first entry whose length is zero or runs past the buffer.
pub fn parse_scan_results(buf: &[u8]) -> Vec<ScanEntry> {
    let header_len = mem::size_of::<ScanResultHeader>();
    let mut entries = Vec::new();
    let mut offset = 0usize;

    while buf.len().saturating_sub(offset) >= header_len {
        // SAFETY: bounds checked above; read_unaligned tolerates any alignment.
        let header: ScanResultHeader =
            unsafe { ptr::read_unaligned(buf[offset..].as_ptr() as *const ScanResultHeader) };

        let entry_len = usize::from(header.isr_len);
        if entry_len == 0 || offset + entry_len > buf.len() {
            break;
        }

        // isr_ie_off points at the SSID; mesh id and IEs follow it.
        let ssid_start = offset + usize::from(header.isr_ie_off);
        let ssid_end = ssid_start + usize::from(header.isr_ssid_len);
        let ssid = if ssid_end <= offset + entry_len {
            ssid_from_bytes(&buf[ssid_start..ssid_end], usize::from(header.isr_ssid_len))
        } else {
            String::new()
        };

        let nrates = usize::from(header.isr_nrates).min(header.isr_rates.len());
        entries.push(ScanEntry {
            bssid: header.isr_bssid,
            ssid,
            rssi: header.isr_rssi,
            noise: header.isr_noise,
            rates: header.isr_rates[..nrates].to_vec(),
        });

        offset += entry_len;
    }

    entries
}

/// Pick the entry for the current association.
///
/// Matches on BSSID first, then on SSID for drivers that report an empty
/// BSSID.
pub fn select_scan_entry<'a>(
    entries: &'a [ScanEntry],
    bssid: &[u8; 6],
    ssid: &str,
) -> Option<&'a ScanEntry> {
    entries
        .iter()
        .find(|e| &e.bssid == bssid)
        .or_else(|| entries.iter().find(|e| !ssid.is_empty() && e.ssid == ssid))
}

// ============================================================================
// OpenBSD: SIOCG80211NODE
// ============================================================================

/// Quality of an OpenBSD node as a percentage.
///
/// Uses `rssi / max_rssi` when the driver reports a maximum, otherwise
/// treats `rssi` as dBm.
pub fn node_quality(rssi: i8, max_rssi: i8) -> i32 {
    ratio_to_percent(i32::from(rssi), i32::from(max_rssi))
        .unwrap_or_else(|| dbm_to_percent(i32::from(rssi)))
}

/// Transmit rate of an OpenBSD node in Mb/s.
pub fn node_rate(rates: &[u8], nrates: u8, txrate: u8) -> i32 {
    let nrates = usize::from(nrates).min(rates.len());
    rates[..nrates]
        .get(usize::from(txrate))
        .map(|&r| rate_byte_to_mbps(r))
        .unwrap_or(0)
}
