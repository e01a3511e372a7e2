//! Carrier detection through `SIOCGIFMEDIA`, shared by the BSDs and Darwin.

use std::mem;
use std::os::fd::BorrowedFd;

#[cfg(target_os = "freebsd")]
use libc::ifmediareq as IfMediaReq;
use libc::{c_int, c_ulong};
#[cfg(not(target_os = "freebsd"))]
use libc::{c_char, IFNAMSIZ};
use tracing::debug;

use crate::backend::{StepError, StepResult};
use crate::ioccom::iowr;
use crate::sys::{copy_ifname, errno_of, ioctl};

#[cfg(target_os = "openbsd")]
type MediaWord = u64;
#[cfg(not(target_os = "openbsd"))]
type MediaWord = c_int;

/// Status word is valid.
const IFM_AVALID: MediaWord = 0x1;
/// Interface is associated / link up.
const IFM_ACTIVE: MediaWord = 0x2;

/// `struct ifmediareq` from `<net/if.h>`.
///
/// XNU declares it under `#pragma pack(4)`: 44 bytes on LP64.
#[cfg(not(target_os = "freebsd"))]
#[allow(dead_code)] // kernel layout
#[cfg_attr(target_os = "macos", repr(C, packed(4)))]
#[cfg_attr(not(target_os = "macos"), repr(C))]
struct IfMediaReq {
    ifm_name: [c_char; IFNAMSIZ],
    ifm_current: MediaWord,
    ifm_mask: MediaWord,
    ifm_status: MediaWord,
    ifm_active: MediaWord,
    ifm_count: c_int,
    ifm_ulist: *mut MediaWord,
}

#[cfg(any(target_os = "freebsd", target_os = "macos", target_os = "openbsd"))]
const SIOCGIFMEDIA_NUM: u8 = 56;
#[cfg(target_os = "netbsd")]
const SIOCGIFMEDIA_NUM: u8 = 54;

const SIOCGIFMEDIA: c_ulong = iowr(b'i', SIOCGIFMEDIA_NUM, mem::size_of::<IfMediaReq>());

/// Read the media status of `interface`.
///
/// - ioctl unsupported or failing → `NoSuchDevice`
/// - status not valid → `NoSuchDevice`
/// - valid but inactive → `NoCarrier`
pub(crate) fn carrier(socket: BorrowedFd<'_>, interface: &str) -> StepResult<()> {
    // SAFETY: all-zero is a valid IfMediaReq (null ulist, zero count).
    let mut req: IfMediaReq = unsafe { mem::zeroed() };
    copy_ifname(&mut req.ifm_name, interface);

    // SAFETY: SIOCGIFMEDIA takes a struct ifmediareq; ifm_count is zero so
    // the kernel does not write through ifm_ulist.
    if let Err(e) = unsafe { ioctl(socket, SIOCGIFMEDIA, &mut req) } {
        debug!(interface, errno = errno_of(&e), "SIOCGIFMEDIA failed");
        return Err(StepError::NoSuchDevice);
    }

    status_to_carrier(req.ifm_status)
}

fn status_to_carrier(status: MediaWord) -> StepResult<()> {
    if status & IFM_AVALID == 0 {
        return Err(StepError::NoSuchDevice);
    }
    if status & IFM_ACTIVE == 0 {
        return Err(StepError::NoCarrier);
    }
    Ok(())
}
