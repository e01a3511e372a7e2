//! BSD `<sys/ioccom.h>` request encoding.
//!
//! libc does not export the wireless requests, so they are built here the
//! way the C macros build them.

use std::ffi::c_ulong;

/// Copy parameters in and out.
const IOC_INOUT: u32 = 0xC000_0000;

/// Parameter length field width (13 bits).
const IOCPARM_MASK: u32 = 0x1fff;

/// `_IOWR(group, num, T)` with `len = size_of::<T>()`.
pub(crate) const fn iowr(group: u8, num: u8, len: usize) -> c_ulong {
    let request =
        IOC_INOUT | (((len as u32) & IOCPARM_MASK) << 16) | ((group as u32) << 8) | num as u32;
    request as c_ulong
}
