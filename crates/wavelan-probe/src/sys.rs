//! Thin libc wrappers shared by the Unix backends.

use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};

use libc::{c_char, c_int, c_ulong};

/// Open an `AF_INET` datagram socket used only as an ioctl channel.
///
/// The socket is never bound or connected.
pub(crate) fn datagram_socket() -> io::Result<OwnedFd> {
    #[cfg(not(target_os = "macos"))]
    let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, 0) };

    #[cfg(target_os = "macos")]
    let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0) };

    if fd < 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: fd was just returned by socket(2) and is owned by nobody else.
    let owned = unsafe { OwnedFd::from_raw_fd(fd) };

    #[cfg(target_os = "macos")]
    {
        // No SOCK_CLOEXEC on Darwin.
        if unsafe { libc::fcntl(owned.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) } < 0 {
            return Err(io::Error::last_os_error());
        }
    }

    Ok(owned)
}

/// Issue an ioctl whose argument is a pointer to `arg`.
///
/// # Safety
///
/// `request` must be a request whose kernel-side argument type has the same
/// layout as `T`, and any pointers embedded in `arg` must be valid for the
/// lengths the request declares.
pub(crate) unsafe fn ioctl<T>(fd: BorrowedFd<'_>, request: c_ulong, arg: &mut T) -> io::Result<()> {
    let rc: c_int = libc::ioctl(fd.as_raw_fd(), request as _, arg as *mut T);
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Copy an interface name into a fixed `IFNAMSIZ`-style buffer.
///
/// Truncates to `dst.len() - 1` bytes and always NUL-terminates.
pub(crate) fn copy_ifname(dst: &mut [c_char], name: &str) {
    let Some(max) = dst.len().checked_sub(1) else {
        return;
    };
    let bytes = name.as_bytes();
    let n = bytes.len().min(max);
    for (slot, &b) in dst.iter_mut().zip(&bytes[..n]) {
        *slot = b as c_char;
    }
    dst[n] = 0;
}

/// Raw errno of an IO error, 0 if none.
pub(crate) fn errno_of(err: &io::Error) -> i32 {
    err.raw_os_error().unwrap_or(0)
}

/// Read a string-valued sysctl by name.
#[cfg(target_os = "freebsd")]
pub(crate) fn sysctl_string(name: &str) -> io::Result<String> {
    use std::ffi::CString;
    use std::ptr;

    let cname = CString::new(name)?;
    let mut len: libc::size_t = 0;

    // First call to get size
    let rc = unsafe {
        libc::sysctlbyname(
            cname.as_ptr(),
            ptr::null_mut(),
            &mut len,
            ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    let mut buf = vec![0u8; len];
    let rc = unsafe {
        libc::sysctlbyname(
            cname.as_ptr(),
            buf.as_mut_ptr() as *mut libc::c_void,
            &mut len,
            ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    buf.truncate(len);

    Ok(crate::decode::c_bytes_to_string(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_ifname_terminates() {
        let mut buf = [0x7f as c_char; 16];
        copy_ifname(&mut buf, "wlan0");
        assert_eq!(buf[..5], [b'w', b'l', b'a', b'n', b'0'].map(|b| b as c_char));
        assert_eq!(buf[5], 0);
    }

    #[test]
    fn test_copy_ifname_truncates() {
        let mut buf = [0 as c_char; 4];
        copy_ifname(&mut buf, "wlan0");
        assert_eq!(buf, [b'w' as c_char, b'l' as c_char, b'a' as c_char, 0]);
    }

    #[test]
    fn test_datagram_socket_opens() {
        let sock = datagram_socket().expect("datagram socket");
        assert!(sock.as_raw_fd() >= 0);
    }
}
