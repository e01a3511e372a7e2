//! Open/close cycles must not leak descriptors.
//!
//! Kept in its own test binary so no concurrent test opens descriptors while
//! the count is taken.

#[cfg(target_os = "linux")]
fn open_fd_count() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .expect("read /proc/self/fd")
        .count()
}

#[cfg(target_os = "linux")]
#[test]
fn open_close_cycles_release_descriptors() {
    use wavelan_probe::{close, open, query};

    let Ok(mut device) = open("wavelan-test0") else {
        eprintln!("SKIP: wireless channel unavailable");
        return;
    };
    // Warm up lazily opened process-wide descriptors.
    let _ = query(&mut device);
    close(device);

    let before = open_fd_count();
    for name in ["wlan0", "wavelan-test0", "eth0", "x"] {
        for _ in 0..25 {
            let device = open(name).expect("open after a successful first open");
            close(device);
        }
    }
    assert_eq!(open_fd_count(), before, "explicit close");

    for _ in 0..25 {
        let mut device = open("wavelan-test0").expect("open");
        let _ = query(&mut device);
    }
    assert_eq!(open_fd_count(), before, "drop after query");
}
