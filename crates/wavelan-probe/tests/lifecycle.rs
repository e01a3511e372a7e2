use wavelan_core::{ErrorCode, QualityUnit, WavelanError};
use wavelan_probe::{close, open, query, snapshot, Device, WirelessBackend, MAX_INTERFACE_LEN};

#[test]
fn open_empty_name_is_invalid_parameter() {
    let err = open("").err().expect("empty name rejected");
    assert_eq!(err.error_code(), ErrorCode::InvalidParameter);
    assert!(matches!(err, WavelanError::InvalidParameter { .. }));
}

#[test]
fn open_truncates_overlong_names() {
    let device = match open("wlan0-with-a-much-too-long-name") {
        Ok(device) => device,
        Err(e) => {
            eprintln!("SKIP: open failed: {e}");
            return;
        }
    };
    assert_eq!(device.interface().len(), MAX_INTERFACE_LEN);
    assert!(device.interface().starts_with("wlan0-with"));
    close(device);
}

#[test]
fn query_nonexistent_interface_is_no_such_device() {
    let mut device: Device = match open("nowifi77") {
        Ok(device) => device,
        Err(e) => {
            eprintln!("SKIP: open failed: {e}");
            return;
        }
    };

    let err = query(&mut device).expect_err("no such interface");
    assert_eq!(err.error_code(), ErrorCode::NoSuchDevice);
    assert!(err.partial().is_none());

    // Failures are reported per query; the handle stays usable.
    let err = query(&mut device).expect_err("still no such interface");
    assert_eq!(err.error_code(), ErrorCode::NoSuchDevice);
    close(device);
}

#[test]
fn successful_query_obeys_unit_contract() {
    let name = std::env::var("WAVELAN_TEST_INTERFACE").unwrap_or_else(|_| "wlan0".into());
    let mut device = match open(&name) {
        Ok(device) => device,
        Err(e) => {
            eprintln!("SKIP: open {name} failed: {e}");
            return;
        }
    };

    match query(&mut device) {
        Ok(stats) => {
            if stats.quality_unit == QualityUnit::Percent {
                assert!((0..=100).contains(&stats.quality), "{stats:?}");
            }
            assert!(stats.rate >= 0);
            assert!(!stats.vendor.is_empty());
        }
        Err(e) => eprintln!("SKIP: no associated interface {name}: {e}"),
    }
}

#[test]
fn snapshot_reports_missing_interface() {
    let snap = snapshot("nowifi77");
    assert_ne!(snap.status, ErrorCode::Ok);
    assert_eq!(snap.interface, "nowifi77");
    assert!(snap.stats.is_none());

    let json = serde_json::to_value(&snap).expect("serialize");
    assert_eq!(json["schema_id"], wavelan_core::schema::LINK_SNAPSHOT_V1);
}
