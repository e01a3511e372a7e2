use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;

#[test]
fn strerror_known_codes() {
    for (code, text) in [
        ("0", "OK"),
        ("-1", "No carrier signal"),
        ("-2", "No such WaveLAN device"),
        ("-3", "Invalid parameter"),
    ] {
        let mut cmd = cargo_bin_cmd!("wavelan");
        cmd.arg("--log-level").arg("error").arg("strerror").arg(code);
        cmd.assert()
            .success()
            .stdout(predicate::str::diff(format!("{text}\n")));
    }
}

#[test]
fn strerror_unknown_code() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-level").arg("error").arg("strerror").arg("42");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Unknown error"));
}

#[test]
fn query_missing_interface_exits_no_such_device() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-level")
        .arg("error")
        .arg("query")
        .arg("-i")
        .arg("nowifi77");

    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains("Interface: nowifi77"))
        .stdout(predicate::str::contains("No such WaveLAN device"));
}

#[test]
fn query_reads_interface_from_env() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.env("WAVELAN_INTERFACE", "nowifi77")
        .arg("--log-level")
        .arg("error")
        .arg("query");

    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains("Interface: nowifi77"));
}

#[test]
fn query_without_interface_is_usage_error() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.env_remove("WAVELAN_INTERFACE").arg("query");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--interface"));
}

#[test]
fn query_empty_interface_is_invalid_parameter() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-level")
        .arg("error")
        .arg("query")
        .arg("--interface=");

    cmd.assert()
        .code(3)
        .stdout(predicate::str::contains("Invalid parameter"));
}

#[test]
fn query_json_snapshot() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-level")
        .arg("error")
        .arg("query")
        .arg("-i")
        .arg("nowifi77")
        .arg("--json");

    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(2));

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(
        json["schema_id"],
        "https://schemas.3leaps.dev/wavelan/link/v1.0.0/link-snapshot.schema.json"
    );
    assert_eq!(json["interface"], "nowifi77");
    assert_eq!(json["status"], "no_such_device");
    assert!(json["message"].as_str().is_some());
    assert!(json.get("stats").is_none());
}

#[test]
fn watch_rejects_zero_interval() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-level")
        .arg("error")
        .arg("watch")
        .arg("-i")
        .arg("wlan0")
        .arg("--interval")
        .arg("0");

    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("interval must be > 0"));
}

#[test]
fn watch_rejects_bad_duration() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-level")
        .arg("error")
        .arg("watch")
        .arg("-i")
        .arg("wlan0")
        .arg("--interval")
        .arg("soon");

    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("invalid duration"));
}

#[test]
fn watch_counted_samples_on_missing_interface() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-level")
        .arg("error")
        .arg("watch")
        .arg("-i")
        .arg("nowifi77")
        .arg("--interval")
        .arg("10ms")
        .arg("--count")
        .arg("3")
        .arg("--json");

    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(2));

    // Either every sample is reported, or the channel itself failed to open.
    let stdout = String::from_utf8(output.stdout).unwrap();
    let samples: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("one JSON object per line"))
        .collect();
    if samples.is_empty() {
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("Failed to open"), "{stderr}");
    } else {
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|s| s["status"] == "no_such_device"));
    }
}

#[test]
fn watch_single_sample_exits_with_its_status() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-level")
        .arg("error")
        .arg("watch")
        .arg("-i")
        .arg("nowifi77")
        .arg("--count")
        .arg("1");

    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(2));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.lines().count() <= 1, "{stdout}");
    if let Some(line) = stdout.lines().next() {
        assert_eq!(line, "nowifi77: No such WaveLAN device");
    }
}
