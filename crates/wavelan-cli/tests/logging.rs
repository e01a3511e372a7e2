use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;

#[test]
fn test_log_format_text() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-format")
        .arg("text")
        .arg("--log-level")
        .arg("info");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Platform:"))
        .stderr(predicate::str::contains("INFO"))
        .stderr(predicate::str::contains("Initialization complete"))
        .stderr(predicate::str::contains("Main logic finished"));
}

#[test]
fn test_log_format_json() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-format")
        .arg("json")
        .arg("--log-level")
        .arg("info");

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    // Every stderr line is a JSON event
    let stderr = String::from_utf8(output.stderr).unwrap();
    let log_lines: Vec<Value> = stderr
        .lines()
        .map(|line| serde_json::from_str(line).expect("stderr line should be valid JSON"))
        .collect();

    assert_eq!(log_lines.len(), 2);

    assert_eq!(log_lines[0]["level"].as_str().unwrap(), "INFO");
    assert_eq!(
        log_lines[0]["fields"]["message"].as_str().unwrap(),
        "Initialization complete. Starting main logic."
    );

    assert_eq!(log_lines[1]["level"].as_str().unwrap(), "INFO");
    assert_eq!(
        log_lines[1]["fields"]["message"].as_str().unwrap(),
        "Main logic finished."
    );
}

#[test]
fn test_log_level_debug_reports_step_failure() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-level")
        .arg("debug")
        .arg("query")
        .arg("--interface")
        .arg("nowifi77");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("DEBUG"));
}

#[test]
fn test_log_level_error_is_quiet() {
    let mut cmd = cargo_bin_cmd!("wavelan");
    cmd.arg("--log-level").arg("error").arg("strerror").arg("0");

    cmd.assert().success().stderr(predicate::str::is_empty());
}
