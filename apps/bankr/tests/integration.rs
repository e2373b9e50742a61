//! Integration tests for the bankr CLI

use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const DEADLOCK_JOB: &str = "RESOLVE
4 3
0 0 0
1 0 1
1 1 0
0 1 1
1 0 0
2 1 2
2 2 1
1 2 2
2 1 1
-1
";

/// Run bankr with an empty config file so the user's own config is ignored
fn bankr(args: &[&str], stdin: &str) -> Output {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "").expect("Failed to write config");

    let mut child = Command::new(env!("CARGO_BIN_EXE_bankr"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute bankr");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for bankr")
}

fn json_line(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1, "expected one line: {stdout}");
    serde_json::from_str(stdout.trim()).expect("stdout is not JSON")
}

#[test]
fn test_cli_help() {
    let output = bankr(&["--help"], "");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Banker's algorithm"));
    assert!(stdout.contains("detect"));
    assert!(stdout.contains("worker"));
}

#[test]
fn test_worker_resolve() {
    let output = bankr(&["worker"], DEADLOCK_JOB);
    assert!(output.status.success());
    let value = json_line(&output);
    assert_eq!(value["victim_process"], 3);
    assert_eq!(value["state"]["available"], serde_json::json!([1, 0, 0]));
}

#[test]
fn test_worker_reads_input_file() {
    let dir = TempDir::new().unwrap();
    let job = dir.path().join("job.txt");
    std::fs::write(&job, DEADLOCK_JOB.replacen("RESOLVE", "DETECT", 1)).unwrap();

    let output = bankr(&["worker", "--input", job.to_str().unwrap()], "");
    assert!(output.status.success());
    assert_eq!(json_line(&output)["is_deadlocked"], true);
}

#[test]
fn test_worker_rejects_bad_snapshot() {
    let output = bankr(&["worker"], "DETECT 0 3");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("input.invalid_dimension"));
}

#[test]
fn test_worker_simulate_non_numeric_request() {
    let job = "SIMULATE 1 1\n2\n0\n1\nP0 R0 1\n";
    let output = bankr(&["worker"], job);
    assert!(output.status.success());
    let value = json_line(&output);
    assert_eq!(value["granted"], false);
    assert_eq!(value["message"], "Missing process_index resource_index amount.");
}

#[test]
fn test_worker_unknown_command() {
    let output = bankr(&["worker"], "EXPLODE 1 1 0 0 0");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown command: EXPLODE"));
}

#[test]
fn test_detect_scenario_json() {
    let output = bankr(&["detect", "--scenario", "safe", "--json"], "");
    assert!(output.status.success());
    let value = json_line(&output);
    assert_eq!(value["safe_sequence"], serde_json::json!([1, 3, 4, 0, 2]));
    assert_eq!(value["safe_sequence_length"], 5);
}

#[test]
fn test_detect_table_output() {
    let output = bankr(&["--color", "never", "detect", "--scenario", "deadlock"], "");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DEADLOCK detected"));
    assert!(stdout.contains("P0, P1, P2, P3"));
}

#[test]
fn test_simulate_from_stdin() {
    let snapshot = "1 1\n2\n0\n1\n";
    let output = bankr(&["simulate", "0", "0", "1", "--json"], snapshot);
    assert!(output.status.success());
    let value = json_line(&output);
    assert_eq!(value["granted"], true);
    assert_eq!(value["is_safe"], true);
}

#[test]
fn test_limit_flag_rejects_large_snapshot() {
    let output = bankr(&["--max-processes", "4", "detect", "--scenario", "safe"], "");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("num_processes"));
}

#[test]
fn test_unknown_scenario() {
    let output = bankr(&["state", "--scenario", "nope"], "");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown scenario: nope"));
}
