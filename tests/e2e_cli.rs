//! CLI end-to-end tests
//!
//! Tests for the oggscope command-line interface.

mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the oggscope binary
#[allow(deprecated)]
fn oggscope_cmd() -> Command {
    Command::cargo_bin("oggscope").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = oggscope_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = oggscope_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("oggscope"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = oggscope_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_probe_help() {
    let mut cmd = oggscope_cmd();
    cmd.args(["probe", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Probe an Ogg file"));
}

#[test]
fn test_cli_probe_nonexistent_file() {
    let mut cmd = oggscope_cmd();
    cmd.args(["probe", "/nonexistent/path/audio.ogg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_probe_text() {
    let temp = tempdir().unwrap();
    let file = common::opus_file(temp.path(), 50);

    let mut cmd = oggscope_cmd();
    cmd.arg("probe")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("opus"))
        .stdout(predicate::str::contains("48000 Hz"))
        .stdout(predicate::str::contains("2ch"))
        .stdout(predicate::str::contains("Duration: 00:00:10.000"));
}

#[test]
fn test_cli_probe_json() {
    let temp = tempdir().unwrap();
    let file = common::opus_file(temp.path(), 50);

    let output = oggscope_cmd()
        .args(["probe", "--json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["duration"], 10.0);
    let stream = &json["streams"][0];
    assert_eq!(stream["codec"], "opus");
    assert_eq!(stream["media_type"], "audio");
    assert_eq!(stream["serial"], 0x5eed);
    assert_eq!(stream["header_count"], 2);
    assert_eq!(stream["duration"], 480000);
}

#[test]
fn test_cli_probe_not_ogg() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("noise.bin");
    fs::write(&file, vec![0x55u8; 4096]).unwrap();

    let mut cmd = oggscope_cmd();
    cmd.arg("probe")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open Ogg file"));
}

#[test]
fn test_cli_packets_limit() {
    let temp = tempdir().unwrap();
    let file = common::opus_file(temp.path(), 5);

    let output = oggscope_cmd()
        .args(["packets", "--limit", "12"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 12);
    assert!(lines[0].contains("size=100"));
    assert!(lines[0].contains("pts=-"));
    assert!(lines[10].contains("pts=9600"));
    assert!(lines.iter().all(|l| l.contains("duration=960")));
}

#[test]
fn test_cli_packets_json_uses_config_limit() {
    let temp = tempdir().unwrap();
    let file = common::opus_file(temp.path(), 5);
    let config_file = temp.path().join("oggscope.toml");
    fs::write(&config_file, "[report]\nmax_packets = 3\n").unwrap();

    let output = oggscope_cmd()
        .arg("--config")
        .arg(&config_file)
        .args(["packets", "--json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let packets = json.as_array().unwrap();
    assert_eq!(packets.len(), 3);
    assert_eq!(packets[0]["stream"], 0);
    assert_eq!(packets[0]["keyframe"], true);
}

#[test]
fn test_cli_packets_unknown_stream() {
    let temp = tempdir().unwrap();
    let file = common::opus_file(temp.path(), 2);

    let mut cmd = oggscope_cmd();
    cmd.args(["packets", "--stream", "4"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stream 4 does not exist"));
}

#[test]
fn test_cli_seek() {
    let temp = tempdir().unwrap();
    let file = common::opus_file(temp.path(), 50);

    let mut cmd = oggscope_cmd();
    cmd.args(["seek", "--time", "5", "--backward", "--count", "2"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("stream=0"))
        .stdout(predicate::str::contains("size=100"));
}

#[test]
fn test_cli_validate_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(
        &config_file,
        r#"
[demux]
probe_duration = false
header_errors = "fall_through"

[report]
max_packets = 25
"#,
    )
    .unwrap();

    let mut cmd = oggscope_cmd();
    cmd.arg("validate")
        .arg(&config_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Max packets: 25"));
}

#[test]
fn test_cli_validate_invalid_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(&config_file, "[demux]\nsync_window = 4\n").unwrap();

    let mut cmd = oggscope_cmd();
    cmd.arg("validate")
        .arg(&config_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("sync_window"));
}
