//! `parley check`: declaration files compiled and reported.

use std::fs;
use std::process::Command;

use assert_cmd::cargo;

fn parley_cmd() -> Command {
    Command::new(cargo::cargo_bin!("parley"))
}

fn write_temp_declarations(content: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("commands.json");
    fs::write(&path, content).expect("write declarations");
    (dir, path.to_string_lossy().to_string())
}

const VALID: &str = r#"[
  {"key": "mute", "aliases": ["silence"], "params": "<user> [reason...]", "permissions": ["moderate_members"]},
  {"key": "ping"}
]"#;

#[test]
fn valid_declarations_are_listed_as_json() {
    let (_dir, path) = write_temp_declarations(VALID);
    let output = parley_cmd()
        .args(["check", &path, "--output", "json"])
        .output()
        .expect("run check");

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json summary");
    assert_eq!(json["ok"], true);
    assert_eq!(json["commands"][0]["key"], "mute");
    assert_eq!(json["commands"][0]["aliases"][0], "silence");
    assert_eq!(json["commands"][0]["usage"], "<user> [reason...]");
    assert_eq!(json["commands"][0]["permissions"][0], "moderate_members");
    assert_eq!(json["commands"][1]["usage"], "");
}

#[test]
fn valid_declarations_pretty_summary() {
    let (_dir, path) = write_temp_declarations(VALID);
    let output = parley_cmd()
        .args(["check", &path, "--output", "pretty"])
        .output()
        .expect("run check");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "mute <user> [reason...]\nping\n"
    );
    assert!(String::from_utf8_lossy(&output.stderr).contains("2 command(s) ok"));
}

#[test]
fn malformed_parameter_fails_with_json_error() {
    let (_dir, path) = write_temp_declarations(r#"[{"key": "warn", "params": "<user reason"}]"#);
    let output = parley_cmd()
        .args(["check", &path, "--output", "json"])
        .output()
        .expect("run check");

    assert!(!output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json error");
    assert_eq!(json["ok"], false);
    assert!(
        json["error"]
            .as_str()
            .is_some_and(|e| e.contains("malformed parameter")),
        "error: {}",
        json["error"]
    );
}

#[test]
fn required_after_optional_is_reported_pretty() {
    let (_dir, path) =
        write_temp_declarations(r#"[{"key": "ban", "params": "[days] <user>"}]"#);
    let output = parley_cmd()
        .args(["check", &path, "--output", "pretty"])
        .output()
        .expect("run check");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required parameter after an optional parameter"),
        "stderr: {stderr}"
    );
}

#[test]
fn duplicate_keys_across_commands_are_rejected() {
    let (_dir, path) = write_temp_declarations(
        r#"[{"key": "mute", "aliases": ["m"]}, {"key": "m"}]"#,
    );
    let output = parley_cmd()
        .args(["check", &path, "--output", "json"])
        .output()
        .expect("run check");

    assert!(!output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json error");
    assert_eq!(json["ok"], false);
    assert_eq!(
        json["error"],
        "command key 'm' of 'm' is already registered by 'mute'"
    );
}

#[test]
fn missing_file_emits_json_error_envelope() {
    let output = parley_cmd()
        .args(["check", "nope-does-not-exist.json", "--output", "json"])
        .output()
        .expect("run check");

    assert!(!output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json envelope");
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "command_failed");
    assert!(
        json["message"]
            .as_str()
            .is_some_and(|m| m.contains("failed to read declarations")),
        "unexpected message: {}",
        json["message"]
    );
}

#[test]
fn duplicate_key_is_reported_at_the_redeclaration() {
    let (_dir, path) = write_temp_declarations(
        r#"[{"key": "mute"}, {"key": "warn", "aliases": ["mute"]}, {"key": "ban", "description": "mute"}]"#,
    );
    let output = parley_cmd()
        .args(["check", &path, "--output", "pretty"])
        .output()
        .expect("run check");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("declared again here"), "stderr: {stderr}");
    assert!(
        stderr.contains("already registered by 'mute'"),
        "stderr: {stderr}"
    );
}
