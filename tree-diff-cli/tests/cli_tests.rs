//! End-to-end tests running the `tree-diff` binary

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn tree_diff(args: &[&Path], flags: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tree-diff"))
        .args(flags)
        .args(args)
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", "/nonexistent")
        .output()
        .unwrap()
}

fn setup() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a");
    let b = temp_dir.path().join("b");
    fs::create_dir(&a).unwrap();
    fs::create_dir(&b).unwrap();
    (temp_dir, a, b)
}

fn parse(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn path_set(value: &Value) -> HashSet<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_identical_trees() {
    let (_temp_dir, a, b) = setup();
    fs::write(a.join("f"), b"same").unwrap();
    fs::write(b.join("f"), b"same").unwrap();

    let output = tree_diff(&[&a, &b], &["--exit-code"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        parse(&output),
        serde_json::json!({ "added_files": [], "deleted_files": [], "differences": {} })
    );
}

#[test]
fn test_report_shape() {
    let (_temp_dir, a, b) = setup();
    fs::create_dir(a.join("data")).unwrap();
    fs::write(a.join("data").join("x"), b"1").unwrap();
    fs::write(b.join("new"), b"").unwrap();
    std::os::unix::fs::symlink("old", a.join("link")).unwrap();
    std::os::unix::fs::symlink("new", b.join("link")).unwrap();

    let output = tree_diff(&[&a, &b], &["--sorted"]);

    assert_eq!(output.status.code(), Some(0));
    let report = parse(&output);
    assert_eq!(path_set(&report["added_files"]), HashSet::from(["/new".to_string()]));
    assert_eq!(report["deleted_files"], serde_json::json!(["/data", "/data/x"]));
    assert_eq!(report["differences"]["/link"]["symlink"], serde_json::json!(["old", "new"]));
    assert!(report.get("errors").is_none());
}

#[test]
fn test_non_utf8_names_are_escaped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let (_temp_dir, a, b) = setup();
    fs::write(a.join(OsStr::from_bytes(b"\xff")), b"").unwrap();
    fs::write(b.join(OsStr::from_bytes(b"\xfe")), b"").unwrap();

    let output = tree_diff(&[&a, &b], &[]);

    assert_eq!(output.status.code(), Some(0));
    let report = parse(&output);
    assert_eq!(report["deleted_files"], serde_json::json!(["/\\xff"]));
    assert_eq!(report["added_files"], serde_json::json!(["/\\xfe"]));
}

#[test]
fn test_exit_code_flag() {
    let (_temp_dir, a, b) = setup();
    fs::write(a.join("f"), b"1").unwrap();
    fs::write(b.join("f"), b"2").unwrap();

    let output = tree_diff(&[&a, &b], &["--exit-code", "--hash", "blake3"]);

    assert_eq!(output.status.code(), Some(1));
    let content = &parse(&output)["differences"]["/f"]["content"];
    assert!(content[0].as_str().unwrap().starts_with("blake3:"));
}

#[test]
fn test_missing_root_fails() {
    let (_temp_dir, a, b) = setup();
    fs::remove_dir(&b).unwrap();

    let output = tree_diff(&[&a, &b], &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to open root directory"));
}

#[test]
fn test_config_file_and_override() {
    let (temp_dir, a, b) = setup();
    fs::write(a.join("f"), b"1").unwrap();
    fs::write(b.join("f"), b"2").unwrap();
    let config = temp_dir.path().join("config.toml");
    fs::write(&config, "[compare]\nhash_algorithm = \"blake3\"\n\n[output]\npretty = true\n").unwrap();

    let output = tree_diff(&[&a, &b], &["--config", config.to_str().unwrap(), "--hash", "sha256"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\n  "), "expected pretty output: {}", stdout);
    let content = &parse(&output)["differences"]["/f"]["content"];
    assert!(content[1].as_str().unwrap().starts_with("sha256:"));
}

#[test]
fn test_invalid_log_level() {
    let (_temp_dir, a, b) = setup();

    let output = tree_diff(&[&a, &b], &["--log-level", "chatty"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid log level"));
}
