//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway config directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    run_cli_with_input(home, args, "")
}

fn run_cli_with_input(home: &Path, args: &[&str], input: &str) -> (i32, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_cookclock"))
        .args(args)
        .env("COOKCLOCK_HOME", home)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    {
        let mut stdin = child.stdin.take().expect("stdin is piped");
        stdin.write_all(input.as_bytes()).expect("write stdin");
    }

    let output = child.wait_with_output().expect("wait for CLI");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.code().unwrap_or(-1), stdout, stderr)
}

#[test]
fn test_presets_json() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["presets", "--json"]);
    assert_eq!(code, 0);

    let presets: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let presets = presets.as_array().unwrap();
    assert_eq!(presets.len(), 4);
    assert_eq!(presets[0]["name"], "Kebab Frying");
    assert_eq!(presets[0]["duration_secs"], 90);
}

#[test]
fn test_presets_table() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["presets"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Rice Cooking"));
    assert!(stdout.contains("25:00"));
}

#[test]
fn test_config_get_default() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "engine.grace_period_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "15");
    assert!(home.path().join("config.toml").exists());
}

#[test]
fn test_config_set_persists() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "engine.grace_period_secs", "3"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "engine.grace_period_secs"]);
    assert_eq!(stdout.trim(), "3");
}

#[test]
fn test_config_rejects_bad_values() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "set", "engine.tick_interval_ms", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (code, _, _) = run_cli(home.path(), &["config", "get", "engine.nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_path() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
}

#[test]
fn test_run_start_and_list() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli_with_input(
        home.path(),
        &["run", "--no-bell"],
        "start Test 1\nlist\nquit\n",
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("started #1 Test 1"));
    assert!(stdout.contains("Running"));
}

#[test]
fn test_run_reports_bad_input_and_missing_tasks() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli_with_input(
        home.path(),
        &["run", "--no-bell"],
        "start Pizza\ncustom Oops -5\npause 99\nquit\n",
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("error: Unknown preset: Pizza"));
    assert!(stdout.contains("duration must not be negative"));
    assert!(stdout.contains("task 99 no longer exists"));
}

#[test]
fn test_run_until_idle_rings_alarm() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "engine.grace_period_secs", "0"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli_with_input(
        home.path(),
        &["run", "--until-idle", "--tick-ms", "20", "--no-bell"],
        "custom Flash 0\n",
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("started #1 Flash"));
    assert!(stdout.contains("Task 'Flash' completed!"));
    assert!(!stdout.contains('\x07'));
}
