//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against the dev data directory
//! and verify outputs.

use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(args: &[&str]) -> (i32, String, String) {
    let output = Command::new("cargo")
        .args(["run", "-p", "timetally-cli", "--quiet", "--"])
        .args(args)
        .env("TIMETALLY_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

#[test]
fn test_status_runs() {
    let (code, stdout, _) = run_cli(&["--user", "9001", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("🕒"));
}

#[test]
fn test_start_and_switch() {
    let (code, stdout, _) = run_cli(&["--user", "9002", "start", "work"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("started") || stdout.contains("already running"));

    let (code, stdout, _) = run_cli(&["--user", "9002", "start", "rest"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Rest started"));
}

#[test]
fn test_start_rejects_unknown_activity() {
    let (code, _, stderr) = run_cli(&["--user", "9003", "start", "gaming"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown activity type"));
}

#[test]
fn test_settings_show() {
    let (code, stdout, _) = run_cli(&["--user", "9004", "settings", "show"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Interval:"));
    assert!(stdout.contains("Quiet hours:"));
}

#[test]
fn test_settings_rejects_bad_quiet_window() {
    let (code, _, stderr) = run_cli(&[
        "--user", "9005", "settings", "quiet-window", "25:99x", "06:00",
    ]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not an HH:MM time"));
}

#[test]
fn test_stats_today_runs() {
    let (code, _, _) = run_cli(&["--user", "9006", "stats", "today"]);
    assert_eq!(code, 0);
}

#[test]
fn test_config_get() {
    let (code, stdout, _) = run_cli(&["config", "get", "reminders.align_threshold_secs"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("60"));
}
