//! Integration tests for top-level CLI behavior.

use std::path::{Path, PathBuf};
use std::process::Command;

fn run_trackdown(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_trackdown");
    Command::new(bin).args(args).output().expect("failed to run trackdown binary")
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn check_accepts_valid_config() {
    let dir = std::env::temp_dir().join("trackdown_cli_check_ok");
    let config = write_file(
        &dir,
        "trackdown.yaml",
        "mnemonics: [JIR]\nactions:\n  - failed,Closed,warn_regression\n  - passed,Closed,do_nothing\n",
    );

    let output = run_trackdown(&["check", "--config", config.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Configuration OK"));
    assert!(stdout.contains("2 action(s)"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn check_rejects_unknown_callback() {
    let dir = std::env::temp_dir().join("trackdown_cli_check_bad");
    let config =
        write_file(&dir, "trackdown.yaml", "actions:\n  - failed,Closed,no_such_callback\n");

    let output = run_trackdown(&["check", "--config", config.to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("no_such_callback"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn check_fails_on_missing_config_file() {
    let output = run_trackdown(&["check", "--config", "/no/such/trackdown.yaml"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("Failed to read config"));
}

#[test]
fn run_degrades_to_disconnected_when_tracker_unreachable() {
    let dir = std::env::temp_dir().join("trackdown_cli_run_disconnected");
    let report = dir.join("regression.md");
    let config = write_file(
        &dir,
        "trackdown.yaml",
        &format!(
            "server: http://127.0.0.1:9\nmnemonics: [JIR]\nactions:\n  - failed,Closed,warn_regression\nregression_file: {}\n",
            report.display()
        ),
    );
    let events = write_file(
        &dir,
        "events.jsonl",
        r#"{"test":"suite.test_login","outcome":"failed","description":"see JIR-1"}
"#,
    );

    let output = run_trackdown(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--events",
        events.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    // Disconnected: nothing was dispatched, so no regression report exists.
    assert!(!report.exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn run_skips_malformed_event_lines() {
    let dir = std::env::temp_dir().join("trackdown_cli_run_malformed");
    let config = write_file(&dir, "trackdown.yaml", "server: http://127.0.0.1:9\n");
    let events = write_file(
        &dir,
        "events.jsonl",
        "not json at all\n{\"test\":\"t\",\"outcome\":\"passed\"}\n",
    );

    let output = run_trackdown(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--events",
        events.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn run_fails_on_missing_events_file() {
    let dir = std::env::temp_dir().join("trackdown_cli_run_noevents");
    let config = write_file(&dir, "trackdown.yaml", "server: http://127.0.0.1:9\n");

    let output = run_trackdown(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--events",
        "/no/such/events.jsonl",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("Failed to open events file"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let output = run_trackdown(&["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn help_lists_subcommands() {
    let output = run_trackdown(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("run"));
    assert!(stdout.contains("check"));
}
