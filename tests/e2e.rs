use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn run(ledger: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_headbook"))
        .arg(ledger)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn fixture(name: &str) -> String {
    format!("tests/fixtures/{name}")
}

#[test]
fn valid_commands() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("ledger.json");
    let (stdout, stderr, success) = run(&ledger, &[&fixture("valid.csv")]);

    assert!(success);
    assert!(stderr.is_empty(), "{stderr}");

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec!["head,balance", "Food,120", "Normal,130", "Travel,50"]
    );
    assert!(ledger.exists());
}

#[test]
fn errors_warn_but_do_not_block() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("ledger.json");
    let (stdout, stderr, success) = run(&ledger, &[&fixture("with_errors.csv")]);

    assert!(success);
    assert!(stderr.contains("unrecognized command type"));
    assert!(stderr.contains("missing amount"));
    assert!(stderr.contains("missing destination"));

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["head,balance", "Food,75", "Normal,0"]);
}

#[test]
fn state_persists_between_runs() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("ledger.json");
    run(&ledger, &[&fixture("valid.csv")]);

    let (stdout, _, success) = run(&ledger, &[]);
    assert!(success);
    assert!(stdout.contains("Normal,130"));

    let (stdout, _, success) = run(&ledger, &["--history"]);
    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    // header + 1 + 1 + 2 (transfer) + 1 + 1 + 2 (delete)
    assert_eq!(lines.len(), 9);
    assert!(lines[7].contains(",add,Normal,30,"));
    assert!(lines[7].ends_with(",100,130,300,330"));
    assert!(lines[8].contains(",spend,Gifts,30,"));
    assert!(lines[8].ends_with(",30,0,330,300"));
}

#[test]
fn missing_arguments_print_usage() {
    let output = Command::new(env!("CARGO_BIN_EXE_headbook"))
        .output()
        .expect("failed to run binary");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("usage"));
}
