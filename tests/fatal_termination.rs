//! A fatal record must reach the disk before the process dies.
//!
//! The binary is run as a child process so the abort does not take the test
//! harness down with it.

#![cfg(unix)]

use std::ffi::OsString;
use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::process::Command;

fn run(args: Vec<OsString>) -> std::process::Output {
    let path = env!("CARGO_BIN_EXE_asynclog");
    Command::new(path)
        .args(args)
        .output()
        .unwrap_or_else(|error| panic!("failed to run {path}: {error}"))
}

#[test]
fn fatal_message_is_flushed_before_abort() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("app.log");
    let warn = dir.path().join("app.warn");

    let output = run(vec![
        "--log-file".into(),
        log.clone().into(),
        "--warning-file".into(),
        warn.clone().into(),
        "--fatal".into(),
        "cannot continue".into(),
        "last regular message".into(),
    ]);

    assert!(!output.status.success(), "fatal must terminate the process");
    assert_eq!(output.status.signal(), Some(6), "expected SIGABRT");

    let contents = fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" last regular message"));
    assert!(lines[1].ends_with(" cannot continue"));

    let warnings = fs::read_to_string(&warn).unwrap();
    assert!(warnings.ends_with(" cannot continue\n"));
}

#[test]
fn fatal_ignores_level_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("app.log");

    let output = run(vec![
        "--log-file".into(),
        log.clone().into(),
        "--level".into(),
        "fatal".into(),
        "--fatal".into(),
        "always written".into(),
    ]);

    assert!(!output.status.success());
    assert!(
        fs::read_to_string(&log)
            .unwrap()
            .ends_with(" always written\n")
    );
}
