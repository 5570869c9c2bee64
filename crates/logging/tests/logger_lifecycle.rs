//! Integration tests for the logger's configuration surface and lifecycle.
//!
//! Each test starts its own [`Logger`] writing into a scratch directory and
//! inspects the files after [`Logger::flush`].

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use logging::{LogError, Logger, LoggerConfig, Severity, log_info, log_warning};

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Strips the `<date> <time> <tid> ` prefix from a line.
fn message(line: &str) -> &str {
    line.splitn(4, ' ').nth(3).unwrap()
}

fn messages(path: &Path) -> Vec<String> {
    read(path).lines().map(|line| message(line).to_owned()).collect()
}

// ============================================================================
// Line Format
// ============================================================================

/// Verifies each line carries timestamp and thread id before the message.
#[test]
fn lines_have_timestamp_and_thread_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let logger = Logger::start(LoggerConfig::default().with_log_file(&path, false)).unwrap();

    logger.log(Severity::Info, "hello");
    logger.flush();

    let contents = read(&path);
    let line = contents.strip_suffix('\n').unwrap();
    let fields: Vec<&str> = line.splitn(4, ' ').collect();
    assert_eq!(fields.len(), 4);
    assert_eq!(fields[0].len(), "MM/DD".len());
    assert_eq!(fields[1].len(), "HH:MM:SS.ffffff".len());
    assert_eq!(fields[2], logging::thread_id().to_string());
    assert_eq!(fields[3], "hello");
}

/// Verifies a trailing newline is not doubled.
#[test]
fn existing_newline_is_kept_single() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let logger = Logger::start(LoggerConfig::default().with_log_file(&path, false)).unwrap();

    logger.log(Severity::Info, "one\n");
    logger.log(Severity::Info, b"two".as_slice());
    logger.flush();

    assert_eq!(messages(&path), ["one", "two"]);
    assert!(!read(&path).contains("\n\n"));
}

/// Verifies the macros prefix the call site.
#[test]
fn macros_prefix_file_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let logger = Arc::new(Logger::start(LoggerConfig::default().with_log_file(&path, false)).unwrap());

    let line = line!() + 1;
    log_info!(logger, "ready after {}ms", 12);
    logger.flush();

    let expected = format!("[{}:{line}] ready after 12ms", file!());
    assert_eq!(messages(&path), [expected]);
}

// ============================================================================
// Sinks
// ============================================================================

/// Verifies warnings are mirrored into the warning file.
#[test]
fn warning_file_mirrors_warnings_only() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("app.log");
    let warn = dir.path().join("app.warn");
    let logger = Logger::start(
        LoggerConfig::default()
            .with_level(Severity::Debug)
            .with_log_file(&log, false)
            .with_warning_file(&warn, false),
    )
    .unwrap();

    logger.log(Severity::Debug, "d");
    logger.log(Severity::Info, "i");
    log_warning!(&logger, "w");
    logger.flush();

    assert_eq!(messages(&log).len(), 3);
    let mirrored = messages(&warn);
    assert_eq!(mirrored.len(), 1);
    assert!(mirrored[0].ends_with("] w"));
}

/// Verifies switching log files moves later lines to the new file.
#[test]
fn set_log_file_switches_destination() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.log");
    let second = dir.path().join("second.log");
    let logger = Logger::start(LoggerConfig::default().with_log_file(&first, false)).unwrap();

    logger.log(Severity::Info, "to first");
    logger.set_log_file(&second, false).unwrap();
    logger.log(Severity::Info, "to second");
    logger.flush();

    assert_eq!(messages(&first), ["to first"]);
    assert_eq!(messages(&second), ["to second"]);
}

/// Verifies a failed log file is reported and logging continues.
#[test]
fn failed_log_file_reports_and_keeps_logging() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("app.log");
    let logger = Logger::start(LoggerConfig::default().with_log_file(&good, false)).unwrap();

    let error = logger
        .set_log_file(dir.path().join("missing/app.log"), false)
        .unwrap_err();
    assert!(matches!(error, LogError::Sink(_)));

    logger.log(Severity::Info, "on stdout");
    logger.flush();
    assert_eq!(logger.stats().records_written, 1);
    assert_eq!(read(&good), "");
}

/// Verifies start fails when the configured log file cannot be opened.
#[test]
fn start_reports_unopenable_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig::default().with_log_file(dir.path().join("missing/app.log"), false);
    assert!(matches!(Logger::start(config), Err(LogError::Sink(_))));
}

/// Verifies apply keeps the fallback sinks and returns the first failure.
#[test]
fn apply_falls_back_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let warn = dir.path().join("app.warn");
    let logger = Logger::start(LoggerConfig::default()).unwrap();

    let config = LoggerConfig::default()
        .with_level(Severity::Warning)
        .with_log_file(dir.path().join("missing/app.log"), false)
        .with_warning_file(&warn, false);
    assert!(logger.apply(&config).is_err());

    // The level and the warning file still took effect.
    assert_eq!(logger.level(), Severity::Warning);
    logger.log(Severity::Warning, "kept");
    logger.flush();
    assert_eq!(messages(&warn), ["kept"]);
}

// ============================================================================
// Rotation
// ============================================================================

/// Verifies the byte threshold rotates into a new physical file.
#[test]
fn log_size_rotates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let logger = Logger::start(LoggerConfig::default().with_log_file(&path, false)).unwrap();
    logger.set_log_size_bytes(64).unwrap();

    let before = fs::read_link(&path).unwrap();
    for i in 0..4 {
        logger.log(Severity::Info, format!("record {i} {}", "x".repeat(40)));
        // Distinct stamps for every rotation.
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    logger.flush();

    let after = fs::read_link(&path).unwrap();
    assert_ne!(before, after);
    assert!(logger.stats().rotations >= 1);

    let mut total = 0;
    for entry in fs::read_dir(dir.path()).unwrap() {
        let name = entry.unwrap().file_name().into_string().unwrap();
        if name.starts_with("app.log.") {
            total += messages(&dir.path().join(name)).len();
        }
    }
    assert_eq!(total, 4);
}

/// Verifies an oversized megabyte count is rejected.
#[test]
fn oversized_log_size_is_rejected() {
    let logger = Logger::start(LoggerConfig::default()).unwrap();
    assert!(matches!(
        logger.set_log_size(u64::MAX),
        Err(LogError::SizeOverflow { .. })
    ));
    logger.set_log_size(0).unwrap();
}

// ============================================================================
// Shutdown
// ============================================================================

/// Verifies shutdown drains and later records are dropped.
#[test]
fn shutdown_drains_then_drops() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let logger = Logger::start(LoggerConfig::default().with_log_file(&path, false)).unwrap();

    for i in 0..100 {
        logger.log(Severity::Info, format!("{i}"));
    }
    logger.shutdown();
    logger.log(Severity::Info, "late");
    logger.flush();
    logger.shutdown();

    assert_eq!(messages(&path).len(), 100);
    assert_eq!(logger.stats().records_dropped, 1);
    assert!(logger.set_log_count(2).is_err());
}
