//! Property tests for the writer's ordering guarantees.

#![cfg(unix)]

use std::fs;

use logging_sink::{AsyncWriter, LogRecord, Severity, WriterConfig};
use proptest::prelude::*;

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Debug),
        Just(Severity::Info),
        Just(Severity::Warning),
        Just(Severity::Fatal),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The primary file is the concatenation of all payloads in order, and
    /// the warning file is the in-order subsequence at warning or above.
    #[test]
    fn files_preserve_submission_order(
        records in prop::collection::vec((severity(), "[a-z ]{0,24}"), 0..64)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let writer = AsyncWriter::spawn(WriterConfig::default()).unwrap();
        writer.open_log_file(dir.path().join("app.log"), false).unwrap();
        writer.open_warning_file(dir.path().join("warn.log"), false).unwrap();

        let mut primary = String::new();
        let mut warning = String::new();
        for (severity, text) in &records {
            let payload = format!("{text}\n");
            primary.push_str(&payload);
            if severity.mirrors_to_warning_file() {
                warning.push_str(&payload);
            }
            writer.submit(LogRecord::new(*severity, payload.into_bytes()));
        }
        writer.flush();

        prop_assert_eq!(fs::read_to_string(dir.path().join("app.log")).unwrap(), primary);
        prop_assert_eq!(fs::read_to_string(dir.path().join("warn.log")).unwrap(), warning);
        writer.shutdown();
    }
}
