//! crates/logging/src/levels.rs
//! Process-wide severity threshold.

use std::sync::atomic::{AtomicU8, Ordering};

use logging_sink::Severity;

/// Minimum severity a log call needs to reach the writer.
///
/// The threshold is a single atomic byte, so readers on any thread observe
/// either the old or the new value, never a mix. Fatal always passes because
/// no threshold is stricter than [`Severity::Fatal`].
#[derive(Debug)]
pub struct LevelFilter {
    threshold: AtomicU8,
}

impl LevelFilter {
    /// Creates a filter with the given threshold.
    #[must_use]
    pub const fn new(threshold: Severity) -> Self {
        Self {
            threshold: AtomicU8::new(threshold.code()),
        }
    }

    /// Reports whether a record of `severity` passes the threshold.
    #[must_use]
    pub fn should_log(&self, severity: Severity) -> bool {
        severity.code() >= self.threshold.load(Ordering::Relaxed)
    }

    /// Replaces the threshold.
    pub fn set(&self, threshold: Severity) {
        self.threshold.store(threshold.code(), Ordering::Relaxed);
    }

    /// Current threshold.
    #[must_use]
    pub fn get(&self) -> Severity {
        Severity::from_code(self.threshold.load(Ordering::Relaxed)).unwrap_or_default()
    }
}

impl Default for LevelFilter {
    fn default() -> Self {
        Self::new(Severity::default())
    }
}
