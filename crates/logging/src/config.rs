//! crates/logging/src/config.rs
//! Startup configuration for a [`Logger`](crate::Logger).

use std::path::PathBuf;

use logging_sink::{BYTES_PER_MEGABYTE, QueueConfig, Severity};

/// File sink requested in a [`LoggerConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileTarget {
    /// Logical path of the file.
    pub path: PathBuf,
    /// Keep existing content instead of truncating.
    #[cfg_attr(feature = "serde", serde(default))]
    pub append: bool,
}

impl FileTarget {
    /// Creates a target for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, append: bool) -> Self {
        Self {
            path: path.into(),
            append,
        }
    }
}

/// Settings applied when a logger starts.
///
/// Everything except `queue` and `sync_on_flush` can also be changed later
/// through the corresponding [`Logger`](crate::Logger) setter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoggerConfig {
    /// Minimum severity forwarded to the writer.
    pub level: Severity,
    /// Primary log file; standard output when `None`.
    pub log_file: Option<FileTarget>,
    /// File receiving a copy of every warning and fatal line.
    pub warning_file: Option<FileTarget>,
    /// Rotation threshold in megabytes; 0 disables rotation.
    pub log_size_mb: u64,
    /// Physical log files to keep; 0 keeps all of them.
    pub log_count: usize,
    /// Queue capacity and overflow behaviour.
    pub queue: QueueConfig,
    /// Sync file data to disk on every flush.
    pub sync_on_flush: bool,
}

impl LoggerConfig {
    /// Sets the severity threshold.
    #[must_use]
    pub const fn with_level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }

    /// Writes to `path` instead of standard output.
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>, append: bool) -> Self {
        self.log_file = Some(FileTarget::new(path, append));
        self
    }

    /// Mirrors warning and fatal lines into `path`.
    #[must_use]
    pub fn with_warning_file(mut self, path: impl Into<PathBuf>, append: bool) -> Self {
        self.warning_file = Some(FileTarget::new(path, append));
        self
    }

    /// Sets the rotation threshold in megabytes.
    #[must_use]
    pub const fn with_log_size_mb(mut self, megabytes: u64) -> Self {
        self.log_size_mb = megabytes;
        self
    }

    /// Sets how many physical log files are kept.
    #[must_use]
    pub const fn with_log_count(mut self, count: usize) -> Self {
        self.log_count = count;
        self
    }

    /// Sets the queue configuration.
    #[must_use]
    pub const fn with_queue(mut self, queue: QueueConfig) -> Self {
        self.queue = queue;
        self
    }

    /// Enables syncing file data on flush.
    #[must_use]
    pub const fn with_sync_on_flush(mut self, sync: bool) -> Self {
        self.sync_on_flush = sync;
        self
    }

    /// Rotation threshold in bytes, `None` if it overflows.
    #[must_use]
    pub const fn rotation_threshold_bytes(&self) -> Option<u64> {
        self.log_size_mb.checked_mul(BYTES_PER_MEGABYTE)
    }
}
