//! crates/logging/src/logger.rs
//! The logging service object.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use logging_sink::{
    AsyncWriter, BYTES_PER_MEGABYTE, Clock, LogRecord, Severity, SystemClock, WriterConfig,
    WriterStats,
};

use crate::config::LoggerConfig;
use crate::error::LogError;
use crate::format::LineFormatter;
use crate::levels::LevelFilter;

/// Level-filtered front end of one background writer.
///
/// A `Logger` owns exactly one writer thread for its whole lifetime. Share it
/// between threads by reference or through an [`Arc`]; every method takes
/// `&self`.
///
/// Emitting a record ([`log`](Self::log), [`log_fmt`](Self::log_fmt)) never
/// blocks on I/O and never fails. A [`Severity::Fatal`] record is the one
/// exception: it is flushed synchronously and then the process aborts.
///
/// # Examples
///
/// ```
/// use logging::{Logger, LoggerConfig, Severity};
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("service.log");
/// let logger = Logger::start(LoggerConfig::default().with_log_file(&path, false))?;
///
/// logger.log(Severity::Info, "listening");
/// logger.log(Severity::Debug, "filtered out");
/// logger.flush();
///
/// let contents = std::fs::read_to_string(&path)?;
/// assert!(contents.ends_with(" listening\n"));
/// assert!(!contents.contains("filtered out"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Logger {
    filter: LevelFilter,
    formatter: LineFormatter,
    writer: AsyncWriter,
}

impl Logger {
    /// Starts the writer and applies `config`.
    ///
    /// Fails if the writer thread cannot be spawned, if the rotation
    /// threshold overflows, or if a configured file cannot be opened. Use
    /// [`apply`](Self::apply) on a running logger to keep the fallback
    /// sinks instead.
    pub fn start(config: LoggerConfig) -> Result<Self, LogError> {
        Self::start_with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Like [`start`](Self::start) with a custom time source for line
    /// timestamps and rotated file names.
    pub fn start_with_clock(config: LoggerConfig, clock: Arc<dyn Clock>) -> Result<Self, LogError> {
        let threshold = rotation_threshold(config.log_size_mb)?;
        let writer = AsyncWriter::spawn(
            WriterConfig::default()
                .with_rotation_threshold(threshold)
                .with_retention(config.log_count)
                .with_queue(config.queue)
                .with_sync_on_flush(config.sync_on_flush)
                .with_clock(Arc::clone(&clock)),
        )?;
        let logger = Self {
            filter: LevelFilter::new(config.level),
            formatter: LineFormatter::new(clock),
            writer,
        };
        logger.apply(&config)?;
        Ok(logger)
    }

    /// Applies the runtime-adjustable parts of `config`: level, files, size
    /// and count. Queue settings are fixed at start and ignored here.
    ///
    /// Every setting is attempted; the first failure is returned after the
    /// failed sink fell back (standard output for the log file, nothing for
    /// the warning file).
    pub fn apply(&self, config: &LoggerConfig) -> Result<(), LogError> {
        self.set_level(config.level);
        let results = [
            self.set_log_size(config.log_size_mb),
            self.set_log_count(config.log_count),
            match &config.log_file {
                Some(target) => self.set_log_file(&target.path, target.append),
                None => self.use_stdout(),
            },
            match &config.warning_file {
                Some(target) => self.set_warning_file(&target.path, target.append),
                None => self.clear_warning_file(),
            },
        ];
        results.into_iter().collect()
    }

    /// Reports whether a record of `severity` would be written.
    #[must_use]
    pub fn should_log(&self, severity: Severity) -> bool {
        self.filter.should_log(severity)
    }

    /// Formats and enqueues `message` if `severity` passes the threshold.
    ///
    /// Fatal records are flushed and then abort the process.
    pub fn log(&self, severity: Severity, message: impl AsRef<[u8]>) {
        if !self.should_log(severity) {
            return;
        }
        let line = self.formatter.format(message.as_ref());
        self.emit(severity, line);
    }

    /// Like [`log`](Self::log) for `format_args!` output; nothing is
    /// formatted when the record is filtered out.
    pub fn log_fmt(&self, severity: Severity, args: fmt::Arguments<'_>) {
        if !self.should_log(severity) {
            return;
        }
        let line = self.formatter.format_args(args);
        self.emit(severity, line);
    }

    fn emit(&self, severity: Severity, line: Vec<u8>) {
        if severity != Severity::Fatal {
            self.writer.submit(LogRecord::new(severity, line));
            return;
        }
        self.deliver_fatal(line, &mut io::stderr().lock());
        std::process::abort();
    }

    /// Queues and flushes a fatal line, or writes it to `fallback` when the
    /// writer no longer accepts records.
    fn deliver_fatal(&self, line: Vec<u8>, fallback: &mut dyn Write) {
        let record = LogRecord::new(Severity::Fatal, line);
        if self.writer.submit(record.clone()) {
            self.writer.flush();
        } else {
            let _ = fallback.write_all(record.payload());
            let _ = fallback.flush();
        }
    }

    /// Blocks until every record logged before this call reached the
    /// operating system.
    pub fn flush(&self) {
        self.writer.flush();
    }

    /// Replaces the severity threshold.
    pub fn set_level(&self, level: Severity) {
        self.filter.set(level);
    }

    /// Current severity threshold.
    #[must_use]
    pub fn level(&self) -> Severity {
        self.filter.get()
    }

    /// Writes to `path` (a symbolic link to `<path>.<stamp>`) from now on.
    ///
    /// On failure the logger writes to standard output.
    pub fn set_log_file(&self, path: impl Into<PathBuf>, append: bool) -> Result<(), LogError> {
        Ok(self.writer.open_log_file(path, append)?)
    }

    /// Writes to standard output from now on.
    pub fn use_stdout(&self) -> Result<(), LogError> {
        Ok(self.writer.use_stdout()?)
    }

    /// Mirrors warning and fatal lines into `path`.
    ///
    /// On failure no warning file is used.
    pub fn set_warning_file(
        &self,
        path: impl Into<PathBuf>,
        append: bool,
    ) -> Result<(), LogError> {
        Ok(self.writer.open_warning_file(path, append)?)
    }

    /// Stops mirroring into the warning file.
    pub fn clear_warning_file(&self) -> Result<(), LogError> {
        Ok(self.writer.close_warning_file()?)
    }

    /// Rotates the log file once it exceeds `megabytes` MiB; 0 disables
    /// rotation.
    pub fn set_log_size(&self, megabytes: u64) -> Result<(), LogError> {
        self.set_log_size_bytes(rotation_threshold(megabytes)?)
    }

    /// Rotates the log file once it exceeds `bytes`; 0 disables rotation.
    pub fn set_log_size_bytes(&self, bytes: u64) -> Result<(), LogError> {
        Ok(self.writer.set_rotation_threshold(bytes)?)
    }

    /// Keeps at most `count` physical log files; 0 keeps all of them.
    pub fn set_log_count(&self, count: usize) -> Result<(), LogError> {
        Ok(self.writer.set_retention(count)?)
    }

    /// Snapshot of the writer's counters.
    #[must_use]
    pub fn stats(&self) -> WriterStats {
        self.writer.stats()
    }

    /// Drains every queued record and stops the writer thread. Records
    /// logged afterwards are dropped. Later calls are no-ops.
    pub fn shutdown(&self) {
        self.writer.shutdown();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}

fn rotation_threshold(megabytes: u64) -> Result<u64, LogError> {
    megabytes
        .checked_mul(BYTES_PER_MEGABYTE)
        .ok_or(LogError::SizeOverflow { megabytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_in_megabytes_converts_to_bytes() {
        assert_eq!(rotation_threshold(0).unwrap(), 0);
        assert_eq!(rotation_threshold(3).unwrap(), 3 << 20);
        assert!(matches!(
            rotation_threshold(u64::MAX),
            Err(LogError::SizeOverflow { megabytes: u64::MAX })
        ));
    }

    #[test]
    fn start_rejects_oversized_log_size() {
        let error = Logger::start(LoggerConfig::default().with_log_size_mb(u64::MAX)).unwrap_err();
        assert!(matches!(error, LogError::SizeOverflow { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn fatal_line_reaches_file_before_return() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let logger = Logger::start(LoggerConfig::default().with_log_file(&path, false)).unwrap();

        let mut fallback = Vec::new();
        logger.deliver_fatal(b"fatal line\n".to_vec(), &mut fallback);

        assert!(fallback.is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), b"fatal line\n");
    }

    #[cfg(unix)]
    #[test]
    fn fatal_line_after_shutdown_goes_to_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let logger = Logger::start(LoggerConfig::default().with_log_file(&path, false)).unwrap();
        logger.shutdown();

        let mut fallback = Vec::new();
        logger.deliver_fatal(b"fatal line\n".to_vec(), &mut fallback);

        assert_eq!(fallback, b"fatal line\n");
        assert!(std::fs::read(&path).unwrap().is_empty());
    }

    #[test]
    fn level_round_trips() {
        let logger = Logger::start(LoggerConfig::default().with_level(Severity::Warning)).unwrap();
        assert_eq!(logger.level(), Severity::Warning);
        assert!(!logger.should_log(Severity::Info));
        logger.set_level(Severity::Debug);
        assert!(logger.should_log(Severity::Debug));
    }
}
