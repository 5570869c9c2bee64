//! crates/logging-sink/src/clock.rs
//! Timestamp rendering for log lines and rotated file names.

use std::fmt;
use std::sync::OnceLock;

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Source of wall-clock time for the writer and the formatter.
///
/// The writer only needs two renderings: the human-readable stamp at the start
/// of each line and the filesystem-safe stamp appended to rotated file names.
/// Tests substitute their own implementation to make rotation names
/// predictable.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time.
    fn now(&self) -> OffsetDateTime;

    /// Line timestamp, `MM/DD HH:MM:SS.ffffff`.
    fn now_time_string(&self) -> String {
        render_line_timestamp(self.now())
    }

    /// File name suffix, `YYYYMMDD-HHMMSS.ffffff`.
    fn file_stamp(&self) -> String {
        render_file_stamp(self.now())
    }
}

/// Wall clock shifted to the local offset captured at construction.
///
/// The local offset can only be queried soundly while the process is
/// single-threaded on some platforms, so it is resolved once and cached. When
/// it cannot be determined the clock reports UTC.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    /// Creates a clock using the local offset if it can be determined.
    #[must_use]
    pub fn new() -> Self {
        Self {
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    /// Creates a clock that always reports UTC.
    #[must_use]
    pub const fn utc() -> Self {
        Self {
            offset: UtcOffset::UTC,
        }
    }

    /// Offset applied to the system time.
    #[must_use]
    pub const fn offset(&self) -> UtcOffset {
        self.offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

fn process_clock() -> &'static SystemClock {
    static CLOCK: OnceLock<SystemClock> = OnceLock::new();
    CLOCK.get_or_init(SystemClock::new)
}

/// Renders the current time with the process-wide [`SystemClock`].
#[must_use]
pub fn now_time_string() -> String {
    process_clock().now_time_string()
}

/// Renders `moment` the way it appears at the start of a log line.
#[must_use]
pub fn render_line_timestamp(moment: OffsetDateTime) -> String {
    moment
        .format(format_description!(
            "[month]/[day] [hour]:[minute]:[second].[subsecond digits:6]"
        ))
        .unwrap_or_else(|_| "00/00 00:00:00.000000".to_owned())
}

/// Renders `moment` as a suffix that is safe to embed in a file name.
#[must_use]
pub fn render_file_stamp(moment: OffsetDateTime) -> String {
    moment
        .format(format_description!(
            "[year][month][day]-[hour][minute][second].[subsecond digits:6]"
        ))
        .unwrap_or_else(|_| "00000000-000000.000000".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn line_timestamp_layout() {
        let moment = datetime!(2024-03-07 09:05:01.000042 UTC);
        assert_eq!(render_line_timestamp(moment), "03/07 09:05:01.000042");
    }

    #[test]
    fn file_stamp_has_no_path_separators() {
        let moment = datetime!(2024-12-31 23:59:59.999999 UTC);
        let stamp = render_file_stamp(moment);
        assert_eq!(stamp, "20241231-235959.999999");
        assert!(!stamp.contains('/'));
        assert!(!stamp.contains(' '));
    }

    #[test]
    fn utc_clock_reports_zero_offset() {
        let clock = SystemClock::utc();
        assert_eq!(clock.offset(), UtcOffset::UTC);
        assert!(clock.now().offset().is_utc());
    }

    #[test]
    fn process_clock_renders_fixed_width() {
        let rendered = now_time_string();
        assert_eq!(rendered.len(), "MM/DD HH:MM:SS.ffffff".len());
    }
}
