//! crates/logging/src/format.rs
//! Rendering of log lines: `<timestamp> <thread-id> <message>\n`.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use logging_sink::{Clock, SystemClock};

/// Longest line handed to the writer, newline included.
pub const MAX_LINE_BYTES: usize = 30_000;

thread_local! {
    static THREAD_ID: u64 = current_thread_id();
}

/// Identifier printed for the calling thread.
///
/// On Linux this is the kernel thread id, matching what `ps -L` and `top -H`
/// report. Elsewhere it is a small per-process counter assigned on first use.
#[must_use]
pub fn thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

#[cfg(target_os = "linux")]
fn current_thread_id() -> u64 {
    rustix::thread::gettid().as_raw_nonzero().get().unsigned_abs().into()
}

#[cfg(not(target_os = "linux"))]
fn current_thread_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Turns caller messages into newline-terminated log lines.
#[derive(Clone)]
pub struct LineFormatter {
    clock: Arc<dyn Clock>,
}

impl LineFormatter {
    /// Creates a formatter stamping lines with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Renders `message` as one line for the calling thread.
    ///
    /// A trailing newline is appended only when `message` lacks one. Lines
    /// longer than [`MAX_LINE_BYTES`] are cut and re-terminated.
    #[must_use]
    pub fn format(&self, message: &[u8]) -> Vec<u8> {
        let timestamp = self.clock.now_time_string();
        let mut line = Vec::with_capacity(timestamp.len() + message.len() + 24);
        line.extend_from_slice(timestamp.as_bytes());
        // Writing into a Vec cannot fail.
        let _ = write!(line, " {} ", thread_id());
        line.extend_from_slice(message);
        terminate(&mut line);
        line
    }

    /// Renders pre-formatted arguments; see [`format`](Self::format).
    #[must_use]
    pub fn format_args(&self, args: fmt::Arguments<'_>) -> Vec<u8> {
        match args.as_str() {
            Some(message) => self.format(message.as_bytes()),
            None => self.format(args.to_string().as_bytes()),
        }
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }
}

impl fmt::Debug for LineFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineFormatter")
            .field("clock", &self.clock)
            .finish()
    }
}

fn terminate(line: &mut Vec<u8>) {
    if line.len() > MAX_LINE_BYTES {
        line.truncate(MAX_LINE_BYTES - 1);
        line.push(b'\n');
    } else if line.last() != Some(&b'\n') {
        if line.len() == MAX_LINE_BYTES {
            line.pop();
        }
        line.push(b'\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use time::macros::datetime;

    #[derive(Debug)]
    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            datetime!(2024-05-06 07:08:09.123456 UTC)
        }
    }

    fn formatter() -> LineFormatter {
        LineFormatter::new(Arc::new(FixedClock))
    }

    fn prefix() -> String {
        format!("05/06 07:08:09.123456 {} ", thread_id())
    }

    #[test]
    fn appends_missing_newline() {
        let line = formatter().format(b"hello");
        assert_eq!(line, format!("{}hello\n", prefix()).into_bytes());
    }

    #[test]
    fn keeps_existing_newline() {
        let line = formatter().format(b"hello\n");
        assert_eq!(line, format!("{}hello\n", prefix()).into_bytes());
    }

    #[test]
    fn empty_message_still_produces_a_line() {
        let line = formatter().format(b"");
        assert_eq!(line, format!("{}\n", prefix()).into_bytes());
    }

    #[test]
    fn format_args_matches_format() {
        let formatter = formatter();
        let value = 42;
        assert_eq!(
            formatter.format_args(format_args!("answer={value}")),
            formatter.format(b"answer=42")
        );
    }

    #[test]
    fn long_lines_are_capped() {
        let message = vec![b'x'; MAX_LINE_BYTES * 2];
        let line = formatter().format(&message);
        assert_eq!(line.len(), MAX_LINE_BYTES);
        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(line.iter().filter(|&&b| b == b'\n').count(), 1);
    }

    #[test]
    fn line_exactly_at_cap_without_newline_stays_at_cap() {
        let overhead = prefix().len();
        let message = vec![b'y'; MAX_LINE_BYTES - overhead];
        let line = formatter().format(&message);
        assert_eq!(line.len(), MAX_LINE_BYTES);
        assert_eq!(line.last(), Some(&b'\n'));
    }

    #[test]
    fn thread_ids_differ_between_threads() {
        let here = thread_id();
        assert_eq!(here, thread_id());
        let there = std::thread::spawn(thread_id).join().unwrap();
        assert_ne!(here, there);
    }
}
