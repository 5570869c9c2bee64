//! crates/logging-sink/src/entry.rs
//! Values travelling through the log queue.

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc;

use crate::error::SinkError;
use crate::severity::Severity;

/// One fully formatted log line waiting to be written.
///
/// The payload is immutable once enqueued. `sequence` is stamped by the queue
/// under its lock and therefore reflects the commit order.
#[derive(Clone, PartialEq, Eq)]
pub struct LogRecord {
    severity: Severity,
    payload: Box<[u8]>,
    sequence: u64,
}

impl LogRecord {
    /// Creates a record; the sequence number is assigned on enqueue.
    #[must_use]
    pub fn new(severity: Severity, payload: impl Into<Box<[u8]>>) -> Self {
        Self {
            severity,
            payload: payload.into(),
            sequence: 0,
        }
    }

    /// Severity of the line.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Formatted bytes, normally newline-terminated.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Position of the record in enqueue order.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// Number of payload bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Reports whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl fmt::Debug for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("severity", &self.severity)
            .field("payload", &String::from_utf8_lossy(&self.payload))
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Channel used by configuration calls to wait for the writer's verdict.
pub(crate) type Reply = mpsc::Sender<Result<(), SinkError>>;

/// Sink reconfiguration executed by the writer thread in queue order.
#[derive(Debug)]
pub(crate) enum SinkCommand {
    /// Open `<path>.<stamp>`, link `path` to it and make it the primary sink.
    OpenLog {
        path: PathBuf,
        append: bool,
        reply: Reply,
    },
    /// Replace the warning sink.
    OpenWarning {
        path: PathBuf,
        append: bool,
        reply: Reply,
    },
    /// Drop the warning sink.
    CloseWarning,
    /// Route the primary sink to standard output.
    UseStdout,
    /// Rotation threshold in bytes, 0 disables rotation.
    SetRotationThreshold(u64),
    /// Number of physical files kept, 0 keeps all of them.
    SetRetention(usize),
}

/// Item stored in the log queue.
#[derive(Debug)]
pub(crate) enum QueueEntry {
    /// A line to write.
    Record(LogRecord),
    /// Flush request; everything queued before it is durable once its ticket
    /// is reported complete.
    FlushMarker(u64),
    /// Sink reconfiguration.
    Control(SinkCommand),
}

impl QueueEntry {
    pub(crate) const fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}
