//! Background writer thread and its producer-facing handle.
//!
//! All file I/O happens on one dedicated [`std::thread`] so producers never
//! block on disk. Producers append to the [`LogQueue`](crate::queue) and
//! return; the writer drains the queue in FIFO order.
//!
//! # Thread Protocol
//!
//! ```text
//! Producer threads                       Writer thread
//! ────────────────                       ─────────────
//! submit(record)  ──── Record ────▶      rotate if due, write, mirror
//! submit(record)  ──── Record ────▶      ...
//! flush()         ── FlushMarker(n) ─▶   (queue empty) flush sinks
//!    waits        ◀─── drained(n) ────   broadcast completion
//! open_log_file() ──── Control ───▶      open X.<stamp>, link X
//!    waits        ◀──── reply ─────
//! shutdown()      ──── stop flag ──▶     drain remaining, flush, exit
//!    joins
//! ```
//!
//! # Phases
//!
//! `Idle` (waiting for a signal) → `Draining` (popping entries one at a time,
//! queue lock released around every I/O call) → `Flushing` (flush sinks that
//! received bytes, publish flush tickets) → back to `Idle`, or `Stopped` once
//! the stop flag is seen with an empty queue.

mod worker;

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use crate::clock::{Clock, SystemClock};
use crate::entry::{LogRecord, SinkCommand};
use crate::error::SinkError;
use crate::queue::{LogQueue, QueueConfig};
use crate::stats::{WriterCounters, WriterStats};

use worker::Worker;

/// Name given to the writer thread.
pub const WRITER_THREAD_NAME: &str = "log-writer";

/// Number of bytes in one "megabyte" of the size threshold.
pub const BYTES_PER_MEGABYTE: u64 = 1 << 20;

/// Lifecycle phase of the writer thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WriterPhase {
    /// Waiting for work.
    Idle = 0,
    /// Processing queued entries.
    Draining = 1,
    /// Flushing sinks and notifying flush waiters.
    Flushing = 2,
    /// Terminated; no further entries are processed.
    Stopped = 3,
}

impl WriterPhase {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Draining,
            2 => Self::Flushing,
            _ => Self::Stopped,
        }
    }
}

/// Settings applied when the writer starts.
#[derive(Clone)]
pub struct WriterConfig {
    /// Rotation threshold in bytes; 0 disables rotation.
    pub rotation_threshold: u64,
    /// Physical log files to keep; 0 keeps all of them.
    pub retention: usize,
    /// Queue capacity and overflow behaviour.
    pub queue: QueueConfig,
    /// Also sync file data to disk whenever sinks are flushed.
    pub sync_on_flush: bool,
    /// Time source for rotated file names.
    pub clock: Arc<dyn Clock>,
}

impl WriterConfig {
    /// Sets the rotation threshold in bytes.
    #[must_use]
    pub fn with_rotation_threshold(mut self, bytes: u64) -> Self {
        self.rotation_threshold = bytes;
        self
    }

    /// Sets the number of physical files kept.
    #[must_use]
    pub fn with_retention(mut self, count: usize) -> Self {
        self.retention = count;
        self
    }

    /// Sets the queue configuration.
    #[must_use]
    pub fn with_queue(mut self, queue: QueueConfig) -> Self {
        self.queue = queue;
        self
    }

    /// Enables or disables syncing file data on flush.
    #[must_use]
    pub fn with_sync_on_flush(mut self, sync: bool) -> Self {
        self.sync_on_flush = sync;
        self
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            rotation_threshold: 0,
            retention: 0,
            queue: QueueConfig::default(),
            sync_on_flush: false,
            clock: Arc::new(SystemClock::new()),
        }
    }
}

impl fmt::Debug for WriterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterConfig")
            .field("rotation_threshold", &self.rotation_threshold)
            .field("retention", &self.retention)
            .field("queue", &self.queue)
            .field("sync_on_flush", &self.sync_on_flush)
            .finish_non_exhaustive()
    }
}

/// State shared between the handle and the writer thread.
#[derive(Debug)]
struct Shared {
    queue: LogQueue,
    counters: WriterCounters,
    phase: AtomicU8,
    thread_id: OnceLock<ThreadId>,
}

impl Shared {
    fn set_phase(&self, phase: WriterPhase) {
        self.phase.store(phase as u8, Ordering::Relaxed);
    }

    fn on_writer_thread(&self) -> bool {
        self.thread_id.get() == Some(&thread::current().id())
    }
}

/// Handle to the background writer.
///
/// Dropping the handle shuts the writer down after draining every entry
/// queued so far.
pub struct AsyncWriter {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncWriter {
    /// Starts the writer thread with standard output as the primary sink.
    pub fn spawn(config: WriterConfig) -> Result<Self, SinkError> {
        let shared = Arc::new(Shared {
            queue: LogQueue::new(config.queue),
            counters: WriterCounters::default(),
            phase: AtomicU8::new(WriterPhase::Idle as u8),
            thread_id: OnceLock::new(),
        });

        let worker = Worker::new(Arc::clone(&shared), &config);
        let registered = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(WRITER_THREAD_NAME.into())
            .spawn(move || {
                let _ = registered.thread_id.set(thread::current().id());
                drop(registered);
                worker.run();
            })
            .map_err(SinkError::Spawn)?;

        tracing::debug!(queue = ?config.queue, "log writer started");
        Ok(Self {
            shared,
            thread: Mutex::new(Some(handle)),
        })
    }

    /// Enqueues a record without waiting for it to be written.
    ///
    /// Returns `false` if the record was discarded (writer stopped, or the
    /// bounded queue's overflow policy rejected it).
    pub fn submit(&self, record: LogRecord) -> bool {
        self.shared.queue.push_record(record)
    }

    /// Blocks until every record submitted before this call has been handed
    /// to the operating system.
    ///
    /// During a shutdown it waits for the final drain to finish. Returns
    /// immediately once the writer has exited or when called from the writer
    /// thread itself.
    pub fn flush(&self) {
        if self.shared.on_writer_thread() {
            return;
        }
        self.shared.queue.flush();
    }

    /// Makes `path` the logical name of the primary log file.
    ///
    /// Bytes go to `<path>.<stamp>` and `path` becomes a symbolic link to
    /// it. On failure the primary sink falls back to standard output.
    pub fn open_log_file(&self, path: impl Into<PathBuf>, append: bool) -> Result<(), SinkError> {
        let path = path.into();
        self.request(|reply| SinkCommand::OpenLog {
            path,
            append,
            reply,
        })
    }

    /// Opens `path` as the warning sink. On failure the warning sink is
    /// disabled.
    pub fn open_warning_file(
        &self,
        path: impl Into<PathBuf>,
        append: bool,
    ) -> Result<(), SinkError> {
        let path = path.into();
        self.request(|reply| SinkCommand::OpenWarning {
            path,
            append,
            reply,
        })
    }

    /// Disables the warning sink.
    pub fn close_warning_file(&self) -> Result<(), SinkError> {
        self.shared.queue.push_command(SinkCommand::CloseWarning)
    }

    /// Routes the primary sink back to standard output.
    pub fn use_stdout(&self) -> Result<(), SinkError> {
        self.shared.queue.push_command(SinkCommand::UseStdout)
    }

    /// Changes the rotation threshold in bytes; 0 disables rotation.
    pub fn set_rotation_threshold(&self, bytes: u64) -> Result<(), SinkError> {
        self.shared
            .queue
            .push_command(SinkCommand::SetRotationThreshold(bytes))
    }

    /// Changes how many physical log files are kept; 0 keeps all.
    pub fn set_retention(&self, count: usize) -> Result<(), SinkError> {
        self.shared
            .queue
            .push_command(SinkCommand::SetRetention(count))
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> WriterPhase {
        WriterPhase::from_u8(self.shared.phase.load(Ordering::Relaxed))
    }

    /// Reports whether the writer still accepts entries.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shared.queue.lock().is_stopped()
    }

    /// Queue capacity settings the writer was started with.
    #[must_use]
    pub fn queue_config(&self) -> QueueConfig {
        self.shared.queue.config()
    }

    /// Snapshot of the writer's counters.
    #[must_use]
    pub fn stats(&self) -> WriterStats {
        self.shared
            .counters
            .snapshot(self.shared.queue.dropped(), self.shared.queue.depth())
    }

    /// Stops the writer after draining everything queued so far and joins
    /// the thread. Later calls are no-ops.
    pub fn shutdown(&self) {
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };

        self.shared.queue.stop();
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            tracing::warn!("log writer thread panicked");
        }
        tracing::debug!("log writer stopped");
    }

    fn request(
        &self,
        command: impl FnOnce(mpsc::Sender<Result<(), SinkError>>) -> SinkCommand,
    ) -> Result<(), SinkError> {
        if self.shared.on_writer_thread() {
            return Err(SinkError::OnWriterThread);
        }
        let (reply, verdict) = mpsc::channel();
        self.shared.queue.push_command(command(reply))?;
        verdict.recv().unwrap_or(Err(SinkError::Stopped))
    }
}

impl fmt::Debug for AsyncWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncWriter")
            .field("phase", &self.phase())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Drop for AsyncWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_thread_registers_its_id_before_running() {
        let writer = AsyncWriter::spawn(WriterConfig::default()).unwrap();
        writer.flush();

        let expected = writer
            .thread
            .lock()
            .unwrap()
            .as_ref()
            .map(|handle| handle.thread().id());
        assert_eq!(writer.shared.thread_id.get().copied(), expected);
        assert!(!writer.shared.on_writer_thread());
        writer.shutdown();
    }
}
