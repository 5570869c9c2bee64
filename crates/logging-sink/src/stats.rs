//! Counters maintained by the writer thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of the writer's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Records written to the primary sink.
    pub records_written: u64,
    /// Bytes written to the primary sink.
    pub bytes_written: u64,
    /// Bytes mirrored into the warning sink.
    pub warning_bytes_written: u64,
    /// Completed rotations.
    pub rotations: u64,
    /// Records discarded by the overflow policy or after shutdown.
    pub records_dropped: u64,
    /// Failed writes or flushes.
    pub io_errors: u64,
    /// Entries waiting in the queue when the snapshot was taken.
    pub queue_depth: usize,
}

#[derive(Debug, Default)]
pub(crate) struct WriterCounters {
    records_written: AtomicU64,
    bytes_written: AtomicU64,
    warning_bytes_written: AtomicU64,
    rotations: AtomicU64,
    io_errors: AtomicU64,
}

impl WriterCounters {
    pub(crate) fn record_primary(&self, bytes: usize) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_warning(&self, bytes: usize) {
        self.warning_bytes_written
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts an I/O failure and returns the previous total.
    pub(crate) fn record_io_error(&self) -> u64 {
        self.io_errors.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self, records_dropped: u64, queue_depth: usize) -> WriterStats {
        WriterStats {
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            warning_bytes_written: self.warning_bytes_written.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            records_dropped,
            io_errors: self.io_errors.load(Ordering::Relaxed),
            queue_depth,
        }
    }
}
