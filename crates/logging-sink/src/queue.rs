//! crates/logging-sink/src/queue.rs
//! Ordered handoff between producer threads and the writer thread.
//!
//! # Locking
//!
//! A single mutex guards the entry list together with the flush bookkeeping.
//! Producers hold it only long enough to append; the writer holds it only to
//! pop the next entry and to publish flush completion. It is never held
//! across file I/O.
//!
//! Three condition variables hang off the mutex:
//!
//! - `jobs` wakes the writer when work arrives or the stop flag is raised;
//! - `drained` wakes [`flush`](LogQueue::flush) callers once their ticket has
//!   been processed and the sinks flushed;
//! - `space` wakes producers blocked on a full bounded queue.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::entry::{LogRecord, QueueEntry, SinkCommand};
use crate::error::SinkError;
use crate::severity::Severity;

/// What a producer experiences when a bounded queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OverflowPolicy {
    /// Wait until the writer frees a slot.
    #[default]
    Block,
    /// Discard the record being enqueued.
    DropNewest,
    /// Discard the oldest queued record to make room.
    DropOldest,
}

/// Capacity settings for the log queue.
///
/// The default is unbounded: producers never wait and nothing is dropped,
/// at the cost of unbounded memory under sustained overload. Only log records
/// count against the capacity; flush markers, sink commands and fatal records
/// are always accepted, and fatal records are never evicted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueConfig {
    /// Maximum number of queued records, `None` for unbounded.
    #[cfg_attr(feature = "serde", serde(default))]
    pub capacity: Option<NonZeroUsize>,
    /// Behaviour once `capacity` records are queued.
    #[cfg_attr(feature = "serde", serde(default))]
    pub overflow: OverflowPolicy,
}

impl QueueConfig {
    /// Unbounded queue.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            capacity: None,
            overflow: OverflowPolicy::Block,
        }
    }

    /// Bounded queue holding at most `capacity` records.
    #[must_use]
    pub const fn bounded(capacity: NonZeroUsize, overflow: OverflowPolicy) -> Self {
        Self {
            capacity: Some(capacity),
            overflow,
        }
    }
}

/// Mutable queue state guarded by the queue mutex.
#[derive(Debug, Default)]
pub(crate) struct QueueState {
    entries: VecDeque<QueueEntry>,
    records: usize,
    next_sequence: u64,
    next_ticket: u64,
    completed_ticket: u64,
    stopped: bool,
    exited: bool,
}

impl QueueState {
    /// Removes the head entry, keeping the record count in step.
    pub(crate) fn pop_front(&mut self) -> Option<QueueEntry> {
        let entry = self.entries.pop_front()?;
        if entry.is_record() {
            self.records -= 1;
        }
        Some(entry)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) const fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn drop_oldest_record(&mut self) -> bool {
        let evictable = |entry: &QueueEntry| {
            matches!(entry, QueueEntry::Record(record) if record.severity() != Severity::Fatal)
        };
        let Some(index) = self.entries.iter().position(evictable) else {
            return false;
        };
        self.entries.remove(index);
        self.records -= 1;
        true
    }
}

/// FIFO of pending entries shared by producers and the writer.
#[derive(Debug)]
pub(crate) struct LogQueue {
    state: Mutex<QueueState>,
    jobs: Condvar,
    drained: Condvar,
    space: Condvar,
    config: QueueConfig,
    dropped: AtomicU64,
}

impl LogQueue {
    pub(crate) fn new(config: QueueConfig) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            jobs: Condvar::new(),
            drained: Condvar::new(),
            space: Condvar::new(),
            config,
            dropped: AtomicU64::new(0),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) const fn config(&self) -> QueueConfig {
        self.config
    }

    /// Number of records discarded by the overflow policy or after shutdown.
    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Number of entries currently waiting, including markers and commands.
    pub(crate) fn depth(&self) -> usize {
        self.lock().entries.len()
    }

    fn note_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Appends `record` and wakes the writer.
    ///
    /// Returns `false` when the record was discarded, either because the
    /// writer has stopped or because the overflow policy rejected it. Fatal
    /// records skip the capacity check.
    pub(crate) fn push_record(&self, mut record: LogRecord) -> bool {
        let mut state = self.lock();
        if state.stopped {
            self.note_dropped();
            return false;
        }

        let capacity = match record.severity() {
            Severity::Fatal => None,
            _ => self.config.capacity,
        };
        if let Some(capacity) = capacity {
            while state.records >= capacity.get() {
                match self.config.overflow {
                    OverflowPolicy::Block => {
                        state = self
                            .space
                            .wait(state)
                            .unwrap_or_else(PoisonError::into_inner);
                        if state.stopped {
                            self.note_dropped();
                            return false;
                        }
                    }
                    OverflowPolicy::DropNewest => {
                        self.note_dropped();
                        return false;
                    }
                    OverflowPolicy::DropOldest => {
                        if state.drop_oldest_record() {
                            self.note_dropped();
                        }
                        break;
                    }
                }
            }
        }

        record.set_sequence(state.next_sequence);
        state.next_sequence += 1;
        state.entries.push_back(QueueEntry::Record(record));
        state.records += 1;
        self.jobs.notify_one();
        true
    }

    /// Appends a sink command; fails once the writer has stopped.
    pub(crate) fn push_command(&self, command: SinkCommand) -> Result<(), SinkError> {
        let mut state = self.lock();
        if state.stopped {
            return Err(SinkError::Stopped);
        }
        state.entries.push_back(QueueEntry::Control(command));
        self.jobs.notify_one();
        Ok(())
    }

    /// Enqueues a flush marker and blocks until the writer has processed it.
    ///
    /// Every record enqueued before this call has been handed to the
    /// operating system when it returns. While a shutdown is draining, waits
    /// for the writer to exit instead; returns immediately once it has.
    pub(crate) fn flush(&self) {
        let mut state = self.lock();
        if state.exited {
            return;
        }
        if state.stopped {
            // The final drain flushes everything queued before the stop flag.
            let _state = self
                .drained
                .wait_while(state, |s| !s.exited)
                .unwrap_or_else(PoisonError::into_inner);
            return;
        }
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        state.entries.push_back(QueueEntry::FlushMarker(ticket));
        self.jobs.notify_one();

        let _state = self
            .drained
            .wait_while(state, |s| s.completed_ticket < ticket && !s.exited)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Writer side: wakes producers blocked on a full queue after a pop.
    pub(crate) fn notify_space(&self) {
        if self.config.capacity.is_some() {
            self.space.notify_all();
        }
    }

    /// Writer side: publishes the highest flush ticket handled this round.
    pub(crate) fn complete_round(&self, state: &mut QueueState, ticket: Option<u64>) {
        if let Some(ticket) = ticket {
            state.completed_ticket = state.completed_ticket.max(ticket);
        }
        self.drained.notify_all();
    }

    /// Writer side: sleeps until work arrives or the stop flag is raised.
    pub(crate) fn wait_for_work<'a>(
        &self,
        state: MutexGuard<'a, QueueState>,
    ) -> MutexGuard<'a, QueueState> {
        self.jobs
            .wait_while(state, |s| s.entries.is_empty() && !s.stopped)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Raises the stop flag. Entries already queued are still drained.
    pub(crate) fn stop(&self) {
        let mut state = self.lock();
        state.stopped = true;
        self.jobs.notify_one();
        self.space.notify_all();
    }

    /// Records that the writer thread has exited, releasing every waiter.
    pub(crate) fn mark_exited(&self) {
        let mut state = self.lock();
        state.stopped = true;
        state.exited = true;
        self.drained.notify_all();
        self.space.notify_all();
    }
}
