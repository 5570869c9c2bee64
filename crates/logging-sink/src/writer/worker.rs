//! Writer thread main loop.

use std::io::{self, Write};
use std::sync::Arc;

use super::{Shared, WriterConfig, WriterPhase};
use crate::clock::Clock;
use crate::entry::{LogRecord, QueueEntry, SinkCommand};
use crate::rotation::{RotationManager, RotationOutcome};
use crate::sink::{LogFile, PrimarySink};

/// Bytes and flush tickets accumulated during one drain round.
#[derive(Debug, Default)]
struct Round {
    primary_bytes: usize,
    warning_bytes: usize,
    ticket: Option<u64>,
}

impl Round {
    fn note_ticket(&mut self, ticket: u64) {
        self.ticket = Some(self.ticket.map_or(ticket, |seen| seen.max(ticket)));
    }
}

/// Marks the writer as exited even if the loop unwinds, so flush waiters and
/// blocked producers are never stranded.
struct ExitGuard(Arc<Shared>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.set_phase(WriterPhase::Stopped);
        self.0.queue.mark_exited();
    }
}

/// Sink state owned exclusively by the writer thread.
pub(super) struct Worker {
    shared: Arc<Shared>,
    primary: PrimarySink,
    warning: Option<LogFile>,
    rotation: RotationManager,
    clock: Arc<dyn Clock>,
    sync_on_flush: bool,
    failing: bool,
}

impl Worker {
    pub(super) fn new(shared: Arc<Shared>, config: &WriterConfig) -> Self {
        Self {
            shared,
            primary: PrimarySink::Stdout,
            warning: None,
            rotation: RotationManager::new(config.rotation_threshold, config.retention),
            clock: Arc::clone(&config.clock),
            sync_on_flush: config.sync_on_flush,
            failing: false,
        }
    }

    pub(super) fn run(mut self) {
        let shared = Arc::clone(&self.shared);
        let _exit = ExitGuard(Arc::clone(&shared));
        let queue = &shared.queue;

        let mut state = queue.lock();
        loop {
            shared.set_phase(WriterPhase::Draining);
            let mut round = Round::default();
            while let Some(entry) = state.pop_front() {
                drop(state);
                if entry.is_record() {
                    queue.notify_space();
                }
                self.process(entry, &mut round);
                state = queue.lock();
            }

            shared.set_phase(WriterPhase::Flushing);
            drop(state);
            self.flush_round(&round);
            state = queue.lock();
            queue.complete_round(&mut state, round.ticket);

            if !state.is_empty() {
                continue;
            }
            if state.is_stopped() {
                break;
            }
            shared.set_phase(WriterPhase::Idle);
            state = queue.wait_for_work(state);
        }
        drop(state);

        self.close();
    }

    fn process(&mut self, entry: QueueEntry, round: &mut Round) {
        match entry {
            QueueEntry::Record(record) => self.write_record(&record, round),
            QueueEntry::FlushMarker(ticket) => round.note_ticket(ticket),
            QueueEntry::Control(command) => self.apply(command),
        }
    }

    fn write_record(&mut self, record: &LogRecord, round: &mut Round) {
        if let Some(RotationOutcome::Rotated { .. }) =
            self.rotation.rotate_if_due(&mut self.primary, &*self.clock)
        {
            self.shared.counters.record_rotation();
        }

        let payload = record.payload();
        if payload.is_empty() {
            return;
        }

        match self.primary.write_payload(payload) {
            Ok(()) => {
                round.primary_bytes += payload.len();
                self.rotation.record_written(payload.len());
                self.shared.counters.record_primary(payload.len());
                self.failing = false;
            }
            Err(error) => self.report_io_error("write to log file", &error),
        }

        if !record.severity().mirrors_to_warning_file() {
            return;
        }
        let mirrored = match self.warning.as_mut() {
            Some(warning) => warning.write_all(payload),
            None => return,
        };
        match mirrored {
            Ok(()) => {
                round.warning_bytes += payload.len();
                self.shared.counters.record_warning(payload.len());
            }
            Err(error) => self.report_io_error("write to warning file", &error),
        }
    }

    fn flush_round(&mut self, round: &Round) {
        let requested = round.ticket.is_some();
        if round.primary_bytes > 0 || requested {
            if let Err(error) = self.primary.flush(self.sync_on_flush) {
                self.report_io_error("flush log file", &error);
            }
        }
        if round.warning_bytes > 0 || requested {
            let sync = self.sync_on_flush;
            let flushed = self
                .warning
                .as_mut()
                .map_or(Ok(()), |warning| warning.flush_to_os(sync));
            if let Err(error) = flushed {
                self.report_io_error("flush warning file", &error);
            }
        }
    }

    fn apply(&mut self, command: SinkCommand) {
        match command {
            SinkCommand::OpenLog {
                path,
                append,
                reply,
            } => {
                self.retire_primary();
                let result = match self.rotation.open_physical(&path, append, &*self.clock) {
                    Ok(file) => {
                        tracing::debug!(path = %file.path().display(), "log file opened");
                        self.primary = PrimarySink::File(file);
                        Ok(())
                    }
                    Err(error) => {
                        tracing::warn!(%error, "falling back to standard output");
                        self.primary = PrimarySink::Stdout;
                        self.rotation.detach();
                        Err(error)
                    }
                };
                let _ = reply.send(result);
            }
            SinkCommand::OpenWarning {
                path,
                append,
                reply,
            } => {
                self.retire_warning();
                let result = LogFile::open(path, append).map(|file| {
                    self.warning = Some(file);
                });
                if let Err(error) = &result {
                    tracing::warn!(%error, "warning file disabled");
                }
                let _ = reply.send(result);
            }
            SinkCommand::CloseWarning => self.retire_warning(),
            SinkCommand::UseStdout => {
                self.retire_primary();
                self.primary = PrimarySink::Stdout;
                self.rotation.detach();
            }
            SinkCommand::SetRotationThreshold(bytes) => self.rotation.set_threshold(bytes),
            SinkCommand::SetRetention(count) => self.rotation.set_retention(count),
        }
    }

    /// Flushes the primary sink before it is replaced.
    fn retire_primary(&mut self) {
        if let Err(error) = self.primary.flush(self.sync_on_flush) {
            self.report_io_error("flush log file", &error);
        }
    }

    /// Flushes and drops the warning sink.
    fn retire_warning(&mut self) {
        if let Some(mut warning) = self.warning.take() {
            if let Err(error) = warning.flush_to_os(self.sync_on_flush) {
                self.report_io_error("flush warning file", &error);
            }
        }
    }

    fn report_io_error(&mut self, action: &str, error: &io::Error) {
        let previous = self.shared.counters.record_io_error();
        // Once per failure streak.
        if !self.failing {
            tracing::warn!(%error, failures = previous + 1, "log writer failed to {action}");
        }
        self.failing = true;
    }

    fn close(&mut self) {
        self.retire_primary();
        self.retire_warning();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_keeps_highest_ticket() {
        let mut round = Round::default();
        assert_eq!(round.ticket, None);
        round.note_ticket(3);
        round.note_ticket(1);
        round.note_ticket(7);
        assert_eq!(round.ticket, Some(7));
    }
}
