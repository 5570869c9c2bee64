#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging-sink/src/lib.rs
//!
//! # Overview
//!
//! `logging-sink` is the asynchronous writer core behind the `logging`
//! crate. Producer threads hand fully formatted lines to an [`AsyncWriter`]
//! and return immediately; a single background thread drains the queue,
//! writes every line to the primary sink, mirrors high-severity lines into
//! an optional warning file and rotates the primary file once it grows past
//! a size threshold.
//!
//! # Design
//!
//! - The queue is a mutex-guarded FIFO of tagged entries: log records, flush
//!   markers and sink commands. Its order is the commit order.
//! - [`AsyncWriter::flush`] enqueues a flush marker and waits until the
//!   writer reports that marker's ticket complete, which happens only after
//!   the sinks were flushed at the end of a drain round.
//! - Sink state ([`PrimarySink`], the warning [`LogFile`] and the
//!   [`RotationManager`]) lives on the writer thread. Reconfiguration travels
//!   through the queue as commands, so it takes effect at a precise point in
//!   the stream of records.
//!
//! # Invariants
//!
//! - Records are written in enqueue order; nothing queued before
//!   [`AsyncWriter::shutdown`] is dropped.
//! - The queue lock is never held across file I/O.
//! - Rotation happens only on the writer thread, before a record is written.
//! - The warning file is never rotated.
//!
//! # Errors
//!
//! Configuration calls return [`SinkError`]. Failures while draining are
//! never reported to producers: they are counted in [`WriterStats`] and
//! logged through `tracing`.
//!
//! # Examples
//!
//! ```
//! use logging_sink::{AsyncWriter, LogRecord, Severity, WriterConfig};
//!
//! let dir = tempfile::tempdir()?;
//! let writer = AsyncWriter::spawn(WriterConfig::default())?;
//! writer.open_log_file(dir.path().join("app.log"), false)?;
//!
//! writer.submit(LogRecord::new(Severity::Info, b"ready\n".to_vec()));
//! writer.flush();
//!
//! let contents = std::fs::read(dir.path().join("app.log"))?;
//! assert_eq!(contents, b"ready\n");
//! writer.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod clock;
mod entry;
mod error;
mod queue;
pub mod rotation;
mod severity;
pub mod sink;
mod stats;
mod writer;

pub use clock::{Clock, SystemClock, now_time_string};
pub use entry::LogRecord;
pub use error::SinkError;
pub use queue::{OverflowPolicy, QueueConfig};
pub use rotation::{RotationManager, RotationOutcome};
pub use severity::{ParseSeverityError, Severity, WARNING_THRESHOLD};
pub use sink::{LogFile, PrimarySink};
pub use stats::WriterStats;
pub use writer::{AsyncWriter, BYTES_PER_MEGABYTE, WRITER_THREAD_NAME, WriterConfig, WriterPhase};
