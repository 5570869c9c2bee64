#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` is the producer-facing half of the asynchronous logging
//! backend. A [`Logger`] checks each call against its [`LevelFilter`],
//! renders the message into a `<timestamp> <thread-id> <message>` line with
//! [`LineFormatter`] and hands the bytes to the background writer from
//! [`logging_sink`]. The calling thread never waits for disk I/O.
//!
//! # Design
//!
//! - The logger is an explicit service object: construct it with
//!   [`Logger::start`], share it by reference or [`Arc`](std::sync::Arc),
//!   and stop it with [`Logger::shutdown`] or by dropping it.
//! - A process-wide default instance is available through [`init_global`],
//!   [`global`] and [`shutdown_global`]. It exists only between explicit
//!   initialisation and shutdown.
//! - The [`log_at!`], [`log_debug!`], [`log_info!`], [`log_warning!`] and
//!   [`log_fatal!`] macros prefix the call site as `[file:line] `.
//! - With the `tracing` feature, `LoggerLayer` forwards `tracing` events
//!   into a logger.
//!
//! # Invariants
//!
//! - Filtering happens before formatting; filtered calls allocate nothing.
//! - Every line ends with a newline and is at most
//!   [`MAX_LINE_BYTES`] long.
//! - Lines from one thread appear in the order that thread logged them.
//! - A fatal record is on disk before the process aborts.
//!
//! # Errors
//!
//! Logging calls never fail. Configuration calls return [`LogError`] and
//! leave the logger usable: a log file that cannot be opened falls back to
//! standard output, a warning file that cannot be opened is disabled.
//!
//! # Examples
//!
//! ```
//! use logging::{log_warning, Logger, LoggerConfig, Severity};
//!
//! let dir = tempfile::tempdir()?;
//! let config = LoggerConfig::default()
//!     .with_log_file(dir.path().join("app.log"), false)
//!     .with_warning_file(dir.path().join("app.warn"), false);
//! let logger = Logger::start(config)?;
//!
//! logger.log(Severity::Info, "started");
//! log_warning!(logger, "disk {}% full", 91);
//! logger.flush();
//!
//! let warnings = std::fs::read_to_string(dir.path().join("app.warn"))?;
//! assert!(warnings.contains("] disk 91% full"));
//! assert!(!warnings.contains("started"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod error;
mod format;
mod global;
mod levels;
mod logger;
mod macros;
#[cfg(feature = "tracing")]
mod tracing_bridge;

pub use config::{FileTarget, LoggerConfig};
pub use error::LogError;
pub use format::{LineFormatter, MAX_LINE_BYTES, thread_id};
pub use global::{global, init_global, install_global, shutdown_global};
pub use levels::LevelFilter;
pub use logger::Logger;
pub use logging_sink::{OverflowPolicy, QueueConfig, Severity, WriterStats};
#[cfg(feature = "tracing")]
pub use tracing_bridge::{LoggerLayer, init_tracing, init_tracing_with_filter};
