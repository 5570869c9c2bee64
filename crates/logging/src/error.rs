//! crates/logging/src/error.rs
//! Errors returned by logger configuration calls.

use logging_sink::SinkError;
use thiserror::Error;

/// Failure of a logger configuration or lifecycle call.
///
/// Emitting records never produces this error; only calls that open files,
/// start the writer or manage the global instance do.
#[derive(Debug, Error)]
pub enum LogError {
    /// The writer core rejected the request.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The requested log size does not fit in a byte count.
    #[error("log size of {megabytes} MiB is too large")]
    SizeOverflow {
        /// Requested size in megabytes.
        megabytes: u64,
    },

    /// [`init_global`](crate::init_global) was called while a global logger
    /// is installed.
    #[error("global logger is already initialized")]
    AlreadyInitialized,

    /// Another global `tracing` subscriber is already installed.
    #[cfg(feature = "tracing")]
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
}
