//! Errors reported by the writer core.
//!
//! Only configuration paths surface these values. Producers never observe
//! writer-side failures: those are counted in
//! [`WriterStats`](crate::WriterStats) and reported through `tracing`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error raised while configuring sinks or managing the writer thread.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A log or warning file could not be opened.
    #[error("failed to open log file '{}': {source}", path.display())]
    Open {
        /// Path that could not be opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The stable logical path could not be pointed at the physical file.
    #[error("failed to link '{}' to '{}': {source}", link.display(), target.display())]
    Link {
        /// Stable logical path.
        link: PathBuf,
        /// Physical file the link should resolve to.
        target: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The logical path exists and is not a symlink, so it was left untouched.
    #[error("refusing to replace '{}': not a symbolic link", path.display())]
    LogicalPathOccupied {
        /// Stable logical path.
        path: PathBuf,
    },

    /// The writer thread could not be started.
    #[error("failed to spawn log writer thread: {0}")]
    Spawn(#[source] io::Error),

    /// The writer has been shut down and no longer accepts commands.
    #[error("log writer has stopped")]
    Stopped,

    /// A sink command that waits for a reply was issued from the writer
    /// thread itself.
    #[error("sink reconfiguration cannot be requested from the log writer thread")]
    OnWriterThread,
}

impl SinkError {
    pub(crate) fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }
}
