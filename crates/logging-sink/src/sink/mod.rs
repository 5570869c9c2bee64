//! Output handles owned by the writer thread.
//!
//! The primary sink is either standard output (the fallback when no log file
//! is configured or opening one failed) or a buffered [`LogFile`]. The
//! warning sink is an optional [`LogFile`] that never rotates.

mod file;

use std::io::{self, Write};
use std::path::Path;

pub use file::LogFile;

/// Destination of every accepted log line.
#[derive(Debug, Default)]
pub enum PrimarySink {
    /// Process standard output.
    #[default]
    Stdout,
    /// A physical log file behind a stable logical path.
    File(LogFile),
}

impl PrimarySink {
    /// Reports whether the sink is standard output.
    #[must_use]
    pub const fn is_stdout(&self) -> bool {
        matches!(self, Self::Stdout)
    }

    /// Physical path of the file sink, `None` for standard output.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Stdout => None,
            Self::File(file) => Some(file.path()),
        }
    }

    /// Writes the whole payload.
    pub fn write_payload(&mut self, payload: &[u8]) -> io::Result<()> {
        match self {
            Self::Stdout => io::stdout().lock().write_all(payload),
            Self::File(file) => file.write_all(payload),
        }
    }

    /// Hands buffered bytes to the operating system, optionally syncing the
    /// file's data to disk as well.
    pub fn flush(&mut self, sync: bool) -> io::Result<()> {
        match self {
            Self::Stdout => io::stdout().lock().flush(),
            Self::File(file) => file.flush_to_os(sync),
        }
    }
}
