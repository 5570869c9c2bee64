use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::SinkError;

/// Buffer size for file sinks. A drain round usually ends with a flush, so
/// this only bounds how many syscalls a burst of small lines costs.
const FILE_BUFFER_SIZE: usize = 64 * 1024;

/// Buffered handle to a log file.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl LogFile {
    /// Opens `path`, creating it if needed.
    ///
    /// With `append` the existing contents are kept; otherwise the file is
    /// truncated.
    pub fn open(path: impl Into<PathBuf>, append: bool) -> Result<Self, SinkError> {
        let path = path.into();
        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        match options.open(&path) {
            Ok(file) => Ok(Self {
                writer: BufWriter::with_capacity(FILE_BUFFER_SIZE, file),
                path,
            }),
            Err(error) => Err(SinkError::open(path, error)),
        }
    }

    /// Path the file was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes the buffer and, with `sync`, the file's data to disk.
    pub fn flush_to_os(&mut self, sync: bool) -> io::Result<()> {
        self.writer.flush()?;
        if sync {
            self.writer.get_ref().sync_data()?;
        }
        Ok(())
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
