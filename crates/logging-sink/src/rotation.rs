//! crates/logging-sink/src/rotation.rs
//! Size-triggered rotation of the primary log file.
//!
//! The manager is owned by the writer thread and consulted before every
//! record. A log file configured as `X` is never written under that name:
//! bytes go to a physical file `X.<stamp>` and `X` is a symbolic link to it,
//! so `tail -F X` keeps following the active file across rotations.
//!
//! # Rotation steps
//!
//! 1. Open `X.<stamp>` for appending. On failure keep the current file.
//! 2. Flush the current file and swap the new handle in.
//! 3. Atomically re-point `X` at the new file (temporary link + rename).
//! 4. Reset the byte counter and prune physical files beyond the retention
//!    count.
//!
//! Two rotations within one stamp resolution resolve to the same physical
//! name; the second simply reopens that file in append mode.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::clock::Clock;
use crate::error::SinkError;
use crate::sink::{LogFile, PrimarySink};

/// Name suffix of the temporary link used for the atomic swap.
const LINK_SWAP_SUFFIX: &str = "link-swap";

/// Result of a rotation attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The primary sink now writes to `to`.
    Rotated {
        /// Physical file that was closed.
        from: PathBuf,
        /// Physical file now receiving writes.
        to: PathBuf,
    },
    /// Threshold was exceeded while writing to standard output; only the
    /// counter was reset.
    CounterReset,
    /// The new file could not be opened; writing continues in the old one.
    Failed,
}

/// Byte accounting and file switching for the primary sink.
#[derive(Debug, Default)]
pub struct RotationManager {
    logical: Option<PathBuf>,
    threshold: u64,
    written: u64,
    retention: usize,
    history: VecDeque<PathBuf>,
}

impl RotationManager {
    /// Creates a manager; `threshold` of 0 disables rotation and `retention`
    /// of 0 keeps every physical file.
    #[must_use]
    pub fn new(threshold: u64, retention: usize) -> Self {
        Self {
            threshold,
            retention,
            ..Self::default()
        }
    }

    /// Rotation threshold in bytes.
    #[must_use]
    pub const fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Changes the rotation threshold; 0 disables rotation.
    pub fn set_threshold(&mut self, threshold: u64) {
        self.threshold = threshold;
        if threshold == 0 {
            self.written = 0;
        }
    }

    /// Changes the number of physical files kept and prunes immediately.
    pub fn set_retention(&mut self, retention: usize) {
        self.retention = retention;
        self.prune();
    }

    /// Bytes written to the current physical file since it was opened.
    #[must_use]
    pub const fn bytes_since_rotation(&self) -> u64 {
        self.written
    }

    /// Stable logical path, `None` while writing to standard output.
    #[must_use]
    pub fn logical_path(&self) -> Option<&Path> {
        self.logical.as_deref()
    }

    /// Physical files created by this manager, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Path> {
        self.history.iter().map(PathBuf::as_path)
    }

    /// Accounts for `bytes` written to the primary sink.
    pub fn record_written(&mut self, bytes: usize) {
        if self.threshold != 0 {
            self.written = self.written.saturating_add(bytes as u64);
        }
    }

    /// Reports whether the next record must go to a fresh file.
    #[must_use]
    pub const fn is_due(&self) -> bool {
        self.threshold != 0 && self.written > self.threshold
    }

    /// Forgets the logical path after the primary sink fell back to stdout.
    pub fn detach(&mut self) {
        self.logical = None;
        self.written = 0;
    }

    /// Opens a physical file for `logical` and points `logical` at it.
    ///
    /// A failure to create the link is reported through `tracing` but does
    /// not fail the call: the returned file is fully usable.
    pub fn open_physical(
        &mut self,
        logical: &Path,
        append: bool,
        clock: &dyn Clock,
    ) -> Result<LogFile, SinkError> {
        let physical = physical_path(logical, &clock.file_stamp());
        let file = LogFile::open(&physical, append)?;

        if let Err(error) = point_link(logical, &physical) {
            tracing::warn!(%error, "log file opened without a stable link");
        }

        if self.logical.as_deref() != Some(logical) {
            // Retention only applies to files behind the current logical name.
            self.history.clear();
            self.logical = Some(logical.to_path_buf());
        }
        self.written = 0;
        if self.history.back() != Some(&physical) {
            self.history.push_back(physical);
        }
        self.prune();
        Ok(file)
    }

    /// Rotates `sink` if the threshold has been exceeded.
    pub fn rotate_if_due(
        &mut self,
        sink: &mut PrimarySink,
        clock: &dyn Clock,
    ) -> Option<RotationOutcome> {
        if !self.is_due() {
            return None;
        }

        let logical = match (&self.logical, &*sink) {
            (Some(logical), PrimarySink::File(_)) => logical.clone(),
            _ => {
                self.written = 0;
                return Some(RotationOutcome::CounterReset);
            }
        };

        let from = sink.path().map(Path::to_path_buf).unwrap_or_default();
        // Push buffered bytes out before the new handle can append to the
        // same physical file on a stamp collision.
        if let Err(error) = sink.flush(false) {
            tracing::warn!(%error, path = %from.display(), "flush before rotation failed");
        }

        match self.open_physical(&logical, true, clock) {
            Ok(file) => {
                let to = file.path().to_path_buf();
                *sink = PrimarySink::File(file);
                tracing::debug!(from = %from.display(), to = %to.display(), "rotated log file");
                Some(RotationOutcome::Rotated { from, to })
            }
            Err(error) => {
                self.written = 0;
                tracing::warn!(%error, "log rotation failed; continuing with current file");
                Some(RotationOutcome::Failed)
            }
        }
    }

    fn prune(&mut self) {
        if self.retention == 0 {
            return;
        }
        while self.history.len() > self.retention {
            let Some(stale) = self.history.pop_front() else {
                break;
            };
            match fs::remove_file(&stale) {
                Ok(()) => tracing::debug!(path = %stale.display(), "removed old log file"),
                Err(error) if error.kind() == io::ErrorKind::NotFound => {}
                Err(error) => {
                    tracing::warn!(%error, path = %stale.display(), "failed to remove old log file");
                }
            }
        }
    }
}

/// Physical name for `logical` at `stamp`: `<logical>.<stamp>`.
#[must_use]
pub fn physical_path(logical: &Path, stamp: &str) -> PathBuf {
    let mut name = OsString::from(logical.as_os_str());
    name.push(".");
    name.push(stamp);
    PathBuf::from(name)
}

/// Makes `link` a symbolic link to `target`.
///
/// Only an existing symbolic link is replaced; any other file at `link` is
/// left alone. The link stores the target's file name, which resolves
/// relative to the link's own directory.
pub fn point_link(link: &Path, target: &Path) -> Result<(), SinkError> {
    let link_error = |source| SinkError::Link {
        link: link.to_path_buf(),
        target: target.to_path_buf(),
        source,
    };

    match fs::symlink_metadata(link) {
        Ok(metadata) if !metadata.file_type().is_symlink() => {
            return Err(SinkError::LogicalPathOccupied {
                path: link.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(link_error(error)),
    }

    let relative = target
        .file_name()
        .map_or_else(|| target.to_path_buf(), PathBuf::from);
    let swap = physical_path(link, LINK_SWAP_SUFFIX);

    match fs::remove_file(&swap) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(link_error(error)),
    }
    create_symlink(&relative, &swap).map_err(link_error)?;
    fs::rename(&swap, link).map_err(|error| {
        let _ = fs::remove_file(&swap);
        link_error(error)
    })
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}
