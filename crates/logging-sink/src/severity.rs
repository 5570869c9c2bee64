//! crates/logging-sink/src/severity.rs
//! Severity levels shared by the producer API and the writer thread.

use std::fmt;
use std::str::FromStr;

/// Importance of a log line.
///
/// The numeric codes are spaced powers of two so thresholds can be compared
/// as plain integers and stored in a single atomic byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum Severity {
    /// Verbose diagnostics.
    Debug = 2,
    /// Normal operational messages.
    #[default]
    Info = 4,
    /// Conditions worth attention; mirrored to the warning file.
    Warning = 8,
    /// Unrecoverable condition; logging it flushes and aborts the process.
    Fatal = 16,
}

/// Lowest severity that is duplicated into the warning file.
pub const WARNING_THRESHOLD: Severity = Severity::Warning;

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Self; 4] = [Self::Debug, Self::Info, Self::Warning, Self::Fatal];

    /// Returns the numeric code of the severity.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Maps a numeric code back to a severity.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            2 => Some(Self::Debug),
            4 => Some(Self::Info),
            8 => Some(Self::Warning),
            16 => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Upper-case tag used when rendering the severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Fatal => "FATAL",
        }
    }

    /// Reports whether lines of this severity are copied to the warning file.
    #[must_use]
    pub fn mirrors_to_warning_file(self) -> bool {
        self >= WARNING_THRESHOLD
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity '{0}' (expected debug, info, warning or fatal)")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "fatal" => Ok(Self::Fatal),
            _ => Err(ParseSeverityError(s.to_owned())),
        }
    }
}
