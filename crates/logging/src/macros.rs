//! crates/logging/src/macros.rs
//! Call-site macros that prefix `[file:line] ` to the message.
//!
//! The first argument is anything that dereferences to a
//! [`Logger`](crate::Logger): a reference, an owned logger or an
//! `Arc<Logger>`. Arguments are only formatted when the severity passes the
//! logger's threshold.

/// Logs at an explicit severity.
///
/// # Example
///
/// ```
/// use logging::{log_at, Logger, LoggerConfig, Severity};
///
/// let logger = Logger::start(LoggerConfig::default())?;
/// log_at!(logger, Severity::Info, "{} workers ready", 4);
/// # Ok::<(), logging::LogError>(())
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $severity:expr, $($arg:tt)+) => {{
        let logger: &$crate::Logger = &$logger;
        let severity: $crate::Severity = $severity;
        if logger.should_log(severity) {
            logger.log_fmt(
                severity,
                ::core::format_args!(
                    "[{}:{}] {}",
                    ::core::file!(),
                    ::core::line!(),
                    ::core::format_args!($($arg)+)
                ),
            );
        }
    }};
}

/// Logs at [`Severity::Debug`](crate::Severity::Debug).
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Severity::Debug, $($arg)+)
    };
}

/// Logs at [`Severity::Info`](crate::Severity::Info).
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Severity::Info, $($arg)+)
    };
}

/// Logs at [`Severity::Warning`](crate::Severity::Warning).
#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Severity::Warning, $($arg)+)
    };
}

/// Logs at [`Severity::Fatal`](crate::Severity::Fatal), flushes and aborts
/// the process.
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $($arg:tt)+) => {{
        $crate::log_at!($logger, $crate::Severity::Fatal, $($arg)+);
        ::std::process::abort()
    }};
}
