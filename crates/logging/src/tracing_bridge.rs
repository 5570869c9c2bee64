//! crates/logging/src/tracing_bridge.rs
//! Bridge between the tracing crate and a [`Logger`].
//!
//! [`LoggerLayer`] forwards `tracing` events into a logger so libraries that
//! instrument with `tracing` end up in the same log file as direct calls.
//!
//! # Mapping
//!
//! | tracing level   | severity  |
//! |-----------------|-----------|
//! | `ERROR`, `WARN` | `Warning` |
//! | `INFO`          | `Info`    |
//! | `DEBUG`, `TRACE`| `Debug`   |
//!
//! Events never map to `Fatal`, so a bridged event cannot abort the process.
//! Events emitted by the logging crates themselves are skipped; the writer
//! reports its own failures through `tracing`, and forwarding those into the
//! failing writer would loop.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use logging::{init_tracing, Logger, LoggerConfig};
//!
//! let logger = Arc::new(Logger::start(LoggerConfig::default())?);
//! init_tracing(Arc::clone(&logger))?;
//!
//! tracing::warn!(peer = "10.0.0.7", "connection reset");
//! ```

use std::fmt::{self, Write as _};
use std::sync::Arc;

use logging_sink::Severity;
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::error::LogError;
use crate::logger::Logger;

/// Crates whose events are never forwarded.
const IGNORED_TARGETS: [&str; 2] = ["logging_sink", "logging"];

/// A tracing layer writing every enabled event through a [`Logger`].
pub struct LoggerLayer {
    logger: Arc<Logger>,
}

impl LoggerLayer {
    /// Creates a layer forwarding into `logger`.
    #[must_use]
    pub const fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    /// Map a tracing level to a severity.
    const fn severity_for(level: &Level) -> Severity {
        match *level {
            Level::ERROR | Level::WARN => Severity::Warning,
            Level::INFO => Severity::Info,
            Level::DEBUG | Level::TRACE => Severity::Debug,
        }
    }

    fn is_ignored(target: &str) -> bool {
        IGNORED_TARGETS.iter().any(|ignored| {
            target
                .strip_prefix(ignored)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
    }
}

impl fmt::Debug for LoggerLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerLayer").finish_non_exhaustive()
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if Self::is_ignored(metadata.target()) {
            return;
        }
        let severity = Self::severity_for(metadata.level());
        if !self.logger.should_log(severity) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.logger.log(severity, visitor.finish());
    }
}

/// Collects the `message` field followed by the remaining fields as
/// `name=value` pairs.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(mut self) -> String {
        if !self.fields.is_empty() {
            if !self.message.is_empty() {
                self.message.push(' ');
            }
            self.message.push_str(&self.fields);
        }
        self.message
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.message);
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }
}

/// Installs a global subscriber that forwards events into `logger`.
///
/// Fails if another global subscriber is already installed.
pub fn init_tracing(logger: Arc<Logger>) -> Result<(), LogError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(LoggerLayer::new(logger))
        .try_init()?;
    Ok(())
}

/// Like [`init_tracing`] with an additional filter layer, for example an
/// `EnvFilter` built from `RUST_LOG`.
pub fn init_tracing_with_filter<F>(logger: Arc<Logger>, filter: F) -> Result<(), LogError>
where
    F: Layer<tracing_subscriber::Registry> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(filter)
        .with(LoggerLayer::new(logger))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerConfig;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_severity_for() {
        assert_eq!(LoggerLayer::severity_for(&Level::ERROR), Severity::Warning);
        assert_eq!(LoggerLayer::severity_for(&Level::WARN), Severity::Warning);
        assert_eq!(LoggerLayer::severity_for(&Level::INFO), Severity::Info);
        assert_eq!(LoggerLayer::severity_for(&Level::DEBUG), Severity::Debug);
        assert_eq!(LoggerLayer::severity_for(&Level::TRACE), Severity::Debug);
    }

    #[test]
    fn test_is_ignored() {
        assert!(LoggerLayer::is_ignored("logging_sink"));
        assert!(LoggerLayer::is_ignored("logging_sink::rotation"));
        assert!(LoggerLayer::is_ignored("logging::logger"));
        assert!(!LoggerLayer::is_ignored("logging_extra"));
        assert!(!LoggerLayer::is_ignored("server::conn"));
    }

    #[test]
    fn events_are_forwarded_with_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.log");
        let logger = Arc::new(
            Logger::start(
                LoggerConfig::default()
                    .with_level(Severity::Info)
                    .with_log_file(&path, false),
            )
            .unwrap(),
        );
        let subscriber =
            tracing_subscriber::registry().with(LoggerLayer::new(Arc::clone(&logger)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "server::conn", peer = "10.0.0.7", "connection reset");
            tracing::debug!(target: "server::conn", "filtered by level");
            tracing::error!(target: "logging_sink::writer", "ignored target");
        });
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1, "unexpected lines: {lines:?}");
        assert!(lines[0].ends_with(" connection reset peer=10.0.0.7"));
        assert_eq!(logger.stats().records_written, 1);
    }
}
