//! crates/logging/src/global.rs
//! Optional process-wide default logger.
//!
//! Nothing here is initialised lazily: the global logger exists only between
//! an explicit [`init_global`] (or [`install_global`]) and the matching
//! [`shutdown_global`]. Code that can receive a [`Logger`] by reference
//! should do so; the global is a convenience for call sites that cannot.

use std::sync::{Arc, PoisonError, RwLock};

use crate::config::LoggerConfig;
use crate::error::LogError;
use crate::logger::Logger;

static GLOBAL: RwLock<Option<Arc<Logger>>> = RwLock::new(None);

/// Starts a logger from `config` and installs it as the global logger.
pub fn init_global(config: LoggerConfig) -> Result<Arc<Logger>, LogError> {
    let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(LogError::AlreadyInitialized);
    }
    let logger = Arc::new(Logger::start(config)?);
    *slot = Some(Arc::clone(&logger));
    Ok(logger)
}

/// Installs an already started logger as the global logger.
pub fn install_global(logger: Logger) -> Result<Arc<Logger>, LogError> {
    let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(LogError::AlreadyInitialized);
    }
    let logger = Arc::new(logger);
    *slot = Some(Arc::clone(&logger));
    Ok(logger)
}

/// The global logger, if one is installed.
#[must_use]
pub fn global() -> Option<Arc<Logger>> {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Uninstalls the global logger, drains it and joins its writer thread.
///
/// Returns `false` if no global logger was installed. Handles obtained from
/// [`global`] stay valid but drop everything logged after this call.
pub fn shutdown_global() -> bool {
    let logger = GLOBAL
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    match logger {
        Some(logger) => {
            logger.shutdown();
            true
        }
        None => false,
    }
}
