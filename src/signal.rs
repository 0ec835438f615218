//! Ctrl+C handling for cooperative cancellation.
//!
//! A single `AtomicBool` is shared between the signal hook and every stage of
//! a run. Loading checks it between files, building and clustering check it
//! between documents, and a set flag turns the run into
//! [`EngineError::Interrupted`](crate::engine::EngineError::Interrupted).
//!
//! ```rust,no_run
//! use neardup::engine::{DedupConfig, Deduplicator};
//! use neardup::metric::MetricKind;
//! use neardup::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let config = DedupConfig::new(MetricKind::Jaccard).with_shutdown_flag(handler.get_flag());
//! let dedup = Deduplicator::new(config);
//! ```
//!
//! An interrupted run exits with code 130 (128 + SIGINT) and performs no
//! report or deletion.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Owner of the shared shutdown flag.
///
/// Cloning shares the flag, so every clone observes the same request.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown without a signal.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get the flag to hand to a [`DedupConfig`](crate::engine::DedupConfig)
    /// or a [`DirectorySource`](crate::corpus::DirectorySource).
    ///
    /// ```rust,no_run
    /// use neardup::engine::DedupConfig;
    /// use neardup::metric::MetricKind;
    /// use neardup::signal::ShutdownHandler;
    ///
    /// let handler = ShutdownHandler::new();
    /// let config = DedupConfig::new(MetricKind::Cosine)
    ///     .with_shutdown_flag(handler.get_flag());
    /// ```
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag so the handler can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install a process-wide Ctrl+C hook and return its handler.
///
/// The hook can only be registered once per process. Later calls (several
/// `run_app` invocations in one test binary, for example) get the installed
/// handler back with its flag cleared. If registration fails because some
/// other code owns the hook, an unhooked handler is returned instead; it
/// still honours [`ShutdownHandler::request_shutdown`].
///
/// # Errors
///
/// Currently always succeeds; the `Result` leaves room for platforms where
/// the fallback is not acceptable.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    match ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);

        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping after the current document...");
        let _ = std::io::stderr().flush();

        log::info!("Shutdown signal received");
    }) {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(e) => {
            if let Some(existing) = GLOBAL_HANDLER.get() {
                existing.reset();
                Ok(existing.clone())
            } else {
                log::debug!("Ctrl+C handler unavailable ({e}), using unhooked handler");
                let fallback = ShutdownHandler::new();
                let _ = GLOBAL_HANDLER.set(fallback.clone());
                Ok(fallback)
            }
        }
    }
}

/// Create a handler without installing any signal hook.
///
/// ```
/// use neardup::signal::create_handler;
/// let handler = create_handler();
/// assert!(!handler.is_shutdown_requested());
/// ```
#[must_use]
pub fn create_handler() -> ShutdownHandler {
    ShutdownHandler::new()
}
