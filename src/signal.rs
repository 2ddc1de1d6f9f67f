//! Ctrl+C handling for scans.
//!
//! The first interrupt sets the scan's [`CancelToken`]. The walker, the
//! hashing workers and the finder poll it, and the finder then returns
//! [`FinderError::Interrupted`](crate::duplicates::FinderError::Interrupted).
//! A second interrupt while the scan is still winding down exits the process
//! immediately with [`EXIT_CODE_INTERRUPTED`].
//!
//! ```rust,no_run
//! use dupescan::duplicates::FinderConfig;
//! use dupescan::signal::install_ctrlc_handler;
//!
//! let token = install_ctrlc_handler().expect("Failed to install signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(token.flag());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Exit code for SIGINT (Ctrl+C) interruption (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Cancellation state shared by every stage of one scan.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the running scan to stop.
    ///
    /// Returns `true` if the token was already cancelled.
    pub fn cancel(&self) -> bool {
        self.cancelled.swap(true, Ordering::SeqCst)
    }

    /// `true` once Ctrl+C was pressed or [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The underlying flag, as taken by `FinderConfig::with_shutdown_flag`.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Make the token usable for another scan.
    pub fn rearm(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Errors from registering the Ctrl+C handler.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The OS refused to install the handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

/// Token of the installed handler. Empty until installation succeeds.
static PROCESS_TOKEN: Mutex<Option<CancelToken>> = Mutex::new(None);

/// React to an interrupt: cancel on the first, report a forced exit on the second.
fn on_interrupt(token: &CancelToken) -> Option<i32> {
    if token.cancel() {
        Some(EXIT_CODE_INTERRUPTED)
    } else {
        eprintln!("\nInterrupted, stopping scan (press Ctrl+C again to exit now)");
        None
    }
}

/// Register the process-wide Ctrl+C handler and return its token, rearmed.
///
/// `ctrlc` accepts one handler per process, so every call after the first
/// successful one hands back the same token. A failed installation leaves
/// nothing behind and the next call tries again.
///
/// # Errors
///
/// Returns [`SignalError`] if the OS refuses the handler.
pub fn install_ctrlc_handler() -> Result<CancelToken, SignalError> {
    install_into(&PROCESS_TOKEN, |token| {
        ctrlc::set_handler(move || {
            if let Some(code) = on_interrupt(&token) {
                std::process::exit(code);
            }
        })
    })
}

fn install_into<F>(
    slot: &Mutex<Option<CancelToken>>,
    install: F,
) -> Result<CancelToken, SignalError>
where
    F: FnOnce(CancelToken) -> Result<(), ctrlc::Error>,
{
    // Held across `install` so concurrent callers cannot register twice
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(token) = slot.as_ref() {
        token.rearm();
        return Ok(token.clone());
    }

    let token = CancelToken::new();
    match install(token.clone()) {
        Ok(()) => log::debug!("Ctrl+C handler installed"),
        // Someone else in this process owns SIGINT; cancellation stays manual
        Err(ctrlc::Error::MultipleHandlers) => log::debug!("Ctrl+C handler already registered"),
        Err(e) => return Err(e.into()),
    }
    *slot = Some(token.clone());
    Ok(token)
}
