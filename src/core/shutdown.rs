//! # OS signal streams consumed by the supervisor loop.
//!
//! The supervisor distinguishes termination (SIGINT/SIGTERM: start or
//! escalate shutdown) from SIGHUP (reload), so the streams are installed
//! individually rather than merged into one future.
//!
//! No logic runs in signal context: tokio's driver turns each delivery
//! into a stream item the loop's `select!` observes.

use tokio::signal::unix::{signal, Signal, SignalKind};

use crate::error::RuntimeError;

/// The signal streams the supervisor selects on.
pub struct SignalStreams {
    /// SIGINT (Ctrl-C in the controlling terminal).
    pub interrupt: Signal,
    /// SIGTERM (kill default, service managers).
    pub terminate: Signal,
    /// SIGHUP (configuration reload).
    pub hangup: Signal,
}

/// Installs the three streams; failure is fatal (exit 3).
pub fn install() -> Result<SignalStreams, RuntimeError> {
    Ok(SignalStreams {
        interrupt: signal(SignalKind::interrupt()).map_err(RuntimeError::SignalDriver)?,
        terminate: signal(SignalKind::terminate()).map_err(RuntimeError::SignalDriver)?,
        hangup: signal(SignalKind::hangup()).map_err(RuntimeError::SignalDriver)?,
    })
}
