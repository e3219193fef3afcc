//! # Child reaper: SIGCHLD-driven exit collection.
//!
//! A dedicated task owns the process-wide SIGCHLD stream (tokio's signal
//! driver is the self-pipe mechanism: the handler only wakes the loop, no
//! logic runs in signal context). Every wake drains **all** reapable
//! children, because the kernel coalesces SIGCHLD: one delivery may stand
//! for several deaths.
//!
//! ## Flow
//! ```text
//! SIGCHLD ──► sigchld.recv() ──► loop { waitpid(ANY, WNOHANG) }
//!                                    ├─► Exited(pid, code)    → ExitEvent
//!                                    ├─► Signaled(pid, sig)   → ExitEvent
//!                                    ├─► StillAlive / ECHILD  → drained, stop
//!                                    └─► Stopped/Continued    → ignore
//! ```
//!
//! Events flow to the supervisor over an unbounded channel; the supervisor
//! maps pids back to workers and logs any pid it does not recognize.

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::warn;

use crate::error::RuntimeError;

use super::ExitStatus;

/// One reaped child termination.
#[derive(Debug, Clone, Copy)]
pub struct ExitEvent {
    /// Pid of the terminated child.
    pub pid: i32,
    /// Exit classification.
    pub status: ExitStatus,
    /// Monotonic instant the exit was collected.
    pub reaped_at: Instant,
}

/// Installs the SIGCHLD stream and spawns the reaper task.
///
/// Must be called before the first child is spawned so no death can predate
/// the stream registration.
pub fn spawn_reaper(tx: mpsc::UnboundedSender<ExitEvent>) -> Result<(), RuntimeError> {
    let mut sigchld = signal(SignalKind::child()).map_err(RuntimeError::SignalDriver)?;
    tokio::spawn(async move {
        while sigchld.recv().await.is_some() {
            drain(&tx);
            if tx.is_closed() {
                break;
            }
        }
    });
    Ok(())
}

/// Reaps every terminated child currently available.
fn drain(tx: &mpsc::UnboundedSender<ExitEvent>) {
    loop {
        match waitpid(None, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(pid, code)) => {
                let _ = tx.send(ExitEvent {
                    pid: pid.as_raw(),
                    status: ExitStatus::Exited(code),
                    reaped_at: Instant::now(),
                });
            }
            Ok(WaitStatus::Signaled(pid, sig, _core_dumped)) => {
                let _ = tx.send(ExitEvent {
                    pid: pid.as_raw(),
                    status: ExitStatus::Signaled(sig),
                    reaped_at: Instant::now(),
                });
            }
            Ok(WaitStatus::StillAlive) => break,
            // Job-control notifications; not terminations.
            Ok(_) => continue,
            Err(Errno::ECHILD) => break,
            Err(err) => {
                warn!(?err, "waitpid failed");
                break;
            }
        }
    }
}
