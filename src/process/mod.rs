//! Process layer: launching, stream redirection, and child reaping.
//!
//! ## Files & responsibilities
//! - **spawn.rs**: stateless launcher; builds the child (working directory,
//!   umask, replaced environment, redirected streams, own process group via
//!   `setsid`) and returns a pid + spawn instant.
//! - **sinks.rs**: resolves the configured stdout/stderr sinks into the
//!   `Stdio` pair handed to the launcher.
//! - **reaper.rs**: SIGCHLD-driven drain loop turning terminated children
//!   into [`ExitEvent`]s for the supervisor.
//!
//! The launcher never waits on children; collection is exclusively the
//! reaper's job, so there is exactly one `waitpid` caller in the process.

mod reaper;
mod sinks;
mod spawn;

pub use reaper::{spawn_reaper, ExitEvent};
pub use spawn::{spawn, SpawnHandle};

use std::fmt;

use nix::sys::signal::Signal;

/// How a child process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal exit with the given code.
    Exited(i32),
    /// Killed by the given signal.
    Signaled(Signal),
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Exited(code) => write!(f, "exit code {code}"),
            ExitStatus::Signaled(sig) => write!(f, "signal {}", sig.as_str()),
        }
    }
}
