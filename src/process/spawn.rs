//! # Process launcher.
//!
//! Stateless: given a validated [`ProgramSpec`] and a replica index, creates
//! one child process and returns its pid plus the monotonic spawn instant.
//!
//! ## Child setup (before exec)
//! - `setsid()` — the child leads a new session and process group equal to
//!   its own pid, so stop signals delivered with `killpg` reach descendants
//! - umask, when configured
//! - gid then uid switch, when a `user` is configured
//! - working directory and the **replaced** environment (no inheritance)
//! - fds 0/1/2: `/dev/null` stdin and the configured sinks
//!
//! ## Error surface
//! `std::process::Command` reports child-side exec and chdir failures
//! through the spawn call itself, so a missing executable or bad working
//! directory comes back as [`SpawnError::Process`] here; the supervisor
//! feeds it to the state machine exactly like a premature exit.
//!
//! The returned child handle is dropped immediately: collection belongs to
//! the reaper, never to the launcher.

use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use nix::sys::stat::{umask, Mode};
use nix::unistd::{setgid, setsid, setuid, Gid, Uid};
use tokio::time::Instant;
use tracing::debug;

use crate::config::ProgramSpec;
use crate::error::SpawnError;

use super::sinks;

/// A freshly launched child.
#[derive(Debug, Clone, Copy)]
pub struct SpawnHandle {
    /// Pid of the child (equal to its process group id).
    pub pid: i32,
    /// Monotonic instant recorded right after the spawn returned.
    pub spawned_at: Instant,
}

/// Launches one replica of `spec`.
pub fn spawn(spec: &ProgramSpec, replica: usize) -> Result<SpawnHandle, SpawnError> {
    let (stdout, stderr) = sinks::open_pair(spec)?;

    let mut cmd = Command::new(&spec.command[0]);
    cmd.args(&spec.command[1..])
        .env_clear()
        .envs(&spec.env)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr);
    if let Some(dir) = &spec.workingdir {
        cmd.current_dir(dir);
    }

    let mask = spec.umask;
    let run_as = spec.user.as_ref().map(|u| (u.uid, u.gid));
    // Only async-signal-safe calls are allowed here: we are between fork
    // and exec.
    unsafe {
        cmd.pre_exec(move || {
            setsid().map_err(nix_to_io)?;
            if let Some(bits) = mask {
                umask(Mode::from_bits_truncate(bits as nix::libc::mode_t));
            }
            if let Some((uid, gid)) = run_as {
                setgid(Gid::from_raw(gid)).map_err(nix_to_io)?;
                setuid(Uid::from_raw(uid)).map_err(nix_to_io)?;
            }
            Ok(())
        });
    }

    let child = cmd.spawn().map_err(|source| SpawnError::Process {
        command: spec.command[0].clone(),
        source,
    })?;
    let pid = child.id() as i32;
    drop(child);

    debug!(program = %spec.name, replica, pid, "spawned child");
    Ok(SpawnHandle {
        pid,
        spawned_at: Instant::now(),
    })
}

fn nix_to_io(errno: nix::errno::Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(errno as i32)
}
