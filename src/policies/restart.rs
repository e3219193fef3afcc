//! # Restart policies for finished workers.
//!
//! [`RestartPolicy`] determines whether a worker that exited from RUNNING is
//! started again.
//!
//! - [`RestartPolicy::Never`] the worker stays EXITED.
//! - [`RestartPolicy::Always`] the worker is restarted unconditionally.
//! - [`RestartPolicy::Unexpected`] the worker is restarted only when the exit
//!   was unexpected: killed by a signal, or an exit code outside the
//!   program's `exitcodes` set (default).
//!
//! The policy only applies to exits from RUNNING. Exits inside the startup
//! grace window are start failures and go through the retry/backoff budget
//! instead.

use std::collections::BTreeSet;

use crate::process::ExitStatus;

/// Policy controlling whether a worker is restarted after it exits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Never restart: the worker stays EXITED.
    Never,
    /// Always restart, regardless of how the worker exited.
    Always,
    /// Restart only on unexpected termination (default).
    Unexpected,
}

impl Default for RestartPolicy {
    /// Returns [`RestartPolicy::Unexpected`].
    fn default() -> Self {
        RestartPolicy::Unexpected
    }
}

impl RestartPolicy {
    /// Decides whether a worker that exited with `status` from RUNNING
    /// should be started again, given the program's expected exit codes.
    pub fn should_restart(&self, status: ExitStatus, exitcodes: &BTreeSet<i32>) -> bool {
        match self {
            RestartPolicy::Never => false,
            RestartPolicy::Always => true,
            RestartPolicy::Unexpected => match status {
                ExitStatus::Signaled(_) => true,
                ExitStatus::Exited(code) => !exitcodes.contains(&code),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use nix::sys::signal::Signal;

    use super::*;

    fn expected() -> BTreeSet<i32> {
        BTreeSet::from([0, 2])
    }

    #[test]
    fn never_ignores_every_exit() {
        assert!(!RestartPolicy::Never.should_restart(ExitStatus::Exited(1), &expected()));
        assert!(
            !RestartPolicy::Never.should_restart(ExitStatus::Signaled(Signal::SIGKILL), &expected())
        );
    }

    #[test]
    fn always_restarts_even_expected_exits() {
        assert!(RestartPolicy::Always.should_restart(ExitStatus::Exited(0), &expected()));
    }

    #[test]
    fn unexpected_checks_the_exitcode_set() {
        let policy = RestartPolicy::Unexpected;
        assert!(!policy.should_restart(ExitStatus::Exited(0), &expected()));
        assert!(!policy.should_restart(ExitStatus::Exited(2), &expected()));
        assert!(policy.should_restart(ExitStatus::Exited(1), &expected()));
    }

    #[test]
    fn unexpected_treats_signals_as_unexpected() {
        let policy = RestartPolicy::Unexpected;
        assert!(policy.should_restart(ExitStatus::Signaled(Signal::SIGKILL), &expected()));
        assert!(policy.should_restart(ExitStatus::Signaled(Signal::SIGSEGV), &expected()));
    }
}
