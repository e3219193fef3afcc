//! # Program specification: the validated description of one program.
//!
//! A [`ProgramSpec`] is the immutable value the config loader produces for
//! each entry under `programs:`. The supervisor never looks at raw YAML; it
//! only ever sees these values.
//!
//! ## Fingerprint
//! [`ProgramSpec::fingerprint`] hashes exactly the fields that shape the
//! child process image: argv, environment, working directory, umask, the
//! account the child runs as, the stop signal, and both stream sinks.
//! Monitoring fields (`autostart`, `autorestart`, `exitcodes`,
//! `startretries`, `starttime`, `stoptime`) are excluded, so changing them
//! on reload updates workers in place without a respawn. `numprocs` is also
//! excluded: a replica-count change never invalidates the image of a
//! replica that survives it; the reconciler resizes structurally.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;

use nix::sys::signal::Signal;

use crate::policies::RestartPolicy;

/// How a file-backed sink is opened on each spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkMode {
    /// Truncate the file on every spawn.
    Truncate,
    /// Append to the file (default).
    Append,
}

/// Destination of a worker's stdout or stderr.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sink {
    /// Attach `/dev/null`.
    Discard,
    /// Duplicate the supervisor's own descriptor.
    Inherit,
    /// Write to a file opened per [`SinkMode`].
    File {
        /// Sink path, taken verbatim from the configuration.
        path: PathBuf,
        /// Open mode.
        mode: SinkMode,
    },
    /// One file serves both streams through a single open file description,
    /// so interleaved writes stay ordered. Validation guarantees that when
    /// one stream is `Combined`, the other is the identical `Combined`.
    Combined {
        /// Shared sink path.
        path: PathBuf,
        /// Open mode.
        mode: SinkMode,
    },
}

/// Account a worker runs under, resolved at validation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunAs {
    /// Account name from the configuration.
    pub name: String,
    /// Resolved uid.
    pub uid: u32,
    /// Resolved primary gid.
    pub gid: u32,
}

/// Validated description of one program.
///
/// Produced by [`Config::load`](crate::Config::load); consumed by the
/// supervisor, the reconciler, and the launcher.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramSpec {
    /// Unique program name (the `programs:` key).
    pub name: String,
    /// Argv; the first element is the executable path.
    pub command: Vec<String>,
    /// Number of replicas to run.
    pub numprocs: usize,
    /// Start automatically on load/reload.
    pub autostart: bool,
    /// When a finished worker is started again.
    pub autorestart: RestartPolicy,
    /// Exit codes considered an expected termination.
    pub exitcodes: BTreeSet<i32>,
    /// How long a worker must stay up after spawn to count as started.
    pub starttime: Duration,
    /// Consecutive failed starts tolerated before FATAL.
    pub startretries: u32,
    /// Grace period between the stop signal and SIGKILL.
    pub stoptime: Duration,
    /// Signal sent to the worker's process group on stop.
    pub stopsignal: Signal,
    /// Working directory for the child, if configured.
    pub workingdir: Option<PathBuf>,
    /// Umask applied in the child before exec, if configured.
    pub umask: Option<u32>,
    /// The child's entire environment (no inheritance from the supervisor).
    pub env: BTreeMap<String, String>,
    /// Account to run the child as; requires a root supervisor.
    pub user: Option<RunAs>,
    /// Stdout destination.
    pub stdout: Sink,
    /// Stderr destination.
    pub stderr: Sink,
}

impl ProgramSpec {
    /// Digest over the process-image fields (see module docs).
    ///
    /// Equal fingerprints mean a running worker spawned from the old
    /// specification is indistinguishable from one spawned from the new,
    /// so a reload may swap the specification without a respawn.
    pub fn fingerprint(&self) -> u64 {
        let mut h = DefaultHasher::new();
        self.command.hash(&mut h);
        self.env.hash(&mut h);
        self.workingdir.hash(&mut h);
        self.umask.hash(&mut h);
        self.user.hash(&mut h);
        (self.stopsignal as i32).hash(&mut h);
        self.stdout.hash(&mut h);
        self.stderr.hash(&mut h);
        h.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ProgramSpec {
        ProgramSpec {
            name: "web".into(),
            command: vec!["/bin/sleep".into(), "300".into()],
            numprocs: 1,
            autostart: true,
            autorestart: RestartPolicy::Unexpected,
            exitcodes: BTreeSet::from([0]),
            starttime: Duration::from_secs(1),
            startretries: 3,
            stoptime: Duration::from_secs(10),
            stopsignal: Signal::SIGTERM,
            workingdir: None,
            umask: None,
            env: BTreeMap::new(),
            user: None,
            stdout: Sink::Discard,
            stderr: Sink::Discard,
        }
    }

    #[test]
    fn monitoring_fields_do_not_change_the_fingerprint() {
        let base = spec();
        let mut tuned = spec();
        tuned.autostart = false;
        tuned.autorestart = RestartPolicy::Always;
        tuned.exitcodes = BTreeSet::from([0, 2]);
        tuned.startretries = 9;
        tuned.starttime = Duration::from_secs(7);
        tuned.stoptime = Duration::from_secs(1);
        assert_eq!(base.fingerprint(), tuned.fingerprint());
    }

    #[test]
    fn numprocs_does_not_change_the_fingerprint() {
        let base = spec();
        let mut grown = spec();
        grown.numprocs = 4;
        assert_eq!(base.fingerprint(), grown.fingerprint());
    }

    #[test]
    fn image_fields_change_the_fingerprint() {
        let base = spec();

        let mut cmd = spec();
        cmd.command = vec!["/bin/sleep".into(), "600".into()];
        assert_ne!(base.fingerprint(), cmd.fingerprint());

        let mut env = spec();
        env.env.insert("PORT".into(), "8080".into());
        assert_ne!(base.fingerprint(), env.fingerprint());

        let mut cwd = spec();
        cwd.workingdir = Some("/tmp".into());
        assert_ne!(base.fingerprint(), cwd.fingerprint());

        let mut sig = spec();
        sig.stopsignal = Signal::SIGINT;
        assert_ne!(base.fingerprint(), sig.fingerprint());

        let mut sink = spec();
        sink.stdout = Sink::File {
            path: "/var/log/web.out".into(),
            mode: SinkMode::Append,
        };
        assert_ne!(base.fingerprint(), sink.fingerprint());
    }
}
