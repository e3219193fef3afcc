//! # Worker: one replica of one program, and its lifecycle state machine.
//!
//! A [`Worker`] owns everything the supervisor knows about a single
//! replica: state, pid, deadlines, the start-attempt counter, and the two
//! engine flags (`pending_start` for restart sequencing, `retiring` for
//! record removal).
//!
//! ## States
//! ```text
//!                 start                 startup deadline
//!   STOPPED ───────────────► STARTING ─────────────────► RUNNING
//!   EXITED  ──┘                 │  ▲                        │
//!   FATAL   ──┘    early exit / │  │ backoff deadline       │ exit
//!                  spawn error  ▼  │                        ▼
//!                            BACKOFF ─── attempts ≥     EXITED or STARTING
//!                               │        retries ──► FATAL   (restart policy)
//!                          stop │
//!                               ▼        stop               stop deadline
//!                            STOPPED ◄── STOPPING ◄─ ... ──► (SIGKILL, stay
//!                               ▲           │ exit            STOPPING)
//!                               └───────────┘
//! ```
//!
//! ## Rules
//! - Transitions mutate the record and report what the supervisor must do
//!   (spawn, signal the group, kill the group); the machine itself never
//!   touches a process, which keeps the whole table unit-testable.
//! - `pid` is set iff state ∈ {STARTING, RUNNING, STOPPING}.
//! - At most one deadline is armed per worker; arming replaces the
//!   previous one. STARTING carries the startup deadline, STOPPING the
//!   stop deadline, BACKOFF the retry deadline; no other state has one.
//! - `start_attempts` resets on STARTING→RUNNING and on a commanded start;
//!   restarts after a RUNNING exit do not increment it.
//! - UNKNOWN covers the window where a stop signal bounced with ESRCH but
//!   the exit event has not been collected yet.

use std::time::Duration;

use nix::sys::signal::Signal;
use tokio::time::Instant;

use crate::config::ProgramSpec;
use crate::policies::BackoffPolicy;
use crate::process::ExitStatus;

/// Identity of a worker: program name and replica index.
pub type WorkerKey = (String, usize);

/// Lifecycle state of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Not running; will only move on a commanded start.
    Stopped,
    /// Spawned, inside the startup grace window.
    Starting,
    /// Survived the grace window.
    Running,
    /// Waiting out the delay before the next start attempt.
    Backoff,
    /// Stop signal sent, waiting for the exit (or the SIGKILL deadline).
    Stopping,
    /// Exited from RUNNING and the policy chose not to restart.
    Exited,
    /// Start retries exhausted; will only move on a commanded start.
    Fatal,
    /// Signal delivery failed with ESRCH; waiting for the reaper.
    Unknown,
}

impl WorkerState {
    /// True for states a worker only leaves through a command.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkerState::Stopped | WorkerState::Exited | WorkerState::Fatal
        )
    }

    /// Uppercase name for status output.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Stopped => "STOPPED",
            WorkerState::Starting => "STARTING",
            WorkerState::Running => "RUNNING",
            WorkerState::Backoff => "BACKOFF",
            WorkerState::Stopping => "STOPPING",
            WorkerState::Exited => "EXITED",
            WorkerState::Fatal => "FATAL",
            WorkerState::Unknown => "UNKNOWN",
        }
    }
}

/// What an armed deadline means when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPurpose {
    /// STARTING: the startup grace window ends.
    Startup,
    /// STOPPING: the graceful-stop window ends.
    Stop,
    /// BACKOFF: the retry delay ends.
    Backoff,
}

/// A worker's single armed deadline.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    /// When the deadline fires.
    pub at: Instant,
    /// What firing means.
    pub purpose: TimerPurpose,
}

/// What the supervisor must do after a `stop` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAction {
    /// Send this signal to the worker's process group.
    Signal(Signal),
    /// Nothing to deliver (BACKOFF cancelled, already stopping, UNKNOWN).
    Noop,
}

/// What the supervisor must do after an exit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Reached STOPPED; `restart` is true when a pending restart should
    /// spawn again now.
    Stopped { restart: bool },
    /// A start attempt failed inside the grace window. `delay` is the
    /// armed backoff, `None` when the worker went FATAL instead.
    StartFailed { delay: Option<Duration>, attempts: u32 },
    /// Exited from RUNNING; `restart` says whether policy respawns it.
    Finished { restart: bool },
    /// Exit observed in a state that holds no pid; logged and dropped.
    Ignored,
}

/// What the supervisor must do after a deadline fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineOutcome {
    /// STARTING survived the grace window and is now RUNNING.
    BecameRunning,
    /// BACKOFF elapsed; attempt another spawn.
    RetrySpawn,
    /// STOPPING outlived `stoptime`; SIGKILL the group.
    EscalateKill,
    /// The deadline no longer matches the state; drop it.
    Stale,
}

/// Context an exit event is interpreted in.
pub struct ExitContext<'a> {
    /// Specification of the owning program; `None` once it was removed.
    pub spec: Option<&'a ProgramSpec>,
    /// Engine backoff policy for failed starts.
    pub backoff: &'a BackoffPolicy,
    /// False while draining for shutdown or when the worker is retiring:
    /// no exit may schedule another spawn.
    pub restarts_allowed: bool,
}

/// One replica of one program.
#[derive(Debug)]
pub struct Worker {
    pub(crate) program: String,
    pub(crate) replica: usize,
    pub(crate) state: WorkerState,
    pub(crate) pid: Option<i32>,
    pub(crate) spawned_at: Option<Instant>,
    pub(crate) state_since: Instant,
    pub(crate) deadline: Option<Deadline>,
    pub(crate) start_attempts: u32,
    pub(crate) last_exit: Option<ExitStatus>,
    pub(crate) pending_start: bool,
    pub(crate) retiring: bool,
    prev_delay: Option<Duration>,
}

impl Worker {
    /// Creates a new record in STOPPED.
    pub fn new(program: &str, replica: usize, now: Instant) -> Self {
        Self {
            program: program.to_string(),
            replica,
            state: WorkerState::Stopped,
            pid: None,
            spawned_at: None,
            state_since: now,
            deadline: None,
            start_attempts: 0,
            last_exit: None,
            pending_start: false,
            retiring: false,
            prev_delay: None,
        }
    }

    fn set_state(&mut self, state: WorkerState, now: Instant) {
        self.state = state;
        self.state_since = now;
    }

    /// Commanded start (REPL, autostart, reconciler). On `Ok` the caller
    /// must attempt a spawn and feed the result back via
    /// [`Worker::on_spawned`] or [`Worker::on_spawn_failed`].
    pub fn start(&mut self) -> Result<(), &'static str> {
        match self.state {
            WorkerState::Stopped | WorkerState::Exited | WorkerState::Fatal => {
                // A fresh user intent restores the full retry budget.
                self.start_attempts = 0;
                self.prev_delay = None;
                self.pending_start = false;
                Ok(())
            }
            _ => Err("already active"),
        }
    }

    /// Commanded or internal stop.
    pub fn stop(
        &mut self,
        signal: Signal,
        stoptime: Duration,
        now: Instant,
    ) -> Result<StopAction, &'static str> {
        match self.state {
            WorkerState::Starting | WorkerState::Running => {
                self.set_state(WorkerState::Stopping, now);
                self.deadline = Some(Deadline {
                    at: now + stoptime,
                    purpose: TimerPurpose::Stop,
                });
                Ok(StopAction::Signal(signal))
            }
            WorkerState::Backoff => {
                self.deadline = None;
                self.prev_delay = None;
                self.set_state(WorkerState::Stopped, now);
                Ok(StopAction::Noop)
            }
            WorkerState::Stopping | WorkerState::Unknown => Ok(StopAction::Noop),
            WorkerState::Stopped | WorkerState::Exited | WorkerState::Fatal => Err("not running"),
        }
    }

    /// A spawn attempt produced a live child.
    pub fn on_spawned(&mut self, pid: i32, starttime: Duration, now: Instant) {
        self.pid = Some(pid);
        self.spawned_at = Some(now);
        self.last_exit = None;
        self.set_state(WorkerState::Starting, now);
        // starttime = 0 arms an already-due deadline: RUNNING on the next
        // loop tick unless an exit event is queued ahead of it.
        self.deadline = Some(Deadline {
            at: now + starttime,
            purpose: TimerPurpose::Startup,
        });
    }

    /// A spawn attempt failed before a child existed.
    ///
    /// Returns the armed backoff delay, or `None` when the retry budget is
    /// exhausted and the worker went FATAL.
    pub fn on_spawn_failed(
        &mut self,
        startretries: u32,
        backoff: &BackoffPolicy,
        now: Instant,
    ) -> Option<Duration> {
        self.fail_start(startretries, backoff, now)
    }

    fn fail_start(
        &mut self,
        startretries: u32,
        backoff: &BackoffPolicy,
        now: Instant,
    ) -> Option<Duration> {
        self.pid = None;
        self.spawned_at = None;
        self.deadline = None;
        self.start_attempts += 1;
        if self.start_attempts >= startretries {
            self.prev_delay = None;
            self.set_state(WorkerState::Fatal, now);
            None
        } else {
            let delay = backoff.next(self.prev_delay);
            self.prev_delay = Some(delay);
            self.set_state(WorkerState::Backoff, now);
            self.deadline = Some(Deadline {
                at: now + delay,
                purpose: TimerPurpose::Backoff,
            });
            Some(delay)
        }
    }

    /// The reaper collected this worker's child.
    pub fn on_exit(&mut self, status: ExitStatus, ctx: &ExitContext<'_>, now: Instant) -> ExitOutcome {
        match self.state {
            WorkerState::Stopping | WorkerState::Unknown => {
                self.pid = None;
                self.spawned_at = None;
                self.deadline = None;
                self.last_exit = Some(status);
                self.set_state(WorkerState::Stopped, now);
                let restart = self.pending_start && ctx.restarts_allowed;
                self.pending_start = false;
                ExitOutcome::Stopped { restart }
            }
            WorkerState::Starting => {
                self.last_exit = Some(status);
                if !ctx.restarts_allowed {
                    self.pid = None;
                    self.spawned_at = None;
                    self.deadline = None;
                    self.set_state(WorkerState::Stopped, now);
                    return ExitOutcome::Stopped { restart: false };
                }
                let retries = ctx.spec.map(|s| s.startretries).unwrap_or(0);
                let delay = self.fail_start(retries, ctx.backoff, now);
                ExitOutcome::StartFailed {
                    delay,
                    attempts: self.start_attempts,
                }
            }
            WorkerState::Running => {
                self.pid = None;
                self.spawned_at = None;
                self.deadline = None;
                self.last_exit = Some(status);
                self.set_state(WorkerState::Exited, now);
                let restart = ctx.restarts_allowed
                    && ctx
                        .spec
                        .map(|s| s.autorestart.should_restart(status, &s.exitcodes))
                        .unwrap_or(false);
                ExitOutcome::Finished { restart }
            }
            _ => ExitOutcome::Ignored,
        }
    }

    /// The worker's armed deadline fired.
    pub fn on_deadline(&mut self, now: Instant) -> DeadlineOutcome {
        let Some(deadline) = self.deadline.take() else {
            return DeadlineOutcome::Stale;
        };
        match (deadline.purpose, self.state) {
            (TimerPurpose::Startup, WorkerState::Starting) => {
                self.start_attempts = 0;
                self.prev_delay = None;
                self.set_state(WorkerState::Running, now);
                DeadlineOutcome::BecameRunning
            }
            (TimerPurpose::Backoff, WorkerState::Backoff) => DeadlineOutcome::RetrySpawn,
            (TimerPurpose::Stop, WorkerState::Stopping) => DeadlineOutcome::EscalateKill,
            _ => DeadlineOutcome::Stale,
        }
    }

    /// The stop signal bounced with ESRCH: the process vanished before the
    /// exit event was collected.
    pub fn note_signal_lost(&mut self, now: Instant) {
        self.deadline = None;
        self.set_state(WorkerState::Unknown, now);
    }

    /// Seconds of uptime (live states) or time-in-state (otherwise).
    pub fn age_seconds(&self, now: Instant) -> u64 {
        let since = self.spawned_at.unwrap_or(self.state_since);
        now.saturating_duration_since(since).as_secs()
    }
}
