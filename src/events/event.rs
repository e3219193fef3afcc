//! # Runtime events emitted by the supervisor.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Worker lifecycle**: spawn, running, exit, backoff, fatal
//! - **Stop flow**: stop signal sent, escalation to SIGKILL, record removal
//! - **Supervisor flow**: reload applied, shutdown progress
//! - **Subscriber health**: overflow and panic reports
//!
//! The [`Event`] struct carries optional metadata such as the worker
//! identity, pid, exit classification, backoff delay and attempt counter.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically, so consumers can order events correctly even when they
//! are delivered through independent queues.
//!
//! ## Event flow examples
//!
//! ### Successful start
//! ```text
//! WorkerSpawned{pid} → [startup grace elapses] → WorkerRunning
//! ```
//!
//! ### Crash loop ending in FATAL
//! ```text
//! WorkerSpawned → WorkerExited (early) → BackoffScheduled{delay, attempt}
//!   → WorkerSpawned → WorkerExited (early) → WorkerFatal{attempt}
//! ```
//!
//! ### Graceful stop with escalation
//! ```text
//! StopRequested{pid} → [stoptime elapses] → StopEscalated{pid}
//!   → WorkerExited{signal=KILL}
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::process::ExitStatus;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    SubscriberOverflow,
    /// Subscriber panicked during event processing.
    SubscriberPanicked,

    // === Worker lifecycle events ===
    /// A child process was created for a worker.
    WorkerSpawned,
    /// A worker survived its startup grace window and is now RUNNING.
    WorkerRunning,
    /// A worker's child process terminated (any state).
    WorkerExited,
    /// The launcher failed before a child existed (exec, chdir, sinks).
    SpawnFailed,
    /// A failed start is waiting out its backoff delay before retrying.
    BackoffScheduled,
    /// A worker exhausted its start retries and became FATAL.
    WorkerFatal,

    // === Stop flow ===
    /// The configured stop signal was sent to a worker's process group.
    StopRequested,
    /// The graceful-stop deadline passed; SIGKILL was sent to the group.
    StopEscalated,
    /// A retired worker record was removed from the supervisor.
    WorkerRemoved,

    // === Supervisor flow ===
    /// A configuration reload was applied.
    ConfigReloaded,
    /// Shutdown was requested (signal or `exit` command).
    ShutdownRequested,
    /// A second termination signal escalated shutdown to SIGKILL.
    ShutdownEscalated,
    /// Every worker reached a terminal state; the supervisor is exiting.
    ShutdownComplete,
}

/// Runtime event with optional metadata.
///
/// ## Fields
/// - `seq`: unique sequence number for ordering (monotonically increasing)
/// - `at`: wall-clock timestamp (may go backwards with NTP; logging only)
/// - `kind`: event classification
/// - `program`, `replica`, `pid`, `exit`, `delay`, `attempt`, `error`,
///   `reason`: optional metadata
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (logging only).
    pub at: SystemTime,
    /// The kind of event.
    pub kind: EventKind,
    /// Program name, if the event concerns one worker.
    pub program: Option<String>,
    /// Replica index, if the event concerns one worker.
    pub replica: Option<usize>,
    /// Child pid, if one existed when the event fired.
    pub pid: Option<i32>,
    /// Exit classification for `WorkerExited`.
    pub exit: Option<ExitStatus>,
    /// Backoff delay before the next start attempt.
    pub delay: Option<Duration>,
    /// Start-attempt counter at the time of the event.
    pub attempt: Option<u32>,
    /// Error message, if the event represents a failure.
    pub error: Option<String>,
    /// Free-form annotation (reload summaries, drop reasons).
    pub reason: Option<String>,
}

impl Event {
    /// Creates a new event of the given kind with the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            program: None,
            replica: None,
            pid: None,
            exit: None,
            delay: None,
            attempt: None,
            error: None,
            reason: None,
        }
    }

    /// Attaches the worker identity (program name and replica index).
    pub fn with_worker(mut self, program: impl Into<String>, replica: usize) -> Self {
        self.program = Some(program.into());
        self.replica = Some(replica);
        self
    }

    /// Attaches a child pid.
    pub fn with_pid(mut self, pid: i32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Attaches an exit classification.
    pub fn with_exit(mut self, exit: ExitStatus) -> Self {
        self.exit = Some(exit);
        self
    }

    /// Attaches a backoff delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Attaches a start-attempt count.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Attaches an error message.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a free-form annotation.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// `program:replica` label, or `-` when the event is not worker-scoped.
    pub fn worker_label(&self) -> String {
        match (&self.program, self.replica) {
            (Some(name), Some(idx)) => format!("{name}:{idx}"),
            (Some(name), None) => name.clone(),
            _ => "-".to_string(),
        }
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_error(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_reason(subscriber)
            .with_error(info)
    }
}
