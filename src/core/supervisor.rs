//! # Supervisor: owns every worker record and serializes every event.
//!
//! The [`Supervisor`] is one cooperative task. Exit events, deadline
//! expirations, OS signals and control commands all funnel into a single
//! `select!`, so worker state is only ever mutated from one place.
//!
//! ## Architecture
//! ```text
//! Config ──► Supervisor::run()
//!               │
//!               ├──► process::spawn_reaper()     SIGCHLD → ExitEvent queue
//!               ├──► subscriber_listener()       Bus → SubscriberSet
//!               ├──► initial load                create workers, autostart
//!               │
//!               └──► loop {
//!                      ├─► drained? → finish shutdown, exit
//!                      ├─► scan workers for the earliest deadline
//!                      └─► select! (biased):
//!                            1. exit events        (reaper queue)
//!                            2. deadline firing    (sleep_until)
//!                            3. SIGINT / SIGTERM   (shutdown, escalate)
//!                            4. SIGHUP             (reload)
//!                            5. commands           (REPL handle)
//!                    }
//! ```
//!
//! ## Rules
//! - The `biased` order is the priority contract: a dead child is observed
//!   before any timer or command that arrived in the same iteration.
//! - Commands are answered through their oneshot; `exit` answers only once
//!   every worker is terminal.
//! - Reload is atomic: the new file is parsed and validated completely
//!   before any worker record changes; on error the old set stays.
//! - The bus is observe-only; dropping every subscriber changes nothing.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, ProgramSpec};
use crate::control::{Command, Target, USAGE};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;
use crate::process::{self, ExitEvent};
use crate::subscribers::{Subscribe, SubscriberSet};

use super::reconcile::{self, ReconcilePlan};
use super::shutdown;
use super::worker::{DeadlineOutcome, ExitContext, ExitOutcome, StopAction, Worker, WorkerKey};

/// Ring capacity of the observability bus.
const BUS_CAPACITY: usize = 1024;
/// Depth of the command queue between the control plane and the loop.
const COMMAND_QUEUE: usize = 16;
/// Stop parameters applied when a worker's program is already gone.
const ORPHAN_STOP: (Signal, Duration) = (Signal::SIGTERM, Duration::from_secs(10));

type CommandEnvelope = (Command, oneshot::Sender<String>);

/// Handle for posting commands into the supervisor loop.
#[derive(Clone)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<CommandEnvelope>,
    cancel: CancellationToken,
}

impl SupervisorHandle {
    /// Posts a command and awaits its textual reply.
    ///
    /// Returns `None` when the supervisor has already exited.
    pub async fn command(&self, command: Command) -> Option<String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send((command, reply_tx)).await.ok()?;
        reply_rx.await.ok()
    }

    /// Completes once the supervisor has fully shut down.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// True once the supervisor has fully shut down.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Orchestrates worker processes, timers, reload and shutdown.
pub struct Supervisor {
    config_path: PathBuf,
    programs: BTreeMap<String, ProgramSpec>,
    workers: BTreeMap<WorkerKey, Worker>,
    backoff: BackoffPolicy,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    cmd_tx: mpsc::Sender<CommandEnvelope>,
    cmd_rx: Option<mpsc::Receiver<CommandEnvelope>>,
    cancel: CancellationToken,
    draining: bool,
    shutdown_reply: Option<oneshot::Sender<String>>,
}

impl Supervisor {
    /// Creates a supervisor from a loaded configuration.
    pub fn new(config: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);
        let bus = Bus::new(BUS_CAPACITY);
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
        Self {
            config_path: config.path,
            programs: config.programs,
            workers: BTreeMap::new(),
            backoff: BackoffPolicy::default(),
            bus,
            subs,
            cmd_tx,
            cmd_rx: Some(cmd_rx),
            cancel: CancellationToken::new(),
            draining: false,
            shutdown_reply: None,
        }
    }

    /// Returns a handle the control plane (or tests) can post commands on.
    pub fn handle(&self) -> SupervisorHandle {
        SupervisorHandle {
            tx: self.cmd_tx.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Runs until an orderly shutdown completes.
    pub async fn run(mut self) -> Result<(), RuntimeError> {
        let mut signals = shutdown::install()?;
        let (exit_tx, mut exit_rx) = mpsc::unbounded_channel();
        process::spawn_reaper(exit_tx)?;
        let listener = self.spawn_subscriber_listener();

        let mut cmd_rx = self.cmd_rx.take().expect("run called once");
        let mut commands_open = true;

        self.apply_initial_load();

        loop {
            if self.draining && self.all_terminal() {
                break;
            }

            let next = self.next_deadline();
            tokio::select! {
                biased;

                Some(exit) = exit_rx.recv() => self.handle_exit(exit),

                _ = sleep_until(next.as_ref().map(|d| d.1).unwrap_or_else(Instant::now)),
                    if next.is_some() =>
                {
                    if let Some((key, _)) = next {
                        self.handle_deadline(&key);
                    }
                }

                _ = signals.interrupt.recv() => self.handle_termination_signal(),
                _ = signals.terminate.recv() => self.handle_termination_signal(),

                _ = signals.hangup.recv() => {
                    let result = self.reload();
                    info!(%result, "SIGHUP");
                }

                msg = cmd_rx.recv(), if commands_open => match msg {
                    Some((command, reply)) => self.handle_command(command, reply),
                    None => commands_open = false,
                },
            }
        }

        self.finish_shutdown();

        // Drain observability before leaving: the listener flushes what was
        // already published, then closing the set's queues lets in-flight
        // log events finish rendering.
        let _ = listener.await;
        if let Ok(set) = Arc::try_unwrap(self.subs) {
            set.shutdown().await;
        }
        Ok(())
    }

    // ---- wiring ----

    /// Forwards bus events to the subscriber set until shutdown. On
    /// cancellation the already-published backlog is flushed before the
    /// task exits.
    fn spawn_subscriber_listener(&self) -> tokio::task::JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => subs.emit(&ev),
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    },
                    _ = cancel.cancelled() => {
                        while let Ok(ev) = rx.try_recv() {
                            subs.emit(&ev);
                        }
                        break;
                    }
                }
            }
        })
    }

    /// Creates all worker records from the initial configuration and
    /// starts the autostart programs.
    fn apply_initial_load(&mut self) {
        let names: Vec<String> = self.programs.keys().cloned().collect();
        for name in names {
            self.add_program(&name);
        }
    }

    // ---- event handlers ----

    fn handle_exit(&mut self, exit: ExitEvent) {
        let Some(key) = self
            .workers
            .iter()
            .find(|(_, w)| w.pid == Some(exit.pid))
            .map(|(k, _)| k.clone())
        else {
            // Not one of ours (or already accounted): log and drop.
            warn!(pid = exit.pid, status = %exit.status, "reaped unknown pid");
            return;
        };

        let spec = self.programs.get(&key.0).cloned();
        let backoff = self.backoff;
        let now = exit.reaped_at;

        let worker = self.workers.get_mut(&key).expect("looked up above");
        let restarts_allowed = !self.draining && !worker.retiring && spec.is_some();
        let ctx = ExitContext {
            spec: spec.as_ref(),
            backoff: &backoff,
            restarts_allowed,
        };
        let outcome = worker.on_exit(exit.status, &ctx, now);

        self.bus.publish(
            Event::now(EventKind::WorkerExited)
                .with_worker(&key.0, key.1)
                .with_pid(exit.pid)
                .with_exit(exit.status),
        );

        match outcome {
            ExitOutcome::Stopped { restart } | ExitOutcome::Finished { restart } => {
                if restart {
                    self.start_worker(&key);
                }
            }
            ExitOutcome::StartFailed { delay, attempts } => match delay {
                Some(delay) => self.bus.publish(
                    Event::now(EventKind::BackoffScheduled)
                        .with_worker(&key.0, key.1)
                        .with_delay(delay)
                        .with_attempt(attempts),
                ),
                None => self.bus.publish(
                    Event::now(EventKind::WorkerFatal)
                        .with_worker(&key.0, key.1)
                        .with_attempt(attempts),
                ),
            },
            ExitOutcome::Ignored => {
                warn!(worker = %format!("{}:{}", key.0, key.1), "exit event in pid-less state");
            }
        }

        self.reap_retired(&key);
    }

    fn handle_deadline(&mut self, key: &WorkerKey) {
        let now = Instant::now();
        let Some(worker) = self.workers.get_mut(key) else {
            return;
        };
        match worker.on_deadline(now) {
            DeadlineOutcome::BecameRunning => {
                let pid = worker.pid;
                let mut event = Event::now(EventKind::WorkerRunning).with_worker(&key.0, key.1);
                if let Some(pid) = pid {
                    event = event.with_pid(pid);
                }
                self.bus.publish(event);
            }
            DeadlineOutcome::RetrySpawn => self.spawn_worker(key),
            DeadlineOutcome::EscalateKill => {
                let pid = worker.pid;
                if let Some(pid) = pid {
                    self.bus.publish(
                        Event::now(EventKind::StopEscalated)
                            .with_worker(&key.0, key.1)
                            .with_pid(pid),
                    );
                    self.kill_group(key, pid, Signal::SIGKILL);
                }
            }
            DeadlineOutcome::Stale => {}
        }
    }

    fn handle_termination_signal(&mut self) {
        if self.draining {
            self.escalate_shutdown();
        } else {
            info!("termination signal: stopping all workers");
            self.begin_shutdown(None);
        }
    }

    fn handle_command(&mut self, command: Command, reply: oneshot::Sender<String>) {
        if self.draining {
            let _ = reply.send("shutting down".into());
            return;
        }
        let text = match command {
            Command::Status { program } => self.render_status(program.as_deref()),
            Command::Start { target } => self.command_start(&target),
            Command::Stop { target } => self.command_stop(&target),
            Command::Restart { target } => self.command_restart(&target),
            Command::Reload => self.reload(),
            Command::Help => USAGE.to_string(),
            Command::Shutdown => {
                self.begin_shutdown(Some(reply));
                return;
            }
        };
        let _ = reply.send(text);
    }

    // ---- command implementations ----

    fn target_programs(&self, target: &Target) -> Result<Vec<String>, String> {
        match target {
            Target::All => Ok(self.programs.keys().cloned().collect()),
            Target::Program(name) => {
                if self.programs.contains_key(name) {
                    Ok(vec![name.clone()])
                } else {
                    Err(format!("unknown program '{name}'"))
                }
            }
        }
    }

    fn command_start(&mut self, target: &Target) -> String {
        let names = match self.target_programs(target) {
            Ok(names) => names,
            Err(err) => return err,
        };
        let mut lines = Vec::new();
        for name in names {
            for key in self.worker_keys_of(&name) {
                let line = match self.workers.get_mut(&key).map(|w| w.start()) {
                    Some(Ok(())) => {
                        self.spawn_worker(&key);
                        format!("{}:{}: started", key.0, key.1)
                    }
                    Some(Err(reason)) => format!("{}:{}: {reason}", key.0, key.1),
                    None => continue,
                };
                lines.push(line);
            }
        }
        lines.join("\n")
    }

    fn command_stop(&mut self, target: &Target) -> String {
        let names = match self.target_programs(target) {
            Ok(names) => names,
            Err(err) => return err,
        };
        let mut lines = Vec::new();
        for name in names {
            let Some(spec) = self.programs.get(&name).cloned() else {
                continue;
            };
            for key in self.worker_keys_of(&name) {
                let line = match self.stop_worker(&key, spec.stopsignal, spec.stoptime) {
                    Ok(()) => format!("{}:{}: stopping", key.0, key.1),
                    Err(reason) => format!("{}:{}: {reason}", key.0, key.1),
                };
                lines.push(line);
            }
        }
        lines.join("\n")
    }

    fn command_restart(&mut self, target: &Target) -> String {
        let names = match self.target_programs(target) {
            Ok(names) => names,
            Err(err) => return err,
        };
        let mut lines = Vec::new();
        for name in names {
            let Some(spec) = self.programs.get(&name).cloned() else {
                continue;
            };
            for key in self.worker_keys_of(&name) {
                lines.push(self.restart_worker(&key, &spec));
            }
        }
        lines.join("\n")
    }

    /// Stop-then-start for one worker. The start half runs only after the
    /// stop half completes: immediately for workers that are already
    /// terminal (or leave BACKOFF), otherwise on the exit event, via
    /// `pending_start`.
    fn restart_worker(&mut self, key: &WorkerKey, spec: &ProgramSpec) -> String {
        let Some(worker) = self.workers.get_mut(key) else {
            return format!("{}:{}: no such worker", key.0, key.1);
        };

        if worker.state.is_terminal() {
            let _ = worker.start();
            self.spawn_worker(key);
            return format!("{}:{}: started", key.0, key.1);
        }

        worker.pending_start = true;
        match self.stop_worker(key, spec.stopsignal, spec.stoptime) {
            Ok(()) => {
                // BACKOFF cancels straight to STOPPED with no exit event
                // coming; start it here.
                let worker = self.workers.get_mut(key).expect("still present");
                if worker.state.is_terminal() && worker.pending_start {
                    let _ = worker.start();
                    self.spawn_worker(key);
                    return format!("{}:{}: started", key.0, key.1);
                }
                format!("{}:{}: restarting", key.0, key.1)
            }
            Err(reason) => format!("{}:{}: {reason}", key.0, key.1),
        }
    }

    fn reload(&mut self) -> String {
        if self.draining {
            return "shutting down".into();
        }
        match Config::load(&self.config_path) {
            Err(err) => {
                warn!(label = err.as_label(), error = %err, "reload rejected, keeping current set");
                format!("reload failed: {err}")
            }
            Ok(config) => {
                let plan = reconcile::diff(&self.programs, &config.programs);
                let old = std::mem::replace(&mut self.programs, config.programs);
                self.apply_plan(&plan, &old);
                let summary = plan.summary();
                self.bus
                    .publish(Event::now(EventKind::ConfigReloaded).with_reason(summary.clone()));
                format!("reload: {summary}")
            }
        }
    }

    // ---- reconciliation ----

    fn apply_plan(&mut self, plan: &ReconcilePlan, old_specs: &BTreeMap<String, ProgramSpec>) {
        for name in &plan.removed {
            for key in self.worker_keys_of(name) {
                self.retire_worker(&key, old_specs.get(name));
            }
        }

        for name in &plan.added {
            self.add_program(name);
        }

        for name in &plan.respawn {
            // Existing workers first (they run the old image), then the
            // resize: replicas the resize creates are already on the new
            // spec and must not be cycled.
            let Some(spec) = self.programs.get(name).cloned() else {
                continue;
            };
            let (signal, stoptime) = stop_params(old_specs.get(name));
            for key in self.worker_keys_of(name) {
                let Some(worker) = self.workers.get_mut(&key) else {
                    continue;
                };
                if worker.retiring {
                    continue;
                }
                if worker.state.is_terminal() {
                    if spec.autostart {
                        self.start_worker(&key);
                    }
                    continue;
                }
                // Live workers stop under the old contract and respawn
                // under the new spec once the exit lands.
                worker.pending_start = true;
                if self.stop_worker(&key, signal, stoptime).is_ok() {
                    let worker = self.workers.get_mut(&key).expect("still present");
                    if worker.state.is_terminal() && worker.pending_start {
                        self.start_worker(&key);
                    }
                }
            }
            self.resize_program(name, old_specs.get(name));
        }

        for name in plan.updated.iter().chain(plan.unchanged.iter()) {
            self.resize_program(name, old_specs.get(name));
        }
    }

    /// Creates records for a new program and autostarts it.
    fn add_program(&mut self, name: &str) {
        let Some(spec) = self.programs.get(name).cloned() else {
            return;
        };
        let now = Instant::now();
        for replica in 0..spec.numprocs {
            let key = (name.to_string(), replica);
            self.workers
                .entry(key.clone())
                .or_insert_with(|| Worker::new(name, replica, now));
            if spec.autostart {
                self.start_worker(&key);
            }
        }
    }

    /// Grows or shrinks a surviving program to its new replica count.
    fn resize_program(&mut self, name: &str, old_spec: Option<&ProgramSpec>) {
        let Some(spec) = self.programs.get(name).cloned() else {
            return;
        };
        let now = Instant::now();

        for key in self.worker_keys_of(name) {
            if key.1 >= spec.numprocs {
                self.retire_worker(&key, old_spec);
            }
        }

        for replica in 0..spec.numprocs {
            let key = (name.to_string(), replica);
            if !self.workers.contains_key(&key) {
                self.workers
                    .insert(key.clone(), Worker::new(name, replica, now));
                if spec.autostart {
                    self.start_worker(&key);
                }
            }
        }
    }

    /// Marks a worker for deletion and stops it if it is still live. The
    /// record disappears once a terminal state is reached.
    fn retire_worker(&mut self, key: &WorkerKey, old_spec: Option<&ProgramSpec>) {
        let (signal, stoptime) = stop_params(old_spec);
        let Some(worker) = self.workers.get_mut(key) else {
            return;
        };
        worker.retiring = true;
        worker.pending_start = false;
        if !worker.state.is_terminal() {
            let _ = self.stop_worker(key, signal, stoptime);
        }
        self.reap_retired(key);
    }

    /// Removes a retiring worker once it is terminal.
    fn reap_retired(&mut self, key: &WorkerKey) {
        let done = self
            .workers
            .get(key)
            .map(|w| w.retiring && w.state.is_terminal())
            .unwrap_or(false);
        if done {
            self.workers.remove(key);
            self.bus
                .publish(Event::now(EventKind::WorkerRemoved).with_worker(&key.0, key.1));
        }
    }

    // ---- worker operations ----

    /// Commanded start: flips the record and attempts the spawn.
    fn start_worker(&mut self, key: &WorkerKey) {
        let Some(worker) = self.workers.get_mut(key) else {
            return;
        };
        if worker.start().is_ok() {
            self.spawn_worker(key);
        }
    }

    /// Launches a child for the worker and feeds the result back into the
    /// state machine. Spawn failures are synthetic start failures.
    fn spawn_worker(&mut self, key: &WorkerKey) {
        let Some(spec) = self.programs.get(&key.0).cloned() else {
            return;
        };
        let now = Instant::now();

        match process::spawn(&spec, key.1) {
            Ok(handle) => {
                if let Some(worker) = self.workers.get_mut(key) {
                    worker.on_spawned(handle.pid, spec.starttime, handle.spawned_at);
                }
                self.bus.publish(
                    Event::now(EventKind::WorkerSpawned)
                        .with_worker(&key.0, key.1)
                        .with_pid(handle.pid),
                );
            }
            Err(err) => {
                self.bus.publish(
                    Event::now(EventKind::SpawnFailed)
                        .with_worker(&key.0, key.1)
                        .with_error(err.to_string())
                        .with_reason(err.as_label()),
                );
                let backoff = self.backoff;
                let mut scheduled = None;
                let mut fatal_attempts = None;
                if let Some(worker) = self.workers.get_mut(key) {
                    match worker.on_spawn_failed(spec.startretries, &backoff, now) {
                        Some(delay) => scheduled = Some((delay, worker.start_attempts)),
                        None => fatal_attempts = Some(worker.start_attempts),
                    }
                }
                if let Some((delay, attempts)) = scheduled {
                    self.bus.publish(
                        Event::now(EventKind::BackoffScheduled)
                            .with_worker(&key.0, key.1)
                            .with_delay(delay)
                            .with_attempt(attempts),
                    );
                }
                if let Some(attempts) = fatal_attempts {
                    self.bus.publish(
                        Event::now(EventKind::WorkerFatal)
                            .with_worker(&key.0, key.1)
                            .with_attempt(attempts),
                    );
                }
                self.reap_retired(key);
            }
        }
    }

    /// Commanded stop: flips the record and delivers the stop signal.
    fn stop_worker(
        &mut self,
        key: &WorkerKey,
        signal: Signal,
        stoptime: Duration,
    ) -> Result<(), &'static str> {
        let now = Instant::now();
        let Some(worker) = self.workers.get_mut(key) else {
            return Err("no such worker");
        };
        let pid = worker.pid;
        match worker.stop(signal, stoptime, now)? {
            StopAction::Signal(signal) => {
                if let Some(pid) = pid {
                    self.bus.publish(
                        Event::now(EventKind::StopRequested)
                            .with_worker(&key.0, key.1)
                            .with_pid(pid),
                    );
                    self.kill_group(key, pid, signal);
                }
                Ok(())
            }
            StopAction::Noop => Ok(()),
        }
    }

    /// Signals a worker's process group; ESRCH parks the worker in UNKNOWN
    /// until the reaper delivers the exit.
    fn kill_group(&mut self, key: &WorkerKey, pid: i32, signal: Signal) {
        match killpg(Pid::from_raw(pid), signal) {
            Ok(()) => {}
            Err(Errno::ESRCH) => {
                warn!(pid, "process group vanished before signal delivery");
                if let Some(worker) = self.workers.get_mut(key) {
                    worker.note_signal_lost(Instant::now());
                }
            }
            Err(err) => warn!(pid, signal = %signal, ?err, "killpg failed"),
        }
    }

    // ---- shutdown ----

    fn begin_shutdown(&mut self, reply: Option<oneshot::Sender<String>>) {
        self.draining = true;
        self.shutdown_reply = reply;
        self.bus.publish(Event::now(EventKind::ShutdownRequested));

        for key in self.workers.keys().cloned().collect::<Vec<_>>() {
            let params = stop_params(self.programs.get(&key.0));
            let Some(worker) = self.workers.get_mut(&key) else {
                continue;
            };
            worker.pending_start = false;
            if !worker.state.is_terminal() {
                let _ = self.stop_worker(&key, params.0, params.1);
            }
        }
    }

    /// Second termination signal: SIGKILL every live process group now.
    fn escalate_shutdown(&mut self) {
        self.bus.publish(Event::now(EventKind::ShutdownEscalated));
        for key in self.workers.keys().cloned().collect::<Vec<_>>() {
            let pid = self.workers.get(&key).and_then(|w| w.pid);
            if let Some(pid) = pid {
                self.kill_group(&key, pid, Signal::SIGKILL);
            }
        }
    }

    fn finish_shutdown(&mut self) {
        self.bus.publish(Event::now(EventKind::ShutdownComplete));
        if let Some(reply) = self.shutdown_reply.take() {
            let _ = reply.send("all workers stopped".into());
        }
        self.cancel.cancel();
    }

    // ---- queries ----

    fn worker_keys_of(&self, name: &str) -> Vec<WorkerKey> {
        self.workers
            .keys()
            .filter(|(program, _)| program.as_str() == name)
            .cloned()
            .collect()
    }

    fn all_terminal(&self) -> bool {
        self.workers.values().all(|w| w.state.is_terminal())
    }

    fn next_deadline(&self) -> Option<(WorkerKey, Instant)> {
        self.workers
            .iter()
            .filter_map(|(key, w)| w.deadline.map(|d| (key.clone(), d.at)))
            .min_by_key(|(_, at)| *at)
    }

    fn render_status(&self, filter: Option<&str>) -> String {
        if let Some(name) = filter {
            if !self.programs.contains_key(name) && self.worker_keys_of(name).is_empty() {
                return format!("unknown program '{name}'");
            }
        }

        let now = Instant::now();
        let mut lines = Vec::new();
        for worker in self.workers.values() {
            if filter.is_some_and(|f| f != worker.program) {
                continue;
            }
            let multi = self
                .programs
                .get(&worker.program)
                .map(|s| s.numprocs > 1)
                .unwrap_or(true);
            let label = if multi {
                format!("{}:{}", worker.program, worker.replica)
            } else {
                worker.program.clone()
            };
            let pid = worker
                .pid
                .map(|p| format!("pid={p}"))
                .unwrap_or_else(|| "-".into());
            let age = if worker.pid.is_some() {
                format!("uptime={}s", worker.age_seconds(now))
            } else {
                format!("since={}s", worker.age_seconds(now))
            };
            let mut line = format!(
                "{label:<20} {:<9} {pid:<12} {age:<14} attempts={}",
                worker.state.as_str(),
                worker.start_attempts
            );
            if let Some(exit) = worker.last_exit {
                line.push_str(&format!("  last={exit}"));
            }
            lines.push(line);
        }

        if lines.is_empty() {
            "no workers".into()
        } else {
            lines.join("\n")
        }
    }
}

fn stop_params(spec: Option<&ProgramSpec>) -> (Signal, Duration) {
    spec.map(|s| (s.stopsignal, s.stoptime)).unwrap_or(ORPHAN_STOP)
}
