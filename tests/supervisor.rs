//! End-to-end supervision scenarios over real child processes.
//!
//! Each test builds a config file in a temp dir, runs a `Supervisor` on the
//! test runtime, and drives it through its command handle exactly like the
//! REPL would. Tests serialize on a shared lock: the reaper waits on ANY
//! child, which is process-global state.

use std::path::PathBuf;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use taskmaster::{Command, Config, Supervisor, SupervisorHandle, Target};

static LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

struct Harness {
    dir: tempfile::TempDir,
    path: PathBuf,
    handle: SupervisorHandle,
    run: JoinHandle<Result<(), taskmaster::RuntimeError>>,
}

impl Harness {
    fn launch(config_body: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("taskmaster.yml");
        std::fs::write(&path, config_body).expect("write config");

        let config = Config::load(&path).expect("config should load");
        let supervisor = Supervisor::new(config, Vec::new());
        let handle = supervisor.handle();
        let run = tokio::spawn(supervisor.run());

        Self {
            dir,
            path,
            handle,
            run,
        }
    }

    fn rewrite(&self, config_body: &str) {
        std::fs::write(&self.path, config_body).expect("rewrite config");
    }

    async fn command(&self, command: Command) -> String {
        self.handle
            .command(command)
            .await
            .expect("supervisor alive")
    }

    async fn status(&self) -> String {
        self.command(Command::Status { program: None }).await
    }

    /// Orderly shutdown; must leave zero descendants behind.
    async fn shutdown(self) {
        let reply = self.command(Command::Shutdown).await;
        assert_eq!(reply, "all workers stopped");
        timeout(Duration::from_secs(20), self.run)
            .await
            .expect("shutdown within deadline")
            .expect("run task not cancelled")
            .expect("clean supervisor exit");
        drop(self.dir);
    }
}

fn line_of<'a>(status: &'a str, label: &str) -> &'a str {
    status
        .lines()
        .find(|l| l.split_whitespace().next() == Some(label))
        .unwrap_or_else(|| panic!("no status line for '{label}' in:\n{status}"))
}

fn state_of(status: &str, label: &str) -> String {
    line_of(status, label)
        .split_whitespace()
        .nth(1)
        .expect("state column")
        .to_string()
}

fn pid_of(status: &str, label: &str) -> i32 {
    let line = line_of(status, label);
    let field = line
        .split_whitespace()
        .find(|f| f.starts_with("pid="))
        .unwrap_or_else(|| panic!("no pid on line: {line}"));
    field["pid=".len()..].parse().expect("numeric pid")
}

fn process_is_gone(pid: i32) -> bool {
    matches!(kill(Pid::from_raw(pid), None), Err(Errno::ESRCH))
}

#[tokio::test]
async fn started_worker_reaches_running() {
    let _guard = LOCK.lock().await;
    let h = Harness::launch(concat!(
        "programs:\n",
        "  sleeper:\n",
        "    command: /bin/sleep 300\n",
        "    starttime: 1\n",
    ));

    sleep(Duration::from_secs(2)).await;
    let status = h.status().await;
    assert_eq!(state_of(&status, "sleeper"), "RUNNING");
    let pid = pid_of(&status, "sleeper");
    assert!(pid > 0);
    assert!(line_of(&status, "sleeper").contains("attempts=0"));

    h.shutdown().await;
    assert!(process_is_gone(pid));
}

#[tokio::test]
async fn killed_worker_restarts_with_a_new_pid() {
    let _guard = LOCK.lock().await;
    let h = Harness::launch(concat!(
        "programs:\n",
        "  sleeper:\n",
        "    command: /bin/sleep 300\n",
        "    autorestart: always\n",
        "    starttime: 1\n",
    ));

    sleep(Duration::from_secs(2)).await;
    let first = pid_of(&h.status().await, "sleeper");

    kill(Pid::from_raw(first), Signal::SIGKILL).expect("kill worker");
    sleep(Duration::from_millis(2500)).await;

    let status = h.status().await;
    assert_eq!(state_of(&status, "sleeper"), "RUNNING");
    let second = pid_of(&status, "sleeper");
    assert_ne!(first, second);

    h.shutdown().await;
}

#[tokio::test]
async fn expected_exit_is_not_restarted() {
    let _guard = LOCK.lock().await;
    let h = Harness::launch(concat!(
        "programs:\n",
        "  oneshot:\n",
        "    command: /bin/sh -c '/bin/sleep 0.3; exit 0'\n",
        "    starttime: 0\n",
    ));

    sleep(Duration::from_secs(1)).await;
    let status = h.status().await;
    assert_eq!(state_of(&status, "oneshot"), "EXITED");

    h.shutdown().await;
}

#[tokio::test]
async fn broken_command_ends_fatal_with_bounded_attempts() {
    let _guard = LOCK.lock().await;
    let h = Harness::launch(concat!(
        "programs:\n",
        "  bad:\n",
        "    command: /nonexistent-taskmaster-test-binary\n",
        "    startretries: 2\n",
    ));

    // Attempt 1 fails instantly, backs off 1s, attempt 2 fails → FATAL.
    sleep(Duration::from_secs(3)).await;
    let status = h.status().await;
    assert_eq!(state_of(&status, "bad"), "FATAL");
    assert!(line_of(&status, "bad").contains("attempts=2"));

    h.shutdown().await;
}

#[tokio::test]
async fn stop_deadline_escalates_to_sigkill() {
    let _guard = LOCK.lock().await;
    let h = Harness::launch(concat!(
        "programs:\n",
        "  stubborn:\n",
        "    command: /bin/sh -c 'trap \"\" TERM; while true; do /bin/sleep 0.2; done'\n",
        "    starttime: 1\n",
        "    stoptime: 1\n",
    ));

    sleep(Duration::from_secs(2)).await;
    let pid = pid_of(&h.status().await, "stubborn");

    let reply = h
        .command(Command::Stop {
            target: Target::Program("stubborn".into()),
        })
        .await;
    assert!(reply.contains("stopping"), "unexpected reply: {reply}");

    // TERM is ignored; SIGKILL lands after the 1s stop deadline.
    sleep(Duration::from_millis(2200)).await;
    let status = h.status().await;
    assert_eq!(state_of(&status, "stubborn"), "STOPPED");
    assert!(process_is_gone(pid));

    h.shutdown().await;
}

#[tokio::test]
async fn restart_cycles_the_pid() {
    let _guard = LOCK.lock().await;
    let h = Harness::launch(concat!(
        "programs:\n",
        "  sleeper:\n",
        "    command: /bin/sleep 300\n",
        "    starttime: 1\n",
        "    stoptime: 5\n",
    ));

    sleep(Duration::from_secs(2)).await;
    let first = pid_of(&h.status().await, "sleeper");

    let reply = h
        .command(Command::Restart {
            target: Target::Program("sleeper".into()),
        })
        .await;
    assert!(reply.contains("restarting"), "unexpected reply: {reply}");

    sleep(Duration::from_millis(2500)).await;
    let status = h.status().await;
    assert_eq!(state_of(&status, "sleeper"), "RUNNING");
    let second = pid_of(&status, "sleeper");
    assert_ne!(first, second);

    h.shutdown().await;
}

#[tokio::test]
async fn reloading_an_unchanged_config_keeps_every_pid() {
    let _guard = LOCK.lock().await;
    let body = concat!(
        "programs:\n",
        "  sleeper:\n",
        "    command: /bin/sleep 300\n",
        "    starttime: 1\n",
    );
    let h = Harness::launch(body);

    sleep(Duration::from_secs(2)).await;
    let before = pid_of(&h.status().await, "sleeper");

    let reply = h.command(Command::Reload).await;
    assert!(
        reply.contains("0 added, 0 removed, 0 respawned, 0 updated, 1 unchanged"),
        "unexpected reply: {reply}"
    );

    let after = pid_of(&h.status().await, "sleeper");
    assert_eq!(before, after);

    h.shutdown().await;
}

#[tokio::test]
async fn reload_respawns_only_the_changed_program() {
    let _guard = LOCK.lock().await;
    let h = Harness::launch(concat!(
        "programs:\n",
        "  alpha:\n",
        "    command: /bin/sleep 300\n",
        "    starttime: 1\n",
        "  beta:\n",
        "    command: /bin/sleep 400\n",
        "    starttime: 1\n",
    ));

    sleep(Duration::from_secs(2)).await;
    let status = h.status().await;
    let alpha_before = pid_of(&status, "alpha");
    let beta_before = pid_of(&status, "beta");

    h.rewrite(concat!(
        "programs:\n",
        "  alpha:\n",
        "    command: /bin/sleep 301\n",
        "    starttime: 1\n",
        "  beta:\n",
        "    command: /bin/sleep 400\n",
        "    starttime: 1\n",
    ));
    let reply = h.command(Command::Reload).await;
    assert!(
        reply.contains("1 respawned") && reply.contains("1 unchanged"),
        "unexpected reply: {reply}"
    );

    sleep(Duration::from_millis(2500)).await;
    let status = h.status().await;
    assert_eq!(state_of(&status, "alpha"), "RUNNING");
    let alpha_after = pid_of(&status, "alpha");
    let beta_after = pid_of(&status, "beta");
    assert_ne!(alpha_before, alpha_after);
    assert_eq!(beta_before, beta_after);

    h.shutdown().await;
}

#[tokio::test]
async fn reload_grows_replicas_without_touching_survivors() {
    let _guard = LOCK.lock().await;
    let h = Harness::launch(concat!(
        "programs:\n",
        "  pool:\n",
        "    command: /bin/sleep 300\n",
        "    numprocs: 1\n",
        "    starttime: 1\n",
    ));

    sleep(Duration::from_secs(2)).await;
    let first = pid_of(&h.status().await, "pool");

    h.rewrite(concat!(
        "programs:\n",
        "  pool:\n",
        "    command: /bin/sleep 300\n",
        "    numprocs: 2\n",
        "    starttime: 1\n",
    ));
    let reply = h.command(Command::Reload).await;
    assert!(reply.contains("1 updated"), "unexpected reply: {reply}");

    sleep(Duration::from_secs(2)).await;
    let status = h.status().await;
    assert_eq!(pid_of(&status, "pool:0"), first);
    assert_eq!(state_of(&status, "pool:1"), "RUNNING");

    h.shutdown().await;
}

#[tokio::test]
async fn orderly_shutdown_leaves_no_descendants() {
    let _guard = LOCK.lock().await;
    let h = Harness::launch(concat!(
        "programs:\n",
        "  one:\n",
        "    command: /bin/sleep 300\n",
        "    starttime: 1\n",
        "  two:\n",
        "    command: /bin/sleep 300\n",
        "    starttime: 1\n",
        "  three:\n",
        "    command: /bin/sleep 300\n",
        "    starttime: 1\n",
    ));

    sleep(Duration::from_secs(2)).await;
    let status = h.status().await;
    let pids = [
        pid_of(&status, "one"),
        pid_of(&status, "two"),
        pid_of(&status, "three"),
    ];

    h.shutdown().await;
    for pid in pids {
        assert!(process_is_gone(pid), "pid {pid} survived shutdown");
    }
}
