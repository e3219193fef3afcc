//! # Logging subscriber.
//!
//! [`LogWriter`] renders every runtime event through `tracing`, one line
//! per event, so the supervisor's lifecycle is visible without any custom
//! subscriber.
//!
//! ## Output format
//! ```text
//! INFO  spawned worker=web:0 pid=4242
//! INFO  running worker=web:0 pid=4242
//! WARN  exited worker=web:0 pid=4242 exit=signal SIGKILL
//! INFO  backoff worker=bad:0 delay=1s attempt=1
//! ERROR fatal worker=bad:0 attempts=2
//! ```

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Renders runtime events as `tracing` records.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, event: &Event) {
        let worker = event.worker_label();
        match event.kind {
            EventKind::WorkerSpawned => {
                info!(%worker, pid = event.pid, "spawned");
            }
            EventKind::WorkerRunning => {
                info!(%worker, pid = event.pid, "running");
            }
            EventKind::WorkerExited => {
                let exit = event.exit.map(|e| e.to_string()).unwrap_or_default();
                info!(%worker, pid = event.pid, %exit, "exited");
            }
            EventKind::SpawnFailed => {
                warn!(
                    %worker,
                    label = event.reason.as_deref(),
                    error = event.error.as_deref(),
                    "spawn failed"
                );
            }
            EventKind::BackoffScheduled => {
                info!(%worker, delay = ?event.delay, attempt = event.attempt, "backoff");
            }
            EventKind::WorkerFatal => {
                error!(%worker, attempts = event.attempt, "fatal: start retries exhausted");
            }
            EventKind::StopRequested => {
                info!(%worker, pid = event.pid, "stop requested");
            }
            EventKind::StopEscalated => {
                warn!(%worker, pid = event.pid, "stop deadline passed, sending SIGKILL");
            }
            EventKind::WorkerRemoved => {
                info!(%worker, "removed");
            }
            EventKind::ConfigReloaded => {
                info!(result = event.reason.as_deref(), "configuration reloaded");
            }
            EventKind::ShutdownRequested => {
                info!("shutdown requested");
            }
            EventKind::ShutdownEscalated => {
                warn!("shutdown escalated: killing remaining workers");
            }
            EventKind::ShutdownComplete => {
                info!("all workers stopped");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                warn!(
                    reason = event.reason.as_deref(),
                    error = event.error.as_deref(),
                    "subscriber trouble"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
