//! # taskmaster
//!
//! **Taskmaster** is a declarative Unix process supervisor: given a YAML
//! description of a set of *programs*, it launches each program's workers,
//! keeps them in the intended run-state, watches their lifecycle, redirects
//! their standard streams, reacts to termination per policy, and exposes an
//! interactive control shell for status, manual start/stop/restart,
//! configuration reload, and orderly shutdown.
//!
//! ## Features
//!
//! | Area              | Description                                                       | Key types / traits                  |
//! |-------------------|-------------------------------------------------------------------|-------------------------------------|
//! | **Supervision**   | Single-owner event loop over every worker record.                 | [`Supervisor`], [`SupervisorHandle`]|
//! | **Configuration** | Validated program specs with process-image fingerprints.         | [`Config`], [`ProgramSpec`]         |
//! | **Policies**      | Restart decisions and start-retry backoff.                        | [`RestartPolicy`], [`BackoffPolicy`]|
//! | **Control plane** | Line REPL and command grammar.                                    | [`Repl`], [`Command`]               |
//! | **Observer API**  | Lifecycle events fanned out to pluggable subscribers.             | [`Subscribe`], [`Event`]            |
//! | **Errors**        | Typed errors mapped onto the CLI exit-code contract.              | [`ConfigError`], [`RuntimeError`]   |
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use taskmaster::{Config, LogWriter, Repl, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("taskmaster.yml"))?;
//!     let supervisor = Supervisor::new(config, vec![Arc::new(LogWriter)]);
//!
//!     let repl = Repl::new(supervisor.handle());
//!     tokio::spawn(repl.run());
//!
//!     supervisor.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ---

mod config;
mod control;
mod core;
mod error;
mod events;
mod policies;
mod process;
mod subscribers;

// ---- Public re-exports ----

pub use config::{Config, ProgramSpec, RunAs, Sink, SinkMode};
pub use control::{Command, Repl, Target, USAGE};
pub use crate::core::{Supervisor, SupervisorHandle};
pub use error::{ConfigError, RuntimeError, SpawnError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, RestartPolicy};
pub use process::ExitStatus;
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
