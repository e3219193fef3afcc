//! Supervision core: worker records, reconciliation, the event loop.
//!
//! The only public API re-exported from here is [`Supervisor`] and its
//! [`SupervisorHandle`]. Everything else is an internal building block the
//! supervisor wires together.
//!
//! ## Files & responsibilities
//! - **supervisor.rs**: the single-owner event loop; consumes exit events,
//!   deadline expirations, OS signals and commands in fixed priority;
//!   executes spawns/signals; applies reconcile plans; drives shutdown.
//! - **worker.rs**: one record per program replica and the full lifecycle
//!   transition table (STOPPED/STARTING/RUNNING/BACKOFF/STOPPING/EXITED/
//!   FATAL/UNKNOWN), expressed as pure transitions that report effects.
//! - **reconcile.rs**: pure diff of the current program set against a new
//!   one into added/removed/respawn/updated/unchanged.
//! - **shutdown.rs**: installation of the SIGINT/SIGTERM/SIGHUP streams.
//!
//! ## Who mutates what
//! Worker records are owned exclusively by the supervisor loop. The child
//! reaper and the control plane hold no references to them; they only push
//! events into the loop's queues. The bus carries observe-only copies out.
//!
//! ## Shutdown timeline
//! ```text
//! SIGINT/SIGTERM or `exit` → stop every non-terminal worker
//!   → exit events / stop-deadline SIGKILLs drain the set
//!   → all terminal → confirm to the control plane, cancel listeners,
//!     return from run()
//! Second SIGINT/SIGTERM while draining → SIGKILL every live group now
//! ```

mod reconcile;
mod shutdown;
mod supervisor;
mod worker;

pub use supervisor::{Supervisor, SupervisorHandle};
