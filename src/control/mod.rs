//! Control plane: command grammar and the interactive REPL.
//!
//! ## Contents
//! - [`Command`], [`Target`] one parsed line of operator input
//! - [`Repl`] the stdin/stdout shell that posts commands to the supervisor
//!   and prints replies
//!
//! Commands act on programs; a start/stop/restart applies to every replica
//! of the named program (`all` fans out over every program). Unknown input
//! costs one usage line and changes nothing.

mod command;
mod repl;

pub use command::{Command, Target, USAGE};
pub use repl::Repl;
