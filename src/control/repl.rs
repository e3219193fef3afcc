//! # Control REPL: the interactive line shell on the controlling terminal.
//!
//! Strictly line-based: read a line, parse it, post the command to the
//! supervisor, print the reply. The REPL holds no worker state; its only
//! link to supervision is the [`SupervisorHandle`].
//!
//! ## Exit paths
//! - `exit` / `quit`: posts shutdown, prints the confirmation that arrives
//!   once every worker is terminal, then returns.
//! - EOF (Ctrl-D): same as `exit`.
//! - Supervisor-side shutdown (SIGINT/SIGTERM): the handle's cancellation
//!   fires and the loop returns without touching stdin again.

use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::core::SupervisorHandle;

use super::command::Command;

/// Interactive control shell bound to one supervisor.
pub struct Repl {
    handle: SupervisorHandle,
}

impl Repl {
    /// Creates a REPL posting into the given supervisor.
    pub fn new(handle: SupervisorHandle) -> Self {
        Self { handle }
    }

    /// Runs until shutdown (commanded or supervisor-side).
    pub async fn run(self) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("taskmaster control shell; type 'help' for commands");

        loop {
            prompt();
            let line = tokio::select! {
                _ = self.handle.cancelled() => break,
                line = lines.next_line() => line,
            };

            match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match Command::parse(line) {
                        Err(hint) => println!("{hint}"),
                        Ok(command) => {
                            let leaving = command == Command::Shutdown;
                            match self.handle.command(command).await {
                                Some(reply) => println!("{reply}"),
                                None => break,
                            }
                            if leaving {
                                break;
                            }
                        }
                    }
                }
                // EOF: orderly shutdown, like `exit`.
                Ok(None) => {
                    if let Some(reply) = self.handle.command(Command::Shutdown).await {
                        println!("{reply}");
                    }
                    break;
                }
                Err(err) => {
                    warn!(?err, "cannot read control input");
                    break;
                }
            }
        }
    }
}

fn prompt() {
    print!("taskmaster> ");
    let _ = std::io::stdout().flush();
}
