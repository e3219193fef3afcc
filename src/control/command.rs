//! # Control command grammar.
//!
//! One line of REPL input parses into one [`Command`]. Parsing is strict:
//! wrong arity or an unknown verb produces a one-line usage hint and no
//! state change.

use std::fmt;

/// What a start/stop/restart acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every program.
    All,
    /// One program by name (all of its replicas).
    Program(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::All => write!(f, "all"),
            Target::Program(name) => write!(f, "{name}"),
        }
    }
}

/// A parsed control-plane command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `status [name]`
    Status {
        /// Restrict output to one program.
        program: Option<String>,
    },
    /// `start <name>|all`
    Start {
        /// Program(s) to start.
        target: Target,
    },
    /// `stop <name>|all`
    Stop {
        /// Program(s) to stop.
        target: Target,
    },
    /// `restart <name>|all`
    Restart {
        /// Program(s) to restart.
        target: Target,
    },
    /// `reload` — re-read the configuration file and reconcile.
    Reload,
    /// `help`
    Help,
    /// `exit` / `quit` — orderly shutdown.
    Shutdown,
}

/// Usage text printed by `help` and after EOF-free parse errors.
pub const USAGE: &str = "\
commands:
  status [name]          show worker states
  start <name>|all       start a program's workers
  stop <name>|all        stop a program's workers
  restart <name>|all     stop, then start again
  reload                 re-read the configuration file
  help                   show this text
  exit | quit            stop everything and leave";

impl Command {
    /// Parses one input line. `Err` carries a one-line usage hint.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or("type 'help' for commands")?;
        let arg = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments; usage: {}", usage_of(verb)));
        }

        match (verb, arg) {
            ("status", program) => Ok(Command::Status {
                program: program.map(str::to_string),
            }),
            ("start", Some(t)) => Ok(Command::Start { target: target(t) }),
            ("stop", Some(t)) => Ok(Command::Stop { target: target(t) }),
            ("restart", Some(t)) => Ok(Command::Restart { target: target(t) }),
            ("start" | "stop" | "restart", None) => {
                Err(format!("usage: {}", usage_of(verb)))
            }
            ("reload", None) => Ok(Command::Reload),
            ("help", None) => Ok(Command::Help),
            ("exit" | "quit", None) => Ok(Command::Shutdown),
            ("reload" | "help" | "exit" | "quit", Some(_)) => {
                Err(format!("usage: {verb}"))
            }
            (unknown, _) => Err(format!(
                "unknown command '{unknown}'; type 'help' for commands"
            )),
        }
    }
}

fn target(word: &str) -> Target {
    if word == "all" {
        Target::All
    } else {
        Target::Program(word.to_string())
    }
}

fn usage_of(verb: &str) -> String {
    match verb {
        "status" => "status [name]".to_string(),
        "start" | "stop" | "restart" => format!("{verb} <name>|all"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_with_and_without_a_name() {
        assert_eq!(
            Command::parse("status").unwrap(),
            Command::Status { program: None }
        );
        assert_eq!(
            Command::parse("status web").unwrap(),
            Command::Status {
                program: Some("web".into())
            }
        );
    }

    #[test]
    fn lifecycle_verbs_take_a_name_or_all() {
        assert_eq!(
            Command::parse("start web").unwrap(),
            Command::Start {
                target: Target::Program("web".into())
            }
        );
        assert_eq!(
            Command::parse("stop all").unwrap(),
            Command::Stop {
                target: Target::All
            }
        );
        assert_eq!(
            Command::parse("restart web").unwrap(),
            Command::Restart {
                target: Target::Program("web".into())
            }
        );
    }

    #[test]
    fn missing_target_is_a_usage_hint() {
        let err = Command::parse("start").unwrap_err();
        assert!(err.contains("usage"));
    }

    #[test]
    fn exit_and_quit_are_synonyms() {
        assert_eq!(Command::parse("exit").unwrap(), Command::Shutdown);
        assert_eq!(Command::parse("quit").unwrap(), Command::Shutdown);
    }

    #[test]
    fn unknown_verbs_point_at_help() {
        let err = Command::parse("launch web").unwrap_err();
        assert!(err.contains("unknown command"));
    }

    #[test]
    fn extra_arguments_are_rejected() {
        assert!(Command::parse("stop web now").is_err());
        assert!(Command::parse("reload please").is_err());
    }

    #[test]
    fn whitespace_is_insignificant() {
        assert_eq!(
            Command::parse("  restart   all  ").unwrap(),
            Command::Restart {
                target: Target::All
            }
        );
    }
}
