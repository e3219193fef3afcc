//! # Configuration loading and validation.
//!
//! Reads a YAML document shaped as a top-level `programs:` mapping of
//! program name to program table, validates every entry, and produces the
//! [`ProgramSpec`] set the supervisor runs from.
//!
//! ```yaml
//! programs:
//!   web:
//!     command: /usr/bin/python3 -m http.server 8080
//!     numprocs: 2
//!     autorestart: unexpected
//!     stdout: /var/log/web.out
//!   worker:
//!     command: ./worker --queue jobs
//!     stopsignal: INT
//!     stoptime: 5
//!     env:
//!       RUST_LOG: info
//! ```
//!
//! ## Rules
//! - Unknown fields are rejected (strict deserialization).
//! - `command` is a shell-words string split into argv at load time.
//! - `umask` accepts an octal string (`"022"`) or a bare integer whose
//!   digits are read as octal (`022` in YAML arrives as decimal `22`).
//! - `stopsignal` accepts `TERM` and `SIGTERM` forms.
//! - Sinks: `discard`, `inherit`, a bare path (file, append), or a mapping
//!   `{ file: PATH, mode: truncate|append }` /
//!   `{ combined: PATH, mode: ... }`.
//! - Loading never mutates supervisor state; reload callers swap the
//!   returned value in atomically or keep the old one on error.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use nix::sys::signal::Signal;
use nix::unistd::{geteuid, User};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::policies::RestartPolicy;

use super::program::{ProgramSpec, RunAs, Sink, SinkMode};

/// A fully loaded and validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path the configuration was loaded from; reused on reload.
    pub path: PathBuf,
    /// Validated programs, keyed by name.
    pub programs: BTreeMap<String, ProgramSpec>,
}

impl Config {
    /// Loads and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let programs = parse(&text)?;
        Ok(Self {
            path: path.to_path_buf(),
            programs,
        })
    }
}

/// Parses and validates a configuration document.
pub(crate) fn parse(text: &str) -> Result<BTreeMap<String, ProgramSpec>, ConfigError> {
    let raw: RawFile = serde_yaml::from_str(text)?;
    if raw.programs.is_empty() {
        return Err(ConfigError::Empty);
    }

    let mut programs = BTreeMap::new();
    for (name, table) in raw.programs {
        let spec = validate(&name, table)?;
        programs.insert(name, spec);
    }
    Ok(programs)
}

// ---- raw (serde) layer ----

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFile {
    #[serde(default)]
    programs: BTreeMap<String, RawProgram>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProgram {
    #[serde(alias = "cmd")]
    command: String,
    #[serde(default = "default_numprocs")]
    numprocs: usize,
    #[serde(default = "default_autostart")]
    autostart: bool,
    #[serde(default = "default_autorestart")]
    autorestart: String,
    #[serde(default = "default_exitcodes")]
    exitcodes: Vec<i32>,
    #[serde(default = "default_starttime")]
    starttime: u64,
    #[serde(default = "default_startretries")]
    startretries: u32,
    #[serde(default = "default_stoptime")]
    stoptime: u64,
    #[serde(default = "default_stopsignal")]
    stopsignal: String,
    #[serde(default)]
    workingdir: Option<PathBuf>,
    #[serde(default)]
    umask: Option<RawUmask>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    stdout: Option<RawSink>,
    #[serde(default)]
    stderr: Option<RawSink>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawUmask {
    Int(u64),
    Str(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSink {
    File {
        file: PathBuf,
        #[serde(default)]
        mode: RawMode,
    },
    Combined {
        combined: PathBuf,
        #[serde(default)]
        mode: RawMode,
    },
    Word(String),
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawMode {
    Truncate,
    #[default]
    Append,
}

fn default_numprocs() -> usize {
    1
}
fn default_autostart() -> bool {
    true
}
fn default_autorestart() -> String {
    "unexpected".into()
}
fn default_exitcodes() -> Vec<i32> {
    vec![0]
}
fn default_starttime() -> u64 {
    1
}
fn default_startretries() -> u32 {
    3
}
fn default_stoptime() -> u64 {
    10
}
fn default_stopsignal() -> String {
    "TERM".into()
}

// ---- validation layer ----

fn invalid(program: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        program: program.to_string(),
        reason: reason.into(),
    }
}

fn validate(name: &str, raw: RawProgram) -> Result<ProgramSpec, ConfigError> {
    let command = shell_words::split(&raw.command)
        .map_err(|e| invalid(name, format!("bad command quoting: {e}")))?;
    if command.is_empty() {
        return Err(invalid(name, "command is empty"));
    }

    if raw.numprocs == 0 {
        return Err(invalid(name, "numprocs must be at least 1"));
    }
    if raw.exitcodes.is_empty() {
        return Err(invalid(name, "exitcodes must not be empty"));
    }

    let autorestart = parse_autorestart(name, &raw.autorestart)?;
    let stopsignal = parse_signal(name, &raw.stopsignal)?;
    let umask = raw.umask.map(|u| parse_umask(name, u)).transpose()?;
    let user = raw.user.map(|u| resolve_user(name, &u)).transpose()?;
    let (stdout, stderr) = resolve_sinks(name, raw.stdout, raw.stderr)?;

    Ok(ProgramSpec {
        name: name.to_string(),
        command,
        numprocs: raw.numprocs,
        autostart: raw.autostart,
        autorestart,
        exitcodes: BTreeSet::from_iter(raw.exitcodes),
        starttime: Duration::from_secs(raw.starttime),
        startretries: raw.startretries,
        stoptime: Duration::from_secs(raw.stoptime),
        stopsignal,
        workingdir: raw.workingdir,
        umask,
        env: raw.env,
        user,
        stdout,
        stderr,
    })
}

fn parse_autorestart(name: &str, value: &str) -> Result<RestartPolicy, ConfigError> {
    match value {
        "never" => Ok(RestartPolicy::Never),
        "always" => Ok(RestartPolicy::Always),
        "unexpected" => Ok(RestartPolicy::Unexpected),
        other => Err(invalid(
            name,
            format!("autorestart must be never|always|unexpected, got '{other}'"),
        )),
    }
}

/// Accepts `TERM` and `SIGTERM` spellings, case-insensitive.
fn parse_signal(name: &str, value: &str) -> Result<Signal, ConfigError> {
    let upper = value.to_ascii_uppercase();
    let full = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{upper}")
    };
    Signal::from_str(&full).map_err(|_| invalid(name, format!("unknown signal '{value}'")))
}

/// Reads the digits of an umask as octal, whether YAML delivered an
/// integer (`022` arrives as decimal 22) or a string (`"022"`, `"0o22"`).
fn parse_umask(name: &str, raw: RawUmask) -> Result<u32, ConfigError> {
    let digits = match raw {
        RawUmask::Int(n) => n.to_string(),
        RawUmask::Str(s) => s.trim().trim_start_matches("0o").to_string(),
    };
    let bits = u32::from_str_radix(&digits, 8)
        .map_err(|_| invalid(name, format!("umask must be octal, got '{digits}'")))?;
    if bits > 0o777 {
        return Err(invalid(name, "umask must be between 000 and 777"));
    }
    Ok(bits)
}

fn resolve_user(name: &str, account: &str) -> Result<RunAs, ConfigError> {
    let user = User::from_name(account)
        .map_err(|e| invalid(name, format!("cannot look up user '{account}': {e}")))?
        .ok_or_else(|| invalid(name, format!("unknown user '{account}'")))?;
    if user.uid != geteuid() && !geteuid().is_root() {
        return Err(invalid(
            name,
            format!("running as user '{account}' requires a root supervisor"),
        ));
    }
    Ok(RunAs {
        name: account.to_string(),
        uid: user.uid.as_raw(),
        gid: user.gid.as_raw(),
    })
}

fn sink_from_raw(raw: RawSink) -> Sink {
    match raw {
        RawSink::Word(word) => match word.as_str() {
            "discard" => Sink::Discard,
            "inherit" => Sink::Inherit,
            path => Sink::File {
                path: PathBuf::from(path),
                mode: SinkMode::Append,
            },
        },
        RawSink::File { file, mode } => Sink::File {
            path: file,
            mode: mode.into(),
        },
        RawSink::Combined { combined, mode } => Sink::Combined {
            path: combined,
            mode: mode.into(),
        },
    }
}

impl From<RawMode> for SinkMode {
    fn from(raw: RawMode) -> Self {
        match raw {
            RawMode::Truncate => SinkMode::Truncate,
            RawMode::Append => SinkMode::Append,
        }
    }
}

/// Resolves the stdout/stderr pair, normalizing `combined` onto both
/// streams. Absent fields default to `discard`.
fn resolve_sinks(
    name: &str,
    stdout: Option<RawSink>,
    stderr: Option<RawSink>,
) -> Result<(Sink, Sink), ConfigError> {
    let stdout = stdout.map(sink_from_raw);
    let stderr = stderr.map(sink_from_raw);

    let combined = |s: &Option<Sink>| match s {
        Some(Sink::Combined { path, mode }) => Some((path.clone(), *mode)),
        _ => None,
    };

    match (combined(&stdout), combined(&stderr)) {
        (Some(a), Some(b)) if a != b => Err(invalid(
            name,
            "combined stdout and stderr must name the same path and mode",
        )),
        (Some((path, mode)), _) | (_, Some((path, mode))) => {
            let other = if combined(&stdout).is_some() {
                &stderr
            } else {
                &stdout
            };
            if matches!(other, Some(s) if !matches!(s, Sink::Combined { .. })) {
                return Err(invalid(
                    name,
                    "when one stream is combined the other must be combined too (or omitted)",
                ));
            }
            Ok((
                Sink::Combined {
                    path: path.clone(),
                    mode,
                },
                Sink::Combined { path, mode },
            ))
        }
        (None, None) => Ok((
            stdout.unwrap_or(Sink::Discard),
            stderr.unwrap_or(Sink::Discard),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(text: &str) -> ProgramSpec {
        let programs = parse(text).expect("config should parse");
        programs.into_values().next().expect("one program")
    }

    #[test]
    fn minimal_program_gets_documented_defaults() {
        let spec = one("programs:\n  web:\n    command: /bin/sleep 300\n");
        assert_eq!(spec.command, vec!["/bin/sleep", "300"]);
        assert_eq!(spec.numprocs, 1);
        assert!(spec.autostart);
        assert_eq!(spec.autorestart, RestartPolicy::Unexpected);
        assert_eq!(spec.exitcodes, BTreeSet::from([0]));
        assert_eq!(spec.starttime, Duration::from_secs(1));
        assert_eq!(spec.startretries, 3);
        assert_eq!(spec.stoptime, Duration::from_secs(10));
        assert_eq!(spec.stopsignal, Signal::SIGTERM);
        assert_eq!(spec.workingdir, None);
        assert_eq!(spec.umask, None);
        assert!(spec.env.is_empty());
        assert_eq!(spec.user, None);
        assert_eq!(spec.stdout, Sink::Discard);
        assert_eq!(spec.stderr, Sink::Discard);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse("programs:\n  web:\n    command: /bin/true\n    nice: 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn empty_program_set_is_rejected() {
        assert!(matches!(parse("programs: {}\n"), Err(ConfigError::Empty)));
    }

    #[test]
    fn command_quoting_is_respected() {
        let spec = one("programs:\n  sh:\n    command: /bin/sh -c 'sleep 1; exit 3'\n");
        assert_eq!(spec.command, vec!["/bin/sh", "-c", "sleep 1; exit 3"]);
    }

    #[test]
    fn empty_command_is_a_semantic_error() {
        let err = parse("programs:\n  web:\n    command: \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn signal_names_accept_both_spellings() {
        let short = one("programs:\n  a:\n    command: /bin/true\n    stopsignal: INT\n");
        assert_eq!(short.stopsignal, Signal::SIGINT);
        let long = one("programs:\n  a:\n    command: /bin/true\n    stopsignal: SIGUSR1\n");
        assert_eq!(long.stopsignal, Signal::SIGUSR1);
        let err =
            parse("programs:\n  a:\n    command: /bin/true\n    stopsignal: NOPE\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn umask_reads_digits_as_octal() {
        let from_int = one("programs:\n  a:\n    command: /bin/true\n    umask: 022\n");
        assert_eq!(from_int.umask, Some(0o22));
        let from_str = one("programs:\n  a:\n    command: /bin/true\n    umask: \"077\"\n");
        assert_eq!(from_str.umask, Some(0o77));
        let err = parse("programs:\n  a:\n    command: /bin/true\n    umask: \"weird\"\n");
        assert!(matches!(err, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn sink_shorthand_and_mapping_forms() {
        let spec = one(concat!(
            "programs:\n",
            "  a:\n",
            "    command: /bin/true\n",
            "    stdout: /var/log/a.out\n",
            "    stderr: { file: /var/log/a.err, mode: truncate }\n",
        ));
        assert_eq!(
            spec.stdout,
            Sink::File {
                path: "/var/log/a.out".into(),
                mode: SinkMode::Append
            }
        );
        assert_eq!(
            spec.stderr,
            Sink::File {
                path: "/var/log/a.err".into(),
                mode: SinkMode::Truncate
            }
        );
    }

    #[test]
    fn combined_sink_applies_to_both_streams() {
        let spec = one(concat!(
            "programs:\n",
            "  a:\n",
            "    command: /bin/true\n",
            "    stdout: { combined: /var/log/a.log }\n",
        ));
        assert_eq!(spec.stdout, spec.stderr);
        assert!(matches!(spec.stdout, Sink::Combined { .. }));
    }

    #[test]
    fn conflicting_combined_sinks_are_rejected() {
        let err = parse(concat!(
            "programs:\n",
            "  a:\n",
            "    command: /bin/true\n",
            "    stdout: { combined: /tmp/one.log }\n",
            "    stderr: { combined: /tmp/two.log }\n",
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = parse(concat!(
            "programs:\n",
            "  a:\n",
            "    command: /bin/true\n",
            "    stdout: { combined: /tmp/one.log }\n",
            "    stderr: inherit\n",
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn numprocs_zero_is_rejected() {
        let err = parse("programs:\n  a:\n    command: /bin/true\n    numprocs: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn cmd_alias_is_accepted() {
        let spec = one("programs:\n  a:\n    cmd: /bin/true\n");
        assert_eq!(spec.command, vec!["/bin/true"]);
    }
}
