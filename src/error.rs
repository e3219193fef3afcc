//! # Error types used by the taskmaster runtime.
//!
//! This module defines three error enums:
//!
//! - [`ConfigError`] errors raised while loading or validating configuration.
//! - [`SpawnError`] errors raised while launching a worker process.
//! - [`RuntimeError`] errors raised by the supervision runtime itself.
//!
//! All types provide `as_label` helpers for logs. [`ConfigError`] additionally
//! maps onto the process exit codes the CLI contract requires.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// # Errors raised while loading or validating a configuration file.
///
/// Two classes exist: parse errors (the file could not be read or is not
/// valid YAML) and semantic errors (the YAML is well-formed but describes an
/// invalid program set). The CLI maps them to exit codes 1 and 2.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path that failed to open or read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The file is not valid YAML or does not match the expected shape.
    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file parsed but defines no programs.
    #[error("no programs defined")]
    Empty,

    /// A program definition is semantically invalid.
    #[error("program '{program}': {reason}")]
    Invalid {
        /// Name of the offending program.
        program: String,
        /// Human-readable explanation.
        reason: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Yaml(_) => "config_yaml",
            ConfigError::Empty => "config_empty",
            ConfigError::Invalid { .. } => "config_invalid",
        }
    }

    /// Process exit code for this error class: 1 for parse, 2 for semantics.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::Io { .. } | ConfigError::Yaml(_) => 1,
            ConfigError::Empty | ConfigError::Invalid { .. } => 2,
        }
    }
}

/// # Errors raised while launching a worker process.
///
/// Spawn errors never escape the supervisor loop: they are fed to the worker
/// state machine exactly like a premature exit, so they count against the
/// start-retry budget and end in BACKOFF or FATAL.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SpawnError {
    /// A configured stdout/stderr sink could not be opened.
    #[error("cannot open sink {path}: {source}")]
    SinkOpen {
        /// Sink path from the program specification.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Fork, exec, or child-side setup (chdir, setsid, setuid) failed.
    #[error("cannot spawn '{command}': {source}")]
    Process {
        /// Executable that failed to launch.
        command: String,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl SpawnError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            SpawnError::SinkOpen { .. } => "spawn_sink_open",
            SpawnError::Process { .. } => "spawn_process",
        }
    }
}

/// # Errors raised by the supervision runtime itself.
///
/// These are fatal: the supervisor attempts an orderly shutdown and the CLI
/// exits with code 3.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A required OS signal stream could not be installed.
    #[error("cannot install signal handler: {0}")]
    SignalDriver(#[source] io::Error),
}

impl RuntimeError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::SignalDriver(_) => "runtime_signal_driver",
        }
    }
}
