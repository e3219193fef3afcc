//! # Stream sink resolution.
//!
//! Turns the configured [`Sink`] pair of a program into the `Stdio` values
//! the launcher hands to the child. Sinks are opened in the parent before
//! the spawn; the builder consumes them, so the parent-side descriptors are
//! closed as soon as the spawn call returns.
//!
//! `combined` opens the file once and clones the descriptor, so both child
//! fds share one open file description and interleaved writes keep their
//! order.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::Stdio;

use crate::config::{ProgramSpec, Sink, SinkMode};
use crate::error::SpawnError;

/// Opens the stdout/stderr pair for one spawn.
pub(crate) fn open_pair(spec: &ProgramSpec) -> Result<(Stdio, Stdio), SpawnError> {
    // Validation normalizes `combined` onto both streams, so checking
    // stdout alone is sufficient.
    if let Sink::Combined { path, mode } = &spec.stdout {
        let file = open_file(path, *mode)?;
        let clone = file.try_clone().map_err(|source| SpawnError::SinkOpen {
            path: path.clone(),
            source,
        })?;
        return Ok((file.into(), clone.into()));
    }
    Ok((open_single(&spec.stdout)?, open_single(&spec.stderr)?))
}

fn open_single(sink: &Sink) -> Result<Stdio, SpawnError> {
    match sink {
        Sink::Discard => Ok(Stdio::null()),
        Sink::Inherit => Ok(Stdio::inherit()),
        Sink::File { path, mode } | Sink::Combined { path, mode } => {
            Ok(open_file(path, *mode)?.into())
        }
    }
}

fn open_file(path: &Path, mode: SinkMode) -> Result<File, SpawnError> {
    let mut opts = OpenOptions::new();
    opts.create(true).write(true);
    match mode {
        SinkMode::Append => opts.append(true),
        SinkMode::Truncate => opts.truncate(true),
    };
    opts.open(path).map_err(|source| SpawnError::SinkOpen {
        path: path.to_path_buf(),
        source,
    })
}
