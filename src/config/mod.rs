//! Configuration: the validated program set the supervisor runs from.
//!
//! ## Contents
//! - [`ProgramSpec`], [`Sink`], [`SinkMode`], [`RunAs`] the validated data
//!   model, including the process-image [`fingerprint`](ProgramSpec::fingerprint)
//! - [`Config`] YAML loading, strict validation, documented defaults
//!
//! Loading is side-effect free: a reload parses and validates the whole
//! file before the supervisor mutates anything, so a bad file never
//! disturbs the running set.

mod file;
mod program;

pub use file::Config;
pub use program::{ProgramSpec, RunAs, Sink, SinkMode};
