//! Policies for supervising worker processes:
//!  - [`BackoffPolicy`] for delays between failed start attempts;
//!  - [`RestartPolicy`] for restart decisions after a worker exits.
//!
//! ## Overview
//! - [`backoff`] — compute the next delay after failures with a capped
//!   multiplicative growth (no jitter: the sequence stays monotonic).
//! - [`restart`] — decide whether to restart a finished worker:
//!   *never / always / unexpected*.

mod backoff;
mod restart;

pub use backoff::BackoffPolicy;
pub use restart::RestartPolicy;
