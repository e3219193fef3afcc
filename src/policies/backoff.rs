//! # Backoff policy for failed start attempts.
//!
//! [`BackoffPolicy`] controls how the delay between start attempts grows
//! while a worker keeps failing inside its startup grace window. It is
//! parameterized by:
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::first`] the initial delay;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! Delays are deliberately jitter-free: within one run of failures the
//! sequence must be monotonic non-decreasing.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskmaster::BackoffPolicy;
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//! };
//!
//! // First failure - uses 'first' (clamped to max)
//! assert_eq!(backoff.next(None), Duration::from_millis(100));
//!
//! // Second failure - multiplied by factor (100ms * 2.0 = 200ms)
//! assert_eq!(backoff.next(Some(Duration::from_millis(100))), Duration::from_millis(200));
//!
//! // When the previous delay exceeds max, the result is capped at max
//! assert_eq!(backoff.next(Some(Duration::from_secs(20))), Duration::from_secs(10));
//! ```

use std::time::Duration;

/// Retry backoff policy with capped multiplicative growth.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` keeps the sequence monotonic).
    pub factor: f64,
}

impl Default for BackoffPolicy {
    /// Returns a policy with `first = 1s`, `factor = 2.0`, `max = 30s`.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Computes the next delay based on the previous one.
    ///
    /// - If `prev` is `None`, returns `first` **clamped to `max`**.
    /// - Otherwise multiplies the previous delay by [`BackoffPolicy::factor`]
    ///   and caps it at [`BackoffPolicy::max`].
    pub fn next(&self, prev: Option<Duration>) -> Duration {
        let unclamped = match prev {
            None => self.first,
            Some(d) => {
                let mul = d.as_secs_f64() * self.factor;
                if !mul.is_finite() {
                    self.max
                } else {
                    d.mul_f64(self.factor)
                }
            }
        };
        unclamped.min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic_and_capped() {
        let backoff = BackoffPolicy {
            first: Duration::from_millis(500),
            max: Duration::from_secs(4),
            factor: 2.0,
        };

        let mut prev = None;
        let mut seen = Vec::new();
        for _ in 0..6 {
            let d = backoff.next(prev);
            seen.push(d);
            prev = Some(d);
        }

        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen[0], Duration::from_millis(500));
        assert_eq!(*seen.last().unwrap(), Duration::from_secs(4));
    }

    #[test]
    fn constant_factor_keeps_delay_flat() {
        let backoff = BackoffPolicy {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 1.0,
        };
        let d1 = backoff.next(None);
        let d2 = backoff.next(Some(d1));
        assert_eq!(d1, d2);
    }
}
