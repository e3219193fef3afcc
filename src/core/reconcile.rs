//! # Reconciler: diff two program sets into the minimal set of operations.
//!
//! On load and on reload the supervisor asks this module what changed. The
//! answer is a pure classification; applying it (spawning, stopping,
//! retiring records) stays in the supervisor loop.
//!
//! ## Classification
//! ```text
//! name only in new      → added
//! name only in current  → removed
//! name in both:
//!   fingerprints differ → respawn   (the child image changed)
//!   specs differ        → updated   (monitoring fields / numprocs only)
//!   specs equal         → unchanged
//! ```
//!
//! ## Rules
//! - The fingerprint alone decides respawn; individual field diffing is
//!   deliberately not done (keep the fingerprint definition in lockstep
//!   with the launcher's spawn contract).
//! - Reloading an identical configuration classifies everything as
//!   `unchanged`, which the supervisor turns into zero process churn.
//! - Replica-count deltas are not a class of their own: the supervisor
//!   resizes every surviving program to its new `numprocs` after applying
//!   the classification.

use std::collections::BTreeMap;

use crate::config::ProgramSpec;

/// Result of diffing the current program set against a new one.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Programs that exist only in the new set.
    pub added: Vec<String>,
    /// Programs that exist only in the current set.
    pub removed: Vec<String>,
    /// Common programs whose process image changed: every live worker must
    /// be respawned under the new specification.
    pub respawn: Vec<String>,
    /// Common programs whose monitoring fields (or replica count) changed:
    /// the specification is swapped in place, running workers untouched.
    pub updated: Vec<String>,
    /// Common programs with identical specifications.
    pub unchanged: Vec<String>,
}

impl ReconcilePlan {
    /// One-line summary for the REPL and the reload log.
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} removed, {} respawned, {} updated, {} unchanged",
            self.added.len(),
            self.removed.len(),
            self.respawn.len(),
            self.updated.len(),
            self.unchanged.len()
        )
    }

    /// True when applying the plan cannot touch any process.
    pub fn is_quiet(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.respawn.is_empty()
    }
}

/// Classifies every program of `current` and `next`.
///
/// Names come back sorted (inputs are ordered maps), which keeps reload
/// output and event order deterministic.
pub fn diff(
    current: &BTreeMap<String, ProgramSpec>,
    next: &BTreeMap<String, ProgramSpec>,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    for name in current.keys() {
        if !next.contains_key(name) {
            plan.removed.push(name.clone());
        }
    }

    for (name, new_spec) in next {
        match current.get(name) {
            None => plan.added.push(name.clone()),
            Some(old_spec) => {
                if old_spec.fingerprint() != new_spec.fingerprint() {
                    plan.respawn.push(name.clone());
                } else if old_spec != new_spec {
                    plan.updated.push(name.clone());
                } else {
                    plan.unchanged.push(name.clone());
                }
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use std::time::Duration;

    use nix::sys::signal::Signal;

    use crate::config::Sink;
    use crate::policies::RestartPolicy;

    use super::*;

    fn spec(name: &str, command: &str) -> ProgramSpec {
        ProgramSpec {
            name: name.into(),
            command: command.split_whitespace().map(str::to_string).collect(),
            numprocs: 1,
            autostart: true,
            autorestart: RestartPolicy::Unexpected,
            exitcodes: BTreeSet::from([0]),
            starttime: Duration::from_secs(1),
            startretries: 3,
            stoptime: Duration::from_secs(10),
            stopsignal: Signal::SIGTERM,
            workingdir: None,
            umask: None,
            env: BTreeMap::new(),
            user: None,
            stdout: Sink::Discard,
            stderr: Sink::Discard,
        }
    }

    fn set(specs: Vec<ProgramSpec>) -> BTreeMap<String, ProgramSpec> {
        specs.into_iter().map(|s| (s.name.clone(), s)).collect()
    }

    #[test]
    fn identical_sets_are_fully_unchanged() {
        let current = set(vec![spec("a", "/bin/sleep 1"), spec("b", "/bin/sleep 2")]);
        let plan = diff(&current, &current.clone());
        assert_eq!(plan.unchanged, vec!["a", "b"]);
        assert!(plan.is_quiet());
        assert!(plan.added.is_empty());
        assert!(plan.removed.is_empty());
        assert!(plan.respawn.is_empty());
        assert!(plan.updated.is_empty());
    }

    #[test]
    fn added_and_removed_are_symmetric() {
        let current = set(vec![spec("old", "/bin/sleep 1")]);
        let next = set(vec![spec("new", "/bin/sleep 1")]);
        let plan = diff(&current, &next);
        assert_eq!(plan.added, vec!["new"]);
        assert_eq!(plan.removed, vec!["old"]);
        assert!(!plan.is_quiet());
    }

    #[test]
    fn first_load_is_all_added() {
        let next = set(vec![spec("a", "/bin/sleep 1")]);
        let plan = diff(&BTreeMap::new(), &next);
        assert_eq!(plan.added, vec!["a"]);
    }

    #[test]
    fn image_change_requires_respawn() {
        let current = set(vec![spec("a", "/bin/sleep 1"), spec("b", "/bin/sleep 2")]);
        let mut next = current.clone();
        next.get_mut("a").unwrap().command = vec!["/bin/sleep".into(), "99".into()];

        let plan = diff(&current, &next);
        assert_eq!(plan.respawn, vec!["a"]);
        assert_eq!(plan.unchanged, vec!["b"]);
    }

    #[test]
    fn monitoring_change_updates_in_place() {
        let current = set(vec![spec("a", "/bin/sleep 1"), spec("b", "/bin/sleep 2")]);
        let mut next = current.clone();
        {
            let a = next.get_mut("a").unwrap();
            a.autorestart = RestartPolicy::Always;
            a.startretries = 9;
            a.starttime = Duration::from_secs(3);
            a.stoptime = Duration::from_secs(1);
            a.exitcodes = BTreeSet::from([0, 1]);
        }

        let plan = diff(&current, &next);
        assert_eq!(plan.updated, vec!["a"]);
        assert_eq!(plan.unchanged, vec!["b"]);
        // Monitoring-only edits never force a despawn, in or outside the
        // edited subset.
        assert!(plan.is_quiet());
    }

    #[test]
    fn numprocs_change_is_an_update_not_a_respawn() {
        let current = set(vec![spec("a", "/bin/sleep 1")]);
        let mut next = current.clone();
        next.get_mut("a").unwrap().numprocs = 4;

        let plan = diff(&current, &next);
        assert_eq!(plan.updated, vec!["a"]);
        assert!(plan.respawn.is_empty());
    }
}
