// SPDX-License-Identifier: MPL-2.0

//! The partial solution is the current state
//! of the solution being built by the algorithm:
//! an ordered log of assignments, grouped into decision levels.

use std::fmt;
use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use crate::internal::incompatibility::{Incompatibility, Relation};
use crate::package::{Package, PackageId};
use crate::term::Term;
use crate::version_set::VersionSet;

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// A recorded step of the solution being built: either a decision
/// (a guessed package-version binding, opening a new decision level)
/// or a derivation (a term forced by an incompatibility
/// at the current level).
#[derive(Debug, Clone)]
pub(crate) struct Assignment<P: PackageId, VS: VersionSet> {
    pub(crate) package: Package<P>,
    pub(crate) level: usize,
    pub(crate) kind: AssignmentKind<VS>,
}

#[derive(Debug, Clone)]
pub(crate) enum AssignmentKind<VS: VersionSet> {
    Decision(VS::V),
    Derivation {
        term: Term<VS>,
        /// Identifier of the incompatibility that forced this term.
        cause: usize,
    },
}

impl<P: PackageId, VS: VersionSet> Assignment<P, VS> {
    /// The assignment seen as a term: a decision is the positive term
    /// containing exactly the decided version.
    fn as_term(&self) -> Term<VS> {
        match &self.kind {
            AssignmentKind::Decision(version) => Term::exact(version.clone()),
            AssignmentKind::Derivation { term, .. } => term.clone(),
        }
    }
}

/// The earliest assignment making some term satisfied,
/// as needed by conflict resolution.
pub(crate) struct Satisfier<VS: VersionSet> {
    /// Position in the assignment log.
    pub(crate) index: usize,
    /// Decision level of the assignment.
    pub(crate) level: usize,
    /// Cause incompatibility when the assignment is a derivation.
    pub(crate) cause: Option<usize>,
    /// The assignment's own term.
    pub(crate) term: Term<VS>,
}

/// The ordered assignment log plus, per package, the intersection of all
/// terms assigned so far. Decision levels along the log are non-decreasing:
/// level 0 holds the root decision and its propagations, and each further
/// decision increments the level.
#[derive(Clone)]
pub(crate) struct PartialSolution<P: PackageId, VS: VersionSet> {
    assignments: Vec<Assignment<P, VS>>,
    decisions: FxIndexMap<Package<P>, VS::V>,
    // Insertion order is first-seen order, which makes iteration (and the
    // decision heuristic's tie-break) deterministic.
    accumulated: FxIndexMap<Package<P>, Term<VS>>,
}

impl<P: PackageId, VS: VersionSet> PartialSolution<P, VS> {
    /// Initialize an empty partial solution.
    pub(crate) fn empty() -> Self {
        Self {
            assignments: Vec::new(),
            decisions: FxIndexMap::default(),
            accumulated: FxIndexMap::default(),
        }
    }

    /// The current decision level.
    pub(crate) fn decision_level(&self) -> usize {
        self.decisions.len().saturating_sub(1)
    }

    /// Add a decision, opening a new decision level
    /// (except for the very first decision, which stays at level 0).
    pub(crate) fn decide(&mut self, package: Package<P>, version: VS::V) {
        if cfg!(debug_assertions) {
            debug_assert!(
                !self.decisions.contains_key(&package),
                "{}: decided twice",
                package,
            );
            match self.accumulated.get(&package) {
                None => panic!("{}: decided before any derivation", package),
                Some(term) => debug_assert!(
                    term.as_positive().map(|set| set.allows(&version)) == Some(true),
                    "{}: {} was expected to be contained in {}",
                    package,
                    version,
                    term,
                ),
            }
        }
        let level = self.decisions.len();
        self.assignments.push(Assignment {
            package: package.clone(),
            level,
            kind: AssignmentKind::Decision(version.clone()),
        });
        self.decisions.insert(package.clone(), version.clone());
        self.accumulate(package, Term::exact(version));
    }

    /// Add a derivation at the current decision level.
    pub(crate) fn derive(&mut self, package: Package<P>, term: Term<VS>, cause: usize) {
        self.assignments.push(Assignment {
            package: package.clone(),
            level: self.decision_level(),
            kind: AssignmentKind::Derivation {
                term: term.clone(),
                cause,
            },
        });
        self.accumulate(package, term);
    }

    fn accumulate(&mut self, package: Package<P>, term: Term<VS>) {
        let accumulated = match self.accumulated.entry(package) {
            indexmap::map::Entry::Occupied(entry) => {
                let accumulated = entry.into_mut();
                *accumulated = accumulated.intersection(&term);
                accumulated
            }
            indexmap::map::Entry::Vacant(entry) => entry.insert(term),
        };
        // An assignment emptying the accumulated term would have been
        // reported as a conflict instead of being added.
        debug_assert!(!accumulated.is_none(), "accumulated term emptied");
    }

    /// Retrieve the intersection of all terms assigned to a package so far.
    pub(crate) fn accumulated(&self, package: &Package<P>) -> Option<&Term<VS>> {
        self.accumulated.get(package)
    }

    /// Check how the terms in the partial solution relate to the incompatibility.
    pub(crate) fn relation(&self, incompat: &Incompatibility<P, VS>) -> Relation<P> {
        incompat.relation(|package| self.accumulated.get(package))
    }

    /// The earliest assignment in the log such that the accumulated terms
    /// for `package`, up to and including that assignment, satisfy `term`.
    /// Conflict resolution only queries terms it knows to be satisfied.
    pub(crate) fn satisfier(&self, package: &Package<P>, term: &Term<VS>) -> Satisfier<VS> {
        let mut accumulated = Term::any();
        for (index, assignment) in self.assignments.iter().enumerate() {
            if &assignment.package != package {
                continue;
            }
            accumulated = accumulated.intersection(&assignment.as_term());
            if accumulated.satisfies(term) {
                return Satisfier {
                    index,
                    level: assignment.level,
                    cause: match &assignment.kind {
                        AssignmentKind::Decision(_) => None,
                        AssignmentKind::Derivation { cause, .. } => Some(*cause),
                    },
                    term: assignment.as_term(),
                };
            }
        }
        unreachable!(
            "{}: no assignment satisfies {}, yet the term was reported satisfied \
             (is the version ordering of the source consistent?)",
            package, term
        )
    }

    /// Backtrack the partial solution to a given decision level: drop every
    /// assignment above it and rebuild the accumulators from the remaining log.
    pub(crate) fn backtrack(&mut self, level: usize) {
        // Levels are non-decreasing along the log.
        let cut = self
            .assignments
            .partition_point(|assignment| assignment.level <= level);
        self.assignments.truncate(cut);
        self.decisions.clear();
        self.accumulated.clear();
        for assignment in &self.assignments {
            let term = assignment.as_term();
            if let AssignmentKind::Decision(version) = &assignment.kind {
                self.decisions
                    .insert(assignment.package.clone(), version.clone());
            }
            match self.accumulated.entry(assignment.package.clone()) {
                indexmap::map::Entry::Occupied(entry) => {
                    let accumulated = entry.into_mut();
                    *accumulated = accumulated.intersection(&term);
                }
                indexmap::map::Entry::Vacant(entry) => {
                    entry.insert(term);
                }
            }
        }
    }

    /// Whether a package already has a decision.
    pub(crate) fn is_decided(&self, package: &Package<P>) -> bool {
        self.decisions.contains_key(package)
    }

    /// Packages constrained by a positive accumulated term but not yet
    /// decided, in first-seen order. When there are none, every required
    /// package is pinned and solving has succeeded.
    pub(crate) fn undecided_positive(&self) -> impl Iterator<Item = (&Package<P>, &VS)> {
        self.accumulated.iter().filter_map(|(package, term)| {
            if self.decisions.contains_key(package) {
                None
            } else {
                term.as_positive().map(|set| (package, set))
            }
        })
    }

    /// All decisions made, in decision order (the root first).
    pub(crate) fn decisions(&self) -> impl Iterator<Item = (&Package<P>, &VS::V)> {
        self.decisions.iter()
    }
}

impl<P: PackageId, VS: VersionSet> fmt::Display for PartialSolution<P, VS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let assignments: Vec<String> = self
            .assignments
            .iter()
            .map(|a| match &a.kind {
                AssignmentKind::Decision(v) => {
                    format!("[{}] {} = {}", a.level, a.package, v)
                }
                AssignmentKind::Derivation { term, cause } => {
                    format!("[{}] {}: {} (cause {})", a.level, a.package, term, cause)
                }
            })
            .collect();
        write!(f, "{}", assignments.join("\n"))
    }
}

// TESTS #######################################################################
