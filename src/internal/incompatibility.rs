// SPDX-License-Identifier: MPL-2.0

//! Incompatibilities: forbidden combinations of package terms,
//! and the rule of resolution that derives new ones from old.

use std::fmt;

use crate::package::{Package, PackageId};
use crate::term::{SetRelation, Term};
use crate::version_set::VersionSet;

/// A set of terms, over distinct packages, that no solution may satisfy
/// all at once. In SAT terms it is a clause: the negation of a forbidden
/// conjunction.
///
/// Most incompatibilities come straight from dependencies. If package A at
/// version 1 depends on package B at version 2, a solution with the terms
/// `A = 1` and `not B = 2` both satisfied would select A 1 while leaving
/// B 2 out, which that dependency forbids. Hence the incompatibility
/// `{ A = 1, not B = 2 }`. The others are learned during conflict
/// resolution from two earlier incompatibilities, per
/// <https://github.com/dart-lang/pub/blob/master/doc/solver.md#incompatibility>.
#[derive(Debug, Clone)]
pub(crate) struct Incompatibility<P: PackageId, VS: VersionSet> {
    terms: Vec<(Package<P>, Term<VS>)>,
    cause: Cause<P, VS>,
}

/// Why an incompatibility holds. Identifiers in [Cause::Derived] index the
/// append-only store owned by the solver state; parents are always strictly
/// older than the incompatibility derived from them.
#[derive(Debug, Clone)]
pub(crate) enum Cause<P: PackageId, VS: VersionSet> {
    /// The root package must be selected at its declared version.
    Root(VS::V),
    /// `dependent` over `dependent_set` depends on `package` in `set`.
    Dependency {
        dependent: Package<P>,
        dependent_set: VS,
        package: P,
        set: VS,
    },
    /// There is no version of `package` in `set`.
    NoVersions { package: P, set: VS },
    /// The source does not know `package`, and it may not be skipped.
    NotFound { package: P },
    /// Learned by the rule of resolution from two earlier incompatibilities.
    Derived(usize, usize),
}

/// How the accumulated terms of the partial solution stand with respect
/// to one incompatibility.
pub(crate) enum Relation<P: PackageId> {
    /// Every term of the incompatibility is satisfied: the partial
    /// solution has entered forbidden territory and a conflict must be
    /// resolved.
    Satisfied,
    /// Every term except one is satisfied, and that one is undetermined.
    /// Unit propagation can then force its inverse.
    AlmostSatisfied(Package<P>),
    /// At least one term is contradicted: the incompatibility cannot fire
    /// under the current partial solution.
    Contradicted(Package<P>),
    /// Anything else: several terms are still undetermined.
    Inconclusive,
}

impl<P: PackageId, VS: VersionSet> Incompatibility<P, VS> {
    /// Create the initial incompatibility stating that the root package
    /// must be selected at the declared root version.
    pub(crate) fn root(root_version: VS::V) -> Self {
        Self {
            terms: vec![(
                Package::Root,
                Term::Negative(VS::singleton(root_version.clone())),
            )],
            cause: Cause::Root(root_version),
        }
    }

    /// Build an incompatibility from a given dependency: selecting
    /// `dependent` at `version` forbids leaving `package` outside `set`.
    /// A self dependency that its own version satisfies is vacuous
    /// and yields no incompatibility.
    pub(crate) fn dependency(
        dependent: Package<P>,
        version: VS::V,
        package: P,
        set: VS,
    ) -> Option<Self> {
        let dependent_set = VS::singleton(version);
        let cause = Cause::Dependency {
            dependent: dependent.clone(),
            dependent_set: dependent_set.clone(),
            package: package.clone(),
            set: set.clone(),
        };
        if dependent.named() == Some(&package) {
            if set.allows_all(&dependent_set) {
                return None;
            }
            return Some(Self {
                terms: vec![(dependent, Term::Positive(dependent_set))],
                cause,
            });
        }
        let mut terms = vec![(dependent, Term::Positive(dependent_set))];
        // A dependency on the empty set leaves a lone positive term,
        // forbidding the dependent version itself.
        let dep_term = Term::Negative(set);
        if dep_term != Term::any() {
            terms.push((Package::Named(package), dep_term));
        }
        Some(Self { terms, cause })
    }

    /// Create an incompatibility to remember
    /// that a given set does not contain any version.
    pub(crate) fn no_versions(package: P, set: VS) -> Self {
        Self {
            terms: vec![(Package::Named(package.clone()), Term::Positive(set.clone()))],
            cause: Cause::NoVersions { package, set },
        }
    }

    /// Create an incompatibility forbidding every version of a package
    /// the source has never heard of.
    pub(crate) fn not_found(package: P) -> Self {
        Self {
            terms: vec![(Package::Named(package.clone()), Term::Positive(VS::full()))],
            cause: Cause::NotFound { package },
        }
    }

    /// Prior cause of two incompatibilities using the rule of resolution.
    ///
    /// Terms of both parents are merged by intersection, except on
    /// `package` (the package of the satisfier being resolved away) where
    /// the union of the two terms is kept unless it is tautological.
    pub(crate) fn prior_cause(
        current: &Self,
        satisfier_cause: &Self,
        package: &Package<P>,
        ids: (usize, usize),
    ) -> Self {
        let mut terms: Vec<(Package<P>, Term<VS>)> = current
            .terms
            .iter()
            .filter(|(p, _)| p != package)
            .cloned()
            .collect();
        for (p, term) in satisfier_cause.terms.iter().filter(|(p, _)| p != package) {
            match terms.iter_mut().find(|(q, _)| q == p) {
                Some((_, existing)) => *existing = existing.intersection(term),
                None => terms.push((p.clone(), term.clone())),
            }
        }
        let union = current
            .get(package)
            .expect("resolved package must appear in the conflict")
            .union(
                satisfier_cause
                    .get(package)
                    .expect("resolved package must appear in the cause"),
            );
        if union != Term::any() {
            terms.push((package.clone(), union));
        }
        terms.retain(|(_, term)| term != &Term::any());
        debug_assert!(
            terms.iter().all(|(_, term)| !term.is_none()),
            "resolution produced a vacuous incompatibility"
        );
        Self {
            terms,
            cause: Cause::Derived(ids.0, ids.1),
        }
    }

    /// Check if an incompatibility should mark the end of the algorithm:
    /// either nothing is left to dispute, or the root package alone is
    /// forbidden.
    pub(crate) fn is_failure(&self) -> bool {
        match self.terms.as_slice() {
            [] => true,
            [(package, term)] => package.is_root() && term.is_positive(),
            _ => false,
        }
    }

    /// Get the term related to a given package (if it exists).
    pub(crate) fn get(&self, package: &Package<P>) -> Option<&Term<VS>> {
        self.terms
            .iter()
            .find(|(p, _)| p == package)
            .map(|(_, term)| term)
    }

    /// Iterate over packages and their terms.
    pub(crate) fn terms(&self) -> impl Iterator<Item = (&Package<P>, &Term<VS>)> {
        self.terms.iter().map(|(p, term)| (p, term))
    }

    /// Clone the term list, for failure reporting.
    pub(crate) fn terms_vec(&self) -> Vec<(Package<P>, Term<VS>)> {
        self.terms.clone()
    }

    pub(crate) fn cause(&self) -> &Cause<P, VS> {
        &self.cause
    }

    /// Retrieve parent identifiers when the incompatibility was learned.
    pub(crate) fn parents(&self) -> Option<(usize, usize)> {
        match self.cause {
            Cause::Derived(first, second) => Some((first, second)),
            _ => None,
        }
    }

    /// CF definition of Relation enum.
    pub(crate) fn relation<'t>(
        &self,
        mut terms: impl FnMut(&Package<P>) -> Option<&'t Term<VS>>,
    ) -> Relation<P>
    where
        VS: 't,
    {
        let mut relation = Relation::Satisfied;
        for (package, term) in &self.terms {
            match terms(package).map(|accumulated| accumulated.relation(term)) {
                Some(SetRelation::Subset) => {}
                Some(SetRelation::Disjoint) => {
                    return Relation::Contradicted(package.clone());
                }
                None | Some(SetRelation::Overlapping) => {
                    // A package without assignments is inconclusive for
                    // any term we keep: tautological terms are never
                    // stored in incompatibilities.
                    if matches!(relation, Relation::Satisfied) {
                        relation = Relation::AlmostSatisfied(package.clone());
                    } else {
                        relation = Relation::Inconclusive;
                    }
                }
            }
        }
        relation
    }
}

impl<P: PackageId, VS: VersionSet> fmt::Display for Incompatibility<P, VS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "{{}}");
        }
        let terms: Vec<String> = self
            .terms
            .iter()
            .map(|(package, term)| format!("{} {}", package, term))
            .collect();
        write!(f, "{{ {} }}", terms.join(", "))
    }
}

// TESTS #######################################################################
