// SPDX-License-Identifier: MPL-2.0

//! Core state of the solving algorithm: the incompatibility store,
//! unit propagation and conflict resolution.

use std::sync::Arc;

use crate::internal::incompatibility::{Cause, Incompatibility, Relation};
use crate::internal::partial_solution::{PartialSolution, Satisfier};
use crate::package::{Package, PackageId};
use crate::report::{Deduced, Derivation, Fact};
use crate::term::Term;
use crate::type_aliases::{Map, Set};
use crate::version_set::VersionSet;

/// Current state of the solving algorithm.
pub(crate) struct State<P: PackageId, VS: VersionSet> {
    /// Partial solution.
    pub(crate) partial: PartialSolution<P, VS>,

    /// Reference storage for all incompatibilities, append-only.
    /// Identifiers handed out by [add](State::add) index into it,
    /// and derived incompatibilities reference their parents through it.
    store: Vec<Incompatibility<P, VS>>,

    /// Which incompatibilities mention a package. Propagation only ever
    /// looks at incompatibilities through this index.
    by_package: Map<Package<P>, Vec<usize>>,

    /// Stack of packages touched since the last propagation fixpoint.
    /// Kept in the state so the allocation is reused across rounds.
    work: Vec<Package<P>>,
}

impl<P: PackageId, VS: VersionSet> State<P, VS> {
    /// Initialization, with the incompatibility stating that the root
    /// package must be selected at the declared root version.
    pub(crate) fn new(root_version: VS::V) -> Self {
        let mut state = Self {
            partial: PartialSolution::empty(),
            store: Vec::new(),
            by_package: Map::default(),
            work: Vec::new(),
        };
        state.add(Incompatibility::root(root_version));
        state
    }

    /// Add an incompatibility to the state and index it under each of the
    /// packages its terms mention.
    pub(crate) fn add(&mut self, incompat: Incompatibility<P, VS>) -> usize {
        let id = self.store.len();
        self.store.push(incompat);
        self.register(id);
        id
    }

    fn register(&mut self, id: usize) {
        debug_assert!(
            !self.store[id]
                .terms()
                .any(|(_, term)| term == &Term::any()),
            "tautological term registered: {}",
            self.store[id],
        );
        let packages: Vec<Package<P>> = self.store[id]
            .terms()
            .map(|(package, _)| package.clone())
            .collect();
        debug_assert!(
            packages
                .iter()
                .all(|p| packages.iter().filter(|q| q == &p).count() == 1),
            "incompatibility with duplicated package: {}",
            self.store[id],
        );
        for package in packages {
            self.by_package.entry(package).or_default().push(id);
        }
    }

    /// Unit propagation is the core mechanism of the solving algorithm.
    /// CF <https://github.com/dart-lang/pub/blob/master/doc/solver.md#unit-propagation>
    ///
    /// Returns the identifier of the failure incompatibility when conflict
    /// resolution bubbled up to the root.
    pub(crate) fn propagate(&mut self, package: Package<P>) -> Result<(), usize> {
        self.work.clear();
        self.work.push(package);
        while let Some(current) = self.work.pop() {
            let mut conflict = None;
            // Iterate over incompatibilities in reverse order
            // to evaluate first the newest incompatibilities.
            let ids = self
                .by_package
                .get(&current)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            for &id in ids.iter().rev() {
                match self.partial.relation(&self.store[id]) {
                    // If the partial solution satisfies the incompatibility
                    // we must perform conflict resolution.
                    Relation::Satisfied => {
                        log::info!("start conflict resolution: {}", self.store[id]);
                        conflict = Some(id);
                        break;
                    }
                    Relation::AlmostSatisfied(almost) => {
                        let term = self.store[id]
                            .get(&almost)
                            .expect("unsatisfied package is in the incompatibility")
                            .inverse();
                        log::debug!("derive {}: {} from {}", almost, term, self.store[id]);
                        self.partial.derive(almost.clone(), term, id);
                        // A linear scan is cheaper here than hashing:
                        // the work stack stays small.
                        if !self.work.contains(&almost) {
                            self.work.push(almost);
                        }
                    }
                    Relation::Contradicted(package) => {
                        log::trace!("{} contradicts {}", package, self.store[id]);
                    }
                    Relation::Inconclusive => {}
                }
            }
            if let Some(id) = conflict {
                let (package, learned) = self.resolve_conflict(id)?;
                let term = self.store[learned]
                    .get(&package)
                    .expect("learned incompatibility constrains the conflict package")
                    .inverse();
                log::debug!("derive {}: {} from learned {}", package, term, learned);
                self.work.clear();
                self.partial.derive(package.clone(), term, learned);
                self.work.push(package);
            }
        }
        // No more touched packages, propagation reached a fixpoint.
        Ok(())
    }

    /// Replace the conflict by its prior cause until it either reaches the
    /// failure marker, or until backtracking lets it force a single term.
    /// CF <https://github.com/dart-lang/pub/blob/master/doc/solver.md#conflict-resolution>
    fn resolve_conflict(&mut self, conflict: usize) -> Result<(Package<P>, usize), usize> {
        let mut current = conflict;
        let mut changed = false;
        loop {
            if self.store[current].is_failure() {
                return Err(current);
            }
            let (package, term, satisfier, mut previous_level) = self.most_recent_satisfier(current);
            // When the satisfier covers the term only together with
            // earlier assignments of the same package, those assignments
            // take part in the conflict as well.
            let difference = satisfier.term.difference(&term);
            if !difference.is_none() {
                let also = self.partial.satisfier(&package, &difference.inverse());
                previous_level = previous_level.max(also.level);
            }
            match satisfier.cause {
                Some(cause) if previous_level == satisfier.level => {
                    let prior = Incompatibility::prior_cause(
                        &self.store[current],
                        &self.store[cause],
                        &package,
                        (current, cause),
                    );
                    log::info!("prior cause: {}", prior);
                    current = self.store.len();
                    self.store.push(prior);
                    changed = true;
                }
                // The satisfier is a decision, or sits above every other
                // satisfier: backtracking below it turns the conflict into
                // a unit incompatibility on the satisfier's package.
                _ => {
                    log::info!("backtrack to level {}", previous_level);
                    self.partial.backtrack(previous_level);
                    if changed {
                        self.register(current);
                    }
                    return Ok((package, current));
                }
            }
        }
    }

    /// For each term of the conflict, find its satisfier in the assignment
    /// log; keep the latest one and the maximum level of the others.
    fn most_recent_satisfier(
        &self,
        conflict: usize,
    ) -> (Package<P>, Term<VS>, Satisfier<VS>, usize) {
        let mut best: Option<(Package<P>, Term<VS>, Satisfier<VS>)> = None;
        let mut previous_level = 0;
        for (package, term) in self.store[conflict].terms() {
            let satisfier = self.partial.satisfier(package, term);
            match &best {
                Some((_, _, latest)) if latest.index > satisfier.index => {
                    previous_level = previous_level.max(satisfier.level);
                }
                _ => {
                    if let Some((_, _, displaced)) = &best {
                        previous_level = previous_level.max(displaced.level);
                    }
                    best = Some((package.clone(), term.clone(), satisfier));
                }
            }
        }
        let (package, term, satisfier) =
            best.expect("a conflict without terms is the failure marker");
        (package, term, satisfier, previous_level)
    }

    /// Whether deciding `package` at `version` would immediately satisfy
    /// one of the given incompatibilities.
    pub(crate) fn decision_conflicts(
        &self,
        package: &Package<P>,
        version: &VS::V,
        ids: &[usize],
    ) -> bool {
        let exact = Term::exact(version.clone());
        ids.iter().any(|&id| {
            let relation = self.store[id].relation(|p| {
                if p == package {
                    Some(&exact)
                } else {
                    self.partial.accumulated(p)
                }
            });
            matches!(relation, Relation::Satisfied)
        })
    }

    // Error reporting #########################################################

    /// Extract the derivation DAG rooted at a failure incompatibility into
    /// owned, shareable nodes for reporting.
    pub(crate) fn failure_derivation(&self, failure: usize) -> Derivation<P, VS> {
        // Nodes referenced more than once get a mark, so the writer can
        // number their explanation once and cite it afterwards.
        let mut seen: Set<usize> = Set::default();
        let mut shared: Set<usize> = Set::default();
        let mut stack = vec![failure];
        while let Some(id) = stack.pop() {
            if let Some((first, second)) = self.store[id].parents() {
                if seen.contains(&id) {
                    shared.insert(id);
                } else {
                    stack.push(first);
                    stack.push(second);
                }
            }
            seen.insert(id);
        }
        // Parents always precede children in the store, so ascending
        // identifier order is a topological order.
        let mut ids: Vec<usize> = seen.into_iter().collect();
        ids.sort_unstable();
        let mut built: Map<usize, Arc<Derivation<P, VS>>> = Map::default();
        for id in ids {
            let node = match self.store[id].cause() {
                Cause::Derived(first, second) => Derivation::Deduced(Deduced {
                    terms: self.store[id].terms_vec(),
                    shared_mark: shared.contains(&id).then_some(id),
                    first: Arc::clone(&built[first]),
                    second: Arc::clone(&built[second]),
                }),
                Cause::Root(version) => Derivation::Fact(Fact::RootPinned(version.clone())),
                Cause::Dependency {
                    dependent,
                    dependent_set,
                    package,
                    set,
                } => Derivation::Fact(Fact::Dependency {
                    dependent: dependent.clone(),
                    dependent_set: dependent_set.clone(),
                    package: package.clone(),
                    set: set.clone(),
                }),
                Cause::NoVersions { package, set } => Derivation::Fact(Fact::NoVersions {
                    package: package.clone(),
                    set: set.clone(),
                }),
                Cause::NotFound { package } => Derivation::Fact(Fact::Missing {
                    package: package.clone(),
                }),
            };
            built.insert(id, Arc::new(node));
        }
        let root = built.remove(&failure).expect("failure node was built");
        Arc::into_inner(root).expect("nothing else references the failure node")
    }
}
