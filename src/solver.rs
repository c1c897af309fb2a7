// SPDX-License-Identifier: MPL-2.0

//! The solving algorithm's top-level loop: propagate, then decide,
//! until the partial solution is total or the conflict is irreducible.
//!
//! When no solution exists, the failure report reads like this one,
//! from the introductory blog post about PubGrub:
//!
//! ```txt
//! Because dropdown >=2.0.0 depends on icons >=2.0.0 and
//!   root depends on icons <2.0.0, dropdown >=2.0.0 is forbidden.
//!
//! And because menu >=1.1.0 depends on dropdown >=2.0.0,
//!   menu >=1.1.0 is forbidden.
//! ```
//!
//! The algorithm is generic and works for any type of dependency system
//! as long as packages and versions implement the
//! [PackageId](crate::package::PackageId) bounds and the version sets
//! implement [VersionSet](crate::version_set::VersionSet).

use std::collections::BTreeSet;

use log::{debug, info};

use crate::error::SolveError;
use crate::internal::incompatibility::Incompatibility;
use crate::internal::state::State;
use crate::package::{Package, PackageId};
use crate::source::{Candidates, PackageSource};
use crate::type_aliases::{Dependencies, Map, Set};
use crate::version_set::VersionSet;

/// A successful resolution: one concrete version per selected package.
#[derive(Debug, Clone)]
pub struct Resolution<P: PackageId, V> {
    /// The selected version of every package required by the solve,
    /// the synthetic root excluded.
    pub decisions: Map<P, V>,
    /// How many candidate assignments were visited: 1 for a solve that
    /// never had to renounce a version, plus one for every candidate
    /// version abandoned because registering its dependencies conflicted
    /// immediately with the partial solution.
    pub attempted_solutions: u64,
}

/// Main function of the library. Finds a set of packages satisfying the
/// dependency bounds declared by the source, or explains why none exists.
pub fn resolve<S: PackageSource>(
    source: &S,
) -> Result<Resolution<S::P, S::V>, SolveError<S::P, S::VS>> {
    let root_version = source.root_version();
    let mut state: State<S::P, S::VS> = State::new(root_version.clone());
    let mut attempted_solutions: u64 = 1;
    // Pairs whose dependency incompatibilities are already registered.
    // A BTreeSet because versions are ordered, not hashed.
    let mut added_dependencies: Map<S::P, BTreeSet<S::V>> = Map::default();
    // Package-existence answers, cached for the duration of the solve
    // (the source is referentially transparent while we run).
    let mut known_packages: Map<S::P, bool> = Map::default();
    // Packages already recorded as missing, to register them only once.
    let mut missing_noted: Set<S::P> = Set::default();
    let mut next = Package::Root;
    loop {
        info!("unit propagation: {}", next);
        state
            .propagate(next)
            .map_err(|failure| SolveError::NoSolution(Box::new(state.failure_derivation(failure))))?;
        debug!("partial solution after unit propagation:\n{}", state.partial);

        // Decision making: among the packages required but not yet pinned,
        // work on the one with the fewest candidate versions. That tends to
        // surface conflicts earlier, when backtracking is still cheap.
        // Ties go to the package seen first.
        let mut picked: Option<(Package<S::P>, S::VS, Vec<S::V>)> = None;
        for (package, set) in state.partial.undecided_positive() {
            let candidates = match package {
                Package::Root => {
                    debug_assert!(set.allows(&root_version));
                    vec![root_version.clone()]
                }
                Package::Named(name) => {
                    match source
                        .versions_for(name, set)
                        .map_err(|err| SolveError::VersionEnumeration {
                            package: name.clone(),
                            source: Box::new(err),
                        })? {
                        Candidates::Known(versions) => versions,
                        // Existence was probed when the package first
                        // appeared as a dependency; its incompatibility is
                        // already registered, an empty candidate list is
                        // enough here.
                        Candidates::Unknown => Vec::new(),
                    }
                }
            };
            match &picked {
                Some((_, _, best)) if best.len() <= candidates.len() => {}
                _ => picked = Some((package.clone(), set.clone(), candidates)),
            }
        }
        let Some((package, set, candidates)) = picked else {
            // Every package carrying a positive term is decided:
            // the partial solution is a total one.
            let decisions = state
                .partial
                .decisions()
                .filter_map(|(package, version)| {
                    package.named().map(|name| (name.clone(), version.clone()))
                })
                .collect();
            return Ok(Resolution {
                decisions,
                attempted_solutions,
            });
        };

        // Pick the most preferred candidate (the last one).
        let Some(version) = candidates.last() else {
            // No version matches the accumulated constraint.
            let name = package
                .named()
                .expect("the root version always matches its own constraint")
                .clone();
            info!("no versions of {} match {}", name, set);
            state.add(Incompatibility::no_versions(name, set));
            next = package;
            continue;
        };

        let is_new = match &package {
            Package::Root => true,
            Package::Named(name) => added_dependencies
                .entry(name.clone())
                .or_default()
                .insert(version.clone()),
        };
        if is_new {
            let dependencies = match &package {
                Package::Root => {
                    source
                        .root_dependencies()
                        .map_err(|err| SolveError::RootDependencies {
                            source: Box::new(err),
                        })?
                }
                Package::Named(name) => source.dependencies_for(name, version).map_err(|err| {
                    SolveError::DependencyRetrieval {
                        package: name.clone(),
                        version: version.clone(),
                        source: Box::new(err),
                    }
                })?,
            };
            let ids = register_dependencies(
                &mut state,
                source,
                &mut known_packages,
                &mut missing_noted,
                &package,
                version,
                dependencies,
            )?;
            if state.decision_conflicts(&package, version, &ids) {
                // Not selectable right now. The propagation round below
                // rules the version out through the incompatibilities just
                // registered, and the package is picked again with its
                // next preferred version.
                info!("skipping {} @ {}: its dependencies conflict", package, version);
                attempted_solutions += 1;
                next = package;
                continue;
            }
        }
        // When the pair was seen before, its incompatibilities are already
        // registered and propagation just reached a fixpoint without
        // satisfying them: the decision is safe.
        info!("decision: {} @ {}", package, version);
        state.partial.decide(package.clone(), version.clone());
        next = package;
    }
}

/// Register one incompatibility per dependency of `dependent` at `version`,
/// returning their identifiers so the caller can check the decision against
/// them. Dependencies on packages the source does not know are either
/// dropped ([allow_missing](PackageSource::allow_missing)) or recorded as
/// not found; for dependencies of the root, absence is always fatal.
fn register_dependencies<S: PackageSource>(
    state: &mut State<S::P, S::VS>,
    source: &S,
    known_packages: &mut Map<S::P, bool>,
    missing_noted: &mut Set<S::P>,
    dependent: &Package<S::P>,
    version: &S::V,
    dependencies: Dependencies<S::P, S::VS>,
) -> Result<Vec<usize>, SolveError<S::P, S::VS>> {
    let mut ids = Vec::with_capacity(dependencies.len());
    for (dep_package, dep_set) in dependencies {
        let exists = match known_packages.get(&dep_package) {
            Some(exists) => *exists,
            None => {
                let answer = source
                    .versions_for(&dep_package, &S::VS::full())
                    .map_err(|err| SolveError::VersionEnumeration {
                        package: dep_package.clone(),
                        source: Box::new(err),
                    })?;
                let exists = matches!(answer, Candidates::Known(_));
                known_packages.insert(dep_package.clone(), exists);
                exists
            }
        };
        if !exists {
            if !dependent.is_root() && source.allow_missing(&dep_package) {
                info!(
                    "dropping dependency of {} @ {} on unknown package {}",
                    dependent, version, dep_package
                );
                continue;
            }
            if missing_noted.insert(dep_package.clone()) {
                ids.push(state.add(Incompatibility::not_found(dep_package.clone())));
            }
        }
        if let Some(incompat) = Incompatibility::dependency(
            dependent.clone(),
            version.clone(),
            dep_package,
            dep_set,
        ) {
            ids.push(state.add(incompat));
        }
    }
    Ok(ids)
}
