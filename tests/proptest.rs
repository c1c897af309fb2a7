// SPDX-License-Identifier: MPL-2.0

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;
use varisat::ExtendFormula;

use accord::{resolve, OfflineSource, Range, SolveError, VersionSet};

/// A registry entry: package name, one version, and that version's
/// dependencies. The generator only lets packages depend on packages with
/// a strictly smaller index (plus the reserved, nonexistent "bad"), so the
/// package graph is always a DAG and solving always terminates quickly.
type Registry = Vec<(String, u32, Vec<(String, Range<u32>)>)>;

fn registry_strategy() -> impl Strategy<Value = Registry> {
    prop::collection::vec(prop::collection::btree_set(0u32..6, 1..=3), 1..=8)
        .prop_flat_map(|versions_by_package: Vec<BTreeSet<u32>>| {
            let pairs: Vec<(usize, u32)> = versions_by_package
                .iter()
                .enumerate()
                .flat_map(|(index, versions)| versions.iter().map(move |v| (index, *v)))
                .collect();
            let dep_specs = prop::collection::vec(
                prop::collection::vec(
                    (
                        any::<prop::sample::Index>(),
                        0u32..6,
                        0u32..7,
                        // A rare dependency on the nonexistent "bad".
                        prop::bool::weighted(0.02),
                    ),
                    0..3,
                ),
                pairs.len(),
            );
            (Just(pairs), dep_specs)
        })
        .prop_map(|(pairs, dep_specs)| {
            pairs
                .into_iter()
                .zip(dep_specs)
                .map(|((index, version), specs)| {
                    let mut dependencies = Vec::new();
                    for (target, low, span, bad) in specs {
                        if bad {
                            dependencies.push(("bad".to_string(), Range::full()));
                            continue;
                        }
                        if index == 0 {
                            continue;
                        }
                        let target = target.index(index);
                        // span == 0 gives a dependency on the empty set,
                        // making the version unselectable.
                        dependencies
                            .push((format!("p{target}"), Range::between(low, low + span)));
                    }
                    (format!("p{index}"), version, dependencies)
                })
                .collect()
        })
}

fn offline_source(registry: &Registry) -> OfflineSource<String, Range<u32>> {
    let mut source = OfflineSource::new(0u32);
    let last = registry
        .last()
        .map(|(name, _, _)| name.clone())
        .expect("registries are nonempty");
    source.add_root_dependencies([(last, Range::full())]);
    for (package, version, dependencies) in registry {
        source.add_dependencies(package.clone(), *version, dependencies.clone());
    }
    source
}

/// Encode the registry as CNF and ask a SAT solver whether any assignment
/// of at most one version per package satisfies the root requirement and
/// every dependency of every selected version.
fn sat_resolvable(registry: &Registry) -> bool {
    let mut solver = varisat::Solver::new();
    let mut vars: HashMap<(&str, u32), varisat::Var> = HashMap::new();
    let mut by_package: HashMap<&str, Vec<(u32, varisat::Var)>> = HashMap::new();
    for (package, version, _) in registry {
        let var = solver.new_var();
        vars.insert((package.as_str(), *version), var);
        by_package
            .entry(package.as_str())
            .or_default()
            .push((*version, var));
    }
    // At most one version of each package.
    for versions in by_package.values() {
        for (i, (_, v1)) in versions.iter().enumerate() {
            for (_, v2) in &versions[i + 1..] {
                solver.add_clause(&[v1.negative(), v2.negative()]);
            }
        }
    }
    // The root requirement: some version of the last package.
    let last = registry.last().map(|(name, _, _)| name.as_str()).unwrap();
    let root_choices: Vec<varisat::Lit> = by_package[last]
        .iter()
        .map(|(_, var)| var.positive())
        .collect();
    solver.add_clause(&root_choices);
    // Every dependency of a selected version must be satisfied.
    for (package, version, dependencies) in registry {
        let selected = vars[&(package.as_str(), *version)];
        for (target, set) in dependencies {
            let mut clause = vec![selected.negative()];
            if let Some(candidates) = by_package.get(target.as_str()) {
                clause.extend(
                    candidates
                        .iter()
                        .filter(|(v, _)| set.allows(v))
                        .map(|(_, var)| var.positive()),
                );
            }
            solver.add_clause(&clause);
        }
    }
    solver.solve().expect("the formula is well-formed")
}

/// Check that a returned solution actually satisfies the registry: the root
/// requirement is met, and every dependency of every selected version is
/// selected within its set.
fn solution_is_valid(registry: &Registry, decisions: &accord::Map<String, u32>) -> bool {
    let last = registry.last().map(|(name, _, _)| name.as_str()).unwrap();
    if !decisions.contains_key(last) {
        return false;
    }
    for (package, version, dependencies) in registry {
        if decisions.get(package) != Some(version) {
            continue;
        }
        for (target, set) in dependencies {
            match decisions.get(target) {
                Some(selected) if set.allows(selected) => {}
                _ => return false,
            }
        }
    }
    true
}

proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 512,
        ..ProptestConfig::default()
    })]

    /// The solver and a SAT oracle agree on whether a solution exists,
    /// and any solution the solver returns is actually valid.
    #[test]
    fn same_verdict_as_sat_oracle(registry in registry_strategy()) {
        let source = offline_source(&registry);
        match resolve(&source) {
            Ok(resolution) => {
                prop_assert!(sat_resolvable(&registry), "solver found a solution the oracle rejects");
                prop_assert!(solution_is_valid(&registry, &resolution.decisions));
            }
            Err(SolveError::NoSolution(_)) => {
                prop_assert!(!sat_resolvable(&registry), "solver failed on a satisfiable registry");
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Solving twice with the same (deterministic) source gives the same
    /// decisions and the same number of attempted solutions.
    #[test]
    fn solving_is_idempotent(registry in registry_strategy()) {
        let source = offline_source(&registry);
        match (resolve(&source), resolve(&source)) {
            (Ok(first), Ok(second)) => {
                prop_assert_eq!(first.decisions, second.decisions);
                prop_assert_eq!(first.attempted_solutions, second.attempted_solutions);
            }
            (Err(SolveError::NoSolution(first)), Err(SolveError::NoSolution(second))) => {
                prop_assert_eq!(
                    accord::FailureWriter::render(&first),
                    accord::FailureWriter::render(&second)
                );
            }
            _ => prop_assert!(false, "the two runs disagreed"),
        }
    }

    /// Failure explanations always conclude, and never leak the synthetic
    /// root package as a dependency target.
    #[test]
    fn explanations_conclude(registry in registry_strategy()) {
        let source = offline_source(&registry);
        if let Err(SolveError::NoSolution(derivation)) = resolve(&source) {
            let text = accord::FailureWriter::render(&derivation);
            prop_assert!(text.ends_with("version solving failed."), "{}", text);
        }
    }
}
