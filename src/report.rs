// SPDX-License-Identifier: MPL-2.0

//! Build a report as clear as possible as to why
//! dependency solving failed.

use std::sync::Arc;

use crate::package::{Package, PackageId};
use crate::term::Term;
use crate::type_aliases::Map;
use crate::version_set::VersionSet;

/// The derivation DAG explaining why solving failed.
///
/// Leaves are [facts](Fact) with reasons independent of the algorithm:
/// a dependency declared by some package version, the absence of matching
/// versions, an unknown package, or the root requirement itself. Inner
/// nodes were [deduced](Deduced) during conflict resolution from exactly
/// two causes. Nodes referenced several times are shared.
#[derive(Debug, Clone)]
pub enum Derivation<P: PackageId, VS: VersionSet> {
    /// An incompatibility with its own external reason.
    Fact(Fact<P, VS>),
    /// An incompatibility deduced from two others.
    Deduced(Deduced<P, VS>),
}

/// Incompatibilities that are not deduced from others:
/// they carry their own reason.
#[derive(Debug, Clone)]
pub enum Fact<P: PackageId, VS: VersionSet> {
    /// The root package must be selected at its declared version.
    RootPinned(VS::V),
    /// One version of a package depends on another package.
    Dependency {
        /// The package declaring the dependency; may be the root.
        dependent: Package<P>,
        /// The versions of `dependent` declaring it (a single version).
        dependent_set: VS,
        /// The package depended upon.
        package: P,
        /// The versions of `package` that satisfy the dependency.
        set: VS,
    },
    /// There are no versions of `package` in `set`.
    NoVersions {
        /// The package without matching versions.
        package: P,
        /// The set no version matched.
        set: VS,
    },
    /// The source does not know the package, and dependencies on it may
    /// not be dropped.
    Missing {
        /// The unknown package.
        package: P,
    },
}

/// An incompatibility deduced from two others during conflict resolution.
#[derive(Debug, Clone)]
pub struct Deduced<P: PackageId, VS: VersionSet> {
    /// Terms of the incompatibility.
    pub terms: Vec<(Package<P>, Term<VS>)>,
    /// Present when this deduction appears several times in the DAG.
    /// The writer then explains it once, with a line number, and cites
    /// that number afterwards.
    pub shared_mark: Option<usize>,
    /// First cause.
    pub first: Arc<Derivation<P, VS>>,
    /// Second cause.
    pub second: Arc<Derivation<P, VS>>,
}

/// Renderer turning a failure [Derivation] into numbered English lines.
///
/// ```text
/// Because a (1.0.0) depends on shared (>=2.0.0, <4.0.0)
/// and b (1.0.0) depends on shared (>=4.0.0), a (1.0.0) is incompatible
/// with b (1.0.0). And because installation requires a (1.0.0) and
/// installation requires b (1.0.0), version solving failed.
/// ```
///
/// The output is deterministic for identical input.
pub struct FailureWriter {
    /// Number of explanations already with a line reference.
    numbered: usize,
    /// Line references already assigned to shared deductions,
    /// keyed by their mark.
    marks: Map<usize, usize>,
    /// Accumulated lines of the report already generated.
    lines: Vec<String>,
}

impl FailureWriter {
    /// Render the whole failure derivation.
    pub fn render<P: PackageId, VS: VersionSet>(derivation: &Derivation<P, VS>) -> String {
        match derivation {
            Derivation::Fact(fact) => format!("Because {}, version solving failed.", fact_text(fact)),
            Derivation::Deduced(deduced) => {
                let mut writer = Self {
                    numbered: 0,
                    marks: Map::default(),
                    lines: Vec::new(),
                };
                writer.visit(deduced);
                writer.lines.join("\n")
            }
        }
    }

    fn visit<P: PackageId, VS: VersionSet>(&mut self, deduced: &Deduced<P, VS>) {
        self.explain(deduced);
        if let Some(mark) = deduced.shared_mark {
            if !self.marks.contains_key(&mark) {
                self.number_last_line();
                self.marks.insert(mark, self.numbered);
            }
        }
    }

    fn explain<P: PackageId, VS: VersionSet>(&mut self, current: &Deduced<P, VS>) {
        match (&*current.first, &*current.second) {
            (Derivation::Fact(fact1), Derivation::Fact(fact2)) => {
                // Simplest case, we just combine two facts.
                self.lines.push(format!(
                    "Because {} and {}, {}.",
                    fact_text(fact1),
                    fact_text(fact2),
                    terms_text(&current.terms)
                ));
            }
            (Derivation::Deduced(deduced), Derivation::Fact(fact))
            | (Derivation::Fact(fact), Derivation::Deduced(deduced)) => {
                // One cause is deduced, so we explain it first
                // then we add the one-line fact
                // and finally conclude with the current incompatibility.
                self.one_each(deduced, fact, &current.terms);
            }
            (Derivation::Deduced(deduced1), Derivation::Deduced(deduced2)) => {
                // The most complex case: both causes are deduced.
                match (self.line_of(deduced1), self.line_of(deduced2)) {
                    // If both causes already have a line reference,
                    // the explanation simply uses those references.
                    (Some(line1), Some(line2)) => {
                        self.lines.push(format!(
                            "Because {} ({}) and {} ({}), {}.",
                            terms_text(&deduced1.terms),
                            line1,
                            terms_text(&deduced2.terms),
                            line2,
                            terms_text(&current.terms)
                        ));
                    }
                    // Otherwise, if one only has a line reference,
                    // we recursively explain the one without
                    // and cite the other to conclude.
                    (Some(line1), None) => {
                        self.visit(deduced2);
                        self.lines.push(format!(
                            "And because {} ({}), {}.",
                            terms_text(&deduced1.terms),
                            line1,
                            terms_text(&current.terms)
                        ));
                    }
                    (None, Some(line2)) => {
                        self.visit(deduced1);
                        self.lines.push(format!(
                            "And because {} ({}), {}.",
                            terms_text(&deduced2.terms),
                            line2,
                            terms_text(&current.terms)
                        ));
                    }
                    // Finally, if no line reference exists yet,
                    // we explain the first one and either it gained a
                    // reference (it was shared) and we can simply retry,
                    // or we number it ourselves, explain the second,
                    // and conclude citing the number.
                    (None, None) => {
                        self.visit(deduced1);
                        if deduced1.shared_mark.is_some() {
                            self.lines.push(String::new());
                            self.explain(current);
                        } else {
                            self.number_last_line();
                            let line1 = self.numbered;
                            self.lines.push(String::new());
                            self.visit(deduced2);
                            self.lines.push(format!(
                                "And because {} ({}), {}.",
                                terms_text(&deduced1.terms),
                                line1,
                                terms_text(&current.terms)
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Explain a deduced and a fact cause.
    /// The shape depends on whether the deduction was already explained.
    fn one_each<P: PackageId, VS: VersionSet>(
        &mut self,
        deduced: &Deduced<P, VS>,
        fact: &Fact<P, VS>,
        current_terms: &[(Package<P>, Term<VS>)],
    ) {
        match self.line_of(deduced) {
            Some(line) => self.lines.push(format!(
                "Because {} ({}) and {}, {}.",
                terms_text(&deduced.terms),
                line,
                fact_text(fact),
                terms_text(current_terms)
            )),
            None => self.recurse_one_each(deduced, fact, current_terms),
        }
    }

    /// Explain one deduction without a line reference yet, plus one fact.
    fn recurse_one_each<P: PackageId, VS: VersionSet>(
        &mut self,
        deduced: &Deduced<P, VS>,
        fact: &Fact<P, VS>,
        current_terms: &[(Package<P>, Term<VS>)],
    ) {
        match (&*deduced.first, &*deduced.second) {
            // If the deduction has itself a fact cause,
            // we can chain the fact explanations.
            (Derivation::Deduced(prior), Derivation::Fact(prior_fact))
            | (Derivation::Fact(prior_fact), Derivation::Deduced(prior)) => {
                self.visit(prior);
                self.lines.push(format!(
                    "And because {} and {}, {}.",
                    fact_text(prior_fact),
                    fact_text(fact),
                    terms_text(current_terms)
                ));
            }
            _ => {
                self.visit(deduced);
                self.lines.push(format!(
                    "And because {}, {}.",
                    fact_text(fact),
                    terms_text(current_terms)
                ));
            }
        }
    }

    // Helper functions ########################################################

    /// Give the last line a number, in order of first appearance.
    fn number_last_line(&mut self) {
        self.numbered += 1;
        if let Some(line) = self.lines.last_mut() {
            *line = format!("{} ({})", line, self.numbered);
        }
    }

    fn line_of<P: PackageId, VS: VersionSet>(&self, deduced: &Deduced<P, VS>) -> Option<usize> {
        deduced
            .shared_mark
            .and_then(|mark| self.marks.get(&mark).copied())
    }
}

/// Phrase a fact the way a human would state it.
fn fact_text<P: PackageId, VS: VersionSet>(fact: &Fact<P, VS>) -> String {
    match fact {
        Fact::RootPinned(version) => format!("installation requires root {}", version),
        Fact::Dependency {
            dependent: Package::Root,
            package,
            set,
            ..
        } => format!("installation requires {} ({})", package, set),
        Fact::Dependency {
            dependent,
            dependent_set,
            package,
            set,
        } => format!(
            "{} ({}) depends on {} ({})",
            dependent, dependent_set, package, set
        ),
        Fact::NoVersions { package, set } => {
            if set.is_any() {
                format!("no versions of {} are available", package)
            } else {
                format!("no versions of {} match {}", package, set)
            }
        }
        Fact::Missing { package } => format!("{} doesn't exist", package),
    }
}

/// Phrase the terms of a deduced incompatibility.
fn terms_text<P: PackageId, VS: VersionSet>(terms: &[(Package<P>, Term<VS>)]) -> String {
    match terms {
        [] => "version solving failed".into(),
        [(Package::Root, term)] if term.is_positive() => "version solving failed".into(),
        [(package, Term::Positive(set))] => {
            if set.is_any() {
                format!("{} is forbidden", package)
            } else {
                format!("{} ({}) is forbidden", package, set)
            }
        }
        [(package, Term::Negative(set))] => {
            if set.is_any() {
                format!("{} is required", package)
            } else {
                format!("{} ({}) is required", package, set)
            }
        }
        [(p1, Term::Positive(s1)), (p2, Term::Negative(s2))] => requires(p1, s1, p2, s2),
        [(p1, Term::Negative(s1)), (p2, Term::Positive(s2))] => requires(p2, s2, p1, s1),
        slice => {
            let all: Vec<String> = slice
                .iter()
                .map(|(package, term)| match term {
                    Term::Positive(set) => format!("{} ({})", package, set),
                    Term::Negative(set) => format!("not {} ({})", package, set),
                })
                .collect();
            format!("{} are incompatible", all.join(", "))
        }
    }
}

/// Dependency-shaped deduction: a positive term on the dependent side,
/// a negative one on the required side.
fn requires<P: PackageId, VS: VersionSet>(
    dependent: &Package<P>,
    dependent_set: &VS,
    package: &Package<P>,
    set: &VS,
) -> String {
    if dependent.is_root() {
        return format!("installation requires {} ({})", package, set);
    }
    if dependent_set.is_any() {
        format!("every version of {} requires {} ({})", dependent, package, set)
    } else {
        format!(
            "{} ({}) requires {} ({})",
            dependent, dependent_set, package, set
        )
    }
}
