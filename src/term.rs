// SPDX-License-Identifier: MPL-2.0

//! A term is the fundamental unit of operation of the solver.
//! It is a positive or negative expression regarding a set of versions.

use std::fmt;

use crate::version_set::VersionSet;

/// A positive or negative expression regarding a set of versions.
///
/// A term is always understood relative to one package: the solver keeps
/// the package name alongside, in assignments and incompatibility terms.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Term<VS: VersionSet> {
    /// A positive term like "1.0.0 <= v < 2.0.0" holds when a version of
    /// the package is selected and that version lies in the set.
    Positive(VS),
    /// A negative term like "not v < 3.0.0" holds when the selected
    /// version lies outside the set, and also when no version of the
    /// package is selected at all.
    Negative(VS),
}

/// Base methods.
impl<VS: VersionSet> Term<VS> {
    /// A term that is always true.
    pub(crate) fn any() -> Self {
        Self::Negative(VS::empty())
    }

    /// A positive term containing exactly that version.
    pub(crate) fn exact(version: VS::V) -> Self {
        Self::Positive(VS::singleton(version))
    }

    /// Simply check if a term is positive.
    pub fn is_positive(&self) -> bool {
        match self {
            Self::Positive(_) => true,
            Self::Negative(_) => false,
        }
    }

    /// The version set carried by this term.
    pub fn version_set(&self) -> &VS {
        match self {
            Self::Positive(set) | Self::Negative(set) => set,
        }
    }

    /// Flip the polarity: the inverted term holds exactly when the
    /// original one does not.
    pub(crate) fn inverse(&self) -> Self {
        match self {
            Self::Positive(set) => Self::Negative(set.clone()),
            Self::Negative(set) => Self::Positive(set.clone()),
        }
    }

    /// A term never true is the positive term over the empty set.
    /// Negative terms are satisfiable by leaving the package unselected.
    pub(crate) fn is_none(&self) -> bool {
        match self {
            Self::Positive(set) => set.is_empty(),
            Self::Negative(_) => false,
        }
    }

    /// The version set of a positive term, used when enumerating
    /// candidate versions for a package.
    pub(crate) fn as_positive(&self) -> Option<&VS> {
        match self {
            Self::Positive(set) => Some(set),
            Self::Negative(_) => None,
        }
    }
}

/// Set operations with terms.
impl<VS: VersionSet> Term<VS> {
    /// Compute the intersection of two terms.
    /// If at least one term is positive, the intersection is also positive.
    pub(crate) fn intersection(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Positive(s1), Self::Positive(s2)) => Self::Positive(s1.intersection(s2)),
            (Self::Positive(s1), Self::Negative(s2)) => Self::Positive(s1.difference(s2)),
            (Self::Negative(s1), Self::Positive(s2)) => Self::Positive(s2.difference(s1)),
            (Self::Negative(s1), Self::Negative(s2)) => Self::Negative(s1.union(s2)),
        }
    }

    /// Compute the union of two terms.
    /// If at least one term is negative, the union is also negative.
    pub(crate) fn union(&self, other: &Self) -> Self {
        self.inverse().intersection(&other.inverse()).inverse()
    }

    /// Compute the difference of two terms: assignments of `self`
    /// that are not assignments of `other`.
    pub(crate) fn difference(&self, other: &Self) -> Self {
        self.intersection(&other.inverse())
    }

    /// Indicate if this term satisfies another term, i.e. all assignments
    /// allowed by `self` are also allowed by `other`. Just like for sets,
    /// that is the case if and only if self ∩ other == self.
    pub(crate) fn satisfies(&self, other: &Self) -> bool {
        self == &self.intersection(other)
    }
}

/// How the assignments allowed by one term relate to those of another term
/// on the same package.
#[derive(Eq, PartialEq, Debug)]
pub(crate) enum SetRelation {
    /// Every assignment of the subject term also satisfies the other term:
    /// the other term is satisfied.
    Subset,
    /// No assignment can satisfy both terms: the other term is contradicted.
    Disjoint,
    /// Some assignments satisfy the other term and some do not.
    Overlapping,
}

impl<VS: VersionSet> Term<VS> {
    /// Relate this term (typically the accumulated assignments for a
    /// package) to another term (typically a term of an incompatibility).
    pub(crate) fn relation(&self, other: &Self) -> SetRelation {
        let intersection = self.intersection(other);
        if &intersection == self {
            SetRelation::Subset
        } else if intersection.is_none() {
            SetRelation::Disjoint
        } else {
            SetRelation::Overlapping
        }
    }

    /// Check if a version set satisfies this term.
    #[cfg(test)]
    fn satisfied_by(&self, set: &VS) -> bool {
        Self::Positive(set.clone()).satisfies(self)
    }

    /// Check if a version set contradicts this term.
    #[cfg(test)]
    fn contradicted_by(&self, set: &VS) -> bool {
        Self::Positive(set.clone()).relation(self) == SetRelation::Disjoint
    }
}

// REPORT ######################################################################

impl<VS: VersionSet> fmt::Display for Term<VS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive(set) => write!(f, "{}", set),
            Self::Negative(set) => write!(f, "not ( {} )", set),
        }
    }
}

// TESTS #######################################################################
