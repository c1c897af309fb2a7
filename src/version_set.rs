// SPDX-License-Identifier: MPL-2.0

//! The boolean algebra over sets of versions that constraints live in.

use std::fmt::{Debug, Display};

/// Trait describing sets of versions.
///
/// A version set is always understood relative to a single package name;
/// the solver never mixes sets of different packages in one operation.
/// Implementations must form a boolean algebra: only intersection,
/// complement, membership and the empty/singleton constructors are
/// required, everything else has a default in terms of those.
/// [Range](crate::range::Range) is the provided implementation for
/// totally ordered versions.
///
/// The [Display] form is what failure explanations print, so it should
/// read well after "no versions of x match ".
pub trait VersionSet: Debug + Display + Clone + Eq {
    /// Version type associated with the sets manipulated.
    type V: Clone + Ord + Debug + Display;

    // Constructors
    /// The set containing no version.
    fn empty() -> Self;
    /// The set containing exactly one version.
    fn singleton(v: Self::V) -> Self;

    // Operations
    /// The set of all versions not in this set.
    fn complement(&self) -> Self;
    /// The set of versions in both this set and the other.
    fn intersection(&self, other: &Self) -> Self;

    // Membership
    /// Whether a version belongs to this set.
    fn allows(&self, v: &Self::V) -> bool;

    // Automatically implemented functions ###########################

    /// The set containing every possible version,
    /// as the complement of the empty set.
    fn full() -> Self {
        Self::empty().complement()
    }

    /// The set of versions in this set, the other, or both.
    /// De Morgan gives it from intersection and complement.
    fn union(&self, other: &Self) -> Self {
        self.complement()
            .intersection(&other.complement())
            .complement()
    }

    /// The versions of this set that are not in the other.
    fn difference(&self, other: &Self) -> Self {
        self.intersection(&other.complement())
    }

    /// Whether the set contains no version at all.
    fn is_empty(&self) -> bool {
        self == &Self::empty()
    }

    /// Whether the set contains every possible version.
    fn is_any(&self) -> bool {
        self == &Self::full()
    }

    /// Whether every version of `other` is also in this set.
    fn allows_all(&self, other: &Self) -> bool {
        other.difference(self).is_empty()
    }

    /// Whether at least one version is in both this set and `other`.
    fn allows_any(&self, other: &Self) -> bool {
        !self.intersection(other).is_empty()
    }
}
