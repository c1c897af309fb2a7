// SPDX-License-Identifier: MPL-2.0

//! Trait for identifying packages, and the synthetic root package.

use std::fmt::{self, Debug, Display};
use std::hash::Hash;

/// What the solver requires of a package identifier: cheap to clone,
/// comparable, hashable, and printable in explanations. The blanket
/// implementation below covers any type with those properties, so
/// [String] or `&str` work out of the box.
pub trait PackageId: Clone + Eq + Hash + Debug + Display {}

impl<T: Clone + Eq + Hash + Debug + Display> PackageId for T {}

/// A package as seen by the solver: either the synthetic root package,
/// whose single version carries the user's requested dependencies,
/// or a package named by the package source.
///
/// The root is a per-solve sentinel. It never appears in the returned
/// decisions, but it may appear in the terms of a failure derivation.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Package<P: PackageId> {
    /// The synthetic top-level package.
    Root,
    /// A package known to the package source.
    Named(P),
}

impl<P: PackageId> Package<P> {
    /// Return the source-side name, unless this is the root.
    pub fn named(&self) -> Option<&P> {
        match self {
            Package::Root => None,
            Package::Named(p) => Some(p),
        }
    }

    pub(crate) fn is_root(&self) -> bool {
        matches!(self, Package::Root)
    }
}

impl<P: PackageId> Display for Package<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Package::Root => write!(f, "root"),
            Package::Named(p) => write!(f, "{}", p),
        }
    }
}
