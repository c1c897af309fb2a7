// SPDX-License-Identifier: MPL-2.0

//! The interface between the solver and whatever provides package metadata.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::error::Error;
use std::fmt::{Debug, Display};

use crate::package::PackageId;
use crate::type_aliases::{Dependencies, Map, Set};
use crate::version_set::VersionSet;

/// Answer of a package source when asked for the versions of a package.
#[derive(Debug, Clone)]
pub enum Candidates<V> {
    /// The versions matching the queried set,
    /// ordered with the most preferred version last.
    Known(Vec<V>),
    /// The source has never heard of that package.
    Unknown,
}

/// Trait that allows the solver to retrieve available packages
/// and their dependencies. An implementor needs to be supplied
/// to the [resolve](crate::solver::resolve) function.
///
/// Calls may be slow (they may fetch remote metadata), but they must be
/// idempotent and referentially transparent for the duration of one solve:
/// repeated queries for the same arguments must return the same result.
/// The solver relies on this to cache package-existence answers.
/// Returning an error from any method aborts the solve.
pub trait PackageSource {
    /// How this source names packages.
    type P: PackageId;

    /// How this source stores the versions of the packages.
    ///
    /// A common choice is [`SemanticVersion`][crate::version::SemanticVersion].
    type V: Clone + Ord + Debug + Display;

    /// How this source stores the version requirements for the packages.
    /// The requirements must be able to process the same kind of version
    /// as this source.
    ///
    /// A common choice is [`Range`][crate::range::Range].
    type VS: VersionSet<V = Self::V>;

    /// The kind of error returned from these methods.
    ///
    /// Returning this signals that resolution should fail with this error.
    type Err: Error + 'static;

    /// The version of the top-level project whose dependencies are being
    /// solved. It is the single version of the solver's synthetic root
    /// package.
    fn root_version(&self) -> Self::V;

    /// The dependencies requested by the user: the dependencies of the
    /// synthetic root package.
    fn root_dependencies(&self) -> Result<Dependencies<Self::P, Self::VS>, Self::Err>;

    /// The versions of `package` contained in `set`, ordered with the most
    /// preferred version last, or [Candidates::Unknown] if the source does
    /// not know the package at all. The answer for the full set is also how
    /// the solver probes whether a dependency exists.
    fn versions_for(
        &self,
        package: &Self::P,
        set: &Self::VS,
    ) -> Result<Candidates<Self::V>, Self::Err>;

    /// The dependencies of one version of a package. The solver only asks
    /// about versions previously returned by
    /// [versions_for](PackageSource::versions_for).
    fn dependencies_for(
        &self,
        package: &Self::P,
        version: &Self::V,
    ) -> Result<Dependencies<Self::P, Self::VS>, Self::Err>;

    /// Whether a dependency on this package may be silently dropped when
    /// the source does not know the package. Unknown packages among the
    /// root dependencies are fatal regardless of this answer.
    fn allow_missing(&self, _package: &Self::P) -> bool {
        false
    }
}

/// A basic implementation of [PackageSource] holding all metadata in
/// memory, convenient for tests and for small fixed registries.
/// Versions are kept in ascending order, which makes the highest matching
/// version the preferred one.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "P: serde::Serialize, VS: serde::Serialize, VS::V: serde::Serialize",
        deserialize = "P: serde::Deserialize<'de>, VS: serde::Deserialize<'de>, VS::V: serde::Deserialize<'de>"
    ))
)]
pub struct OfflineSource<P: PackageId, VS: VersionSet> {
    root_version: VS::V,
    root_dependencies: Dependencies<P, VS>,
    packages: Map<P, BTreeMap<VS::V, Dependencies<P, VS>>>,
    missing_allowed: Set<P>,
}

impl<P: PackageId, VS: VersionSet> OfflineSource<P, VS> {
    /// Creates a source with the given root version and no packages.
    pub fn new(root_version: impl Into<VS::V>) -> Self {
        Self {
            root_version: root_version.into(),
            root_dependencies: Vec::new(),
            packages: Map::default(),
            missing_allowed: Set::default(),
        }
    }

    /// Registers the user's requested dependencies.
    pub fn add_root_dependencies<I: IntoIterator<Item = (P, VS)>>(&mut self, dependencies: I) {
        self.root_dependencies.extend(dependencies);
    }

    /// Registers one version of a package along with its dependencies
    /// (possibly none). Calling this again for the same pair replaces the
    /// previous dependency list, so that
    /// [dependencies_for](PackageSource::dependencies_for) always answers
    /// with the complete list.
    pub fn add_dependencies<I: IntoIterator<Item = (P, VS)>>(
        &mut self,
        package: P,
        version: impl Into<VS::V>,
        dependencies: I,
    ) {
        let dependencies = dependencies.into_iter().collect();
        *self
            .packages
            .entry(package)
            .or_default()
            .entry(version.into())
            .or_default() = dependencies;
    }

    /// Marks a package as tolerated when absent: dependencies on it are
    /// dropped instead of failing the solve.
    pub fn tolerate_missing(&mut self, package: P) {
        self.missing_allowed.insert(package);
    }

    /// Lists packages that have been saved.
    pub fn packages(&self) -> impl Iterator<Item = &P> {
        self.packages.keys()
    }

    /// Lists versions of a saved package in ascending order.
    /// Returns [None] if no information is available regarding that package.
    pub fn versions(&self, package: &P) -> Option<impl Iterator<Item = &VS::V>> {
        self.packages.get(package).map(|index| index.keys())
    }
}

impl<P: PackageId, VS: VersionSet> PackageSource for OfflineSource<P, VS> {
    type P = P;
    type V = VS::V;
    type VS = VS;
    type Err = Infallible;

    fn root_version(&self) -> VS::V {
        self.root_version.clone()
    }

    fn root_dependencies(&self) -> Result<Dependencies<P, VS>, Infallible> {
        Ok(self.root_dependencies.clone())
    }

    fn versions_for(&self, package: &P, set: &VS) -> Result<Candidates<VS::V>, Infallible> {
        Ok(match self.packages.get(package) {
            None => Candidates::Unknown,
            // BTreeMap iterates in ascending order, so the highest
            // matching version ends up last, which is what the solver
            // treats as most preferred.
            Some(index) => {
                Candidates::Known(index.keys().filter(|&v| set.allows(v)).cloned().collect())
            }
        })
    }

    fn dependencies_for(&self, package: &P, version: &VS::V) -> Result<Dependencies<P, VS>, Infallible> {
        Ok(self
            .packages
            .get(package)
            .and_then(|index| index.get(version))
            .cloned()
            .unwrap_or_default())
    }

    fn allow_missing(&self, package: &P) -> bool {
        self.missing_allowed.contains(package)
    }
}
