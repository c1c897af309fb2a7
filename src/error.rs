// SPDX-License-Identifier: MPL-2.0

//! Handling solver errors.

use thiserror::Error;

use crate::package::PackageId;
use crate::report::Derivation;
use crate::version_set::VersionSet;

/// Errors that may occur while solving dependencies.
///
/// Apart from [NoSolution](SolveError::NoSolution), every variant wraps an
/// error raised by the caller's [PackageSource](crate::source::PackageSource)
/// together with the query the solver was making at that moment. The solver
/// gives no guarantee about its internal consistency after a source error;
/// retry with a fresh call to [resolve](crate::solver::resolve).
#[derive(Error, Debug)]
pub enum SolveError<P: PackageId, VS: VersionSet> {
    /// No assignment of versions can satisfy all the constraints.
    /// The payload is the derivation DAG of the failure, which
    /// [FailureWriter](crate::report::FailureWriter) turns into
    /// a human-readable explanation.
    #[error("version solving failed")]
    NoSolution(Box<Derivation<P, VS>>),

    /// The source failed while the solver was asking for the dependencies
    /// of the project itself.
    #[error("retrieving the root dependencies failed")]
    RootDependencies {
        /// The source's own error.
        source: Box<dyn std::error::Error>,
    },

    /// The source failed while the solver was enumerating the candidate
    /// versions of a package.
    #[error("enumerating versions of {package} failed")]
    VersionEnumeration {
        /// The package whose versions were being enumerated.
        package: P,
        /// The source's own error.
        source: Box<dyn std::error::Error>,
    },

    /// The source failed while the solver was asking for the dependencies
    /// of one candidate version.
    #[error("retrieving dependencies of {package} {version} failed")]
    DependencyRetrieval {
        /// The package whose dependencies were being retrieved.
        package: P,
        /// The candidate version in question.
        version: VS::V,
        /// The source's own error.
        source: Box<dyn std::error::Error>,
    },
}
