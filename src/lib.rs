// SPDX-License-Identifier: MPL-2.0

//! Conflict-driven version solving.
//!
//! Given the dependencies of a project, version solving picks one
//! concrete version for every package involved so that every constraint
//! holds, or establishes that no such assignment exists and says why in
//! plain English. This crate implements the PubGrub algorithm: unit
//! propagation over forbidden version combinations, conflict resolution
//! by the rule of resolution, and a renderer for the chain of deductions
//! behind a failure.
//!
//! # Packages, versions and version sets
//!
//! The solver has no opinion about what a package or a version is.
//! Package identifiers need to implement our [PackageId] trait, which is
//! automatic if the type already implements
//! [Clone] + [Eq] + [Hash](std::hash::Hash) + [Debug](std::fmt::Debug) +
//! [Display](std::fmt::Display), so things like [String] work out of the
//! box. Versions only need to be cloneable, totally ordered and
//! displayable. Constraints over them are any type implementing the
//! [VersionSet] boolean algebra; the provided [Range] works for any
//! ordered version type, such as [SemanticVersion] or plain integers.
//!
//! # Basic example
//!
//! Imagine a user interface project that pulls in a `menu` widget and an
//! `icons` set. The menu itself renders dropdowns, and dropdowns display
//! icons too, so the full picture is:
//!
//! - the project depends on `menu` and `icons`
//! - `menu` depends on `dropdown`
//! - `dropdown` depends on `icons`
//! - `icons` has no dependency
//!
//! We can model that scenario with this library as follows
//! ```
//! # use accord::{resolve, OfflineSource, Range};
//! type NumVS = Range<u32>;
//!
//! let mut source = OfflineSource::<&str, NumVS>::new(1u32);
//! source.add_root_dependencies([("menu", Range::full()), ("icons", Range::full())]);
//! source.add_dependencies("menu", 1u32, [("dropdown", Range::full())]);
//! source.add_dependencies("dropdown", 1u32, [("icons", Range::full())]);
//! source.add_dependencies("icons", 1u32, []);
//!
//! // Run the algorithm.
//! let resolution = resolve(&source).unwrap();
//! assert_eq!(resolution.decisions["menu"], 1);
//! assert_eq!(resolution.decisions["icons"], 1);
//! ```
//!
//! # The PackageSource trait
//!
//! The example above used [OfflineSource], a basic implementation of the
//! [PackageSource] trait holding every candidate version and dependency
//! list in memory. Implementing [PackageSource] for your own type is how
//! the solver gets connected to a real registry:
//!
//! - [root_version](PackageSource::root_version) and
//!   [root_dependencies](PackageSource::root_dependencies) describe the
//!   project being solved;
//! - [versions_for](PackageSource::versions_for) lists the candidate
//!   versions of a package inside a set, with the most preferred version
//!   last: the solver picks from the back, so ascending order means
//!   "prefer the highest";
//! - [dependencies_for](PackageSource::dependencies_for) gives the
//!   dependencies of one candidate;
//! - [allow_missing](PackageSource::allow_missing) opts a package into
//!   being silently skipped when the source does not know it.
//!
//! In a real scenario these methods may involve reading the file system or
//! network requests, so you may want to hold a cache in your
//! implementation. They must stay consistent over the course of one solve:
//! the solver assumes that asking the same question twice gives the same
//! answer.
//!
//! # Solution and failure reporting
//!
//! When everything goes well, [resolve] returns a [Resolution] carrying
//! the selected version for every package needed by the project, along
//! with the number of attempted solutions. When dependencies are
//! incompatible, it returns [SolveError::NoSolution] carrying a
//! [Derivation]: the full chain of deductions that led to the
//! contradiction. [FailureWriter] renders it as numbered prose:
//!
//! ```
//! # use accord::{resolve, FailureWriter, OfflineSource, Range, SolveError};
//! # let mut source = OfflineSource::<&str, Range<u32>>::new(1u32);
//! # source.add_root_dependencies([("foo", Range::higher_than(2u32))]);
//! # source.add_dependencies("foo", 1u32, []);
//! match resolve(&source) {
//!     Ok(resolution) => println!("{:?}", resolution.decisions),
//!     Err(SolveError::NoSolution(derivation)) => {
//!         eprintln!("{}", FailureWriter::render(&derivation));
//!     }
//!     Err(err) => panic!("{:?}", err),
//! };
//! ```
//!
//! which prints, for the source built above:
//!
//! ```txt
//! Because no versions of foo match >=2 and installation requires foo (>=2), version solving failed.
//! ```

#![warn(missing_docs)]

mod error;
mod package;
mod range;
mod report;
mod solver;
mod source;
mod term;
mod type_aliases;
mod version;
mod version_set;

pub use error::SolveError;
pub use package::{Package, PackageId};
pub use range::Range;
pub use report::{Deduced, Derivation, Fact, FailureWriter};
pub use solver::{resolve, Resolution};
pub use source::{Candidates, OfflineSource, PackageSource};
pub use term::Term;
pub use type_aliases::{Dependencies, Map, Set};
pub use version::{SemanticVersion, VersionParseError};
pub use version_set::VersionSet;

mod internal;
