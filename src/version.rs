// SPDX-License-Identifier: MPL-2.0

//! A simple semantic version type for embedders and tests.

use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;

/// A `major.minor.patch` version number, ordered lexicographically on its
/// three components. The solver itself works with any totally ordered
/// version type; this one is provided for convenience.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SemanticVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl SemanticVersion {
    /// The version `major.minor.patch`.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The smallest version with the next patch number.
    pub fn bump_patch(self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }

    /// The smallest version with the next minor number.
    pub fn bump_minor(self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }

    /// The smallest version with the next major number.
    /// Useful to express caret requirements: `^2.3.1` is the range from
    /// `2.3.1` up to, excluded, `2.3.1.bump_major()`.
    pub fn bump_major(self) -> Self {
        Self::new(self.major + 1, 0, 0)
    }
}

/// Shorthand conversion from a `(major, minor, patch)` tuple,
/// handy when building registries in tests.
impl From<(u32, u32, u32)> for SemanticVersion {
    fn from((major, minor, patch): (u32, u32, u32)) -> Self {
        Self::new(major, minor, patch)
    }
}

impl Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error when parsing a [SemanticVersion] from a string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionParseError {
    /// The string does not have exactly three dot-separated components.
    #[error("expected three dot-separated numbers, got \"{full_version}\"")]
    NotThreeParts {
        /// The full string being parsed.
        full_version: String,
    },
    /// One of the components is not a valid number.
    #[error("could not parse \"{version_part}\" in \"{full_version}\" as a number")]
    ParseIntError {
        /// The full string being parsed.
        full_version: String,
        /// The component that failed to parse.
        version_part: String,
    },
}

impl FromStr for SemanticVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut components = s.splitn(3, '.').map(|part| {
            part.parse::<u32>()
                .map_err(|_| VersionParseError::ParseIntError {
                    full_version: s.to_string(),
                    version_part: part.to_string(),
                })
        });
        match (components.next(), components.next(), components.next()) {
            (Some(major), Some(minor), Some(patch)) => Ok(Self::new(major?, minor?, patch?)),
            _ => Err(VersionParseError::NotThreeParts {
                full_version: s.to_string(),
            }),
        }
    }
}
