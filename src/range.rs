// SPDX-License-Identifier: MPL-2.0

//! An interval-union implementation of the [VersionSet] algebra,
//! usable with any totally ordered version type.
//!
//! A [Range] is built from simple blocks ([singleton](Range::singleton),
//! [higher_than](Range::higher_than), [between](Range::between), ...) and
//! closed under complement, intersection and union. Internally it is a
//! sorted list of disjoint, non-mergeable intervals, so that two ranges
//! denoting the same set always compare equal.

use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Bound::{self, Excluded, Included, Unbounded};

use crate::version_set::VersionSet;

/// A Range represents multiple intervals of a continuous range of monotone
/// increasing values, stored as an ordered list of disjoint segments.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Range<V> {
    segments: Vec<Interval<V>>,
}

type Interval<V> = (Bound<V>, Bound<V>);

impl<V> Range<V> {
    /// Empty set of versions.
    pub fn empty() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Set of all possible versions.
    pub fn full() -> Self {
        Self {
            segments: vec![(Unbounded, Unbounded)],
        }
    }

    /// The versions at or above `v`.
    pub fn higher_than(v: impl Into<V>) -> Self {
        Self {
            segments: vec![(Included(v.into()), Unbounded)],
        }
    }

    /// The versions strictly above `v`.
    pub fn strictly_higher_than(v: impl Into<V>) -> Self {
        Self {
            segments: vec![(Excluded(v.into()), Unbounded)],
        }
    }

    /// The versions strictly below `v`.
    pub fn strictly_lower_than(v: impl Into<V>) -> Self {
        Self {
            segments: vec![(Unbounded, Excluded(v.into()))],
        }
    }

    /// The versions at or below `v`.
    pub fn lower_than(v: impl Into<V>) -> Self {
        Self {
            segments: vec![(Unbounded, Included(v.into()))],
        }
    }
}

impl<V: Clone> Range<V> {
    /// The set containing only the version `v`.
    pub fn singleton(v: impl Into<V>) -> Self {
        let v = v.into();
        Self {
            segments: vec![(Included(v.clone()), Included(v))],
        }
    }
}

impl<V: Ord> Range<V> {
    /// The versions at or above `v1` but strictly below `v2`
    /// (empty when `v2 <= v1`).
    pub fn between(v1: impl Into<V>, v2: impl Into<V>) -> Self {
        let (v1, v2) = (v1.into(), v2.into());
        if v2 <= v1 {
            return Self::empty();
        }
        Self {
            segments: vec![(Included(v1), Excluded(v2))],
        }
    }

    /// Returns true if this Range contains the specified version.
    pub fn contains(&self, v: &V) -> bool {
        self.segments.iter().any(|(start, end)| {
            let above = match start {
                Unbounded => true,
                Included(s) => v >= s,
                Excluded(s) => v > s,
            };
            let below = match end {
                Unbounded => true,
                Included(e) => v <= e,
                Excluded(e) => v < e,
            };
            above && below
        })
    }
}

impl<V: Ord + Clone> Range<V> {
    /// Returns the complement of this Range.
    pub fn complement(&self) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        let mut start = Unbounded;
        for (lower, upper) in &self.segments {
            match lower {
                // A segment reaching -∞ leaves nothing below it.
                Unbounded => {}
                Included(v) => segments.push((start, Excluded(v.clone()))),
                Excluded(v) => segments.push((start, Included(v.clone()))),
            }
            start = match upper {
                Unbounded => return Self { segments },
                Included(v) => Excluded(v.clone()),
                Excluded(v) => Included(v.clone()),
            };
        }
        segments.push((start, Unbounded));
        Self { segments }
    }

    /// Computes the intersection of two sets of versions.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut segments = Vec::new();
        for left in &self.segments {
            for right in &other.segments {
                let start = match cmp_lower(&left.0, &right.0) {
                    Ordering::Less => right.0.clone(),
                    _ => left.0.clone(),
                };
                let end = match cmp_upper(&left.1, &right.1) {
                    Ordering::Greater => right.1.clone(),
                    _ => left.1.clone(),
                };
                if nonempty_interval(&start, &end) {
                    segments.push((start, end));
                }
            }
        }
        Self { segments }
    }
}

/// Order two lower bounds: the smaller one starts earlier,
/// and at equal versions an included bound starts earlier.
fn cmp_lower<V: Ord>(a: &Bound<V>, b: &Bound<V>) -> Ordering {
    match (a, b) {
        (Unbounded, Unbounded) => Ordering::Equal,
        (Unbounded, _) => Ordering::Less,
        (_, Unbounded) => Ordering::Greater,
        (Included(x), Included(y)) | (Excluded(x), Excluded(y)) => x.cmp(y),
        (Included(x), Excluded(y)) => x.cmp(y).then(Ordering::Less),
        (Excluded(x), Included(y)) => x.cmp(y).then(Ordering::Greater),
    }
}

/// Order two upper bounds: the smaller one ends earlier,
/// and at equal versions an excluded bound ends earlier.
fn cmp_upper<V: Ord>(a: &Bound<V>, b: &Bound<V>) -> Ordering {
    match (a, b) {
        (Unbounded, Unbounded) => Ordering::Equal,
        (Unbounded, _) => Ordering::Greater,
        (_, Unbounded) => Ordering::Less,
        (Included(x), Included(y)) | (Excluded(x), Excluded(y)) => x.cmp(y),
        (Included(x), Excluded(y)) => x.cmp(y).then(Ordering::Greater),
        (Excluded(x), Included(y)) => x.cmp(y).then(Ordering::Less),
    }
}

/// An interval is nonempty when its start lies below its end,
/// or when both bounds include the same version.
fn nonempty_interval<V: Ord>(start: &Bound<V>, end: &Bound<V>) -> bool {
    match (start, end) {
        (Unbounded, _) | (_, Unbounded) => true,
        (Included(s), Included(e)) => s <= e,
        (Included(s), Excluded(e)) | (Excluded(s), Included(e)) | (Excluded(s), Excluded(e)) => {
            s < e
        }
    }
}

impl<V: Debug + Display + Clone + Eq + Ord> VersionSet for Range<V> {
    type V = V;

    fn empty() -> Self {
        Range::empty()
    }

    fn singleton(v: Self::V) -> Self {
        Range::singleton(v)
    }

    fn complement(&self) -> Self {
        Range::complement(self)
    }

    fn intersection(&self, other: &Self) -> Self {
        Range::intersection(self, other)
    }

    fn allows(&self, v: &Self::V) -> bool {
        Range::contains(self, v)
    }

    fn full() -> Self {
        Range::full()
    }
}

// REPORT ######################################################################

impl<V: Display + Eq> Display for Range<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "∅");
        }
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            match segment {
                (Unbounded, Unbounded) => write!(f, "*")?,
                (Included(a), Included(b)) if a == b => write!(f, "{a}")?,
                (start, end) => {
                    let mut separator = "";
                    match start {
                        Unbounded => {}
                        Included(v) => {
                            write!(f, ">={v}")?;
                            separator = ", ";
                        }
                        Excluded(v) => {
                            write!(f, ">{v}")?;
                            separator = ", ";
                        }
                    }
                    match end {
                        Unbounded => {}
                        Included(v) => write!(f, "{separator}<={v}")?,
                        Excluded(v) => write!(f, "{separator}<{v}")?,
                    }
                }
            }
        }
        Ok(())
    }
}

// TESTS #######################################################################
