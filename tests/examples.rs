// SPDX-License-Identifier: MPL-2.0

use std::io::Write;

use log::LevelFilter;

use accord::{resolve, Map, OfflineSource, Range, SemanticVersion, SolveError};

type SemVS = Range<SemanticVersion>;
type NumVS = Range<u32>;

fn init_log() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Trace)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .is_test(true)
        .try_init();
}

#[test]
fn root_without_dependencies() {
    init_log();
    let source = OfflineSource::<&str, NumVS>::new(1u32);

    let resolution = resolve(&source).unwrap();

    assert!(resolution.decisions.is_empty());
    assert_eq!(resolution.attempted_solutions, 1);
}

#[test]
fn single_version_is_selected() {
    init_log();
    let mut source = OfflineSource::<&str, NumVS>::new(0u32);
    source.add_root_dependencies([("a", Range::full())]);
    source.add_dependencies("a", 7u32, []);

    let resolution = resolve(&source).unwrap();

    let mut expected = Map::default();
    expected.insert("a", 7);
    assert_eq!(resolution.decisions, expected);
}

#[test]
fn prefer_the_highest_matching_version() {
    init_log();
    let mut source = OfflineSource::<&str, SemVS>::new((1, 0, 0));
    #[rustfmt::skip]
    // the project depends on a ^1.0.0
    source.add_root_dependencies(
        [("a", Range::between((1, 0, 0), (2, 0, 0)))],
    );
    source.add_dependencies("a", (1, 0, 0), []);
    source.add_dependencies("a", (1, 1, 0), []);

    let resolution = resolve(&source).unwrap();

    let mut expected = Map::default();
    expected.insert("a", SemanticVersion::new(1, 1, 0));
    assert_eq!(resolution.decisions, expected);
    assert_eq!(resolution.attempted_solutions, 1);
}

#[test]
fn shared_dependency_intersection() {
    init_log();
    let mut source = OfflineSource::<&str, SemVS>::new((1, 0, 0));
    source.add_root_dependencies([
        ("a", Range::singleton((1, 0, 0))),
        ("b", Range::singleton((1, 0, 0))),
    ]);
    #[rustfmt::skip]
    // a 1.0.0 depends on shared >=2.0.0 <4.0.0
    source.add_dependencies(
        "a", (1, 0, 0),
        [("shared", Range::between((2, 0, 0), (4, 0, 0)))],
    );
    #[rustfmt::skip]
    // b 1.0.0 depends on shared >=3.0.0 <5.0.0
    source.add_dependencies(
        "b", (1, 0, 0),
        [("shared", Range::between((3, 0, 0), (5, 0, 0)))],
    );
    source.add_dependencies("shared", (2, 0, 0), []);
    source.add_dependencies("shared", (3, 0, 0), []);
    source.add_dependencies("shared", (3, 6, 9), []);
    source.add_dependencies("shared", (4, 0, 0), []);
    source.add_dependencies("shared", (5, 0, 0), []);

    let resolution = resolve(&source).unwrap();

    let mut expected = Map::default();
    expected.insert("a", SemanticVersion::new(1, 0, 0));
    expected.insert("b", SemanticVersion::new(1, 0, 0));
    expected.insert("shared", SemanticVersion::new(3, 6, 9));
    assert_eq!(resolution.decisions, expected);
}

#[test]
fn backtrack_after_partial_satisfier() {
    init_log();
    let mut source = OfflineSource::<&str, SemVS>::new((1, 0, 0));
    #[rustfmt::skip]
    // the project depends on foo ^1.0.0 and target ^2.0.0
    source.add_root_dependencies([
        ("foo", Range::between((1, 0, 0), (2, 0, 0))),
        ("target", Range::between((2, 0, 0), (3, 0, 0))),
    ]);
    #[rustfmt::skip]
    // foo 1.1.0 depends on target ^1.0.0
    source.add_dependencies(
        "foo", (1, 1, 0),
        [("target", Range::between((1, 0, 0), (2, 0, 0)))],
    );
    source.add_dependencies("foo", (1, 0, 0), []);
    source.add_dependencies("target", (2, 0, 0), []);
    source.add_dependencies("target", (1, 0, 0), []);

    let resolution = resolve(&source).unwrap();

    let mut expected = Map::default();
    expected.insert("foo", SemanticVersion::new(1, 0, 0));
    expected.insert("target", SemanticVersion::new(2, 0, 0));
    assert_eq!(resolution.decisions, expected);
    // foo 1.1.0 was tried and renounced.
    assert!(resolution.attempted_solutions >= 2);
}

#[test]
fn unknown_package_can_be_tolerated() {
    init_log();
    let mut source = OfflineSource::<&str, SemVS>::new((1, 0, 0));
    source.add_root_dependencies([("a", Range::singleton((1, 0, 0)))]);
    // a 1.0.0 depends on a package the source has never heard of.
    source.add_dependencies("a", (1, 0, 0), [("missing", Range::full())]);
    source.tolerate_missing("missing");

    let resolution = resolve(&source).unwrap();

    let mut expected = Map::default();
    expected.insert("a", SemanticVersion::new(1, 0, 0));
    assert_eq!(resolution.decisions, expected);
}

#[test]
fn unknown_package_fails_by_default() {
    init_log();
    let mut source = OfflineSource::<&str, SemVS>::new((1, 0, 0));
    source.add_root_dependencies([("a", Range::singleton((1, 0, 0)))]);
    source.add_dependencies("a", (1, 0, 0), [("missing", Range::full())]);

    assert!(matches!(
        resolve(&source),
        Err(SolveError::NoSolution(_))
    ));
}

// The following scenarios come from the documented walkthroughs of the
// original algorithm:
// https://github.com/dart-lang/pub/blob/master/doc/solver.md

#[test]
/// https://github.com/dart-lang/pub/blob/master/doc/solver.md#no-conflicts
fn no_conflict() {
    init_log();
    let mut source = OfflineSource::<&str, SemVS>::new((1, 0, 0));
    #[rustfmt::skip]
    source.add_root_dependencies(
        [("foo", Range::between((1, 0, 0), (2, 0, 0)))],
    );
    #[rustfmt::skip]
    source.add_dependencies(
        "foo", (1, 0, 0),
        [("bar", Range::between((1, 0, 0), (2, 0, 0)))],
    );
    source.add_dependencies("bar", (1, 0, 0), []);
    source.add_dependencies("bar", (2, 0, 0), []);

    // Run the algorithm.
    let resolution = resolve(&source).unwrap();

    // Solution.
    let mut expected = Map::default();
    expected.insert("foo", SemanticVersion::new(1, 0, 0));
    expected.insert("bar", SemanticVersion::new(1, 0, 0));

    // Comparing the true solution with the one computed by the algorithm.
    assert_eq!(resolution.decisions, expected);
}

#[test]
/// https://github.com/dart-lang/pub/blob/master/doc/solver.md#avoiding-conflict-during-decision-making
fn avoiding_conflict_during_decision_making() {
    init_log();
    let mut source = OfflineSource::<&str, SemVS>::new((1, 0, 0));
    #[rustfmt::skip]
    source.add_root_dependencies([
        ("foo", Range::between((1, 0, 0), (2, 0, 0))),
        ("bar", Range::between((1, 0, 0), (2, 0, 0))),
    ]);
    #[rustfmt::skip]
    source.add_dependencies(
        "foo", (1, 1, 0),
        [("bar", Range::between((2, 0, 0), (3, 0, 0)))],
    );
    source.add_dependencies("foo", (1, 0, 0), []);
    source.add_dependencies("bar", (1, 0, 0), []);
    source.add_dependencies("bar", (1, 1, 0), []);
    source.add_dependencies("bar", (2, 0, 0), []);

    let resolution = resolve(&source).unwrap();

    let mut expected = Map::default();
    expected.insert("foo", SemanticVersion::new(1, 0, 0));
    expected.insert("bar", SemanticVersion::new(1, 1, 0));

    assert_eq!(resolution.decisions, expected);
}

#[test]
/// https://github.com/dart-lang/pub/blob/master/doc/solver.md#performing-conflict-resolution
fn conflict_resolution() {
    init_log();
    let mut source = OfflineSource::<&str, SemVS>::new((1, 0, 0));
    #[rustfmt::skip]
    source.add_root_dependencies(
        [("foo", Range::higher_than((1, 0, 0)))],
    );
    #[rustfmt::skip]
    source.add_dependencies(
        "foo", (2, 0, 0),
        [("bar", Range::between((1, 0, 0), (2, 0, 0)))],
    );
    source.add_dependencies("foo", (1, 0, 0), []);
    #[rustfmt::skip]
    source.add_dependencies(
        "bar", (1, 0, 0),
        [("foo", Range::between((1, 0, 0), (2, 0, 0)))],
    );

    let resolution = resolve(&source).unwrap();

    let mut expected = Map::default();
    expected.insert("foo", SemanticVersion::new(1, 0, 0));

    assert_eq!(resolution.decisions, expected);
}

#[test]
/// https://github.com/dart-lang/pub/blob/master/doc/solver.md#conflict-resolution-with-a-partial-satisfier
fn conflict_with_partial_satisfier() {
    init_log();
    let mut source = OfflineSource::<&str, SemVS>::new((1, 0, 0));
    #[rustfmt::skip]
    // the project depends on foo ^1.0.0 and target ^2.0.0
    source.add_root_dependencies([
        ("foo", Range::between((1, 0, 0), (2, 0, 0))),
        ("target", Range::between((2, 0, 0), (3, 0, 0))),
    ]);
    #[rustfmt::skip]
    // foo 1.1.0 depends on left ^1.0.0 and right ^1.0.0
    source.add_dependencies(
        "foo", (1, 1, 0),
        [
            ("left", Range::between((1, 0, 0), (2, 0, 0))),
            ("right", Range::between((1, 0, 0), (2, 0, 0))),
        ],
    );
    source.add_dependencies("foo", (1, 0, 0), []);
    #[rustfmt::skip]
    // left 1.0.0 depends on shared >=1.0.0
    source.add_dependencies(
        "left", (1, 0, 0),
        [("shared", Range::higher_than((1, 0, 0)))],
    );
    #[rustfmt::skip]
    // right 1.0.0 depends on shared <2.0.0
    source.add_dependencies(
        "right", (1, 0, 0),
        [("shared", Range::strictly_lower_than((2, 0, 0)))],
    );
    source.add_dependencies("shared", (2, 0, 0), []);
    #[rustfmt::skip]
    // shared 1.0.0 depends on target ^1.0.0
    source.add_dependencies(
        "shared", (1, 0, 0),
        [("target", Range::between((1, 0, 0), (2, 0, 0)))],
    );
    source.add_dependencies("target", (2, 0, 0), []);
    source.add_dependencies("target", (1, 0, 0), []);

    let resolution = resolve(&source).unwrap();

    let mut expected = Map::default();
    expected.insert("foo", SemanticVersion::new(1, 0, 0));
    expected.insert("target", SemanticVersion::new(2, 0, 0));

    assert_eq!(resolution.decisions, expected);
}

#[test]
/// a 0 depends on b and c
/// b 0 depends on d 0
/// b 1 depends on d 1 (not existing)
/// c 0 has no dependency
/// c 1 depends on d 2 (not existing)
/// d 0 has no dependency
///
/// Solution: a 0, b 0, c 0, d 0
fn double_choices() {
    init_log();
    let mut source = OfflineSource::<&str, NumVS>::new(0u32);
    source.add_root_dependencies([("a", Range::full())]);
    source.add_dependencies("a", 0u32, [("b", Range::full()), ("c", Range::full())]);
    source.add_dependencies("b", 0u32, [("d", Range::singleton(0u32))]);
    source.add_dependencies("b", 1u32, [("d", Range::singleton(1u32))]);
    source.add_dependencies("c", 0u32, []);
    source.add_dependencies("c", 1u32, [("d", Range::singleton(2u32))]);
    source.add_dependencies("d", 0u32, []);

    let mut expected = Map::default();
    expected.insert("a", 0);
    expected.insert("b", 0);
    expected.insert("c", 0);
    expected.insert("d", 0);

    let resolution = resolve(&source).unwrap();
    assert_eq!(resolution.decisions, expected);
}

#[test]
fn same_result_on_repeated_runs() {
    init_log();
    let mut source = OfflineSource::<&str, NumVS>::new(0u32);
    source.add_root_dependencies([("b", Range::full()), ("c", Range::full())]);
    source.add_dependencies("c", 0u32, []);
    source.add_dependencies("c", 2u32, []);
    source.add_dependencies("b", 0u32, []);
    source.add_dependencies("b", 1u32, [("c", Range::between(0u32, 1u32))]);

    let first = resolve(&source).unwrap();
    for _ in 0..10 {
        let again = resolve(&source).unwrap();
        assert_eq!(first.decisions, again.decisions);
        assert_eq!(first.attempted_solutions, again.attempted_solutions);
    }
}
