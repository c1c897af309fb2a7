// SPDX-License-Identifier: MPL-2.0

use criterion::{criterion_group, criterion_main, Criterion};

use accord::{resolve, OfflineSource, Range};

/// A linear chain of single-version packages: measures propagation and
/// bookkeeping overhead without any conflict.
fn chain(length: u32) -> OfflineSource<u32, Range<u32>> {
    let mut source = OfflineSource::new(0u32);
    source.add_root_dependencies([(0u32, Range::full())]);
    for package in 0..length {
        if package + 1 < length {
            source.add_dependencies(package, 0u32, [(package + 1, Range::full())]);
        } else {
            source.add_dependencies(package, 0u32, []);
        }
    }
    source
}

/// Each version of each package requires the same version of the next
/// package, and the last package is pinned to version 0 by the root.
/// The solver starts from the highest version and has to unwind a full
/// chain of decisions for every wrong guess.
fn conflict_ladder(length: u32, versions: u32) -> OfflineSource<u32, Range<u32>> {
    let mut source = OfflineSource::new(0u32);
    source.add_root_dependencies([
        (0u32, Range::full()),
        (length - 1, Range::singleton(0u32)),
    ]);
    for package in 0..length {
        for version in 0..versions {
            if package + 1 < length {
                source.add_dependencies(
                    package,
                    version,
                    [(package + 1, Range::singleton(version))],
                );
            } else {
                source.add_dependencies(package, version, []);
            }
        }
    }
    source
}

fn bench_resolve(c: &mut Criterion) {
    let long_chain = chain(100);
    c.bench_function("chain_100", |b| {
        b.iter(|| resolve(&long_chain).expect("chains are solvable"))
    });

    let ladder = conflict_ladder(20, 10);
    c.bench_function("conflict_ladder_20x10", |b| {
        b.iter(|| resolve(&ladder).expect("version 0 of every package works"))
    });
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
