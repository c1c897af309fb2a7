// SPDX-License-Identifier: MPL-2.0

//! Publicly exported type aliases.

/// Map implementation used by the library.
pub type Map<K, V> = rustc_hash::FxHashMap<K, V>;

/// Set implementation used by the library.
pub type Set<V> = rustc_hash::FxHashSet<V>;

/// Dependencies of one package version: which packages it needs,
/// and within which version sets.
pub type Dependencies<P, VS> = Vec<(P, VS)>;
