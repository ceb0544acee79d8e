//! Cascading cache invalidation.
//!
//! When a cell changes, its cached computed value and the cached values of
//! every transitive dependent are stale. `clear_transitive` walks reverse
//! links and evicts them, exactly once per cell, terminating on arbitrary
//! cycles.
//!
//! The cache itself belongs to the evaluator; this module only removes
//! entries from it and never computes or writes values.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cell_key::CellKey;
use crate::link_graph::LinkGraph;

/// Cached computed values, keyed by cell. Owned by the evaluator; generic
/// over whatever value type it caches.
pub type CalcCache<V> = FxHashMap<CellKey, V>;

/// Evict `root` and every transitive dependent from the cache.
///
/// Walks `graph`'s reverse links with an explicit worklist, so depth is
/// bounded by memory rather than the call stack. Each cell is visited at
/// most once per cleared set.
///
/// `cleared` records which cells have been evicted. Pass the same set
/// across a batch of updates and cells already handled by an earlier
/// cascade are skipped. When `None`, an internal set still guards against
/// cycles for the duration of this call.
pub fn clear_transitive<V>(
    graph: &LinkGraph,
    cache: &mut CalcCache<V>,
    root: CellKey,
    cleared: Option<&mut FxHashSet<CellKey>>,
) {
    let mut local = FxHashSet::default();
    let cleared = cleared.unwrap_or(&mut local);

    // The root is always evicted, even when an earlier cascade in the same
    // batch got to it first (a repeat removal is a no-op).
    cache.remove(&root);
    cleared.insert(root);

    let mut work: Vec<CellKey> = graph
        .reverse_links(root)
        .filter(|d| !cleared.contains(d))
        .collect();

    while let Some(key) = work.pop() {
        if !cleared.insert(key) {
            continue; // pushed twice before being processed
        }
        cache.remove(&key);
        for dep in graph.reverse_links(key) {
            if !cleared.contains(&dep) {
                work.push(dep);
            }
        }
    }
}
