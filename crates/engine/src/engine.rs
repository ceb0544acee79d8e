//! The cell-update pipeline.
//!
//! `SyncEngine` ties the pieces together: formula text comes in, the link
//! graph is brought up to date, and every stale cache entry is evicted.
//! Per update the pipeline is linear (scan, resolve, graph update,
//! invalidate) and a failure at any stage drops only the offending token,
//! never the rest of the formula or batch.
//!
//! The engine owns the link graph. The calc cache stays with the
//! evaluator and is passed in by mutable reference; the engine only
//! removes entries from it. All operations are synchronous and
//! single-threaded: callers needing concurrency serialize access
//! externally.

use rustc_hash::FxHashSet;

use crate::cell_key::CellKey;
use crate::formula::refs::extract_links;
use crate::invalidate::{clear_transitive, CalcCache};
use crate::link_graph::LinkGraph;

/// Dependency-tracking engine for one sheet of cells.
#[derive(Default, Debug, Clone)]
pub struct SyncEngine {
    graph: LinkGraph,
}

impl SyncEngine {
    /// Create an engine with an empty link graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the link graph.
    pub fn graph(&self) -> &LinkGraph {
        &self.graph
    }

    // =========================================================================
    // Cell updates
    // =========================================================================

    /// A cell's content changed: re-derive its links and evict stale cache
    /// entries.
    ///
    /// Content starting with `=` (after leading whitespace) is treated as a
    /// formula and scanned for references; anything else clears the cell's
    /// outgoing links. Either way the cell and all its transitive
    /// dependents are evicted from `cache`.
    ///
    /// `cleared` is the eviction record; pass one set across a batch of
    /// updates so cells already handled are not reprocessed (see
    /// [`update_batch`](Self::update_batch)).
    pub fn update<V>(
        &mut self,
        cell: CellKey,
        content: &str,
        cache: &mut CalcCache<V>,
        cleared: Option<&mut FxHashSet<CellKey>>,
    ) {
        self.graph.replace_links(cell, links_of(content));
        clear_transitive(&self.graph, cache, cell, cleared);
    }

    /// Apply a batch of content updates sharing one cleared set.
    ///
    /// A cell invalidated by an earlier update in the batch is not
    /// reprocessed by a later one. On bulk edits over deeply
    /// interconnected sheets this is the difference between linear and
    /// quadratic work.
    pub fn update_batch<'a, V>(
        &mut self,
        contents: impl IntoIterator<Item = (CellKey, &'a str)>,
        cache: &mut CalcCache<V>,
    ) {
        let mut cleared = FxHashSet::default();
        for (cell, content) in contents {
            self.update(cell, content, cache, Some(&mut cleared));
        }
    }

    /// Re-derive the whole graph from scratch, e.g. after a bulk load.
    ///
    /// Performs no cache invalidation: rebuild runs before the cache is
    /// populated, or the caller clears it wholesale.
    pub fn rebuild<'a>(&mut self, contents: impl IntoIterator<Item = (CellKey, &'a str)>) {
        self.graph = LinkGraph::new();
        for (cell, content) in contents {
            let links = links_of(content);
            if !links.is_empty() {
                self.graph.replace_links(cell, links);
            }
        }
    }

    // =========================================================================
    // Cache invalidation
    // =========================================================================

    /// Evict a cell and its transitive dependents from the cache without
    /// touching the graph (forced invalidation, e.g. a manual cache-clear
    /// command).
    pub fn invalidate<V>(
        &self,
        cell: CellKey,
        cache: &mut CalcCache<V>,
        cleared: Option<&mut FxHashSet<CellKey>>,
    ) {
        clear_transitive(&self.graph, cache, cell, cleared);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Cells this cell's formula references.
    pub fn forward_links_of(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.graph.forward_links(cell)
    }

    /// Cells whose formulas reference this cell.
    pub fn reverse_links_of(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.graph.reverse_links(cell)
    }
}

/// Links referenced by cell content: the extracted set for formulas, empty
/// for everything else.
fn links_of(content: &str) -> FxHashSet<CellKey> {
    match content.trim_start().strip_prefix('=') {
        Some(body) => extract_links(body),
        None => FxHashSet::default(),
    }
}
