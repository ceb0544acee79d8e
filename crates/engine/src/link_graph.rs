//! Bidirectional link graph for formula cells.
//!
//! Tracks forward links (cells a formula references) and reverse links
//! (cells whose formulas reference a given cell) for O(1) lookups in either
//! direction.
//!
//! # Edge Direction
//!
//! ```text
//! A ∈ fwd[B]  means  "B's formula references A"
//! B ∈ rev[A]  means  the same edge, seen from A
//! ```
//!
//! Reverse links are what make "whose cache goes stale if A changes?"
//! cheap: follow `rev[A]` instead of rescanning every formula.
//!
//! # Invariants
//!
//! 1. **Transpose consistency:** `a ∈ fwd[b]` if and only if `b ∈ rev[a]`.
//! 2. **No dangling entries:** empty sets are removed, not stored.
//! 3. **No duplicate edges:** set semantics enforced by `FxHashSet`.
//! 4. **Atomic updates:** `replace_links` is the only mutator that touches
//!    both maps.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cell_key::CellKey;

/// Persistent link graph for formula cells.
#[derive(Default, Debug, Clone)]
pub struct LinkGraph {
    /// Forward links: for each formula cell B, the cells A it references.
    /// B -> {A1, A2, ...}
    fwd: FxHashMap<CellKey, FxHashSet<CellKey>>,

    /// Reverse links: for each referenced cell A, the formula cells B that
    /// reference it. A -> {B1, B2, ...}
    rev: FxHashMap<CellKey, FxHashSet<CellKey>>,
}

impl LinkGraph {
    /// Create an empty link graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cells this cell's formula references (forward links).
    pub fn forward_links(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.fwd
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// Returns the cells whose formulas reference this cell (reverse links).
    pub fn reverse_links(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.rev
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// Returns true if this cell has outgoing links tracked in the graph.
    pub fn is_formula_cell(&self, cell: CellKey) -> bool {
        self.fwd.contains_key(&cell)
    }

    /// Returns the number of cells with outgoing links.
    pub fn formula_cell_count(&self) -> usize {
        self.fwd.len()
    }

    /// Returns the number of cells referenced by at least one formula.
    pub fn referenced_cell_count(&self) -> usize {
        self.rev.len()
    }

    /// Returns all cells with outgoing links.
    pub fn formula_cells(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.fwd.keys().copied()
    }

    /// Replace one cell's forward links, keeping reverse links consistent.
    ///
    /// Works as a set-diff so the cost is proportional to the change, never
    /// the graph:
    /// 1. `dropped = old − new`; remove `cell` from each dropped target's
    ///    reverse set (deleting entries that become empty)
    /// 2. Add `cell` to every new target's reverse set
    /// 3. Store the new forward set, or remove the entry when empty
    ///
    /// Returns the dropped links. Pass an empty set to clear the cell.
    pub fn replace_links(
        &mut self,
        cell: CellKey,
        new_fwd: FxHashSet<CellKey>,
    ) -> FxHashSet<CellKey> {
        let dropped: FxHashSet<CellKey> = match self.fwd.get(&cell) {
            Some(old) => old.difference(&new_fwd).copied().collect(),
            None => FxHashSet::default(),
        };

        for target in &dropped {
            match self.rev.get_mut(target) {
                Some(deps) => {
                    deps.remove(&cell);
                    if deps.is_empty() {
                        self.rev.remove(target);
                    }
                }
                None => {
                    // Transpose invariant says this cannot happen; warn
                    // instead of panicking, matching the forgiving policy
                    // of the rest of the engine.
                    log::warn!("no reverse entry for {target} while unlinking {cell}");
                }
            }
        }

        for target in &new_fwd {
            self.rev.entry(*target).or_default().insert(cell);
        }

        if new_fwd.is_empty() {
            self.fwd.remove(&cell);
        } else {
            self.fwd.insert(cell, new_fwd);
        }

        dropped
    }

    /// Clear all links for a cell (formula removed or cell deleted).
    ///
    /// Convenience wrapper around `replace_links` with an empty set.
    pub fn clear_cell(&mut self, cell: CellKey) -> FxHashSet<CellKey> {
        self.replace_links(cell, FxHashSet::default())
    }

    /// Apply a coordinate mapping to every cell in the graph.
    ///
    /// Used for row/column insert/delete. The mapping returns `Some(new)`
    /// if the cell moves (or stays), `None` if it is deleted. Formula cells
    /// whose links all vanish are dropped too.
    pub fn remap<F>(&mut self, map: F)
    where
        F: Fn(CellKey) -> Option<CellKey>,
    {
        let mut new_fwd: FxHashMap<CellKey, FxHashSet<CellKey>> = FxHashMap::default();
        let mut new_rev: FxHashMap<CellKey, FxHashSet<CellKey>> = FxHashMap::default();

        for (formula_cell, targets) in &self.fwd {
            let Some(moved_cell) = map(*formula_cell) else {
                continue; // formula cell deleted
            };

            let moved_targets: FxHashSet<CellKey> =
                targets.iter().filter_map(|t| map(*t)).collect();

            if moved_targets.is_empty() {
                continue; // every target deleted
            }

            for target in &moved_targets {
                new_rev.entry(*target).or_default().insert(moved_cell);
            }
            new_fwd.insert(moved_cell, moved_targets);
        }

        self.fwd = new_fwd;
        self.rev = new_rev;
    }

    /// Check all invariants. Panics if any are violated.
    ///
    /// Only available in test builds.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        // Invariant 1: transpose consistency (fwd → rev)
        for (cell, targets) in &self.fwd {
            for target in targets {
                assert!(
                    self.rev.get(target).is_some_and(|s| s.contains(cell)),
                    "missing reverse edge: {target} should list {cell}"
                );
            }
        }

        // Invariant 1: transpose consistency (rev → fwd)
        for (cell, deps) in &self.rev {
            for dep in deps {
                assert!(
                    self.fwd.get(dep).is_some_and(|s| s.contains(cell)),
                    "missing forward edge: {dep} should list {cell}"
                );
            }
        }

        // Invariant 2: no empty sets stored
        for (cell, targets) in &self.fwd {
            assert!(!targets.is_empty(), "empty forward set stored for {cell}");
        }
        for (cell, deps) in &self.rev {
            assert!(!deps.is_empty(), "empty reverse set stored for {cell}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(row: u32, col: u32) -> CellKey {
        CellKey::new(row, col)
    }

    fn set(cells: &[CellKey]) -> FxHashSet<CellKey> {
        cells.iter().copied().collect()
    }

    #[test]
    fn test_empty_graph() {
        let graph = LinkGraph::new();

        assert_eq!(graph.formula_cell_count(), 0);
        assert_eq!(graph.referenced_cell_count(), 0);
        assert!(!graph.is_formula_cell(cell(1, 1)));
        assert_eq!(graph.forward_links(cell(1, 1)).count(), 0);
        assert_eq!(graph.reverse_links(cell(1, 1)).count(), 0);

        graph.assert_consistent();
    }

    #[test]
    fn test_single_link() {
        // B1 = A1
        let mut graph = LinkGraph::new();
        let a1 = cell(1, 1);
        let b1 = cell(1, 2);

        let dropped = graph.replace_links(b1, set(&[a1]));
        graph.assert_consistent();
        assert!(dropped.is_empty());

        assert!(graph.is_formula_cell(b1));
        assert!(!graph.is_formula_cell(a1));

        assert_eq!(graph.forward_links(b1).collect::<Vec<_>>(), vec![a1]);
        assert_eq!(graph.reverse_links(a1).collect::<Vec<_>>(), vec![b1]);

        assert_eq!(graph.formula_cell_count(), 1);
        assert_eq!(graph.referenced_cell_count(), 1);
    }

    #[test]
    fn test_multiple_targets() {
        // C1 = A1 + B1
        let mut graph = LinkGraph::new();
        let a1 = cell(1, 1);
        let b1 = cell(1, 2);
        let c1 = cell(1, 3);

        graph.replace_links(c1, set(&[a1, b1]));
        graph.assert_consistent();

        let mut fwd: Vec<_> = graph.forward_links(c1).collect();
        fwd.sort();
        assert_eq!(fwd, vec![a1, b1]);

        assert_eq!(graph.reverse_links(a1).collect::<Vec<_>>(), vec![c1]);
        assert_eq!(graph.reverse_links(b1).collect::<Vec<_>>(), vec![c1]);
    }

    #[test]
    fn test_multiple_dependents() {
        // B1 = A1, C1 = A1
        let mut graph = LinkGraph::new();
        let a1 = cell(1, 1);
        let b1 = cell(1, 2);
        let c1 = cell(1, 3);

        graph.replace_links(b1, set(&[a1]));
        graph.replace_links(c1, set(&[a1]));
        graph.assert_consistent();

        let mut deps: Vec<_> = graph.reverse_links(a1).collect();
        deps.sort();
        assert_eq!(deps, vec![b1, c1]);

        assert_eq!(graph.formula_cell_count(), 2);
        assert_eq!(graph.referenced_cell_count(), 1);
    }

    #[test]
    fn test_rewiring_returns_dropped() {
        // B1 = A1, then change to B1 = A2
        let mut graph = LinkGraph::new();
        let a1 = cell(1, 1);
        let a2 = cell(2, 1);
        let b1 = cell(1, 2);

        graph.replace_links(b1, set(&[a1]));
        graph.assert_consistent();

        let dropped = graph.replace_links(b1, set(&[a2]));
        graph.assert_consistent();

        assert_eq!(dropped, set(&[a1]));
        assert_eq!(graph.forward_links(b1).collect::<Vec<_>>(), vec![a2]);
        assert_eq!(graph.reverse_links(a2).collect::<Vec<_>>(), vec![b1]);

        // A1 has no dependents left and no reverse entry at all (sparse)
        assert_eq!(graph.reverse_links(a1).count(), 0);
        assert_eq!(graph.referenced_cell_count(), 1);
    }

    #[test]
    fn test_overlapping_rewire_drops_only_difference() {
        // D1 = A1+B1, then D1 = B1+C1: only A1 is dropped
        let mut graph = LinkGraph::new();
        let a1 = cell(1, 1);
        let b1 = cell(1, 2);
        let c1 = cell(1, 3);
        let d1 = cell(1, 4);

        graph.replace_links(d1, set(&[a1, b1]));
        let dropped = graph.replace_links(d1, set(&[b1, c1]));
        graph.assert_consistent();

        assert_eq!(dropped, set(&[a1]));
        assert_eq!(graph.reverse_links(b1).collect::<Vec<_>>(), vec![d1]);
        assert_eq!(graph.reverse_links(c1).collect::<Vec<_>>(), vec![d1]);
        assert_eq!(graph.reverse_links(a1).count(), 0);
    }

    #[test]
    fn test_unwiring() {
        // B1 = A1, then clear B1
        let mut graph = LinkGraph::new();
        let a1 = cell(1, 1);
        let b1 = cell(1, 2);

        graph.replace_links(b1, set(&[a1]));
        let dropped = graph.clear_cell(b1);
        graph.assert_consistent();

        assert_eq!(dropped, set(&[a1]));
        assert!(!graph.is_formula_cell(b1));
        assert_eq!(graph.reverse_links(a1).count(), 0);
        assert_eq!(graph.formula_cell_count(), 0);
        assert_eq!(graph.referenced_cell_count(), 0);
    }

    #[test]
    fn test_replace_with_same_set_drops_nothing() {
        let mut graph = LinkGraph::new();
        let a1 = cell(1, 1);
        let b1 = cell(1, 2);

        graph.replace_links(b1, set(&[a1]));
        let dropped = graph.replace_links(b1, set(&[a1]));
        graph.assert_consistent();

        assert!(dropped.is_empty());
        assert_eq!(graph.reverse_links(a1).collect::<Vec<_>>(), vec![b1]);
    }

    #[test]
    fn test_diamond() {
        //     A1
        //    /  \
        //   B1   C1
        //    \  /
        //     D1
        let mut graph = LinkGraph::new();
        let a1 = cell(1, 1);
        let b1 = cell(1, 2);
        let c1 = cell(1, 3);
        let d1 = cell(1, 4);

        graph.replace_links(b1, set(&[a1]));
        graph.replace_links(c1, set(&[a1]));
        graph.replace_links(d1, set(&[b1, c1]));
        graph.assert_consistent();

        let mut d1_fwd: Vec<_> = graph.forward_links(d1).collect();
        d1_fwd.sort();
        assert_eq!(d1_fwd, vec![b1, c1]);

        let mut a1_deps: Vec<_> = graph.reverse_links(a1).collect();
        a1_deps.sort();
        assert_eq!(a1_deps, vec![b1, c1]);

        assert_eq!(graph.formula_cell_count(), 3); // B1, C1, D1
        assert_eq!(graph.referenced_cell_count(), 3); // A1, B1, C1
    }

    #[test]
    fn test_self_reference_allowed() {
        // A1 = A1 + 1: the graph stores the cycle; invalidation copes
        let mut graph = LinkGraph::new();
        let a1 = cell(1, 1);

        graph.replace_links(a1, set(&[a1]));
        graph.assert_consistent();

        assert!(graph.is_formula_cell(a1));
        assert_eq!(graph.forward_links(a1).collect::<Vec<_>>(), vec![a1]);
        assert_eq!(graph.reverse_links(a1).collect::<Vec<_>>(), vec![a1]);
    }

    #[test]
    fn test_remap_shift_rows() {
        // B2 = A2, B5 = A5; insert a row above row 5
        let mut graph = LinkGraph::new();
        graph.replace_links(cell(2, 2), set(&[cell(2, 1)]));
        graph.replace_links(cell(5, 2), set(&[cell(5, 1)]));
        graph.assert_consistent();

        graph.remap(|c| {
            if c.row >= 5 {
                Some(CellKey::new(c.row + 1, c.col))
            } else {
                Some(c)
            }
        });
        graph.assert_consistent();

        // B2 = A2 unchanged
        assert_eq!(
            graph.forward_links(cell(2, 2)).collect::<Vec<_>>(),
            vec![cell(2, 1)]
        );

        // B5 = A5 is now B6 = A6
        assert!(!graph.is_formula_cell(cell(5, 2)));
        assert_eq!(
            graph.forward_links(cell(6, 2)).collect::<Vec<_>>(),
            vec![cell(6, 1)]
        );
    }

    #[test]
    fn test_remap_delete_row() {
        // B1 = A1, B2 = A2; delete row 1
        let mut graph = LinkGraph::new();
        graph.replace_links(cell(1, 2), set(&[cell(1, 1)]));
        graph.replace_links(cell(2, 2), set(&[cell(2, 1)]));
        graph.assert_consistent();

        graph.remap(|c| {
            if c.row == 1 {
                None
            } else {
                Some(CellKey::new(c.row - 1, c.col))
            }
        });
        graph.assert_consistent();

        // Row 1 entries are gone; row 2 shifted up into row 1
        assert_eq!(graph.formula_cell_count(), 1);
        assert_eq!(
            graph.forward_links(cell(1, 2)).collect::<Vec<_>>(),
            vec![cell(1, 1)]
        );
        assert!(!graph.is_formula_cell(cell(2, 2)));
    }

    #[test]
    fn test_remap_drops_formula_with_all_targets_deleted() {
        // B1 = A1; delete column 1 (A1 vanishes, so B1's entry goes too)
        let mut graph = LinkGraph::new();
        graph.replace_links(cell(1, 2), set(&[cell(1, 1)]));

        graph.remap(|c| {
            if c.col == 1 {
                None
            } else {
                Some(CellKey::new(c.row, c.col - 1))
            }
        });
        graph.assert_consistent();

        assert_eq!(graph.formula_cell_count(), 0);
        assert_eq!(graph.referenced_cell_count(), 0);
    }
}
