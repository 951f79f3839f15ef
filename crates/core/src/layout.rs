//! Level-order layout of a complete binary tree stored as a flat array.
//!
//! Pure index arithmetic: level `L` owns indices `[2^L - 1, min(2^(L+1) - 1, n))`
//! and is drawn as a row of `2^L` equal columns, so a node's column is its
//! offset from the first index of its level.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::model::NodeView;

/// Parent index, `None` for the root.
pub fn parent(i: usize) -> Option<usize> {
    (i > 0).then(|| (i - 1) / 2)
}

/// `which == 0` is the left child, anything else the right child.
pub fn child(i: usize, which: usize) -> usize {
    if which == 0 { 2 * i + 1 } else { 2 * i + 2 }
}

/// Level (depth) of a flat index; the root is level 0.
pub fn level_of(i: usize) -> u32 {
    (i + 1).ilog2()
}

/// `floor(log2 n) + 1` for `n > 0`, else 0.
pub fn level_count(n: usize) -> u32 {
    usize::BITS - n.leading_zeros()
}

/// Flat indices owned by `level` in a heap of `n` nodes. Empty past the
/// last level.
pub fn level_range(level: u32, n: usize) -> Range<usize> {
    let Some(first) = 1usize.checked_shl(level).map(|p| p - 1) else {
        return n..n;
    };
    let end = first.saturating_mul(2).saturating_add(1).min(n);
    first.min(n)..end
}

/// Number of equal-width slots drawn for `level`.
pub fn column_count(level: u32) -> usize {
    1usize.checked_shl(level).unwrap_or(usize::MAX)
}

/// A node placed on the level grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedNode {
    pub node: NodeView,
    pub level: u32,
    /// Slot within the level, `0..column_count`.
    pub column: usize,
    pub column_count: usize,
}

/// One row of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeLevel {
    pub level: u32,
    pub column_count: usize,
    pub nodes: Vec<PlacedNode>,
}

/// Group a heap array into levels.
pub fn layout(heap: &[NodeView]) -> Vec<TreeLevel> {
    let n = heap.len();
    (0..level_count(n))
        .map(|level| {
            let column_count = column_count(level);
            TreeLevel {
                level,
                column_count,
                nodes: heap[level_range(level, n)]
                    .iter()
                    .enumerate()
                    .map(|(column, node)| PlacedNode {
                        node: node.clone(),
                        level,
                        column,
                        column_count,
                    })
                    .collect(),
            }
        })
        .collect()
}
