//! Tree construction for the similarity index.
//!
//! The builder recursively partitions a corpus snapshot into a balanced
//! space-partitioning (k-d-style) tree:
//!
//! 1. Pick the splitting axis by cycling through dimensions with depth
//!    (`axis = depth mod D`), giving every dimension a turn when none is
//!    known in advance to be more discriminative.
//! 2. Stable-sort the sublist by the coordinate on that axis; ties keep
//!    input order, so construction is deterministic.
//! 3. Take the record at `len / 2` as the node's pivot, recurse on the
//!    records before and after it.
//!
//! Sorting the full sublist at every level costs `O(n * D * log^2 n)` instead
//! of the `O(n * D * log n)` a selection-based median would give. The index
//! is built once at startup, so the simpler sort wins.
//!
//! Nodes land in an arena `Vec` with children addressed by [`NodeId`],
//! avoiding pointer-chasing box chains during search. The median split keeps
//! the tree balanced, so recursion depth stays within `log2 n + 1`.

use std::cmp::Ordering;

use super::types::{NodeId, VectorRecord};
use super::IndexNode;

/// Recursively build a subtree from `records`, pushing nodes into `nodes`
/// and returning the subtree root's arena id. Empty input is the terminal
/// case and yields `None`.
pub(crate) fn build_subtree(
    mut records: Vec<VectorRecord>,
    depth: usize,
    dimension: usize,
    nodes: &mut Vec<IndexNode>,
) -> Option<NodeId> {
    if records.is_empty() {
        return None;
    }

    let axis = depth % dimension;

    // Stable sort: records with equal axis coordinates keep their input
    // order, which makes the tree shape deterministic.
    records.sort_by(|a, b| {
        a.vector[axis]
            .partial_cmp(&b.vector[axis])
            .unwrap_or(Ordering::Equal)
    });

    let median = records.len() / 2;
    let right_records = records.split_off(median + 1);
    let pivot = records.pop()?;

    let left = build_subtree(records, depth + 1, dimension, nodes);
    let right = build_subtree(right_records, depth + 1, dimension, nodes);

    let id = nodes.len() as NodeId;
    nodes.push(IndexNode {
        record: pivot,
        axis,
        left,
        right,
    });
    Some(id)
}
