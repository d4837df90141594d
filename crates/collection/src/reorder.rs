//! Drag-and-drop reordering of single items or groups.
//!
//! A drop extracts the dragged items and reinserts them contiguously at the
//! drop location. Items that were not dragged keep their relative order, and
//! the dragged group keeps its pre-drag relative order.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{ItemStore, Position, Remap};

/// Where a drag ended: the item under the pointer and which half of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTarget {
    pub target: Position,
    /// Pointer was past the target's midpoint.
    #[serde(default)]
    pub drop_after: bool,
}

impl DropTarget {
    pub fn before(target: Position) -> Self {
        Self {
            target,
            drop_after: false,
        }
    }

    pub fn after(target: Position) -> Self {
        Self {
            target,
            drop_after: true,
        }
    }

    /// Insertion point in the sequence as it is before extraction.
    pub fn raw_insertion_point(&self) -> Position {
        self.target + usize::from(self.drop_after)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropResult {
    /// Positions now occupied by the moved group.
    pub moved: Range<Position>,
    pub remap: Remap,
}

/// Sorted, deduplicated, in-range copy of `positions`.
pub fn normalize_positions(positions: &[Position], len: usize) -> Vec<Position> {
    let mut sorted: Vec<Position> = positions.iter().copied().filter(|&p| p < len).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Dropping a lone item onto itself.
pub fn is_self_drop(sources: &[Position], target: Position) -> bool {
    let mut distinct = sources.iter().copied();
    match distinct.next() {
        Some(first) => first == target && distinct.all(|p| p == target),
        None => false,
    }
}

/// Shifts `raw` down by the number of sources extracted before it.
/// `sorted_sources` must be ascending.
pub fn adjusted_insertion_point(sorted_sources: &[Position], raw: Position) -> Position {
    raw - sorted_sources.partition_point(|&p| p < raw)
}

/// Moves the items at `sources` to `drop`, returning the occupied range and
/// the remap for the selection. `None` when the drop is a no-op or refers to
/// positions that no longer exist.
pub fn reorder<T>(
    store: &mut ItemStore<T>,
    sources: &[Position],
    drop: DropTarget,
) -> Option<DropResult> {
    if drop.target >= store.len() || is_self_drop(sources, drop.target) {
        return None;
    }

    let remap = store.move_group(sources, drop.raw_insertion_point())?;
    let moved = remap.moved_range()?;
    Some(DropResult { moved, remap })
}
