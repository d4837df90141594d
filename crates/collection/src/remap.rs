//! Position remapping after a structural change to the sequence.
//!
//! Every structural operation on [`crate::ItemStore`] reports the exact change
//! it applied as a `Remap`, and the selection is updated from that value only.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remap {
    /// Every old position is invalid (whole sequence replaced).
    Cleared,
    /// The listed positions were removed. Sorted ascending, no duplicates.
    Removed { positions: Vec<Position> },
    /// `count` items were inserted starting at `at`.
    Inserted { at: Position, count: usize },
    /// The items at `sources` (sorted ascending) were extracted and reinserted
    /// contiguously starting at `destination` in the resulting sequence.
    Moved {
        sources: Vec<Position>,
        destination: Position,
    },
}

impl Remap {
    /// Maps a position in the old sequence to its position in the new one,
    /// or `None` if the item no longer exists.
    pub fn apply(&self, old: Position) -> Option<Position> {
        match self {
            Remap::Cleared => None,
            Remap::Removed { positions } => match positions.binary_search(&old) {
                Ok(_) => None,
                Err(removed_before) => Some(old - removed_before),
            },
            Remap::Inserted { at, count } => {
                if old >= *at {
                    Some(old + count)
                } else {
                    Some(old)
                }
            }
            Remap::Moved {
                sources,
                destination,
            } => match sources.binary_search(&old) {
                Ok(rank) => Some(destination + rank),
                Err(moved_before) => {
                    let compacted = old - moved_before;
                    if compacted >= *destination {
                        Some(compacted + sources.len())
                    } else {
                        Some(compacted)
                    }
                }
            },
        }
    }

    /// Range occupied by the reinserted group of a move.
    pub fn moved_range(&self) -> Option<Range<Position>> {
        match self {
            Remap::Moved {
                sources,
                destination,
            } => Some(*destination..destination + sources.len()),
            _ => None,
        }
    }

    /// `{old -> new}` for every surviving position whose index changed.
    pub fn table(&self, old_len: usize) -> BTreeMap<Position, Position> {
        (0..old_len)
            .filter_map(|old| match self.apply(old) {
                Some(new) if new != old => Some((old, new)),
                _ => None,
            })
            .collect()
    }
}
