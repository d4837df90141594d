use std::collections::BTreeSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::Position;

/// Modifier held during a pointer-down on an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickModifier {
    #[default]
    None,
    /// Ctrl / Cmd: flip membership.
    Toggle,
    /// Shift: select from the anchor to the clicked item.
    Range,
}

/// Selected positions plus the anchor used for range selection.
///
/// Positions are only ever changed through [`Selection::remap`] after a
/// structural change, so they never outlive the items they refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<Position>,
    anchor: Option<Position>,
    // plain click on a member of a multi-selection; collapsed on pointer-up
    // unless a drag starts first
    pending_collapse: Option<Position>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, position: Position) -> bool {
        self.selected.contains(&position)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn anchor(&self) -> Option<Position> {
        self.anchor
    }

    pub fn pending_collapse(&self) -> Option<Position> {
        self.pending_collapse
    }

    /// Selected positions in ascending order.
    pub fn positions(&self) -> Vec<Position> {
        self.selected.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.selected.iter().copied()
    }

    /// Pointer-down on the item at `position`. Returns whether the selection
    /// changed. Positions at or past `len` are ignored.
    pub fn pointer_down(&mut self, position: Position, modifier: ClickModifier, len: usize) -> bool {
        if position >= len {
            return false;
        }
        let before = (self.selected.clone(), self.anchor);
        self.pending_collapse = None;

        match modifier {
            ClickModifier::None => {
                if self.selected.contains(&position) && self.selected.len() > 1 {
                    self.pending_collapse = Some(position);
                } else {
                    self.select_only(position);
                }
            }
            ClickModifier::Toggle => {
                if !self.selected.remove(&position) {
                    self.selected.insert(position);
                    self.anchor = Some(position);
                }
            }
            ClickModifier::Range => {
                let anchor = *self.anchor.get_or_insert(position);
                let (start, end) = (anchor.min(position), anchor.max(position));
                self.selected = (start..=end).collect();
            }
        }

        (&self.selected, self.anchor) != (&before.0, before.1)
    }

    /// Pointer-up on `position`: performs a collapse deferred by
    /// [`Selection::pointer_down`] if no drag intervened.
    pub fn pointer_up(&mut self, position: Position) -> bool {
        match self.pending_collapse.take() {
            Some(pending) if pending == position => {
                self.select_only(position);
                true
            }
            _ => false,
        }
    }

    /// Positions a drag starting at `dragged` carries: the whole selection if
    /// `dragged` is part of it, otherwise just `dragged`. Ascending.
    pub fn drag_sources(&self, dragged: Position) -> Vec<Position> {
        if self.selected.contains(&dragged) {
            self.positions()
        } else {
            vec![dragged]
        }
    }

    /// A drag started; a deferred collapse no longer applies.
    pub fn cancel_pending(&mut self) {
        self.pending_collapse = None;
    }

    pub fn select_only(&mut self, position: Position) {
        self.selected.clear();
        self.selected.insert(position);
        self.anchor = Some(position);
    }

    /// Replaces the selected set with `range`, leaving the anchor alone.
    pub fn set_range(&mut self, range: Range<Position>) {
        self.selected = range.collect();
    }

    pub fn select_all(&mut self, len: usize) -> bool {
        let all: BTreeSet<Position> = (0..len).collect();
        if self.selected == all {
            return false;
        }
        self.selected = all;
        true
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.selected.is_empty() || self.anchor.is_some();
        self.selected.clear();
        self.anchor = None;
        self.pending_collapse = None;
        changed
    }

    /// Applies a structural remap. Removed positions drop out, the anchor is
    /// cleared if its item was removed, and anything at or past `len` is
    /// discarded.
    pub fn remap<F>(&mut self, map: F, len: usize)
    where
        F: Fn(Position) -> Option<Position>,
    {
        let valid = |p: Option<Position>| p.filter(|&p| p < len);
        self.selected = self
            .selected
            .iter()
            .filter_map(|&p| valid(map(p)))
            .collect();
        self.anchor = valid(self.anchor.and_then(&map));
        self.pending_collapse = valid(self.pending_collapse.and_then(&map));
    }
}
