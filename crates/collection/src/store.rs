use serde::{Deserialize, Serialize};

use crate::{adjusted_insertion_point, normalize_positions, Position, Remap};

/// Owns the ordered sequence of items being edited.
///
/// Out-of-range positions are ignored rather than reported: callers are
/// driven by transient UI events that can race with earlier mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemStore<T> {
    items: Vec<T>,
}

impl<T> Default for ItemStore<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

/// Items taken out of the store by [`ItemStore::remove_at`].
#[derive(Debug, Clone, PartialEq)]
pub struct Removal<T> {
    /// Removed items in ascending position order.
    pub items: Vec<T>,
    pub remap: Remap,
}

impl<T> ItemStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, position: Position) -> Option<&T> {
        self.items.get(position)
    }

    pub fn get_mut(&mut self, position: Position) -> Option<&mut T> {
        self.items.get_mut(position)
    }

    /// Adopts `items` verbatim and returns the previous sequence.
    pub fn replace_all(&mut self, items: Vec<T>) -> Vec<T> {
        std::mem::replace(&mut self.items, items)
    }

    /// Replaces the item at `position`, returning the previous one.
    pub fn replace(&mut self, position: Position, item: T) -> Option<T> {
        let slot = self.items.get_mut(position)?;
        Some(std::mem::replace(slot, item))
    }

    /// Inserts `items` so the first lands at `index` (`0..=len`).
    pub fn insert_at(&mut self, index: Position, items: Vec<T>) -> Option<Remap> {
        if index > self.items.len() || items.is_empty() {
            return None;
        }
        let count = items.len();
        self.items.splice(index..index, items);
        Some(Remap::Inserted { at: index, count })
    }

    /// Removes the items at `positions`. Positions are deduplicated and
    /// removed highest first so pending removals stay valid.
    pub fn remove_at(&mut self, positions: &[Position]) -> Option<Removal<T>> {
        let positions = normalize_positions(positions, self.items.len());
        if positions.is_empty() {
            return None;
        }

        let mut removed = Vec::with_capacity(positions.len());
        for &position in positions.iter().rev() {
            removed.push(self.items.remove(position));
        }
        removed.reverse();

        Some(Removal {
            items: removed,
            remap: Remap::Removed { positions },
        })
    }

    /// Extracts the items at `sources` and reinserts them, in their original
    /// relative order, at `insertion_point` (an index into the sequence as it
    /// was before extraction).
    pub fn move_group(&mut self, sources: &[Position], insertion_point: Position) -> Option<Remap> {
        if insertion_point > self.items.len() {
            return None;
        }
        let sources = normalize_positions(sources, self.items.len());
        if sources.is_empty() {
            return None;
        }

        let destination = adjusted_insertion_point(&sources, insertion_point);
        let Removal { items, .. } = self.remove_at(&sources)?;
        self.items.splice(destination..destination, items);

        Some(Remap::Moved {
            sources,
            destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(s: &str) -> ItemStore<char> {
        ItemStore::from_items(s.chars().collect())
    }

    fn as_string(store: &ItemStore<char>) -> String {
        store.items().iter().collect()
    }

    #[test]
    fn test_remove_at_dedups_and_keeps_order() {
        let mut store = letters("ABCDE");
        let removal = store.remove_at(&[3, 1, 3, 9]).unwrap();
        assert_eq!(removal.items, vec!['B', 'D']);
        assert_eq!(
            removal.remap,
            Remap::Removed {
                positions: vec![1, 3]
            }
        );
        assert_eq!(as_string(&store), "ACE");
    }

    #[test]
    fn test_remove_at_out_of_range_is_ignored() {
        let mut store = letters("AB");
        assert!(store.remove_at(&[5]).is_none());
        assert!(store.remove_at(&[]).is_none());
        assert_eq!(as_string(&store), "AB");
    }

    #[test]
    fn test_insert_at_bounds() {
        let mut store = letters("AD");
        let remap = store.insert_at(1, vec!['B', 'C']).unwrap();
        assert_eq!(remap, Remap::Inserted { at: 1, count: 2 });
        assert_eq!(as_string(&store), "ABCD");

        assert!(store.insert_at(4, vec!['E']).is_some());
        assert!(store.insert_at(9, vec!['X']).is_none());
        assert!(store.insert_at(0, Vec::new()).is_none());
        assert_eq!(as_string(&store), "ABCDE");
    }

    #[test]
    fn test_move_group_forward_and_backward() {
        let mut store = letters("ABCD");
        let remap = store.move_group(&[0, 2], 4).unwrap();
        assert_eq!(as_string(&store), "BDAC");
        assert_eq!(remap.moved_range(), Some(2..4));

        let mut store = letters("ABCDE");
        store.move_group(&[4, 3], 1).unwrap();
        assert_eq!(as_string(&store), "ADEBC");
    }

    #[test]
    fn test_replace_and_replace_all() {
        let mut store = letters("ABC");
        assert_eq!(store.replace(1, 'X'), Some('B'));
        assert_eq!(store.replace(7, 'Y'), None);
        let previous = store.replace_all(vec!['Z']);
        assert_eq!(previous, vec!['A', 'X', 'C']);
        assert_eq!(as_string(&store), "Z");
    }
}
