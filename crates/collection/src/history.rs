//! Snapshot-based undo/redo.
//!
//! Each entry is a restore point captured immediately before an edit was
//! applied. Entries are stored serialized so a corrupt one can only fail its
//! own restore, never the live state.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{CollectionError, Snapshot};

pub const DEFAULT_HISTORY_CAP: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    payload: String,
    recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn capture<T, P>(snapshot: &Snapshot<T, P>) -> Result<Self, CollectionError>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + DeserializeOwned + Default,
    {
        Ok(Self::from_payload(snapshot.encode()?))
    }

    pub fn from_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn restore<T, P>(&self) -> Result<Snapshot<T, P>, CollectionError>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + DeserializeOwned + Default,
    {
        Snapshot::decode(&self.payload)
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// Bounded undo stack plus a redo stack that is discarded on every new edit.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    cap: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl History {
    /// A cap of zero is treated as one.
    pub fn new(cap: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            cap: cap.max(1),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo entries, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.undo_stack.iter()
    }

    /// Records `snapshot` as a restore point unless both the sequence and the
    /// undo stack are empty. Redo is cleared either way. Returns whether an
    /// entry was pushed.
    pub fn record_if_non_trivial<T, P>(
        &mut self,
        snapshot: &Snapshot<T, P>,
    ) -> Result<bool, CollectionError>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + DeserializeOwned + Default,
    {
        if snapshot.items.is_empty() && self.undo_stack.is_empty() {
            self.redo_stack.clear();
            return Ok(false);
        }
        let entry = HistoryEntry::capture(snapshot)?;
        self.push(entry);
        Ok(true)
    }

    /// Pushes a restore point captured earlier and invalidates redo.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.push_undo(entry);
        self.redo_stack.clear();
    }

    /// Pops the newest restore point, saving `current` for redo.
    ///
    /// The entry is decoded before anything is popped; if it is corrupt the
    /// error is [`CollectionError::CorruptSnapshot`] and both stacks are left
    /// exactly as they were.
    pub fn undo<T, P>(&mut self, current: &Snapshot<T, P>) -> Result<Snapshot<T, P>, CollectionError>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + DeserializeOwned + Default,
    {
        let entry = self
            .undo_stack
            .back()
            .ok_or(CollectionError::HistoryEmpty("undo stack"))?;
        let restored = entry.restore()?;
        let current = HistoryEntry::capture(current)?;
        self.undo_stack.pop_back();
        self.redo_stack.push(current);
        Ok(restored)
    }

    /// Symmetric to [`History::undo`].
    pub fn redo<T, P>(&mut self, current: &Snapshot<T, P>) -> Result<Snapshot<T, P>, CollectionError>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + DeserializeOwned + Default,
    {
        let entry = self
            .redo_stack
            .last()
            .ok_or(CollectionError::HistoryEmpty("redo stack"))?;
        let restored = entry.restore()?;
        let current = HistoryEntry::capture(current)?;
        self.redo_stack.pop();
        self.push_undo(current);
        Ok(restored)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo_stack.push_back(entry);
        while self.undo_stack.len() > self.cap {
            self.undo_stack.pop_front();
        }
    }
}
