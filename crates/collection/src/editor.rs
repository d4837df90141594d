//! Mutation dispatcher.
//!
//! Every user action enters through [`Editor::dispatch`], which records a
//! restore point before a history-worthy edit, applies the structural change,
//! remaps the selection from the exact change applied, and then emits one
//! change notification.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{
    decode_items, encode_items, is_self_drop, reorder, ClickModifier, CollectionError, DropTarget,
    EditorConfig, EditorId, History, HistoryEntry, ItemStore, Position, Remap, Selection,
    Snapshot,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
#[serde(bound(
    serialize = "T: Serialize, P: Serialize",
    deserialize = "T: Deserialize<'de>, P: Deserialize<'de>"
))]
pub enum Action<T, P = ()> {
    /// Delete button on the item at `position`; deletes the whole selection
    /// if that item is part of it.
    Delete {
        position: Position,
    },
    Drop {
        dragged: Position,
        target: Position,
        #[serde(default)]
        drop_after: bool,
    },
    Undo,
    Redo,
    ReplaceAll {
        items: Vec<T>,
    },
    Insert {
        index: Position,
        items: Vec<T>,
    },
    Append {
        items: Vec<T>,
    },
    Update {
        position: Position,
        item: T,
    },
    /// An asynchronous producer (upload) started; raises the busy flag.
    BeginAppend,
    /// One item produced by the in-flight operation arrived.
    CompleteAppend {
        item: T,
    },
    FinishAppend,
    /// A parameter control gained focus.
    BeginParamEdit,
    CommitParams {
        params: P,
    },
    Click {
        position: Position,
        #[serde(default)]
        modifier: ClickModifier,
    },
    PointerUp {
        position: Position,
    },
    ClearSelection,
    SelectAll,
}

impl<T, P> Action<T, P> {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Delete { .. } => "delete",
            Action::Drop { .. } => "drop",
            Action::Undo => "undo",
            Action::Redo => "redo",
            Action::ReplaceAll { .. } => "replace_all",
            Action::Insert { .. } => "insert",
            Action::Append { .. } => "append",
            Action::Update { .. } => "update",
            Action::BeginAppend => "begin_append",
            Action::CompleteAppend { .. } => "complete_append",
            Action::FinishAppend => "finish_append",
            Action::BeginParamEdit => "begin_param_edit",
            Action::CommitParams { .. } => "commit_params",
            Action::Click { .. } => "click",
            Action::PointerUp { .. } => "pointer_up",
            Action::ClearSelection => "clear_selection",
            Action::SelectAll => "select_all",
        }
    }

    /// Actions refused while an asynchronous append is in flight.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Action::Delete { .. }
                | Action::Drop { .. }
                | Action::Undo
                | Action::Redo
                | Action::ReplaceAll { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    /// Nothing visible changed (no-op, stale position, empty history).
    Unchanged,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// An asynchronous append is in flight.
    Busy,
    /// An appended item arrived with no append in flight.
    NotBusy,
    /// A history entry could not be restored.
    RestoreFailed,
    /// The live state could not be captured as a restore point.
    SnapshotFailed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectReason::Busy => "busy with an asynchronous append",
            RejectReason::NotBusy => "no asynchronous append in flight",
            RejectReason::RestoreFailed => "history entry could not be restored",
            RejectReason::SnapshotFailed => "state could not be captured",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Undo,
    Redo,
}

type ChangeListener = Box<dyn FnMut()>;
type RejectListener = Box<dyn FnMut(RejectReason)>;

/// Editing engine owned by one widget instance.
pub struct Editor<T, P = ()> {
    id: EditorId,
    store: ItemStore<T>,
    params: P,
    selection: Selection,
    history: History,
    busy: bool,
    pending_param_edit: Option<HistoryEntry>,
    change_listeners: Vec<ChangeListener>,
    reject_listeners: Vec<RejectListener>,
}

impl<T: fmt::Debug, P: fmt::Debug> fmt::Debug for Editor<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("id", &self.id)
            .field("store", &self.store)
            .field("params", &self.params)
            .field("selection", &self.selection)
            .field("history", &self.history)
            .field("busy", &self.busy)
            .finish_non_exhaustive()
    }
}

impl<T, P> Editor<T, P>
where
    T: Clone + Serialize + DeserializeOwned,
    P: Clone + Default + Serialize + DeserializeOwned,
{
    pub fn new(config: &EditorConfig) -> Self {
        Self::with_items(Vec::new(), P::default(), config)
    }

    pub fn with_items(items: Vec<T>, params: P, config: &EditorConfig) -> Self {
        Self {
            id: EditorId::new(),
            store: ItemStore::from_items(items),
            params,
            selection: Selection::new(),
            history: History::new(config.effective_history_cap()),
            busy: false,
            pending_param_edit: None,
            change_listeners: Vec::new(),
            reject_listeners: Vec::new(),
        }
    }

    pub fn id(&self) -> EditorId {
        self.id
    }

    pub fn items(&self) -> &[T] {
        self.store.items()
    }

    pub fn item(&self, position: Position) -> Option<&T> {
        self.store.get(position)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected items in position order.
    pub fn selected_items(&self) -> Vec<&T> {
        self.selection
            .iter()
            .filter_map(|position| self.store.get(position))
            .collect()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Registers a callback invoked once after every applied action.
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) {
        self.change_listeners.push(Box::new(listener));
    }

    /// Registers a callback invoked when an action is rejected.
    pub fn on_rejected(&mut self, listener: impl FnMut(RejectReason) + 'static) {
        self.reject_listeners.push(Box::new(listener));
    }

    pub fn snapshot(&self) -> Snapshot<T, P> {
        Snapshot::new(self.store.items().to_vec(), self.params.clone())
    }

    /// Sequence as the host persists it.
    pub fn to_storage(&self) -> Result<String, CollectionError> {
        encode_items(self.store.items())
    }

    /// Adopts a sequence read back from host storage without recording
    /// history. Empty or malformed text is ignored.
    pub fn load_storage(&mut self, text: &str) -> Outcome {
        self.run("load_storage", true, |editor| editor.apply_load_storage(text))
    }

    pub fn dispatch(&mut self, action: Action<T, P>) -> Outcome {
        let name = action.name();
        let destructive = action.is_destructive();
        self.run(name, destructive, move |editor| editor.apply_action(action))
    }

    pub fn delete(&mut self, position: Position) -> Outcome {
        self.dispatch(Action::Delete { position })
    }

    pub fn drop_onto(&mut self, dragged: Position, drop: DropTarget) -> Outcome {
        self.dispatch(Action::Drop {
            dragged,
            target: drop.target,
            drop_after: drop.drop_after,
        })
    }

    pub fn undo(&mut self) -> Outcome {
        self.dispatch(Action::Undo)
    }

    pub fn redo(&mut self) -> Outcome {
        self.dispatch(Action::Redo)
    }

    pub fn replace_all(&mut self, items: Vec<T>) -> Outcome {
        self.dispatch(Action::ReplaceAll { items })
    }

    pub fn insert(&mut self, index: Position, items: Vec<T>) -> Outcome {
        self.dispatch(Action::Insert { index, items })
    }

    pub fn append(&mut self, items: Vec<T>) -> Outcome {
        self.dispatch(Action::Append { items })
    }

    pub fn update(&mut self, position: Position, item: T) -> Outcome {
        self.dispatch(Action::Update { position, item })
    }

    pub fn begin_append(&mut self) -> Outcome {
        self.dispatch(Action::BeginAppend)
    }

    pub fn complete_append(&mut self, item: T) -> Outcome {
        self.dispatch(Action::CompleteAppend { item })
    }

    pub fn finish_append(&mut self) -> Outcome {
        self.dispatch(Action::FinishAppend)
    }

    pub fn begin_param_edit(&mut self) -> Outcome {
        self.dispatch(Action::BeginParamEdit)
    }

    pub fn commit_params(&mut self, params: P) -> Outcome {
        self.dispatch(Action::CommitParams { params })
    }

    pub fn click(&mut self, position: Position, modifier: ClickModifier) -> Outcome {
        self.dispatch(Action::Click { position, modifier })
    }

    pub fn pointer_up(&mut self, position: Position) -> Outcome {
        self.dispatch(Action::PointerUp { position })
    }

    pub fn clear_selection(&mut self) -> Outcome {
        self.dispatch(Action::ClearSelection)
    }

    pub fn select_all(&mut self) -> Outcome {
        self.dispatch(Action::SelectAll)
    }

    /// Edits every selected item in place as one undoable step.
    pub fn update_selected<F>(&mut self, edit: F) -> Outcome
    where
        F: FnMut(&mut T),
    {
        self.run("update_selected", false, move |editor| {
            editor.apply_update_selected(edit)
        })
    }

    /// Busy guard, then `apply`, then logging and notification. Every
    /// mutation of the editor goes through here.
    fn run<F>(&mut self, action: &'static str, destructive: bool, apply: F) -> Outcome
    where
        F: FnOnce(&mut Self) -> Outcome,
    {
        let outcome = if self.busy && destructive {
            Outcome::Rejected(RejectReason::Busy)
        } else {
            apply(self)
        };
        self.finish(action, outcome)
    }

    fn apply_action(&mut self, action: Action<T, P>) -> Outcome {
        let len = self.store.len();
        match action {
            Action::Delete { position } => self.apply_delete(position),
            Action::Drop {
                dragged,
                target,
                drop_after,
            } => self.apply_drop(dragged, DropTarget { target, drop_after }),
            Action::Undo => self.apply_step(Step::Undo),
            Action::Redo => self.apply_step(Step::Redo),
            Action::ReplaceAll { items } => self.apply_replace_all(items),
            Action::Insert { index, items } => self.apply_insert(index, items),
            Action::Append { items } => self.apply_insert(len, items),
            Action::Update { position, item } => self.apply_update(position, item),
            Action::BeginAppend => self.apply_begin_append(),
            Action::CompleteAppend { item } => self.apply_complete_append(item),
            Action::FinishAppend => self.apply_finish_append(),
            Action::BeginParamEdit => self.apply_begin_param_edit(),
            Action::CommitParams { params } => self.apply_commit_params(params),
            Action::Click { position, modifier } => {
                changed(self.selection.pointer_down(position, modifier, len))
            }
            Action::PointerUp { position } => changed(self.selection.pointer_up(position)),
            Action::ClearSelection => changed(self.selection.clear()),
            Action::SelectAll => changed(self.selection.select_all(len)),
        }
    }

    fn apply_load_storage(&mut self, text: &str) -> Outcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Outcome::Unchanged;
        }
        match decode_items::<T>(trimmed) {
            Ok(items) if items.is_empty() => Outcome::Unchanged,
            Ok(items) => {
                self.store.replace_all(items);
                self.remap_selection(&Remap::Cleared);
                Outcome::Applied
            }
            Err(err) => {
                warn!(editor = %self.id, error = %err, "ignoring malformed storage");
                Outcome::Unchanged
            }
        }
    }

    fn apply_update_selected<F>(&mut self, mut edit: F) -> Outcome
    where
        F: FnMut(&mut T),
    {
        let positions = self.selection.positions();
        if positions.is_empty() {
            return Outcome::Unchanged;
        }
        if let Err(reason) = self.record_restore_point() {
            return Outcome::Rejected(reason);
        }
        for position in positions {
            if let Some(item) = self.store.get_mut(position) {
                edit(item);
            }
        }
        Outcome::Applied
    }

    fn apply_delete(&mut self, position: Position) -> Outcome {
        if position >= self.store.len() {
            return Outcome::Unchanged;
        }
        let targets = if self.selection.contains(position) {
            self.selection.positions()
        } else {
            vec![position]
        };
        if let Err(reason) = self.record_restore_point() {
            return Outcome::Rejected(reason);
        }
        let Some(removal) = self.store.remove_at(&targets) else {
            return Outcome::Unchanged;
        };
        self.remap_selection(&removal.remap);
        Outcome::Applied
    }

    fn apply_drop(&mut self, dragged: Position, drop: DropTarget) -> Outcome {
        let len = self.store.len();
        if dragged >= len || drop.target >= len {
            return Outcome::Unchanged;
        }
        let sources = self.selection.drag_sources(dragged);
        if is_self_drop(&sources, drop.target) {
            return Outcome::Unchanged;
        }
        if let Err(reason) = self.record_restore_point() {
            return Outcome::Rejected(reason);
        }
        let Some(result) = reorder(&mut self.store, &sources, drop) else {
            return Outcome::Unchanged;
        };
        debug!(editor = %self.id, moves = ?result.remap.table(len), "reordered items");
        self.selection.cancel_pending();
        self.remap_selection(&result.remap);
        self.selection.set_range(result.moved);
        Outcome::Applied
    }

    fn apply_step(&mut self, step: Step) -> Outcome {
        let available = match step {
            Step::Undo => self.history.can_undo(),
            Step::Redo => self.history.can_redo(),
        };
        if !available {
            return Outcome::Unchanged;
        }

        let current = self.snapshot();
        let restored = match step {
            Step::Undo => self.history.undo(&current),
            Step::Redo => self.history.redo(&current),
        };
        match restored {
            Ok(snapshot) => {
                self.restore(snapshot);
                Outcome::Applied
            }
            Err(CollectionError::HistoryEmpty(_)) => Outcome::Unchanged,
            Err(err) => {
                error!(
                    editor = %self.id,
                    step = ?step,
                    error = %err,
                    "restore failed; live state and history left untouched"
                );
                Outcome::Rejected(RejectReason::RestoreFailed)
            }
        }
    }

    fn apply_replace_all(&mut self, items: Vec<T>) -> Outcome {
        if let Err(reason) = self.record_restore_point() {
            return Outcome::Rejected(reason);
        }
        self.store.replace_all(items);
        self.remap_selection(&Remap::Cleared);
        Outcome::Applied
    }

    fn apply_insert(&mut self, index: Position, items: Vec<T>) -> Outcome {
        if index > self.store.len() || items.is_empty() {
            return Outcome::Unchanged;
        }
        if let Err(reason) = self.record_restore_point() {
            return Outcome::Rejected(reason);
        }
        let Some(remap) = self.store.insert_at(index, items) else {
            return Outcome::Unchanged;
        };
        self.remap_selection(&remap);
        Outcome::Applied
    }

    fn apply_update(&mut self, position: Position, item: T) -> Outcome {
        if position >= self.store.len() {
            return Outcome::Unchanged;
        }
        if let Err(reason) = self.record_restore_point() {
            return Outcome::Rejected(reason);
        }
        match self.store.replace(position, item) {
            Some(_) => Outcome::Applied,
            None => Outcome::Unchanged,
        }
    }

    fn apply_begin_append(&mut self) -> Outcome {
        if self.busy {
            return Outcome::Rejected(RejectReason::Busy);
        }
        if let Err(reason) = self.record_restore_point() {
            return Outcome::Rejected(reason);
        }
        self.busy = true;
        Outcome::Applied
    }

    fn apply_complete_append(&mut self, item: T) -> Outcome {
        if !self.busy {
            return Outcome::Rejected(RejectReason::NotBusy);
        }
        let end = self.store.len();
        match self.store.insert_at(end, vec![item]) {
            Some(remap) => {
                self.remap_selection(&remap);
                Outcome::Applied
            }
            None => Outcome::Unchanged,
        }
    }

    fn apply_finish_append(&mut self) -> Outcome {
        if !self.busy {
            return Outcome::Unchanged;
        }
        self.busy = false;
        Outcome::Applied
    }

    fn apply_begin_param_edit(&mut self) -> Outcome {
        match HistoryEntry::capture(&self.snapshot()) {
            Ok(entry) => {
                self.pending_param_edit = Some(entry);
                Outcome::Unchanged
            }
            Err(err) => {
                error!(editor = %self.id, error = %err, "failed to capture parameter restore point");
                Outcome::Rejected(RejectReason::SnapshotFailed)
            }
        }
    }

    fn apply_commit_params(&mut self, params: P) -> Outcome {
        let entry = match self.pending_param_edit.take() {
            Some(entry) => entry,
            None => match HistoryEntry::capture(&self.snapshot()) {
                Ok(entry) => entry,
                Err(err) => {
                    error!(editor = %self.id, error = %err, "failed to capture parameter restore point");
                    return Outcome::Rejected(RejectReason::SnapshotFailed);
                }
            },
        };
        self.history.push(entry);
        self.params = params;
        Outcome::Applied
    }

    /// Records the live state as a restore point. A pending parameter edit is
    /// dropped since its restore point would now also undo this edit.
    fn record_restore_point(&mut self) -> Result<(), RejectReason> {
        self.pending_param_edit = None;
        let snapshot = self.snapshot();
        match self.history.record_if_non_trivial(&snapshot) {
            Ok(_) => Ok(()),
            Err(err) => {
                error!(editor = %self.id, error = %err, "failed to record restore point");
                Err(RejectReason::SnapshotFailed)
            }
        }
    }

    fn restore(&mut self, snapshot: Snapshot<T, P>) {
        self.store.replace_all(snapshot.items);
        self.params = snapshot.params;
        self.pending_param_edit = None;
        self.remap_selection(&Remap::Cleared);
    }

    fn remap_selection(&mut self, remap: &Remap) {
        let len = self.store.len();
        self.selection.remap(|position| remap.apply(position), len);
    }

    fn finish(&mut self, action: &'static str, outcome: Outcome) -> Outcome {
        match outcome {
            Outcome::Applied => {
                debug!(
                    editor = %self.id,
                    action,
                    len = self.store.len(),
                    selected = self.selection.len(),
                    "action applied"
                );
                for listener in &mut self.change_listeners {
                    listener();
                }
            }
            Outcome::Unchanged => {
                debug!(editor = %self.id, action, "action had no effect");
            }
            Outcome::Rejected(reason) => {
                warn!(editor = %self.id, action, %reason, "action rejected");
                for listener in &mut self.reject_listeners {
                    listener(reason);
                }
            }
        }
        outcome
    }
}

fn changed(changed: bool) -> Outcome {
    if changed {
        Outcome::Applied
    } else {
        Outcome::Unchanged
    }
}
