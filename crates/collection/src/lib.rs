use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod config;
pub use config::*;
mod editor;
pub use editor::*;
mod history;
pub use history::*;
mod items;
pub use items::*;
mod remap;
pub use remap::*;
mod reorder;
pub use reorder::*;
mod selection;
pub use selection::*;
mod snapshot;
pub use snapshot::*;
mod store;
pub use store::*;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to deserialize state: {0}")]
    Deserialize(#[source] serde_json::Error),
    #[error("corrupt history snapshot: {0}")]
    CorruptSnapshot(#[source] serde_json::Error),
    #[error("history empty: {0}")]
    HistoryEmpty(&'static str),
}

pub type Position = usize; // zero-based index into the sequence

/// Identifies one editor instance in logs; widgets own exactly one editor each.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct EditorId(pub Uuid);

impl EditorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EditorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
