use serde::{Deserialize, Serialize};

use crate::{CollectionError, DEFAULT_HISTORY_CAP};

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo restore points kept; oldest are evicted first
    pub history_cap: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, CollectionError> {
        serde_json::from_str(text).map_err(CollectionError::Deserialize)
    }

    /// History cap actually applied; zero is raised to one.
    pub fn effective_history_cap(&self) -> usize {
        self.history_cap.max(1)
    }
}
