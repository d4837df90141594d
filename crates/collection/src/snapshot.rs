use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::CollectionError;

/// Everything needed to restore a widget: the sequence plus whatever sibling
/// parameters the widget versions alongside it (canvas size, fill mode, ...).
///
/// Selection is not part of a snapshot; restoring one clears the selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize, P: Serialize",
    deserialize = "T: Deserialize<'de>, P: Deserialize<'de> + Default"
))]
pub struct Snapshot<T, P = ()> {
    pub items: Vec<T>,
    #[serde(default)]
    pub params: P,
}

impl<T, P> Snapshot<T, P> {
    pub fn new(items: Vec<T>, params: P) -> Self {
        Self { items, params }
    }
}

impl<T, P> Snapshot<T, P>
where
    T: Serialize + DeserializeOwned,
    P: Serialize + DeserializeOwned + Default,
{
    pub fn encode(&self) -> Result<String, CollectionError> {
        serde_json::to_string(self).map_err(CollectionError::Serialize)
    }

    pub fn decode(text: &str) -> Result<Self, CollectionError> {
        serde_json::from_str(text).map_err(CollectionError::CorruptSnapshot)
    }
}

/// Serializes a sequence the way the host keeps it in its hidden data widget.
pub fn encode_items<T: Serialize>(items: &[T]) -> Result<String, CollectionError> {
    serde_json::to_string(items).map_err(CollectionError::Serialize)
}

/// Parses host storage text back into a sequence. Anything other than a JSON
/// array of well-formed items is an error.
pub fn decode_items<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, CollectionError> {
    serde_json::from_str(text).map_err(CollectionError::Deserialize)
}
