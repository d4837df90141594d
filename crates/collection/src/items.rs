//! Item and parameter types of the concrete collection widgets
//! (image batch, video list, JSON list, JSON object).

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

// characters encodeURIComponent leaves alone
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Reference to an uploaded file (image batch and video list entries).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default = "default_media_type")]
    pub media_type: String,
}

fn default_media_type() -> String {
    "input".to_string()
}

impl MediaRef {
    pub fn new(filename: impl Into<String>, subfolder: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            subfolder: subfolder.into(),
            media_type: default_media_type(),
        }
    }

    /// Host URL the renderer fetches previews from.
    pub fn view_url(&self) -> String {
        format!(
            "/view?filename={}&type={}&subfolder={}",
            utf8_percent_encode(&self.filename, URI_COMPONENT),
            self.media_type,
            utf8_percent_encode(&self.subfolder, URI_COMPONENT)
        )
    }
}

/// How images are fitted into the batch canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    Fit,
    #[default]
    Fill,
    Stretch,
}

/// Image batch parameters versioned together with its images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageBatchParams {
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
    pub fill: FillMode,
    /// Canvas background, hex
    pub color: String,
    /// Longest preview edge in pixels
    #[serde(rename = "maxRes")]
    pub max_res: u32,
    #[serde(rename = "gridSize")]
    pub grid_size: u32,
}

impl Default for ImageBatchParams {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1080,
            fill: FillMode::Fill,
            color: "#000000".to_string(),
            max_res: 2000,
            grid_size: 80,
        }
    }
}

/// Declared type of a JSON editor row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Number,
    Boolean,
    Json,
}

impl ValueType {
    /// Converts the row's edited text into a JSON value of this type.
    pub fn coerce(self, raw: &str) -> Value {
        let text = raw.replace('\u{200B}', "");
        match self {
            ValueType::String => Value::String(text),
            ValueType::Number => parse_number(&text).unwrap_or_else(|| Value::from(0)),
            ValueType::Boolean => {
                let lower = text.to_lowercase();
                Value::Bool(lower == "true" || lower == "1")
            }
            ValueType::Json => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        }
    }

    /// Whether `raw` is acceptable input for this type. Empty text is always
    /// accepted.
    pub fn is_valid(self, raw: &str) -> bool {
        if raw.is_empty() {
            return true;
        }
        match self {
            ValueType::Boolean => {
                matches!(raw.to_lowercase().as_str(), "true" | "false" | "0" | "1")
            }
            ValueType::Number => parse_number(raw).is_some(),
            ValueType::String | ValueType::Json => true,
        }
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(Value::from(0));
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Value::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Text shown in the row editor for `value`.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Row of the JSON list editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    #[serde(default = "empty_value")]
    pub value: Value,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
}

/// Row of the JSON object editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    #[serde(default)]
    pub key: String,
    #[serde(default = "empty_value")]
    pub value: Value,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
}

fn empty_value() -> Value {
    Value::String(String::new())
}

impl ListEntry {
    pub fn from_text(raw: &str, value_type: ValueType) -> Self {
        Self {
            value: value_type.coerce(raw),
            value_type,
        }
    }

    pub fn text(&self) -> String {
        display_text(&self.value)
    }

    pub fn is_valid(&self) -> bool {
        self.value_type.is_valid(&self.text())
    }

    /// Changes the declared type, re-reading the current text under it.
    pub fn retype(&mut self, value_type: ValueType) {
        self.value = value_type.coerce(&self.text());
        self.value_type = value_type;
    }
}

impl ObjectEntry {
    pub fn from_text(key: impl Into<String>, raw: &str, value_type: ValueType) -> Self {
        Self {
            key: key.into(),
            value: value_type.coerce(raw),
            value_type,
        }
    }

    pub fn text(&self) -> String {
        display_text(&self.value)
    }

    pub fn is_valid(&self) -> bool {
        self.value_type.is_valid(&self.text())
    }

    pub fn retype(&mut self, value_type: ValueType) {
        self.value = value_type.coerce(&self.text());
        self.value_type = value_type;
    }
}

pub fn entries_to_list(entries: &[ListEntry]) -> Vec<Value> {
    entries.iter().map(|entry| entry.value.clone()).collect()
}

/// Later rows win when keys repeat.
pub fn entries_to_object(entries: &[ObjectEntry]) -> Map<String, Value> {
    entries
        .iter()
        .map(|entry| (entry.key.clone(), entry.value.clone()))
        .collect()
}

/// Output of the list node for raw stored rows. Object rows contribute their
/// `value` (null when absent); anything else is passed through. `None` when
/// `stored` is not an array.
pub fn materialize_list(stored: &Value) -> Option<Vec<Value>> {
    let rows = stored.as_array()?;
    Some(
        rows.iter()
            .map(|row| match row {
                Value::Object(fields) => fields.get("value").cloned().unwrap_or(Value::Null),
                other => other.clone(),
            })
            .collect(),
    )
}

/// Output of the object node for raw stored rows. Rows without a `key` are
/// skipped and non-string keys are stringified. `None` when `stored` is not
/// an array.
pub fn materialize_object(stored: &Value) -> Option<Map<String, Value>> {
    let rows = stored.as_array()?;
    let mut output = Map::new();
    for fields in rows.iter().filter_map(Value::as_object) {
        let Some(key) = fields.get("key") else {
            continue;
        };
        let value = fields.get("value").cloned().unwrap_or(Value::Null);
        output.insert(display_text(key), value);
    }
    Some(output)
}

/// Clipboard text for copied list rows.
pub fn copy_list_rows<'a>(rows: impl IntoIterator<Item = &'a ListEntry>) -> String {
    let body: Vec<String> = rows.into_iter().map(ListEntry::text).collect();
    format!("[\n{}\n]", body.join(",\n"))
}

/// Clipboard text for copied object rows.
pub fn copy_object_rows<'a>(rows: impl IntoIterator<Item = &'a ObjectEntry>) -> String {
    let body: Vec<String> = rows
        .into_iter()
        .map(|row| format!("\"{}\": {}", row.key, row.text()))
        .collect();
    format!("{{\n{}\n}}", body.join(",\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_number() {
        assert_eq!(ValueType::Number.coerce("42"), json!(42));
        assert_eq!(ValueType::Number.coerce(" 2.5 "), json!(2.5));
        assert_eq!(ValueType::Number.coerce("abc"), json!(0));
        assert_eq!(ValueType::Number.coerce(""), json!(0));
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(ValueType::Boolean.coerce("TRUE"), json!(true));
        assert_eq!(ValueType::Boolean.coerce("1"), json!(true));
        assert_eq!(ValueType::Boolean.coerce("yes"), json!(false));
    }

    #[test]
    fn test_coerce_json_falls_back_to_text() {
        assert_eq!(ValueType::Json.coerce(r#"{"a":[1]}"#), json!({"a": [1]}));
        assert_eq!(ValueType::Json.coerce("{oops"), json!("{oops"));
    }

    #[test]
    fn test_coerce_string_strips_zero_width_space() {
        assert_eq!(ValueType::String.coerce("a\u{200B}b"), json!("ab"));
    }

    #[test]
    fn test_validity() {
        assert!(ValueType::Boolean.is_valid("False"));
        assert!(!ValueType::Boolean.is_valid("maybe"));
        assert!(ValueType::Number.is_valid("-3e2"));
        assert!(!ValueType::Number.is_valid("3x"));
        assert!(ValueType::Number.is_valid(""));
        assert!(ValueType::Json.is_valid("{oops"));
    }

    #[test]
    fn test_retype_rereads_text() {
        let mut entry = ListEntry::from_text("12", ValueType::String);
        assert_eq!(entry.value, json!("12"));
        entry.retype(ValueType::Number);
        assert_eq!(entry.value, json!(12));
        entry.retype(ValueType::String);
        assert_eq!(entry.value, json!("12"));
    }

    #[test]
    fn test_entries_to_object_last_key_wins() {
        let rows = vec![
            ObjectEntry::from_text("a", "1", ValueType::Number),
            ObjectEntry::from_text("b", "x", ValueType::String),
            ObjectEntry::from_text("a", "true", ValueType::Boolean),
        ];
        let object = entries_to_object(&rows);
        assert_eq!(Value::Object(object), json!({"a": true, "b": "x"}));
    }

    #[test]
    fn test_materialize_raw_rows() {
        let stored = json!([{"value": 1, "type": "number"}, "loose", {"type": "string"}]);
        assert_eq!(
            materialize_list(&stored).unwrap(),
            vec![json!(1), json!("loose"), Value::Null]
        );

        let stored = json!([{"key": 5, "value": "five"}, {"value": "no key"}, 7]);
        assert_eq!(
            Value::Object(materialize_object(&stored).unwrap()),
            json!({"5": "five"})
        );

        assert!(materialize_list(&json!({"value": 1})).is_none());
        assert!(materialize_object(&json!("[]")).is_none());
    }

    #[test]
    fn test_clipboard_text() {
        let rows = vec![
            ListEntry::from_text("hello", ValueType::String),
            ListEntry::from_text("[1,2]", ValueType::Json),
        ];
        assert_eq!(copy_list_rows(&rows), "[\nhello,\n[1,2]\n]");

        let rows = vec![ObjectEntry::from_text("n", "3", ValueType::Number)];
        assert_eq!(copy_object_rows(&rows), "{\n\"n\": 3\n}");
    }

    #[test]
    fn test_storage_defaults() {
        let entry: ListEntry = serde_json::from_value(json!({"value": "x"})).unwrap();
        assert_eq!(entry.value_type, ValueType::String);

        let media: MediaRef = serde_json::from_value(json!({"filename": "a b.png"})).unwrap();
        assert_eq!(media.media_type, "input");
        assert_eq!(media.view_url(), "/view?filename=a%20b.png&type=input&subfolder=");

        let params: ImageBatchParams = serde_json::from_value(json!({"w": 512, "fill": "fit"})).unwrap();
        assert_eq!(params.width, 512);
        assert_eq!(params.height, 1080);
        assert_eq!(params.fill, FillMode::Fit);
        assert_eq!(params.max_res, 2000);
    }
}
