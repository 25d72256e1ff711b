//! Generic content row model

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A raw row as written to the store
pub type Row = Map<String, Value>;

/// One row of a content collection.
///
/// Only the fields every collection shares are typed; everything else stays
/// in `fields` and round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Opaque id, normalised to a string (stores may hand back numbers)
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Manual sort key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
    #[serde(default = "default_visible", deserialize_with = "deserialize_visible")]
    pub is_visible: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

fn default_visible() -> bool {
    true
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "id must be a string or number, got {}",
            other
        ))),
    }
}

fn deserialize_visible<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

impl ContentItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_order: None,
            is_visible: true,
            fields: Map::new(),
        }
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.display_order = Some(order);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Normalise a row returned by a store
    pub fn from_row(row: Row) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(row))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String field, ignoring blanks
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    pub fn get_date(&self, key: &str) -> Option<NaiveDate> {
        self.fields.get(key).and_then(parse_date)
    }
}

/// Parse `YYYY-MM-DD` or the date part of an RFC 3339 timestamp
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    let date_part = s.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
