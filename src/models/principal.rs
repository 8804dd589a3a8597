//! Principal records and cookie payloads

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Field name to value mapping read out of the remember-me cookie
pub type CookiePayload = HashMap<String, String>;

/// Datetime layout used by SQL-style stores (`2015-05-31 16:01:03`)
const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A resolved user record
///
/// Field names map to JSON values so any user-store schema can be carried
/// through unchanged. Timestamps may be RFC 3339 strings, SQL-style
/// `YYYY-MM-DD HH:MM:SS` strings (read as UTC) or integer Unix seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(Map<String, Value>);

impl Principal {
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.to_string(), value.into())
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Get a field as a string slice, `None` when absent or not a string
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Keep only the fields for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.0.retain(|field, value| keep(field, value));
    }

    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Read a field as a UTC timestamp
    ///
    /// Returns `None` when the field is absent or holds a value that is not a
    /// recognised timestamp.
    #[must_use]
    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        match self.0.get(field)? {
            Value::String(raw) => parse_timestamp(raw),
            Value::Number(n) => n
                .as_i64()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for Principal {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Principal> for Value {
    fn from(principal: Principal) -> Self {
        Value::Object(principal.0)
    }
}

/// Parse an RFC 3339 or SQL-style datetime string into UTC
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, SQL_DATETIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_formats() {
        let principal = Principal::new()
            .with("sql", "2015-05-31 16:01:03")
            .with("rfc", "2015-05-31T16:01:03Z")
            .with("unix", 1_433_088_063)
            .with("bogus", "last tuesday")
            .with("flag", true);

        let expected = Utc.with_ymd_and_hms(2015, 5, 31, 16, 1, 3).unwrap();
        assert_eq!(principal.timestamp("sql"), Some(expected));
        assert_eq!(principal.timestamp("rfc"), Some(expected));
        assert_eq!(principal.timestamp("unix"), Some(expected));
        assert_eq!(principal.timestamp("bogus"), None);
        assert_eq!(principal.timestamp("flag"), None);
        assert_eq!(principal.timestamp("missing"), None);
    }

    #[test]
    fn test_principal_serializes_as_plain_object() {
        let principal = Principal::new().with("id", 1).with("user_name", "mariano");
        let value = serde_json::to_value(&principal).unwrap();
        assert_eq!(value, json!({"id": 1, "user_name": "mariano"}));

        let back: Principal = serde_json::from_value(value).unwrap();
        assert_eq!(back.get_str("user_name"), Some("mariano"));
    }

    #[test]
    fn test_remove_and_retain() {
        let mut principal = Principal::new()
            .with("id", 1)
            .with("password", "hash")
            .with("profile", json!({"bio": "hi"}));

        assert_eq!(principal.remove("password"), Some(json!("hash")));
        assert!(!principal.contains("password"));

        principal.retain(|_, value| !value.is_object());
        assert_eq!(principal.fields(), vec!["id"]);
    }
}
