//! In-memory user and session stores
//!
//! `MemoryUserStore` keeps tables of JSON records keyed by model name. It is
//! read-only after construction, so it can be shared across requests behind an
//! `Arc` without locking.

use crate::authentication::traits::{SessionStore, UserStore};
use crate::models::Principal;
use crate::store::Predicate;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Read-only user tables
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    tables: HashMap<String, Vec<Principal>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table of records for `model`, replacing any previous one
    #[must_use]
    pub fn with_table(mut self, model: &str, records: Vec<Principal>) -> Self {
        self.tables.insert(model.to_string(), records);
        self
    }

    /// Load tables from a JSON document shaped `{ "Users": [ {...}, ... ] }`
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not an object of arrays of objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(json).context("Invalid users JSON")?;
        let Value::Object(tables) = document else {
            return Err(anyhow!("Users JSON must be an object keyed by model name"));
        };

        let mut store = Self::new();
        for (model, rows) in tables {
            let Value::Array(rows) = rows else {
                return Err(anyhow!("Table '{model}' must be an array of records"));
            };
            let records = rows
                .into_iter()
                .enumerate()
                .map(|(index, row)| match row {
                    Value::Object(map) => Ok(Principal::from(map)),
                    _ => Err(anyhow!("Record {index} of table '{model}' is not an object")),
                })
                .collect::<Result<Vec<_>>>()?;
            store.tables.insert(model, records);
        }
        Ok(store)
    }

    /// Load tables from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid users JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read users file {}", path.display()))?;
        let store = Self::from_json(&contents)?;
        log::info!(
            "Loaded {} user table(s) from {}",
            store.tables.len(),
            path.display()
        );
        Ok(store)
    }

    #[must_use]
    pub fn table_len(&self, model: &str) -> usize {
        self.tables.get(model).map_or(0, Vec::len)
    }
}

/// Nested objects and arrays of objects are associations
fn is_association(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().any(Value::is_object),
        _ => false,
    }
}

impl UserStore for MemoryUserStore {
    fn find_one(
        &self,
        model: &str,
        predicate: &Predicate,
        contain: &[String],
    ) -> Result<Option<Principal>> {
        let alias = model.rsplit_once('.').map_or(model, |(_, alias)| alias);
        let Some(records) = self.tables.get(model).or_else(|| self.tables.get(alias)) else {
            return Err(anyhow!("Unknown user model '{model}'"));
        };

        let found = records.iter().find(|record| predicate.matches(record)).map(|record| {
            let mut record = record.clone();
            record.retain(|field, value| {
                !is_association(value) || contain.iter().any(|hint| hint == field)
            });
            record
        });
        Ok(found)
    }
}

/// Session store holding principals in a plain map
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: HashMap<String, Principal>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Principal> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn write(&mut self, key: &str, principal: &Principal) -> Result<()> {
        self.entries.insert(key.to_string(), principal.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    const USERS_JSON: &str = r#"{
        "Users": [
            {"id": 1, "user_name": "mariano", "active": 1, "profile": {"bio": "first"}, "tags": ["a"]},
            {"id": 2, "user_name": "nate", "active": 0, "profile": {"bio": "second"}},
            {"id": 3, "user_name": "mariano", "active": 0}
        ]
    }"#;

    #[test]
    fn test_first_match_wins() {
        let store = MemoryUserStore::from_json(USERS_JSON).unwrap();
        let found = store
            .find_one("Users", &Predicate::new().eq("user_name", "mariano"), &[])
            .unwrap()
            .unwrap();
        assert_eq!(found.get("id"), Some(&json!(1)));
    }

    #[test]
    fn test_predicate_narrows_the_match() {
        let store = MemoryUserStore::from_json(USERS_JSON).unwrap();
        let predicate = Predicate::new().eq("user_name", "mariano").eq("active", 0);
        let found = store.find_one("Users", &predicate, &[]).unwrap().unwrap();
        assert_eq!(found.get("id"), Some(&json!(3)));

        let predicate = Predicate::new().eq("user_name", "larry");
        assert!(store.find_one("Users", &predicate, &[]).unwrap().is_none());
    }

    #[test]
    fn test_associations_require_contain() {
        let store = MemoryUserStore::from_json(USERS_JSON).unwrap();
        let predicate = Predicate::new().eq("id", 1);

        let bare = store.find_one("Users", &predicate, &[]).unwrap().unwrap();
        assert!(!bare.contains("profile"));
        // plain arrays are columns, not associations
        assert!(bare.contains("tags"));

        let contained = store
            .find_one("Users", &predicate, &["profile".to_string()])
            .unwrap()
            .unwrap();
        assert_eq!(contained.get("profile"), Some(&json!({"bio": "first"})));
    }

    #[test]
    fn test_plugin_qualified_model() {
        let store = MemoryUserStore::from_json(USERS_JSON).unwrap();
        let found = store
            .find_one("Accounts.Users", &Predicate::new().eq("id", 2), &[])
            .unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_unknown_model_is_an_error() {
        let store = MemoryUserStore::new();
        let err = store
            .find_one("Ghosts", &Predicate::new(), &[])
            .unwrap_err();
        assert!(err.to_string().contains("Unknown user model 'Ghosts'"));
    }

    #[test]
    fn test_from_json_rejects_bad_shapes() {
        assert!(MemoryUserStore::from_json("[]").is_err());
        assert!(MemoryUserStore::from_json(r#"{"Users": {}}"#).is_err());
        assert!(MemoryUserStore::from_json(r#"{"Users": [1]}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(USERS_JSON.as_bytes()).unwrap();

        let store = MemoryUserStore::from_file(file.path()).unwrap();
        assert_eq!(store.table_len("Users"), 3);
        assert_eq!(store.table_len("Missing"), 0);

        assert!(MemoryUserStore::from_file(Path::new("/nonexistent/users.json")).is_err());
    }

    #[test]
    fn test_memory_session_store() {
        let mut session = MemorySessionStore::new();
        assert!(session.is_empty());

        let principal = Principal::new().with("id", 1);
        session.write("Auth.User", &principal).unwrap();
        assert_eq!(session.get("Auth.User"), Some(&principal));
    }
}
