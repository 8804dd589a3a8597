//! Equality predicates used for user lookups

use crate::authentication::config::ScopeConstraint;
use crate::models::Principal;
use serde_json::Value;

/// A single `field = value` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub value: Value,
}

/// Conjunction of equality conditions, evaluated in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field = value` condition
    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    /// AND every scope constraint onto the predicate
    #[must_use]
    pub fn with_scope(mut self, scope: &[ScopeConstraint]) -> Self {
        self.conditions.extend(scope.iter().map(|constraint| Condition {
            field: constraint.field.clone(),
            value: constraint.value.clone(),
        }));
        self
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether `record` satisfies every condition
    #[must_use]
    pub fn matches(&self, record: &Principal) -> bool {
        self.conditions.iter().all(|condition| {
            record
                .get(&condition.field)
                .is_some_and(|stored| values_match(stored, &condition.value))
        })
    }
}

/// Equality with SQL-ish leniency: `true`/`false` also match `1`/`0`
#[must_use]
pub fn values_match(stored: &Value, expected: &Value) -> bool {
    match (stored, expected) {
        (Value::Bool(b), Value::Number(n)) | (Value::Number(n), Value::Bool(b)) => {
            n.as_i64() == Some(i64::from(*b))
        }
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => stored == expected,
    }
}
