//! Query filters over documents.
//!
//! A [`Filter`] is a conjunction of conditions, each on a dotted field path.
//! Stores evaluate filters with [`Filter::matches`]; nothing here does I/O.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::domain::document::{Document, DocumentId, ID_FIELD};

/// A single condition on a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value. A missing field equals `null`.
    Eq(Value),
    /// Field equals any of the values.
    In(Vec<Value>),
    /// Inclusive bounds; either side may be open.
    Range {
        min: Option<Value>,
        max: Option<Value>,
    },
    /// Case-insensitive substring match on a string field.
    ContainsIgnoreCase(String),
}

impl Condition {
    /// Evaluate against a field value (`None` when the field is absent).
    ///
    /// Array-valued fields match when any element matches.
    pub fn matches(&self, field: Option<&Value>) -> bool {
        match field {
            Some(Value::Array(items)) => {
                self.matches_scalar(field) || items.iter().any(|item| self.matches_scalar(Some(item)))
            }
            _ => self.matches_scalar(field),
        }
    }

    fn matches_scalar(&self, field: Option<&Value>) -> bool {
        let value = field.unwrap_or(&Value::Null);
        match self {
            Self::Eq(expected) => values_equal(value, expected),
            Self::In(candidates) => candidates.iter().any(|c| values_equal(value, c)),
            Self::Range { min, max } => {
                if field.is_none() {
                    return false;
                }
                let above = min.as_ref().is_none_or(|m| {
                    matches!(
                        compare_values(value, m),
                        Some(Ordering::Greater | Ordering::Equal)
                    )
                });
                let below = max.as_ref().is_none_or(|m| {
                    matches!(
                        compare_values(value, m),
                        Some(Ordering::Less | Ordering::Equal)
                    )
                });
                above && below
            }
            Self::ContainsIgnoreCase(needle) => value
                .as_str()
                .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
        }
    }
}

/// Conjunction of field conditions. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
}

impl Filter {
    /// Match every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: DocumentId) -> Self {
        Self::all().eq(ID_FIELD, id.to_value())
    }

    pub fn eq(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, Condition::Eq(value.into()))
    }

    pub fn is_in<V: Into<Value>>(
        self,
        path: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.with(path, Condition::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn range(
        self,
        path: impl Into<String>,
        min: Option<Value>,
        max: Option<Value>,
    ) -> Self {
        self.with(path, Condition::Range { min, max })
    }

    pub fn gte(self, path: impl Into<String>, min: impl Into<Value>) -> Self {
        self.range(path, Some(min.into()), None)
    }

    pub fn lte(self, path: impl Into<String>, max: impl Into<Value>) -> Self {
        self.range(path, None, Some(max.into()))
    }

    pub fn contains_ignore_case(self, path: impl Into<String>, needle: impl Into<String>) -> Self {
        self.with(path, Condition::ContainsIgnoreCase(needle.into()))
    }

    pub fn with(mut self, path: impl Into<String>, condition: Condition) -> Self {
        self.clauses.push((path.into(), condition));
        self
    }

    pub fn clauses(&self) -> &[(String, Condition)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses.iter().all(|(path, condition)| {
            if path == ID_FIELD {
                let id = doc.id.to_value();
                condition.matches(Some(&id))
            } else {
                condition.matches(doc.get_ref(path))
            }
        })
    }
}

/// JSON equality where numbers compare by value (`1 == 1.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Ordering for range checks: numbers numerically, strings lexicographically.
/// Values of different kinds are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Integers compare exactly; only a float on either side goes through `f64`.
fn compare_numbers(x: &Number, y: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return Some(a.cmp(&b));
    }
    if !x.is_f64() && !y.is_f64() {
        // One side is negative, the other above i64::MAX.
        return Some(if x.is_i64() { Ordering::Less } else { Ordering::Greater });
    }
    x.as_f64()?.partial_cmp(&y.as_f64()?)
}
