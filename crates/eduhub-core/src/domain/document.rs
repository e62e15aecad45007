//! JSON-like documents.
//!
//! A [`Record`] is the loosely-typed field map callers build before a write;
//! a [`Document`] is a record that has been given an identity by a store.
//! Nested fields are addressed with dotted paths (`profile.major`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Untyped field/value mapping.
pub type Record = Map<String, Value>;

/// Name of the identity field as it appears in serialized documents.
pub const ID_FIELD: &str = "_id";

// ── DocumentId ───────────────────────────────────────────────────────────────

/// Store-assigned document identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// The id as a JSON value, for storing references in other documents.
    pub fn to_value(&self) -> Value {
        Value::String(self.0.to_string())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| DomainError::InvalidIdentifier(s.to_string()))
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ── Document ─────────────────────────────────────────────────────────────────

/// A stored record together with its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: DocumentId,

    #[serde(flatten)]
    pub fields: Record,
}

impl Document {
    pub fn new(id: DocumentId, mut fields: Record) -> Self {
        // The identity lives in `id`; a stray `_id` key would shadow it.
        fields.remove(ID_FIELD);
        Self { id, fields }
    }

    /// Look up a field by dotted path. `_id` resolves to the identity.
    pub fn get(&self, path: &str) -> Option<Value> {
        if path == ID_FIELD {
            return Some(self.id.to_value());
        }
        get_path(&self.fields, path).cloned()
    }

    /// Borrowing lookup; does not resolve `_id`.
    pub fn get_ref(&self, path: &str) -> Option<&Value> {
        get_path(&self.fields, path)
    }

    /// String field by dotted path.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get_ref(path).and_then(Value::as_str)
    }

    pub fn set(&mut self, path: &str, value: Value) -> Result<(), DomainError> {
        set_path(&mut self.fields, path, value)
    }

    /// Flatten into a single JSON object with `_id` first.
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        map.insert(ID_FIELD.to_string(), self.id.to_value());
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.to_value()
    }
}

/// Convert an arbitrary JSON value into a record.
///
/// Anything other than an object is a caller bug, not a validation failure.
pub fn record_from_value(value: Value) -> Result<Record, DomainError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DomainError::InvalidDocument(format!(
            "expected an object, found {}",
            ValueKind::of(&other)
        ))),
    }
}

// ── Paths ────────────────────────────────────────────────────────────────────

/// Resolve a dotted path inside a record.
pub fn get_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Set a dotted path, creating intermediate objects as needed.
///
/// Numeric segments index into existing arrays (`grades.0.score`); they never
/// grow an array.
pub fn set_path(record: &mut Record, path: &str, value: Value) -> Result<(), DomainError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(DomainError::InvalidFieldPath {
            path: path.to_string(),
            reason: "empty path segment".into(),
        });
    }

    let (first, rest) = segments
        .split_first()
        .ok_or_else(|| DomainError::InvalidFieldPath {
            path: path.to_string(),
            reason: "empty path".into(),
        })?;

    if rest.is_empty() {
        record.insert(first.to_string(), value);
        return Ok(());
    }

    let slot = record
        .entry(first.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    set_in_value(slot, first, rest, value).map_err(|reason| DomainError::InvalidFieldPath {
        path: path.to_string(),
        reason,
    })
}

fn set_in_value(
    current: &mut Value,
    name: &str,
    segments: &[&str],
    value: Value,
) -> Result<(), String> {
    let Some((segment, rest)) = segments.split_first() else {
        *current = value;
        return Ok(());
    };

    let next = match current {
        Value::Object(map) if rest.is_empty() => {
            map.insert(segment.to_string(), value);
            return Ok(());
        }
        Value::Object(map) => map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
        Value::Array(items) => {
            let len = items.len();
            segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get_mut(i))
                .ok_or_else(|| format!("'{}' has no element '{}' (length {})", name, segment, len))?
        }
        other => return Err(format!("'{}' is {}, not an object", name, ValueKind::of(other))),
    };
    set_in_value(next, segment, rest, value)
}

/// Mutable access to a dotted path, if it exists.
pub fn get_path_mut<'a>(record: &'a mut Record, path: &str) -> Option<&'a mut Value> {
    let mut segments = path.split('.');
    let mut current = record.get_mut(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

// ── ValueKind ────────────────────────────────────────────────────────────────

/// Runtime kind of a JSON value, used to name the offending type in messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) if n.is_f64() => Self::Float,
            Value::Number(_) => Self::Int,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
