//! Field-keyed violation reports.

use std::fmt;

use serde::{Serialize, Serializer, ser::SerializeMap};

/// What kind of rule a violation broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingRequiredField,
    TypeMismatch,
    Range,
    Enum,
    Format,
    /// Raised by the store, not the validator.
    DuplicateKey,
}

/// One violated rule on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of validating a record: empty means valid.
///
/// Holds at most one violation per field. Recording a second violation for a
/// field replaces the first in place, so entries keep the order in which their
/// fields were first reported.
///
/// Serializes as a plain `{"field": "message"}` object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A report holding a single duplicate-key entry, as produced when the
    /// store refuses a write.
    pub fn from_duplicate_key(field: &str, value: &str) -> Self {
        let mut report = Self::new();
        report.record(Violation::new(
            field,
            ViolationKind::DuplicateKey,
            format!("Field '{}' with value '{}' already exists.", field, value),
        ));
        report
    }

    pub fn record(&mut self, violation: Violation) {
        match self
            .violations
            .iter_mut()
            .find(|v| v.field == violation.field)
        {
            Some(existing) => *existing = violation,
            None => self.violations.push(violation),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn get(&self, field: &str) -> Option<&Violation> {
        self.violations.iter().find(|v| v.field == field)
    }

    pub fn message(&self, field: &str) -> Option<&str> {
        self.get(field).map(|v| v.message.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.field.as_str())
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.violations.len()))?;
        for v in &self.violations {
            map.serialize_entry(&v.field, &v.message)?;
        }
        map.end()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", v.field, v.message)?;
        }
        Ok(())
    }
}
