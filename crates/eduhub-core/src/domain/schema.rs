//! Store-side collection schemas.
//!
//! A [`CollectionSchema`] is attached to a collection and checked by the
//! store on every insert and update, independently of the course validator.
//! Failures are reported in the same `{field: message}` shape.

use std::fmt;

use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    document::{Record, ValueKind, get_path},
    error::DomainError,
    report::{ValidationReport, Violation, ViolationKind},
};

/// Value type a schema property requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Number,
    Bool,
    Array,
    Object,
    /// An RFC 3339 timestamp string.
    Date,
}

impl FieldType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Array => "array",
            Self::Object => "object",
            Self::Date => "date",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Int => ValueKind::of(value) == ValueKind::Int,
            Self::Number => ValueKind::of(value).is_numeric(),
            Self::Bool => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Date => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraints on one (possibly dotted) field.
///
/// Only fields that are present are checked; presence is the job of
/// [`CollectionSchema::require`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRule {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<String>,
    /// Type every array element must have.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<FieldType>,
}

impl FieldRule {
    pub fn new(field: impl Into<String>, kind: FieldType) -> Self {
        Self {
            field: field.into(),
            kind,
            pattern: None,
            minimum: None,
            maximum: None,
            one_of: Vec::new(),
            items: None,
        }
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn between(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn at_least(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn one_of<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.one_of = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn items(mut self, kind: FieldType) -> Self {
        self.items = Some(kind);
        self
    }

    fn check(&self, value: &Value) -> Option<Violation> {
        let field = self.field.as_str();
        if !self.kind.accepts(value) {
            return Some(Violation::new(
                field,
                ViolationKind::TypeMismatch,
                format!(
                    "'{}' must be of type '{}', not '{}'.",
                    field,
                    self.kind,
                    ValueKind::of(value)
                ),
            ));
        }

        if let (Some(pattern), Some(text)) = (&self.pattern, value.as_str()) {
            let matched = Regex::new(pattern).is_ok_and(|re| re.is_match(text));
            if !matched {
                return Some(Violation::new(
                    field,
                    ViolationKind::Format,
                    format!("'{}' does not match the pattern '{}'.", text, pattern),
                ));
            }
        }

        if let Some(n) = value.as_f64() {
            let low = self.minimum.is_some_and(|min| n < min);
            let high = self.maximum.is_some_and(|max| n > max);
            if low || high {
                let message = match (self.minimum, self.maximum) {
                    (Some(min), Some(max)) => {
                        format!("'{}' must be between {} and {}.", field, min, max)
                    }
                    (Some(min), None) => format!("'{}' must be at least {}.", field, min),
                    (_, max) => format!("'{}' must be at most {}.", field, max.unwrap_or(n)),
                };
                return Some(Violation::new(field, ViolationKind::Range, message));
            }
        }

        if let Some(text) = value.as_str().filter(|_| !self.one_of.is_empty()) {
            if !self.one_of.iter().any(|allowed| allowed == text) {
                let quoted: Vec<String> = self.one_of.iter().map(|v| format!("'{}'", v)).collect();
                return Some(Violation::new(
                    field,
                    ViolationKind::Enum,
                    format!("'{}' is not one of [{}].", text, quoted.join(", ")),
                ));
            }
        }

        if let (Some(items), Some(elements)) = (self.items, value.as_array()) {
            if !elements.iter().all(|e| items.accepts(e)) {
                return Some(Violation::new(
                    field,
                    ViolationKind::TypeMismatch,
                    format!("'{}' items must be of type '{}'.", field, items),
                ));
            }
        }

        None
    }
}

/// Required fields plus per-field rules for one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: Vec<FieldRule>,
}

impl CollectionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.required.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.properties.push(rule);
        self
    }

    /// Reject definitions a store could never evaluate, such as a pattern
    /// that is not a regular expression.
    pub fn validate_definition(&self) -> Result<(), DomainError> {
        for rule in &self.properties {
            if let Some(pattern) = &rule.pattern {
                Regex::new(pattern).map_err(|e| DomainError::InvalidSchema {
                    field: rule.field.clone(),
                    reason: e.to_string(),
                })?;
            }
            if let (Some(min), Some(max)) = (rule.minimum, rule.maximum) {
                if min > max {
                    return Err(DomainError::InvalidSchema {
                        field: rule.field.clone(),
                        reason: format!("minimum {} is above maximum {}", min, max),
                    });
                }
            }
        }
        Ok(())
    }

    /// Check a record. Missing required fields are reported first; rules run
    /// only for fields that are present.
    pub fn check(&self, record: &Record) -> ValidationReport {
        let mut report = ValidationReport::new();

        for field in &self.required {
            if matches!(get_path(record, field), None | Some(Value::Null)) {
                report.record(Violation::new(
                    field.as_str(),
                    ViolationKind::MissingRequiredField,
                    format!("'{}' is a required field.", field),
                ));
            }
        }

        for rule in &self.properties {
            if report.contains(&rule.field) {
                continue;
            }
            if let Some(violation) = get_path(record, &rule.field).and_then(|v| rule.check(v)) {
                report.record(violation);
            }
        }
        report
    }
}
