//! Secondary index definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{document::Document, query::values_equal};

/// An ascending index over one or more fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexSpec {
    /// Non-unique index named after its fields (`title_1_category_1`).
    pub fn ascending<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let name = Self::default_name(&fields);
        Self {
            name,
            fields,
            unique: false,
        }
    }

    /// Single-field shorthand for [`IndexSpec::ascending`].
    pub fn on(field: impl Into<String>) -> Self {
        Self::ascending([field.into()])
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn default_name(fields: &[String]) -> String {
        fields
            .iter()
            .map(|f| format!("{}_1", f))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Same fields and uniqueness, regardless of name.
    pub fn same_definition(&self, other: &IndexSpec) -> bool {
        self.fields == other.fields && self.unique == other.unique
    }

    /// Index key of a document. Missing fields index as `null`.
    pub fn key_for(&self, doc: &Document) -> Vec<Value> {
        self.fields
            .iter()
            .map(|f| doc.get(f).unwrap_or(Value::Null))
            .collect()
    }

    pub fn keys_equal(a: &[Value], b: &[Value]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
    }

    /// Field list and key rendered for diagnostics, e.g.
    /// `("studentId, courseId", "s1, c1")`.
    pub fn describe_key(&self, key: &[Value]) -> (String, String) {
        let value = key
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        (self.fields.join(", "), value)
    }
}
