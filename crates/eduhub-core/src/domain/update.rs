//! Update operations applied to a single document.

use serde_json::Value;

use crate::domain::{
    document::{Document, ID_FIELD, ValueKind, get_path_mut, set_path},
    error::DomainError,
    query::values_equal,
};

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Assign a value, creating intermediate objects.
    Set { path: String, value: Value },
    /// Append to an array, creating it when absent.
    Push { path: String, value: Value },
    /// Append each value not already present.
    AddToSet { path: String, values: Vec<Value> },
    /// Remove array elements whose `field` equals `value`.
    PullWhere {
        path: String,
        field: String,
        value: Value,
    },
}

impl UpdateOp {
    fn path(&self) -> &str {
        match self {
            Self::Set { path, .. }
            | Self::Push { path, .. }
            | Self::AddToSet { path, .. }
            | Self::PullWhere { path, .. } => path,
        }
    }
}

/// An ordered list of update operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(UpdateOp::Set {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    pub fn push(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(UpdateOp::Push {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    pub fn add_to_set<V: Into<Value>>(
        mut self,
        path: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.ops.push(UpdateOp::AddToSet {
            path: path.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn pull_where(
        mut self,
        path: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.ops.push(UpdateOp::PullWhere {
            path: path.into(),
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every operation to `doc`.
    ///
    /// Either all operations apply or the document is left as it was.
    /// Returns whether the document changed.
    pub fn apply(&self, doc: &mut Document) -> Result<bool, DomainError> {
        let mut fields = doc.fields.clone();
        for op in &self.ops {
            if op.path() == ID_FIELD || op.path().starts_with("_id.") {
                return Err(DomainError::InvalidUpdate {
                    path: op.path().to_string(),
                    reason: "the document id cannot be modified".into(),
                });
            }
            apply_op(&mut fields, op)?;
        }

        let modified = fields != doc.fields;
        doc.fields = fields;
        Ok(modified)
    }
}

fn apply_op(fields: &mut serde_json::Map<String, Value>, op: &UpdateOp) -> Result<(), DomainError> {
    match op {
        UpdateOp::Set { path, value } => set_path(fields, path, value.clone()),

        UpdateOp::Push { path, value } => {
            array_at(fields, path)?.push(value.clone());
            Ok(())
        }

        UpdateOp::AddToSet { path, values } => {
            let items = array_at(fields, path)?;
            for value in values {
                if !items.iter().any(|existing| values_equal(existing, value)) {
                    items.push(value.clone());
                }
            }
            Ok(())
        }

        UpdateOp::PullWhere { path, field, value } => {
            match get_path_mut(fields, path) {
                None => Ok(()),
                Some(Value::Array(items)) => {
                    items.retain(|item| {
                        !item
                            .get(field)
                            .is_some_and(|candidate| values_equal(candidate, value))
                    });
                    Ok(())
                }
                Some(other) => Err(not_an_array(path, other)),
            }
        }
    }
}

/// The array at `path`, created empty when the path is absent.
fn array_at<'a>(
    fields: &'a mut serde_json::Map<String, Value>,
    path: &str,
) -> Result<&'a mut Vec<Value>, DomainError> {
    if get_path_mut(fields, path).is_none() {
        set_path(fields, path, Value::Array(Vec::new()))?;
    }
    match get_path_mut(fields, path) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(not_an_array(path, other)),
        None => Err(DomainError::InvalidUpdate {
            path: path.to_string(),
            reason: "path could not be created".into(),
        }),
    }
}

fn not_an_array(path: &str, found: &Value) -> DomainError {
    DomainError::InvalidUpdate {
        path: path.to_string(),
        reason: format!("expected an array, found {}", ValueKind::of(found)),
    }
}
