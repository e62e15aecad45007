//! Application layer errors.
//!
//! These errors represent failures of the store or of orchestration, not
//! broken course rules. Rule violations are `ValidationReport`s from
//! `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::ValidationReport;
use crate::error::ErrorCategory;

/// Errors that occur while talking to a document store.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// A write would give two documents the same key on a unique index.
    #[error(
        "Duplicate key on {collection}.{index}: field '{field}' with value '{value}' already exists"
    )]
    DuplicateKey {
        collection: String,
        index: String,
        field: String,
        value: String,
    },

    /// A write does not satisfy the collection's schema.
    #[error("Document rejected by the '{collection}' schema ({} problem(s))", .report.len())]
    SchemaViolation {
        collection: String,
        report: ValidationReport,
    },

    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("Index '{name}' not found on collection '{collection}'")]
    IndexNotFound { collection: String, name: String },

    /// An index with this name exists with a different definition.
    #[error("Index '{name}' on collection '{collection}' already exists with different options")]
    IndexConflict { collection: String, name: String },

    /// Store access failed (lock poisoned, etc.).
    #[error("Document store lock error")]
    StoreLockError,

    /// Reading or writing the backing file failed.
    #[error("Persistence error at {path}: {reason}")]
    Persistence { path: PathBuf, reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::DuplicateKey { field, value, .. } => vec![
                format!("Another document already uses {} = '{}'", field, value),
                "Use a different value, or remove the existing document first".into(),
            ],
            Self::SchemaViolation { collection, report } => {
                let mut lines = vec![format!(
                    "Fix the following to satisfy the '{}' schema:",
                    collection
                )];
                lines.extend(report.iter().map(|v| format!("{}: {}", v.field, v.message)));
                lines
            }
            Self::CollectionNotFound { name } => vec![
                format!("Collection '{}' does not exist", name),
                "Try: eduhub setup to create the collections".into(),
            ],
            Self::IndexNotFound { collection, .. } => vec![
                format!("List the indexes on '{}' to see what exists", collection),
                "Try: eduhub setup to recreate the standard indexes".into(),
            ],
            Self::IndexConflict { name, .. } => vec![
                format!("Drop index '{}' first, or pick another name", name),
            ],
            Self::StoreLockError => vec![
                "The document store is locked".into(),
                "Try again in a moment".into(),
            ],
            Self::Persistence { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have read and write permissions".into(),
                "Ensure the data directory exists".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateKey { .. } | Self::IndexConflict { .. } => ErrorCategory::Conflict,
            Self::SchemaViolation { .. } => ErrorCategory::Validation,
            Self::CollectionNotFound { .. } | Self::IndexNotFound { .. } => ErrorCategory::NotFound,
            Self::StoreLockError | Self::Persistence { .. } => ErrorCategory::Internal,
        }
    }

    /// Fold a duplicate-key or schema failure into the same report shape the
    /// validator produces. Other errors have no report form.
    pub fn to_report(&self) -> Option<ValidationReport> {
        match self {
            Self::DuplicateKey { field, value, .. } => {
                Some(ValidationReport::from_duplicate_key(field, value))
            }
            Self::SchemaViolation { report, .. } => Some(report.clone()),
            _ => None,
        }
    }
}
